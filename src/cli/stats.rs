use anyhow::Result;

use crate::config::TallyConfig;
use crate::records::types::Valence;

/// Display record counts in the terminal.
pub fn stats(config: &TallyConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = crate::records::stats::store_stats(&conn, Some(&db_path))?;

    println!("Tally Statistics");
    println!("{}", "=".repeat(40));
    println!("  People:              {}", response.people);
    println!("  Themes:              {}", response.themes);
    println!("  Actions:             {}", response.actions);
    println!("  Conversations:       {}", response.conversations);
    println!();

    println!("Actions by valence:");
    for valence in [Valence::Positive, Valence::Negative, Valence::Neutral] {
        let count = response
            .actions_by_valence
            .get(valence.as_str())
            .copied()
            .unwrap_or(0);
        println!("  {:<12} {}", valence.as_str(), count);
    }
    println!();

    println!("Database size:         {} bytes", response.db_size_bytes);
    if let Some(ref oldest) = response.oldest_action {
        println!("Oldest action:         {oldest}");
    }
    if let Some(ref newest) = response.newest_action {
        println!("Newest action:         {newest}");
    }

    Ok(())
}
