use anyhow::Result;
use serde::Serialize;

use crate::config::TallyConfig;
use crate::records::types::{PersonDetail, Theme};
use crate::records::{people, themes};

/// Export format: every theme, then every person with their timeline.
#[derive(Debug, Serialize)]
struct ExportData {
    themes: Vec<Theme>,
    people: Vec<PersonDetail>,
}

/// Export all records as JSON to stdout.
pub fn export(config: &TallyConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let themes = themes::list_themes(&conn)?;
    let people = people::list_people(&conn)?
        .into_iter()
        .map(|person| people::person_detail(&conn, person.id))
        .collect::<Result<Vec<_>, _>>()?;

    let data = ExportData { themes, people };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    let actions: usize = data.people.iter().map(|p| p.actions.len()).sum();
    eprintln!(
        "Exported {} people, {} actions and {} themes.",
        data.people.len(),
        actions,
        data.themes.len()
    );

    Ok(())
}
