use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::StoreResult;

/// Row counts across the store.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub people: u64,
    pub themes: u64,
    pub actions: u64,
    pub conversations: u64,
    pub actions_by_valence: BTreeMap<String, u64>,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_action: Option<String>,
}

/// Compute store statistics. Pass `None` for `db_path` on in-memory databases.
pub fn store_stats(conn: &Connection, db_path: Option<&Path>) -> StoreResult<StatsResponse> {
    let count = |table: &str| -> StoreResult<u64> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n as u64)
    };

    let mut actions_by_valence = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT valence, COUNT(*) FROM actions GROUP BY valence")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (valence, n) = row?;
        actions_by_valence.insert(valence, n as u64);
    }

    let (oldest_action, newest_action): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(occurred_at), MAX(occurred_at) FROM actions",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        people: count("people")?,
        themes: count("themes")?,
        actions: count("actions")?,
        conversations: count("conversations")?,
        actions_by_valence,
        db_size_bytes,
        oldest_action,
        newest_action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::records::actions::create_action;
    use crate::records::people::create_person;
    use crate::records::types::{NewAction, NewPerson, Valence};

    #[test]
    fn empty_store() {
        let conn = db::open_memory_database().unwrap();
        let stats = store_stats(&conn, None).unwrap();
        assert_eq!(stats.people, 0);
        assert_eq!(stats.actions, 0);
        assert!(stats.actions_by_valence.is_empty());
        assert!(stats.oldest_action.is_none());
    }

    #[test]
    fn counts_actions_by_valence() {
        let mut conn = db::open_memory_database().unwrap();
        let person = create_person(
            &conn,
            &NewPerson {
                name: "Ken".into(),
                role: None,
            },
        )
        .unwrap();
        for valence in [Valence::Positive, Valence::Positive, Valence::Negative] {
            create_action(
                &mut conn,
                &NewAction {
                    person_id: person.id,
                    description: "x".into(),
                    valence,
                    occurred_at: None,
                    references: None,
                    themes: Vec::new(),
                },
            )
            .unwrap();
        }

        let stats = store_stats(&conn, None).unwrap();
        assert_eq!(stats.people, 1);
        assert_eq!(stats.actions, 3);
        assert_eq!(stats.actions_by_valence.get("positive"), Some(&2));
        assert_eq!(stats.actions_by_valence.get("negative"), Some(&1));
        assert!(stats.newest_action.is_some());
    }
}
