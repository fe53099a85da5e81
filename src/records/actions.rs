//! Actions: dated positive, negative or neutral events recorded about a person.
//!
//! Writes run in a transaction: the person and every referenced theme must
//! exist, then the row and its `action_themes` links are written together.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::themes::themes_for_action;
use super::types::{Action, ActionFilter, ActionUpdate, NewAction};
use super::{ensure_exists, non_empty, stamp, time_column, StoreError, StoreResult};
use crate::id::Id;

const SELECT_ACTION: &str = "SELECT a.id, a.person_id, a.description, a.valence, a.occurred_at, \
     a.refs, a.created_at, a.updated_at FROM actions a";

fn action_from_row(row: &Row<'_>) -> rusqlite::Result<Action> {
    let valence: String = row.get(3)?;
    Ok(Action {
        id: row.get(0)?,
        person_id: row.get(1)?,
        description: row.get(2)?,
        valence: valence.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown valence: {valence}").into(),
            )
        })?,
        occurred_at: time_column(row, 4)?,
        references: row.get(5)?,
        themes: Vec::new(),
        created_at: time_column(row, 6)?,
        updated_at: time_column(row, 7)?,
    })
}

/// Attach themes to the freshly loaded rows.
fn with_themes(conn: &Connection, mut action: Action) -> StoreResult<Action> {
    action.themes = themes_for_action(conn, action.id)?;
    Ok(action)
}

/// Replace the theme links of an action. Every theme must exist.
fn link_themes(tx: &Transaction<'_>, action_id: Id, themes: &[Id]) -> StoreResult<()> {
    tx.execute("DELETE FROM action_themes WHERE action_id = ?1", [action_id])?;
    for &theme_id in themes {
        ensure_exists(tx, "themes", "theme", theme_id)?;
        tx.execute(
            "INSERT OR IGNORE INTO action_themes (action_id, theme_id) VALUES (?1, ?2)",
            params![action_id, theme_id],
        )?;
    }
    Ok(())
}

/// Record an action about a person.
pub fn create_action(conn: &mut Connection, input: &NewAction) -> StoreResult<Action> {
    let tx = conn.transaction()?;
    ensure_exists(&tx, "people", "person", input.person_id)?;

    let id = Id::new();
    let now = Utc::now();
    let occurred_at = input.occurred_at.unwrap_or(now);
    tx.execute(
        "INSERT INTO actions (id, person_id, description, valence, occurred_at, refs, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id,
            input.person_id,
            input.description.trim(),
            input.valence.as_str(),
            stamp(occurred_at),
            non_empty(input.references.as_deref()),
            stamp(now),
        ],
    )?;
    link_themes(&tx, id, &input.themes)?;
    tx.commit()?;

    get_action(conn, id)
}

pub fn get_action(conn: &Connection, id: Id) -> StoreResult<Action> {
    let action = conn
        .query_row(&format!("{SELECT_ACTION} WHERE a.id = ?1"), [id], action_from_row)
        .optional()?
        .ok_or(StoreError::NotFound {
            resource: "action",
            id,
        })?;
    with_themes(conn, action)
}

/// Actions matching the filter, most recent first.
pub fn list_actions(conn: &Connection, filter: &ActionFilter) -> StoreResult<Vec<Action>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ACTION} \
         WHERE (?1 IS NULL OR a.person_id = ?1) \
           AND (?2 IS NULL OR a.valence = ?2) \
           AND (?3 IS NULL OR EXISTS (SELECT 1 FROM action_themes l WHERE l.action_id = a.id AND l.theme_id = ?3)) \
         ORDER BY a.occurred_at DESC, a.id DESC"
    ))?;
    let rows = stmt
        .query_map(
            params![
                filter.person_id,
                filter.valence.map(|v| v.as_str()),
                filter.theme_id,
            ],
            action_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|action| with_themes(conn, action))
        .collect()
}

/// Rewrite an action. `occurred_at: None` keeps the recorded time; themes are replaced.
pub fn update_action(conn: &mut Connection, id: Id, input: &ActionUpdate) -> StoreResult<Action> {
    let tx = conn.transaction()?;
    let rows = tx.execute(
        "UPDATE actions SET description = ?1, valence = ?2, \
         occurred_at = COALESCE(?3, occurred_at), \
         refs = CASE WHEN ?4 THEN ?5 ELSE refs END, \
         updated_at = ?6 WHERE id = ?7",
        params![
            input.description.trim(),
            input.valence.as_str(),
            input.occurred_at.map(stamp),
            input.references.is_some(),
            non_empty(input.references.as_deref()),
            stamp(Utc::now()),
            id,
        ],
    )?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "action",
            id,
        });
    }
    link_themes(&tx, id, &input.themes)?;
    tx.commit()?;

    get_action(conn, id)
}

pub fn delete_action(conn: &Connection, id: Id) -> StoreResult<()> {
    let rows = conn.execute("DELETE FROM actions WHERE id = ?1", [id])?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "action",
            id,
        });
    }
    Ok(())
}
