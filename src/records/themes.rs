//! Themes: tags that group actions across people (e.g. "mentoring", "on-call").

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{NewTheme, Theme, ThemeUpdate};
use super::{non_empty, stamp, time_column, StoreError, StoreResult};
use crate::id::Id;

const SELECT_THEME: &str = "SELECT id, name, description, created_at FROM themes";

pub(crate) fn theme_from_row(row: &Row<'_>) -> rusqlite::Result<Theme> {
    Ok(Theme {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: time_column(row, 3)?,
    })
}

pub fn create_theme(conn: &Connection, input: &NewTheme) -> StoreResult<Theme> {
    let id = Id::new();
    conn.execute(
        "INSERT INTO themes (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            id,
            input.name.trim(),
            non_empty(input.description.as_deref()),
            stamp(Utc::now()),
        ],
    )?;
    get_theme(conn, id)
}

pub fn get_theme(conn: &Connection, id: Id) -> StoreResult<Theme> {
    conn.query_row(&format!("{SELECT_THEME} WHERE id = ?1"), [id], theme_from_row)
        .optional()?
        .ok_or(StoreError::NotFound {
            resource: "theme",
            id,
        })
}

pub fn list_themes(conn: &Connection) -> StoreResult<Vec<Theme>> {
    let mut stmt = conn.prepare(&format!("{SELECT_THEME} ORDER BY name COLLATE NOCASE, id"))?;
    let themes = stmt
        .query_map([], theme_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(themes)
}

pub fn update_theme(conn: &Connection, id: Id, input: &ThemeUpdate) -> StoreResult<Theme> {
    let rows = conn.execute(
        "UPDATE themes SET name = ?1, \
         description = CASE WHEN ?2 THEN ?3 ELSE description END \
         WHERE id = ?4",
        params![
            input.name.trim(),
            input.description.is_some(),
            non_empty(input.description.as_deref()),
            id,
        ],
    )?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "theme",
            id,
        });
    }
    get_theme(conn, id)
}

/// Delete a theme. Actions keep existing; only the tag is detached.
pub fn delete_theme(conn: &Connection, id: Id) -> StoreResult<()> {
    let rows = conn.execute("DELETE FROM themes WHERE id = ?1", [id])?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "theme",
            id,
        });
    }
    Ok(())
}

/// Themes attached to an action, alphabetically.
pub(crate) fn themes_for_action(conn: &Connection, action_id: Id) -> StoreResult<Vec<Theme>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.description, t.created_at \
         FROM themes t JOIN action_themes link ON link.theme_id = t.id \
         WHERE link.action_id = ?1 ORDER BY t.name COLLATE NOCASE, t.id",
    )?;
    let themes = stmt
        .query_map([action_id], theme_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(themes)
}
