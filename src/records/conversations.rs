//! Conversations: dated one-to-one notes with a person.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{Conversation, ConversationFilter, ConversationUpdate, NewConversation};
use super::{ensure_exists, non_empty, stamp, time_column, StoreError, StoreResult};
use crate::id::Id;

const SELECT_CONVERSATION: &str = "SELECT id, person_id, summary, follow_up, held_at, \
     created_at, updated_at FROM conversations";

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        person_id: row.get(1)?,
        summary: row.get(2)?,
        follow_up: row.get(3)?,
        held_at: time_column(row, 4)?,
        created_at: time_column(row, 5)?,
        updated_at: time_column(row, 6)?,
    })
}

pub fn create_conversation(conn: &Connection, input: &NewConversation) -> StoreResult<Conversation> {
    ensure_exists(conn, "people", "person", input.person_id)?;

    let id = Id::new();
    let now = Utc::now();
    conn.execute(
        "INSERT INTO conversations (id, person_id, summary, follow_up, held_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            id,
            input.person_id,
            input.summary.trim(),
            non_empty(input.follow_up.as_deref()),
            stamp(input.held_at.unwrap_or(now)),
            stamp(now),
        ],
    )?;
    get_conversation(conn, id)
}

pub fn get_conversation(conn: &Connection, id: Id) -> StoreResult<Conversation> {
    conn.query_row(
        &format!("{SELECT_CONVERSATION} WHERE id = ?1"),
        [id],
        conversation_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound {
        resource: "conversation",
        id,
    })
}

/// Conversations matching the filter, most recent first.
pub fn list_conversations(
    conn: &Connection,
    filter: &ConversationFilter,
) -> StoreResult<Vec<Conversation>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CONVERSATION} WHERE (?1 IS NULL OR person_id = ?1) ORDER BY held_at DESC, id DESC"
    ))?;
    let conversations = stmt
        .query_map([filter.person_id], conversation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(conversations)
}

pub fn update_conversation(
    conn: &Connection,
    id: Id,
    input: &ConversationUpdate,
) -> StoreResult<Conversation> {
    let rows = conn.execute(
        "UPDATE conversations SET summary = ?1, \
         held_at = COALESCE(?2, held_at), \
         follow_up = CASE WHEN ?3 THEN ?4 ELSE follow_up END, \
         updated_at = ?5 WHERE id = ?6",
        params![
            input.summary.trim(),
            input.held_at.map(stamp),
            input.follow_up.is_some(),
            non_empty(input.follow_up.as_deref()),
            stamp(Utc::now()),
            id,
        ],
    )?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "conversation",
            id,
        });
    }
    get_conversation(conn, id)
}

pub fn delete_conversation(conn: &Connection, id: Id) -> StoreResult<()> {
    let rows = conn.execute("DELETE FROM conversations WHERE id = ?1", [id])?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "conversation",
            id,
        });
    }
    Ok(())
}
