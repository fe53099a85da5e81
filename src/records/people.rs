//! People: the subjects every action and conversation hangs off.
//!
//! Deleting a person cascades to their actions and conversations via FK.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{NewPerson, Person, PersonDetail, PersonUpdate};
use super::{non_empty, stamp, time_column, StoreError, StoreResult};
use crate::id::Id;

const SELECT_PERSON: &str = "SELECT id, name, role, created_at, updated_at FROM people";

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        created_at: time_column(row, 3)?,
        updated_at: time_column(row, 4)?,
    })
}

/// Insert a person and return the stored record.
pub fn create_person(conn: &Connection, input: &NewPerson) -> StoreResult<Person> {
    let id = Id::new();
    let now = stamp(Utc::now());
    conn.execute(
        "INSERT INTO people (id, name, role, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, input.name.trim(), non_empty(input.role.as_deref()), now],
    )?;
    get_person(conn, id)
}

pub fn get_person(conn: &Connection, id: Id) -> StoreResult<Person> {
    conn.query_row(
        &format!("{SELECT_PERSON} WHERE id = ?1"),
        [id],
        person_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound {
        resource: "person",
        id,
    })
}

/// All people, alphabetically.
pub fn list_people(conn: &Connection) -> StoreResult<Vec<Person>> {
    let mut stmt = conn.prepare(&format!("{SELECT_PERSON} ORDER BY name COLLATE NOCASE, id"))?;
    let people = stmt
        .query_map([], person_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(people)
}

/// Rename a person and set, keep, or clear their role.
pub fn update_person(conn: &Connection, id: Id, input: &PersonUpdate) -> StoreResult<Person> {
    let rows = conn.execute(
        "UPDATE people SET name = ?1, \
         role = CASE WHEN ?2 THEN ?3 ELSE role END, \
         updated_at = ?4 WHERE id = ?5",
        params![
            input.name.trim(),
            input.role.is_some(),
            non_empty(input.role.as_deref()),
            stamp(Utc::now()),
            id,
        ],
    )?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "person",
            id,
        });
    }
    get_person(conn, id)
}

pub fn delete_person(conn: &Connection, id: Id) -> StoreResult<()> {
    let rows = conn.execute("DELETE FROM people WHERE id = ?1", [id])?;
    if rows == 0 {
        return Err(StoreError::NotFound {
            resource: "person",
            id,
        });
    }
    Ok(())
}

/// A person with all their actions and conversations, newest first.
pub fn person_detail(conn: &Connection, id: Id) -> StoreResult<PersonDetail> {
    let person = get_person(conn, id)?;
    let actions = super::actions::list_actions(
        conn,
        &super::types::ActionFilter {
            person_id: Some(id),
            ..Default::default()
        },
    )?;
    let conversations = super::conversations::list_conversations(
        conn,
        &super::types::ConversationFilter {
            person_id: Some(id),
        },
    )?;
    Ok(PersonDetail {
        person,
        actions,
        conversations,
    })
}
