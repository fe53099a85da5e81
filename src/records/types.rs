//! Record and input type definitions.
//!
//! Records ([`Person`], [`Theme`], [`Action`], [`Conversation`]) mirror the
//! table rows. Inputs (`New*`, `*Update`) are the canonical request bodies the
//! handlers deserialize, whether the caller posted JSON or a normalized form.
//!
//! On updates an optional text field that is `None` is left unchanged and
//! `Some("")` clears it. Required text fields default to `""` when missing so
//! validation reports them as `field_required` by name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// Whether an action reflects well or badly on the person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valence {
    Positive,
    Negative,
    /// Only accepted when an action is first recorded.
    Neutral,
}

impl Valence {
    /// Values accepted when creating an action.
    pub const CREATE_VALUES: &'static [&'static str] = &["positive", "negative", "neutral"];
    /// Values accepted when updating an action.
    pub const UPDATE_VALUES: &'static [&'static str] = &["positive", "negative"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Valence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Valence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            _ => Err(format!("unknown valence: {s}")),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: Id,
    pub name: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A dated event about a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub id: Id,
    pub person_id: Id,
    pub description: String,
    pub valence: Valence,
    pub occurred_at: DateTime<Utc>,
    /// Free-text pointers (ticket numbers, links) backing the action.
    pub references: Option<String>,
    pub themes: Vec<Theme>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dated one-to-one conversation with a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub id: Id,
    pub person_id: Id,
    pub summary: String,
    pub follow_up: Option<String>,
    pub held_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person with their timeline, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonDetail {
    pub person: Person,
    pub actions: Vec<Action>,
    pub conversations: Vec<Conversation>,
}

/// Confirmation that a record was removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deleted {
    pub id: Id,
    pub resource: &'static str,
}

// ── Inputs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonUpdate {
    #[serde(default)]
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTheme {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeUpdate {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAction {
    pub person_id: Id,
    #[serde(default)]
    pub description: String,
    pub valence: Valence,
    /// Defaults to the time of recording.
    pub occurred_at: Option<DateTime<Utc>>,
    pub references: Option<String>,
    #[serde(default)]
    pub themes: Vec<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionUpdate {
    #[serde(default)]
    pub description: String,
    pub valence: Valence,
    /// `None` keeps the recorded time.
    pub occurred_at: Option<DateTime<Utc>>,
    pub references: Option<String>,
    /// Replaces the attached themes; an empty list detaches all of them.
    #[serde(default)]
    pub themes: Vec<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewConversation {
    pub person_id: Id,
    #[serde(default)]
    pub summary: String,
    /// Defaults to the time of recording.
    pub held_at: Option<DateTime<Utc>>,
    pub follow_up: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationUpdate {
    #[serde(default)]
    pub summary: String,
    pub held_at: Option<DateTime<Utc>>,
    pub follow_up: Option<String>,
}

/// Filters for action listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionFilter {
    pub person_id: Option<Id>,
    pub valence: Option<Valence>,
    pub theme_id: Option<Id>,
}

/// Filters for conversation listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationFilter {
    pub person_id: Option<Id>,
}
