//! Markup templates for the interactive page.
//!
//! Element ids follow `{resource}-{id}` so the page can target swaps at them.
//! Collections render `<option>` elements instead of a list when the request
//! carries `?view=options`, which the page uses to fill `<select>` inputs.

use chrono::{DateTime, Utc};
use maud::{html, Markup};

use super::context::RequestContext;
use super::render::Fragment;
use crate::error::StructuredError;
use crate::records::types::{Action, Conversation, Deleted, Person, PersonDetail, Theme};

fn wants_options(ctx: &RequestContext) -> bool {
    ctx.query_param("view").as_deref() == Some("options")
}

fn time(at: &DateTime<Utc>) -> Markup {
    html! {
        time datetime=(at.to_rfc3339()) { (at.format("%Y-%m-%d %H:%M").to_string()) }
    }
}

fn options<'a>(entries: impl IntoIterator<Item = (String, &'a str)>) -> Markup {
    html! {
        @for (value, label) in entries {
            option value=(value) { (label) }
        }
    }
}

fn list<T>(class: &str, empty: &str, items: &[T], item: fn(&T) -> Markup) -> Markup {
    html! {
        ul class=(class) {
            @if items.is_empty() {
                li.empty { (empty) }
            }
            @for value in items {
                (item(value))
            }
        }
    }
}

// ── People ────────────────────────────────────────────────────────────────────

fn person_item(person: &Person) -> Markup {
    let href = format!("/people/{}", person.id);
    html! {
        li.person id=(format!("person-{}", person.id)) {
            a href=(href) hx-get=(href) hx-target="#detail" { (person.name) }
            @if let Some(role) = &person.role {
                " "
                span.role { (role) }
            }
        }
    }
}

impl Fragment for Person {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(person_item(self))
    }
}

impl Fragment for Vec<Person> {
    fn fragment(&self, ctx: &RequestContext) -> Option<Markup> {
        if wants_options(ctx) {
            return Some(options(
                self.iter().map(|p| (p.id.to_string(), p.name.as_str())),
            ));
        }
        Some(list("people", "Nobody recorded yet.", self, person_item))
    }
}

impl Fragment for PersonDetail {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(html! {
            section.person-detail id=(format!("person-{}", self.person.id)) {
                h2 { (self.person.name) }
                @if let Some(role) = &self.person.role {
                    p.role { (role) }
                }
                h3 { "Actions" }
                (list("actions", "No actions recorded.", &self.actions, action_item))
                h3 { "Conversations" }
                (list(
                    "conversations",
                    "No conversations recorded.",
                    &self.conversations,
                    conversation_item,
                ))
            }
        })
    }
}

// ── Themes ────────────────────────────────────────────────────────────────────

fn theme_item(theme: &Theme) -> Markup {
    html! {
        li.theme id=(format!("theme-{}", theme.id)) {
            (theme.name)
            @if let Some(description) = &theme.description {
                " "
                span.description { (description) }
            }
        }
    }
}

impl Fragment for Theme {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(theme_item(self))
    }
}

impl Fragment for Vec<Theme> {
    fn fragment(&self, ctx: &RequestContext) -> Option<Markup> {
        if wants_options(ctx) {
            return Some(options(
                self.iter().map(|t| (t.id.to_string(), t.name.as_str())),
            ));
        }
        Some(list("themes", "No themes yet.", self, theme_item))
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

fn action_item(action: &Action) -> Markup {
    html! {
        li class=(format!("action {}", action.valence)) id=(format!("action-{}", action.id)) {
            (time(&action.occurred_at))
            " "
            span.description { (action.description) }
            @for theme in &action.themes {
                " "
                span.tag { (theme.name) }
            }
            @if let Some(references) = &action.references {
                " "
                small.references { (references) }
            }
        }
    }
}

impl Fragment for Action {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(action_item(self))
    }
}

impl Fragment for Vec<Action> {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(list("actions", "No actions recorded.", self, action_item))
    }
}

// ── Conversations ─────────────────────────────────────────────────────────────

fn conversation_item(conversation: &Conversation) -> Markup {
    html! {
        li.conversation id=(format!("conversation-{}", conversation.id)) {
            (time(&conversation.held_at))
            " "
            span.summary { (conversation.summary) }
            @if let Some(follow_up) = &conversation.follow_up {
                " "
                em.follow-up { (follow_up) }
            }
        }
    }
}

impl Fragment for Conversation {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(conversation_item(self))
    }
}

impl Fragment for Vec<Conversation> {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(list(
            "conversations",
            "No conversations recorded.",
            self,
            conversation_item,
        ))
    }
}

// ── Misc ──────────────────────────────────────────────────────────────────────

/// Empty: the page removes the swapped element.
impl Fragment for Deleted {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(html! {})
    }
}

impl Fragment for StructuredError {
    fn fragment(&self, _ctx: &RequestContext) -> Option<Markup> {
        Some(html! {
            div.error role="alert" data-code=(self.code) data-field=[self.field.as_deref()] {
                (self.message)
            }
        })
    }
}
