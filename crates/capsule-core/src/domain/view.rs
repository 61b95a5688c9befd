//! Read model: what a client is allowed to see of a capsule.
//!
//! # Redaction
//! `content` is only ever filled in when the capsule evaluates to unlocked at
//! the render instant. For a locked capsule the field is absent from the
//! serialized JSON altogether (not null, not masked) and the countdown is
//! included instead. `creator_email` is never rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::capsule::{Capsule, ContentType};
use super::fragment::Fragment;
use super::ids::CapsuleId;
use super::unlock::{TimeRemaining, UnlockStatus, evaluate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleView {
    pub id: CapsuleId,
    pub title: String,
    pub content_type: ContentType,
    pub creator_name: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub unlock_date: DateTime<Utc>,
    pub is_public: bool,
    pub status: UnlockStatus,
    pub is_unlocked: bool,
    pub fragment_x: f64,
    pub fragment_y: f64,
    pub fragment_rotation: f64,
    pub fragment_scale: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<TimeRemaining>,
}

/// Whether the caller asked for content at all.
///
/// `Include` is still subject to the lock: a locked capsule never renders
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    Include,
    Omit,
}

impl CapsuleView {
    /// Evaluate `capsule` at `now` and build the client-facing view.
    pub fn render(capsule: &Capsule, now: DateTime<Utc>, policy: ContentPolicy) -> Self {
        let evaluation = evaluate(capsule.unlock_date, now);
        let content = match (evaluation.status, policy) {
            (UnlockStatus::Unlocked, ContentPolicy::Include) => Some(capsule.content.clone()),
            _ => None,
        };
        let Fragment {
            x,
            y,
            rotation,
            scale,
        } = capsule.fragment;

        Self {
            id: capsule.id,
            title: capsule.title.clone(),
            content_type: capsule.content_type,
            creator_name: capsule.creator_name.clone(),
            tags: capsule.tags.iter().cloned().collect(),
            created_at: capsule.created_at,
            unlock_date: capsule.unlock_date,
            is_public: capsule.is_public,
            status: evaluation.status,
            is_unlocked: evaluation.is_unlocked(),
            fragment_x: x,
            fragment_y: y,
            fragment_rotation: rotation,
            fragment_scale: scale,
            content,
            time_remaining: evaluation.time_remaining,
        }
    }
}
