//! Capsule record and creation input.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::errors::CapsuleError;
use super::fragment::Fragment;
use super::ids::CapsuleId;
use super::unlock::parse_unlock_date;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CREATOR_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;

/// What kind of payload a capsule holds. The payload itself is opaque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Drawing,
    Code,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Drawing => "drawing",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CapsuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "drawing" => Ok(Self::Drawing),
            "code" => Ok(Self::Code),
            other => Err(CapsuleError::invalid(format!(
                "Invalid content_type: {other} (expected text, drawing or code)"
            ))),
        }
    }
}

/// Trim, drop empties, dedupe, sort.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// A stored capsule. Single source of truth for one record.
///
/// Lock status is not stored: it is derived from `unlock_date`
/// on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub id: CapsuleId,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub creator_name: String,
    pub creator_email: Option<String>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub unlock_date: DateTime<Utc>,
    pub is_public: bool,
    pub fragment: Fragment,
}

impl Capsule {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag.trim())
    }
}

/// Raw creation request, as a client sends it.
///
/// Everything is optional or loosely typed here; [`NewCapsule::validate`]
/// turns it into a [`ValidatedCapsule`] or an `InvalidInput` error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCapsule {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub creator_email: Option<String>,
    #[serde(default)]
    pub unlock_date: Option<String>,
    #[serde(default)]
    pub tags: Option<TagsInput>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Tags arrive either as a JSON array or a comma separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    pub fn normalize(&self) -> BTreeSet<String> {
        match self {
            Self::List(items) => normalize_tags(items),
            Self::Csv(s) => normalize_tags(s.split(',')),
        }
    }
}

/// Creation input after validation; ready to be placed and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCapsule {
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub creator_name: String,
    pub creator_email: Option<String>,
    pub unlock_date: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub is_public: bool,
}

impl ValidatedCapsule {
    pub fn into_capsule(self, id: CapsuleId, created_at: DateTime<Utc>, fragment: Fragment) -> Capsule {
        Capsule {
            id,
            title: self.title,
            content: self.content,
            content_type: self.content_type,
            creator_name: self.creator_name,
            creator_email: self.creator_email,
            tags: self.tags,
            created_at,
            unlock_date: self.unlock_date,
            is_public: self.is_public,
            fragment,
        }
    }
}

fn required(field: &'static str, value: Option<&String>) -> Result<String, CapsuleError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CapsuleError::invalid(format!(
            "Missing required field: {field}"
        ))),
    }
}

fn at_most(field: &'static str, value: &str, max: usize) -> Result<(), CapsuleError> {
    if value.chars().count() > max {
        return Err(CapsuleError::invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

impl NewCapsule {
    /// Check required fields, formats and the minimum lead time.
    ///
    /// `unlock_date` must be at least `min_lead` after `now`.
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        min_lead: TimeDelta,
    ) -> Result<ValidatedCapsule, CapsuleError> {
        let title = required("title", self.title.as_ref())?;
        at_most("title", &title, MAX_TITLE_LEN)?;

        // content is opaque: keep it byte for byte, only reject blank
        let content = match &self.content {
            Some(c) if !c.trim().is_empty() => c.clone(),
            _ => return Err(CapsuleError::invalid("Missing required field: content")),
        };

        let creator_name = required("creator_name", self.creator_name.as_ref())?;
        at_most("creator_name", &creator_name, MAX_CREATOR_NAME_LEN)?;

        let unlock_raw = required("unlock_date", self.unlock_date.as_ref())?;
        let unlock_date = parse_unlock_date(&unlock_raw)?;
        let earliest = now
            .checked_add_signed(min_lead)
            .ok_or_else(|| CapsuleError::invalid("Minimum lead time is out of range"))?;
        if unlock_date < earliest {
            return Err(CapsuleError::invalid(format!(
                "Unlock date must be at least {} minutes in the future",
                min_lead.num_minutes()
            )));
        }

        let content_type = match self.content_type.as_deref() {
            None | Some("") => ContentType::default(),
            Some(raw) => raw.parse()?,
        };

        let creator_email = self
            .creator_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        if let Some(email) = &creator_email {
            at_most("creator_email", email, MAX_EMAIL_LEN)?;
        }

        Ok(ValidatedCapsule {
            title,
            content,
            content_type,
            creator_name,
            creator_email,
            unlock_date,
            tags: self.tags.as_ref().map(TagsInput::normalize).unwrap_or_default(),
            is_public: self.is_public.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn lead() -> TimeDelta {
        TimeDelta::minutes(5)
    }

    fn input() -> NewCapsule {
        NewCapsule {
            title: Some("Letter to 2030".into()),
            content: Some("Hello from the past.".into()),
            content_type: Some("text".into()),
            creator_name: Some("Test User".into()),
            creator_email: None,
            unlock_date: Some("2030-01-01T00:00:00Z".into()),
            tags: Some(TagsInput::List(vec!["test".into(), " sample ".into()])),
            is_public: None,
        }
    }

    #[test]
    fn valid_input_is_accepted_with_defaults() {
        let v = input().validate(now(), lead()).unwrap();
        assert_eq!(v.title, "Letter to 2030");
        assert_eq!(v.content_type, ContentType::Text);
        assert!(v.is_public);
        assert_eq!(
            v.tags.into_iter().collect::<Vec<_>>(),
            vec!["sample".to_string(), "test".to_string()]
        );
    }

    #[rstest]
    #[case::no_title(NewCapsule { title: None, ..input() }, "title")]
    #[case::blank_title(NewCapsule { title: Some("  ".into()), ..input() }, "title")]
    #[case::no_content(NewCapsule { content: None, ..input() }, "content")]
    #[case::no_creator(NewCapsule { creator_name: Some(String::new()), ..input() }, "creator_name")]
    #[case::no_unlock(NewCapsule { unlock_date: None, ..input() }, "unlock_date")]
    #[case::bad_unlock(NewCapsule { unlock_date: Some("someday".into()), ..input() }, "unlock_date")]
    #[case::bad_type(NewCapsule { content_type: Some("video".into()), ..input() }, "content_type")]
    #[case::long_title(NewCapsule { title: Some("x".repeat(201)), ..input() }, "title")]
    fn invalid_input_is_rejected(#[case] new: NewCapsule, #[case] mentions: &str) {
        let err = new.validate(now(), lead()).unwrap_err();
        assert!(matches!(err, CapsuleError::InvalidInput(_)));
        assert!(err.to_string().contains(mentions), "{err}");
    }

    #[rstest]
    #[case(TimeDelta::zero(), false)]
    #[case(TimeDelta::minutes(-1), false)]
    #[case(TimeDelta::minutes(4) + TimeDelta::seconds(59), false)]
    #[case(TimeDelta::minutes(5), true)]
    #[case(TimeDelta::days(1), true)]
    fn minimum_lead_time(#[case] ahead: TimeDelta, #[case] ok: bool) {
        let new = NewCapsule {
            unlock_date: Some((now() + ahead).to_rfc3339()),
            ..input()
        };
        assert_eq!(new.validate(now(), lead()).is_ok(), ok);
    }

    #[test]
    fn out_of_range_lead_is_an_error_not_a_panic() {
        let err = input().validate(now(), TimeDelta::MAX).unwrap_err();
        assert!(matches!(err, CapsuleError::InvalidInput(_)));
    }

    #[test]
    fn csv_tags_are_split() {
        let tags = TagsInput::Csv("past, unlocked,,past".into()).normalize();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("past"));
        assert!(tags.contains("unlocked"));
    }

    #[test]
    fn tags_deserialize_from_either_shape() {
        let list: TagsInput = serde_json::from_value(serde_json::json!(["a", "b"])).unwrap();
        let csv: TagsInput = serde_json::from_value(serde_json::json!("a,b")).unwrap();
        assert_eq!(list.normalize(), csv.normalize());
    }

    #[rstest]
    #[case("text", ContentType::Text)]
    #[case("Drawing", ContentType::Drawing)]
    #[case(" code ", ContentType::Code)]
    fn content_type_parses(#[case] raw: &str, #[case] expected: ContentType) {
        assert_eq!(raw.parse::<ContentType>().unwrap(), expected);
    }

    #[test]
    fn blank_email_is_dropped() {
        let new = NewCapsule {
            creator_email: Some("   ".into()),
            ..input()
        };
        assert_eq!(new.validate(now(), lead()).unwrap().creator_email, None);
    }
}
