use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};

use crate::utils::parse_date;

/// Window before the due date in which a note counts as due soon
const DUE_SOON_HOURS: i64 = 24;

/// Urgency of a note relative to the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    Overdue,
    DueSoon,
    Normal,
}

impl NoteStatus {
    pub fn label(&self) -> &'static str {
        match self {
            NoteStatus::Overdue => "overdue",
            NoteStatus::DueSoon => "due soon",
            NoteStatus::Normal => "",
        }
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "note")]
    pub text: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl Note {
    /// Classify the note against `now`.
    ///
    /// A note is due at the last second of its due day in `now`'s time zone.
    /// Past that it is overdue; within 24 hours of it, due soon. Notes with
    /// no due date, or one that does not parse, are normal.
    pub fn status<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> NoteStatus {
        let Some(due_day) = self.due_date.as_deref().and_then(parse_date) else {
            return NoteStatus::Normal;
        };
        let Some(due) = due_day
            .and_hms_opt(23, 59, 59)
            .and_then(|end| now.timezone().from_local_datetime(&end).earliest())
        else {
            return NoteStatus::Normal;
        };

        if due < *now {
            NoteStatus::Overdue
        } else if due <= now.clone() + Duration::hours(DUE_SOON_HOURS) {
            NoteStatus::DueSoon
        } else {
            NoteStatus::Normal
        }
    }
}

/// Payload for `notes/create` and `notes/update`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<i64>,
    pub note: String,
    /// Serialized as `null` when absent
    pub due_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn note(due_date: Option<&str>) -> Note {
        Note {
            id: Some(1),
            text: "Pay rent".to_string(),
            due_date: due_date.map(str::to_string),
        }
    }

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_due_today_is_due_soon_until_day_end() {
        let now = at("2025-06-30T16:00:00-03:00");
        assert_eq!(note(Some("2025-06-30")).status(&now), NoteStatus::DueSoon);

        let just_after = at("2025-07-01T00:00:00-03:00");
        assert_eq!(note(Some("2025-06-30")).status(&just_after), NoteStatus::Overdue);
    }

    #[test]
    fn test_due_soon_window_is_24_hours() {
        let now = at("2025-06-30T16:00:00-03:00");
        // Ends 2025-07-01T23:59:59, more than 24h away
        assert_eq!(note(Some("2025-07-01")).status(&now), NoteStatus::Normal);

        let midnight = at("2025-07-01T00:00:00-03:00");
        assert_eq!(note(Some("2025-07-01")).status(&midnight), NoteStatus::DueSoon);
    }

    #[test]
    fn test_past_and_missing_due_dates() {
        let now = at("2025-06-30T16:00:00-03:00");
        assert_eq!(note(Some("2025-06-29")).status(&now), NoteStatus::Overdue);
        assert_eq!(note(Some("2025-06-29T00:00:00.000Z")).status(&now), NoteStatus::Overdue);
        assert_eq!(note(None).status(&now), NoteStatus::Normal);
        assert_eq!(note(Some("someday")).status(&now), NoteStatus::Normal);
    }

    #[test]
    fn test_note_text_accepts_backend_field_name() {
        let parsed: Note = serde_json::from_str(r#"{"id":4,"note":"Call bank"}"#).unwrap();
        assert_eq!(parsed.text, "Call bank");
        assert_eq!(parsed.due_date, None);
    }
}
