use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// How far `issued_at` may sit ahead of the server clock.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Which portal a bearer session belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Admin,
    Owner,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Admin => "admin",
            SubjectKind::Owner => "owner",
        }
    }

    /// Key under which the application-readable form is stored.
    pub fn storage_key(&self) -> String {
        format!("{}_session", self.as_str())
    }

    /// Name of the cookie carrying the transport form.
    pub fn cookie_name(&self) -> String {
        format!("{}_session_token", self.as_str())
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(SubjectKind::Admin),
            "owner" => Some(SubjectKind::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authenticated portal user, held by the client between requests.
///
/// `subject_email` and `subject_display_name` are a snapshot taken at login
/// and are not refreshed until the next login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Session {
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub subject_email: String,
    pub subject_display_name: String,
}

impl Session {
    pub fn new(
        subject_id: impl Into<String>,
        subject_email: impl Into<String>,
        subject_display_name: impl Into<String>,
    ) -> Self {
        Self::issued(subject_id, subject_email, subject_display_name, Utc::now())
    }

    pub fn issued(
        subject_id: impl Into<String>,
        subject_email: impl Into<String>,
        subject_display_name: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            issued_at,
            subject_email: subject_email.into(),
            subject_display_name: subject_display_name.into(),
        }
    }

    /// Fresh only while `now - issued_at < max_age` and the session is not
    /// dated in the future beyond the allowed clock skew.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        !self.is_future_dated(now) && now.signed_duration_since(self.issued_at) < max_age
    }

    pub fn is_future_dated(&self, now: DateTime<Utc>) -> bool {
        self.issued_at.signed_duration_since(now) > Duration::seconds(MAX_CLOCK_SKEW_SECS)
    }

    /// The subject id is used verbatim as a path segment and a header value,
    /// so it is limited to `[A-Za-z0-9_-]`.
    pub fn has_valid_subject_id(&self) -> bool {
        is_valid_subject_id(&self.subject_id)
    }

    pub fn expires_at(&self, max_age: Duration) -> DateTime<Utc> {
        self.issued_at + max_age
    }
}

pub fn is_valid_subject_id(subject_id: &str) -> bool {
    !subject_id.is_empty()
        && subject_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
