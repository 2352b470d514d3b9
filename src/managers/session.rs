use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::{
    config::PortalConfig,
    models::session::{Session, SubjectKind},
    utils::{
        codec::SessionCodec,
        cookie::{expired_cookie, session_cookie},
    },
};

/// Key-value storage owned by a single client.
pub trait SessionRepository: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    entries: Arc<DashMap<String, String>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionRepository for MemorySessionRepository {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Records writes made while handling one response so they can be emitted as
/// `Set-Cookie` headers. Only the transport cookie key is turned into a header.
pub struct CookieJarRepository {
    cookie_name: String,
    max_age_secs: i64,
    secure: bool,
    writes: DashMap<String, Option<String>>,
}

impl CookieJarRepository {
    pub fn new(cookie_name: impl Into<String>, max_age_secs: i64, secure: bool) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            max_age_secs,
            secure,
            writes: DashMap::new(),
        }
    }

    pub fn set_cookie_headers(&self) -> Vec<String> {
        match self.writes.get(&self.cookie_name) {
            Some(entry) => match entry.value() {
                Some(token) => vec![session_cookie(
                    &self.cookie_name,
                    token,
                    self.max_age_secs,
                    self.secure,
                )],
                None => vec![expired_cookie(&self.cookie_name, self.secure)],
            },
            None => Vec::new(),
        }
    }
}

impl SessionRepository for CookieJarRepository {
    fn get(&self, key: &str) -> Option<String> {
        self.writes.get(key).and_then(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.writes.insert(key.to_string(), Some(value));
    }

    fn remove(&self, key: &str) {
        self.writes.insert(key.to_string(), None);
    }
}

/// Client-held bearer session for one portal.
///
/// Keeps an application-readable copy and the transport cookie copy in the
/// injected repository. Expiry is detected on read only.
#[derive(Clone)]
pub struct SessionStore {
    kind: SubjectKind,
    repository: Arc<dyn SessionRepository>,
    codec: SessionCodec,
    max_age: Duration,
    login_path: String,
}

impl SessionStore {
    pub fn new(
        kind: SubjectKind,
        repository: Arc<dyn SessionRepository>,
        codec: SessionCodec,
        max_age: Duration,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            repository,
            codec,
            max_age,
            login_path: login_path.into(),
        }
    }

    pub fn for_portal(
        portal: &PortalConfig,
        repository: Arc<dyn SessionRepository>,
        codec: SessionCodec,
        max_age: Duration,
    ) -> Self {
        Self::new(
            portal.kind,
            repository,
            codec,
            max_age,
            portal.login_path.clone(),
        )
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Replaces any existing session with a new one issued now.
    pub fn create_session(
        &self,
        subject_id: &str,
        subject_email: &str,
        subject_display_name: &str,
    ) -> Session {
        let session = Session::new(subject_id, subject_email, subject_display_name);
        self.write(&session);
        session
    }

    pub fn read_session(&self) -> Option<Session> {
        self.read_at(Utc::now())
    }

    pub fn clear_session(&self) {
        self.repository.remove(&self.kind.storage_key());
        self.repository.remove(&self.kind.cookie_name());
    }

    /// Clears the session and returns where the client should navigate next.
    pub fn logout(&self) -> String {
        self.clear_session();
        tracing::info!(kind = %self.kind, "Session cleared on logout");
        self.login_path.clone()
    }

    /// `name=value` pair to attach to outgoing requests.
    pub fn transport_cookie(&self) -> Option<String> {
        let name = self.kind.cookie_name();
        self.repository
            .get(&name)
            .map(|token| format!("{}={}", name, token))
    }

    fn write(&self, session: &Session) {
        let app_form = serde_json::to_string(session);
        let transport_form = self.codec.encode(session);

        match (app_form, transport_form) {
            (Ok(app_form), Ok(token)) => {
                self.repository.set(&self.kind.storage_key(), app_form);
                self.repository.set(&self.kind.cookie_name(), token);
                tracing::info!(
                    kind = %self.kind,
                    subject_id = %session.subject_id,
                    "Session created"
                );
            }
            (app_form, transport_form) => {
                tracing::error!(
                    kind = %self.kind,
                    app_form_ok = app_form.is_ok(),
                    transport_form_ok = transport_form.is_ok(),
                    "Failed to serialize session, leaving client signed out"
                );
                self.clear_session();
            }
        }
    }

    fn read_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let raw = self.repository.get(&self.kind.storage_key())?;

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "Discarding corrupted session record");
                self.clear_session();
                return None;
            }
        };

        if !session.has_valid_subject_id() || session.is_future_dated(now) {
            tracing::info!(
                kind = %self.kind,
                issued_at = %session.issued_at,
                reason = "no_session",
                "Discarding unusable session record"
            );
            self.clear_session();
            return None;
        }

        if !session.is_fresh_at(now, self.max_age) {
            tracing::info!(
                kind = %self.kind,
                subject_id = %session.subject_id,
                reason = "expired_session",
                "Discarding stale session"
            );
            self.clear_session();
            return None;
        }

        Some(session)
    }
}
