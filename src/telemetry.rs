use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::models::{errors::SessionError, session::SubjectKind};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AuthEvent {
    SessionIssued {
        kind: SubjectKind,
        subject_id: String,
    },
    SessionEnded {
        kind: SubjectKind,
    },
    LoginRejected {
        kind: SubjectKind,
        status: u16,
    },
    AccessGranted {
        kind: SubjectKind,
    },
    AccessDenied {
        kind: SubjectKind,
        reason: SessionError,
    },
}

impl AuthEvent {
    fn counter_key(&self) -> String {
        match self {
            AuthEvent::SessionIssued { kind, .. } => format!("{}.session_issued", kind),
            AuthEvent::SessionEnded { kind } => format!("{}.session_ended", kind),
            AuthEvent::LoginRejected { kind, status } => format!("{}.login_rejected.{}", kind, status),
            AuthEvent::AccessGranted { kind } => format!("{}.access_granted", kind),
            AuthEvent::AccessDenied { kind, reason } => {
                format!("{}.access_denied.{}", kind, reason.reason())
            }
        }
    }
}

/// Per-outcome counters for session and gate activity.
#[derive(Clone, Default)]
pub struct AuthTelemetry {
    counters: Arc<DashMap<String, u64>>,
}

impl AuthTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: AuthEvent) {
        *self.counters.entry(event.counter_key()).or_insert(0) += 1;
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    pub fn snapshot(&self) -> std::collections::BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_counted_per_reason() {
        let telemetry = AuthTelemetry::new();
        telemetry.record(AuthEvent::AccessDenied {
            kind: SubjectKind::Admin,
            reason: SessionError::ExpiredSession,
        });
        telemetry.record(AuthEvent::AccessDenied {
            kind: SubjectKind::Admin,
            reason: SessionError::ExpiredSession,
        });
        telemetry.record(AuthEvent::AccessDenied {
            kind: SubjectKind::Admin,
            reason: SessionError::IdentityMismatch,
        });

        assert_eq!(telemetry.count("admin.access_denied.expired_session"), 2);
        assert_eq!(telemetry.count("admin.access_denied.identity_mismatch"), 1);
        assert_eq!(telemetry.count("admin.access_denied.no_session"), 0);
        assert_eq!(telemetry.snapshot().len(), 2);
    }
}
