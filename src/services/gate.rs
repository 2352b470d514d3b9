//! Decision procedure for the path-scoped access gate.
//!
//! Pure: takes the request path, the portal it is guarding and whatever
//! session could be decoded from the request, and says what to do.

use crate::{
    config::PortalConfig,
    models::{errors::SessionError, session::Session},
};

pub const SUBJECT_AUTHENTICATED_HEADER: &str = "subject-authenticated";
pub const SUBJECT_ID_HEADER: &str = "subject-id";
pub const SUBJECT_EMAIL_HEADER: &str = "subject-email";

pub const TRUST_HEADERS: [&str; 3] = [
    SUBJECT_AUTHENTICATED_HEADER,
    SUBJECT_ID_HEADER,
    SUBJECT_EMAIL_HEADER,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The login entry point itself.
    PublicEntry,
    /// Outside the guarded subtree.
    Unguarded,
    Unauthenticated {
        reason: SessionError,
        redirect_to: String,
    },
    WrongSubject {
        session: Session,
        redirect_to: String,
    },
    Authenticated {
        session: Session,
    },
}

impl GateDecision {
    pub fn state(&self) -> &'static str {
        match self {
            GateDecision::PublicEntry => "PUBLIC_ENTRY",
            GateDecision::Unguarded => "UNGUARDED",
            GateDecision::Unauthenticated { .. } => "UNAUTHENTICATED",
            GateDecision::WrongSubject { .. } => "WRONG_SUBJECT",
            GateDecision::Authenticated { .. } => "AUTHENTICATED",
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GateDecision::Unauthenticated { redirect_to, .. }
            | GateDecision::WrongSubject { redirect_to, .. } => Some(redirect_to),
            _ => None,
        }
    }
}

pub fn decide(
    path: &str,
    portal: &PortalConfig,
    session: Result<Session, SessionError>,
) -> GateDecision {
    if path == portal.login_path {
        return GateDecision::PublicEntry;
    }

    let Some(rest) = strip_root(path, &portal.root) else {
        return GateDecision::Unguarded;
    };

    let session = match session {
        Ok(session) if session.has_valid_subject_id() => session,
        Ok(_) => {
            return GateDecision::Unauthenticated {
                reason: SessionError::NoSession,
                redirect_to: portal.login_path.clone(),
            };
        }
        Err(reason) => {
            return GateDecision::Unauthenticated {
                reason,
                redirect_to: portal.login_path.clone(),
            };
        }
    };

    match subject_segment(rest) {
        Some(segment) if !segment_matches(segment, &session.subject_id) => {
            GateDecision::WrongSubject {
                redirect_to: portal.subject_path(&session.subject_id),
                session,
            }
        }
        _ => GateDecision::Authenticated { session },
    }
}

/// Returns the part of `path` after `root` when `path` lies in its subtree.
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

fn subject_segment(rest: &str) -> Option<&str> {
    rest.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Compares after percent-decoding, so `/admin/%37` belongs to subject `7`.
fn segment_matches(segment: &str, subject_id: &str) -> bool {
    urlencoding::decode(segment).is_ok_and(|decoded| decoded == subject_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::SubjectKind;

    fn admin_portal() -> PortalConfig {
        PortalConfig::new(SubjectKind::Admin, "/admin", "/admin/login", true)
    }

    fn session_for(subject_id: &str) -> Session {
        Session::new(subject_id, format!("{}@stay.test", subject_id), "Admin")
    }

    #[test]
    fn test_login_entry_is_public_without_session() {
        let decision = decide("/admin/login", &admin_portal(), Err(SessionError::NoSession));
        assert_eq!(decision, GateDecision::PublicEntry);
        assert_eq!(decision.redirect_target(), None);
    }

    #[test]
    fn test_missing_session_redirects_to_login() {
        let decision = decide("/admin/42", &admin_portal(), Err(SessionError::NoSession));
        assert_eq!(decision.state(), "UNAUTHENTICATED");
        assert_eq!(decision.redirect_target(), Some("/admin/login"));
    }

    #[test]
    fn test_expired_session_keeps_reason() {
        let decision = decide("/admin/7", &admin_portal(), Err(SessionError::ExpiredSession));
        assert!(matches!(
            decision,
            GateDecision::Unauthenticated { reason: SessionError::ExpiredSession, .. }
        ));
    }

    #[test]
    fn test_other_subject_redirects_to_own_area() {
        let decision = decide("/admin/42", &admin_portal(), Ok(session_for("7")));
        assert_eq!(decision.state(), "WRONG_SUBJECT");
        assert_eq!(decision.redirect_target(), Some("/admin/7"));
    }

    #[test]
    fn test_own_subtree_is_authenticated() {
        let session = session_for("7");
        let decision = decide("/admin/7/properties", &admin_portal(), Ok(session.clone()));
        assert_eq!(decision, GateDecision::Authenticated { session });
    }

    #[test]
    fn test_bare_root_skips_subject_comparison() {
        for path in ["/admin", "/admin/"] {
            let decision = decide(path, &admin_portal(), Ok(session_for("7")));
            assert_eq!(decision.state(), "AUTHENTICATED", "path {}", path);
        }
    }

    #[test]
    fn test_paths_outside_root_are_unguarded() {
        for path in ["/", "/administrator", "/owner/7", "/api/admin/login"] {
            let decision = decide(path, &admin_portal(), Err(SessionError::NoSession));
            assert_eq!(decision, GateDecision::Unguarded, "path {}", path);
        }
    }

    #[test]
    fn test_encoded_segment_matches_own_subject() {
        let session = session_for("7");
        let decision = decide("/admin/%37/properties", &admin_portal(), Ok(session.clone()));
        assert_eq!(decision, GateDecision::Authenticated { session });
    }

    #[test]
    fn test_session_with_unroutable_subject_goes_to_login() {
        for subject_id in ["7/x", "7\n", ""] {
            let decision = decide("/admin/7", &admin_portal(), Ok(session_for(subject_id)));
            assert_eq!(
                decision,
                GateDecision::Unauthenticated {
                    reason: SessionError::NoSession,
                    redirect_to: "/admin/login".to_string(),
                },
                "subject {:?}",
                subject_id
            );
        }
    }

    #[test]
    fn test_login_lookalike_is_not_public() {
        let decision = decide("/admin/login/extra", &admin_portal(), Err(SessionError::NoSession));
        assert_eq!(decision.redirect_target(), Some("/admin/login"));
    }
}
