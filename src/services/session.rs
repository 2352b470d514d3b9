use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};

use crate::{
    models::{
        errors::SessionError,
        session::{Session, SubjectKind},
    },
    utils::{codec::SessionCodec, cookie::find_cookie},
};

/// Reads the transport cookie for `kind`, verifies its signature and checks
/// freshness.
///
/// Never touches storage: the cookie is the only source of truth here.
pub fn session_from_headers(
    headers: &HeaderMap,
    kind: SubjectKind,
    codec: &SessionCodec,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<Session, SessionError> {
    let token = find_cookie(headers, &kind.cookie_name()).ok_or(SessionError::NoSession)?;
    let reason = SessionError::NoSession;

    let session = codec.decode(&token).map_err(|e| {
        tracing::info!(
            kind = %kind,
            error = %e,
            reason = reason.reason(),
            "Rejecting undecodable session cookie"
        );
        reason
    })?;

    if session.is_future_dated(now) {
        tracing::info!(
            kind = %kind,
            subject_id = %session.subject_id,
            issued_at = %session.issued_at,
            reason = reason.reason(),
            "Rejecting future-dated session cookie"
        );
        return Err(reason);
    }

    // Subject id and email end up in a Location or forwarded header.
    if !session.has_valid_subject_id() || HeaderValue::from_str(&session.subject_email).is_err() {
        tracing::info!(
            kind = %kind,
            reason = reason.reason(),
            "Rejecting session with unroutable identity"
        );
        return Err(reason);
    }

    if !session.is_fresh_at(now, max_age) {
        return Err(SessionError::ExpiredSession);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn codec() -> SessionCodec {
        SessionCodec::new("test-signing-secret")
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    fn admin_headers(session: &Session) -> HeaderMap {
        headers_with(&format!("admin_session_token={}", codec().encode(session).unwrap()))
    }

    fn read(headers: &HeaderMap) -> Result<Session, SessionError> {
        session_from_headers(headers, SubjectKind::Admin, &codec(), Duration::hours(24), Utc::now())
    }

    #[test]
    fn test_reads_fresh_session() {
        let session = Session::new("7", "ada@stay.test", "Ada");
        assert_eq!(read(&admin_headers(&session)), Ok(session));
    }

    #[test]
    fn test_other_portal_cookie_is_ignored() {
        let session = Session::new("7", "ada@stay.test", "Ada");
        let headers = headers_with(&format!("owner_session_token={}", codec().encode(&session).unwrap()));

        assert_eq!(read(&headers), Err(SessionError::NoSession));
    }

    #[test]
    fn test_stale_cookie_is_expired() {
        let session = Session::issued("7", "ada@stay.test", "Ada", Utc::now() - Duration::hours(30));
        assert_eq!(read(&admin_headers(&session)), Err(SessionError::ExpiredSession));
    }

    #[test]
    fn test_future_dated_cookie_is_rejected() {
        let issued_at = DateTime::parse_from_rfc3339("2100-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let session = Session::issued("7", "ada@stay.test", "Ada", issued_at);

        assert_eq!(read(&admin_headers(&session)), Err(SessionError::NoSession));
    }

    #[test]
    fn test_malformed_cookie_is_no_session() {
        let headers = headers_with("admin_session_token=not-a-session");
        assert_eq!(read(&headers), Err(SessionError::NoSession));
    }

    #[test]
    fn test_unroutable_identity_is_no_session() {
        for session in [
            Session::new("7/x", "ada@stay.test", "Ada"),
            Session::new("7\n", "ada@stay.test", "Ada"),
            Session::new("7", "ada@stay.test\r\n", "Ada"),
        ] {
            assert_eq!(read(&admin_headers(&session)), Err(SessionError::NoSession));
        }
    }
}
