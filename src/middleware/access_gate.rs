use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header::InvalidHeaderValue, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};

use crate::{
    config::PortalConfig,
    models::{errors::SessionError, responses::ApiResponse, session::Session},
    services::{
        gate::{
            GateDecision, SUBJECT_AUTHENTICATED_HEADER, SUBJECT_EMAIL_HEADER, SUBJECT_ID_HEADER,
            TRUST_HEADERS, decide,
        },
        session::session_from_headers,
    },
    telemetry::{AuthEvent, AuthTelemetry},
    utils::codec::SessionCodec,
};

/// Everything the gate needs for one guarded subtree.
#[derive(Clone)]
pub struct GateContext {
    pub portal: PortalConfig,
    pub codec: SessionCodec,
    pub max_age: Duration,
    pub telemetry: AuthTelemetry,
}

pub async fn access_gate_middleware(
    State(gate): State<GateContext>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let kind = gate.portal.kind;
    let session = session_from_headers(req.headers(), kind, &gate.codec, gate.max_age, Utc::now());
    let decision = decide(req.uri().path(), &gate.portal, session);

    match decision {
        GateDecision::PublicEntry | GateDecision::Unguarded => next.run(req).await,
        GateDecision::Unauthenticated { reason, redirect_to } => {
            tracing::info!(
                kind = %kind,
                path = %req.uri().path(),
                reason = reason.reason(),
                "Redirecting unauthenticated request to login"
            );
            gate.telemetry.record(AuthEvent::AccessDenied { kind, reason });
            Redirect::temporary(&redirect_to).into_response()
        }
        GateDecision::WrongSubject { session, redirect_to } => {
            let reason = SessionError::IdentityMismatch;
            tracing::info!(
                kind = %kind,
                path = %req.uri().path(),
                subject_id = %session.subject_id,
                reason = reason.reason(),
                "Redirecting request to the subject's own area"
            );
            gate.telemetry.record(AuthEvent::AccessDenied { kind, reason });
            Redirect::temporary(&redirect_to).into_response()
        }
        GateDecision::Authenticated { session } => {
            if let Err(e) = inject_trust_headers(req.headers_mut(), &session) {
                let reason = SessionError::NoSession;
                tracing::warn!(
                    kind = %kind,
                    error = %e,
                    reason = reason.reason(),
                    "Session fields cannot be forwarded as headers"
                );
                gate.telemetry.record(AuthEvent::AccessDenied { kind, reason });
                return Redirect::temporary(&gate.portal.login_path).into_response();
            }

            tracing::debug!(
                kind = %kind,
                path = %req.uri().path(),
                subject_id = %session.subject_id,
                "Request authenticated"
            );
            gate.telemetry.record(AuthEvent::AccessGranted { kind });
            req.extensions_mut().insert(session);
            next.run(req).await
        }
    }
}

/// Drops any client-supplied trust headers so only the gate can set them.
pub async fn strip_trust_headers(mut req: Request<Body>, next: Next) -> Response {
    for name in TRUST_HEADERS {
        if req.headers_mut().remove(name).is_some() {
            tracing::warn!(header = name, path = %req.uri().path(), "Dropped client-supplied trust header");
        }
    }

    next.run(req).await
}

fn inject_trust_headers(headers: &mut HeaderMap, session: &Session) -> Result<(), InvalidHeaderValue> {
    let subject_id = HeaderValue::from_str(&session.subject_id)?;
    let subject_email = HeaderValue::from_str(&session.subject_email)?;

    headers.insert(SUBJECT_AUTHENTICATED_HEADER, HeaderValue::from_static("true"));
    headers.insert(SUBJECT_ID_HEADER, subject_id);
    headers.insert(SUBJECT_EMAIL_HEADER, subject_email);
    Ok(())
}

/// Identity forwarded by the gate through trust headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    pub subject_id: String,
    pub subject_email: String,
}

impl AuthenticatedSubject {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        if header(SUBJECT_AUTHENTICATED_HEADER).as_deref() != Some("true") {
            return None;
        }

        Some(Self {
            subject_id: header(SUBJECT_ID_HEADER)?,
            subject_email: header(SUBJECT_EMAIL_HEADER)?,
        })
    }
}

impl<S> FromRequestParts<S> for AuthenticatedSubject
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::failure("Authenticated session required", 401)),
            )
                .into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_headers_round_trip_through_extractor() {
        let mut headers = HeaderMap::new();
        let session = Session::new("7", "ada@stay.test", "Ada");

        inject_trust_headers(&mut headers, &session).unwrap();

        assert_eq!(headers.get(SUBJECT_AUTHENTICATED_HEADER).unwrap(), "true");
        assert_eq!(
            AuthenticatedSubject::from_headers(&headers),
            Some(AuthenticatedSubject {
                subject_id: "7".to_string(),
                subject_email: "ada@stay.test".to_string(),
            })
        );
    }

    #[test]
    fn test_extractor_requires_authenticated_flag() {
        let mut headers = HeaderMap::new();
        headers.insert(SUBJECT_ID_HEADER, HeaderValue::from_static("7"));
        headers.insert(SUBJECT_EMAIL_HEADER, HeaderValue::from_static("ada@stay.test"));

        assert_eq!(AuthenticatedSubject::from_headers(&headers), None);
    }

    #[test]
    fn test_unprintable_session_field_is_refused() {
        let mut headers = HeaderMap::new();
        let session = Session::new("7", "ada@stay.test\n", "Ada");

        assert!(inject_trust_headers(&mut headers, &session).is_err());
        assert!(headers.is_empty());
    }
}
