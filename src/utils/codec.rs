//! Transport form of a session: `base64url(json).base64url(hmac_sha256)`.
//!
//! Only holders of the signing key can mint a token the gate will accept.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::{errors::CodecError, session::Session};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SessionCodec {
    key: Vec<u8>,
}

impl SessionCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, CodecError> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(session)?);
        let tag = self.mac(&payload)?.finalize().into_bytes();
        Ok(format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(tag)))
    }

    pub fn decode(&self, token: &str) -> Result<Session, CodecError> {
        let (payload, tag) = token.trim().split_once('.').ok_or(CodecError::Unsigned)?;
        let tag = URL_SAFE_NO_PAD.decode(tag)?;

        self.mac(payload)?
            .verify_slice(&tag)
            .map_err(|_| CodecError::BadSignature)?;

        let bytes = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, CodecError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| CodecError::InvalidKey)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new("test-signing-secret")
    }

    #[test]
    fn test_transport_form_keeps_all_fields() {
        let session = Session::new("7", "ada@stay.test", "Ada Lovelace");
        let token = codec().encode(&session).unwrap();

        assert!(!token.contains('='));
        assert!(!token.contains(';'));
        assert_eq!(codec().decode(&token).unwrap(), session);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(codec().decode("%%%"), Err(CodecError::Unsigned)));
        assert!(matches!(codec().decode("abc.%%%"), Err(CodecError::Base64(_))));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let token = codec().encode(&Session::new("7", "ada@stay.test", "Ada")).unwrap();
        let (_, tag) = token.split_once('.').unwrap();

        let forged = Session::new("1", "ada@stay.test", "Ada");
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}", forged_payload, tag);

        assert!(matches!(codec().decode(&tampered), Err(CodecError::BadSignature)));
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let other = SessionCodec::new("someone-else");
        let token = other.encode(&Session::new("7", "ada@stay.test", "Ada")).unwrap();

        assert!(matches!(codec().decode(&token), Err(CodecError::BadSignature)));
    }

    #[test]
    fn test_unsigned_payload_is_rejected() {
        let session = Session::new("7", "ada@stay.test", "Ada");
        let bare = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&session).unwrap());

        assert!(matches!(codec().decode(&bare), Err(CodecError::Unsigned)));
    }
}
