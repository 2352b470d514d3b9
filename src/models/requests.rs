use serde::Deserialize;
use utoipa::ToSchema;

/// Login payload forwarded to the credential verifier.
#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@stay.test")]
    pub identifier: String,
    pub secret: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}
