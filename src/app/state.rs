use std::sync::Arc;

use crate::{
    config::GlobalConfig,
    services::auth::{CredentialVerifier, Directory, IdentityLookup},
    telemetry::AuthTelemetry,
    utils::codec::SessionCodec,
};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn CredentialVerifier>,
    pub lookup: Arc<dyn IdentityLookup>,
    pub codec: SessionCodec,
    pub telemetry: AuthTelemetry,
}

impl AppState {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        lookup: Arc<dyn IdentityLookup>,
        codec: SessionCodec,
    ) -> Self {
        Self {
            verifier,
            lookup,
            codec,
            telemetry: AuthTelemetry::new(),
        }
    }

    /// Backs both collaborators with the directory seeded from config.
    pub fn from_config(config: &GlobalConfig) -> Self {
        let directory = Arc::new(Directory::new(config.directory.clone()));
        Self::new(directory.clone(), directory, config.session.codec())
    }
}
