use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::{
    config::DirectoryEntry,
    models::{
        errors::AuthError,
        identity::{Identity, IdentityStatus},
        requests::LoginRequest,
        session::SubjectKind,
    },
};

/// Checks a login identifier and secret against the account store.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(
        &self,
        kind: SubjectKind,
        credentials: &LoginRequest,
    ) -> Result<Identity, AuthError>;
}

/// Answers whether a subject may still sign in. Only consulted at login.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn lookup(
        &self,
        kind: SubjectKind,
        subject_id: &str,
    ) -> Result<Option<IdentityStatus>, AuthError>;
}

pub fn hash_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

pub async fn authenticate(
    verifier: &dyn CredentialVerifier,
    lookup: &dyn IdentityLookup,
    kind: SubjectKind,
    credentials: &LoginRequest,
) -> Result<Identity, AuthError> {
    let identity = verifier.verify(kind, credentials).await?;

    if !identity.active {
        return Err(AuthError::AccountInactive);
    }

    match lookup.lookup(kind, &identity.subject_id).await? {
        Some(status) if status.active => Ok(identity),
        Some(_) => Err(AuthError::AccountInactive),
        None => Err(AuthError::InvalidCredentials),
    }
}

/// In-memory account directory keyed by portal and lowercased email.
#[derive(Default)]
pub struct Directory {
    accounts: DashMap<(SubjectKind, String), DirectoryEntry>,
}

impl Directory {
    pub fn new(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let directory = Self::default();
        for entry in entries {
            directory.insert(entry);
        }
        directory
    }

    pub fn insert(&self, entry: DirectoryEntry) {
        self.accounts
            .insert((entry.kind, entry.email.to_lowercase()), entry);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for Directory {
    async fn verify(
        &self,
        kind: SubjectKind,
        credentials: &LoginRequest,
    ) -> Result<Identity, AuthError> {
        let key = (kind, credentials.identifier.trim().to_lowercase());
        let entry = self
            .accounts
            .get(&key)
            .ok_or(AuthError::InvalidCredentials)?;

        if hash_secret(&credentials.secret) != entry.secret_sha256 {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity {
            subject_id: entry.subject_id.clone(),
            email: entry.email.clone(),
            display_name: entry.display_name.clone(),
            active: entry.active,
        })
    }
}

#[async_trait]
impl IdentityLookup for Directory {
    async fn lookup(
        &self,
        kind: SubjectKind,
        subject_id: &str,
    ) -> Result<Option<IdentityStatus>, AuthError> {
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.kind == kind && entry.subject_id == subject_id)
            .map(|entry| IdentityStatus {
                active: entry.active,
            }))
    }
}
