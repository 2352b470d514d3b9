use std::env;

use anyhow::{Context, anyhow};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    models::session::{DEFAULT_MAX_AGE_SECS, SubjectKind, is_valid_subject_id},
    utils::codec::SessionCodec,
};

const DEV_SIGNING_SECRET: &str = "dev-only-signing-secret";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub admin_portal: PortalConfig,
    pub owner_portal: PortalConfig,
    pub rate_limit: RateLimitConfig,
    pub directory: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub max_age_secs: i64,
    pub cookie_secure: bool,
    #[serde(skip_serializing)]
    pub signing_secret: String,
}

impl SessionConfig {
    pub fn max_age(&self) -> Duration {
        Duration::seconds(self.max_age_secs)
    }

    pub fn codec(&self) -> SessionCodec {
        SessionCodec::new(&self.signing_secret)
    }
}

/// One privileged subtree, e.g. `/admin` with its login entry point.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    pub kind: SubjectKind,
    pub root: String,
    pub login_path: String,
    pub gated: bool,
}

impl PortalConfig {
    pub fn new(kind: SubjectKind, root: &str, login_path: &str, gated: bool) -> Self {
        Self {
            kind,
            root: normalize_path(root),
            login_path: normalize_path(login_path),
            gated,
        }
    }

    pub fn subject_path(&self, subject_id: &str) -> String {
        format!("{}/{}", self.root, subject_id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub login_attempts_per_minute: u32,
}

/// Seed account for the in-memory credential directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DirectoryEntry {
    pub kind: SubjectKind,
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub secret_sha256: String,
    pub active: bool,
}

impl DirectoryEntry {
    /// Parses `kind:id:email:display name:sha256hex[:inactive]`.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
        if parts.len() < 5 || parts.len() > 6 {
            return Err(anyhow!("Malformed directory entry: {}", raw));
        }

        let kind = SubjectKind::parse(parts[0])
            .ok_or_else(|| anyhow!("Unknown portal kind in directory entry: {}", parts[0]))?;
        if !is_valid_subject_id(parts[1]) {
            return Err(anyhow!("Invalid subject id in directory entry: {}", parts[1]));
        }
        let active = match parts.get(5) {
            None => true,
            Some(&"inactive") => false,
            Some(other) => return Err(anyhow!("Unknown directory flag: {}", other)),
        };

        Ok(Self {
            kind,
            subject_id: parts[1].to_string(),
            email: parts[2].to_string(),
            display_name: parts[3].to_string(),
            secret_sha256: parts[4].to_lowercase(),
            active,
        })
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            session: SessionConfig {
                max_age_secs: DEFAULT_MAX_AGE_SECS,
                cookie_secure: false,
                signing_secret: DEV_SIGNING_SECRET.to_string(),
            },
            admin_portal: PortalConfig::new(SubjectKind::Admin, "/admin", "/admin/login", true),
            owner_portal: PortalConfig::new(SubjectKind::Owner, "/owner", "/owner/login", false),
            rate_limit: RateLimitConfig {
                login_attempts_per_minute: 10,
            },
            directory: Vec::new(),
        }
    }
}

impl GlobalConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = GlobalConfig::default();

        let directory = match env::var("DIRECTORY_SEED") {
            Ok(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(DirectoryEntry::parse)
                .collect::<anyhow::Result<Vec<_>>>()
                .context("Invalid DIRECTORY_SEED")?,
            Err(_) => Vec::new(),
        };

        let max_age_secs: i64 = parse_var("SESSION_MAX_AGE_SECS", DEFAULT_MAX_AGE_SECS)?;
        if max_age_secs <= 0 {
            return Err(anyhow!("SESSION_MAX_AGE_SECS must be positive"));
        }

        let signing_secret = env::var("SESSION_SIGNING_SECRET")
            .context("SESSION_SIGNING_SECRET must be set")?;
        if signing_secret.trim().is_empty() {
            return Err(anyhow!("SESSION_SIGNING_SECRET must not be empty"));
        }

        Ok(GlobalConfig {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("PORT")
                    .or_else(|_| env::var("SERVER_PORT"))
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.server.cors_allowed_origins),
            },
            session: SessionConfig {
                max_age_secs,
                cookie_secure: parse_var("SESSION_COOKIE_SECURE", false)?,
                signing_secret,
            },
            admin_portal: PortalConfig::new(
                SubjectKind::Admin,
                &env::var("ADMIN_PORTAL_ROOT").unwrap_or(defaults.admin_portal.root),
                &env::var("ADMIN_LOGIN_PATH").unwrap_or(defaults.admin_portal.login_path),
                true,
            ),
            owner_portal: PortalConfig::new(
                SubjectKind::Owner,
                &env::var("OWNER_PORTAL_ROOT").unwrap_or(defaults.owner_portal.root),
                &env::var("OWNER_LOGIN_PATH").unwrap_or(defaults.owner_portal.login_path),
                parse_var("OWNER_PORTAL_GATED", false)?,
            ),
            rate_limit: RateLimitConfig {
                login_attempts_per_minute: parse_var(
                    "LOGIN_RATE_LIMIT_PER_MINUTE",
                    defaults.rate_limit.login_attempts_per_minute,
                )?,
            },
            directory,
        })
    }

    pub fn portal(&self, kind: SubjectKind) -> &PortalConfig {
        match kind {
            SubjectKind::Admin => &self.admin_portal,
            SubjectKind::Owner => &self.owner_portal,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
