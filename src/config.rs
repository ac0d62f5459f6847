//! Process-wide configuration, resolved once at startup and shared through
//! `AppState`.

use std::{fmt::Display, path::PathBuf, str::FromStr};

/// Secret used when no session secret is configured. Refused in production.
pub const DEFAULT_SESSION_SECRET: &str = "dev-session-secret-change-in-production";

const DEFAULT_FROM_EMAIL: &str = "onboarding@resend.dev";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database: Option<DbSettings>,
    pub session_secret: String,
    pub email: EmailSettings,
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub seed_admin: Option<SeedAdmin>,
    pub log: LogSettings,
}

#[derive(Debug, Clone)]
pub struct DbSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EmailSettings {
    pub api_key: Option<String>,
    pub recipient: Option<String>,
    pub from: String,
}

/// Admin account created in the in-memory store when running without a database.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub dir: PathBuf,
    pub json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let environment = first_env(&["ENVIRONMENT", "NODE_ENV"])
            .unwrap_or_else(|| "development".to_string());
        let is_production = environment == "production";

        let database = first_env(&["DATABASE_URL", "SUPABASE_DB_URL", "POSTGRES_URL"]).map(|url| {
            DbSettings {
                url,
                max_connections: parse_env("DB_POOL_MAX", 10),
                min_connections: parse_env("DB_POOL_MIN", 1),
                connect_timeout_secs: parse_env("DB_CONNECT_TIMEOUT", 10),
                idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT", 300),
            }
        });

        let allowed_origins = first_env(&["ALLOWED_ORIGINS", "FRONTEND_ORIGIN"])
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host: first_env(&["HOST"]).unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_env("PORT", 3001),
            database,
            session_secret: first_env(&["SESSION_SECRET", "NEXTAUTH_SECRET", "JWT_SECRET"])
                .unwrap_or_else(|| DEFAULT_SESSION_SECRET.to_string()),
            email: EmailSettings {
                api_key: first_env(&["RESEND_API_KEY"]),
                recipient: first_env(&["CONTACT_NOTIFICATION_EMAIL"]),
                from: first_env(&["RESEND_FROM_EMAIL"])
                    .unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
            },
            public_dir: first_env(&["PUBLIC_DIR"])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            allowed_origins,
            seed_admin: seed_admin_from_env(),
            log: LogSettings {
                level: first_env(&["LOG_LEVEL"]).unwrap_or_else(|| {
                    if is_production { "info" } else { "debug" }.to_string()
                }),
                dir: first_env(&["LOG_DIR"])
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("logs")),
                json: is_production,
            },
            environment,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Session cookies carry `Secure` only in production so local HTTP works.
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }

    pub fn has_default_secret(&self) -> bool {
        self.session_secret.is_empty() || self.session_secret == DEFAULT_SESSION_SECRET
    }

    /// Directory that holds uploaded project images.
    pub fn projects_dir(&self) -> PathBuf {
        self.public_dir.join("projects")
    }
}

/// Returns the first alias that is set to a non-blank value.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match first_env(&[key]) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {key} value {raw:?}: {e}; using default {default}");
            default
        }),
        None => default,
    }
}

fn seed_admin_from_env() -> Option<SeedAdmin> {
    let email = first_env(&["ADMIN_EMAIL"])?;
    let password_hash = match first_env(&["ADMIN_HASH_PASSWORD"]) {
        Some(hash) => hash,
        None => {
            let plain = first_env(&["ADMIN_PASSWORD"])?;
            match bcrypt::hash(&plain, bcrypt::DEFAULT_COST) {
                Ok(hash) => hash,
                Err(e) => {
                    tracing::warn!("Failed to hash ADMIN_PASSWORD: {e}");
                    return None;
                }
            }
        }
    };
    Some(SeedAdmin {
        email,
        password_hash,
    })
}

#[cfg(test)]
impl Config {
    /// Configuration for router tests: no database, no email, files under `public_dir`.
    pub fn for_tests(public_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            database: None,
            session_secret: "test-session-secret".to_string(),
            email: EmailSettings {
                api_key: None,
                recipient: None,
                from: DEFAULT_FROM_EMAIL.to_string(),
            },
            public_dir,
            max_upload_bytes: 1024 * 1024,
            allowed_origins: Vec::new(),
            seed_admin: None,
            log: LogSettings {
                level: "debug".to_string(),
                dir: PathBuf::from("logs"),
                json: false,
            },
        }
    }
}
