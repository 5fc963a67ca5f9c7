//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub qr_secret: String,
    pub qr_rotation_seconds: i64,
    pub qr_freshness_seconds: i64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing or improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET is required");
        // The QR signing key may be rotated independently of the JWT key;
        // single-key deployments fall back to the JWT secret.
        let qr_secret = env::var("QR_SECRET").unwrap_or_else(|_| jwt_secret.clone());

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "rollcall".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()
                .unwrap(),
            jwt_secret,
            jwt_duration_minutes: env::var("JWT_DURATION_MINUTES")
                .unwrap_or("60".into())
                .parse()
                .unwrap(),
            qr_secret,
            qr_rotation_seconds: env::var("QR_ROTATION_SECONDS")
                .unwrap_or("180".into())
                .parse()
                .unwrap(),
            qr_freshness_seconds: env::var("QR_FRESHNESS_SECONDS")
                .unwrap_or("300".into())
                .parse()
                .unwrap(),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// A fixed configuration for tests, bypassing the environment entirely.
    pub fn test_defaults() -> Self {
        Self {
            env: "test".into(),
            project_name: "rollcall".into(),
            log_level: "api=debug".into(),
            log_file: "api.log".into(),
            log_to_stdout: false,
            database_path: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: "test-jwt-secret".into(),
            jwt_duration_minutes: 60,
            qr_secret: "test-qr-secret".into(),
            qr_rotation_seconds: 180,
            qr_freshness_seconds: 300,
        }
    }

    /// Installs the given configuration without touching the environment.
    pub fn install(cfg: AppConfig) {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(cfg.clone()));
        *lock.write().expect("Failed to acquire AppConfig write lock") = cfg;
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap();
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_qr_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.qr_secret = value.into());
    }

    pub fn set_qr_rotation_seconds(value: i64) {
        AppConfig::set_field(|cfg| cfg.qr_rotation_seconds = value);
    }

    pub fn set_qr_freshness_seconds(value: i64) {
        AppConfig::set_field(|cfg| cfg.qr_freshness_seconds = value);
    }
}

// --- Convenience accessors used across the workspace ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn qr_secret() -> String {
    AppConfig::global().qr_secret.clone()
}

pub fn qr_rotation_seconds() -> i64 {
    AppConfig::global().qr_rotation_seconds
}

pub fn qr_freshness_seconds() -> i64 {
    AppConfig::global().qr_freshness_seconds
}
