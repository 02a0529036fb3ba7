//! Environment-provided runtime configuration.

/// Runtime mode; gates the insecure dev defaults.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Dev,
    Test,
    Production,
}

impl RunMode {
    fn parse(raw: &str) -> Self {
        match raw {
            "production" => Self::Production,
            "test" => Self::Test,
            _ => Self::Dev,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub mode: RunMode,
    pub jwt_secret: String,
    /// Absent in dev/test: the in-memory store is used instead.
    pub database_url: Option<String>,
}

impl ApiConfig {
    /// Read configuration from the environment.
    ///
    /// In dev/test, `JWT_SECRET` falls back to an insecure default with a
    /// warning, so a bare `cargo run` works out of the box. In production
    /// the secret is mandatory.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3333);

        let mode = std::env::var("APP_ENV")
            .map(|m| RunMode::parse(&m))
            .unwrap_or_default();

        let jwt_secret = resolve_jwt_secret(mode, std::env::var("JWT_SECRET").ok())?;

        let database_url = std::env::var("DATABASE_URL").ok();

        Ok(Self {
            port,
            mode,
            jwt_secret,
            database_url,
        })
    }
}

fn resolve_jwt_secret(mode: RunMode, configured: Option<String>) -> anyhow::Result<String> {
    match configured {
        Some(secret) => Ok(secret),
        None if mode == RunMode::Production => {
            anyhow::bail!("JWT_SECRET must be set when APP_ENV=production")
        }
        None => {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            Ok("dev-secret".to_string())
        }
    }
}
