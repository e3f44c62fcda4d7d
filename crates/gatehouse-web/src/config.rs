//! Runtime configuration.
//!
//! Read from a TOML file (optional) layered under `GATEHOUSE_*` environment
//! variables, e.g. `GATEHOUSE_DATABASE__SQLITE__PATH=/var/lib/gh.db` or
//! `GATEHOUSE_AUTH__ADMIN_EMAILS=a@x.com,b@x.com`. Every field has a default,
//! so an empty configuration yields a working development server.

use std::{fmt, path::{Path, PathBuf}};

use serde::Deserialize;

pub const ENV_PREFIX: &str = "GATEHOUSE";

/// Load configuration from `path` (if it exists) and the environment.
pub fn load(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("auth.admin_emails"),
    )
    .build()?
    .try_deserialize()
}

// ─── Server ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub app_name:   String,
  pub database:   DatabaseConfig,
  pub auth:       AuthSettings,
  pub monitoring: MonitoringSettings,
  pub logging:    LoggingSettings,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8501,
      app_name:   "Gatehouse".to_string(),
      database:   DatabaseConfig::default(),
      auth:       AuthSettings::default(),
      monitoring: MonitoringSettings::default(),
      logging:    LoggingSettings::default(),
    }
  }
}

// ─── Database ────────────────────────────────────────────────────────────────

pub const DEFAULT_SQLITE_PATH: &str = "data/app.db";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  pub postgres: Option<PostgresConfig>,
  pub sqlite:   Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
  /// Full connection URL. Takes precedence over the individual fields.
  pub url:      Option<String>,
  pub host:     String,
  pub port:     u16,
  pub database: String,
  pub username: String,
  pub password: String,
}

impl Default for PostgresConfig {
  fn default() -> Self {
    Self {
      url:      None,
      host:     "localhost".to_string(),
      port:     5432,
      database: "gatehouse".to_string(),
      username: "postgres".to_string(),
      password: String::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
  pub path: PathBuf,
}

/// Where the store lives, resolved from [`DatabaseConfig`].
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
  Postgres { url: String },
  Sqlite { path: PathBuf },
}

impl DatabaseConfig {
  /// Pick the store: PostgreSQL if configured, else the configured SQLite
  /// file, else [`DEFAULT_SQLITE_PATH`].
  pub fn target(&self) -> DatabaseTarget {
    if let Some(pg) = &self.postgres {
      let url = pg.url.clone().unwrap_or_else(|| {
        format!(
          "postgresql://{}:{}@{}:{}/{}",
          pg.username, pg.password, pg.host, pg.port, pg.database
        )
      });
      return DatabaseTarget::Postgres { url };
    }

    let path = self
      .sqlite
      .as_ref()
      .map_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH), |s| s.path.clone());
    DatabaseTarget::Sqlite { path }
  }
}

// Never print credentials.
impl fmt::Display for DatabaseTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Postgres { url } => write!(f, "postgres {}", redact_password(url)),
      Self::Sqlite { path } => write!(f, "sqlite {}", path.display()),
    }
  }
}

impl fmt::Debug for DatabaseTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}

fn redact_password(url: &str) -> String {
  let Some((scheme, rest)) = url.split_once("://") else {
    return url.to_string();
  };
  let Some((userinfo, host)) = rest.rsplit_once('@') else {
    return url.to_string();
  };
  match userinfo.split_once(':') {
    Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
    None => url.to_string(),
  }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Settings for the authenticating proxy that sits in front of the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
  /// Emails granted the admin role. Empty means nobody is admin.
  pub admin_emails: Vec<String>,
  /// Where the proxy starts its sign-in flow.
  pub login_url:    String,
  /// Where the proxy ends the provider session.
  pub logout_url:   String,
  pub headers:      IdentityHeaderNames,
}

impl Default for AuthSettings {
  fn default() -> Self {
    Self {
      admin_emails: Vec::new(),
      login_url:    "/oauth2/start".to_string(),
      logout_url:   "/oauth2/sign_out".to_string(),
      headers:      IdentityHeaderNames::default(),
    }
  }
}

/// Request headers the proxy uses to forward the signed-in identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityHeaderNames {
  pub email:          String,
  pub subject:        String,
  pub name:           String,
  pub picture:        String,
  pub email_verified: String,
  pub expires:        String,
}

impl Default for IdentityHeaderNames {
  fn default() -> Self {
    Self {
      email:          "x-forwarded-email".to_string(),
      subject:        "x-forwarded-user".to_string(),
      name:           "x-forwarded-preferred-username".to_string(),
      picture:        "x-forwarded-picture".to_string(),
      email_verified: "x-forwarded-email-verified".to_string(),
      expires:        "x-forwarded-expires".to_string(),
    }
  }
}

// ─── Monitoring & logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
  /// Persist tracked activity. Tracking is always logged either way.
  pub enable_analytics: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
  pub format: LogFormat,
}
