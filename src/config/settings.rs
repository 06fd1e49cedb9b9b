use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::models::FrameAction;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerSettings,
    pub assets: AssetSettings,
    pub logging: LoggingSettings,
    pub security: SecuritySettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub static_dir: PathBuf,
    pub index_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

/// Parameters of the response-header policies registered at startup.
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub frame_action: FrameAction,
    /// Strict-Transport-Security max-age, in seconds.
    pub hsts_max_age: u64,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,
    /// Emit Strict-Transport-Security on plain HTTP exchanges as well.
    pub hsts_force: bool,
    pub dns_prefetch_allow: bool,
    pub csp_default_src: Vec<String>,
    pub csp_script_src: Vec<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_index_file() -> PathBuf {
    PathBuf::from("views/index.html")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_hsts_max_age() -> u64 {
    // 90 days
    90 * 24 * 60 * 60
}
fn default_csp_default_src() -> Vec<String> {
    vec!["'self'".to_string()]
}
fn default_csp_script_src() -> Vec<String> {
    vec!["'self'".to_string(), "trusted-cdn.com".to_string()]
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            index_file: default_index_file(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            frame_action: FrameAction::Deny,
            hsts_max_age: default_hsts_max_age(),
            hsts_include_subdomains: true,
            hsts_preload: false,
            hsts_force: true,
            dns_prefetch_allow: false,
            csp_default_src: default_csp_default_src(),
            csp_script_src: default_csp_script_src(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings from an arbitrary variable source. Unset or blank
    /// variables fall back to their defaults; set but unparsable ones are an
    /// error.
    pub fn from_lookup<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| source(key).filter(|value| !value.trim().is_empty());

        let settings = Settings {
            server: ServerSettings {
                host: lookup("HOST").unwrap_or_else(default_host),
                port: parse_var(&lookup, "PORT")?.unwrap_or_else(default_port),
            },
            assets: AssetSettings {
                static_dir: lookup("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_static_dir),
                index_file: lookup("INDEX_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_index_file),
            },
            logging: LoggingSettings {
                level: lookup("LOG_LEVEL").unwrap_or_else(default_log_level),
                format: lookup("LOG_FORMAT").unwrap_or_else(default_log_format),
            },
            security: SecuritySettings {
                frame_action: parse_var(&lookup, "FRAME_ACTION")?.unwrap_or(FrameAction::Deny),
                hsts_max_age: parse_var(&lookup, "HSTS_MAX_AGE")?
                    .unwrap_or_else(default_hsts_max_age),
                hsts_include_subdomains: parse_flag(&lookup, "HSTS_INCLUDE_SUBDOMAINS")?
                    .unwrap_or(true),
                hsts_preload: parse_flag(&lookup, "HSTS_PRELOAD")?.unwrap_or(false),
                hsts_force: parse_flag(&lookup, "HSTS_FORCE")?.unwrap_or(true),
                dns_prefetch_allow: parse_flag(&lookup, "DNS_PREFETCH_ALLOW")?.unwrap_or(false),
                csp_default_src: lookup("CSP_DEFAULT_SRC")
                    .map(|s| split_list(&s))
                    .unwrap_or_else(default_csp_default_src),
                csp_script_src: lookup("CSP_SCRIPT_SRC")
                    .map(|s| split_list(&s))
                    .unwrap_or_else(default_csp_script_src),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT",
                value: self.logging.format.clone(),
                reason: "expected \"pretty\" or \"json\"".to_string(),
            });
        }

        if self.security.csp_default_src.is_empty() {
            return Err(ConfigError::Validation(
                "CSP_DEFAULT_SRC must list at least one source".to_string(),
            ));
        }

        Ok(())
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
