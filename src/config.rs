//! Process settings.
//!
//! Defaults, then an optional TOML file named by `STEEP_CONFIG`, then
//! individual environment overrides:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `STEEP_LISTEN` | `listen` | `0.0.0.0:2048` |
//! | `STEEP_STATIC_DIR` | `static_dir` | `client/build` |
//! | `STEEP_LOG` | `log_filter` | `info` |
//! | `STEEP_ADMIN_USER` | `admin_user` | `jemo` |
//! | `STEEP_MAX_BODY_BYTES` | `max_body_bytes` | `1048576` |
//!
//! ```toml
//! listen = "127.0.0.1:8080"
//! static_dir = "public"
//! log_filter = "steep=debug,info"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::server::DEFAULT_MAX_BODY_BYTES;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: `{value}`")]
    InvalidVar { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Socket address the server binds.
    pub listen: SocketAddr,
    /// Directory served for unmatched paths. Empty disables the fallback.
    pub static_dir: PathBuf,
    /// `tracing-subscriber` filter directives, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Principal attached to `/admin` requests.
    pub admin_user: String,
    /// Largest request body the server buffers.
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 2048)),
            static_dir: PathBuf::from("client/build"),
            log_filter: "info".to_owned(),
            admin_user: "jemo".to_owned(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = match lookup("STEEP_CONFIG") {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };

        if let Some(value) = lookup("STEEP_LISTEN") {
            settings.listen = value
                .parse()
                .map_err(|_| ConfigError::InvalidVar { var: "STEEP_LISTEN", value })?;
        }
        if let Some(value) = lookup("STEEP_STATIC_DIR") {
            settings.static_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("STEEP_LOG") {
            settings.log_filter = value;
        }
        if let Some(value) = lookup("STEEP_ADMIN_USER") {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidVar { var: "STEEP_ADMIN_USER", value });
            }
            settings.admin_user = value;
        }
        if let Some(value) = lookup("STEEP_MAX_BODY_BYTES") {
            settings.max_body_bytes = value
                .parse()
                .map_err(|_| ConfigError::InvalidVar { var: "STEEP_MAX_BODY_BYTES", value })?;
        }

        Ok(settings)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    /// The static directory, unless serving static files is disabled.
    pub fn static_root(&self) -> Option<&std::path::Path> {
        (!self.static_dir.as_os_str().is_empty()).then_some(self.static_dir.as_path())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.listen.port(), 2048);
        assert_eq!(settings.static_root(), Some(std::path::Path::new("client/build")));
    }

    #[test]
    fn environment_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("STEEP_LISTEN", "127.0.0.1:9000"),
            ("STEEP_STATIC_DIR", ""),
            ("STEEP_ADMIN_USER", "root"),
            ("STEEP_MAX_BODY_BYTES", "4096"),
        ]))
        .unwrap();

        assert_eq!(settings.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(settings.static_root(), None);
        assert_eq!(settings.admin_user, "root");
        assert_eq!(settings.max_body_bytes, 4096);
    }

    #[test]
    fn bad_listen_address_is_reported() {
        let err = Settings::from_lookup(lookup(&[("STEEP_LISTEN", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { var: "STEEP_LISTEN", .. }));

        let err = Settings::from_lookup(lookup(&[("STEEP_MAX_BODY_BYTES", "1MB")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { var: "STEEP_MAX_BODY_BYTES", .. }));
    }

    #[test]
    fn file_then_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen = \"127.0.0.1:8080\"\nlog_filter = \"debug\"").unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let settings = Settings::from_lookup(lookup(&[
            ("STEEP_CONFIG", path.as_str()),
            ("STEEP_LOG", "warn"),
        ]))
        .unwrap();

        assert_eq!(settings.listen.port(), 8080);
        assert_eq!(settings.log_filter, "warn");
        assert_eq!(settings.admin_user, "jemo");
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 1").unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let err = Settings::from_lookup(lookup(&[("STEEP_CONFIG", path.as_str())])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
