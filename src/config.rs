//! Startup configuration.
//!
//! Loaded once from a JSON file before the server starts serving, immutable
//! afterwards. A config that cannot be loaded is fatal.

use std::path::Path;

use serde::Deserialize;

/// Application configuration, read from a JSON file at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Per-execution deadline in seconds.
    pub timeout: u64,
    /// Whitelist of command names allowed to run.
    pub programs: Vec<String>,
    /// Seconds a terminal record stays queryable before eviction.
    #[serde(rename = "cacheTime")]
    pub cache_time: u64,
    /// Seconds between eviction sweeps.
    #[serde(rename = "sweepInterval", default = "default_sweep_interval")]
    pub sweep_interval: u64,
}

fn default_sweep_interval() -> u64 {
    10
}

impl AppConfig {
    /// Read and parse the config file, then check it is usable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("reading config file {:?}: {}", path, e))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("parsing config file {:?}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.programs.is_empty() {
            return Err("config allows no programs".to_string());
        }
        if self.timeout == 0 {
            return Err("timeout must be at least 1 second".to_string());
        }
        Ok(())
    }

    /// Whether `command` is on the whitelist.
    pub fn allows(&self, command: &str) -> bool {
        self.programs.iter().any(|p| p == command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"{ "timeout": 30, "programs": ["echo", "sleep"], "cacheTime": 300, "sweepInterval": 5 }"#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.programs, vec!["echo", "sleep"]);
        assert_eq!(config.cache_time, 300);
        assert_eq!(config.sweep_interval, 5);
    }

    #[test]
    fn sweep_interval_defaults_to_ten() {
        let file =
            write_config(r#"{ "timeout": 30, "programs": ["echo"], "cacheTime": 300 }"#);
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.sweep_interval, 10);
    }

    #[test]
    fn rejects_empty_whitelist() {
        let file = write_config(r#"{ "timeout": 30, "programs": [], "cacheTime": 300 }"#);
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.contains("no programs"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let file = write_config(r#"{ "timeout": 0, "programs": ["echo"], "cacheTime": 300 }"#);
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.contains("timeout"));
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let err = AppConfig::load("/no/such/config.json").unwrap_err();
        assert!(err.contains("/no/such/config.json"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_config("{ not json");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.contains("parsing"));
    }

    #[test]
    fn whitelist_membership() {
        let file = write_config(r#"{ "timeout": 30, "programs": ["echo"], "cacheTime": 300 }"#);
        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.allows("echo"));
        assert!(!config.allows("rm"));
    }
}
