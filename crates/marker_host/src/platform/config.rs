use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "./marker_host.ron";

/// The companion "upload" extension as published in the Chrome web store.
const DEFAULT_COMPANION_ID: &str = "ilemnfmnoanhiapnbdjolbojmpkbhbnp";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogDestination {
    /// Write to the configured log file.
    File,
    /// Write to the terminal (stderr; stdout carries frames).
    Terminal,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Only this extension may push status updates.
    pub companion_id: String,
    /// Root of the persistent storage areas.
    pub storage_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
    /// How long a tab or the companion gets to answer a host-initiated call.
    pub reply_timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            companion_id: DEFAULT_COMPANION_ID.to_string(),
            storage_dir: PathBuf::from("./marker_storage"),
            log_destination: LogDestination::File,
            log_file: PathBuf::from("./marker_host.log"),
            log_level: LogLevel::Info,
            reply_timeout_ms: 5_000,
        }
    }
}

impl HostConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn local_dir(&self) -> PathBuf {
        self.storage_dir.join("local")
    }

    pub fn sync_dir(&self) -> PathBuf {
        self.storage_dir.join("sync")
    }
}

/// Config path from the first command line argument, else the default.
/// Browsers launch native hosts with the caller origin or manifest path as
/// the first argument, so only a `.ron` path is taken.
pub fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.nth(1)
        .filter(|arg| arg.ends_with(".ron"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the host config. A missing file means defaults; fields missing
/// from the file take their defaults too.
pub fn load_config(path: &Path) -> anyhow::Result<HostConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(HostConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };
    ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.reply_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("marker_host.ron");
        fs::write(
            &path,
            r#"(
                companion_id: "abcdefghijklmnopabcdefghijklmnop",
                log_destination: both,
                log_level: debug,
            )"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.companion_id, "abcdefghijklmnopabcdefghijklmnop");
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.log_level.filter(), LevelFilter::Debug);
        assert_eq!(config.storage_dir, HostConfig::default().storage_dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("marker_host.ron");
        fs::write(&path, "(companion_id: 12,").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn path_comes_from_the_first_argument() {
        let args = ["marker_host", "/etc/marker.ron", "chrome-extension://x/"];
        assert_eq!(
            config_path(args.iter().map(|s| s.to_string())),
            PathBuf::from("/etc/marker.ron")
        );
        assert_eq!(
            config_path(["marker_host"].iter().map(|s| s.to_string())),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
        let launched = ["marker_host", "chrome-extension://abcdefghijklmnop/"];
        assert_eq!(
            config_path(launched.iter().map(|s| s.to_string())),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }
}
