//! Configuration the core consumes, already parsed by an external loader.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Poll cadences and paths the daemon needs. The core never parses this
/// from YAML/JSON itself — whatever embeds it is responsible for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub git_interval: Duration,
    pub session_interval: Duration,
    pub workspace_interval: Duration,
    pub plan_interval: Duration,
    pub note_interval: Duration,
    pub socket_path: std::path::PathBuf,
    pub pid_path: std::path::PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_interval: Duration::from_secs(10),
            session_interval: Duration::from_secs(2),
            workspace_interval: Duration::from_secs(30),
            plan_interval: Duration::from_secs(30),
            note_interval: Duration::from_secs(60),
            socket_path: default_state_dir().join("daemon.sock"),
            pid_path: default_state_dir().join("daemon.pid"),
        }
    }
}

/// `$XDG_STATE_HOME/grove`, falling back to `~/.local/state/grove`.
fn default_state_dir() -> std::path::PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        return std::path::PathBuf::from(xdg).join("grove");
    }
    dirs::state_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/state"))
        .join("grove")
}

fn serialize_duration<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&humantime::format_duration(*d).to_string())
}

fn deserialize_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(d)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Effective configuration reported at `/api/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningConfig {
    pub started_at: u64,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub git_interval: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub session_interval: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub workspace_interval: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub plan_interval: Duration,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub note_interval: Duration,
}

impl RunningConfig {
    pub fn from_config(config: &Config, started_at: u64) -> Self {
        Self {
            started_at,
            git_interval: config.git_interval,
            session_interval: config.session_interval,
            workspace_interval: config.workspace_interval,
            plan_interval: config.plan_interval,
            note_interval: config.note_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_serializes_as_human_readable_string() {
        let config = RunningConfig::from_config(&Config::default(), 0);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["git_interval"], "10s");
        assert_eq!(json["session_interval"], "2s");
    }

    #[test]
    fn interval_round_trips_through_json() {
        let config = RunningConfig::from_config(&Config::default(), 0);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RunningConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.git_interval, config.git_interval);
        assert_eq!(parsed.session_interval, config.session_interval);
    }

    #[test]
    fn default_config_uses_xdg_state_home_when_set() {
        std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state-test");
        let config = Config::default();
        assert_eq!(
            config.socket_path,
            std::path::PathBuf::from("/tmp/xdg-state-test/grove/daemon.sock")
        );
        std::env::remove_var("XDG_STATE_HOME");
    }
}
