use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Default timeout for ad-hoc waits.
    #[serde(default = "default_wait_timeout", with = "duration_ms")]
    pub wait_timeout: Duration,

    #[serde(default)]
    pub widget: WidgetConfig,

    #[serde(default)]
    pub paginator: PaginatorConfig,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            wait_timeout: default_wait_timeout(),
            widget: WidgetConfig::default(),
            paginator: PaginatorConfig::default(),
        }
    }
}

impl HeraldConfig {
    /// Loads the config from a JSON file. A missing file yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Idle timeout of the control loop; `None` or `0` runs until cancelled.
    #[serde(default = "default_widget_timeout", with = "option_duration_ms")]
    pub timeout: Option<Duration>,

    #[serde(default = "default_query_timeout", with = "duration_ms")]
    pub query_timeout: Duration,

    /// Users allowed to press the controls. Empty means everyone.
    #[serde(default)]
    pub user_whitelist: Vec<String>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            timeout: default_widget_timeout(),
            query_timeout: default_query_timeout(),
            user_whitelist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatorConfig {
    /// Wrap around when navigating past either end.
    #[serde(default = "default_true")]
    pub loop_pages: bool,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            loop_pages: default_true(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_wait_timeout() -> Duration {
    Duration::from_secs(60)
}
fn default_widget_timeout() -> Option<Duration> {
    Some(Duration::from_secs(300))
}
fn default_query_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_true() -> bool {
    true
}

pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

pub mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.filter(|&ms| ms > 0).map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = HeraldConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HeraldConfig::default());
        assert_eq!(config.widget.timeout, Some(Duration::from_secs(300)));
        assert!(config.paginator.loop_pages);
    }

    #[test]
    fn test_durations_in_milliseconds() {
        let config = HeraldConfig::from_json_str(
            r#"{
                "wait_timeout": 1500,
                "widget": { "timeout": null, "query_timeout": 250, "user_whitelist": ["42"] },
                "paginator": { "loop_pages": false }
            }"#,
        )
        .unwrap();
        assert_eq!(config.wait_timeout, Duration::from_millis(1500));
        assert_eq!(config.widget.timeout, None);
        assert_eq!(config.widget.query_timeout, Duration::from_millis(250));
        assert_eq!(config.widget.user_whitelist, vec!["42".to_string()]);
        assert!(!config.paginator.loop_pages);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["wait_timeout"], 1500);
        assert!(json["widget"]["timeout"].is_null());
    }

    #[test]
    fn test_zero_widget_timeout_disables_it() {
        let config = HeraldConfig::from_json_str(r#"{ "widget": { "timeout": 0 } }"#).unwrap();
        assert_eq!(config.widget.timeout, None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "widget": {{ "timeout": 50 }} }}"#).unwrap();
        let config = HeraldConfig::from_file(file.path()).unwrap();
        assert_eq!(config.widget.timeout, Some(Duration::from_millis(50)));

        let missing = HeraldConfig::from_file("/nonexistent/herald.json").unwrap();
        assert_eq!(missing, HeraldConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let result = HeraldConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
