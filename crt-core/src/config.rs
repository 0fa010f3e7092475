use crate::error::{CoreError, Result};
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::{Host, Url};

/// Default local endpoint serving the active content record
pub const DEFAULT_NOW_PLAYING_URL: &str = "http://localhost:8080/now-playing";

const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2000;
const DEFAULT_SCREEN_WIDTH: u32 = 640;
const DEFAULT_SCREEN_HEIGHT: u32 = 480;
const DEFAULT_CHAR_LIMIT: usize = 31;
const DEFAULT_CRT_PIN: u32 = 26;
const DEFAULT_FAN_PIN: u32 = 18;
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_SENSOR_DEVICE: &str = "/sys/bus/iio/devices/iio:device0";
const DEFAULT_CONDITIONS_INTERVAL_SECS: u64 = 30;
const DEFAULT_PUBLISH_MAX_RETRIES: u32 = 3;

/// Main configuration structure shared by every service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub now_playing: NowPlayingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub crt: CrtPowerConfig,
    #[serde(default)]
    pub fan: FanConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub conditions: ConditionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowPlayingConfig {
    #[serde(default = "default_now_playing_url")]
    pub url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Kept below the poll interval so a hung request cannot swallow several ticks
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_now_playing_url() -> String {
    DEFAULT_NOW_PLAYING_URL.to_string()
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for NowPlayingConfig {
    fn default() -> Self {
        Self {
            url: default_now_playing_url(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl NowPlayingConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub fullscreen: bool,
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
    /// Lines longer than this scroll horizontally
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,
}

const fn default_true() -> bool {
    true
}

const fn default_screen_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}

const fn default_screen_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}

const fn default_char_limit() -> usize {
    DEFAULT_CHAR_LIMIT
}

impl DisplayConfig {
    /// Edge length of the square artwork image, 65% of the screen height
    #[must_use]
    pub const fn artwork_size(&self) -> u32 {
        self.height / 20 * 13
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            width: default_screen_width(),
            height: default_screen_height(),
            char_limit: default_char_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrtPowerConfig {
    #[serde(default = "default_crt_pin")]
    pub gpio_pin: u32,
}

const fn default_crt_pin() -> u32 {
    DEFAULT_CRT_PIN
}

impl Default for CrtPowerConfig {
    fn default() -> Self {
        Self {
            gpio_pin: default_crt_pin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanConfig {
    #[serde(default = "default_fan_pin")]
    pub gpio_pin: u32,
}

const fn default_fan_pin() -> u32 {
    DEFAULT_FAN_PIN
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            gpio_pin: default_fan_pin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionsConfig {
    #[serde(default = "default_sensor_device")]
    pub sensor_device: PathBuf,
    #[serde(default = "default_conditions_interval")]
    pub interval_secs: u64,
    /// Where readings are POSTed; required by the conditions reporter only
    #[serde(default)]
    pub publish_url: Option<String>,
    #[serde(default = "default_publish_max_retries")]
    pub max_retries: u32,
}

fn default_sensor_device() -> PathBuf {
    PathBuf::from(DEFAULT_SENSOR_DEVICE)
}

const fn default_conditions_interval() -> u64 {
    DEFAULT_CONDITIONS_INTERVAL_SECS
}

const fn default_publish_max_retries() -> u32 {
    DEFAULT_PUBLISH_MAX_RETRIES
}

impl Default for ConditionsConfig {
    fn default() -> Self {
        Self {
            sensor_device: default_sensor_device(),
            interval_secs: default_conditions_interval(),
            publish_url: None,
            max_retries: default_publish_max_retries(),
        }
    }
}

impl ConditionsConfig {
    /// Validated publish URL.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL is configured or it is not an http(s) URL.
    pub fn publish_url(&self) -> Result<Url> {
        let raw = self
            .publish_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| CoreError::ConfigMissingField {
                field: "conditions.publish_url".into(),
            })?;
        parse_http_url("conditions.publish_url", raw)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    /// Get the configuration directory path (~/.config/smart-mini-crt/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/smart-mini-crt/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create the template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an error
    /// if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Same as [`Config::load_or_create`] for an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Config::load_or_create`].
    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        Self::parse(&content)
    }

    /// Parse and validate config from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let now_playing = parse_http_url("now_playing.url", &self.now_playing.url)?;
        self.check_control_port_free(&now_playing)?;

        if self.now_playing.poll_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "now_playing.poll_interval_ms must be greater than zero".into(),
            });
        }
        if self.now_playing.request_timeout_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "now_playing.request_timeout_ms must be greater than zero".into(),
            });
        }
        if self.conditions.interval_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "conditions.interval_secs must be greater than zero".into(),
            });
        }
        if let Some(raw) = self.conditions.publish_url.as_deref() {
            if !raw.is_empty() {
                parse_http_url("conditions.publish_url", raw)?;
            }
        }

        Ok(())
    }

    /// `crt-gui` and `crt-control` share the Pi, so a local now-playing URL
    /// must not point at the control API's port.
    fn check_control_port_free(&self, now_playing: &Url) -> Result<()> {
        let is_local = match now_playing.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
            Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
            None => false,
        };
        let listen_port = self
            .control
            .listen_addr
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok());

        match (is_local, listen_port) {
            (true, Some(port)) if now_playing.port_or_known_default() == Some(port) => {
                Err(CoreError::ConfigInvalid {
                    message: format!(
                        "now_playing.url ({}) points at control.listen_addr ({}); the control API has no now-playing route",
                        self.now_playing.url, self.control.listen_addr
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Parse a URL and require an http or https scheme
fn parse_http_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| CoreError::ConfigInvalid {
        message: format!("{field} is not a valid URL ({raw}): {e}"),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CoreError::ConfigInvalid {
            message: format!("{field} must use http or https, got {other}"),
        }),
    }
}

/// Config file written on first run
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# Smart Mini CRT Configuration
# ~/.config/smart-mini-crt/config.toml

[now_playing]
# Local endpoint returning the active content record as JSON
url = ""#,
    DEFAULT_NOW_PLAYING_URL,
    r#""
poll_interval_ms = "#,
    DEFAULT_POLL_INTERVAL_MS,
    r"
request_timeout_ms = ",
    DEFAULT_REQUEST_TIMEOUT_MS,
    r"

[display]
fullscreen = true
width = ",
    DEFAULT_SCREEN_WIDTH,
    r"
height = ",
    DEFAULT_SCREEN_HEIGHT,
    r"
# Title lines longer than this scroll horizontally
char_limit = ",
    DEFAULT_CHAR_LIMIT,
    r"

[crt]
# GPIO pin switching the CRT display power
gpio_pin = ",
    DEFAULT_CRT_PIN,
    r"

[fan]
gpio_pin = ",
    DEFAULT_FAN_PIN,
    r#"

[control]
# Address the fan / CRT power API listens on
listen_addr = ""#,
    DEFAULT_LISTEN_ADDR,
    r#""

[conditions]
# IIO device directory of the DHT22 kernel driver
sensor_device = ""#,
    DEFAULT_SENSOR_DEVICE,
    r#""
interval_secs = "#,
    DEFAULT_CONDITIONS_INTERVAL_SECS,
    r#"
# Required by crt-conditions-reporter: readings are POSTed here as JSON
# publish_url = "http://homeassistant.local:8123/api/webhook/crtpi_dht22"
max_retries = "#,
    DEFAULT_PUBLISH_MAX_RETRIES,
    r"

[logging]
# Also write logs to ~/.cache/smart-mini-crt/<service>.log
enabled = false
"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = Config::parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.now_playing.url, DEFAULT_NOW_PLAYING_URL);
        assert_eq!(config.now_playing.poll_interval_ms, 3000);
        assert_eq!(config.now_playing.request_timeout_ms, 2000);
        assert!(config.display.fullscreen);
        assert_eq!(config.display.char_limit, 31);
        assert_eq!(config.crt.gpio_pin, 26);
        assert_eq!(config.fan.gpio_pin, 18);
        assert_eq!(config.conditions.interval_secs, 30);
        assert!(config.conditions.publish_url.is_none());
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.now_playing.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.now_playing.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.control.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::parse(
            r#"
[now_playing]
url = "http://127.0.0.1:8080/api/active"
"#,
        )
        .unwrap();
        assert_eq!(config.now_playing.url, "http://127.0.0.1:8080/api/active");
        assert_eq!(config.now_playing.poll_interval_ms, 3000);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = Config::parse(
            r#"
[now_playing]
url = "not a url"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let err = Config::parse(
            r#"
[now_playing]
url = "ftp://localhost/now-playing"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_default_ports_do_not_collide() {
        let config = Config::default();
        let now_playing = Url::parse(&config.now_playing.url).unwrap();
        assert_ne!(
            now_playing.port_or_known_default(),
            config.control.listen_addr.rsplit_once(':').and_then(|(_, p)| p.parse().ok())
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_now_playing_on_control_port_rejected() {
        for url in [
            "http://localhost:5000/now-playing",
            "http://127.0.0.1:5000/now-playing",
            "http://[::1]:5000/now-playing",
        ] {
            let err = Config::parse(&format!("[now_playing]\nurl = \"{url}\"\n")).unwrap_err();
            assert!(matches!(err, CoreError::ConfigInvalid { .. }), "{url}");
        }

        let err = Config::parse(
            r#"
[now_playing]
url = "http://localhost/now-playing"

[control]
listen_addr = "0.0.0.0:80"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));

        // Same port on another host is fine
        Config::parse("[now_playing]\nurl = \"http://media-pc.local:5000/now-playing\"\n")
            .unwrap();
    }

    #[test]
    fn test_artwork_size_follows_screen_height() {
        assert_eq!(DisplayConfig::default().artwork_size(), 312);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = Config::parse("[now_playing]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_toml_syntax_error() {
        let err = Config::parse("[now_playing\nurl = ").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParseError(_)));
    }

    #[test]
    fn test_publish_url_required_when_requested() {
        let config = Config::default();
        assert!(matches!(
            config.conditions.publish_url(),
            Err(CoreError::ConfigMissingField { .. })
        ));

        let config = Config::parse(
            r#"
[conditions]
publish_url = "http://homeassistant.local:8123/api/webhook/crtpi"
"#,
        )
        .unwrap();
        let url = config.conditions.publish_url().unwrap();
        assert_eq!(url.host_str(), Some("homeassistant.local"));
    }

    #[test]
    fn test_load_or_create_writes_template_then_loads() {
        let dir = std::env::temp_dir().join(format!(
            "crt-core-config-test-{}",
            std::process::id()
        ));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let first = Config::load_or_create_at(&path);
        assert!(matches!(first, Err(CoreError::ConfigNotFound { .. })));
        assert!(path.exists());

        let second = Config::load_or_create_at(&path).unwrap();
        assert_eq!(second.now_playing.url, DEFAULT_NOW_PLAYING_URL);

        let _ = fs::remove_dir_all(&dir);
    }
}
