//! Station configuration
//!
//! Read from a `station.toml` next to the module configuration. Every key is optional; a missing
//! file section or key falls back to the timings the bench has always run with.
//!
//! ```toml
//! modules = "modules.txt"
//! results = "results"
//! retry_delay_ms = 10
//! scope_timeout_ms = 2000
//! retention = "latest"
//! frequency_scaling = "native"
//! ```

use serde::{ Deserialize, Serialize };
use std::{ fmt, io, path::{ Path, PathBuf }, time::Duration };

/// What a result slot keeps as its measured value across repeated attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy
{
    /// Every attempt overwrites the measured value
    Latest,
    /// The measured value stops changing once the slot has passed, until the buffer is reset
    ///
    /// This is how the first generation of station firmware behaved.
    FirstPass,
}

impl Default for RetentionPolicy
{
    fn default() -> Self
    {
        Self::Latest
    }
}

/// How the frequency reported by the scope is turned into the value that gets range checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyScaling
{
    /// The scope computes frequency from the sample rate the capture was started with
    Native,
    /// Multiply by 16384/20000
    ///
    /// Older scope builds assumed a fixed sample rate that did not match the one captures
    /// actually ran at. Module tables tuned against those builds expect this correction.
    Legacy,
}

impl Default for FrequencyScaling
{
    fn default() -> Self
    {
        Self::Native
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig
{
    /// Module configuration script
    pub modules: Option<PathBuf>,
    /// Where the results of the last tested module are written
    pub results: Option<PathBuf>,
    /// Rail polling period while waiting for insertion or removal
    pub rail_poll_ms: u64,
    /// Pause between attempts of a repeatable operation
    pub retry_delay_ms: u64,
    /// Settling pause after each operation
    pub inter_op_delay_ms: u64,
    /// Scope readiness polling period
    pub scope_poll_ms: u64,
    /// Longest wait for a capture to complete before the check fails
    pub scope_timeout_ms: u64,
    /// Longest wait for a waveform to wind down before a net is switched to a DC level
    pub signal_stop_timeout_ms: u64,
    /// Pause before a failed sequence is run again on a module still in the socket
    pub rerun_delay_ms: u64,
    /// How long rails must stay off before a removal is final and results get saved
    pub removal_debounce_ms: u64,
    pub retention: RetentionPolicy,
    pub frequency_scaling: FrequencyScaling,
}

impl Default for StationConfig
{
    fn default() -> Self
    {
        Self {
            modules: None,
            results: None,
            rail_poll_ms: 100,
            retry_delay_ms: 10,
            inter_op_delay_ms: 1,
            scope_poll_ms: 10,
            scope_timeout_ms: 2000,
            signal_stop_timeout_ms: 500,
            rerun_delay_ms: 500,
            removal_debounce_ms: 1000,
            retention: RetentionPolicy::default(),
            frequency_scaling: FrequencyScaling::default(),
        }
    }
}

impl StationConfig
{
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError>
    {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError>
    {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn rail_poll(&self) -> Duration
    {
        Duration::from_millis(self.rail_poll_ms)
    }

    pub fn retry_delay(&self) -> Duration
    {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn inter_op_delay(&self) -> Duration
    {
        Duration::from_millis(self.inter_op_delay_ms)
    }

    pub fn scope_poll(&self) -> Duration
    {
        Duration::from_millis(self.scope_poll_ms)
    }

    pub fn scope_timeout(&self) -> Duration
    {
        Duration::from_millis(self.scope_timeout_ms)
    }

    pub fn signal_stop_timeout(&self) -> Duration
    {
        Duration::from_millis(self.signal_stop_timeout_ms)
    }

    pub fn rerun_delay(&self) -> Duration
    {
        Duration::from_millis(self.rerun_delay_ms)
    }

    pub fn removal_debounce(&self) -> Duration
    {
        Duration::from_millis(self.removal_debounce_ms)
    }
}

#[derive(Debug)]
pub enum ConfigError
{
    Io(io::Error),
    Toml(toml::de::Error),
}

impl fmt::Display for ConfigError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Io(io_err) => write!(f, "Failed to read station configuration. {}", io_err),
            Self::Toml(toml_err) => write!(f, "Invalid station configuration. {}", toml_err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError
{
    fn from(this: io::Error) -> Self
    {
        Self::Io(this)
    }
}

impl From<toml::de::Error> for ConfigError
{
    fn from(this: toml::de::Error) -> Self
    {
        Self::Toml(this)
    }
}

#[cfg(test)]
mod tests
{
    use super::{ FrequencyScaling, RetentionPolicy, StationConfig };
    use std::time::Duration;

    #[test]
    fn empty_file_is_defaults()
    {
        let config = StationConfig::from_toml_str("").unwrap();

        assert_eq!(config, StationConfig::default());
        assert_eq!(config.retry_delay(), Duration::from_millis(10));
        assert_eq!(config.inter_op_delay(), Duration::from_millis(1));
        assert_eq!(config.rail_poll(), Duration::from_millis(100));
        assert_eq!(config.retention, RetentionPolicy::Latest);
        assert_eq!(config.frequency_scaling, FrequencyScaling::Native);
    }

    #[test]
    fn overrides_apply()
    {
        let config = StationConfig::from_toml_str(
            "modules = \"modules.txt\"\nscope_timeout_ms = 50\nretention = \"first_pass\"\nfrequency_scaling = \"legacy\"\n"
        ).unwrap();

        assert_eq!(config.modules.as_deref(), Some(std::path::Path::new("modules.txt")));
        assert_eq!(config.scope_timeout(), Duration::from_millis(50));
        assert_eq!(config.retention, RetentionPolicy::FirstPass);
        assert_eq!(config.frequency_scaling, FrequencyScaling::Legacy);
        assert_eq!(config.retry_delay_ms, 10);
    }

    #[test]
    fn unknown_keys_rejected()
    {
        assert!(StationConfig::from_toml_str("retry_dealy_ms = 5\n").is_err());
    }
}
