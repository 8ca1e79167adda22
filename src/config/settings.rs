//! Streamer settings, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Values are read once at
//! startup; the streamer does not renegotiate them while running.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// StreamConfig
// ---------------------------------------------------------------------------

/// Capture and chunking parameters for [`crate::stream::MicStreamer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Output sample rate in Hz expected by the STT backend.
    pub output_sample_rate: u32,
    /// Samples per emitted chunk at the output rate (1024 ≈ 64 ms @ 16 kHz).
    pub output_chunk_samples: usize,
    /// Length of the circular capture clip in seconds.  Must stay well above
    /// one tick's worth of audio or the writer laps the reader.
    pub buffer_secs: u32,
    /// How long the device may take to deliver its first samples.
    pub startup_timeout_ms: u64,
    /// Host loop period used by the binary.
    pub tick_interval_ms: u64,
    /// Log the device write cursor periodically while streaming.
    pub verbose_logs: bool,
    /// Period of the cursor log line.
    pub position_log_interval_ms: u64,
    /// Input device name — `None` means the system default.
    pub audio_device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            output_sample_rate: 16_000,
            output_chunk_samples: 1_024,
            buffer_secs: 5,
            startup_timeout_ms: 3_000,
            tick_interval_ms: 16,
            verbose_logs: true,
            position_log_interval_ms: 500,
            audio_device: None,
        }
    }
}

impl StreamConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn position_log_interval(&self) -> Duration {
        Duration::from_millis(self.position_log_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// TransportConfig
// ---------------------------------------------------------------------------

/// Where emitted chunks go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// File receiving JSON-lines messages; `None` writes to stdout.
    pub output_path: Option<PathBuf>,
    /// Append `{"eventType":"stop"}` when the stream ends.
    pub send_stop_marker: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            send_stop_marker: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use mic_streamer::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.stream.output_sample_rate, 16_000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub transport: TransportConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.stream.output_sample_rate, 16_000);
        assert_eq!(cfg.stream.output_chunk_samples, 1_024);
        assert_eq!(cfg.stream.buffer_secs, 5);
        assert_eq!(cfg.stream.startup_timeout(), Duration::from_secs(3));
        assert!(cfg.stream.audio_device.is_none());
        assert!(cfg.transport.output_path.is_none());
        assert!(cfg.transport.send_stop_marker);
    }

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original, loaded);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.stream.buffer_secs = 10;
        cfg.stream.verbose_logs = false;
        cfg.stream.audio_device = Some("USB Microphone".into());
        cfg.transport.output_path = Some(PathBuf::from("/tmp/chunks.jsonl"));
        cfg.transport.send_stop_marker = false;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.stream.buffer_secs, 10);
        assert!(!loaded.stream.verbose_logs);
        assert_eq!(loaded.stream.audio_device.as_deref(), Some("USB Microphone"));
        assert_eq!(
            loaded.transport.output_path,
            Some(PathBuf::from("/tmp/chunks.jsonl"))
        );
        assert!(!loaded.transport.send_stop_marker);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[stream]\nbuffer_secs = 8\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.stream.buffer_secs, 8);
        assert_eq!(cfg.stream.output_chunk_samples, 1_024);
        assert!(cfg.transport.send_stop_marker);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[stream\nbuffer_secs = ").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }
}
