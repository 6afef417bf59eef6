//! Engine configuration loading and parsing (`jot.toml`).
//!
//! The engine has deliberately few knobs: the undo-coalescing idle window and
//! the undo-stack depth bound, both under `[history]`. Unknown fields are
//! ignored (TOML deserialization tolerance) so config files can carry
//! settings for newer versions without breaking older ones. A missing or
//! unparsable file falls back to defaults; configuration is never a reason
//! the engine fails to come up.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};

/// Idle window (ms) after which consecutive edits stop coalescing into one
/// undo step.
const DEFAULT_IDLE_MS: u64 = 500;

/// Bound on retained undo batches.
const DEFAULT_MAX_DEPTH: usize = 200;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    #[serde(default = "HistoryConfig::default_idle_ms")]
    pub idle_ms: u64,
    #[serde(default = "HistoryConfig::default_max_depth")]
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            idle_ms: Self::default_idle_ms(),
            max_depth: Self::default_max_depth(),
        }
    }
}

impl HistoryConfig {
    const fn default_idle_ms() -> u64 {
        DEFAULT_IDLE_MS
    }
    const fn default_max_depth() -> usize {
        DEFAULT_MAX_DEPTH
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default)]
    pub history: HistoryConfig,
}

impl EngineConfig {
    /// The idle window as a `Duration` for the history layer.
    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.history.idle_ms)
    }

    /// Undo depth with a floor of one: a zero-depth history would silently
    /// make every edit permanent.
    pub fn max_depth(&self) -> usize {
        self.history.max_depth.max(1)
    }
}

/// Best-effort config path following platform conventions: a local
/// `jot.toml` wins over the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("jot.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("jot").join("jot.toml");
    }
    PathBuf::from("jot.toml")
}

/// Load configuration from `path`, or from [`discover`] when `None`. Missing
/// files and parse errors both yield defaults; a parse error is logged so a
/// typo does not vanish silently.
pub fn load_from(path: Option<PathBuf>) -> Result<EngineConfig> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(EngineConfig::default());
    };
    match toml::from_str::<EngineConfig>(&content) {
        Ok(cfg) => {
            info!(
                target: "config",
                path = %path.display(),
                idle_ms = cfg.history.idle_ms,
                max_depth = cfg.history.max_depth,
                "config_loaded"
            );
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(EngineConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log lines; clones share the same buffer.
    #[derive(Clone, Default)]
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl LogSink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogSink {
        type Writer = LogSink;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.history.idle_ms, 500);
        assert_eq!(cfg.history.max_depth, 200);
    }

    #[test]
    fn parses_history_table() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\nidle_ms = 250\nmax_depth = 50\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.history.idle_ms, 250);
        assert_eq!(cfg.history.max_depth, 50);
        assert_eq!(cfg.idle_window(), Duration::from_millis(250));
    }

    #[test]
    fn partial_table_keeps_remaining_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\nidle_ms = 100\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.history.idle_ms, 100);
        assert_eq!(cfg.history.max_depth, 200);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[history]\nidle_ms = 100\n[future]\nshiny = true\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.history.idle_ms, 100);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history\nidle_ms = oops").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn parse_error_is_logged_on_the_config_target() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "history = not toml at all").unwrap();

        let sink = LogSink::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(sink.clone())
            .finish();

        let cfg = with_default(subscriber, || {
            load_from(Some(tmp.path().to_path_buf())).unwrap()
        });

        let log_output = sink.contents();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed_using_defaults"));
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn zero_depth_is_floored() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\nmax_depth = 0\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.max_depth(), 1);
    }
}
