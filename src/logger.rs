use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::Config;

static CONSOLE_LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);

/// Installs the global logger. A second call fails and leaves the running
/// configuration untouched.
pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let log_file = open_log_file(&config)?;
    log::set_logger(&*CONSOLE_LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;

    log::set_max_level(config.min_level);
    CONSOLE_LOGGER.update_config(config, log_file);
    Ok(())
}

fn open_log_file(config: &LoggerConfig) -> Result<Option<File>, String> {
    match &config.log_file_path {
        Some(path) => OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(Some)
            .map_err(|e| format!("Failed to open log file {}: {}", path, e)),
        None => Ok(None),
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::Trace => "🔍",
        Level::Debug => "🐛",
        Level::Info => "💡",
        Level::Warn => "⚠️",
        Level::Error => "❌",
    }
}

/// One emitted line, as written in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            timestamp: Utc::now(),
            level: record.level().as_str().to_string(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            file: record.file().map(String::from),
            line: record.line(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_target: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
    /// Lines from other crates (reqwest, hyper) below this level are dropped.
    pub dependency_level: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: true,
            show_emojis: true,
            show_target: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
            dependency_level: LevelFilter::Warn,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: impl AsRef<Path>) -> Self {
        self.log_file_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }

    /// Level from `FLUX_LOG` (`trace`..`error`), falling back to `default`.
    pub fn level_from_env(mut self, default: LevelFilter) -> Self {
        self.min_level = std::env::var("FLUX_LOG")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(default);
        self
    }
}

/// Writes to stderr so command output on stdout stays clean.
pub struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn config(&self) -> MutexGuard<'_, LoggerConfig> {
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update_config(&self, new_config: LoggerConfig, file: Option<File>) {
        *self.log_file.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = file;
        *self.config() = new_config;
    }

    fn format_line(entry: &LogEntry, level: Level, config: &LoggerConfig) -> String {
        let mut output = String::new();

        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        if config.show_colors {
            output.push_str(&format!("{} ", timestamp.bright_black()));
        } else {
            output.push_str(&format!("{} ", timestamp));
        }

        let level_str = if config.show_emojis {
            format!("{} {}", level_emoji(level), entry.level)
        } else {
            entry.level.clone()
        };
        if config.show_colors {
            output.push_str(&format!("[{}] ", level_str.color(level_color(level)).bold()));
        } else {
            output.push_str(&format!("[{}] ", level_str));
        }

        if config.show_target && !entry.target.is_empty() {
            if config.show_colors {
                output.push_str(&format!("{}: ", entry.target.bright_blue()));
            } else {
                output.push_str(&format!("{}: ", entry.target));
            }
        }

        output.push_str(&entry.message);

        if config.show_file_location {
            if let (Some(file), Some(line)) = (&entry.file, entry.line) {
                let location = format!("{}:{}", file, line);
                if config.show_colors {
                    output.push_str(&format!(" ({})", location.bright_black()));
                } else {
                    output.push_str(&format!(" ({})", location));
                }
            }
        }

        output
    }

    fn is_own_target(target: &str) -> bool {
        target == env!("CARGO_CRATE_NAME") || target.starts_with(concat!(env!("CARGO_CRATE_NAME"), "::"))
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let config = self.config();
        if Self::is_own_target(metadata.target()) {
            metadata.level() <= config.min_level
        } else {
            metadata.level() <= config.min_level.min(config.dependency_level)
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_record(record);
        let config = self.config().clone();

        let console = if config.output_json {
            serde_json::to_string(&entry).unwrap_or_default()
        } else {
            Self::format_line(&entry, record.level(), &config)
        };
        eprintln!("{}", console);

        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let line = serde_json::to_string(&entry).unwrap_or_default();
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Measures one request; logs the duration at debug level on drop.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  {} started", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!("⏱️  {} finished in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {} v{}", app_name, version);
}

pub fn log_config_info(config: &Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Image service: {}", config.service.base_url_or_default());
    log::info!(
        "   Size: {}-{} px (step {}), steps: {}-{}",
        config.limits.width.min,
        config.limits.width.max,
        config.limits.width.step,
        config.limits.steps.min,
        config.limits.steps.max
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: "WARN".to_string(),
            target: "fluxgallery::api::http".to_string(),
            message: message.to_string(),
            file: Some("src/api/http.rs".to_string()),
            line: Some(42),
        }
    }

    #[test]
    fn test_logger_config() {
        let config = LoggerConfig::development();
        assert_eq!(config.min_level, LevelFilter::Debug);
        assert!(config.show_colors);

        let prod_config = LoggerConfig::production();
        assert!(!prod_config.show_colors);
        assert!(prod_config.output_json);
    }

    #[test]
    fn test_plain_line_format() {
        let config = LoggerConfig::new().with_colors(false);
        let config = LoggerConfig {
            show_emojis: false,
            show_file_location: true,
            ..config
        };
        let line = ConsoleLogger::format_line(&entry("delete failed"), Level::Warn, &config);
        assert!(line.contains("[WARN] fluxgallery::api::http: delete failed"));
        assert!(line.ends_with("(src/api/http.rs:42)"));
    }

    #[test]
    fn test_own_target_detection() {
        assert!(ConsoleLogger::is_own_target("fluxgallery::ui::page"));
        assert!(!ConsoleLogger::is_own_target("reqwest::connect"));
    }

    #[test]
    fn test_second_init_keeps_running_config() {
        // Other tests in this binary may have installed the logger already.
        let _ = init_with_config(LoggerConfig::development());
        let running = CONSOLE_LOGGER.config().min_level;

        let again = init_with_config(LoggerConfig::new().with_level(LevelFilter::Error));
        assert!(again.is_err());
        assert_eq!(CONSOLE_LOGGER.config().min_level, running);
    }

    #[test]
    fn test_unopenable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::new().with_file_output(dir.path().join("missing/dir/flux.log"));
        assert!(open_log_file(&config).is_err());

        let config = LoggerConfig::new()
            .with_json_output(true)
            .with_file_output(dir.path().join("flux.log"));
        assert!(open_log_file(&config).unwrap().is_some());
        assert!(config.output_json);
    }
}
