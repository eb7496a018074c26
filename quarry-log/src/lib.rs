//! Quarry logging.
//!
//! A small logging facade shared by the quarry crates. Output goes to stderr
//! and is controlled through environment variables, so the codec can report
//! dropped clauses and unknown keys without pulling a full subscriber into
//! every consumer.
//!
//! # Usage
//!
//! ```rust
//! use quarry_log::{debug, info, warn, error, trace};
//!
//! debug!("decoding search body");
//! info!("registered {} clause kinds", 53);
//! warn!("unknown key `{}` ignored", "boots");
//! error!("mapping rejected");
//!
//! let path = "query.bool.must[0]";
//! trace!(target: "quarry::codec", "dispatching {}", path);
//! ```
//!
//! Key-value fields are attached with [`log_fields`]; in JSON format they are
//! emitted as a `fields` object next to the message.
//!
//! # Environment Variables
//!
//! - `QUARRY_DEBUG=1` - Enable debug logging
//! - `QUARRY_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `QUARRY_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `QUARRY_LOG_COLOR=1|0` - Enable/disable colors
//! - `QUARRY_LOG_TIMESTAMPS=1|0` - Include timestamps
//! - `QUARRY_LOG_MODULE=1|0` - Include the target

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::io::{IsTerminal, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Log Levels
// ============================================================================

/// Log level, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Per-clause dispatch
    Trace = 0,
    /// Encode/decode of root documents, dropped children
    Debug = 1,
    /// Informational
    Info = 2,
    /// Unknown keys and other recoverable input problems
    Warn = 3,
    /// Failures
    Error = 4,
    /// Nothing is logged
    Off = 5,
}

const LEVELS: [(Level, &str); 6] = [
    (Level::Trace, "TRACE"),
    (Level::Debug, "DEBUG"),
    (Level::Info, "INFO"),
    (Level::Warn, "WARN"),
    (Level::Error, "ERROR"),
    (Level::Off, "OFF"),
];

impl Level {
    /// Upper-case level name.
    pub fn as_str(&self) -> &'static str {
        LEVELS[*self as usize].1
    }

    fn from_u8(value: u8) -> Self {
        LEVELS.get(value as usize).map_or(Level::Off, |(level, _)| *level)
    }

    #[cfg(feature = "color")]
    fn paint(&self) -> colored::ColoredString {
        use colored::Colorize;
        let name = self.as_str();
        match self {
            Level::Trace => name.magenta(),
            Level::Debug => name.blue(),
            Level::Info => name.green(),
            Level::Warn => name.yellow(),
            Level::Error => name.red().bold(),
            Level::Off => name.normal(),
        }
    }
}

impl FromStr for Level {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = match s.to_ascii_uppercase().as_str() {
            "WARNING" => "WARN".to_string(),
            "NONE" => "OFF".to_string(),
            other => other.to_string(),
        };
        LEVELS
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(level, _)| *level)
            .ok_or_else(|| UnknownSetting(s.to_string()))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human readable, optionally colored
    Pretty,
    /// Compact single-line format
    Compact,
    /// One JSON object per line
    Json,
}

impl FromStr for Format {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(UnknownSetting(s.to_string())),
        }
    }
}

/// A level or format string that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSetting(pub String);

impl fmt::Display for UnknownSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log setting `{}`", self.0)
    }
}

impl std::error::Error for UnknownSetting {}

// ============================================================================
// Global Configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Warn as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include timestamps
    pub timestamps: bool,
    /// Whether to include the target
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Warn,
            format: Format::Json,
            color: false,
            timestamps: true,
            module_path: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl LogConfig {
    /// Create config from environment variables and publish its level.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debug = env_flag("QUARRY_DEBUG").unwrap_or(false);

        let level = env::var("QUARRY_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        let format = env::var("QUARRY_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);

        let color = env_flag("QUARRY_LOG_COLOR").unwrap_or_else(|| {
            env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
        });

        let config = Self {
            debug,
            level,
            format,
            color,
            timestamps: env_flag("QUARRY_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
            module_path: env_flag("QUARRY_LOG_MODULE").unwrap_or(defaults.module_path),
        };

        DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
        LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);

        config
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Initialize the logging system.
///
/// Happens on first use of a macro; call it to read the environment eagerly.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// Check if debug logging is enabled.
#[inline]
pub fn is_debug_enabled() -> bool {
    init();
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Check if a log level is enabled.
///
/// `Debug` is also enabled while the debug flag is set, whatever the level.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    match level {
        Level::Off => false,
        Level::Debug if DEBUG_ENABLED.load(Ordering::Relaxed) => true,
        _ => level as u8 >= LOG_LEVEL.load(Ordering::Relaxed),
    }
}

/// Get current log level.
pub fn current_level() -> Level {
    init();
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level at runtime.
pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Enable or disable debug mode at runtime.
pub fn set_debug(enabled: bool) {
    init();
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

/// Get the global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Log Output
// ============================================================================

/// Log a message with the given level.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    log_fields(level, target, message, &[]);
}

/// Log a message with key-value fields attached.
pub fn log_fields(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    let config = config();
    if !is_level_enabled(level) {
        return;
    }

    match config.format {
        Format::Pretty | Format::Compact => log_text(level, target, message, fields, config),
        Format::Json => log_json(level, target, message, fields),
    }
}

fn log_text(
    level: Level,
    target: &str,
    message: &str,
    fields: &[(&str, String)],
    config: &LogConfig,
) {
    let compact = config.format == Format::Compact;
    let mut line = String::with_capacity(message.len() + 48);

    if config.timestamps {
        let stamp = if compact { "%H:%M:%S" } else { "%Y-%m-%d %H:%M:%S%.3f" };
        line.push_str(&chrono::Local::now().format(stamp).to_string());
        line.push(' ');
    }

    if compact {
        line.push_str(&level.as_str()[..1]);
    } else {
        #[cfg(feature = "color")]
        let name = if config.color {
            level.paint().to_string()
        } else {
            level.as_str().to_string()
        };
        #[cfg(not(feature = "color"))]
        let name = level.as_str();
        line.push_str(&format!("{:5}", name));
    }
    line.push(' ');

    if config.module_path && !target.is_empty() {
        if compact {
            line.push_str(&format!("{}: ", target));
        } else {
            line.push_str(&format!("[{}] ", target));
        }
    }

    line.push_str(message);
    for (key, value) in fields {
        line.push_str(&format!(" {}={}", key, value));
    }

    let _ = writeln!(std::io::stderr().lock(), "{}", line);
}

#[cfg(feature = "json")]
fn log_json(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct LogEntry<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        fields: BTreeMap<&'a str, &'a str>,
    }

    let entry = LogEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
        fields: fields.iter().map(|(k, v)| (*k, v.as_str())).collect(),
    };

    if let Ok(json) = serde_json::to_string(&entry) {
        eprintln!("{}", json);
    }
}

#[cfg(not(feature = "json"))]
fn log_json(level: Level, target: &str, message: &str, fields: &[(&str, String)]) {
    let mut line = format!(
        r#"{{"timestamp":"{}","level":"{}","target":"{}","message":"{}""#,
        chrono::Utc::now().to_rfc3339(),
        level.as_str(),
        escape_json(target),
        escape_json(message)
    );
    if !fields.is_empty() {
        let body: Vec<String> = fields
            .iter()
            .map(|(k, v)| format!(r#""{}":"{}""#, escape_json(k), escape_json(v)))
            .collect();
        line.push_str(&format!(r#","fields":{{{}}}"#, body.join(",")));
    }
    line.push('}');
    eprintln!("{}", line);
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __quarry_log {
    ($level:ident, $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::$level) {
            $crate::log($crate::Level::$level, $target, &format!($($arg)+));
        }
    };
}

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => { $crate::__quarry_log!(Trace, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__quarry_log!(Trace, module_path!(), $($arg)+) };
}

/// Log a debug message.
///
/// Enabled by `QUARRY_DEBUG=1` or `QUARRY_LOG_LEVEL=debug`.
///
/// ```rust
/// use quarry_log::debug;
///
/// let kind = "bool";
/// debug!("dropping empty {} child", kind);
/// debug!(target: "quarry::codec", "decoded {} clause", kind);
/// ```
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => { $crate::__quarry_log!(Debug, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__quarry_log!(Debug, module_path!(), $($arg)+) };
}

/// Log an info message.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => { $crate::__quarry_log!(Info, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__quarry_log!(Info, module_path!(), $($arg)+) };
}

/// Log a warning.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => { $crate::__quarry_log!(Warn, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__quarry_log!(Warn, module_path!(), $($arg)+) };
}

/// Log an error.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => { $crate::__quarry_log!(Error, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__quarry_log!(Error, module_path!(), $($arg)+) };
}

// ============================================================================
// Tracing Integration
// ============================================================================

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! Tracing compatibility layer.
    //!
    //! Builds a subscriber whose default filter follows `QUARRY_LOG_LEVEL`.

    use super::*;

    /// Create a tracing subscriber that respects the quarry config.
    pub fn subscriber() -> impl tracing::Subscriber {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{fmt, EnvFilter};

        let config = config();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(config.color))
    }
}

// ============================================================================
// Tests
// ============================================================================
