//! Session logger with verbosity levels and an optional capture buffer
//!
//! Entries are plain owned strings; capture is read back through a
//! [`LogGuard`] that borrows the buffer.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// How much the session prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No output
    Silent = 0,
    /// Only alerts and final summaries
    Minimal = 1,
    /// Draws, judgments and effects (default)
    #[default]
    Normal = 2,
    /// Every state change, including dropped requests
    Verbose = 3,
}

impl std::str::FromStr for VerbosityLevel {
    type Err = crate::GachaError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityLevel::Silent),
            "minimal" | "1" => Ok(VerbosityLevel::Minimal),
            "normal" | "2" => Ok(VerbosityLevel::Normal),
            "verbose" | "3" => Ok(VerbosityLevel::Verbose),
            other => Err(crate::GachaError::ParseError(format!("unknown verbosity '{other}'"))),
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// What part of the session produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Draw,
    Judgment,
    Item,
    Effect,
    Turn,
    Persistence,
    Controller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    pub category: Option<LogCategory>,
}

/// Read-only access to captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Entries of one category, in order
    pub fn in_category(&self, category: LogCategory) -> impl Iterator<Item = &LogEntry> + '_ {
        self.guard.iter().filter(move |e| e.category == Some(category))
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Centralized logger owned by a session
pub struct SessionLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl SessionLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        SessionLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    /// Logger that captures everything and prints nothing (tests, simulation)
    pub fn capturing() -> Self {
        let mut logger = Self::with_verbosity(VerbosityLevel::Verbose);
        logger.enable_capture();
        logger
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory only, suppressing stdout
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn disable_capture(&mut self) {
        self.output_mode = OutputMode::Stdout;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Print buffered entries allowed by the current verbosity, then clear
    pub fn flush_buffer(&mut self) {
        let buffer = self.log_buffer.borrow();
        for entry in buffer.iter() {
            if entry.level <= self.verbosity {
                self.write_stdout(entry);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    /// Print only the last `tail_lines` buffered entries, then clear
    pub fn flush_tail(&mut self, tail_lines: usize) {
        let buffer = self.log_buffer.borrow();
        let elided = buffer.len().saturating_sub(tail_lines);
        if elided > 0 {
            println!(">>> {elided} LOG LINES ELIDED. PRINTING LAST {tail_lines} LINES <<<");
        }
        for entry in buffer.iter().skip(elided) {
            if entry.level <= self.verbosity {
                self.write_stdout(entry);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
    }

    fn write_stdout(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Text => {
                if entry.level == VerbosityLevel::Minimal {
                    println!("{}", entry.message);
                } else {
                    println!("  {}", entry.message);
                }
            }
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => println!("{line}"),
                Err(_) => println!("{}", entry.message),
            },
        }
    }

    fn emit(&self, level: VerbosityLevel, category: Option<LogCategory>, message: &str) {
        if level == VerbosityLevel::Silent {
            return;
        }
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both);
        let allowed = level <= self.verbosity;

        if !allowed && !should_capture {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            category,
        };
        if should_output && allowed {
            self.write_stdout(&entry);
        }
        if should_capture {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.emit(VerbosityLevel::Minimal, None, message);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.emit(VerbosityLevel::Normal, None, message);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, None, message);
    }

    /// Log under a category at the given level
    #[inline]
    pub fn event(&self, level: VerbosityLevel, category: LogCategory, message: &str) {
        self.emit(level, Some(category), message);
    }

    /// A judge controller's decision, at Normal level
    pub fn controller_choice(&self, controller_name: &str, message: &str) {
        if self.verbosity >= VerbosityLevel::Verbose {
            self.emit(
                VerbosityLevel::Normal,
                Some(LogCategory::Controller),
                &format!("{controller_name}: {message}"),
            );
        } else {
            self.emit(VerbosityLevel::Normal, Some(LogCategory::Controller), message);
        }
    }
}

impl Default for SessionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

/// Clones settings only; the capture buffer starts empty
impl Clone for SessionLogger {
    fn clone(&self) -> Self {
        SessionLogger {
            verbosity: self.verbosity,
            output_format: self.output_format,
            output_mode: self.output_mode,
            log_buffer: RefCell::new(Vec::new()),
        }
    }
}

impl Serialize for SessionLogger {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SessionLogger", 3)?;
        state.serialize_field("verbosity", &self.verbosity)?;
        state.serialize_field("output_format", &self.output_format)?;
        state.serialize_field("output_mode", &self.output_mode)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for SessionLogger {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SessionLoggerData {
            #[serde(default)]
            verbosity: VerbosityLevel,
            #[serde(default)]
            output_format: OutputFormat,
            #[serde(default)]
            output_mode: OutputMode,
        }

        let data = SessionLoggerData::deserialize(deserializer)?;
        Ok(SessionLogger {
            verbosity: data.verbosity,
            output_format: data.output_format,
            output_mode: data.output_mode,
            log_buffer: RefCell::new(Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = SessionLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(!logger.is_capturing());
    }

    #[test]
    fn test_log_capture() {
        let mut logger = SessionLogger::new();
        logger.enable_capture();

        logger.normal("test message");
        logger.minimal("minimal message");

        let logs = logger.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "test message");
        assert_eq!(logs[1].level, VerbosityLevel::Minimal);
    }

    #[test]
    fn test_capture_ignores_verbosity() {
        let mut logger = SessionLogger::with_verbosity(VerbosityLevel::Minimal);
        logger.enable_capture();
        logger.verbose("hidden on stdout");
        assert_eq!(logger.logs().len(), 1);
    }

    #[test]
    fn test_categories() {
        let logger = SessionLogger::capturing();
        logger.event(VerbosityLevel::Normal, LogCategory::Draw, "drew Alice");
        logger.event(VerbosityLevel::Minimal, LogCategory::Persistence, "save failed");
        logger.event(VerbosityLevel::Normal, LogCategory::Draw, "drew Bob");

        let logs = logger.logs();
        assert_eq!(logs.in_category(LogCategory::Draw).count(), 2);
        assert_eq!(logs.in_category(LogCategory::Persistence).count(), 1);
        assert_eq!(logs.in_category(LogCategory::Effect).count(), 0);
    }

    #[test]
    fn test_flush_clears_buffer() {
        let mut logger = SessionLogger::new();
        logger.set_output_mode(OutputMode::Memory);
        logger.normal("one");
        logger.normal("two");
        logger.flush_tail(1);
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_entry_serializes_as_json_line() {
        let entry = LogEntry {
            level: VerbosityLevel::Normal,
            message: "drew Alice".to_string(),
            category: Some(LogCategory::Draw),
        };
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.contains("\"category\":\"draw\""));
    }

    #[test]
    fn test_serde_keeps_settings_only() {
        let mut logger = SessionLogger::with_verbosity(VerbosityLevel::Verbose);
        logger.set_output_format(OutputFormat::Json);
        logger.enable_capture();
        logger.normal("not persisted");

        let json = serde_json::to_string(&logger).unwrap();
        let back: SessionLogger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verbosity(), VerbosityLevel::Verbose);
        assert_eq!(back.output_format(), OutputFormat::Json);
        assert!(back.logs().is_empty());
    }
}
