//! Terminal output for CLI commands
//!
//! Human output goes to stdout with problems on stderr. In JSON mode only
//! the final document is written to stdout, so it can be piped; problems
//! are still emitted on stderr as one JSON object per line.

use serde_json::json;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// How bad a reported problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

pub trait OutputFormatter {
    /// Outcome line of a command
    fn headline(&self, message: &str);
    /// Indented detail line
    fn line(&self, message: &str);
    /// Aligned `label: value` detail line
    fn field(&self, label: &str, value: &str);
    fn report(&self, severity: Severity, message: &str);
    /// Machine-readable result; ignored by human output
    fn document(&self, value: &serde_json::Value);
}

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn headline(&self, message: &str) {
        println!("\u{2713} {message}");
    }
    fn line(&self, message: &str) {
        println!("  {message}");
    }
    fn field(&self, label: &str, value: &str) {
        println!("  {:<16} {}", format!("{label}:"), value);
    }
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => eprintln!("\u{26a0} {message}"),
            Severity::Error => eprintln!("\u{2717} {message}"),
        }
    }
    fn document(&self, _value: &serde_json::Value) {}
}

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn headline(&self, _message: &str) {}
    fn line(&self, _message: &str) {}
    fn field(&self, _label: &str, _value: &str) {}
    fn report(&self, severity: Severity, message: &str) {
        eprintln!("{}", json!({ "level": severity.label(), "message": message }));
    }
    fn document(&self, value: &serde_json::Value) {
        match serde_json::to_string_pretty(value) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => self.report(Severity::Error, &err.to_string()),
        }
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter),
    }
}

/// Renders milliseconds as `850ms` or `2.4s`
pub fn format_duration_ms(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}
