use colored::Colorize;

/// Severity of a one-line status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Print a status line to stderr, colored by level
pub fn set_status(message: &str, level: StatusLevel) {
    let line = match level {
        StatusLevel::Info => message.normal(),
        StatusLevel::Success => message.green(),
        StatusLevel::Warning => format!("Warning: {}", message).yellow(),
        StatusLevel::Error => format!("Error: {}", message).red().bold(),
    };
    eprintln!("{}", line);
}
