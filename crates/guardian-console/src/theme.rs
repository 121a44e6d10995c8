use guardian_core::{ScanStatus, Severity, StageState};
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(125, 207, 255))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(56, 99, 134))
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);
pub const MUTED: Color = Color::Rgb(146, 152, 163);
pub const TEXT: Color = Color::Rgb(220, 223, 228);
pub const OK: Color = Color::Rgb(120, 190, 110);
pub const WARN: Color = Color::Rgb(235, 180, 70);
pub const ERR: Color = Color::Rgb(224, 95, 95);

pub mod icons {
    pub const STAGE_DONE: &str = "[x]";
    pub const STAGE_ATTENTION: &str = "[!]";
    pub const VERIFIED: &str = "ok";
    pub const FAILED: &str = "fail";
    pub const DOT: &str = "*";
}

pub fn status_color(status: &ScanStatus) -> Color {
    match status {
        ScanStatus::Pending => MUTED,
        ScanStatus::Queued => Color::Rgb(180, 160, 240),
        ScanStatus::Running => Color::Rgb(125, 207, 255),
        ScanStatus::Finished => OK,
        ScanStatus::Failed => ERR,
        ScanStatus::Cancelled => WARN,
        ScanStatus::Unknown(_) => MUTED,
    }
}

/// Marker for a severity string as the scanner reported it; anything the
/// ranking doesn't know renders neutrally instead of erroring.
pub fn severity_marker(raw: &str) -> (&'static str, Color) {
    match Severity::parse(raw) {
        Some(Severity::Critical) => ("CRIT", ERR),
        Some(Severity::High) => ("HIGH", Color::Rgb(235, 130, 80)),
        Some(Severity::Medium) => ("MED ", WARN),
        Some(Severity::Low) => ("LOW ", OK),
        None => ("?   ", MUTED),
    }
}

pub fn stage_style(state: StageState) -> (&'static str, Color) {
    match state {
        StageState::Completed => (icons::STAGE_DONE, OK),
        StageState::Attention => (icons::STAGE_ATTENTION, WARN),
    }
}

/// Short badge for the language derived from a file path.
pub fn lang_badge(language: &'static str) -> &'static str {
    match language {
        "python" => "py",
        "javascript" => "js",
        "typescript" => "ts",
        "rust" => "rs",
        "go" => "go",
        "java" => "jv",
        "ruby" => "rb",
        "php" => "php",
        "c" => "c",
        "c++" => "cpp",
        "shell" => "sh",
        "yaml" => "yml",
        "json" => "json",
        "env" => "env",
        _ => "::",
    }
}
