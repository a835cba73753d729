//! Terminal styling and capability detection.
//!
//! Colors are plain ANSI escape sequences resolved into a [`ColorPalette`];
//! a plain palette carries empty strings so renderers never branch on color.

use pathlookup_lib::Severity;
use unicode_width::UnicodeWidthStr;

/// ANSI escape codes used by the renderers.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bright bold white for headings and device names.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for secondary text (tree lines, notes).
    pub const GRAY: &str = "\x1b[90m";
    /// Cyan for device names in tables.
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const BLUE: &str = "\x1b[34m";
    /// Orange (256-color) for amber severities.
    pub const ORANGE: &str = "\x1b[38;5;208m";
    pub const RED: &str = "\x1b[31m";
    /// Bold reverse green for the allowed verdict badge.
    pub const TAG_ALLOWED: &str = "\x1b[1;7;32m";
    /// Bold reverse red for the denied verdict badge.
    pub const TAG_DENIED: &str = "\x1b[1;7;31m";
}

/// Resolved color codes, either ANSI sequences or empty strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub white_bold: &'static str,
    pub gray: &'static str,
    pub cyan: &'static str,
    pub green: &'static str,
    pub blue: &'static str,
    pub orange: &'static str,
    pub red: &'static str,
    pub tag_allowed: &'static str,
    pub tag_denied: &'static str,
}

impl ColorPalette {
    /// Create a palette with actual ANSI color codes.
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            white_bold: colors::WHITE_BOLD,
            gray: colors::GRAY,
            cyan: colors::CYAN,
            green: colors::GREEN,
            blue: colors::BLUE,
            orange: colors::ORANGE,
            red: colors::RED,
            tag_allowed: colors::TAG_ALLOWED,
            tag_denied: colors::TAG_DENIED,
        }
    }

    /// Create a palette with no colors (empty strings).
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            white_bold: "",
            gray: "",
            cyan: "",
            green: "",
            blue: "",
            orange: "",
            red: "",
            tag_allowed: "",
            tag_denied: "",
        }
    }

    /// Create a palette based on terminal capabilities.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    /// Color used for a security severity.
    #[must_use]
    pub fn severity(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Green => self.green,
            Severity::Blue => self.blue,
            Severity::Amber => self.orange,
            Severity::Red => self.red,
            Severity::Unknown(_) => self.gray,
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Check if the terminal supports ANSI color codes.
///
/// Respects `NO_COLOR` (https://no-color.org/) and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}

/// Check if the terminal supports Unicode box drawing and icons.
///
/// Looks for a UTF locale in `LC_ALL` or `LANG`.
#[must_use]
pub fn supports_unicode() -> bool {
    if let Ok(lang) = std::env::var("LANG") {
        if lang.to_uppercase().contains("UTF") {
            return true;
        }
    }
    if let Ok(lc_all) = std::env::var("LC_ALL") {
        if lc_all.to_uppercase().contains("UTF") {
            return true;
        }
    }
    #[cfg(windows)]
    {
        if let Ok(term) = std::env::var("TERM") {
            return !term.eq_ignore_ascii_case("dumb");
        }
        return true;
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Strip ANSI color escape sequences.
///
/// Use [`visible_width`] for the terminal width of the result.
pub(crate) fn strip_ansi_to_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut iter = s.chars().peekable();
    while let Some(c) = iter.next() {
        if c == '\x1b' {
            if let Some('[') = iter.peek() {
                iter.next();
            }
            for ch in iter.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Terminal columns taken by a possibly colored string; emoji count as two.
pub(crate) fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi_to_string(s).as_str())
}
