//! Theme system for human-mode output.

use console::Style;

/// Visual theme for regswap human-mode output.
///
/// Centralizes colors and styles for consistent rendering.
#[derive(Debug, Clone)]
pub struct Theme {
    // Status tags
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub info: Style,
    pub muted: Style,

    // Component styles
    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub profile_name: Style,
    pub key_path: Style,
    pub included: Style,
    pub excluded: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            info: Style::new().blue().bold(),
            muted: Style::new().dim(),
            header: Style::new().blue().bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            profile_name: Style::new().cyan().bold(),
            key_path: Style::new().italic().dim(),
            included: Style::new().green(),
            excluded: Style::new().dim(),
        }
    }
}
