//! Color constants for the terminal user interface.

use ratatui::style::Color;

// These brand the chrome bars and give the home grid
// its rotating card accents

/// Used for the header and status bars
pub const TEAL: Color = Color::Rgb(0, 110, 110);
/// Used for completed tasks and full progress
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Used for destructive confirm dialogs
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Used for the row being dragged
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for overdue due dates
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

const CARD_ACCENTS: [Color; 4] = [
    Color::Rgb(0, 110, 110),
    Color::Rgb(170, 90, 0),
    Color::Rgb(86, 60, 92),
    Color::Rgb(0, 80, 0),
];

/// Accent color for a home card, cycling by position.
pub fn card_accent(index: usize) -> Color {
    CARD_ACCENTS[index % CARD_ACCENTS.len()]
}
