//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{NotificationKind, Priority, Status};

/// Focus highlight for the active field, column or row.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
pub const SLATE: Color = Color::Rgb(40, 52, 70);

/// Accent used for a status badge, column border and calendar marker.
pub fn status_color(status: Status) -> Color {
    match status {
        Status::Pending => Color::Gray,
        Status::InProgress => Color::Cyan,
        Status::Completed => Color::Green,
        Status::Overdue => Color::Red,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::LightRed,
    }
}

pub fn notification_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Info => Color::Cyan,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Success => Color::Green,
        NotificationKind::Error => Color::Red,
    }
}

/// Readable foreground for text drawn on `bg`.
pub fn text_on(bg: Color) -> Color {
    match bg {
        GOLD | Color::Cyan | Color::Green | Color::Yellow | Color::Gray => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}
