//! Enumerations for TUI state management.

/// Top-level screen. Both screens show the same engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Schedule,
    Board,
}

impl Screen {
    pub fn toggle(self) -> Self {
        match self {
            Screen::Schedule => Screen::Board,
            Screen::Board => Screen::Schedule,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Schedule => "PRODUCTION SCHEDULE",
            Screen::Board => "KANBAN BOARD",
        }
    }
}

/// Popup drawn over the current screen. Input goes to the overlay first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    AddTask,
    StatusDropdown,
    TaskDetail,
    Archive,
    ConfirmPurge(u64),
    Notifications,
    Settings,
    Help,
}
