//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    SignIn,
    SignUp,
    Home,
    AddTodo,
    TodoDetail,
    Help,
    Confirm,
    FetchFailed,
}

/// Input mode for text entry fields.
#[derive(Clone)]
pub enum InputMode {
    None,
    Text,
}
