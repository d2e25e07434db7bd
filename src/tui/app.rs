//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and applies events coming
//! back from the backend worker. The server is the source of truth for
//! list contents: mutations go out as commands and the screen updates
//! when the refetched collection arrives.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use crossterm::event::{
    self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::api::ApiClient;
use crate::bridge::{spawn_backend_thread, ApiCommand, ApiEvent, COMMAND_QUEUE, EVENT_QUEUE};
use crate::fields::Locale;
use crate::session::Session;
use crate::task::{completion_percentage, Task};
use crate::todo::Todo;
use crate::validate;
use crate::{
    tui::colors::{card_accent, DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD, TEAL},
    tui::{
        enums::{AppState, InputMode},
        forms::{
            SignInForm, SignUpForm, TaskEntryForm, TodoForm, SIGNIN_REMEMBER_GLOBAL_ORDER,
            TASK_TEXT_GLOBAL_ORDER,
        },
        input::InputField,
        utils::centered_rect,
    },
};

/// How long the search box stays quiet before a lookup fires.
const SEARCH_DEBOUNCE_MS: u64 = 500;

/// What the confirm dialog will do when accepted.
#[derive(Clone)]
enum ConfirmAction {
    DeleteTodo { todo_id: String, title: String },
}

/// An in-progress mouse drag over the task table.
struct DragState {
    source: usize,
    hover: usize,
}

/// Main application state for the terminal user interface.
///
/// Manages all TUI state including the current screen, the session,
/// cached collections from the server, the inline task editor, and the
/// command/event channels to the backend worker.
pub struct App {
    state: AppState,
    session: Session,
    cmd_tx: Sender<ApiCommand>,
    events: Receiver<ApiEvent>,

    todos: Vec<Todo>,
    todo_list_state: TableState,
    percentages: HashMap<String, u8>,
    loading_todos: bool,

    search: InputField,
    search_active: bool,
    search_pending: bool,
    last_search_edit: Option<Instant>,
    /// None while no lookup applies; Some(None) is a miss.
    search_result: Option<Option<Todo>>,

    open_todo: Option<Todo>,
    tasks: Vec<Task>,
    task_list_state: TableState,
    task_table_area: Rect,
    loading_tasks: bool,
    editing_task: Option<String>,
    edit_buffer: InputField,
    entry_form: TaskEntryForm,
    entry_active: bool,
    drag: Option<DragState>,

    signin_form: SignInForm,
    signup_form: SignUpForm,
    todo_form: TodoForm,

    confirm_action: Option<ConfirmAction>,
    fetch_error: String,
    fetch_retry: Option<ApiCommand>,
    help_from: AppState,
    status_message: String,
    input_mode: InputMode,
}

impl App {
    /// Create a new App instance, restore any stored session, and start
    /// the backend worker against the given server.
    pub fn new(server: &str, data_dir: &Path, locale: Locale) -> io::Result<Self> {
        let session = Session::load(data_dir);
        let mut api = ApiClient::new(server, locale).map_err(io::Error::other)?;
        api.set_token(session.token.clone());

        let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE);
        let (ui_tx, ui_rx) = bounded(EVENT_QUEUE);
        spawn_backend_thread(api, cmd_rx, ui_tx);

        let mut app = Self::with_channels(session, cmd_tx, ui_rx);
        if app.session.is_authenticated() {
            app.enter_home();
        }
        Ok(app)
    }

    /// Build the app around existing channel endpoints.
    fn with_channels(
        session: Session,
        cmd_tx: Sender<ApiCommand>,
        events: Receiver<ApiEvent>,
    ) -> Self {
        let state = if session.is_authenticated() {
            AppState::Home
        } else {
            AppState::SignUp
        };
        let input_mode = if state == AppState::SignUp {
            InputMode::Text
        } else {
            InputMode::None
        };

        App {
            state,
            session,
            cmd_tx,
            events,
            todos: Vec::new(),
            todo_list_state: TableState::default(),
            percentages: HashMap::new(),
            loading_todos: false,
            search: InputField::new(),
            search_active: false,
            search_pending: false,
            last_search_edit: None,
            search_result: None,
            open_todo: None,
            tasks: Vec::new(),
            task_list_state: TableState::default(),
            task_table_area: Rect::default(),
            loading_tasks: false,
            editing_task: None,
            edit_buffer: InputField::new(),
            entry_form: TaskEntryForm::new(),
            entry_active: false,
            drag: None,
            signin_form: SignInForm::new(),
            signup_form: SignUpForm::new(),
            todo_form: TodoForm::new(),
            confirm_action: None,
            fetch_error: String::new(),
            fetch_retry: None,
            help_from: state,
            status_message: String::new(),
            input_mode,
        }
    }

    /// Set a status message to display in the status bar.
    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Clear the current status message.
    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn send_command(&mut self, cmd: ApiCommand) {
        if self.cmd_tx.try_send(cmd).is_err() {
            self.set_status_message("Backend worker is not responding".to_string());
        }
    }

    /// Switch to the home screen and refetch the lists.
    fn enter_home(&mut self) {
        self.state = AppState::Home;
        self.input_mode = InputMode::None;
        self.search_active = false;
        self.open_todo = None;
        self.tasks.clear();
        self.task_list_state.select(None);
        self.editing_task = None;
        self.entry_active = false;
        self.drag = None;
        self.loading_todos = true;
        self.send_command(ApiCommand::FetchTodos);
    }

    fn open_todo_id(&self) -> Option<String> {
        self.open_todo.as_ref().map(|t| t.id.clone())
    }

    /// The lists the home screen currently shows. An applied lookup
    /// narrows the view to its single hit, or to nothing on a miss.
    fn visible_todos(&self) -> Vec<&Todo> {
        match &self.search_result {
            Some(Some(todo)) => vec![todo],
            Some(None) => Vec::new(),
            None => self.todos.iter().collect(),
        }
    }

    fn clamp_todo_selection(&mut self) {
        let len = self.visible_todos().len();
        match self.todo_list_state.selected() {
            Some(_) if len == 0 => self.todo_list_state.select(None),
            Some(selected) if selected >= len => self.todo_list_state.select(Some(len - 1)),
            None if len > 0 => self.todo_list_state.select(Some(0)),
            _ => {}
        }
    }

    fn selected_todo(&self) -> Option<&Todo> {
        let visible = self.visible_todos();
        self.todo_list_state
            .selected()
            .and_then(move |i| visible.into_iter().nth(i))
    }

    /// Ask the worker for every visible list's tasks so the progress
    /// figures stay current.
    fn request_percentages(&mut self) {
        let ids: Vec<String> = self.todos.iter().map(|t| t.id.clone()).collect();
        for todo_id in ids {
            self.send_command(ApiCommand::FetchTasks { todo_id });
        }
    }

    fn note_search_edit(&mut self) {
        self.last_search_edit = Some(Instant::now());
        self.search_pending = true;
    }

    /// Fire the pending lookup once the debounce window has elapsed.
    fn maybe_fire_search(&mut self) {
        if !self.search_pending {
            return;
        }
        let Some(last) = self.last_search_edit else {
            return;
        };
        if last.elapsed() < Duration::from_millis(SEARCH_DEBOUNCE_MS) {
            return;
        }
        self.search_pending = false;
        self.run_search();
    }

    fn run_search(&mut self) {
        let query = self.search.value.trim().to_string();
        if query.is_empty() {
            self.search_result = None;
            self.send_command(ApiCommand::FetchTodos);
        } else {
            self.send_command(ApiCommand::SearchTodo { title: query });
        }
    }

    // ---- event application ------------------------------------------------

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::SignedIn { token, name } => {
                let remember = self.signin_form.remember;
                if let Err(err) = self.session.sign_in(token, name, remember) {
                    tracing::warn!("failed to persist credentials: {err}");
                }
                self.signin_form = SignInForm::new();
                self.enter_home();
                self.set_status_message(format!("Welcome back, {}", self.session.display_name()));
            }
            ApiEvent::SignInFailed { message } | ApiEvent::SignUpFailed { message } => {
                self.set_status_message(message);
            }
            ApiEvent::SignedUp => {
                self.signup_form = SignUpForm::new();
                self.state = AppState::SignIn;
                self.input_mode = InputMode::Text;
                self.set_status_message("Account created, sign in to continue".to_string());
            }
            ApiEvent::TodosLoaded(todos) => {
                self.loading_todos = false;
                self.todos = todos;
                self.clamp_todo_selection();
                self.request_percentages();
                if self.state == AppState::FetchFailed {
                    self.state = AppState::Home;
                    self.fetch_retry = None;
                }
            }
            ApiEvent::TodosFailed { message } => {
                self.loading_todos = false;
                self.enter_fetch_failed(message, ApiCommand::FetchTodos);
            }
            ApiEvent::SearchLoaded(todo) => {
                if self.search.value.trim().is_empty() {
                    self.search_result = None;
                } else {
                    if let Some(hit) = &todo {
                        let todo_id = hit.id.clone();
                        self.send_command(ApiCommand::FetchTasks { todo_id });
                    }
                    self.search_result = Some(todo);
                    self.clamp_todo_selection();
                }
                if self.state == AppState::FetchFailed {
                    self.state = AppState::Home;
                    self.fetch_retry = None;
                }
            }
            ApiEvent::SearchFailed { message } => {
                let query = self.search.value.trim().to_string();
                self.enter_fetch_failed(message, ApiCommand::SearchTodo { title: query });
            }
            ApiEvent::TodoCreated => {
                if self.state == AppState::AddTodo {
                    self.state = AppState::Home;
                    self.input_mode = InputMode::None;
                }
                self.set_status_message("List created".to_string());
            }
            ApiEvent::TasksLoaded { todo_id, tasks } => self.apply_tasks(todo_id, tasks),
            ApiEvent::TasksFailed { todo_id, message } => {
                if self.open_todo_id().as_deref() == Some(todo_id.as_str()) {
                    self.loading_tasks = false;
                    self.enter_fetch_failed(message, ApiCommand::FetchTasks { todo_id });
                } else {
                    // A percentage fetch failing in the background is a
                    // status note.
                    self.set_status_message(message);
                }
            }
            ApiEvent::TaskAddFailed { message } => self.set_status_message(message),
        }
    }

    fn enter_fetch_failed(&mut self, message: String, retry: ApiCommand) {
        self.fetch_error = message;
        self.fetch_retry = Some(retry);
        self.state = AppState::FetchFailed;
        self.input_mode = InputMode::None;
    }

    /// Apply a freshly fetched task collection. The progress figure is
    /// always recorded; the open list is replaced wholesale, keeping the
    /// selection index clamped to the new bounds and dropping an edit
    /// whose row vanished. Any visual reorder is discarded with it, and a
    /// failure screen the load had raised is cleared.
    fn apply_tasks(&mut self, todo_id: String, tasks: Vec<Task>) {
        self.percentages
            .insert(todo_id.clone(), completion_percentage(&tasks));

        let is_open = self.open_todo.as_ref().map(|t| t.id == todo_id) == Some(true);
        if !is_open {
            return;
        }

        self.loading_tasks = false;
        self.tasks = tasks;
        self.drag = None;
        if self.state == AppState::FetchFailed {
            self.state = AppState::TodoDetail;
            self.fetch_retry = None;
        }

        match self.task_list_state.selected() {
            Some(_) if self.tasks.is_empty() => self.task_list_state.select(None),
            Some(selected) if selected >= self.tasks.len() => {
                self.task_list_state.select(Some(self.tasks.len() - 1));
            }
            _ => {}
        }

        if let Some(editing_id) = &self.editing_task {
            if !self.tasks.iter().any(|t| &t.id == editing_id) {
                self.editing_task = None;
                self.input_mode = InputMode::None;
            }
        }
    }

    // ---- task list operations ---------------------------------------------

    fn selected_task(&self) -> Option<&Task> {
        self.task_list_state
            .selected()
            .and_then(|i| self.tasks.get(i))
    }

    fn select_next_task(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let next = match self.task_list_state.selected() {
            Some(i) => (i + 1) % self.tasks.len(),
            None => 0,
        };
        self.task_list_state.select(Some(next));
    }

    fn select_prev_task(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let prev = match self.task_list_state.selected() {
            Some(0) | None => self.tasks.len() - 1,
            Some(i) => i - 1,
        };
        self.task_list_state.select(Some(prev));
    }

    /// Send the inverted done flag for the selected task. The row itself
    /// only changes when the refetched collection comes back.
    fn toggle_selected_task(&mut self) {
        let Some(todo_id) = self.open_todo_id() else {
            return;
        };
        let Some(task) = self.selected_task() else {
            return;
        };
        let cmd = ApiCommand::UpdateTask {
            todo_id,
            task_id: task.id.clone(),
            text: task.text.clone(),
            completed: !task.completed,
        };
        self.send_command(cmd);
    }

    fn begin_edit_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (task_id, text, completed) = (task.id.clone(), task.text.clone(), task.completed);
        if completed {
            self.set_status_message("Completed tasks cannot be edited".to_string());
            return;
        }
        self.editing_task = Some(task_id);
        self.edit_buffer = InputField::with_value(&text);
        self.edit_buffer.active = true;
        self.input_mode = InputMode::Text;
    }

    /// Save the edit buffer with the task's current done flag, then leave
    /// editing without waiting for the round trip.
    fn save_edit(&mut self) {
        let Some(task_id) = self.editing_task.take() else {
            return;
        };
        self.input_mode = InputMode::None;
        let Some(todo_id) = self.open_todo_id() else {
            return;
        };
        let completed = self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.completed)
            .unwrap_or(false);
        let text = self.edit_buffer.value.clone();
        self.send_command(ApiCommand::UpdateTask {
            todo_id,
            task_id,
            text,
            completed,
        });
    }

    fn cancel_edit(&mut self) {
        self.editing_task = None;
        self.input_mode = InputMode::None;
    }

    /// The keyboard path deletes without a confirm dialog.
    fn delete_selected_task(&mut self) {
        let Some(todo_id) = self.open_todo_id() else {
            return;
        };
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        self.send_command(ApiCommand::DeleteTask { todo_id, task_id });
    }

    fn submit_entry_form(&mut self) {
        let Some(todo_id) = self.open_todo_id() else {
            return;
        };
        match validate::validate_task_entry(&self.entry_form.text.value, &self.entry_form.due.value)
        {
            Ok(due) => {
                let text = self.entry_form.text.value.trim().to_string();
                self.entry_form.clear();
                self.send_command(ApiCommand::AddTask {
                    todo_id,
                    text,
                    date: Some(due),
                });
            }
            Err(message) => self.set_status_message(message),
        }
    }

    fn submit_todo_form(&mut self) {
        let title = self.todo_form.title.value.trim().to_string();
        if title.is_empty() {
            self.set_status_message("Title is required".to_string());
            return;
        }
        let image = self.todo_form.image.value.trim().to_string();
        if image.is_empty() {
            self.set_status_message("Image is required".to_string());
            return;
        }
        let image_path = expand_home(&image);
        if !image_path.exists() {
            self.set_status_message(format!("Image not found: {}", image_path.display()));
            return;
        }
        self.set_status_message("Creating list...".to_string());
        self.send_command(ApiCommand::CreateTodo { title, image_path });
    }

    fn sign_out(&mut self) {
        if let Err(err) = self.session.sign_out() {
            tracing::warn!("failed to clear stored credentials: {err}");
        }
        self.send_command(ApiCommand::SignOut);
        self.todos.clear();
        self.percentages.clear();
        self.todo_list_state.select(None);
        self.search.clear();
        self.search_result = None;
        self.search_pending = false;
        self.search_active = false;
        self.open_todo = None;
        self.tasks.clear();
        self.editing_task = None;
        self.entry_active = false;
        self.signin_form = SignInForm::new();
        self.signup_form = SignUpForm::new();
        self.state = AppState::SignUp;
        self.input_mode = InputMode::Text;
        self.set_status_message("Signed out".to_string());
    }

    // ---- drag reorder -----------------------------------------------------

    /// Map a terminal coordinate to a task row if it lands inside the
    /// table's data rows.
    fn task_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.task_table_area;
        if area.width == 0 || area.height == 0 {
            return None;
        }
        if column < area.left() || column >= area.right() {
            return None;
        }
        // Top border plus header row sit above the data rows.
        let first_row = area.y + 2;
        if row < first_row || row + 1 >= area.bottom() {
            return None;
        }
        let index = (row - first_row) as usize + self.task_list_state.offset();
        if index < self.tasks.len() {
            Some(index)
        } else {
            None
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.state != AppState::TodoDetail {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = self.task_row_at(mouse.column, mouse.row) {
                    self.drag = Some(DragState {
                        source: index,
                        hover: index,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(index) = self.task_row_at(mouse.column, mouse.row) {
                    if let Some(drag) = &mut self.drag {
                        drag.hover = index;
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(drag) = self.drag.take() {
                    if let Some(target) = self.task_row_at(mouse.column, mouse.row) {
                        self.finish_drag(drag.source, target);
                    }
                }
            }
            _ => {}
        }
    }

    /// Move the dragged row only when the drop lands somewhere else. The
    /// new order is never sent to the server; the next refetch restores
    /// server order. The keyboard selection index is left alone.
    fn finish_drag(&mut self, source: usize, target: usize) {
        if source == target || source >= self.tasks.len() || target >= self.tasks.len() {
            return;
        }
        let task = self.tasks.remove(source);
        self.tasks.insert(target, task);
    }

    // ---- input handling ---------------------------------------------------

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        self.clear_status_message();
        match self.state {
            AppState::SignIn => self.handle_signin_input(key, modifiers),
            AppState::SignUp => self.handle_signup_input(key, modifiers),
            AppState::Home => self.handle_home_input(key, modifiers),
            AppState::AddTodo => self.handle_add_todo_input(key, modifiers),
            AppState::TodoDetail => self.handle_detail_input(key, modifiers),
            AppState::Help => self.handle_help_input(key, modifiers),
            AppState::Confirm => self.handle_confirm_input(key, modifiers),
            AppState::FetchFailed => self.handle_fetch_failed_input(key, modifiers),
        }
    }

    fn handle_signin_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('n') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.state = AppState::SignUp;
            }
            KeyCode::Esc => return Ok(true),
            KeyCode::Tab | KeyCode::Down => self.signin_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.signin_form.prev_field(),
            KeyCode::Left => self.signin_form.handle_left_right(false),
            KeyCode::Right => self.signin_form.handle_left_right(true),
            KeyCode::Backspace => self.signin_form.handle_backspace(),
            KeyCode::Enter => self.submit_signin(),
            KeyCode::Char(c) => self.signin_form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn submit_signin(&mut self) {
        let email = self.signin_form.email.value.trim().to_string();
        let password = self.signin_form.password.value.clone();
        if let Err(message) = validate::validate_signin(&email, &password) {
            self.set_status_message(message);
            return;
        }
        self.set_status_message("Signing in...".to_string());
        self.send_command(ApiCommand::SignIn { email, password });
    }

    fn handle_signup_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Esc => {
                self.state = AppState::SignIn;
            }
            KeyCode::Tab | KeyCode::Down => self.signup_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.signup_form.prev_field(),
            KeyCode::Left => self.signup_form.handle_left_right(false),
            KeyCode::Right => self.signup_form.handle_left_right(true),
            KeyCode::Backspace => self.signup_form.handle_backspace(),
            KeyCode::Enter => self.submit_signup(),
            KeyCode::Char(c) => self.signup_form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn submit_signup(&mut self) {
        let name = self.signup_form.name.value.trim().to_string();
        let email = self.signup_form.email.value.trim().to_string();
        let password = self.signup_form.password.value.clone();
        let re_password = self.signup_form.re_password.value.clone();
        if let Err(message) = validate::validate_signup(&name, &email, &password, &re_password) {
            self.set_status_message(message);
            return;
        }
        self.set_status_message("Creating account...".to_string());
        self.send_command(ApiCommand::SignUp {
            name,
            email,
            password,
        });
    }

    fn handle_home_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        if self.search_active {
            match key {
                KeyCode::Esc => {
                    self.search_active = false;
                    self.search.clear();
                    self.search_pending = false;
                    self.search_result = None;
                    self.input_mode = InputMode::None;
                    self.clamp_todo_selection();
                }
                KeyCode::Enter => {
                    self.search_active = false;
                    self.input_mode = InputMode::None;
                    if self.search_pending {
                        self.search_pending = false;
                        self.run_search();
                    }
                }
                KeyCode::Backspace => {
                    self.search.handle_backspace();
                    self.note_search_edit();
                }
                KeyCode::Left => self.search.move_cursor_left(),
                KeyCode::Right => self.search.move_cursor_right(),
                KeyCode::Char(c) => {
                    self.search.handle_char(c);
                    self.note_search_edit();
                }
                _ => {}
            }
            return Ok(false);
        }

        match key {
            KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.search.value.is_empty() {
                    return Ok(true);
                }
                self.search.clear();
                self.search_pending = false;
                self.search_result = None;
                self.clamp_todo_selection();
            }
            KeyCode::Up => {
                if let Some(selected) = self.todo_list_state.selected() {
                    if selected > 0 {
                        self.todo_list_state.select(Some(selected - 1));
                    }
                } else if !self.visible_todos().is_empty() {
                    self.todo_list_state.select(Some(0));
                }
            }
            KeyCode::Down => {
                let len = self.visible_todos().len();
                if let Some(selected) = self.todo_list_state.selected() {
                    if selected + 1 < len {
                        self.todo_list_state.select(Some(selected + 1));
                    }
                } else if len > 0 {
                    self.todo_list_state.select(Some(0));
                }
            }
            KeyCode::Enter => self.open_selected_todo(),
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.todo_form = TodoForm::new();
                self.state = AppState::AddTodo;
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char('d') => {
                if let Some(todo) = self.selected_todo() {
                    let (todo_id, title) = (todo.id.clone(), todo.title.clone());
                    self.confirm_action = Some(ConfirmAction::DeleteTodo { todo_id, title });
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('/') => {
                self.search_active = true;
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char('r') => {
                self.loading_todos = true;
                self.send_command(ApiCommand::FetchTodos);
                self.set_status_message("Refreshing lists".to_string());
            }
            KeyCode::Char('o') => self.sign_out(),
            KeyCode::Char('h') => {
                self.help_from = AppState::Home;
                self.state = AppState::Help;
            }
            _ => {}
        }
        Ok(false)
    }

    fn open_selected_todo(&mut self) {
        let Some(todo) = self.selected_todo().cloned() else {
            return;
        };
        let todo_id = todo.id.clone();
        self.open_todo = Some(todo);
        self.tasks.clear();
        self.task_list_state.select(None);
        self.editing_task = None;
        self.entry_form = TaskEntryForm::new();
        self.entry_active = false;
        self.drag = None;
        self.loading_tasks = true;
        self.state = AppState::TodoDetail;
        self.input_mode = InputMode::None;
        self.send_command(ApiCommand::FetchTasks { todo_id });
    }

    fn handle_add_todo_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Esc => {
                self.state = AppState::Home;
                self.input_mode = InputMode::None;
            }
            KeyCode::Tab | KeyCode::Down => self.todo_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.todo_form.prev_field(),
            KeyCode::Left => self.todo_form.handle_left_right(false),
            KeyCode::Right => self.todo_form.handle_left_right(true),
            KeyCode::Backspace => self.todo_form.handle_backspace(),
            KeyCode::Enter => self.submit_todo_form(),
            KeyCode::Char(c) => self.todo_form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn handle_detail_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        // The add accelerator works regardless of which field has focus.
        if modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key, KeyCode::Char('m') | KeyCode::Enter)
        {
            self.submit_entry_form();
            return Ok(false);
        }

        if self.editing_task.is_some() {
            match key {
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Enter => self.save_edit(),
                KeyCode::Backspace => self.edit_buffer.handle_backspace(),
                KeyCode::Delete => self.edit_buffer.handle_delete(),
                KeyCode::Left => self.edit_buffer.move_cursor_left(),
                KeyCode::Right => self.edit_buffer.move_cursor_right(),
                KeyCode::Char(c) => self.edit_buffer.handle_char(c),
                _ => {}
            }
            return Ok(false);
        }

        if self.entry_active {
            match key {
                KeyCode::Esc => {
                    self.entry_active = false;
                    self.input_mode = InputMode::None;
                }
                KeyCode::Tab => self.entry_form.next_field(),
                KeyCode::BackTab => self.entry_form.prev_field(),
                KeyCode::Enter => self.submit_entry_form(),
                KeyCode::Backspace => self.entry_form.handle_backspace(),
                KeyCode::Left => self.entry_form.handle_left_right(false),
                KeyCode::Right => self.entry_form.handle_left_right(true),
                KeyCode::Char(c) => self.entry_form.handle_char(c),
                _ => {}
            }
            return Ok(false);
        }

        match key {
            KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Esc => {
                if self.task_list_state.selected().is_some() {
                    self.task_list_state.select(None);
                } else {
                    self.enter_home();
                }
            }
            KeyCode::Char('q') => self.enter_home(),
            KeyCode::Up => self.select_prev_task(),
            KeyCode::Down => self.select_next_task(),
            KeyCode::Char(' ') => self.toggle_selected_task(),
            KeyCode::Char('e') | KeyCode::Enter => self.begin_edit_selected(),
            KeyCode::Delete => self.delete_selected_task(),
            KeyCode::Tab | KeyCode::Char('a') => {
                self.entry_active = true;
                self.entry_form.current_field = TASK_TEXT_GLOBAL_ORDER;
                self.entry_form.update_active_field();
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char('h') => {
                self.help_from = AppState::TodoDetail;
                self.state = AppState::Help;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_help_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') => {
                self.state = self.help_from;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(ConfirmAction::DeleteTodo { todo_id, title }) =
                    self.confirm_action.take()
                {
                    self.send_command(ApiCommand::DeleteTodo { todo_id });
                    self.set_status_message(format!("Deleting '{title}'"));
                }
                self.state = AppState::Home;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_action = None;
                self.state = AppState::Home;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_fetch_failed_input(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> io::Result<bool> {
        match key {
            KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('r') => {
                if let Some(cmd) = self.fetch_retry.clone() {
                    self.set_status_message("Retrying...".to_string());
                    self.send_command(cmd);
                }
            }
            KeyCode::Esc => self.enter_home(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        self.drain_events();
        self.maybe_fire_search();

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if self.handle_key(key.code, key.modifiers)? {
                        return Ok(true);
                    }
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                _ => {}
            }
        }
        Ok(false)
    }

    // ---- rendering --------------------------------------------------------

    /// Render the home screen header with the logo, the signed-in user
    /// and the search box.
    fn render_home_header(&mut self, f: &mut Frame, area: Rect) {
        let search_display = if self.search_active {
            with_cursor(&self.search.value, self.search.cursor)
        } else {
            self.search.value.clone()
        };
        let search_style = if self.search_active {
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let header_text = vec![Line::from(vec![
            Span::styled("TODOZ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                self.session.display_name().to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
            Span::raw("  Search: "),
            Span::styled(search_display, search_style),
        ])];

        let header = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    /// Render the home screen with one row per list and its progress.
    fn render_home(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        self.render_home_header(f, chunks[0]);

        let visible = self.visible_todos();
        if self.loading_todos && visible.is_empty() {
            let loading = Paragraph::new("Loading lists...")
                .block(Block::default().borders(Borders::ALL).title("My Lists"))
                .alignment(Alignment::Center);
            f.render_widget(loading, chunks[1]);
            return;
        }
        if visible.is_empty() {
            let message = if matches!(self.search_result, Some(None)) {
                format!("no results for '{}'", self.search.value.trim())
            } else {
                "No lists yet. Press 'a' to create one.".to_string()
            };
            let empty = Paragraph::new(message)
                .block(Block::default().borders(Borders::ALL).title("My Lists"))
                .alignment(Alignment::Center);
            f.render_widget(empty, chunks[1]);
            return;
        }

        let header_cells = ["Title", "Image", "Progress", "Done"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(TEAL).fg(Color::White))
            .height(1);

        let percentages = &self.percentages;
        let rows: Vec<Row> = visible
            .iter()
            .enumerate()
            .map(|(i, todo)| {
                let pct = percentages.get(&todo.id).copied().unwrap_or(0);
                Row::new(vec![
                    Cell::from(todo.title.clone()),
                    Cell::from(todo.image_url().to_string())
                        .style(Style::default().fg(Color::DarkGray)),
                    Cell::from(progress_bar(pct)),
                    Cell::from(format!("{pct:>3}%")),
                ])
                .style(Style::default().fg(card_accent(i)))
            })
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(6),
        ];
        let count = rows.len();
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("My Lists ({count}) - Press 'h' for help")),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.todo_list_state);
    }

    /// Render the open list with its tasks, the inline editor and the
    /// add-task row.
    fn render_todo_detail(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        let title = self
            .open_todo
            .as_ref()
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let pct = completion_percentage(&self.tasks);
        let header = Paragraph::new(Line::from(vec![
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{pct}% done"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        self.task_table_area = chunks[1];
        self.render_task_table(f, chunks[1]);
        self.render_entry_row(f, chunks[2]);
    }

    fn render_task_table(&mut self, f: &mut Frame, area: Rect) {
        if self.loading_tasks && self.tasks.is_empty() {
            let loading = Paragraph::new("Loading tasks...")
                .block(Block::default().borders(Borders::ALL).title("Tasks"))
                .alignment(Alignment::Center);
            f.render_widget(loading, area);
            return;
        }

        let header_cells = ["Done", "Task", "Due"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(TEAL).fg(Color::White))
            .height(1);

        let now = Utc::now();
        let editing_task = self.editing_task.clone();
        let edit_display = with_cursor(&self.edit_buffer.value, self.edit_buffer.cursor);
        let drag_source = self.drag.as_ref().map(|d| d.source);
        let drag_hover = self.drag.as_ref().map(|d| d.hover);

        let rows: Vec<Row> = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let marker = if task.completed { "[x]" } else { "[ ]" };
                let text = if editing_task.as_deref() == Some(task.id.as_str()) {
                    edit_display.clone()
                } else {
                    task.text.clone()
                };

                let mut style = if task.completed {
                    Style::default()
                        .fg(DARK_GREEN)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(Color::White)
                };
                if drag_source == Some(i) {
                    style = Style::default().fg(GOLD).add_modifier(Modifier::BOLD);
                } else if drag_hover == Some(i) {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }

                let overdue = !task.completed
                    && task.date.map(|d| d < now).unwrap_or(false);
                let due_style = if overdue {
                    Style::default().fg(DARK_PURPLE).add_modifier(Modifier::BOLD)
                } else {
                    style
                };

                Row::new(vec![
                    Cell::from(marker),
                    Cell::from(text),
                    Cell::from(task.format_date()).style(due_style),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Min(24),
            Constraint::Length(17),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}) - drag rows with the mouse to reorder the view",
                self.tasks.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.task_list_state);
    }

    fn render_entry_row(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let text_active = self.entry_active && self.entry_form.text.active;
        let due_active = self.entry_active && self.entry_form.due.active;
        render_text_field(
            f,
            chunks[0],
            "New task (Ctrl+M to add)",
            &self.entry_form.text,
            text_active,
            false,
        );
        render_text_field(
            f,
            chunks[1],
            "Due (e.g. tomorrow)",
            &self.entry_form.due,
            due_active,
            false,
        );
    }

    fn render_signin(&mut self, f: &mut Frame, area: Rect) {
        let outer = centered_rect(52, 62, area);
        let block = Block::default()
            .title("Sign In")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(TEAL));
        let inner = block.inner(outer);
        f.render_widget(block, outer);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let logo = Paragraph::new("TODOZ")
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(logo, chunks[0]);

        render_text_field(
            f,
            chunks[1],
            "Email",
            &self.signin_form.email,
            self.signin_form.email.active,
            false,
        );
        render_text_field(
            f,
            chunks[2],
            "Password",
            &self.signin_form.password,
            self.signin_form.password.active,
            true,
        );

        let marker = if self.signin_form.remember {
            "[x]"
        } else {
            "[ ]"
        };
        let remember_style = if self.signin_form.current_field == SIGNIN_REMEMBER_GLOBAL_ORDER {
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let remember = Paragraph::new(format!("{marker} Remember me (space to toggle)"))
            .style(remember_style)
            .alignment(Alignment::Center);
        f.render_widget(remember, chunks[3]);
    }

    fn render_signup(&mut self, f: &mut Frame, area: Rect) {
        let outer = centered_rect(52, 76, area);
        let block = Block::default()
            .title("Create Account")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(TEAL));
        let inner = block.inner(outer);
        f.render_widget(block, outer);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let logo = Paragraph::new("TODOZ")
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(logo, chunks[0]);

        render_text_field(
            f,
            chunks[1],
            "Name (6-15 characters)",
            &self.signup_form.name,
            self.signup_form.name.active,
            false,
        );
        render_text_field(
            f,
            chunks[2],
            "Email",
            &self.signup_form.email,
            self.signup_form.email.active,
            false,
        );
        render_text_field(
            f,
            chunks[3],
            "Password",
            &self.signup_form.password,
            self.signup_form.password.active,
            true,
        );
        render_text_field(
            f,
            chunks[4],
            "Repeat password",
            &self.signup_form.re_password,
            self.signup_form.re_password.active,
            true,
        );
    }

    fn render_add_todo(&mut self, f: &mut Frame, area: Rect) {
        let outer = centered_rect(60, 40, area);
        f.render_widget(Clear, outer);
        let block = Block::default()
            .title("New List")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(TEAL));
        let inner = block.inner(outer);
        f.render_widget(block, outer);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        render_text_field(
            f,
            chunks[0],
            "Title",
            &self.todo_form.title,
            self.todo_form.title.active,
            false,
        );
        render_text_field(
            f,
            chunks[1],
            "Cover image path",
            &self.todo_form.image,
            self.todo_form.image.active,
            false,
        );

        let hint = Paragraph::new("Enter: create | Esc: cancel")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint, chunks[2]);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let action = match &self.confirm_action {
            Some(ConfirmAction::DeleteTodo { title, .. }) => {
                format!("Delete list '{title}' and all its tasks")
            }
            None => String::new(),
        };
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Are you sure you want to:",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(action),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));
        let text = vec![
            Line::from(Span::styled(
                "Todoz Keys",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Home:"),
            Line::from(vec![
                Span::raw("  "),
                key("Up/Down"),
                Span::raw(" select list   "),
                key("Enter"),
                Span::raw(" open   "),
                key("/"),
                Span::raw(" search"),
            ]),
            Line::from(vec![
                Span::raw("  "),
                key("a"),
                Span::raw(" new list   "),
                key("d"),
                Span::raw(" delete list   "),
                key("r"),
                Span::raw(" refresh"),
            ]),
            Line::from(vec![
                Span::raw("  "),
                key("o"),
                Span::raw(" sign out   "),
                key("q/Esc"),
                Span::raw(" quit"),
            ]),
            Line::from(""),
            Line::from("Open list:"),
            Line::from(vec![
                Span::raw("  "),
                key("Up/Down"),
                Span::raw(" select task (wraps)   "),
                key("Space"),
                Span::raw(" toggle done"),
            ]),
            Line::from(vec![
                Span::raw("  "),
                key("e/Enter"),
                Span::raw(" edit task   "),
                key("Del"),
                Span::raw(" delete task"),
            ]),
            Line::from(vec![
                Span::raw("  "),
                key("Tab/a"),
                Span::raw(" new-task row   "),
                key("Ctrl+M"),
                Span::raw(" add task from anywhere"),
            ]),
            Line::from(vec![
                Span::raw("  "),
                key("Esc"),
                Span::raw(" deselect, then back   "),
                key("mouse drag"),
                Span::raw(" reorder the view only"),
            ]),
            Line::from(""),
            Line::from("Editing a task:"),
            Line::from(vec![
                Span::raw("  "),
                key("Enter"),
                Span::raw(" save   "),
                key("Esc"),
                Span::raw(" cancel"),
            ]),
            Line::from(""),
            Line::from("Press Esc, q or h to return"),
        ];

        let help = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }

    fn render_fetch_failed(&mut self, f: &mut Frame, area: Rect) {
        let outer = centered_rect(60, 30, area);
        let block = Block::default()
            .title("Fetch Failed")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Could not reach the server.",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(self.fetch_error.clone()),
            Line::from(""),
            Line::from("Press 'r' to retry, Esc for home, 'q' to quit"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, outer);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.search_active {
            format!(
                "Search: {} (Esc to clear, Enter to apply)",
                self.search.value
            )
        } else {
            match self.state {
                AppState::SignIn => {
                    "Tab: next field | Enter: sign in | Ctrl+N: create account | Esc: quit"
                        .to_string()
                }
                AppState::SignUp => {
                    "Tab: next field | Enter: create account | Esc: back to sign-in".to_string()
                }
                AppState::Home => format!(
                    "Lists: {} | /: search | a: new | Enter: open | h: help",
                    self.visible_todos().len()
                ),
                AppState::AddTodo => "New List".to_string(),
                AppState::TodoDetail => {
                    if self.editing_task.is_some() {
                        "Editing - Enter: save | Esc: cancel".to_string()
                    } else if self.entry_active {
                        "New task - Tab: due field | Enter: add | Esc: back to list".to_string()
                    } else {
                        "Space: toggle | e: edit | Del: delete | Tab: new task | Esc: back"
                            .to_string()
                    }
                }
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
                AppState::FetchFailed => "r: retry | Esc: home".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(TEAL).fg(Color::White))
            .alignment(Alignment::Left);

        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
            .split(f.area());

        match self.state {
            AppState::SignIn => self.render_signin(f, chunks[0]),
            AppState::SignUp => self.render_signup(f, chunks[0]),
            AppState::Home => self.render_home(f, chunks[0]),
            AppState::AddTodo => {
                self.render_home(f, chunks[0]);
                self.render_add_todo(f, chunks[0]);
            }
            AppState::TodoDetail => self.render_todo_detail(f, chunks[0]),
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_home(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
            AppState::FetchFailed => self.render_fetch_failed(f, chunks[0]),
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn with_cursor(value: &str, cursor: usize) -> String {
    format!("{}|{}", &value[..cursor], &value[cursor..])
}

fn masked_display(field: &InputField, active: bool) -> String {
    if !active {
        return field.masked_value();
    }
    let total = field.value.chars().count();
    let before = field.value[..field.cursor].chars().count();
    format!("{}|{}", "*".repeat(before), "*".repeat(total - before))
}

fn render_text_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    field: &InputField,
    active: bool,
    masked: bool,
) {
    let display = if masked {
        masked_display(field, active)
    } else if active {
        with_cursor(&field.value, field.cursor)
    } else {
        field.value.clone()
    };
    let border_style = if active {
        Style::default().fg(GOLD)
    } else {
        Style::default()
    };
    let widget = Paragraph::new(display).block(
        Block::default()
            .borders(Borders::ALL)
            .title(label)
            .border_style(border_style),
    );
    f.render_widget(widget, area);
}

fn progress_bar(pct: u8) -> String {
    let filled = (pct as usize) / 10;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_task(id: &str, text: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            date: None,
        }
    }

    fn sample_todo(id: &str, title: &str) -> Todo {
        Todo {
            id: id.to_string(),
            user: None,
            title: title.to_string(),
            image: None,
            tasks: Vec::new(),
        }
    }

    fn test_app() -> (App, Receiver<ApiCommand>, Sender<ApiEvent>, TempDir) {
        let dir = TempDir::new().unwrap();
        let session = Session::load(dir.path());
        let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE);
        let (ui_tx, ui_rx) = bounded(EVENT_QUEUE);
        let app = App::with_channels(session, cmd_tx, ui_rx);
        (app, cmd_rx, ui_tx, dir)
    }

    fn detail_app(tasks: Vec<Task>) -> (App, Receiver<ApiCommand>, Sender<ApiEvent>, TempDir) {
        let (mut app, cmd_rx, ui_tx, dir) = test_app();
        app.state = AppState::TodoDetail;
        app.open_todo = Some(sample_todo("6501", "groceries"));
        app.tasks = tasks;
        app.task_table_area = Rect::new(0, 0, 60, 12);
        (app, cmd_rx, ui_tx, dir)
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::empty()).unwrap();
    }

    fn press_with(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(key, modifiers).unwrap();
    }

    fn mouse_event(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        }
    }

    fn three_tasks() -> Vec<Task> {
        vec![
            sample_task("t1", "milk", false),
            sample_task("t2", "bread", false),
            sample_task("t3", "eggs", true),
        ]
    }

    #[test]
    fn test_down_selects_first_then_wraps() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        assert_eq!(app.task_list_state.selected(), None);

        press(&mut app, KeyCode::Down);
        assert_eq!(app.task_list_state.selected(), Some(0));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.task_list_state.selected(), Some(2));

        press(&mut app, KeyCode::Down);
        assert_eq!(app.task_list_state.selected(), Some(0));
    }

    #[test]
    fn test_up_from_idle_selects_last_and_wraps() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        press(&mut app, KeyCode::Up);
        assert_eq!(app.task_list_state.selected(), Some(2));

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.task_list_state.selected(), Some(0));

        press(&mut app, KeyCode::Up);
        assert_eq!(app.task_list_state.selected(), Some(2));
    }

    #[test]
    fn test_empty_list_never_selects() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(Vec::new());

        press(&mut app, KeyCode::Down);
        assert_eq!(app.task_list_state.selected(), None);

        press(&mut app, KeyCode::Up);
        assert_eq!(app.task_list_state.selected(), None);
    }

    #[test]
    fn test_space_sends_inverted_flag_and_keeps_selection() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(1));

        press(&mut app, KeyCode::Char(' '));

        match cmd_rx.try_recv().unwrap() {
            ApiCommand::UpdateTask {
                todo_id,
                task_id,
                text,
                completed,
            } => {
                assert_eq!(todo_id, "6501");
                assert_eq!(task_id, "t2");
                assert_eq!(text, "bread");
                assert!(completed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        // The row itself is untouched until the refetch lands.
        assert!(!app.tasks[1].completed);
        assert_eq!(app.task_list_state.selected(), Some(1));
        assert_eq!(app.state, AppState::TodoDetail);
    }

    #[test]
    fn test_toggle_back_sends_false_for_completed_task() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(2));

        press(&mut app, KeyCode::Char(' '));

        match cmd_rx.try_recv().unwrap() {
            ApiCommand::UpdateTask { completed, .. } => assert!(!completed),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_edit_rejected_on_completed_task() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(2));

        press(&mut app, KeyCode::Char('e'));

        assert_eq!(app.editing_task, None);
        assert!(cmd_rx.try_recv().is_err());
        assert!(!app.status_message.is_empty());
    }

    #[test]
    fn test_edit_save_sends_buffer_with_current_done_flag() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(0));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.editing_task.as_deref(), Some("t1"));
        assert_eq!(app.edit_buffer.value, "milk");

        press(&mut app, KeyCode::Char('!'));
        press(&mut app, KeyCode::Enter);

        match cmd_rx.try_recv().unwrap() {
            ApiCommand::UpdateTask {
                task_id,
                text,
                completed,
                ..
            } => {
                assert_eq!(task_id, "t1");
                assert_eq!(text, "milk!");
                assert!(!completed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(app.editing_task, None);
    }

    #[test]
    fn test_save_with_unchanged_text_still_clears_editing() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(0));

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.editing_task, None);
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::UpdateTask { text, .. } => assert_eq!(text, "milk"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_edit_cancel_discards_buffer() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(0));

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.editing_task, None);
        assert_eq!(app.tasks[0].text, "milk");
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn test_typing_while_editing_does_not_drive_the_list() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(0));
        press(&mut app, KeyCode::Char('e'));

        // Space and navigation become text input while the editor is open.
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));

        assert_eq!(app.edit_buffer.value, "milk e");
        assert_eq!(app.task_list_state.selected(), Some(0));
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn test_delete_key_sends_without_confirm() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(1));

        press(&mut app, KeyCode::Delete);

        match cmd_rx.try_recv().unwrap() {
            ApiCommand::DeleteTask { todo_id, task_id } => {
                assert_eq!(todo_id, "6501");
                assert_eq!(task_id, "t2");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(app.state, AppState::TodoDetail);
    }

    #[test]
    fn test_ctrl_m_submits_entry_from_list_mode() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.entry_form.text = InputField::with_value("call mom");
        app.entry_form.due = InputField::with_value("2031-01-02");

        press_with(&mut app, KeyCode::Char('m'), KeyModifiers::CONTROL);

        match cmd_rx.try_recv().unwrap() {
            ApiCommand::AddTask {
                todo_id,
                text,
                date,
            } => {
                assert_eq!(todo_id, "6501");
                assert_eq!(text, "call mom");
                assert!(date.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(app.entry_form.text.value, "");
        assert_eq!(app.entry_form.due.value, "");
    }

    #[test]
    fn test_ctrl_m_submits_while_an_input_has_focus() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.entry_active = true;
        app.entry_form.text = InputField::with_value("buy stamps");
        app.entry_form.due = InputField::with_value("tomorrow");

        // A plain character keeps going to the form, not the list.
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.entry_form.text.value, "buy stampse");
        assert_eq!(app.editing_task, None);

        press_with(&mut app, KeyCode::Char('m'), KeyModifiers::CONTROL);
        assert!(matches!(
            cmd_rx.try_recv().unwrap(),
            ApiCommand::AddTask { .. }
        ));
    }

    #[test]
    fn test_ctrl_enter_also_submits_entry() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.entry_form.text = InputField::with_value("water plants");
        app.entry_form.due = InputField::with_value("2031-03-04");

        press_with(&mut app, KeyCode::Enter, KeyModifiers::CONTROL);

        assert!(matches!(
            cmd_rx.try_recv().unwrap(),
            ApiCommand::AddTask { .. }
        ));
    }

    #[test]
    fn test_add_task_requires_text_and_due() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        press_with(&mut app, KeyCode::Char('m'), KeyModifiers::CONTROL);
        assert_eq!(app.status_message, "Please enter a task");
        assert!(cmd_rx.try_recv().is_err());

        app.entry_form.text = InputField::with_value("call mom");
        press_with(&mut app, KeyCode::Char('m'), KeyModifiers::CONTROL);
        assert_eq!(app.status_message, "Due date is required");
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn test_refetch_replaces_tasks_and_clamps_selection() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(2));

        app.apply_event(ApiEvent::TasksLoaded {
            todo_id: "6501".to_string(),
            tasks: vec![sample_task("t1", "milk", true)],
        });

        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.task_list_state.selected(), Some(0));
        assert_eq!(app.percentages.get("6501"), Some(&100));
    }

    #[test]
    fn test_refetch_drops_edit_whose_row_vanished() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(1));
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.editing_task.as_deref(), Some("t2"));

        app.apply_event(ApiEvent::TasksLoaded {
            todo_id: "6501".to_string(),
            tasks: vec![sample_task("t1", "milk", false)],
        });
        assert_eq!(app.editing_task, None);
    }

    #[test]
    fn test_refetch_keeps_edit_when_row_survives() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(1));
        press(&mut app, KeyCode::Char('e'));

        app.apply_event(ApiEvent::TasksLoaded {
            todo_id: "6501".to_string(),
            tasks: three_tasks(),
        });
        assert_eq!(app.editing_task.as_deref(), Some("t2"));
    }

    #[test]
    fn test_tasks_event_for_other_list_only_updates_percentage() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        app.apply_event(ApiEvent::TasksLoaded {
            todo_id: "other".to_string(),
            tasks: vec![
                sample_task("x1", "a", true),
                sample_task("x2", "b", false),
            ],
        });

        assert_eq!(app.tasks.len(), 3);
        assert_eq!(app.percentages.get("other"), Some(&50));
    }

    #[test]
    fn test_drag_splices_row_without_any_command() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        // Data rows start below the border and header at y = 2.
        app.handle_mouse(mouse_event(MouseEventKind::Down(MouseButton::Left), 10, 2));
        app.handle_mouse(mouse_event(MouseEventKind::Drag(MouseButton::Left), 10, 4));
        app.handle_mouse(mouse_event(MouseEventKind::Up(MouseButton::Left), 10, 4));

        let ids: Vec<&str> = app.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3", "t1"]);
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn test_drag_to_same_row_leaves_order_alone() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        app.handle_mouse(mouse_event(MouseEventKind::Down(MouseButton::Left), 10, 3));
        app.handle_mouse(mouse_event(MouseEventKind::Up(MouseButton::Left), 10, 3));

        let ids: Vec<&str> = app.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_drag_outside_table_is_ignored() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        app.handle_mouse(mouse_event(MouseEventKind::Down(MouseButton::Left), 10, 11));
        assert!(app.drag.is_none());

        // Header row is not draggable either.
        app.handle_mouse(mouse_event(MouseEventKind::Down(MouseButton::Left), 10, 1));
        assert!(app.drag.is_none());
    }

    #[test]
    fn test_drag_released_outside_abandons_the_move() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        app.handle_mouse(mouse_event(MouseEventKind::Down(MouseButton::Left), 10, 2));
        app.handle_mouse(mouse_event(MouseEventKind::Drag(MouseButton::Left), 10, 4));
        app.handle_mouse(mouse_event(MouseEventKind::Up(MouseButton::Left), 10, 20));

        let ids: Vec<&str> = app.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
        assert!(app.drag.is_none());
    }

    #[test]
    fn test_refetch_discards_visual_order() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.handle_mouse(mouse_event(MouseEventKind::Down(MouseButton::Left), 10, 2));
        app.handle_mouse(mouse_event(MouseEventKind::Up(MouseButton::Left), 10, 4));
        assert_eq!(app.tasks[2].id, "t1");

        app.apply_event(ApiEvent::TasksLoaded {
            todo_id: "6501".to_string(),
            tasks: three_tasks(),
        });
        let ids: Vec<&str> = app.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_search_waits_for_the_debounce_window() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.search_active = true;

        press(&mut app, KeyCode::Char('g'));
        app.maybe_fire_search();
        assert!(cmd_rx.try_recv().is_err());

        app.last_search_edit = Some(Instant::now() - Duration::from_millis(600));
        app.maybe_fire_search();
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::SearchTodo { title } => assert_eq!(title, "g"),
            other => panic!("unexpected command: {other:?}"),
        }

        // Fired once; nothing further without another edit.
        app.maybe_fire_search();
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn test_each_keystroke_restarts_the_debounce() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.search_active = true;

        press(&mut app, KeyCode::Char('g'));
        app.last_search_edit = Some(Instant::now() - Duration::from_millis(400));
        app.maybe_fire_search();
        assert!(cmd_rx.try_recv().is_err());

        press(&mut app, KeyCode::Char('r'));
        app.maybe_fire_search();
        assert!(cmd_rx.try_recv().is_err());

        app.last_search_edit = Some(Instant::now() - Duration::from_millis(600));
        app.maybe_fire_search();
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::SearchTodo { title } => assert_eq!(title, "gr"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_empty_query_restores_the_full_list() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one"), sample_todo("b", "two")];
        app.search_result = Some(None);
        app.search = InputField::with_value("x");
        app.search_active = true;

        press(&mut app, KeyCode::Backspace);
        app.last_search_edit = Some(Instant::now() - Duration::from_millis(600));
        app.maybe_fire_search();

        assert!(matches!(cmd_rx.try_recv().unwrap(), ApiCommand::FetchTodos));
        assert!(app.search_result.is_none());
        assert_eq!(app.visible_todos().len(), 2);
    }

    #[test]
    fn test_search_miss_shows_no_results() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one")];
        app.search = InputField::with_value("zzz");

        app.apply_event(ApiEvent::SearchLoaded(None));

        assert_eq!(app.search_result, Some(None));
        assert!(app.visible_todos().is_empty());
        assert_eq!(app.state, AppState::Home);
    }

    #[test]
    fn test_search_hit_narrows_view_and_fetches_progress() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one"), sample_todo("b", "two")];
        app.search = InputField::with_value("two");

        app.apply_event(ApiEvent::SearchLoaded(Some(sample_todo("b", "two"))));

        assert_eq!(app.visible_todos().len(), 1);
        assert_eq!(app.visible_todos()[0].id, "b");
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::FetchTasks { todo_id } => assert_eq!(todo_id, "b"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_failure_is_a_fetch_failure_not_a_miss() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.search = InputField::with_value("two");

        app.apply_event(ApiEvent::SearchFailed {
            message: "Error".to_string(),
        });

        assert_eq!(app.state, AppState::FetchFailed);
        assert_eq!(app.fetch_error, "Error");
    }

    #[test]
    fn test_signin_success_persists_only_when_remembered() {
        let (mut app, _cmd_rx, _ui_tx, dir) = test_app();
        app.state = AppState::SignIn;
        app.signin_form.remember = true;

        app.apply_event(ApiEvent::SignedIn {
            token: "jwt-1".to_string(),
            name: "dana-lists".to_string(),
        });

        assert_eq!(app.state, AppState::Home);
        let restored = Session::load(dir.path());
        assert_eq!(restored.token.as_deref(), Some("jwt-1"));

        // Without remember the credentials stay in memory only.
        let (mut app2, _cmd_rx2, _ui_tx2, dir2) = test_app();
        app2.state = AppState::SignIn;
        app2.apply_event(ApiEvent::SignedIn {
            token: "jwt-2".to_string(),
            name: "dana-lists".to_string(),
        });
        assert!(app2.session.is_authenticated());
        assert!(Session::load(dir2.path()).token.is_none());
    }

    #[test]
    fn test_sign_out_clears_state_and_returns_to_signup() {
        let (mut app, cmd_rx, _ui_tx, dir) = test_app();
        app.session
            .sign_in("jwt-1".to_string(), "dana-lists".to_string(), true)
            .unwrap();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one")];

        press(&mut app, KeyCode::Char('o'));

        assert_eq!(app.state, AppState::SignUp);
        assert!(app.todos.is_empty());
        assert!(!app.session.is_authenticated());
        assert!(Session::load(dir.path()).token.is_none());
        assert!(matches!(cmd_rx.try_recv().unwrap(), ApiCommand::SignOut));
    }

    #[test]
    fn test_signup_validation_blocks_the_request() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        assert_eq!(app.state, AppState::SignUp);
        app.signup_form.name = InputField::with_value("dana-lists");
        app.signup_form.email = InputField::with_value("not-an-email");
        app.signup_form.password = InputField::with_value("Abcde1@");
        app.signup_form.re_password = InputField::with_value("Abcde1@");

        press(&mut app, KeyCode::Enter);

        assert!(cmd_rx.try_recv().is_err());
        assert!(!app.status_message.is_empty());
    }

    #[test]
    fn test_signup_success_lands_on_signin() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.signup_form.name = InputField::with_value("dana-lists");
        app.signup_form.email = InputField::with_value("dana@example.com");
        app.signup_form.password = InputField::with_value("Abcde1@");
        app.signup_form.re_password = InputField::with_value("Abcde1@");

        press(&mut app, KeyCode::Enter);
        assert!(matches!(cmd_rx.try_recv().unwrap(), ApiCommand::SignUp { .. }));

        app.apply_event(ApiEvent::SignedUp);
        assert_eq!(app.state, AppState::SignIn);
    }

    #[test]
    fn test_home_enter_opens_detail_and_fetches_tasks() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one"), sample_todo("b", "two")];
        app.todo_list_state.select(Some(1));

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state, AppState::TodoDetail);
        assert_eq!(app.open_todo.as_ref().unwrap().id, "b");
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::FetchTasks { todo_id } => assert_eq!(todo_id, "b"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_delete_list_goes_through_confirm() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one")];
        app.todo_list_state.select(Some(0));

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        assert!(cmd_rx.try_recv().is_err());

        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state, AppState::Home);
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::DeleteTodo { todo_id } => assert_eq!(todo_id, "a"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_confirm_decline_sends_nothing() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one")];
        app.todo_list_state.select(Some(0));

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));

        assert_eq!(app.state, AppState::Home);
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn test_detail_esc_deselects_then_goes_home() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.task_list_state.select(Some(1));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.task_list_state.selected(), None);
        assert_eq!(app.state, AppState::TodoDetail);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Home);
        assert!(matches!(cmd_rx.try_recv().unwrap(), ApiCommand::FetchTodos));
    }

    #[test]
    fn test_todos_failure_enters_fetch_failed_and_retries() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;

        app.apply_event(ApiEvent::TodosFailed {
            message: "Error".to_string(),
        });
        assert_eq!(app.state, AppState::FetchFailed);

        press(&mut app, KeyCode::Char('r'));
        assert!(matches!(cmd_rx.try_recv().unwrap(), ApiCommand::FetchTodos));

        app.apply_event(ApiEvent::TodosLoaded(vec![sample_todo("a", "one")]));
        assert_eq!(app.state, AppState::Home);
    }

    #[test]
    fn test_search_failure_recovers_once_the_retry_lands() {
        let (mut app, cmd_rx, _ui_tx, _dir) = test_app();
        app.state = AppState::Home;
        app.todos = vec![sample_todo("a", "one"), sample_todo("b", "two")];
        app.search = InputField::with_value("two");

        app.apply_event(ApiEvent::SearchFailed {
            message: "Error".to_string(),
        });
        assert_eq!(app.state, AppState::FetchFailed);

        press(&mut app, KeyCode::Char('r'));
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::SearchTodo { title } => assert_eq!(title, "two"),
            other => panic!("unexpected command: {other:?}"),
        }

        app.apply_event(ApiEvent::SearchLoaded(Some(sample_todo("b", "two"))));
        assert_eq!(app.state, AppState::Home);
        assert!(app.fetch_retry.is_none());
        assert_eq!(app.visible_todos().len(), 1);
    }

    #[test]
    fn test_task_failure_recovers_once_the_retry_lands() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(Vec::new());

        app.apply_event(ApiEvent::TasksFailed {
            todo_id: "6501".to_string(),
            message: "Error".to_string(),
        });
        assert_eq!(app.state, AppState::FetchFailed);

        press(&mut app, KeyCode::Char('r'));
        match cmd_rx.try_recv().unwrap() {
            ApiCommand::FetchTasks { todo_id } => assert_eq!(todo_id, "6501"),
            other => panic!("unexpected command: {other:?}"),
        }

        app.apply_event(ApiEvent::TasksLoaded {
            todo_id: "6501".to_string(),
            tasks: three_tasks(),
        });
        assert_eq!(app.state, AppState::TodoDetail);
        assert!(app.fetch_retry.is_none());
        assert_eq!(app.tasks.len(), 3);
    }

    #[test]
    fn test_task_failure_for_another_list_stays_in_place() {
        let (mut app, _cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());

        app.apply_event(ApiEvent::TasksFailed {
            todo_id: "other".to_string(),
            message: "Error".to_string(),
        });

        assert_eq!(app.state, AppState::TodoDetail);
        assert_eq!(app.tasks.len(), 3);
        assert_eq!(app.status_message, "Error");
    }

    #[test]
    fn test_add_task_due_parses_to_midnight_local() {
        let (mut app, cmd_rx, _ui_tx, _dir) = detail_app(three_tasks());
        app.entry_form.text = InputField::with_value("call mom");
        app.entry_form.due = InputField::with_value("2031-01-02");

        press_with(&mut app, KeyCode::Char('m'), KeyModifiers::CONTROL);

        match cmd_rx.try_recv().unwrap() {
            ApiCommand::AddTask { date, .. } => {
                let date = date.unwrap();
                let local = chrono::Local
                    .with_ymd_and_hms(2031, 1, 2, 0, 0, 0)
                    .unwrap();
                assert_eq!(date, local.with_timezone(&Utc));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
