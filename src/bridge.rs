//! Bridge between the synchronous UI loop and the async API client.
//!
//! A dedicated worker thread owns a tokio runtime and blocks on the command
//! channel. Sign-in and sign-out are handled inline because they install or
//! clear the token used by every later call; every other command is served
//! by a spawned task, so any number of fetches and mutations may be in
//! flight at once. Each mutation refetches its collection on success and
//! the later-resolving refetch wins. Events flow back on a second channel
//! the UI polls every tick; sends never block.

use std::path::PathBuf;
use std::thread;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::api::ApiClient;
use crate::task::Task;
use crate::todo::Todo;

/// UI to worker queue capacity.
pub const COMMAND_QUEUE: usize = 64;
/// Worker to UI queue capacity.
pub const EVENT_QUEUE: usize = 256;

/// Commands the UI sends to the backend worker.
#[derive(Debug, Clone)]
pub enum ApiCommand {
    SignIn {
        email: String,
        password: String,
    },
    SignUp {
        name: String,
        email: String,
        password: String,
    },
    SignOut,
    FetchTodos,
    SearchTodo {
        title: String,
    },
    CreateTodo {
        title: String,
        image_path: PathBuf,
    },
    DeleteTodo {
        todo_id: String,
    },
    FetchTasks {
        todo_id: String,
    },
    AddTask {
        todo_id: String,
        text: String,
        date: Option<DateTime<Utc>>,
    },
    UpdateTask {
        todo_id: String,
        task_id: String,
        text: String,
        completed: bool,
    },
    DeleteTask {
        todo_id: String,
        task_id: String,
    },
}

/// Events the worker sends back to the UI.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    SignedIn { token: String, name: String },
    SignInFailed { message: String },
    SignedUp,
    SignUpFailed { message: String },
    TodosLoaded(Vec<Todo>),
    TodosFailed { message: String },
    SearchLoaded(Option<Todo>),
    SearchFailed { message: String },
    TodoCreated,
    TasksLoaded { todo_id: String, tasks: Vec<Task> },
    TasksFailed { todo_id: String, message: String },
    TaskAddFailed { message: String },
}

/// Start the backend worker thread serving `cmd_rx` until the UI side
/// drops its sender.
pub fn spawn_backend_thread(api: ApiClient, cmd_rx: Receiver<ApiCommand>, ui_tx: Sender<ApiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                send_event(
                    &ui_tx,
                    ApiEvent::TodosFailed {
                        message: format!("backend worker startup failure: {err}"),
                    },
                );
                return;
            }
        };

        runtime.block_on(async move {
            let mut api = api;
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    ApiCommand::SignIn { email, password } => {
                        match api.login(&email, &password).await {
                            Ok(login) => {
                                api.set_token(Some(login.token.clone()));
                                send_event(
                                    &ui_tx,
                                    ApiEvent::SignedIn {
                                        token: login.token,
                                        name: login.user.name,
                                    },
                                );
                            }
                            Err(err) => {
                                tracing::warn!("sign-in failed: {err}");
                                send_event(
                                    &ui_tx,
                                    ApiEvent::SignInFailed {
                                        message: err.notification(),
                                    },
                                );
                            }
                        }
                    }
                    ApiCommand::SignOut => api.set_token(None),
                    other => {
                        let api = api.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            handle_command(api, ui_tx, other).await;
                        });
                    }
                }
            }
        });
    });
}

async fn handle_command(api: ApiClient, ui_tx: Sender<ApiEvent>, cmd: ApiCommand) {
    match cmd {
        ApiCommand::SignUp {
            name,
            email,
            password,
        } => match api.register(&name, &email, &password).await {
            Ok(()) => send_event(&ui_tx, ApiEvent::SignedUp),
            Err(err) => {
                tracing::warn!("sign-up failed: {err}");
                send_event(
                    &ui_tx,
                    ApiEvent::SignUpFailed {
                        message: err.notification(),
                    },
                );
            }
        },

        ApiCommand::FetchTodos => fetch_and_emit_todos(&api, &ui_tx).await,

        ApiCommand::SearchTodo { title } => match api.find_todo(&title).await {
            Ok(todo) => send_event(&ui_tx, ApiEvent::SearchLoaded(todo)),
            Err(err) => {
                tracing::error!("todo search failed: {err}");
                send_event(
                    &ui_tx,
                    ApiEvent::SearchFailed {
                        message: err.notification(),
                    },
                );
            }
        },

        ApiCommand::CreateTodo { title, image_path } => {
            match api.create_todo(&title, &image_path).await {
                Ok(()) => {
                    send_event(&ui_tx, ApiEvent::TodoCreated);
                    fetch_and_emit_todos(&api, &ui_tx).await;
                }
                Err(err) => tracing::error!("create todo failed: {err}"),
            }
        }

        ApiCommand::DeleteTodo { todo_id } => match api.delete_todo(&todo_id).await {
            Ok(()) => fetch_and_emit_todos(&api, &ui_tx).await,
            Err(err) => tracing::error!("delete todo failed: {err}"),
        },

        ApiCommand::FetchTasks { todo_id } => {
            fetch_and_emit_tasks(&api, &ui_tx, &todo_id, true).await
        }

        ApiCommand::AddTask {
            todo_id,
            text,
            date,
        } => match api.add_task(&todo_id, &text, date).await {
            Ok(()) => fetch_and_emit_tasks(&api, &ui_tx, &todo_id, false).await,
            Err(err) => {
                tracing::error!("add task failed: {err}");
                send_event(
                    &ui_tx,
                    ApiEvent::TaskAddFailed {
                        message: err.notification(),
                    },
                );
            }
        },

        // A failed toggle/save/delete is logged and swallowed. No refetch
        // runs for it, so the display stays stale until the next trigger.
        ApiCommand::UpdateTask {
            todo_id,
            task_id,
            text,
            completed,
        } => match api.update_task(&todo_id, &task_id, &text, completed).await {
            Ok(()) => fetch_and_emit_tasks(&api, &ui_tx, &todo_id, false).await,
            Err(err) => tracing::error!("update task failed: {err}"),
        },

        ApiCommand::DeleteTask { todo_id, task_id } => {
            match api.delete_task(&todo_id, &task_id).await {
                Ok(()) => fetch_and_emit_tasks(&api, &ui_tx, &todo_id, false).await,
                Err(err) => tracing::error!("delete task failed: {err}"),
            }
        }

        ApiCommand::SignIn { .. } | ApiCommand::SignOut => {
            unreachable!("session commands handled in the worker loop")
        }
    }
}

async fn fetch_and_emit_todos(api: &ApiClient, ui_tx: &Sender<ApiEvent>) {
    match api.fetch_todos().await {
        Ok(todos) => send_event(ui_tx, ApiEvent::TodosLoaded(todos)),
        Err(err) => {
            tracing::error!("todo list fetch failed: {err}");
            send_event(
                ui_tx,
                ApiEvent::TodosFailed {
                    message: err.notification(),
                },
            );
        }
    }
}

/// Fetch one todo's tasks. Initial loads surface failures to the UI; the
/// refetch after a successful mutation only logs them.
async fn fetch_and_emit_tasks(
    api: &ApiClient,
    ui_tx: &Sender<ApiEvent>,
    todo_id: &str,
    surface_errors: bool,
) {
    match api.fetch_tasks(todo_id).await {
        Ok(tasks) => send_event(
            ui_tx,
            ApiEvent::TasksLoaded {
                todo_id: todo_id.to_string(),
                tasks,
            },
        ),
        Err(err) => {
            tracing::error!("task list fetch failed for {todo_id}: {err}");
            if surface_errors {
                send_event(
                    ui_tx,
                    ApiEvent::TasksFailed {
                        todo_id: todo_id.to_string(),
                        message: err.notification(),
                    },
                );
            }
        }
    }
}

fn send_event(ui_tx: &Sender<ApiEvent>, event: ApiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!("ui event queue is full, dropping event");
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}
