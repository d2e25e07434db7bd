//! Todo list data structure.
//!
//! A todo is a named collection of tasks with an optional cover image,
//! owned by a single user. Like tasks, todos arrive from the backend and
//! are never edited locally; the card list is replaced wholesale whenever
//! it is refetched.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Remote image reference attached to a todo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoImage {
    pub secure_url: String,
}

/// A named collection of tasks with an optional cover image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user: Option<String>,
    pub title: String,
    #[serde(default)]
    pub image: Option<TodoImage>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Todo {
    /// Cover image URL, or an empty string when the todo has none.
    pub fn image_url(&self) -> &str {
        self.image.as_ref().map(|i| i.secure_url.as_str()).unwrap_or("")
    }
}
