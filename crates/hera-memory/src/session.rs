//! Per-session sliding windows of conversation turns.
//!
//! Each window sits behind its own async mutex. Holding the handle's lock for
//! the whole read-history/append-answer sequence serializes requests that share
//! a session id without blocking other sessions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use hera_llm::provider::Role;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// FIFO window that evicts its oldest turn once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct SessionWindow {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl SessionWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: Turn) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Record one question/answer exchange as two turns.
    pub fn push_exchange(&mut self, question: &str, answer: &str) {
        self.push(Turn::user(question));
        self.push(Turn::assistant(answer));
    }

    /// Turns oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A resolved session: its id and its lockable window.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: String,
    pub window: Arc<tokio::sync::Mutex<SessionWindow>>,
}

#[derive(Debug)]
pub struct SessionMemory {
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<SessionWindow>>>>,
    capacity: usize,
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SessionMemory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Look up `id`, creating an empty window when it is unknown. A missing or
    /// blank id gets a freshly generated one.
    pub fn get_or_create(&self, id: Option<&str>) -> SessionHandle {
        let id = match id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let window = sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "creating session");
                Arc::new(tokio::sync::Mutex::new(SessionWindow::new(self.capacity)))
            })
            .clone();

        SessionHandle { id, window }
    }

    /// Remove a session entirely. Returns whether it existed.
    pub fn clear(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
