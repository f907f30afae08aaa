//! Contextual enrichment attached to a field set before formatting.
//!
//! Callers build a [`TaskContext`] once and thread it through the call
//! chain; [`TaskContext::line`] hands back a field set pre-populated with
//! the reserved task, environment and caller-identity keys. There is no
//! ambient per-thread formatter registry: context is always passed
//! explicitly.

use std::fmt;

use uuid::Uuid;

use crate::fieldset::FieldSet;

/// Generate a fresh task identifier.
pub fn next_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Identity of the unit of work emitting log lines.
#[derive(Clone, Debug)]
pub struct Task {
    pub name: String,
    pub id: String,
}

impl Task {
    /// Create a task with a generated identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: next_task_id(),
        }
    }

    /// Create a task with an explicit identifier.
    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Attach `task_name` and `task_id`.
    pub fn fill(&self, fields: &mut FieldSet) {
        fields
            .add("task_name", self.name.as_str())
            .add("task_id", self.id.as_str());
    }
}

/// Deployment environment tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Env {
    #[default]
    Unknown,
    Local,
    Dev,
    Staging,
    Prod,
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Env::Unknown => "UNKNOWN",
            Env::Local => "LOCAL",
            Env::Dev => "DEV",
            Env::Staging => "STAGING",
            Env::Prod => "PROD",
        };
        f.write_str(s)
    }
}

impl Env {
    /// Attach the `env` field.
    pub fn fill(&self, fields: &mut FieldSet) {
        fields.add("env", self.to_string());
    }
}

/// Caller identity carried on every line.
///
/// All fields default to the empty string; empty identities still emit
/// their keys so downstream consumers see a stable schema.
#[derive(Clone, Debug, Default)]
pub struct User {
    pub client_id: String,
    pub client_name: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

impl User {
    /// Attach the five caller-identity fields.
    pub fn fill(&self, fields: &mut FieldSet) {
        fields
            .add("client_id", self.client_id.as_str())
            .add("client_name", self.client_name.as_str())
            .add("user_id", self.user_id.as_str())
            .add("user_name", self.user_name.as_str())
            .add("user_email", self.user_email.as_str());
    }
}

/// Bundle of enrichment sources for one unit of work.
#[derive(Clone, Debug)]
pub struct TaskContext {
    pub task: Task,
    pub env: Env,
    pub user: User,
}

impl TaskContext {
    /// Create a context with an anonymous user.
    pub fn new(task: Task, env: Env) -> Self {
        Self {
            task,
            env,
            user: User::default(),
        }
    }

    /// Replace the caller identity.
    pub fn with_user(mut self, user: User) -> Self {
        self.user = user;
        self
    }

    /// Fill `fields` with every reserved enrichment key.
    pub fn fill(&self, fields: &mut FieldSet) {
        self.env.fill(fields);
        self.task.fill(fields);
        self.user.fill(fields);
    }

    /// Start a field set pre-populated with this context.
    pub fn line(&self) -> FieldSet {
        let mut fields = FieldSet::new();
        self.fill(&mut fields);
        fields
    }
}
