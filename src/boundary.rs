//! Seams to collaborators that live outside the tracking core: identity
//! lookup, display directories and user notifications.

use std::collections::HashMap;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Toast-style message: title, description, severity. Nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sends notifications to the log instead of a UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => {
                info!("{}: {}", notification.title, notification.description)
            }
            Severity::Warning => warn!("{}: {}", notification.title, notification.description),
            Severity::Error => error!("{}: {}", notification.title, notification.description),
        }
    }
}

/// Resolves a credential (token, login, badge) to an employee id.
pub trait IdentityProvider: Send + Sync {
    fn resolve_employee(&self, credential: &str) -> Result<Option<String>>;
}

/// Display names for projects and tasks. Used for rendering only.
pub trait ProjectDirectory: Send + Sync {
    fn project_name(&self, project_id: &str) -> Option<String>;

    fn task_name(&self, _task_id: &str) -> Option<String> {
        None
    }
}

pub trait EmployeeDirectory: Send + Sync {
    fn employee_name(&self, employee_id: &str) -> Option<String>;
}

/// Fixed lookup tables, for embedding callers and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    credentials: HashMap<String, String>,
    employees: HashMap<String, String>,
    projects: HashMap<String, String>,
    tasks: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(
        mut self,
        credential: impl Into<String>,
        employee_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let employee_id = employee_id.into();
        self.credentials.insert(credential.into(), employee_id.clone());
        self.employees.insert(employee_id, name.into());
        self
    }

    pub fn with_project(mut self, project_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.projects.insert(project_id.into(), name.into());
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.tasks.insert(task_id.into(), name.into());
        self
    }
}

impl IdentityProvider for StaticDirectory {
    fn resolve_employee(&self, credential: &str) -> Result<Option<String>> {
        Ok(self.credentials.get(credential).cloned())
    }
}

impl ProjectDirectory for StaticDirectory {
    fn project_name(&self, project_id: &str) -> Option<String> {
        self.projects.get(project_id).cloned()
    }

    fn task_name(&self, task_id: &str) -> Option<String> {
        self.tasks.get(task_id).cloned()
    }
}

impl EmployeeDirectory for StaticDirectory {
    fn employee_name(&self, employee_id: &str) -> Option<String> {
        self.employees.get(employee_id).cloned()
    }
}
