use serde::Serialize;

use crate::{
    boundary::ProjectDirectory,
    tracking::{SessionState, TrackingSnapshot},
    utils::formatting::format_hms,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerCard {
    pub tracking: bool,
    pub status_label: String,
    /// `HH:MM:SS`
    pub elapsed: String,
    pub project_name: Option<String>,
    pub task_name: Option<String>,
    pub description: Option<String>,
    pub action_label: String,
    pub action_enabled: bool,
}

impl TimerCard {
    pub fn from_snapshot(snapshot: &TrackingSnapshot, directory: &dyn ProjectDirectory) -> Self {
        let action_enabled = !snapshot.busy;
        match &snapshot.state {
            SessionState::Idle => Self {
                tracking: false,
                status_label: "Not tracking".into(),
                elapsed: format_hms(0),
                project_name: None,
                task_name: None,
                description: None,
                action_label: "Start timer".into(),
                action_enabled,
            },
            SessionState::Tracking(entry) => Self {
                tracking: true,
                status_label: "Tracking".into(),
                elapsed: format_hms(i64::try_from(snapshot.elapsed_seconds).unwrap_or(i64::MAX)),
                project_name: entry
                    .project_id
                    .as_deref()
                    .map(|id| directory.project_name(id).unwrap_or_else(|| id.to_string())),
                task_name: entry
                    .task_id
                    .as_deref()
                    .map(|id| directory.task_name(id).unwrap_or_else(|| id.to_string())),
                description: entry.description.clone(),
                action_label: "Stop timer".into(),
                action_enabled,
            },
        }
    }
}
