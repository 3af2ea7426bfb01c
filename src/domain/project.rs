use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;
use crate::validation::{
    normalize_tags, require_text, validate_agent_id, validate_name, validate_non_negative,
    validate_percent,
};

/// Lifecycle status of a project
///
/// Status changes are plain overwrites; any value may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Planning,
        ProjectStatus::Active,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown project status: {}", s))
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority shared by projects and their tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, String> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Status of a task inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

/// An agent assigned to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedAgent {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_assignment_status")]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub assigned_date: DateTime<Utc>,
}

fn default_assignment_status() -> String {
    "assigned".to_string()
}

/// A unit of work tracked inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTask {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: i32,
    #[serde(default)]
    pub assigned_agent: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
}

/// Metadata of a file attached to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub filename: String,
    #[serde(default)]
    pub original_name: String,
    pub path: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default = "Utc::now")]
    pub upload_date: DateTime<Utc>,
}

/// A stored project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub progress: i32,
    pub assigned_agents: Vec<AssignedAgent>,
    pub tasks: Vec<ProjectTask>,
    pub created_by: String,
    pub tags: Vec<String>,
    pub files: Vec<ProjectFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Build a stored project from a validated draft
    pub fn from_draft(id: Uuid, draft: ProjectDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            progress: draft.progress,
            assigned_agents: draft.assigned_agents,
            tasks: draft.tasks,
            created_by: draft.created_by,
            tags: draft.tags,
            files: draft.files,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every user-editable field, keeping identity and creation time
    pub fn replace_with(&mut self, draft: ProjectDraft, now: DateTime<Utc>) {
        let created_at = self.created_at;
        *self = Self::from_draft(self.id, draft, now);
        self.created_at = created_at;
    }
}

/// Request body for creating or replacing a project
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: i32,
    #[serde(default)]
    pub assigned_agents: Vec<AssignedAgent>,
    #[serde(default)]
    pub tasks: Vec<ProjectTask>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
}

/// A project payload that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub progress: i32,
    pub assigned_agents: Vec<AssignedAgent>,
    pub tasks: Vec<ProjectTask>,
    pub created_by: String,
    pub tags: Vec<String>,
    pub files: Vec<ProjectFile>,
}

impl ProjectInput {
    /// Validate and normalize the payload
    pub fn validate(self) -> Result<ProjectDraft> {
        let name = validate_name(&self.name, "name")?;
        validate_percent(self.progress, "progress")?;

        let mut assigned_agents = Vec::with_capacity(self.assigned_agents.len());
        for mut assignment in self.assigned_agents {
            assignment.agent_id = validate_agent_id(&assignment.agent_id)?;
            assigned_agents.push(assignment);
        }

        let mut tasks = Vec::with_capacity(self.tasks.len());
        for mut task in self.tasks {
            task.title = require_text(&task.title, "task title")?;
            validate_percent(task.progress, "task progress")?;
            tasks.push(task);
        }

        for file in &self.files {
            require_text(&file.filename, "file filename")?;
            require_text(&file.path, "file path")?;
            validate_non_negative(file.size as f64, "file size")?;
        }

        let created_by = self
            .created_by
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "system".to_string());

        Ok(ProjectDraft {
            name,
            description: self.description.trim().to_string(),
            status: self.status,
            priority: self.priority,
            progress: self.progress,
            assigned_agents,
            tasks,
            created_by,
            tags: normalize_tags(self.tags),
            files: self.files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_payload_gets_defaults() {
        let input: ProjectInput = serde_json::from_value(json!({ "name": " Atlas " })).unwrap();
        let draft = input.validate().unwrap();

        assert_eq!(draft.name, "Atlas");
        assert_eq!(draft.status, ProjectStatus::Planning);
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.progress, 0);
        assert_eq!(draft.created_by, "system");
    }

    #[test]
    fn missing_name_is_a_validation_error() {
        let input: ProjectInput = serde_json::from_value(json!({ "description": "x" })).unwrap();
        let err = input.validate().unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn progress_out_of_range_is_rejected() {
        let input: ProjectInput =
            serde_json::from_value(json!({ "name": "a", "progress": 140 })).unwrap();
        assert!(input.validate().is_err());

        let input: ProjectInput = serde_json::from_value(json!({
            "name": "a",
            "tasks": [{ "title": "t", "progress": -5 }]
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn unknown_status_fails_to_deserialize() {
        let parsed =
            serde_json::from_value::<ProjectInput>(json!({ "name": "a", "status": "paused" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn kebab_case_status_roundtrips_through_str() {
        let status: ProjectStatus = serde_json::from_value(json!("on-hold")).unwrap();
        assert_eq!(status, ProjectStatus::OnHold);
        assert_eq!(ProjectStatus::try_from(status.as_str()), Ok(ProjectStatus::OnHold));
    }

    #[test]
    fn replace_keeps_identity_and_creation_time() {
        let created = Utc::now() - chrono::Duration::hours(1);
        let draft = ProjectInput {
            name: "first".into(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let mut project = Project::from_draft(Uuid::new_v4(), draft, created);
        let id = project.id;

        let replacement = ProjectInput {
            name: "second".into(),
            status: ProjectStatus::Completed,
            ..Default::default()
        }
        .validate()
        .unwrap();
        let now = Utc::now();
        project.replace_with(replacement, now);

        assert_eq!(project.id, id);
        assert_eq!(project.name, "second");
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.created_at, created);
        assert_eq!(project.updated_at, now);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let draft = ProjectInput {
            name: "wire".into(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let project = Project::from_draft(Uuid::new_v4(), draft, Utc::now());
        let value = serde_json::to_value(&project).unwrap();

        assert!(value.get("assignedAgents").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["status"], "planning");
    }
}
