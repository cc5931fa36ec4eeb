//! Todo Entity
//!
//! A todo item owned by an account (referenced by username). Field
//! validation runs before anything is persisted, on create and on every
//! changed field of a partial update.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::domain::account::validate_username;
use crate::error::{AppError, Result};

pub const TITLE_MIN_LEN: usize = 1;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// Todo priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Fixed label vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Label {
    Work,
    Personal,
    Urgent,
}

impl Label {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Work" => Some(Self::Work),
            "Personal" => Some(Self::Personal),
            "Urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Urgent => "Urgent",
        }
    }
}

/// Todo entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub completed: bool,

    #[serde(default)]
    pub priority: Priority,

    /// Calendar due date, stored as an ISO date string so that string
    /// order in the database matches chronological order.
    pub deadline: NaiveDate,

    #[serde(default)]
    pub labels: Vec<Label>,

    /// Owning account's username
    pub username: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a todo. Priority and labels arrive as raw strings
/// from the API so that an unknown value surfaces as a field-identified
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Option<String>,
    pub deadline: NaiveDate,
    pub labels: Vec<String>,
    pub username: String,
}

impl NewTodo {
    /// Validate all fields against `today` and build the entity. Collects
    /// every offending field into a single validation error.
    pub fn into_todo(self, today: NaiveDate) -> Result<Todo> {
        let mut errors = Vec::new();

        if let Err(e) = check_title(&self.title) {
            errors.push(e);
        }
        if let Some(ref description) = self.description {
            if let Err(e) = check_description(description) {
                errors.push(e);
            }
        }
        let priority = match self.priority.as_deref() {
            None => Priority::default(),
            Some(raw) => match Priority::parse(raw) {
                Some(p) => p,
                None => {
                    errors.push(format!("priority: must be one of high, medium, low (got '{}')", raw));
                    Priority::default()
                }
            },
        };
        if let Err(e) = check_deadline(self.deadline, today) {
            errors.push(e);
        }
        let labels = match parse_labels(&self.labels) {
            Ok(labels) => labels,
            Err(e) => {
                errors.push(e);
                Vec::new()
            }
        };
        if let Err(e) = validate_username(&self.username) {
            errors.push(validation_message(e));
        }

        if !errors.is_empty() {
            return Err(AppError::validation(errors.join("; ")));
        }

        let now = Utc::now();
        Ok(Todo {
            id: crate::TsidGenerator::generate(),
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority,
            deadline: self.deadline,
            labels,
            username: self.username,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial todo update. Only supplied fields change; each changed field is
/// re-validated with the create rules. `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub labels: Option<Vec<String>>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.labels.is_none()
    }

    pub fn apply(&self, todo: &mut Todo, today: NaiveDate) -> Result<()> {
        let mut errors = Vec::new();

        if let Some(ref title) = self.title {
            if let Err(e) = check_title(title) {
                errors.push(e);
            }
        }
        if let Some(ref description) = self.description {
            if let Err(e) = check_description(description) {
                errors.push(e);
            }
        }
        let priority = match self.priority.as_deref() {
            None => None,
            Some(raw) => match Priority::parse(raw) {
                Some(p) => Some(p),
                None => {
                    errors.push(format!("priority: must be one of high, medium, low (got '{}')", raw));
                    None
                }
            },
        };
        if let Some(deadline) = self.deadline {
            if let Err(e) = check_deadline(deadline, today) {
                errors.push(e);
            }
        }
        let labels = match self.labels.as_deref() {
            None => None,
            Some(raw) => match parse_labels(raw) {
                Ok(labels) => Some(labels),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(AppError::validation(errors.join("; ")));
        }

        if let Some(ref title) = self.title {
            todo.title = title.clone();
        }
        if let Some(ref description) = self.description {
            todo.description = Some(description.clone());
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(priority) = priority {
            todo.priority = priority;
        }
        if let Some(deadline) = self.deadline {
            todo.deadline = deadline;
        }
        if let Some(labels) = labels {
            todo.labels = labels;
        }
        todo.updated_at = Utc::now();
        Ok(())
    }
}

fn check_title(title: &str) -> std::result::Result<(), String> {
    let len = title.chars().count();
    if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
        return Err(format!(
            "title: must be {} to {} characters",
            TITLE_MIN_LEN, TITLE_MAX_LEN
        ));
    }
    Ok(())
}

fn check_description(description: &str) -> std::result::Result<(), String> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(format!(
            "description: must be at most {} characters",
            DESCRIPTION_MAX_LEN
        ));
    }
    Ok(())
}

fn check_deadline(deadline: NaiveDate, today: NaiveDate) -> std::result::Result<(), String> {
    if deadline < today {
        return Err("deadline: must be today or later".to_string());
    }
    Ok(())
}

fn parse_labels(raw: &[String]) -> std::result::Result<Vec<Label>, String> {
    let mut labels = Vec::with_capacity(raw.len());
    for value in raw {
        match Label::parse(value) {
            Some(label) => labels.push(label),
            None => {
                return Err(format!(
                    "labels: unknown label '{}' (allowed: Work, Personal, Urgent)",
                    value
                ))
            }
        }
    }
    Ok(labels)
}

fn validation_message(err: AppError) -> String {
    match err {
        AppError::Validation { message } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(today: NaiveDate) -> NewTodo {
        NewTodo {
            title: "Project Plan".to_string(),
            description: Some("Quarterly planning".to_string()),
            completed: false,
            priority: Some("high".to_string()),
            deadline: today,
            labels: vec!["Work".to_string(), "Urgent".to_string()],
            username: "john_doe".to_string(),
        }
    }

    #[test]
    fn test_create_with_today_deadline() {
        let today = Utc::now().date_naive();
        let todo = draft(today).into_todo(today).unwrap();
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.labels, vec![Label::Work, Label::Urgent]);
        assert_eq!(todo.deadline, today);
        assert!(crate::TsidGenerator::is_valid(&todo.id));
    }

    #[test]
    fn test_create_with_yesterday_deadline_fails() {
        let today = Utc::now().date_naive();
        let mut new_todo = draft(today);
        new_todo.deadline = today - Duration::days(1);
        let err = new_todo.into_todo(today).unwrap_err();
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn test_create_with_unknown_label_fails() {
        let today = Utc::now().date_naive();
        let mut new_todo = draft(today);
        new_todo.labels = vec!["Invalid".to_string()];
        let err = new_todo.into_todo(today).unwrap_err();
        assert!(err.to_string().contains("labels"));
        assert!(err.to_string().contains("Invalid"));
    }

    #[test]
    fn test_create_defaults_priority_to_medium() {
        let today = Utc::now().date_naive();
        let mut new_todo = draft(today);
        new_todo.priority = None;
        let todo = new_todo.into_todo(today).unwrap();
        assert_eq!(todo.priority, Priority::Medium);
    }

    #[test]
    fn test_create_collects_all_offending_fields() {
        let today = Utc::now().date_naive();
        let new_todo = NewTodo {
            title: String::new(),
            description: Some("x".repeat(501)),
            completed: false,
            priority: Some("urgent".to_string()),
            deadline: today - Duration::days(3),
            labels: vec!["Chores".to_string()],
            username: "ab".to_string(),
        };
        let message = new_todo.into_todo(today).unwrap_err().to_string();
        for field in ["title", "description", "priority", "deadline", "labels", "username"] {
            assert!(message.contains(field), "missing {} in: {}", field, message);
        }
    }

    #[test]
    fn test_patch_changes_only_supplied_fields() {
        let today = Utc::now().date_naive();
        let mut todo = draft(today).into_todo(today).unwrap();
        let before = todo.clone();

        let patch = TodoPatch { completed: Some(true), ..Default::default() };
        patch.apply(&mut todo, today).unwrap();

        assert!(todo.completed);
        assert_eq!(todo.title, before.title);
        assert_eq!(todo.description, before.description);
        assert_eq!(todo.priority, before.priority);
        assert_eq!(todo.deadline, before.deadline);
        assert_eq!(todo.labels, before.labels);
        assert_eq!(todo.username, before.username);
        assert_eq!(todo.created_at, before.created_at);
        assert!(todo.updated_at >= before.updated_at);
    }

    #[test]
    fn test_patch_revalidates_changed_fields() {
        let today = Utc::now().date_naive();
        let mut todo = draft(today).into_todo(today).unwrap();

        let patch = TodoPatch {
            deadline: Some(today - Duration::days(1)),
            ..Default::default()
        };
        assert!(patch.apply(&mut todo, today).is_err());

        // A failed patch leaves the entity untouched.
        assert_eq!(todo.deadline, today);
    }

    #[test]
    fn test_priority_round_trip() {
        for raw in ["high", "medium", "low"] {
            assert_eq!(Priority::parse(raw).unwrap().as_str(), raw);
        }
        assert!(Priority::parse("HIGH").is_none());
        assert!(Priority::parse("urgent").is_none());
    }

    #[test]
    fn test_document_shape() {
        let today = Utc::now().date_naive();
        let todo = draft(today).into_todo(today).unwrap();
        let doc = bson::to_document(&todo).unwrap();

        assert!(doc.contains_key("_id"));
        // deadline persists as an ISO date string
        assert_eq!(
            doc.get_str("deadline").unwrap(),
            today.format("%Y-%m-%d").to_string()
        );
        assert_eq!(doc.get_str("priority").unwrap(), "high");
        assert!(doc.contains_key("createdAt"));
    }
}
