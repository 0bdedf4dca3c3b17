use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Software,
    Agent,
    Game,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ProjectType::Software => "software",
            ProjectType::Agent => "agent",
            ProjectType::Game => "game",
        })
    }
}

/// Status with its status-specific fields; `progress` exists only while in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ProjectStatus {
    Ready,
    InProgress {
        progress: u8,
        estimated_completion: DateTime<Utc>,
    },
    Completed {
        completed_at: DateTime<Utc>,
        outcome: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(flatten)]
    pub status: ProjectStatus,
}

impl Project {
    fn new(id: &str, name: &str, description: &str, project_type: ProjectType, status: ProjectStatus) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            project_type,
            status,
        }
    }
}

/// The demo catalogue. Timestamps are relative to `now`.
pub fn demo_projects(now: DateTime<Utc>) -> Vec<Project> {
    let completed_at = Utc
        .with_ymd_and_hms(2024, 3, 12, 16, 30, 0)
        .single()
        .unwrap_or(now);
    vec![
        Project::new(
            "neural-dashboard",
            "Neural Dashboard",
            "Real-time analytics dashboard with adaptive layouts",
            ProjectType::Software,
            ProjectStatus::Ready,
        ),
        Project::new(
            "research-agent",
            "Research Agent",
            "Autonomous agent that gathers and summarises papers",
            ProjectType::Agent,
            ProjectStatus::InProgress {
                progress: 65,
                estimated_completion: now + Duration::hours(2),
            },
        ),
        Project::new(
            "space-shooter",
            "Space Shooter",
            "Retro arcade shooter with procedurally generated waves",
            ProjectType::Game,
            ProjectStatus::Ready,
        ),
        Project::new(
            "support-bot",
            "Support Bot",
            "Customer support agent trained on product docs",
            ProjectType::Agent,
            ProjectStatus::Completed {
                completed_at,
                outcome: "Deployed to production".to_string(),
            },
        ),
        Project::new(
            "task-api",
            "Task API",
            "REST service for task tracking with webhooks",
            ProjectType::Software,
            ProjectStatus::InProgress {
                progress: 30,
                estimated_completion: now + Duration::hours(6),
            },
        ),
    ]
}

pub fn find_project<'a>(projects: &'a [Project], id: &str) -> Option<&'a Project> {
    projects.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_type_label_matches_its_json_name() {
        for kind in [ProjectType::Software, ProjectType::Agent, ProjectType::Game] {
            assert_eq!(json!(kind), json!(kind.to_string()));
        }
        assert_eq!(format!("[{:<6}]", ProjectType::Game), "[game  ]");
    }

    #[test]
    fn catalogue_ids_are_unique() {
        let projects = demo_projects(Utc::now());
        for p in &projects {
            assert_eq!(projects.iter().filter(|q| q.id == p.id).count(), 1);
        }
        assert!(find_project(&projects, "space-shooter").is_some());
        assert!(find_project(&projects, "missing").is_none());
    }

    #[test]
    fn status_fields_serialize_only_for_their_status() {
        let projects = demo_projects(Utc::now());
        let ready = serde_json::to_value(&projects[0]).unwrap();
        assert_eq!(ready["status"], json!("ready"));
        assert_eq!(ready["type"], json!("software"));
        assert!(ready.get("progress").is_none());

        let in_progress = serde_json::to_value(&projects[1]).unwrap();
        assert_eq!(in_progress["status"], json!("in-progress"));
        assert_eq!(in_progress["progress"], json!(65));
        assert!(in_progress.get("estimatedCompletion").is_some());

        let completed = serde_json::to_value(&projects[3]).unwrap();
        assert_eq!(completed["status"], json!("completed"));
        assert_eq!(completed["outcome"], json!("Deployed to production"));
        assert!(completed.get("completedAt").is_some());
        assert!(completed.get("progress").is_none());
    }
}
