use crate::config::Config;
use crate::explorer::{ExplorerEvents, ExplorerState};
use crate::file_tree::{demo_tree, FileTree};
use crate::lifecycle::BuildSession;
use crate::monitor::ResourceMonitor;
use crate::notifications::{MemoryClipboard, NotificationCenter};
use crate::preferences::PreferenceStore;
use crate::projects::{demo_projects, Project};
use crate::terminal::Terminal;
use chrono::Utc;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives the explorer's directory selections and context additions.
#[derive(Debug)]
pub struct Workspace {
    current_dir: Mutex<String>,
    context_files: Mutex<Vec<String>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            current_dir: Mutex::new("/".to_string()),
            context_files: Mutex::new(Vec::new()),
        }
    }

    pub fn current_dir(&self) -> String {
        self.current_dir.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_current_dir(&self, dir: &str) {
        let dir = format!("/{}", dir.trim_matches('/'));
        debug!("Current directory is now {}", dir);
        *self.current_dir.lock().unwrap_or_else(PoisonError::into_inner) = dir;
    }

    pub fn context_files(&self) -> Vec<String> {
        self.context_files.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplorerEvents for Workspace {
    fn directory_selected(&self, path: &str) {
        self.set_current_dir(path);
    }

    fn context_added(&self, path: &str) {
        let mut files = self.context_files.lock().unwrap_or_else(PoisonError::into_inner);
        if !files.iter().any(|f| f == path) {
            info!("Added '{}' to chat context", path);
            files.push(path.to_string());
        }
    }
}

/// Everything the HTTP handlers share, built once at startup.
pub struct AppState {
    pub tree: FileTree,
    pub projects: Vec<Project>,
    pub session: Arc<BuildSession>,
    pub explorer: Mutex<ExplorerState>,
    pub workspace: Workspace,
    pub terminal: Mutex<Terminal>,
    pub monitor: Arc<ResourceMonitor>,
    pub notifications: Arc<NotificationCenter>,
    pub clipboard: Arc<MemoryClipboard>,
    pub preferences: Mutex<PreferenceStore>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let notifications = Arc::new(NotificationCenter::new());
        let clipboard = Arc::new(MemoryClipboard::new());
        let session = BuildSession::new(
            notifications.clone(),
            clipboard.clone(),
            config.timings.clone(),
            config.share_base_url.clone(),
        );
        Self {
            tree: demo_tree(),
            projects: demo_projects(Utc::now()),
            session: Arc::new(session),
            explorer: Mutex::new(ExplorerState::new()),
            workspace: Workspace::new(),
            terminal: Mutex::new(Terminal::new()),
            monitor: Arc::new(ResourceMonitor::new()),
            notifications,
            clipboard,
            preferences: Mutex::new(PreferenceStore::load(&config.preferences_path)),
        }
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        crate::projects::find_project(&self.projects, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_tracks_directory_and_deduplicates_context() {
        let workspace = Workspace::new();
        assert_eq!(workspace.current_dir(), "/");
        workspace.directory_selected("system/logs");
        assert_eq!(workspace.current_dir(), "/system/logs");
        workspace.context_added("documents/report.md");
        workspace.context_added("documents/report.md");
        assert_eq!(workspace.context_files(), vec!["documents/report.md"]);
    }
}
