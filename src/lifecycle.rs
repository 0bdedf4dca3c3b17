//! Simulated build/deploy pipeline for the current project.
//!
//! A session walks `Idle -> Building -> Built -> Deploying -> Deployed`, with
//! scripted log lines emitted from tokio timers. Starting new timer work or
//! stopping a build aborts whatever the session still has scheduled.

use crate::notifications::{Clipboard, Notification, NotificationLevel, Notifier};
use crate::projects::Project;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

const BUILD_SCRIPT: [&str; 6] = [
    "Dependencies installed (214 packages)",
    "Compiling modules...",
    "Modules compiled (142 files)",
    "Running test suite...",
    "All tests passed (58/58)",
    "Build complete. Artifacts ready for deployment.",
];

const DEPLOY_SCRIPT: [&str; 3] = [
    "Provisioning deployment environment...",
    "Uploading build artifacts...",
    "Configuring runtime services...",
];

/// Floor for the build tick; tokio intervals cannot have a zero period.
pub const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct LifecycleTimings {
    pub build_tick: Duration,
    pub deploy_steps: [Duration; 4],
}

impl Default for LifecycleTimings {
    fn default() -> Self {
        Self {
            build_tick: Duration::from_secs(2),
            deploy_steps: [
                Duration::from_millis(1000),
                Duration::from_millis(1500),
                Duration::from_millis(1500),
                Duration::from_millis(1500),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    Idle,
    Building,
    Built,
    Deploying,
    Deployed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Building => "building",
            LifecycleState::Built => "built",
            LifecycleState::Deploying => "deploying",
            LifecycleState::Deployed => "deployed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Build,
    Deploy,
    Select,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Build => f.write_str("start a build"),
            Action::Deploy => f.write_str("deploy"),
            Action::Select => f.write_str("switch projects"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    InvalidTransition { from: LifecycleState, action: Action },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::InvalidTransition { from, action } => {
                write!(f, "Cannot {} while the session is {}", action, from)
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Building and deploying are mutually exclusive; a running build may be restarted.
pub fn check_transition(from: LifecycleState, action: Action) -> Result<(), LifecycleError> {
    use LifecycleState::*;
    let allowed = match action {
        Action::Build => !matches!(from, Deploying),
        Action::Deploy | Action::Select => !matches!(from, Building | Deploying),
    };
    if allowed {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition { from, action })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_project: Option<Project>,
    pub state: LifecycleState,
    pub is_building: bool,
    pub is_deploying: bool,
    pub build_logs: Vec<String>,
}

struct SessionInner {
    project: Option<Project>,
    state: LifecycleState,
    logs: Vec<String>,
    timer: Option<JoinHandle<()>>,
    // Bumped whenever timer work is replaced, so a late tick can tell it is stale.
    generation: u64,
}

impl SessionInner {
    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    fn is_current(&self, project: &Project) -> bool {
        self.project.as_ref().map(|p| p.id.as_str()) == Some(project.id.as_str())
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The session for whichever project is current. Timer-driven methods spawn
/// onto the ambient tokio runtime.
pub struct BuildSession {
    inner: Arc<Mutex<SessionInner>>,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn Clipboard>,
    timings: LifecycleTimings,
    share_base_url: String,
}

impl BuildSession {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        clipboard: Arc<dyn Clipboard>,
        timings: LifecycleTimings,
        share_base_url: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                project: None,
                state: LifecycleState::Idle,
                logs: Vec::new(),
                timer: None,
                generation: 0,
            })),
            notifier,
            clipboard,
            timings,
            share_base_url: share_base_url.into(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        lock(&self.inner).state
    }

    pub fn logs(&self) -> Vec<String> {
        lock(&self.inner).logs.clone()
    }

    pub fn current_project(&self) -> Option<Project> {
        lock(&self.inner).project.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = lock(&self.inner);
        SessionSnapshot {
            current_project: inner.project.clone(),
            state: inner.state,
            is_building: inner.state == LifecycleState::Building,
            is_deploying: inner.state == LifecycleState::Deploying,
            build_logs: inner.logs.clone(),
        }
    }

    fn reject(&self, err: LifecycleError) -> LifecycleError {
        warn!("Rejected lifecycle action: {}", err);
        self.notifier
            .notify(Notification::new(NotificationLevel::Warning, "Action unavailable", err.to_string()));
        err
    }

    /// Makes `project` current. Switching to a different project resets the state to idle.
    pub fn select_project(&self, project: &Project) -> Result<(), LifecycleError> {
        let mut inner = lock(&self.inner);
        if let Err(e) = check_transition(inner.state, Action::Select) {
            drop(inner);
            return Err(self.reject(e));
        }
        if !inner.is_current(project) {
            info!("Current project is now '{}'", project.id);
            inner.project = Some(project.clone());
            inner.state = LifecycleState::Idle;
        }
        Ok(())
    }

    pub fn start_build(&self, project: &Project) -> Result<(), LifecycleError> {
        let mut inner = lock(&self.inner);
        // Building a different project is a switch, which is not allowed mid-run.
        let switching = !inner.is_current(project);
        let checked = check_transition(inner.state, Action::Build).and_then(|()| {
            if switching {
                check_transition(inner.state, Action::Select)
            } else {
                Ok(())
            }
        });
        if let Err(e) = checked {
            drop(inner);
            return Err(self.reject(e));
        }
        inner.cancel_timer();
        let generation = inner.generation;
        inner.project = Some(project.clone());
        inner.state = LifecycleState::Building;
        inner.logs = vec![
            format!("Starting build for {}...", project.name),
            "Environment: production".to_string(),
            "Resolving dependencies...".to_string(),
        ];
        info!("Build started for '{}'", project.id);

        let session = Arc::clone(&self.inner);
        let notifier = Arc::clone(&self.notifier);
        let tick = self.timings.build_tick.max(MIN_TICK);
        let name = project.name.clone();
        inner.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            for (step, line) in BUILD_SCRIPT.iter().enumerate() {
                ticker.tick().await;
                let mut inner = lock(&session);
                if inner.generation != generation {
                    return;
                }
                debug!("Build step {}/{}: {}", step + 1, BUILD_SCRIPT.len(), line);
                inner.logs.push(line.to_string());
                if step + 1 == BUILD_SCRIPT.len() {
                    inner.state = LifecycleState::Built;
                    inner.timer = None;
                    drop(inner);
                    info!("Build finished for '{}'", name);
                    notifier.notify(Notification::new(
                        NotificationLevel::Success,
                        "Build complete",
                        format!("{} is ready to deploy", name),
                    ));
                }
            }
        }));
        Ok(())
    }

    /// Pauses a running build. Does nothing unless a build is in progress.
    pub fn stop_build(&self) {
        let mut inner = lock(&self.inner);
        if inner.state != LifecycleState::Building {
            debug!("stop_build ignored in state {}", inner.state);
            return;
        }
        inner.cancel_timer();
        inner.state = LifecycleState::Idle;
        inner.logs.push("Build paused by user.".to_string());
        drop(inner);
        info!("Build paused");
        self.notifier
            .notify(Notification::new(NotificationLevel::Info, "Build paused", "The build was stopped."));
    }

    pub fn deploy_project(&self, project: &Project) -> Result<(), LifecycleError> {
        let mut inner = lock(&self.inner);
        if let Err(e) = check_transition(inner.state, Action::Deploy) {
            drop(inner);
            return Err(self.reject(e));
        }
        inner.cancel_timer();
        let generation = inner.generation;
        inner.project = Some(project.clone());
        inner.state = LifecycleState::Deploying;
        inner.logs.push(format!("Deploying {}...", project.name));
        info!("Deployment started for '{}'", project.id);

        let session = Arc::clone(&self.inner);
        let notifier = Arc::clone(&self.notifier);
        let steps = self.timings.deploy_steps;
        let name = project.name.clone();
        let mut lines: Vec<String> = DEPLOY_SCRIPT.iter().map(|l| l.to_string()).collect();
        lines.push(format!("Deployment complete. {} is now running.", name));
        inner.timer = Some(tokio::spawn(async move {
            let last = lines.len() - 1;
            for (step, (delay, line)) in steps.iter().zip(lines).enumerate() {
                sleep(*delay).await;
                let mut inner = lock(&session);
                if inner.generation != generation {
                    return;
                }
                debug!("Deploy step {}: {}", step + 1, line);
                inner.logs.push(line);
                if step == last {
                    inner.state = LifecycleState::Deployed;
                    inner.timer = None;
                    drop(inner);
                    info!("Deployment finished for '{}'", name);
                    notifier.notify(Notification::new(
                        NotificationLevel::Success,
                        "Deployment successful",
                        format!("{} has been deployed", name),
                    ));
                }
            }
        }));
        Ok(())
    }

    pub fn share_url(&self, project: &Project) -> String {
        format!("{}/{}", self.share_base_url.trim_end_matches('/'), project.id)
    }

    /// Copies the project's share link. A clipboard rejection is final for this call.
    pub fn share_project(&self, project: &Project) -> Result<String, String> {
        let url = self.share_url(project);
        match self.clipboard.write_text(&url) {
            Ok(()) => {
                lock(&self.inner).logs.push(format!("Share link copied: {}", url));
                self.notifier.notify(Notification::new(
                    NotificationLevel::Success,
                    "Link copied",
                    format!("Share link for {} copied to clipboard", project.name),
                ));
                Ok(url)
            }
            Err(e) => {
                warn!("Clipboard write failed for '{}': {}", project.id, e);
                lock(&self.inner)
                    .logs
                    .push(format!("Failed to copy share link for {}", project.name));
                self.notifier.notify(Notification::new(
                    NotificationLevel::Error,
                    "Share failed",
                    format!("Could not copy link: {}", e),
                ));
                Err(e)
            }
        }
    }

    pub fn configure_project(&self, project: &Project) {
        lock(&self.inner)
            .logs
            .push(format!("Opening configuration for {}...", project.name));
        self.notifier.notify(Notification::new(
            NotificationLevel::Info,
            "Configuration",
            format!("Configure {} from the settings panel", project.name),
        ));
    }
}

impl Drop for BuildSession {
    fn drop(&mut self) {
        lock(&self.inner).cancel_timer();
    }
}
