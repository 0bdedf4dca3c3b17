use crate::app::Workspace;
use crate::file_tree::{count_leaves, filter_tree, FileTree, FsNode};
use crate::lifecycle::BuildSession;
use crate::projects::{find_project, Project};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::collections::VecDeque;

const MAX_HISTORY: usize = 200;

pub const NO_PROJECT: &str = "No project selected. Run `projects` to list them, then `select <id>`.";

const HELP: &str = "Commands:
  help              show this help
  projects          list projects
  select <id>       make a project current
  status            show the current project and pipeline state
  build | stop      start or pause a build of the current project
  deploy            deploy the current project
  share             copy a share link for the current project
  configure         open the current project's configuration
  logs              print the build log
  ls [filter]       list the current directory
  cd <dir>          change directory
  context           list files added to the chat context
  clear             clear the terminal
Anything else is sent to the assistant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Input,
    Output,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalEntry {
    pub kind: EntryKind,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// What a terminal command may touch.
pub struct TerminalContext<'a> {
    pub session: &'a BuildSession,
    pub projects: &'a [Project],
    pub tree: &'a FileTree,
    pub workspace: &'a Workspace,
}

#[derive(Debug, Default)]
pub struct Terminal {
    history: VecDeque<TerminalEntry>,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &VecDeque<TerminalEntry> {
        &self.history
    }

    fn record(&mut self, kind: EntryKind, text: String) {
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(TerminalEntry { kind, text, at: Utc::now() });
    }

    /// Runs one line of input and returns the response text.
    pub fn execute(&mut self, input: &str, ctx: &TerminalContext<'_>) -> String {
        let input = input.trim();
        if input.is_empty() {
            return String::new();
        }
        debug!("Terminal input: {}", input);
        let mut parts = input.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        if command == "clear" {
            self.history.clear();
            return String::new();
        }
        self.record(EntryKind::Input, input.to_string());

        let (kind, response) = match command.as_str() {
            "help" => (EntryKind::Output, HELP.to_string()),
            "projects" => (EntryKind::Output, list_projects(ctx.projects)),
            "select" => (EntryKind::Output, select(arg, ctx)),
            "status" => (EntryKind::Output, status(ctx.session)),
            "build" | "deploy" | "share" | "configure" => (EntryKind::Output, run_lifecycle(&command, ctx.session)),
            "stop" => (EntryKind::Output, stop(ctx.session)),
            "logs" => (EntryKind::Output, logs(ctx.session)),
            "ls" => (EntryKind::Output, list_dir(arg, ctx)),
            "cd" => (EntryKind::Output, change_dir(arg, ctx)),
            "context" => (EntryKind::Output, list_context(ctx.workspace)),
            _ => (EntryKind::Assistant, assistant_reply(input, ctx.workspace)),
        };
        self.record(kind, response.clone());
        response
    }
}

fn list_projects(projects: &[Project]) -> String {
    projects
        .iter()
        .map(|p| format!("{:<18} {:<20} [{}]", p.id, p.name, p.project_type))
        .collect::<Vec<_>>()
        .join("\n")
}

fn select(id: &str, ctx: &TerminalContext<'_>) -> String {
    if id.is_empty() {
        return "Usage: select <id>".to_string();
    }
    match find_project(ctx.projects, id) {
        Some(project) => match ctx.session.select_project(project) {
            Ok(()) => format!("Selected {}.", project.name),
            Err(e) => e.to_string(),
        },
        None => format!("Unknown project '{}'. Run `projects` to list them.", id),
    }
}

fn status(session: &BuildSession) -> String {
    let snapshot = session.snapshot();
    match snapshot.current_project {
        Some(project) => format!("Project: {} | Pipeline: {}", project.name, snapshot.state),
        None => NO_PROJECT.to_string(),
    }
}

fn run_lifecycle(command: &str, session: &BuildSession) -> String {
    let Some(project) = session.current_project() else {
        return NO_PROJECT.to_string();
    };
    match command {
        "build" => match session.start_build(&project) {
            Ok(()) => format!("Building {}... run `logs` to follow along.", project.name),
            Err(e) => e.to_string(),
        },
        "deploy" => match session.deploy_project(&project) {
            Ok(()) => format!("Deploying {}...", project.name),
            Err(e) => e.to_string(),
        },
        "share" => match session.share_project(&project) {
            Ok(url) => format!("Share link copied: {}", url),
            Err(e) => format!("Could not copy share link: {}", e),
        },
        _ => {
            session.configure_project(&project);
            format!("Opening configuration for {}.", project.name)
        }
    }
}

fn stop(session: &BuildSession) -> String {
    if session.current_project().is_none() {
        return NO_PROJECT.to_string();
    }
    if session.snapshot().is_building {
        session.stop_build();
        "Build paused.".to_string()
    } else {
        "No build is running.".to_string()
    }
}

fn logs(session: &BuildSession) -> String {
    let logs = session.logs();
    if logs.is_empty() {
        "No build output yet.".to_string()
    } else {
        logs.join("\n")
    }
}

fn list_dir(filter: &str, ctx: &TerminalContext<'_>) -> String {
    let cwd = ctx.workspace.current_dir();
    let Some(dir) = ctx.tree.folder_at(&cwd) else {
        return format!("Directory {} no longer exists.", cwd);
    };
    let matched = filter_tree(&dir, filter);
    let listing: Vec<String> = matched
        .iter()
        .map(|(name, node)| match node {
            FsNode::File => name.to_string(),
            _ => format!("{}/", name),
        })
        .collect();
    if listing.is_empty() {
        return "(no matches)".to_string();
    }
    let listing = listing.join("  ");
    if filter.is_empty() {
        return listing;
    }
    let files = count_leaves(&matched);
    format!("{}\n({} matching {})", listing, files, if files == 1 { "file" } else { "files" })
}

fn resolve(cwd: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in target.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            segments.pop();
        } else {
            segments.push(segment);
        }
    }
    segments.join("/")
}

fn change_dir(target: &str, ctx: &TerminalContext<'_>) -> String {
    let target = if target.is_empty() { "/" } else { target };
    let resolved = resolve(&ctx.workspace.current_dir(), target);
    if ctx.tree.folder_at(&resolved).is_none() {
        return format!("cd: no such directory: {}", target);
    }
    ctx.workspace.set_current_dir(&resolved);
    ctx.workspace.current_dir()
}

fn list_context(workspace: &Workspace) -> String {
    let files = workspace.context_files();
    if files.is_empty() {
        "No files in context. Use the explorer to add some.".to_string()
    } else {
        files.join("\n")
    }
}

fn assistant_reply(input: &str, workspace: &Workspace) -> String {
    let context = match workspace.context_files().len() {
        0 => String::new(),
        1 => " I'm looking at the 1 file you added to context.".to_string(),
        n => format!(" I'm looking at the {} files you added to context.", n),
    };
    let lower = input.to_lowercase();
    let body = if lower.contains("build") || lower.contains("deploy") {
        "Select a project and run `build`, then `deploy` once it is ready."
    } else if lower.contains("file") || lower.contains("folder") {
        "Use `ls` and `cd` to browse, or add files to context from the explorer."
    } else {
        "I'm running in demo mode, so my answers are canned. Type `help` for commands."
    };
    format!("{}{}", body, context)
}
