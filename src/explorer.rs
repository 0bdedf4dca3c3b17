use crate::file_tree::{FileTree, FsNode};
use log::debug;
use serde::Serialize;
use std::collections::HashSet;

/// Collaborators the explorer reports user intent to.
pub trait ExplorerEvents {
    fn directory_selected(&self, path: &str);
    fn context_added(&self, path: &str);
}

/// A visible line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub is_folder: bool,
    pub is_expanded: bool,
    pub is_selected: bool,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerState {
    expanded: HashSet<String>,
    selected_path: Option<String>,
}

impl ExplorerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, name: &str) -> bool {
        self.expanded.contains(name)
    }

    pub fn selected_path(&self) -> Option<&str> {
        self.selected_path.as_deref()
    }

    pub fn toggle_folder(&mut self, name: &str) {
        if !self.expanded.remove(name) {
            self.expanded.insert(name.to_string());
        }
        debug!("Toggled folder '{}' (expanded: {})", name, self.is_expanded(name));
    }

    pub fn select_item(&mut self, path: &str, is_folder: bool, events: &dyn ExplorerEvents) {
        self.selected_path = Some(path.to_string());
        if is_folder {
            events.directory_selected(path);
        }
    }

    /// Hands a file to the chat context without touching selection or expansion.
    pub fn add_to_context(&self, path: &str, events: &dyn ExplorerEvents) {
        events.context_added(path);
    }

    /// Flattens the tree into the rows currently visible, descending only into
    /// expanded folders. Expansion is keyed by folder name, not path.
    pub fn render_rows(&self, tree: &FileTree, current_dir: &str) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        self.render_level(tree, "", 0, current_dir, &mut rows);
        rows
    }

    fn render_level(&self, tree: &FileTree, parent: &str, depth: usize, current_dir: &str, rows: &mut Vec<TreeRow>) {
        for (name, node) in tree.iter() {
            let path = if parent.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", parent, name)
            };
            let is_folder = node.is_folder();
            let is_expanded = is_folder && self.is_expanded(name);
            rows.push(TreeRow {
                depth,
                name: name.to_string(),
                is_folder,
                is_expanded,
                is_selected: self.selected_path.as_deref() == Some(path.as_str()),
                is_current: is_folder && is_current_directory(current_dir, name),
                path: path.clone(),
            });
            if !is_expanded {
                continue;
            }
            match node {
                FsNode::Folder { children } => self.render_level(children, &path, depth + 1, current_dir, rows),
                FsNode::FileList { files } => {
                    for file in files {
                        let file_path = format!("{}/{}", path, file);
                        rows.push(TreeRow {
                            depth: depth + 1,
                            name: file.clone(),
                            is_folder: false,
                            is_expanded: false,
                            is_selected: self.selected_path.as_deref() == Some(file_path.as_str()),
                            is_current: false,
                            path: file_path,
                        });
                    }
                }
                FsNode::File => {}
            }
        }
    }
}

/// Highlight check for the current directory. This is a containment test on
/// the folder name, so "logs" also lights up under "/system/logs-old".
pub fn is_current_directory(current_dir: &str, folder_name: &str) -> bool {
    !current_dir.is_empty() && current_dir.contains(folder_name)
}
