use lazy_static::lazy_static;
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A folder's children, keyed by name and kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    entries: Vec<(String, FsNode)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsNode {
    File,
    Folder { children: FileTree },
    /// Shorthand for a folder that only holds files.
    FileList { files: Vec<String> },
}

impl FsNode {
    pub fn is_folder(&self) -> bool {
        !matches!(self, FsNode::File)
    }
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node` under `name`. A sibling with the same name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, node: FsNode) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = node,
            None => self.entries.push((name, node)),
        }
    }

    pub fn with_file(mut self, name: &str) -> Self {
        self.insert(name, FsNode::File);
        self
    }

    pub fn with_folder(mut self, name: &str, children: FileTree) -> Self {
        self.insert(name, FsNode::Folder { children });
        self
    }

    pub fn with_files(mut self, name: &str, files: &[&str]) -> Self {
        let files = files.iter().map(|f| f.to_string()).collect();
        self.insert(name, FsNode::FileList { files });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FsNode> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FsNode)> {
        self.entries.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a slash-joined, root-relative folder path.
    pub fn folder_at(&self, path: &str) -> Option<FileTree> {
        let mut current = self.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match current.get(segment)? {
                FsNode::Folder { children } => children.clone(),
                FsNode::FileList { files } => files
                    .iter()
                    .fold(FileTree::new(), |tree, f| tree.with_file(f)),
                FsNode::File => return None,
            };
        }
        Some(current)
    }
}

impl Serialize for FileTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

impl Serialize for FsNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            FsNode::File => map.serialize_entry("type", "file")?,
            FsNode::Folder { children } => {
                map.serialize_entry("type", "folder")?;
                map.serialize_entry("children", children)?;
            }
            FsNode::FileList { files } => {
                map.serialize_entry("type", "folder")?;
                map.serialize_entry("files", files)?;
            }
        }
        map.end()
    }
}

fn matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

fn prune(tree: &FileTree, needle: &str, forward_query: bool) -> FileTree {
    let mut kept = FileTree::new();
    for (name, node) in tree.iter() {
        if matches(name, needle) {
            kept.insert(name, node.clone());
            continue;
        }
        match node {
            FsNode::File => {}
            FsNode::Folder { children } => {
                let nested_needle = if forward_query { needle } else { "" };
                let children = prune(children, nested_needle, forward_query);
                if !children.is_empty() {
                    kept.insert(name, FsNode::Folder { children });
                }
            }
            FsNode::FileList { files } => {
                let files: Vec<String> = files.iter().filter(|f| matches(f, needle)).cloned().collect();
                if !files.is_empty() {
                    kept.insert(name, FsNode::FileList { files });
                }
            }
        }
    }
    kept
}

/// Prunes `tree` down to entries whose name, or some descendant's name,
/// contains `query` (case-insensitive). A matching entry keeps its whole subtree.
pub fn filter_tree(tree: &FileTree, query: &str) -> FileTree {
    debug!("Filtering file tree with query '{}'", query);
    prune(tree, &query.to_lowercase(), true)
}

/// The explorer's historical filter: nested folders are pruned with an empty
/// query, so every non-matching folder under the top level passes through whole.
pub fn filter_tree_legacy(tree: &FileTree, query: &str) -> FileTree {
    debug!("Filtering file tree (legacy) with query '{}'", query);
    prune(tree, &query.to_lowercase(), false)
}

/// Every file name in the tree, depth first.
pub fn leaf_names(tree: &FileTree) -> Vec<String> {
    fn collect(tree: &FileTree, out: &mut Vec<String>) {
        for (name, node) in tree.iter() {
            match node {
                FsNode::File => out.push(name.to_string()),
                FsNode::Folder { children } => collect(children, out),
                FsNode::FileList { files } => out.extend(files.iter().cloned()),
            }
        }
    }
    let mut out = Vec::new();
    collect(tree, &mut out);
    out
}

pub fn count_leaves(tree: &FileTree) -> usize {
    leaf_names(tree).len()
}

lazy_static! {
    static ref DEMO_TREE: FileTree = FileTree::new()
        .with_files("documents", &["report.md", "notes.txt", "roadmap.pdf", "meeting-notes.md"])
        .with_folder(
            "projects",
            FileTree::new()
                .with_folder(
                    "mentat-core",
                    FileTree::new()
                        .with_files("src", &["main.rs", "agent.rs", "planner.rs", "memory.rs"])
                        .with_files("tests", &["agent_test.rs", "planner_test.rs"])
                        .with_file("Cargo.toml")
                        .with_file("README.md"),
                )
                .with_folder(
                    "neural-dashboard",
                    FileTree::new()
                        .with_files("components", &["Chart.tsx", "Sidebar.tsx", "Terminal.tsx"])
                        .with_file("package.json")
                        .with_file("index.html"),
                )
                .with_files("space-shooter", &["game.js", "sprites.png", "levels.json"]),
        )
        .with_folder(
            "system",
            FileTree::new()
                .with_files("logs", &["system.log", "build.log", "deploy.log"])
                .with_files("config", &["settings.json", "theme.json"])
                .with_file("backup.zip"),
        )
        .with_files("downloads", &["dataset.csv", "model-weights.bin", "installer.dmg"]);
}

/// The explorer's static mock file system.
pub fn demo_tree() -> FileTree {
    DEMO_TREE.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat_tree() -> FileTree {
        FileTree::new()
            .with_files("documents", &["report.md", "notes.txt"])
            .with_files("system", &["logs.txt", "backup.zip"])
    }

    fn nested_tree() -> FileTree {
        FileTree::new().with_folder(
            "workspace",
            FileTree::new()
                .with_files("drafts", &["intro.md", "outline.md"])
                .with_files("archive", &["old-logs.txt"]),
        )
    }

    #[test]
    fn keeps_only_matching_files_and_drops_empty_branches() {
        let filtered = filter_tree(&flat_tree(), "log");
        assert_eq!(filtered, FileTree::new().with_files("system", &["logs.txt"]));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let filtered = filter_tree(&flat_tree(), "REPORT");
        assert_eq!(filtered, FileTree::new().with_files("documents", &["report.md"]));
    }

    #[test]
    fn folder_name_match_keeps_whole_subtree() {
        let filtered = filter_tree(&flat_tree(), "sys");
        assert_eq!(filtered.get("system"), flat_tree().get("system"));
        assert!(filtered.get("documents").is_none());
    }

    #[test]
    fn empty_query_is_identity() {
        assert_eq!(filter_tree(&demo_tree(), ""), demo_tree());
        assert_eq!(filter_tree(&nested_tree(), ""), nested_tree());
    }

    #[test]
    fn filtering_is_idempotent() {
        for query in ["log", "md", "space", "rs", "nothing-matches", ""] {
            let once = filter_tree(&demo_tree(), query);
            assert_eq!(filter_tree(&once, query), once, "query {query}");
        }
    }

    #[test]
    fn stricter_query_matches_a_subset_of_leaves() {
        for (broad, strict) in [("s", "rs"), ("log", "logs"), ("e", "test")] {
            let broad_leaves = leaf_names(&filter_tree(&demo_tree(), broad));
            let strict_leaves = leaf_names(&filter_tree(&demo_tree(), strict));
            for leaf in &strict_leaves {
                assert!(broad_leaves.contains(leaf), "{leaf} missing for {broad}");
            }
        }
    }

    #[test]
    fn nested_folders_use_the_real_query() {
        let filtered = filter_tree(&nested_tree(), "outline");
        let expected = FileTree::new().with_folder(
            "workspace",
            FileTree::new().with_files("drafts", &["outline.md"]),
        );
        assert_eq!(filtered, expected);
    }

    #[test]
    fn legacy_filter_passes_nested_folders_through_unfiltered() {
        // Historical behaviour: the nested call drops the query.
        let legacy = filter_tree_legacy(&nested_tree(), "outline");
        assert_eq!(legacy, nested_tree());
        // Top-level file lists were still filtered, so flat trees agree.
        assert_eq!(filter_tree_legacy(&flat_tree(), "log"), filter_tree(&flat_tree(), "log"));
    }

    #[test]
    fn preserves_source_order_and_leaves_source_untouched() {
        let source = demo_tree();
        let filtered = filter_tree(&source, "s");
        let names: Vec<&str> = filtered.iter().map(|(n, _)| n).collect();
        let source_names: Vec<&str> = source.iter().map(|(n, _)| n).filter(|n| names.contains(n)).collect();
        assert_eq!(names, source_names);
        assert_eq!(source, demo_tree());
    }

    #[test]
    fn insert_replaces_same_named_sibling() {
        let tree = FileTree::new().with_file("a").with_file("b").with_files("a", &["x"]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.iter().next().map(|(n, _)| n), Some("a"));
        assert!(tree.get("a").is_some_and(FsNode::is_folder));
    }

    #[test]
    fn folder_at_walks_nested_paths() {
        let src = demo_tree().folder_at("projects/mentat-core/src").unwrap_or_default();
        assert_eq!(leaf_names(&src), vec!["main.rs", "agent.rs", "planner.rs", "memory.rs"]);
        assert!(demo_tree().folder_at("projects/missing").is_none());
        assert!(demo_tree().folder_at("system/backup.zip").is_none());
    }

    #[test]
    fn serializes_as_ordered_map() {
        let value = serde_json::to_value(flat_tree().with_folder("extra", FileTree::new().with_file("a.txt")))
            .unwrap();
        assert_eq!(
            value,
            json!({
                "documents": { "type": "folder", "files": ["report.md", "notes.txt"] },
                "system": { "type": "folder", "files": ["logs.txt", "backup.zip"] },
                "extra": { "type": "folder", "children": { "a.txt": { "type": "file" } } }
            })
        );
        let text = serde_json::to_string(&filter_tree(&demo_tree(), "")).unwrap();
        assert!(text.find("documents") < text.find("downloads"));
    }
}
