//! Tree enumeration
//!
//! Discovers the nodes of an input tree: every directory holding at least
//! one regular file becomes a node, as does a completely empty leaf
//! directory (those surface as read failures in the report). Directories
//! holding only subdirectories are structural and not dispatched.
//!
//! Traversal is name-sorted, so two walks of the same tree produce the same
//! node and file ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::RunError;

/// One dispatchable directory of the input tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Absolute path of the directory
    pub dir: PathBuf,
    /// Path relative to the input root, mirrored under the output root
    pub rel_path: PathBuf,
    /// Matching file names in sorted order
    pub files: Vec<String>,
}

/// Configurable walker over one input root.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    extension: Option<String>,
}

impl TreeWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extension: None,
        }
    }

    /// Restrict matching files to one extension (dot-less, case-insensitive).
    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension.map(|e| e.trim_start_matches('.').to_ascii_lowercase());
        self
    }

    /// Enumerate the tree's nodes in walk order.
    pub fn discover(&self) -> Result<Vec<TreeNode>, RunError> {
        if !self.root.is_dir() {
            return Err(RunError::InputTree {
                path: self.root.clone(),
                reason: "not a directory".to_string(),
            });
        }

        let mut dirs: Vec<PathBuf> = Vec::new();
        let mut has_file: BTreeSet<PathBuf> = BTreeSet::new();
        let mut has_subdir: BTreeSet<PathBuf> = BTreeSet::new();
        let mut matching: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                dirs.push(path.to_path_buf());
                if entry.depth() > 0 {
                    if let Some(parent) = path.parent() {
                        has_subdir.insert(parent.to_path_buf());
                    }
                }
            } else {
                let parent = match path.parent() {
                    Some(parent) => parent.to_path_buf(),
                    None => continue,
                };
                has_file.insert(parent.clone());
                if self.matches_filter(path) {
                    matching
                        .entry(parent)
                        .or_default()
                        .push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }

        let mut nodes = Vec::new();
        for dir in dirs {
            let with_files = has_file.contains(&dir);
            let empty_leaf = !with_files && !has_subdir.contains(&dir);
            if !with_files && !empty_leaf {
                continue;
            }

            let rel_path = dir
                .strip_prefix(&self.root)
                .unwrap_or_else(|_| Path::new(""))
                .to_path_buf();
            let files = matching.remove(&dir).unwrap_or_default();
            nodes.push(TreeNode {
                dir,
                rel_path,
                files,
            });
        }

        tracing::debug!(
            root = %self.root.display(),
            nodes = nodes.len(),
            "Discovered input tree"
        );
        Ok(nodes)
    }

    fn matches_filter(&self, path: &Path) -> bool {
        match &self.extension {
            None => true,
            Some(want) => path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(want))
                .unwrap_or(false),
        }
    }
}
