use crate::config::ScanConfig;
use crate::matcher::IgnoreMatcher;
use log;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_PREFIX: &str = "│   ";
const SPACE_PREFIX: &str = "    ";

#[derive(Debug)]
struct TreeEntry {
    name: OsString,
    path: PathBuf,
    is_dir: bool,
}

impl TreeEntry {
    fn sort_key(&self) -> (bool, String) {
        (!self.is_dir, self.name.to_string_lossy().to_lowercase())
    }
}

fn compare_entries(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    a.sort_key()
        .cmp(&b.sort_key())
        .then_with(|| a.name.cmp(&b.name))
}

/// Renders the project structure as an ASCII tree rooted at `.`.
///
/// Ignored entries are dropped before sorting, and ignored directories are
/// never listed. A directory that cannot be read is rendered as empty.
pub fn build_tree(config: &ScanConfig, matcher: &IgnoreMatcher) -> String {
    log::debug!("Building tree for {}", config.root.display());
    let mut lines = vec![".".to_string()];
    walk(&config.root, "", matcher, &mut lines);
    log::debug!("Tree built with {} entries.", lines.len() - 1);
    lines.join("\n")
}

fn walk(dir: &Path, prefix: &str, matcher: &IgnoreMatcher, lines: &mut Vec<String>) {
    let entries = list_children(dir, matcher);
    let total = entries.len();

    for (i, entry) in entries.iter().enumerate() {
        let is_last = i + 1 == total;
        let connector = if is_last { LAST_BRANCH } else { BRANCH };
        lines.push(format!(
            "{}{}{}",
            prefix,
            connector,
            entry.name.to_string_lossy()
        ));
        if entry.is_dir {
            let extension = if is_last { SPACE_PREFIX } else { PIPE_PREFIX };
            walk(&entry.path, &format!("{}{}", prefix, extension), matcher, lines);
        }
    }
}

fn list_children(dir: &Path, matcher: &IgnoreMatcher) -> Vec<TreeEntry> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            log::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut entries: Vec<TreeEntry> = read_dir
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Error reading entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter_map(|entry| {
            // Symlinks are not followed, so a link to a directory renders as a leaf.
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            let path = entry.path();
            if matcher.is_ignored(&path, is_dir) {
                None
            } else {
                Some(TreeEntry {
                    name: entry.file_name(),
                    path,
                    is_dir,
                })
            }
        })
        .collect();

    entries.sort_by(compare_entries);
    entries
}
