use crate::config::ScanConfig;
use crate::error::{AppError, Result};
use crate::matcher::IgnoreMatcher;
use log;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file picked for a prompt. `content` is `None` when the file could not be
/// read as UTF-8 text; it is still listed so the prompt can show a placeholder.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub relative_path: String,
    pub content: Option<String>,
    pub size: usize,
}

/// Collects every regular file under the root whose name ends with one of the
/// configured extensions, sorted by path string. Ignored directories are
/// pruned from the walk rather than filtered afterwards.
pub fn collect_files(config: &ScanConfig, matcher: &IgnoreMatcher) -> Vec<PathBuf> {
    log::info!("Collecting files under {}", config.root.display());

    let walker = WalkDir::new(&config.root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !matcher.is_ignored(entry.path(), entry.file_type().is_dir())
        });

    let mut files = Vec::new();
    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error walking directory: {}", AppError::from(e));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if has_allowed_extension(&name, &config.extensions) {
            log::trace!("Including file: {}", entry.path().display());
            files.push(entry.into_path());
        } else {
            log::trace!("Extension not allowed: {}", entry.path().display());
        }
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    log::info!("Collected {} files.", files.len());
    files
}

/// Plain suffix match on the file name: `foo.backup.py` matches `.py`.
pub fn has_allowed_extension(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

pub fn relative_display(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    String::from_utf8(bytes).map_err(|_| AppError::NonUtf8 {
        path: path.to_path_buf(),
    })
}

/// Reads each path in order. Failures never abort: the file is kept with no
/// content and the error is returned alongside for reporting.
pub fn read_file_contents(root: &Path, paths: &[PathBuf]) -> (Vec<FileInfo>, Vec<AppError>) {
    log::info!("Reading content for {} files...", paths.len());
    let mut files = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();

    for path in paths {
        let relative_path = relative_display(path, root);
        let content = match read_text(path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Could not read {}: {}", relative_path, e);
                errors.push(e);
                None
            }
        };
        files.push(FileInfo {
            relative_path,
            size: content.as_ref().map_or(0, String::len),
            content,
        });
    }
    log::info!("File reading complete.");
    (files, errors)
}
