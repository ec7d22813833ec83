use crate::config::ScanConfig;
use crate::error::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log;
use std::path::{Component, Path, PathBuf};

/// The compiled ignore rules for one scan: default directory and file names,
/// the root `.gitignore` lines and the output file name, in that order, so
/// later rules (including `!` negations) take precedence over earlier ones.
#[derive(Debug)]
pub struct IgnoreMatcher {
    root: PathBuf,
    rules: Gitignore,
    only_from: Option<Vec<String>>,
}

impl IgnoreMatcher {
    pub fn build(config: &ScanConfig) -> Result<Self> {
        log::debug!("Compiling ignore rules for {}", config.root.display());
        let mut builder = GitignoreBuilder::new(&config.root);
        // An unclosed `[` is a malformed pattern like any other, not a literal.
        builder.allow_unclosed_class(false);

        // Directory-name rules only apply to directories, at any depth.
        for name in &config.ignore_dir_names {
            let name = escape_literal(name.trim_end_matches('/'));
            add_rule(&mut builder, &format!("{}/", name), "default dir");
        }
        for name in &config.ignore_file_names {
            add_rule(&mut builder, &escape_literal(name), "default file");
        }
        for pattern in &config.gitignore_patterns {
            add_rule(&mut builder, pattern, ".gitignore");
        }
        if let Some(output_name) = &config.output_file_name {
            add_rule(&mut builder, &escape_literal(output_name), "output file");
        }

        let rules = builder.build()?;
        log::debug!("Compiled {} ignore rules.", rules.num_ignores() + rules.num_whitelists());
        Ok(Self {
            root: config.root.clone(),
            rules,
            only_from: config.only_from.clone(),
        })
    }

    /// Whether `path` (absolute under the root, or root-relative) is excluded.
    /// A path inside an ignored directory is ignored too. The root itself is
    /// never ignored.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            return false;
        }
        if relative.is_absolute() {
            log::trace!("Path outside scan root treated as ignored: {}", path.display());
            return true;
        }

        if !self.in_scope(relative) {
            log::trace!("Out of scope: {}", relative.display());
            return true;
        }

        let ignored = self
            .rules
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore();
        if ignored {
            log::trace!("Ignored by rules: {}", relative.display());
        }
        ignored
    }

    fn in_scope(&self, relative: &Path) -> bool {
        let Some(allowed) = &self.only_from else {
            return true;
        };
        match relative.components().next() {
            Some(Component::Normal(first)) => allowed.iter().any(|a| first == a.as_str()),
            _ => false,
        }
    }
}

// Malformed patterns are rejected and skipped so one bad line cannot disable
// the rest of the ignore rules.
fn add_rule(builder: &mut GitignoreBuilder, line: &str, origin: &str) {
    if let Err(e) = builder.add_line(None, line) {
        log::warn!("Skipping invalid ignore pattern \"{}\" ({}): {}", line, origin, e);
    } else {
        log::trace!("Added ignore rule \"{}\" ({})", line, origin);
    }
}

/// Turns a plain file or directory name into a gitignore line that matches
/// exactly that name.
fn escape_literal(name: &str) -> String {
    let mut line = String::with_capacity(name.len() + 4);
    if name.starts_with(['#', '!']) {
        line.push('\\');
    }
    for ch in name.chars() {
        if matches!(ch, '\\' | '[' | ']' | '*' | '?' | '{' | '}') {
            line.push('\\');
        }
        line.push(ch);
    }
    // Unescaped trailing spaces are trimmed by the gitignore parser.
    if line.ends_with(' ') {
        line.insert(line.len() - 1, '\\');
    }
    line
}
