use crate::config::ScanConfig;
use crate::error::{AppError, Result};
use crate::gather::{self, FileInfo};
use crate::matcher::IgnoreMatcher;
use crate::prompts;
use crate::tokens::TokenEstimator;
use crate::tree;
use log;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStrategy {
    /// Every collected file is embedded alongside the tree and task.
    FullContext,
    /// Only the tree and task; the assistant asks for files afterwards.
    Discovery,
}

impl ContextStrategy {
    /// Full context only when the estimate is strictly below the threshold.
    pub fn select(estimated_tokens: usize, threshold: usize) -> Self {
        if estimated_tokens < threshold {
            ContextStrategy::FullContext
        } else {
            ContextStrategy::Discovery
        }
    }
}

impl fmt::Display for ContextStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextStrategy::FullContext => write!(f, "full-context"),
            ContextStrategy::Discovery => write!(f, "discovery"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub tree: String,
    pub files: Vec<PathBuf>,
    pub estimated_tokens: usize,
}

/// The scanned project for one `assist` run: snapshot, file contents read
/// once, the read failures seen along the way, and the chosen strategy.
#[derive(Debug)]
pub struct AssistContext {
    pub snapshot: ProjectSnapshot,
    pub files: Vec<FileInfo>,
    pub read_errors: Vec<AppError>,
    pub strategy: ContextStrategy,
}

/// Concatenation the estimate is taken over: tree, newline, task, then every
/// readable file body back to back.
pub fn estimation_text(tree: &str, task: &str, files: &[FileInfo]) -> String {
    let mut full_context = String::with_capacity(
        tree.len() + task.len() + 1 + files.iter().map(|f| f.size).sum::<usize>(),
    );
    full_context.push_str(tree);
    full_context.push('\n');
    full_context.push_str(task);
    for content in files.iter().filter_map(|f| f.content.as_deref()) {
        full_context.push_str(content);
    }
    full_context
}

impl AssistContext {
    pub fn gather(config: &ScanConfig, task: &str, estimator: &TokenEstimator) -> Result<Self> {
        let matcher = IgnoreMatcher::build(config)?;

        let tree = tree::build_tree(config, &matcher);
        let paths = gather::collect_files(config, &matcher);
        let (files, read_errors) = gather::read_file_contents(&config.root, &paths);

        let estimated_tokens = estimator.estimate(&estimation_text(&tree, task, &files));
        let strategy = ContextStrategy::select(estimated_tokens, config.token_threshold);
        log::info!(
            "Estimated {} tokens against threshold {} ({}): {} strategy selected.",
            estimated_tokens,
            config.token_threshold,
            estimator.model(),
            strategy
        );

        Ok(Self {
            snapshot: ProjectSnapshot {
                tree,
                files: paths,
                estimated_tokens,
            },
            files,
            read_errors,
            strategy,
        })
    }

    pub fn render(&self, task: &str) -> String {
        match self.strategy {
            ContextStrategy::FullContext => {
                prompts::full_context_prompt(task, &self.snapshot.tree, &self.files)
            }
            ContextStrategy::Discovery => prompts::discovery_prompt(task, &self.snapshot.tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn estimator() -> TokenEstimator {
        TokenEstimator::for_model("gpt-4", 1.28).unwrap()
    }

    #[test]
    fn threshold_boundary_is_strict() {
        assert_eq!(ContextStrategy::select(999, 1000), ContextStrategy::FullContext);
        assert_eq!(ContextStrategy::select(1000, 1000), ContextStrategy::Discovery);
        assert_eq!(ContextStrategy::select(1001, 1000), ContextStrategy::Discovery);
        assert_eq!(ContextStrategy::select(0, 0), ContextStrategy::Discovery);
    }

    #[test]
    fn estimation_text_skips_unreadable_files() {
        let files = vec![
            FileInfo {
                relative_path: "a.py".into(),
                content: Some("x=1".into()),
                size: 3,
            },
            FileInfo {
                relative_path: "b.py".into(),
                content: None,
                size: 0,
            },
            FileInfo {
                relative_path: "c.md".into(),
                content: Some("# doc".into()),
                size: 5,
            },
        ];
        assert_eq!(estimation_text(".", "task", &files), ".\ntaskx=1# doc");
    }

    #[test]
    fn large_project_selects_discovery() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("big.py"), "value = 1\n".repeat(500)).unwrap();

        let mut config = ScanConfig::with_defaults(tmp.path());
        config.token_threshold = 100;
        let context = AssistContext::gather(&config, "Refactor", &estimator()).unwrap();

        assert_eq!(context.strategy, ContextStrategy::Discovery);
        assert!(context.snapshot.estimated_tokens >= 100);
        let prompt = context.render("Refactor");
        assert!(prompt.contains("big.py"));
        assert!(!prompt.contains("value = 1"));
    }

    #[test]
    fn estimated_tokens_drive_the_strategy_at_the_boundary() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "print('hello')").unwrap();

        let mut config = ScanConfig::with_defaults(tmp.path());
        let probe = AssistContext::gather(&config, "task", &estimator()).unwrap();
        let estimate = probe.snapshot.estimated_tokens;
        assert!(estimate > 0);

        config.token_threshold = estimate;
        let at = AssistContext::gather(&config, "task", &estimator()).unwrap();
        assert_eq!(at.strategy, ContextStrategy::Discovery);

        config.token_threshold = estimate + 1;
        let above = AssistContext::gather(&config, "task", &estimator()).unwrap();
        assert_eq!(above.strategy, ContextStrategy::FullContext);
    }

    #[test]
    fn binary_files_are_listed_but_not_estimated() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("ok.py"), "x=1").unwrap();
        fs::write(tmp.path().join("blob.py"), [0xff, 0xfe, 0xfd]).unwrap();

        let config = ScanConfig::with_defaults(tmp.path());
        let context = AssistContext::gather(&config, "task", &estimator()).unwrap();

        assert_eq!(context.snapshot.files.len(), 2);
        assert_eq!(context.read_errors.len(), 1);
        assert_eq!(context.strategy, ContextStrategy::FullContext);
        let prompt = context.render("task");
        assert!(prompt.contains(&format!("## `blob.py`:\n```\n{}\n```", prompts::UNREADABLE_FILE)));
        assert!(prompt.contains("## `ok.py`:\n```\nx=1\n```"));
    }
}
