pub mod config;
pub mod error;
pub mod gather;
pub mod matcher;
pub mod prompts;
pub mod strategy;
pub mod tokens;
pub mod tree;
pub mod vcs;

pub use config::{Config, ScanConfig};
pub use error::{AppError, Result};
pub use gather::{FileInfo, collect_files, read_file_contents};
pub use matcher::IgnoreMatcher;
pub use strategy::{AssistContext, ContextStrategy, ProjectSnapshot};
pub use tokens::TokenEstimator;
pub use tree::build_tree;
