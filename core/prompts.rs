use crate::gather::FileInfo;
use once_cell::sync::Lazy;
use serde::Deserialize;

pub const NO_GIT_CHANGES: &str = "No Git changes detected.";
pub const UNREADABLE_FILE: &str = "Error: Could not read this file.";

#[derive(Debug, Deserialize)]
pub struct StrategyText {
    pub role: String,
    pub mission: String,
}

#[derive(Debug, Deserialize)]
pub struct GitText {
    pub instructions: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptTemplates {
    pub full_context: StrategyText,
    pub discovery: StrategyText,
    pub git: GitText,
}

static PROMPT_TEMPLATES: Lazy<PromptTemplates> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/prompts.yaml"));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/prompts.yaml")
});

pub fn get_prompt_templates() -> &'static PromptTemplates {
    &PROMPT_TEMPLATES
}

/// One fenced block per file; unreadable files get a placeholder body.
pub fn file_block(file: &FileInfo) -> String {
    let body = match &file.content {
        Some(text) => text.trim(),
        None => UNREADABLE_FILE,
    };
    format!("## `{}`:\n```\n{}\n```", file.relative_path, body)
}

fn file_blocks(files: &[FileInfo]) -> String {
    files.iter().map(file_block).collect::<Vec<_>>().join("\n\n")
}

pub fn full_context_prompt(task: &str, tree: &str, files: &[FileInfo]) -> String {
    let text = &get_prompt_templates().full_context;
    format!(
        "# Your Task\n{task}\n\n{role}\n\n# Project Context\n\n## Folder Structure\n```\n{tree}\n```\n\n## File Contents\n{contents}\n\n---\n{mission}",
        role = text.role,
        contents = file_blocks(files),
        mission = text.mission,
    )
}

pub fn discovery_prompt(task: &str, tree: &str) -> String {
    let text = &get_prompt_templates().discovery;
    format!(
        "# Your Task\n{task}\n\n{role}\n\n# Project Folder Structure\n```\n{tree}\n```\n\n---\n{mission}",
        role = text.role,
        mission = text.mission,
    )
}

pub fn files_prompt(files: &[FileInfo]) -> String {
    file_blocks(files)
}

/// An empty or whitespace-only diff produces [`NO_GIT_CHANGES`] verbatim.
pub fn git_prompt(diff: &str) -> String {
    if diff.trim().is_empty() {
        return NO_GIT_CHANGES.to_string();
    }
    format!(
        "## Full Git Diff\n```diff\n{diff}\n```\n\n---\n{instructions}",
        instructions = get_prompt_templates().git.instructions,
    )
}
