use crate::error::{AppError, Result};
use log;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

const GIT: &str = "git";
const DIFF_ARGS: &[&str] = &["diff", "--no-color", "--unified=3"];

/// Staged changes, followed by unstaged ones unless `staged_only`.
///
/// A missing `git` executable is fatal. A failing diff (e.g. not a
/// repository) is logged and contributes nothing.
pub fn collect_diff(root: &Path, staged_only: bool) -> Result<String> {
    let mut diff = run_git_diff(root, &["--cached"])?;
    if !staged_only {
        diff.push_str(&run_git_diff(root, &[])?);
    }
    log::debug!("Collected {} bytes of diff output.", diff.len());
    Ok(diff)
}

fn run_git_diff(root: &Path, extra: &[&str]) -> Result<String> {
    let mut cmd = Command::new(GIT);
    cmd.args(DIFF_ARGS).args(extra).current_dir(root);
    log::debug!("Running {:?} in {}", cmd, root.display());

    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::ToolNotFound(GIT.to_string()));
        }
        Err(e) => {
            return Err(AppError::Command(format!("Failed to run git: {}", e)));
        }
    };

    if !output.status.success() {
        log::warn!(
            "Error running git diff{}: {}",
            extra.iter().map(|a| format!(" {}", a)).collect::<String>(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(String::new());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
