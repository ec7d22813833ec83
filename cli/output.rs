use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use colored::*;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use pilot_core::AppError;

use crate::cli_args::OutputOpts;

/// Where a finished prompt goes. Exactly one sink per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Clipboard,
    File(PathBuf),
}

impl OutputSink {
    pub fn from_opts(opts: &OutputOpts, default_file: &Path) -> Self {
        if opts.copy {
            if let Some(path) = &opts.output {
                log::warn!(
                    "Both --copy and --output given; copying to clipboard, not writing {}",
                    path.display()
                );
            }
            OutputSink::Clipboard
        } else {
            OutputSink::File(
                opts.output
                    .clone()
                    .unwrap_or_else(|| default_file.to_path_buf()),
            )
        }
    }
}

/// The path whose file name is added to the ignore rules, whether or not the
/// prompt ends up on the clipboard.
pub fn output_path(opts: &OutputOpts, default_file: &Path) -> PathBuf {
    opts.output
        .clone()
        .unwrap_or_else(|| default_file.to_path_buf())
}

pub fn deliver(prompt: &str, sink: &OutputSink, quiet: bool) -> Result<()> {
    let size = Byte::from_u128(prompt.len() as u128)
        .unwrap_or_default()
        .get_appropriate_unit(UnitType::Binary);
    let chars = group_thousands(prompt.chars().count());

    match sink {
        OutputSink::Clipboard => {
            copy_to_clipboard(prompt)?;
            if !quiet {
                println!(
                    "{} Prompt copied to clipboard ({} chars, {:.1})",
                    "✨".green(),
                    chars,
                    size
                );
            }
        }
        OutputSink::File(path) => {
            write_to_file(path, prompt)?;
            if !quiet {
                println!(
                    "{} Prompt written to {} ({} chars, {:.1})",
                    "✨".green(),
                    path.display().to_string().blue(),
                    chars,
                    size
                );
            }
        }
    }
    Ok(())
}

fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file = File::create(path).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(content.as_bytes())
        .map_err(|e| AppError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

fn clipboard_commands() -> Vec<(&'static str, &'static [&'static str])> {
    if cfg!(target_os = "macos") {
        vec![("pbcopy", &[])]
    } else if cfg!(target_os = "windows") {
        vec![("clip", &[])]
    } else {
        let mut commands: Vec<(&'static str, &'static [&'static str])> = Vec::new();
        if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            commands.push(("wl-copy", &[]));
        }
        commands.push(("xclip", &["-selection", "clipboard"]));
        commands.push(("xsel", &["--clipboard", "--input"]));
        commands
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let candidates = clipboard_commands();
    for (program, args) in &candidates {
        let mut child = match Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Clipboard tool '{}' not found, trying next.", program);
                continue;
            }
            Err(e) => {
                return Err(AppError::Clipboard(format!("Failed to start {}: {}", program, e)).into());
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| AppError::Clipboard(format!("Failed to write to {}: {}", program, e)))?;
        }
        let status = child
            .wait()
            .map_err(|e| AppError::Clipboard(format!("Failed to wait for {}: {}", program, e)))?;
        if status.success() {
            log::debug!("Copied {} bytes with {}", text.len(), program);
            return Ok(());
        }
        log::warn!("Clipboard tool '{}' exited with {}", program, status);
    }

    let tried: Vec<&str> = candidates.iter().map(|(p, _)| *p).collect();
    Err(AppError::Clipboard(format!(
        "No working clipboard tool found (tried: {}). Use -o to write a file instead.",
        tried.join(", ")
    ))
    .into())
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
