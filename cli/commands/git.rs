use crate::Session;
use crate::cli_args::GitArgs;
use crate::output::{self, OutputSink};
use anyhow::{Context, Result};
use colored::Colorize;
use pilot_core::prompts::{NO_GIT_CHANGES, git_prompt};
use pilot_core::vcs;

pub fn handle_git_command(args: GitArgs, session: &Session) -> Result<()> {
    let diff = vcs::collect_diff(&session.root, args.staged)
        .context("Failed to collect git changes")?;

    let prompt = git_prompt(&diff);
    if prompt == NO_GIT_CHANGES && !session.quiet {
        println!("{}", NO_GIT_CHANGES.yellow());
    }

    let sink = OutputSink::from_opts(&args.output, &session.config.output.file);
    output::deliver(&prompt, &sink, session.quiet)
}
