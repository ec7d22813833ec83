use crate::Session;
use crate::cli_args::FilesArgs;
use crate::output::{self, OutputSink};
use anyhow::Result;
use colored::Colorize;
use log;
use pilot_core::prompts::files_prompt;
use pilot_core::read_file_contents;
use std::path::PathBuf;

pub fn handle_files_command(args: FilesArgs, session: &Session) -> Result<()> {
    let paths: Vec<PathBuf> = args.paths.iter().map(|p| session.root.join(p)).collect();
    log::debug!("Requested files: {:?}", paths);

    let (files, read_errors) = read_file_contents(&session.root, &paths);
    if !read_errors.is_empty() && !session.quiet {
        eprintln!(
            "{}",
            "Warning: Errors encountered during file reading:".yellow()
        );
        for err in &read_errors {
            eprintln!(" - {}", err);
        }
        eprintln!("---");
    }

    let prompt = files_prompt(&files);
    let sink = OutputSink::from_opts(&args.output, &session.config.output.file);
    output::deliver(&prompt, &sink, session.quiet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_args::OutputOpts;
    use pilot_core::Config;
    use pilot_core::prompts::UNREADABLE_FILE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn embeds_requested_files_in_order_with_placeholders() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src").join("main.py"), "print(1)\n").unwrap();

        let session = Session {
            root: root.to_path_buf(),
            config: Config::default(),
            quiet: true,
        };
        let out = root.join("files.txt");
        let args = FilesArgs {
            paths: vec![PathBuf::from("missing.py"), PathBuf::from("src/main.py")],
            output: OutputOpts {
                output: Some(out.clone()),
                copy: false,
            },
        };
        handle_files_command(args, &session).unwrap();

        let prompt = fs::read_to_string(out).unwrap();
        let expected = format!(
            "## `missing.py`:\n```\n{}\n```\n\n## `src/main.py`:\n```\nprint(1)\n```",
            UNREADABLE_FILE
        );
        assert_eq!(prompt, expected);
    }
}
