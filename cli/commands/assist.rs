use crate::Session;
use crate::cli_args::AssistArgs;
use crate::output::{self, OutputSink};
use anyhow::{Context, Result};
use colored::Colorize;
use log;
use pilot_core::{AppError, AssistContext, Config, ContextStrategy, ScanConfig, TokenEstimator};

pub fn handle_assist_command(args: AssistArgs, session: Session) -> Result<()> {
    let task = args.task.trim();
    if task.is_empty() {
        return Err(AppError::InvalidArgument("The task must not be empty.".to_string()).into());
    }

    let config = apply_overrides(session.config, &args);
    let output_path = output::output_path(&args.output, &config.output.file);
    let sink = OutputSink::from_opts(&args.output, &config.output.file);

    let scan = ScanConfig::from_config(&session.root, &config, &output_path)
        .context("Failed to prepare scan configuration")?;
    let estimator = TokenEstimator::for_model(&config.tokens.model, config.tokens.correction_factor)
        .context("Failed to initialise token estimator")?;

    if !session.quiet {
        println!("{} Starting analysis...", "🚀".cyan());
    }
    let context = AssistContext::gather(&scan, &args.task, &estimator)
        .context("Failed to analyse the project")?;

    if !context.read_errors.is_empty() && !session.quiet {
        eprintln!(
            "{}",
            "Warning: Errors encountered during file reading:".yellow()
        );
        for err in &context.read_errors {
            eprintln!(" - {}", err);
        }
        eprintln!("---");
    }

    if !session.quiet {
        println!(
            "{} Found {} relevant files.",
            "📂".cyan(),
            context.snapshot.files.len().to_string().bold()
        );
        println!(
            "{} Estimated token count: {} (threshold {})",
            "🔢".cyan(),
            output::group_thousands(context.snapshot.estimated_tokens).bold(),
            output::group_thousands(scan.token_threshold)
        );
        match context.strategy {
            ContextStrategy::FullContext => println!(
                "{} Strategy: {}. The whole project fits in the prompt.",
                "✅".green(),
                context.strategy.to_string().green().bold()
            ),
            ContextStrategy::Discovery => println!(
                "{} Strategy: {}. Only the folder structure is sent; the assistant will ask for files.",
                "🔎".yellow(),
                context.strategy.to_string().yellow().bold()
            ),
        }
    }

    let prompt = context.render(&args.task);
    output::deliver(&prompt, &sink, session.quiet)
}

fn apply_overrides(mut config: Config, args: &AssistArgs) -> Config {
    log::trace!("Applying assist command CLI overrides to config...");
    if !args.ext.is_empty() {
        config.scan.extensions = Some(args.ext.clone());
    }
    if let Some(threshold) = args.threshold {
        config.scan.threshold = threshold;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_args::OutputOpts;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(task: &str, output: PathBuf) -> AssistArgs {
        AssistArgs {
            task: task.to_string(),
            ext: Vec::new(),
            threshold: None,
            output: OutputOpts {
                output: Some(output),
                copy: false,
            },
        }
    }

    #[test]
    fn cli_flags_override_config() {
        let mut a = args("t", PathBuf::from("p.txt"));
        a.ext = vec![".rs".to_string()];
        a.threshold = Some(5);
        let config = apply_overrides(Config::default(), &a);
        assert_eq!(config.scan.extensions, Some(vec![".rs".to_string()]));
        assert_eq!(config.scan.threshold, 5);

        let untouched = apply_overrides(Config::default(), &args("t", PathBuf::from("p.txt")));
        assert_eq!(untouched, Config::default());
    }

    #[test]
    fn empty_task_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let session = Session {
            root: tmp.path().to_path_buf(),
            config: Config::default(),
            quiet: true,
        };
        let err = handle_assist_command(args("   ", tmp.path().join("out.txt")), session)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::InvalidArgument(_))
        ));
        assert!(!tmp.path().join("out.txt").exists());
    }

    #[test]
    fn writes_full_context_prompt_without_embedding_itself() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("a.py"), "x=1").unwrap();
        fs::write(root.join("out.txt"), "stale prompt").unwrap();

        let session = Session {
            root: root.to_path_buf(),
            config: Config::default(),
            quiet: true,
        };
        let mut a = args("Explain a.py", root.join("out.txt"));
        a.ext = vec![".py".to_string(), ".txt".to_string()];
        handle_assist_command(a, session).unwrap();

        let prompt = fs::read_to_string(root.join("out.txt")).unwrap();
        assert!(prompt.starts_with("# Your Task\nExplain a.py"));
        assert!(prompt.contains("## `a.py`:\n```\nx=1\n```"));
        assert!(!prompt.contains("stale prompt"));
        assert!(!prompt.contains("out.txt"));
    }
}
