use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pilot",
    author,
    version,
    about = "An intelligent context manager for AI assistants.",
    long_about = "pilot scans a project (respecting .gitignore and built-in ignores), estimates \nhow many tokens the full context would take and builds a prompt for an AI assistant: \neither the full project inline, or just the tree with instructions to ask for files.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  pilot assist \"Refactor the auth logic into a service class.\" --ext .py .toml\n  pilot files src/main.py src/utils.py -c\n  pilot git --staged",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Project root (default: current dir).",
        help_heading = "Project Setup"
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help = "Path or name of the TOML config file (default: .pilot/pilot.toml).",
        help_heading = "Project Setup"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        global = true,
        conflicts_with = "config",
        help = "Do not load any TOML config file.",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(about = "Intelligently build context for a given task.")]
    Assist(AssistArgs),

    #[command(about = "Provide specific files to the AI during an interactive session.")]
    Files(FilesArgs),

    #[command(about = "Generate a prompt to suggest commit messages.")]
    Git(GitArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputOpts {
    #[arg(
        short = 'o',
        long,
        value_name = "PATH",
        help = "Write the prompt to this file [default: prompt.txt].",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        help = "Copy the prompt to the clipboard instead of writing a file.",
        help_heading = "Output Control"
    )]
    pub copy: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AssistArgs {
    #[arg(required = true, help = "The high-level task for the AI assistant.")]
    pub task: String,

    #[arg(
        long,
        value_name = "EXT",
        num_args = 1..,
        help = "File extensions to include (suffix match, e.g. .py .md).",
        help_heading = "Content Filtering"
    )]
    pub ext: Vec<String>,

    #[arg(
        long,
        value_name = "N",
        help = "Estimated token count at which discovery mode is used [default: 1000000].",
        help_heading = "Content Filtering"
    )]
    pub threshold: Option<usize>,

    #[clap(flatten)]
    pub output: OutputOpts,
}

#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    #[arg(
        required = true,
        num_args = 1..,
        value_name = "PATH",
        help = "File paths relative to --root."
    )]
    pub paths: Vec<PathBuf>,

    #[clap(flatten)]
    pub output: OutputOpts,
}

#[derive(Args, Debug, Clone)]
pub struct GitArgs {
    #[arg(long, help = "Analyze only staged changes.")]
    pub staged: bool,

    #[clap(flatten)]
    pub output: OutputOpts,
}
