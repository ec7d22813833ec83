use crate::error::{AppError, Result};
use log;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".pilot";
pub const DEFAULT_CONFIG_FILENAME: &str = "pilot.toml";
pub const GITIGNORE_FILENAME: &str = ".gitignore";
pub const DEFAULT_OUTPUT_FILE: &str = "prompt.txt";
pub const DEFAULT_TOKEN_THRESHOLD: usize = 1_000_000;
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_CORRECTION_FACTOR: f64 = 1.28;

pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    "venv",
    ".venv",
    "__pycache__",
    ".pytest_cache",
    ".ruff_cache",
    "build",
    "dist",
    ".eggs",
    "node_modules",
    "target",
];
pub const DEFAULT_IGNORE_FILES: &[&str] = &["pilot.py", "chatgpt_prompt.txt"];
pub const DEFAULT_EXTENSIONS: &[&str] = &[".py", ".toml", ".yaml", ".json", ".md", ".sh", ".txt"];

/// On-disk configuration (`.pilot/pilot.toml`). Every field is optional;
/// anything left out falls back to the built-in defaults above.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub tokens: TokensSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    #[serde(default)]
    pub ignore_dirs: Option<Vec<String>>,
    #[serde(default)]
    pub ignore_files: Option<Vec<String>>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub only_from: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub use_gitignore: bool,
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TokensSection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_correction_factor")]
    pub correction_factor: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
}

fn default_true() -> bool {
    true
}
fn default_threshold() -> usize {
    DEFAULT_TOKEN_THRESHOLD
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_correction_factor() -> f64 {
    DEFAULT_CORRECTION_FACTOR
}
fn default_output_file() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            ignore_dirs: None,
            ignore_files: None,
            extensions: None,
            only_from: None,
            use_gitignore: default_true(),
            threshold: default_threshold(),
        }
    }
}
impl Default for TokensSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            correction_factor: default_correction_factor(),
        }
    }
}
impl Default for OutputSection {
    fn default() -> Self {
        Self {
            file: default_output_file(),
        }
    }
}

impl Config {
    pub fn effective_ignore_dirs(&self) -> Vec<String> {
        self.scan
            .ignore_dirs
            .clone()
            .unwrap_or_else(|| to_owned_list(DEFAULT_IGNORE_DIRS))
    }

    pub fn effective_ignore_files(&self) -> Vec<String> {
        self.scan
            .ignore_files
            .clone()
            .unwrap_or_else(|| to_owned_list(DEFAULT_IGNORE_FILES))
    }

    pub fn effective_extensions(&self) -> Vec<String> {
        self.scan
            .extensions
            .clone()
            .unwrap_or_else(|| to_owned_list(DEFAULT_EXTENSIONS))
    }

    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_to_resolve = match cli_project_root {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        let root = path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })?;
        if !root.is_dir() {
            return Err(AppError::InvalidArgument(format!(
                "Project root is not a directory: {}",
                root.display()
            )));
        }
        Ok(root)
    }

    /// Finds the config file to load, if any.
    ///
    /// A requested name without a directory part (`alt`, `alt.toml`) is looked
    /// up in `<root>/.pilot/`; anything else is taken as a path. A requested
    /// file that does not exist is an error, a missing default file is not.
    pub fn locate_config_file(
        project_root: &Path,
        requested: Option<&str>,
        disabled: bool,
    ) -> Result<Option<PathBuf>> {
        if disabled {
            log::debug!("Config file loading disabled via --no-config.");
            return Ok(None);
        }
        let config_dir = project_root.join(DEFAULT_CONFIG_DIR);

        let Some(requested) = requested else {
            let default_path = config_dir.join(DEFAULT_CONFIG_FILENAME);
            if default_path.is_file() {
                return Ok(Some(default_path));
            }
            log::debug!("No config file at {}", default_path.display());
            return Ok(None);
        };

        let expanded = PathBuf::from(shellexpand::tilde(requested).as_ref());
        let candidate = if expanded.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            expanded
        } else if expanded.extension().is_some_and(|e| e == "toml") {
            config_dir.join(expanded)
        } else {
            config_dir.join(format!("{}.toml", requested))
        };

        if !candidate.is_file() {
            return Err(AppError::Config(format!(
                "Config file '{}' not found (looked for {})",
                requested,
                candidate.display()
            )));
        }
        log::debug!("Using config file {}", candidate.display());
        Ok(Some(candidate))
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        let config = toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tokens.correction_factor.is_finite() && self.tokens.correction_factor > 0.0) {
            return Err(AppError::Config(format!(
                "tokens.correction_factor must be a positive number, got {}",
                self.tokens.correction_factor
            )));
        }
        if self.output.file.file_name().is_none() {
            return Err(AppError::Config(format!(
                "output.file must name a file, got '{}'",
                self.output.file.display()
            )));
        }
        Ok(())
    }
}

/// Everything a scan needs, resolved once per invocation and never mutated
/// while the tree and file passes run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub ignore_dir_names: Vec<String>,
    pub ignore_file_names: Vec<String>,
    pub gitignore_patterns: Vec<String>,
    pub extensions: Vec<String>,
    pub token_threshold: usize,
    pub output_file_name: Option<String>,
    pub only_from: Option<Vec<String>>,
}

impl ScanConfig {
    /// Built-in defaults with no `.gitignore` patterns and no output file.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_dir_names: to_owned_list(DEFAULT_IGNORE_DIRS),
            ignore_file_names: to_owned_list(DEFAULT_IGNORE_FILES),
            gitignore_patterns: Vec::new(),
            extensions: to_owned_list(DEFAULT_EXTENSIONS),
            token_threshold: DEFAULT_TOKEN_THRESHOLD,
            output_file_name: None,
            only_from: None,
        }
    }

    pub fn from_config(root: &Path, config: &Config, output_path: &Path) -> Result<Self> {
        let gitignore_patterns = if config.scan.use_gitignore {
            load_gitignore_patterns(root)
        } else {
            log::debug!("Gitignore loading disabled in configuration.");
            Vec::new()
        };

        let output_file_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        if output_file_name.is_none() {
            return Err(AppError::InvalidArgument(format!(
                "Output path does not name a file: {}",
                output_path.display()
            )));
        }

        let mut extensions = config.effective_extensions();
        let mut seen = HashSet::new();
        extensions.retain(|e| !e.is_empty() && seen.insert(e.clone()));

        let scan = Self {
            root: root.to_path_buf(),
            ignore_dir_names: config.effective_ignore_dirs(),
            ignore_file_names: config.effective_ignore_files(),
            gitignore_patterns,
            extensions,
            token_threshold: config.scan.threshold,
            output_file_name,
            only_from: config.scan.only_from.clone(),
        };
        log::debug!("Resolved scan configuration: {:?}", scan);
        Ok(scan)
    }
}

/// Reads `<root>/.gitignore`, dropping blank lines and comments. A missing or
/// unreadable file yields no patterns.
pub fn load_gitignore_patterns(root: &Path) -> Vec<String> {
    let gitignore_path = root.join(GITIGNORE_FILENAME);
    if !gitignore_path.is_file() {
        log::trace!("No {} found at {}", GITIGNORE_FILENAME, root.display());
        return Vec::new();
    }
    match fs::read_to_string(&gitignore_path) {
        Ok(content) => {
            let patterns: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from)
                .collect();
            log::debug!(
                "Loaded {} patterns from {}",
                patterns.len(),
                gitignore_path.display()
            );
            patterns
        }
        Err(e) => {
            log::warn!(
                "Failed to read {}: {}. Continuing without it.",
                gitignore_path.display(),
                e
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_config_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scan.threshold, DEFAULT_TOKEN_THRESHOLD);
        assert_eq!(config.effective_extensions(), to_owned_list(DEFAULT_EXTENSIONS));
        assert_eq!(config.output.file, PathBuf::from("prompt.txt"));
    }

    #[test]
    fn config_sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scan]
            extensions = [".rs"]
            ignore_dirs = ["out"]
            threshold = 42

            [tokens]
            model = "gpt-4o"
            correction_factor = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.effective_extensions(), vec![".rs".to_string()]);
        assert_eq!(config.effective_ignore_dirs(), vec!["out".to_string()]);
        assert_eq!(config.effective_ignore_files(), to_owned_list(DEFAULT_IGNORE_FILES));
        assert_eq!(config.scan.threshold, 42);
        assert_eq!(config.tokens.model, "gpt-4o");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[scan]\nbogus = 1\n").is_err());
    }

    #[test]
    fn non_positive_correction_factor_is_rejected() {
        let mut config = Config::default();
        config.tokens.correction_factor = 0.0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn gitignore_comments_and_blanks_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".gitignore"),
            "# build output\n\n/out/\n*.log\n  !keep.log  \n",
        )
        .unwrap();
        assert_eq!(
            load_gitignore_patterns(tmp.path()),
            vec!["/out/".to_string(), "*.log".to_string(), "!keep.log".to_string()]
        );
    }

    #[test]
    fn missing_gitignore_yields_no_patterns() {
        let tmp = TempDir::new().unwrap();
        assert!(load_gitignore_patterns(tmp.path()).is_empty());
    }

    #[test]
    fn scan_config_takes_output_name_and_respects_use_gitignore() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "secret/\n").unwrap();

        let config = Config::default();
        let scan = ScanConfig::from_config(tmp.path(), &config, Path::new("out/my_prompt.txt"))
            .unwrap();
        assert_eq!(scan.output_file_name.as_deref(), Some("my_prompt.txt"));
        assert_eq!(scan.gitignore_patterns, vec!["secret/".to_string()]);

        let mut no_git = Config::default();
        no_git.scan.use_gitignore = false;
        let scan = ScanConfig::from_config(tmp.path(), &no_git, Path::new("prompt.txt")).unwrap();
        assert!(scan.gitignore_patterns.is_empty());
    }

    #[test]
    fn config_file_bare_name_is_looked_up_in_config_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("alt.toml"), "").unwrap();

        let found = Config::locate_config_file(tmp.path(), Some("alt"), false).unwrap();
        assert_eq!(found, Some(dir.join("alt.toml")));
        let found = Config::locate_config_file(tmp.path(), Some("alt.toml"), false).unwrap();
        assert_eq!(found, Some(dir.join("alt.toml")));

        assert!(Config::locate_config_file(tmp.path(), None, false).unwrap().is_none());
        assert!(Config::locate_config_file(tmp.path(), None, true).unwrap().is_none());
        assert!(Config::locate_config_file(tmp.path(), Some("missing"), false).is_err());
    }

    #[test]
    fn config_file_explicit_path_is_used_as_given() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings").join("pilot-ci.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[scan]\nthreshold = 3\n").unwrap();

        let requested = path.to_string_lossy().into_owned();
        let found = Config::locate_config_file(tmp.path(), Some(&requested), false).unwrap();
        assert_eq!(found, Some(path.clone()));
        assert_eq!(Config::load_from_path(&path).unwrap().scan.threshold, 3);

        let gone = tmp.path().join("settings").join("gone.toml");
        assert!(
            Config::locate_config_file(tmp.path(), Some(&gone.to_string_lossy()), false).is_err()
        );
    }

    #[test]
    fn duplicate_extensions_are_collapsed_in_order() {
        let mut config = Config::default();
        config.scan.extensions = Some(vec![
            ".py".to_string(),
            ".md".to_string(),
            String::new(),
            ".py".to_string(),
        ]);
        let scan = ScanConfig::from_config(Path::new("/project"), &config, Path::new("prompt.txt"))
            .unwrap();
        assert_eq!(scan.extensions, vec![".py".to_string(), ".md".to_string()]);
    }
}
