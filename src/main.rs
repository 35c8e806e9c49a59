use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use spellclass::checker::dictionary::Dictionary;
use spellclass::cli::output::{self, OutputFormat};
use spellclass::config::CliOverrides;
use spellclass::{CheckResult, ClassifierRegistry, Config, SpellChecker};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spellclass")]
#[command(version, about = "Spell check the comments, strings and prose inside source and markup files", long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log what each file is classified as and every skipped fault
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ./.spellclass.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Classifier rule file merged over the built-in rules
    #[arg(long, value_name = "FILE", global = true)]
    classifier_rules: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the spell-checkable spans of each file
    Classify {
        /// Files or directories (default: current directory)
        #[arg(value_name = "PATHS")]
        paths: Vec<PathBuf>,
    },
    /// Report misspelled words
    Check {
        /// Files or directories (default: current directory)
        #[arg(value_name = "PATHS")]
        paths: Vec<PathBuf>,

        /// Exit with code 0 even if errors are found
        #[arg(long)]
        no_fail: bool,

        /// Word list or compiled .fst dictionary
        #[arg(short, long, value_name = "FILE")]
        dictionary: Option<PathBuf>,

        /// Pattern to ignore (regex)
        #[arg(long)]
        ignore_pattern: Vec<String>,

        /// Word to accept everywhere
        #[arg(long)]
        ignore_word: Vec<String>,
    },
    /// List which classifier handles each file extension
    Rules,
    /// Compile a word list into an .fst dictionary
    Dict {
        /// Word list, one word per line
        input: PathBuf,
        /// Output file
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spellclass", &mut io::stdout());
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let colored = !cli.no_color;
    if !colored {
        colored::control::set_override(false);
    }

    let mut overrides = CliOverrides {
        config_file: cli.config,
        classifier_rules: cli.classifier_rules,
        ..Default::default()
    };

    match command {
        Commands::Classify { paths } => {
            let config = Config::load(overrides)?;
            let checker = SpellChecker::new(&config)?;
            let files = collect_files(&paths);

            let classified = process_files(&files, |path| checker.classify_file(path));
            output::print_spans(&classified, colored, cli.format)?;
        }
        Commands::Check {
            paths,
            no_fail,
            dictionary,
            ignore_pattern,
            ignore_word,
        } => {
            overrides.dictionary = dictionary;
            overrides.ignore_patterns = ignore_pattern;
            overrides.ignored_words = ignore_word;

            let config = Config::load(overrides)?;
            let checker = SpellChecker::new(&config)?;
            let files = collect_files(&paths);

            let results = process_files(&files, |path| checker.check_file(path));
            output::print_errors(&results, colored, cli.format)?;

            let total_errors: usize = results.iter().map(CheckResult::error_count).sum();
            if cli.format == OutputFormat::Text {
                output::print_check_summary(total_errors, results.len(), colored);
            }

            // Exit with appropriate code
            if total_errors > 0 && !no_fail {
                std::process::exit(1);
            }
        }
        Commands::Rules => {
            let config = Config::load(overrides)?;
            let registry = ClassifierRegistry::load(config.classifier_rules.as_deref())
                .context("Failed to load classifier rules")?;
            output::print_rules(&registry, colored, cli.format)?;
        }
        Commands::Dict { input, output } => {
            let content = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read word list: {}", input.display()))?;
            let words: Vec<&str> = content.lines().collect();
            let count = Dictionary::build_from_words(&words, &output)?;
            println!("Wrote {} words to {}", count, output.display());
        }
    }

    Ok(())
}

/// Files named on the command line plus everything under named directories,
/// honoring ignore files. Missing paths are reported and skipped.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let default = [PathBuf::from(".")];
    let roots = if paths.is_empty() { &default[..] } else { paths };

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.exists() {
            tracing::warn!("File not found: {}", root.display());
            continue;
        }

        for entry in WalkBuilder::new(root).build() {
            match entry {
                Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Run `task` over `files` in parallel, keeping input order. A file that fails
/// is logged and left out; it never stops the others.
fn process_files<T, F>(files: &[PathBuf], task: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Path) -> Result<Option<T>> + Sync,
{
    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}") {
        pb.set_style(style);
    }
    if files.len() < 2 {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let results = files
        .par_iter()
        .filter_map(|path| {
            let result = match task(path) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", path.display(), e);
                    None
                }
            };
            pb.inc(1);
            result
        })
        .collect();

    pb.finish_and_clear();
    results
}
