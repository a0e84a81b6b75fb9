//! verso CLI: command-line front end for the verso engine.
//!
//! Each invocation loads the repository from `.verso/state.json`, runs one
//! operation, and saves it back under an exclusive lock.

mod fsutil;
mod lock;
mod settings;
mod store;
mod workdir;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use verso_core::diff::{self, DiffAlgorithm, DiffLine, LcsDiff, PositionalDiff};
use verso_core::{Commit, Repository};

use crate::settings::Settings;
use crate::store::Store;

#[derive(Parser)]
#[command(name = "verso", about = "verso: versioned content engine", version)]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = Format::Human)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
    Brief,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    /// Line i of old against line i of new.
    Positional,
    /// Longest-common-subsequence alignment.
    Lcs,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a repository, or reset an existing one to an empty state.
    Init,

    /// Stage content for a single path.
    Stage {
        /// Repository path to stage under.
        path: String,

        /// Content to stage. Read from the file at `path` when omitted.
        #[arg(long)]
        content: Option<String>,
    },

    /// Stage files from the working directory (directories are walked).
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Commit everything staged onto the current branch.
    Commit {
        /// Commit message.
        #[arg(long, short)]
        message: String,

        /// Author identity (defaults to the configured author).
        #[arg(long, short)]
        author: Option<String>,
    },

    /// List, create or delete branches.
    Branch {
        #[command(subcommand)]
        action: Option<BranchCommands>,
    },

    /// Switch to another branch. Staged content is kept.
    Checkout { name: String },

    /// Show current branch, staged files, branches and commit count.
    Status,

    /// Show commit history.
    Log {
        /// Branch to show (defaults to the current branch).
        #[arg(long, conflicts_with = "all")]
        branch: Option<String>,

        /// Show every commit in the repository.
        #[arg(long)]
        all: bool,

        /// Maximum number of commits to show.
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Inspect a specific commit.
    Show {
        /// Commit id (supports unique prefix).
        id: String,

        /// Include the diff introduced by this commit.
        #[arg(long)]
        diff: bool,
    },

    /// Line diff of two files, or of a staged path against its last commit.
    Diff {
        /// Old file.
        #[arg(required_unless_present = "staged")]
        old: Option<PathBuf>,

        /// New file.
        #[arg(required_unless_present = "staged")]
        new: Option<PathBuf>,

        /// Diff this staged path against the current branch.
        #[arg(long, conflicts_with_all = ["old", "new"])]
        staged: Option<String>,

        #[arg(long, value_enum, default_value_t = Algorithm::Positional)]
        algorithm: Algorithm,
    },

    /// Net change in non-blank line count between two files.
    Stats { old: PathBuf, new: PathBuf },
}

#[derive(Subcommand)]
enum BranchCommands {
    /// List branches (default).
    List,
    /// Create a branch from the current branch.
    Create { name: String },
    /// Delete a branch other than the current one.
    Delete { name: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("error: cannot determine current directory: {e}");
        process::exit(1);
    });

    let format = cli.format;
    let result =
        Settings::load(&cwd).and_then(|settings| run(cli.command, &cwd, &settings, format));

    if let Err(e) = result {
        if format == Format::Json {
            println!("{}", json!({ "success": false, "message": format!("{e:#}") }));
        } else {
            eprintln!("error: {e:#}");
        }
        process::exit(1);
    }
}

/// Log to stderr, filtered by `VERSO_LOG` (or `RUST_LOG`), default `error`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("VERSO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands, cwd: &Path, settings: &Settings, format: Format) -> Result<()> {
    match command {
        Commands::Init => cmd_init(cwd, settings, format),
        Commands::Stage { path, content } => cmd_stage(cwd, settings, &path, content, format),
        Commands::Add { paths } => cmd_add(cwd, settings, &paths, format),
        Commands::Commit { message, author } => {
            let author = author.unwrap_or_else(|| settings.author.clone());
            cmd_commit(cwd, settings, &message, &author, format)
        }
        Commands::Branch { action } => match action.unwrap_or(BranchCommands::List) {
            BranchCommands::List => cmd_branch_list(cwd, settings, format),
            BranchCommands::Create { name } => cmd_branch_create(cwd, settings, &name, format),
            BranchCommands::Delete { name } => cmd_branch_delete(cwd, settings, &name, format),
        },
        Commands::Checkout { name } => cmd_checkout(cwd, settings, &name, format),
        Commands::Status => cmd_status(cwd, settings, format),
        Commands::Log { branch, all, limit } => cmd_log(cwd, settings, branch, all, limit, format),
        Commands::Show { id, diff } => cmd_show(cwd, settings, &id, diff, format),
        Commands::Diff {
            old,
            new,
            staged,
            algorithm,
        } => match staged {
            Some(path) => cmd_diff_staged(cwd, settings, &path, algorithm, format),
            None => match (old, new) {
                (Some(old), Some(new)) => cmd_diff_files(cwd, &old, &new, algorithm, format),
                _ => bail!("must provide both OLD and NEW files, or --staged PATH"),
            },
        },
        Commands::Stats { old, new } => cmd_stats(cwd, &old, &new, format),
    }
}

/// Print a success message, with extra JSON fields in json mode.
fn report(format: Format, message: &str, extra: serde_json::Value) -> Result<()> {
    match format {
        Format::Json => {
            let mut body = json!({ "success": true, "message": message });
            if let (Some(obj), serde_json::Value::Object(more)) = (body.as_object_mut(), extra) {
                obj.extend(more);
            }
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Format::Human | Format::Brief => println!("{message}"),
    }
    Ok(())
}

fn read_text(cwd: &Path, path: &Path) -> Result<String> {
    let full = cwd.join(path);
    fs::read_to_string(&full).with_context(|| format!("cannot read {}", full.display()))
}

fn cmd_init(cwd: &Path, settings: &Settings, format: Format) -> Result<()> {
    let store = Store::create(cwd, settings)?;
    let repo = match store.load() {
        Ok(Some(mut repo)) => {
            repo.initialize();
            repo
        }
        Ok(None) => Repository::with_config(settings.engine.clone()),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "discarding unreadable state");
            Repository::with_config(settings.engine.clone())
        }
    };
    store.save(&repo)?;
    report(
        format,
        "Repository initialized",
        json!({ "current_branch": repo.current_branch() }),
    )
}

fn cmd_stage(
    cwd: &Path,
    settings: &Settings,
    path: &str,
    content: Option<String>,
    format: Format,
) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let mut repo = store.load_existing()?;
    let content = match content {
        Some(c) => c,
        None => read_text(cwd, Path::new(path))?,
    };
    let outcome = repo.stage(path, content);
    store.save(&repo)?;
    report(format, &outcome.to_string(), json!({ "staged": outcome.staged }))
}

fn cmd_add(cwd: &Path, settings: &Settings, paths: &[PathBuf], format: Format) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let mut repo = store.load_existing()?;
    let collected = workdir::collect(cwd, paths, &settings.state_dir)?;

    for skipped in &collected.skipped_binary {
        tracing::warn!(path = %skipped, "skipping binary file");
        if format != Format::Json {
            eprintln!("warning: skipping binary file {skipped}");
        }
    }

    let mut added = Vec::with_capacity(collected.files.len());
    for (path, content) in collected.files {
        let outcome = repo.stage(&path, content);
        if format == Format::Human {
            println!("{outcome}");
        }
        added.push(path);
    }
    store.save(&repo)?;

    let message = format!("{} file(s) staged", added.len());
    match format {
        Format::Human => {
            if added.is_empty() {
                println!("nothing staged");
            }
            Ok(())
        }
        _ => report(
            format,
            &message,
            json!({ "added": added, "skipped_binary": collected.skipped_binary }),
        ),
    }
}

fn cmd_commit(
    cwd: &Path,
    settings: &Settings,
    message: &str,
    author: &str,
    format: Format,
) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let mut repo = store.load_existing()?;
    let commit = repo.commit(message, author)?;
    store.save(&repo)?;

    let short = commit.short_id(repo.config().short_id_len);
    let created = format!("Commit {short} created");
    match format {
        Format::Json => report(format, &created, json!({ "commit": commit })),
        Format::Brief => {
            println!("{short} {}", commit.message);
            Ok(())
        }
        Format::Human => {
            println!("{created}");
            println!("  branch:  {}", commit.branch);
            println!("  author:  {}", commit.author);
            println!("  files:   {}", commit.files.len());
            for path in commit.paths() {
                println!("    {path}");
            }
            Ok(())
        }
    }
}

fn cmd_branch_list(cwd: &Path, settings: &Settings, format: Format) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let repo = store.load_existing()?;
    let current = repo.current_branch();
    let short_len = repo.config().short_id_len;
    let tip = |name: &str| {
        repo.branch(name)
            .and_then(|b| b.tip())
            .map(|id| id.short(short_len).to_string())
    };

    match format {
        Format::Json => {
            let branches: Vec<_> = repo
                .branch_names()
                .into_iter()
                .map(|name| {
                    let commits = repo.branch(&name).map_or(0, |b| b.commits.len());
                    json!({
                        "name": name,
                        "current": name == current,
                        "commits": commits,
                        "tip": tip(&name),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&branches)?);
        }
        Format::Brief => println!("{}", repo.branch_names().join(" ")),
        Format::Human => {
            for name in repo.branch_names() {
                let marker = if name == current { "*" } else { " " };
                match tip(&name) {
                    Some(id) => println!("{marker} {name} {id}"),
                    None => println!("{marker} {name}"),
                }
            }
        }
    }
    Ok(())
}

fn cmd_branch_create(cwd: &Path, settings: &Settings, name: &str, format: Format) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let mut repo = store.load_existing()?;
    let branches = repo.create_branch(name)?;
    store.save(&repo)?;
    report(
        format,
        &format!("Branch '{name}' created"),
        json!({ "branches": branches }),
    )
}

fn cmd_branch_delete(cwd: &Path, settings: &Settings, name: &str, format: Format) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let mut repo = store.load_existing()?;
    let removed = repo.delete_branch(name)?;
    store.save(&repo)?;
    report(
        format,
        &format!("Branch '{name}' deleted"),
        json!({ "removed": removed, "branches": repo.branch_names() }),
    )
}

fn cmd_checkout(cwd: &Path, settings: &Settings, name: &str, format: Format) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let mut repo = store.load_existing()?;
    repo.checkout(name)?;
    store.save(&repo)?;
    report(
        format,
        &format!("Switched to '{name}'"),
        json!({ "current_branch": repo.current_branch() }),
    )
}

fn cmd_status(cwd: &Path, settings: &Settings, format: Format) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let repo = store.load_existing()?;
    let status = repo.status();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        Format::Brief => println!("{}", status.brief()),
        Format::Human => {
            println!("on branch {}", status.current_branch);
            if status.is_clean() {
                println!("nothing staged");
            } else {
                println!("{} staged file(s):", status.staged_paths.len());
                for path in &status.staged_paths {
                    println!("  {path}");
                }
            }
            println!("branches: {}", status.branch_names.join(", "));
            println!("commits:  {}", status.commit_count);
        }
    }
    Ok(())
}

fn cmd_log(
    cwd: &Path,
    settings: &Settings,
    branch: Option<String>,
    all: bool,
    limit: Option<usize>,
    format: Format,
) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let repo = store.load_existing()?;
    let short_len = repo.config().short_id_len;

    let mut commits: Vec<&Commit> = if all {
        repo.log()
    } else {
        let name = branch.as_deref().unwrap_or_else(|| repo.current_branch());
        repo.branch_log(name)?
    };
    if let Some(n) = limit {
        commits.truncate(n);
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&commits)?),
        Format::Brief => {
            for c in &commits {
                println!("{} {} {}", c.short_id(short_len), c.author, c.message);
            }
        }
        Format::Human => {
            if commits.is_empty() {
                println!("no commits yet");
                return Ok(());
            }
            for (i, c) in commits.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("commit {}", c.short_id(short_len));
                println!("  author:  {}", c.author);
                println!("  time:    {}", c.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("  branch:  {}", c.branch);
                println!("  message: {}", c.message);
                println!("  files:   {}", c.files.len());
            }
        }
    }
    Ok(())
}

fn cmd_show(
    cwd: &Path,
    settings: &Settings,
    id: &str,
    show_diff: bool,
    format: Format,
) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let repo = store.load_existing()?;
    let commit = repo.resolve_commit(id)?;
    let diffs = if show_diff {
        Some(repo.diff_commit(commit.id.as_str())?)
    } else {
        None
    };

    match format {
        Format::Json => {
            let body = match &diffs {
                Some(d) => json!({ "commit": commit, "diff": d }),
                None => json!({ "commit": commit }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Format::Brief => {
            println!(
                "{} {} {} files:{}",
                commit.short_id(repo.config().short_id_len),
                commit.author,
                commit.message,
                commit.files.len()
            );
        }
        Format::Human => {
            println!("commit {}", commit.id);
            println!("  author:  {}", commit.author);
            println!("  time:    {}", commit.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  branch:  {}", commit.branch);
            println!("  message: {}", commit.message);
            println!("  files:");
            for path in commit.paths() {
                println!("    {path}");
            }
            for file_diff in diffs.iter().flatten() {
                println!();
                println!("--- a/{}", file_diff.path);
                println!("+++ b/{}", file_diff.path);
                print!("{}", diff::render(&file_diff.lines));
            }
        }
    }
    Ok(())
}

fn cmd_diff_staged(
    cwd: &Path,
    settings: &Settings,
    path: &str,
    algorithm: Algorithm,
    format: Format,
) -> Result<()> {
    let store = Store::open(cwd, settings)?;
    let repo = store.load_existing()?;
    let Some(staged) = repo.staged(path) else {
        bail!("{path} is not staged");
    };
    let old = repo.committed_content(path).unwrap_or("");

    let lines = match algorithm {
        Algorithm::Positional => repo.diff_staged(path).unwrap_or_default(),
        Algorithm::Lcs => LcsDiff.diff(old, &staged.content),
    };
    let stats = diff::file_stats(old, &staged.content);
    print_diff(path, path, &lines, stats, format)
}

fn cmd_diff_files(
    cwd: &Path,
    old_path: &Path,
    new_path: &Path,
    algorithm: Algorithm,
    format: Format,
) -> Result<()> {
    let old = read_text(cwd, old_path)?;
    let new = read_text(cwd, new_path)?;
    let lines = match algorithm {
        Algorithm::Positional => PositionalDiff.diff(&old, &new),
        Algorithm::Lcs => LcsDiff.diff(&old, &new),
    };
    let stats = diff::file_stats(&old, &new);
    print_diff(
        &old_path.display().to_string(),
        &new_path.display().to_string(),
        &lines,
        stats,
        format,
    )
}

fn print_diff(
    old_label: &str,
    new_label: &str,
    lines: &[DiffLine],
    stats: diff::FileStats,
    format: Format,
) -> Result<()> {
    match format {
        Format::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "lines": lines, "stats": stats }))?
            );
        }
        Format::Brief => println!("+{} -{}", stats.additions, stats.deletions),
        Format::Human => {
            println!("--- a/{old_label}");
            println!("+++ b/{new_label}");
            print!("{}", diff::render(lines));
        }
    }
    Ok(())
}

fn cmd_stats(cwd: &Path, old_path: &Path, new_path: &Path, format: Format) -> Result<()> {
    let old = read_text(cwd, old_path)?;
    let new = read_text(cwd, new_path)?;
    let stats = diff::file_stats(&old, &new);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        Format::Brief => println!("+{} -{}", stats.additions, stats.deletions),
        Format::Human => {
            println!("additions: {}", stats.additions);
            println!("deletions: {}", stats.deletions);
        }
    }
    Ok(())
}
