//! CLI Tooling
//!
//! Command-line interface over a workspace stored in a sled database. Every command
//! opens the workspace, runs, then flushes pending saves before returning.

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::save::SystemClock;
use crate::settings::{Language, ThemeMode};
use crate::store::persistence::SledStore;
use crate::tree::traversal::{find_by_path, node_path};
use crate::types::NodeId;
use crate::workspace::format::{
    format_children_table, format_delete_text, format_settings_text, format_status_text,
    format_sweep_text, format_tree_text,
};
use crate::workspace::{Workspace, WorkspaceOptions, WorkspaceStores};
use crate::writeback::{FsFileHandle, WriteBackOutcome};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Markdesk CLI - local Markdown workspace
#[derive(Parser)]
#[command(name = "markdesk")]
#[command(about = "Local-first Markdown workspace with a file tree and debounced saves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace data directory (overrides config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show workspace status and integrity
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the whole file tree
    Tree,
    /// List a folder's children
    Ls {
        /// Folder id or path (default: root)
        folder: Option<String>,
    },
    /// Create a Markdown file
    NewFile {
        name: String,
        /// Node to create next to (a folder, or a file whose folder is used)
        #[arg(long = "in")]
        parent: Option<String>,
    },
    /// Create a folder
    NewFolder {
        name: String,
        #[arg(long = "in")]
        parent: Option<String>,
    },
    /// Rename a file or folder
    Rename { node: String, name: String },
    /// Delete a file or folder with everything below it
    Rm {
        node: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Move a node into another folder
    Mv { node: String, dest: String },
    /// Make a file the open file and print it
    Open { node: String },
    /// Print a file's text (default: the open file)
    Cat { node: Option<String> },
    /// Replace a file's text from a path or stdin
    Write {
        node: String,
        /// Read the text from this file instead of stdin
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Import a Markdown/text file or a directory
    Import {
        path: PathBuf,
        /// Node to import next to
        #[arg(long = "in")]
        parent: Option<String>,
        /// Do not keep a link back to the source files
        #[arg(long)]
        no_link: bool,
    },
    /// Link a file to a path on disk and write it there
    Link { file: String, path: PathBuf },
    /// Remove content, disk links, and assets no file uses
    Gc,
    /// Print the effective configuration as TOML
    Config,
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show settings and shortcuts
    Show,
    /// Set the theme (light, dark, system)
    Theme { mode: String },
    /// Set the language (zh-CN, en)
    Language { language: String },
    /// Override a shortcut binding
    Shortcut {
        action: String,
        /// New binding; empty disables the action
        binding: Option<String>,
        /// Restore the default binding
        #[arg(long, conflicts_with = "binding")]
        reset: bool,
    },
}

/// CLI context owning the opened workspace
pub struct CliContext {
    workspace: Workspace,
    store: Arc<SledStore>,
    data_dir: PathBuf,
    config: AppConfig,
}

impl CliContext {
    /// Open the workspace database under `data_dir`.
    pub async fn open(data_dir: PathBuf, config: &AppConfig) -> Result<Self, ApiError> {
        let store = Arc::new(SledStore::open(&data_dir)?);
        let options = WorkspaceOptions {
            save: config.save.clone(),
            clock: Arc::new(SystemClock::new()),
        };
        let workspace = Workspace::open_with(WorkspaceStores::single(store.clone()), options).await?;
        debug!(data_dir = %data_dir.display(), origin = ?workspace.origin(), "Workspace opened");
        Ok(Self {
            workspace,
            store,
            data_dir,
            config: config.clone(),
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Execute a CLI command, then flush everything it left pending.
    pub async fn execute(&mut self, command: &Commands) -> Result<String, ApiError> {
        let result = self.execute_inner(command).await;
        let report = self.workspace.flush().await;
        if !report.failed.is_empty() {
            tracing::warn!(failed = report.failed.len(), "Some saves failed");
        }
        self.store.flush()?;
        result
    }

    async fn execute_inner(&mut self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Status { format } => self.handle_status(format).await,
            Commands::Tree => Ok(format_tree_text(
                self.workspace.tree(),
                self.workspace.current_file_id(),
            )),
            Commands::Ls { folder } => {
                let id = match folder {
                    Some(arg) => self.resolve_node(arg)?,
                    None => self.workspace.tree().root_id.clone(),
                };
                let children = self.workspace.tree().list_children(&id)?;
                Ok(format_children_table(&children))
            }
            Commands::NewFile { name, parent } => {
                let selected = self.resolve_optional(parent.as_deref())?;
                let id = self.workspace.new_file(selected.as_deref(), name).await?;
                Ok(format!("Created {} ({})\n", self.path_of(&id), id))
            }
            Commands::NewFolder { name, parent } => {
                let selected = self.resolve_optional(parent.as_deref())?;
                let id = self.workspace.new_folder(selected.as_deref(), name)?;
                Ok(format!("Created {} ({})\n", self.path_of(&id), id))
            }
            Commands::Rename { node, name } => {
                let id = self.resolve_node(node)?;
                self.workspace.rename(&id, name)?;
                Ok(format!("Renamed to {}\n", self.path_of(&id)))
            }
            Commands::Rm { node, yes } => self.handle_rm(node, *yes).await,
            Commands::Mv { node, dest } => {
                let id = self.resolve_node(node)?;
                let dest_id = self.resolve_node(dest)?;
                self.workspace.move_node(&id, &dest_id)?;
                Ok(format!("Moved to {}\n", self.path_of(&id)))
            }
            Commands::Open { node } => {
                let id = self.resolve_node(node)?;
                self.workspace.open_file(&id).await
            }
            Commands::Cat { node } => {
                let id = match node {
                    Some(arg) => self.resolve_node(arg)?,
                    None => self
                        .workspace
                        .current_file_id()
                        .map(str::to_string)
                        .ok_or_else(|| ApiError::InvalidArgument("no file is open".to_string()))?,
                };
                self.workspace.load_text(&id).await
            }
            Commands::Write { node, from } => self.handle_write(node, from.as_deref()).await,
            Commands::Import {
                path,
                parent,
                no_link,
            } => {
                let selected = self.resolve_optional(parent.as_deref())?;
                let summary = self
                    .workspace
                    .import_path(selected.as_deref(), path, !no_link)
                    .await?;
                let mut out = format!("Imported {} file(s)", summary.file_ids.len());
                if !summary.skipped.is_empty() {
                    out.push_str(&format!(", skipped {}", summary.skipped.len()));
                }
                out.push('\n');
                Ok(out)
            }
            Commands::Link { file, path } => self.handle_link(file, path).await,
            Commands::Gc => {
                let report = self.workspace.sweep_orphans().await?;
                Ok(format_sweep_text(&report))
            }
            Commands::Config => {
                let mut config = self.config.clone();
                config.storage.data_dir = Some(self.data_dir.clone());
                toml::to_string_pretty(&config).map_err(|e| {
                    ApiError::ConfigError(format!("Failed to serialize configuration: {}", e))
                })
            }
            Commands::Settings { command } => match command {
                Some(command) => self.handle_settings(command),
                None => self.handle_settings(&SettingsCommands::Show),
            },
        }
    }

    async fn handle_status(&self, format: &str) -> Result<String, ApiError> {
        let status = self
            .workspace
            .status(&self.data_dir.display().to_string())
            .await?;
        match format {
            "json" => serde_json::to_string_pretty(&status).map_err(|e| {
                ApiError::InvalidArgument(format!("Failed to serialize status: {}", e))
            }),
            "text" => Ok(format_status_text(&status)),
            other => Err(ApiError::InvalidArgument(format!(
                "Unknown format '{}' (text, json)",
                other
            ))),
        }
    }

    async fn handle_rm(&mut self, node: &str, yes: bool) -> Result<String, ApiError> {
        let id = self.resolve_node(node)?;
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete {} and everything below it?", self.path_of(&id)))
                .default(false)
                .interact()
                .map_err(|e| ApiError::InvalidArgument(format!("Confirmation failed: {}", e)))?;
            if !confirmed {
                return Ok("Cancelled\n".to_string());
            }
        }
        let outcome = self.workspace.delete(&id).await?;
        Ok(format_delete_text(&outcome))
    }

    async fn handle_write(&mut self, node: &str, from: Option<&Path>) -> Result<String, ApiError> {
        let id = self.resolve_node(node)?;
        let text = match from {
            Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                ApiError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
            })?,
            None => {
                use tokio::io::AsyncReadExt;
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .map_err(|e| ApiError::InvalidArgument(format!("cannot read stdin: {}", e)))?;
                text
            }
        };
        let bytes = text.len();
        self.workspace.edit(&id, text)?;
        let report = self.workspace.flush().await;
        if report.failed.iter().any(|failed| failed == &id) {
            return Err(ApiError::InvalidArgument(format!(
                "save of {} failed, see the log",
                self.path_of(&id)
            )));
        }
        info!(file_id = %id, bytes, "Wrote file");
        let mut out = format!("Saved {} ({} bytes)\n", self.path_of(&id), bytes);
        if let Some((_, outcome)) = report.written_back.iter().find(|(file, _)| file == &id) {
            out.push_str(&format!("Disk copy: {}\n", describe_outcome(*outcome)));
        }
        Ok(out)
    }

    async fn handle_link(&mut self, file: &str, path: &Path) -> Result<String, ApiError> {
        let id = self.resolve_node(file)?;
        let target = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| ApiError::InvalidArgument(format!("no working directory: {}", e)))?
                .join(path)
        };
        let handle = Arc::new(FsFileHandle::new(&target));
        let outcome = self.workspace.link_external_file(&id, handle).await?;
        Ok(format!(
            "{} -> {}: {}\n",
            self.path_of(&id),
            target.display(),
            describe_outcome(outcome)
        ))
    }

    fn handle_settings(&mut self, command: &SettingsCommands) -> Result<String, ApiError> {
        match command {
            SettingsCommands::Show => Ok(format_settings_text(self.workspace.settings())),
            SettingsCommands::Theme { mode } => {
                let mode: ThemeMode = mode.parse().map_err(ApiError::InvalidArgument)?;
                self.workspace.set_theme(mode);
                Ok(format!("Theme set to {:?}\n", mode))
            }
            SettingsCommands::Language { language } => {
                let language: Language = language.parse().map_err(ApiError::InvalidArgument)?;
                self.workspace.set_language(language);
                Ok(format!("Language set to {:?}\n", language))
            }
            SettingsCommands::Shortcut {
                action,
                binding,
                reset,
            } => {
                let binding = if *reset {
                    None
                } else {
                    Some(binding.as_deref().unwrap_or(""))
                };
                self.workspace.set_shortcut(action, binding)?;
                Ok(match binding {
                    None => format!("{} restored to default\n", action),
                    Some("") => format!("{} disabled\n", action),
                    Some(b) => format!("{} bound to {}\n", action, b),
                })
            }
        }
    }

    /// Resolve a node argument given as an id or a slash path from the root.
    fn resolve_node(&self, arg: &str) -> Result<NodeId, ApiError> {
        let tree = self.workspace.tree();
        if let Some(node) = tree.get(arg) {
            return Ok(node.id.clone());
        }
        find_by_path(tree, arg)
            .map(|node| node.id.clone())
            .ok_or_else(|| ApiError::InvalidArgument(format!("no such node: {}", arg)))
    }

    fn resolve_optional(&self, arg: Option<&str>) -> Result<Option<NodeId>, ApiError> {
        arg.map(|a| self.resolve_node(a)).transpose()
    }

    fn path_of(&self, id: &str) -> String {
        node_path(self.workspace.tree(), id).unwrap_or_else(|| id.to_string())
    }
}

fn describe_outcome(outcome: WriteBackOutcome) -> &'static str {
    match outcome {
        WriteBackOutcome::Written => "written",
        WriteBackOutcome::NoHandle => "not linked",
        WriteBackOutcome::Unsupported => "target is read-only",
        WriteBackOutcome::PermissionDenied => "permission denied",
        WriteBackOutcome::Failed => "write failed",
    }
}
