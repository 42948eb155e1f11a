//! File provider.
//!
//! Loads the dynamic configuration from a TOML file or from a directory of
//! TOML files, and optionally reloads it whenever the filesystem changes.
//!
//! # Design Decisions
//! - Each reload sends a full new snapshot; there is no diffing
//! - Filesystem events are coalesced through a ring channel, so a burst of
//!   writes from an editor triggers one rebuild, not one per event
//! - A single file is watched through its parent directory, which survives
//!   editors that replace the file instead of writing it in place
//! - A broken edit is logged and the previous snapshot stays in effect

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::FileProviderConfig;
use crate::config::Configuration;
use crate::lifecycle::Pool;
use crate::provider::ring::ring_channel;
use crate::provider::{send_configuration, Message, Provider, ProviderError};

const NAME: &str = "file";

/// Where the file provider reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    File(PathBuf),
    Directory(PathBuf),
}

impl Source {
    fn path(&self) -> &Path {
        match self {
            Source::File(path) | Source::Directory(path) => path,
        }
    }
}

/// Provider backed by local TOML files.
#[derive(Debug, Clone)]
pub struct FileProvider {
    config: FileProviderConfig,
}

impl FileProvider {
    pub fn new(config: FileProviderConfig) -> Self {
        Self { config }
    }

    fn source(&self) -> Result<Source, ProviderError> {
        match (&self.config.directory, &self.config.filename) {
            (Some(dir), _) => Ok(Source::Directory(dir.clone())),
            (None, Some(file)) => Ok(Source::File(file.clone())),
            (None, None) => Err(ProviderError::Config(
                "neither filename nor directory is defined".to_string(),
            )),
        }
    }

    /// Read the current snapshot from disk.
    pub fn build_configuration(&self) -> Result<Configuration, ProviderError> {
        match self.source()? {
            Source::File(path) => load_file(&path),
            Source::Directory(dir) => load_directory(&dir),
        }
    }

    /// Start reloading on filesystem changes. `last_sent` is the snapshot
    /// already delivered; a reload equal to it is not sent again.
    fn add_watcher(
        &self,
        out: &mpsc::Sender<Message>,
        pool: &Pool,
        mut last_sent: Configuration,
    ) -> Result<(), ProviderError> {
        let source = self.source()?;
        let (trigger_tx, mut trigger_rx) = ring_channel::<()>();
        // One rebuild up front catches edits made before the watch was in place.
        trigger_tx.write(());

        let target = match &source {
            Source::File(path) => path.file_name().map(|name| name.to_os_string()),
            Source::Directory(_) => None,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event, target.as_deref()) {
                        trigger_tx.write(());
                    }
                }
                Err(e) => tracing::error!(provider = NAME, error = %e, "Watch error"),
            },
            notify::Config::default(),
        )?;

        match &source {
            Source::File(path) => {
                let parent = match path.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p,
                    _ => Path::new("."),
                };
                watcher.watch(parent, RecursiveMode::NonRecursive)?;
            }
            Source::Directory(dir) => watcher.watch(dir, RecursiveMode::Recursive)?,
        }

        tracing::info!(provider = NAME, path = ?source.path(), "Watching configuration for changes");

        let provider = self.clone();
        let out = out.clone();
        pool.go_ctx(move |mut stop| async move {
            // Dropping the watcher stops the notifications.
            let _watcher = watcher;

            loop {
                tokio::select! {
                    _ = stop.stopped() => break,
                    trigger = trigger_rx.read() => {
                        if trigger.is_none() {
                            break;
                        }
                    }
                }

                let configuration = match provider.build_configuration() {
                    Ok(configuration) => configuration,
                    Err(e) => {
                        tracing::error!(
                            provider = NAME,
                            error = %e,
                            "Failed to reload configuration. Keeping current configuration."
                        );
                        continue;
                    }
                };

                if configuration == last_sent {
                    continue;
                }
                last_sent = configuration.clone();

                tracing::info!(provider = NAME, "Configuration change detected, reloaded");
                tokio::select! {
                    _ = stop.stopped() => break,
                    sent = send_configuration(&out, NAME, configuration) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!(provider = NAME, "File watcher stopped");
        });

        Ok(())
    }
}

#[async_trait]
impl Provider for FileProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self) -> Result<(), ProviderError> {
        let source = self.source()?;
        if self.config.directory.is_some() && self.config.filename.is_some() {
            tracing::warn!(provider = NAME, "Both filename and directory are set, using directory");
        }

        let exists = match &source {
            Source::File(path) => path.is_file(),
            Source::Directory(dir) => dir.is_dir(),
        };
        if !exists {
            return Err(ProviderError::Config(format!(
                "{} does not exist",
                source.path().display()
            )));
        }
        Ok(())
    }

    async fn provide(&self, out: mpsc::Sender<Message>, pool: Pool) -> Result<(), ProviderError> {
        let configuration = self.build_configuration()?;
        send_configuration(&out, NAME, configuration.clone()).await?;

        if self.config.watch {
            self.add_watcher(&out, &pool, configuration)?;
        }
        Ok(())
    }
}

fn is_relevant(event: &Event, target: Option<&std::ffi::OsStr>) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
        return false;
    }
    match target {
        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name)),
        None => true,
    }
}

fn load_file(path: &Path) -> Result<Configuration, ProviderError> {
    let content = fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|e| ProviderError::Parse {
        origin: path.display().to_string(),
        message: e.to_string(),
    })
}

fn load_directory(dir: &Path) -> Result<Configuration, ProviderError> {
    let mut files = Vec::new();
    collect_toml_files(dir, &mut files)?;
    files.sort();

    let mut configuration = Configuration::default();
    for file in files {
        let loaded = load_file(&file)?;
        for (kind, name) in configuration.merge(loaded) {
            tracing::warn!(
                provider = NAME,
                file = %file.display(),
                kind,
                name = %name,
                "Already configured, skipping"
            );
        }
    }
    Ok(configuration)
}

fn collect_toml_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ProviderError> {
    let io_err = |source| ProviderError::Io {
        path: dir.display().to_string(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_toml_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    Ok(())
}
