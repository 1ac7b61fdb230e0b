// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reload configuration.
//!
//! This module watches a session file (or a directory of them) and reloads
//! it on change, so tempo, direction and grid settings can be edited while
//! auto mode keeps playing.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::SessionFile;

/// Events emitted by the config watcher
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// Session file was modified, parsed and validated
    Reloaded(Box<SessionFile>),
    /// Session file was modified but could not be used
    Error(String),
    /// A session file was removed
    FileDeleted(PathBuf),
}

fn is_session_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml" || ext == "toml")
}

/// Spellings of a watched file as it may appear in notify events
fn file_aliases(watched: &Path) -> Vec<PathBuf> {
    if !watched.is_file() {
        return Vec::new();
    }
    let mut aliases = vec![watched.to_path_buf()];
    if let Ok(canonical) = watched.canonicalize() {
        if canonical != watched {
            aliases.push(canonical);
        }
    }
    aliases
}

/// A watched file is reloaded whatever its extension
fn should_reload(path: &Path, aliases: &[PathBuf]) -> bool {
    is_session_file(path) || aliases.iter().any(|alias| alias == path)
}

/// Session file watcher with debouncing and validation
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<ConfigEvent>,
    watched_path: PathBuf,
}

impl ConfigWatcher {
    /// Create a new config watcher for the specified path
    ///
    /// # Arguments
    /// * `path` - Session file or directory to watch
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 500)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(500));

        let (event_tx, event_rx): (Sender<ConfigEvent>, Receiver<ConfigEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        let mode = if watched_path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        watcher
            .watch(&watched_path, mode)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", watched_path, e))?;

        let aliases = file_aliases(&watched_path);

        // Debounce thread
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;
            let mut pending_paths: Vec<PathBuf> = Vec::new();

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => match event.kind {
                        EventKind::Remove(_) => {
                            for path in event.paths.into_iter().filter(|p| should_reload(p, &aliases)) {
                                let _ = event_tx.send(ConfigEvent::FileDeleted(path));
                            }
                        }
                        EventKind::Create(_) | EventKind::Modify(_) => {
                            for path in event.paths {
                                if should_reload(&path, &aliases) && !pending_paths.contains(&path) {
                                    pending_paths.push(path);
                                }
                            }
                            last_event_time = Some(Instant::now());
                        }
                        _ => {}
                    },
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let settled = last_event_time
                            .is_some_and(|last| last.elapsed() >= debounce_duration);
                        if settled {
                            for path in pending_paths.drain(..) {
                                let event = match validate_config(&path) {
                                    Ok(config) => ConfigEvent::Reloaded(Box::new(config)),
                                    Err(e) => ConfigEvent::Error(format!("{:#}", e)),
                                };
                                let _ = event_tx.send(event);
                            }
                            last_event_time = None;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // Watcher was dropped, exit thread
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next config event (non-blocking)
    pub fn try_recv(&self) -> Option<ConfigEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending config events
    pub fn recv_all(&self) -> Vec<ConfigEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

/// Load a session file and reject it if any value is out of range
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<SessionFile> {
    let path = path.as_ref();
    let config = SessionFile::load(path)?;
    let problems = config.validate();
    if problems.is_empty() {
        Ok(config)
    } else {
        Err(anyhow!(
            "Invalid session file {:?}:\n  {}",
            path,
            problems.join("\n  ")
        ))
    }
}
