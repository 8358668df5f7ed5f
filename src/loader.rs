//! # Input Loader
//!
//! Acquires the raw text for a run, either pasted text or a file read to
//! completion with `tokio::fs`. The file read is the only suspension point
//! around the pipeline.
//!
//! Every load draws a ticket from a shared [`RunSequence`]. If another load
//! started while this one was reading, the completed read is stale and its
//! text is discarded: the newest submission wins.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{SiftError, SiftResult};

/// Where a run's text comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Text pasted or passed inline.
    Text(String),
    /// A file to read. `None` means no file was selected.
    File(Option<PathBuf>),
}

/// Monotonic run counter shared by every loader of one front end.
#[derive(Debug, Clone, Default)]
pub struct RunSequence {
    latest: Arc<AtomicU64>,
}

/// Identifies one submitted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket(u64);

impl RunSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, superseding every earlier ticket.
    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the newest run.
    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    /// Text for the newest run.
    Current(String),
    /// A newer run was submitted while this one was reading.
    Stale,
}

/// Loads input text, guarding against stale completions.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    sequence: RunSequence,
}

impl Loader {
    pub fn new(sequence: RunSequence) -> Self {
        Self { sequence }
    }

    pub fn sequence(&self) -> &RunSequence {
        &self.sequence
    }

    /// Acquire the text for `source`.
    ///
    /// Blank pasted text and a missing file selection fail with
    /// [`SiftError::EmptyInput`].
    pub async fn load(&self, source: InputSource) -> SiftResult<Loaded> {
        let ticket = self.sequence.begin();
        self.load_for(ticket, source).await
    }

    /// Acquire the text for a run whose ticket was drawn earlier.
    ///
    /// Staleness is checked before any failure is reported: a superseded
    /// run yields [`Loaded::Stale`] even if its read failed or came back
    /// blank.
    pub async fn load_for(&self, ticket: RunTicket, source: InputSource) -> SiftResult<Loaded> {
        let read: SiftResult<String> = match source {
            InputSource::Text(text) => Ok(text),
            InputSource::File(None) => Err(SiftError::EmptyInput("no file selected".to_string())),
            InputSource::File(Some(path)) => {
                log::debug!("Reading {}", path.display());
                tokio::fs::read_to_string(&path).await.map_err(SiftError::from)
            }
        };

        if !self.sequence.is_current(ticket) {
            log::warn!("Discarding stale input for run {}", ticket.0);
            return Ok(Loaded::Stale);
        }

        let text = read?;
        if text.trim().is_empty() {
            return Err(SiftError::EmptyInput("no log text provided".to_string()));
        }

        Ok(Loaded::Current(text))
    }
}
