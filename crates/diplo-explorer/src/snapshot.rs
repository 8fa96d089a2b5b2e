//! JSON snapshots of the derived view
//!
//! One object per line, written after every recompute.

use std::io::Write;

use chrono::{DateTime, Utc};
use diplo_core::{DerivedView, FilterState, Language};
use serde::Serialize;

use crate::error::ExplorerResult;
use crate::state::{AppState, LoggedEvent, NearbySelection};

/// Borrowed view of the application state at one revision
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub revision: u64,
    pub generated_at: DateTime<Utc>,
    pub language: Language,
    pub total_events: usize,
    pub state: &'a FilterState,
    pub view: &'a DerivedView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearby: Option<&'a NearbySelection>,
    /// Latest event first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event: Option<&'a LoggedEvent>,
}

impl<'a> Snapshot<'a> {
    pub fn capture(app: &'a AppState) -> Self {
        Self {
            revision: app.revision(),
            generated_at: Utc::now(),
            language: app.language(),
            total_events: app.total_events(),
            state: app.state(),
            view: app.view(),
            nearby: app.nearby(),
            last_event: app.event_log().front(),
        }
    }
}

pub struct SnapshotWriter<W: Write> {
    out: W,
    pretty: bool,
    written: usize,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pretty: false,
            written: 0,
        }
    }

    /// Indented output; each snapshot then spans several lines
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, snapshot: &Snapshot<'_>) -> ExplorerResult<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, snapshot)?;
        } else {
            serde_json::to_writer(&mut self.out, snapshot)?;
        }
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Capture and write in one step
    pub fn publish(&mut self, app: &AppState) -> ExplorerResult<()> {
        self.write(&Snapshot::capture(app))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
