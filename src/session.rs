//! # Visit Session
//!
//! Caller-side state for hosts that re-run detection whenever the user loads
//! a new export or edits the parameters.
//!
//! The core functions are stateless; the session only remembers the last
//! loaded segments and the last raw parameters so they can be fed back in.
//! Every recomputation gets a [`RunTicket`]. A finished run is published only
//! if its ticket is the newest one issued and the export and parameters have
//! not changed since it was requested. A slow, superseded run can never
//! overwrite the result of a later one.

use std::sync::Arc;

use chrono::{Local, TimeZone};

use crate::error::Result;
use crate::grouping::find_visits_in;
use crate::timeline::TimelineSegment;
use crate::{QueryInput, VisitConfig, VisitReport};

/// Identifies one recomputation. Later runs have larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTicket(u64);

/// Everything needed to execute one run, detached from the session.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub ticket: RunTicket,
    pub segments: Arc<[TimelineSegment]>,
    pub query: QueryInput,
}

impl RunRequest {
    /// Execute with dates attributed in the system's local time zone.
    pub fn execute(&self) -> Result<VisitReport> {
        self.execute_in(&Local)
    }

    /// Execute with dates attributed in `tz`.
    ///
    /// Parameters are resolved first; a resolution failure means no segment
    /// is matched.
    pub fn execute_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<VisitReport> {
        let config = VisitConfig::resolve(&self.query)?;
        Ok(find_visits_in(&self.segments, &config, tz))
    }
}

/// Last input and parameters, plus the most recent published outcome.
#[derive(Debug, Default)]
pub struct VisitSession {
    segments: Option<Arc<[TimelineSegment]>>,
    query: QueryInput,
    issued: u64,
    published: Option<(RunTicket, Result<VisitReport>)>,
}

impl VisitSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from saved parameters.
    pub fn with_query(query: QueryInput) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Replace the loaded export. Runs requested before this are stale.
    pub fn load(&mut self, segments: Vec<TimelineSegment>) {
        log::debug!("Session loaded {} segments", segments.len());
        self.segments = Some(segments.into());
        self.invalidate();
    }

    /// Replace the parameters used by the next run. Runs requested before
    /// this are stale.
    pub fn set_query(&mut self, query: QueryInput) {
        self.query = query;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.issued += 1;
    }

    pub fn query(&self) -> &QueryInput {
        &self.query
    }

    pub fn is_loaded(&self) -> bool {
        self.segments.is_some()
    }

    /// Issue a ticket for a new run. `None` until an export is loaded.
    pub fn request(&mut self) -> Option<RunRequest> {
        let segments = self.segments.clone()?;
        self.issued += 1;
        Some(RunRequest {
            ticket: RunTicket(self.issued),
            segments,
            query: self.query.clone(),
        })
    }

    /// Offer a finished run's outcome.
    ///
    /// Returns `true` if it was published, `false` if a newer run had
    /// already been requested or the input changed after this one was.
    pub fn complete(&mut self, ticket: RunTicket, outcome: Result<VisitReport>) -> bool {
        if ticket.0 != self.issued {
            log::debug!(
                "Discarding outcome of run {} (current generation {})",
                ticket.0,
                self.issued
            );
            return false;
        }
        self.published = Some((ticket, outcome));
        true
    }

    /// Outcome of the newest completed run, if any.
    pub fn published(&self) -> Option<&Result<VisitReport>> {
        self.published.as_ref().map(|(_, outcome)| outcome)
    }

    /// Request, execute and publish a run synchronously in the local zone.
    pub fn refresh(&mut self) -> Option<&Result<VisitReport>> {
        self.refresh_in(&Local)
    }

    /// Request, execute and publish a run synchronously in `tz`.
    pub fn refresh_in<Tz: TimeZone>(&mut self, tz: &Tz) -> Option<&Result<VisitReport>> {
        let request = self.request()?;
        let outcome = request.execute_in(tz);
        self.complete(request.ticket, outcome);
        self.published()
    }
}
