//! Change classification
//!
//! Decides, for one item, whether it is NEW, UPDATED or UNCHANGED relative
//! to the history store. The classifier only reads history: the caller
//! commits the returned fingerprint once the announcement has gone out.
//!
//! ```text
//!           lookup absent
//!   (start) ─────────────► NEW ──notify ok──► seen(H)
//!                                                │
//!            hash != H ◄─────────────────────────┤
//!               │                                │ hash == H
//!            UPDATED ──notify ok──► seen(H')   UNCHANGED (no I/O)
//! ```

use crate::error::Result;
use crate::fingerprint::{Fingerprint, fingerprint};
use crate::traits::{HistoryRecord, HistoryStore, Item};

/// Outcome of classifying one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// No record for this link
    New,
    /// Record exists with a different fingerprint
    Updated,
    /// Record exists with the same fingerprint
    Unchanged,
}

impl Decision {
    /// Whether this outcome calls for an announcement
    pub fn needs_notify(&self) -> bool {
        !matches!(self, Decision::Unchanged)
    }

    /// Lowercase label for logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::New => "new",
            Decision::Updated => "updated",
            Decision::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision plus what the caller needs to commit it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The outcome
    pub decision: Decision,
    /// Fingerprint of the item body as fetched now
    pub fingerprint: Fingerprint,
    /// The stored record, if any
    pub previous: Option<HistoryRecord>,
}

/// Compare an item against a known record (or its absence)
///
/// Pure: no I/O, usable without a store.
pub fn decide(current: &Fingerprint, previous: Option<&HistoryRecord>) -> Decision {
    match previous {
        None => Decision::New,
        Some(record) if !record.matches(current) => Decision::Updated,
        Some(_) => Decision::Unchanged,
    }
}

/// Classify one item against the history store
///
/// # Returns
///
/// - `Ok(Classification)`: The decision and the fingerprint to commit
/// - `Err(Error)`: The lookup failed (`Error::StorageIo`); the caller skips
///   the item for this cycle
pub async fn classify(item: &Item, store: &dyn HistoryStore) -> Result<Classification> {
    let current = fingerprint(&item.body);
    let previous = store.lookup(&item.link).await?;
    let decision = decide(&current, previous.as_ref());

    Ok(Classification {
        decision,
        fingerprint: current,
        previous,
    })
}
