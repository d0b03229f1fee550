//! Temporal state tracking for Retrace.
//!
//! Any mutable piece of simulation state can be made queryable not only at
//! the current instant but at any past instant within a bounded retention
//! horizon, the "world as it looked N seconds ago" that perception-delay
//! models need. Current reads stay O(1): live state is mutated directly,
//! and a per-object event log exists purely to answer past queries by
//! undoing later events newest-to-oldest.
//!
//! This crate provides:
//! - [`EventLog`] / [`TimedEvent`] - the event-log engine
//! - [`Historical`] / [`HistoricalValue`] / [`CurrentValue`] - scalar
//!   tracking, with and without history
//! - [`HistoricalCollection`] ([`HistoricalSet`], [`HistoricalOrdSet`],
//!   [`HistoricalList`]) - collection tracking via an undo log
//! - [`HistoricalParameters`] - key→value tracking with a defaults table
//! - [`HistoryManager`] - per-run registry, periodic pruning, teardown
//!
//! History is lossy by design: a single linear timeline with a bounded
//! retention window. Queries before the window silently degrade to the
//! oldest retained state; no history survives the run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collection;
pub mod event;
pub mod manager;
pub mod parameters;
pub mod value;

pub use collection::{
    HistoricalCollection, HistoricalList, HistoricalOrdSet, HistoricalSet, UndoableCollection,
};
pub use event::{EventLog, TimedEvent};
pub use manager::{HistoryManager, ManagerPhase, Prunable};
pub use parameters::HistoricalParameters;
pub use value::{CurrentValue, Historical, HistoricalValue};
