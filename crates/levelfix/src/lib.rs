//! Repair engine for job-description XML exports whose `<PositionLevel>`
//! tag is missing or truncated while the authoritative value sits, quoted,
//! inside the sibling `<Description>` text.
//!
//! The crate is split the same way the data flows: [`repair`] holds the
//! pure per-document engine (parse, extract, repair, serialize), [`batch`]
//! runs many documents with per-file error isolation, and [`report`]
//! renders the batch outcome as CSV for the export surfaces.

pub mod batch;
pub mod config;
pub mod error;
pub mod repair;
pub mod report;
pub mod telemetry;
