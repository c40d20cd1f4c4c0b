//! Core type definitions for the CDK exchange flow.
//!
//! This crate defines the fundamental, product-agnostic types used by the
//! redemption core:
//! - Record identifiers (UUID v7)
//! - The normalized redemption `Code` value type
//! - Wire data model returned by the remote gateway (`CodeInfo`, `Identity`)
//! - Redemption outcomes and the append-only `HistoryRecord`
//!
//! All product-specific behavior (acceptance rules, detail formatting)
//! belongs in the flow crate's policies, not here.

mod code;
mod ids;
mod identity;
mod outcome;

pub use code::{normalize, Code};
pub use identity::{CodeInfo, Identity};
pub use ids::RecordId;
pub use outcome::{HistoryRecord, RedemptionOutcome, TaskHandle, TaskStatus};
