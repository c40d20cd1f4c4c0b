//! Validation and redemption state machine for the CDK exchange.
//!
//! A user redeems a code (CDK) against a product-specific identity token.
//! This crate guarantees that a code is validated exactly once before
//! submission and that validation state is invalidated precisely when its
//! underlying input changes.
//!
//! # Components
//!
//! - **Gateway**: the three remote operations (verify code, verify
//!   identity, submit redemption) behind an object-safe trait
//! - **Policy**: per-product acceptance rules and detail formatting,
//!   selected by the [`Product`] enum key
//! - **Flow**: the [`ValidationFlow`] state machine that orchestrates
//!   validation, redemption, and task polling
//! - **Notify / History**: presentation-agnostic seams the UI plugs into
//!
//! # Example
//!
//! ```no_run
//! use cdk_flow::{
//!     FlowConfig, GatewayConfig, HttpGateway, MemoryLedger, NullSink, Product,
//!     ValidationFlow,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let gateway = Arc::new(HttpGateway::new(GatewayConfig::default()));
//! let flow = ValidationFlow::new(
//!     Product::Discord,
//!     gateway,
//!     Arc::new(NullSink),
//!     MemoryLedger::new(),
//!     FlowConfig::default(),
//! );
//!
//! flow.set_code_input("abc-123").await;
//! flow.set_token_input("user-token").await;
//! if flow.validate_identity(false).await {
//!     flow.redeem().await;
//! }
//! # }
//! ```

mod error;
mod flow;
pub mod gateway;
mod history;
mod http;
mod notify;
mod policy;

pub use error::{FlowError, FlowResult, GatewayError, GatewayResult};
pub use flow::{FieldPhase, FlowConfig, ValidationFlow, TEST_INPUT_SENTINEL};
pub use gateway::RemoteGateway;
pub use history::{HistoryLedger, MemoryLedger};
pub use http::{GatewayConfig, HttpGateway};
pub use notify::{MemorySink, Notification, NotificationKind, NotificationSink, NullSink};
pub use policy::{Language, PolicyDecision, Product, ProductPolicy};
