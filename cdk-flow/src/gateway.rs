//! Remote gateway abstraction.
//!
//! Defines the trait for the three backend operations the flow consumes
//! (verify code, verify identity, submit redemption) plus task polling,
//! allowing the flow to work against any transport.

use crate::error::GatewayResult;
use async_trait::async_trait;
use cdk_types::{CodeInfo, Identity, RedemptionOutcome, TaskHandle, TaskStatus};

/// The three remote operations the flow consumes, as black-box async calls.
///
/// Implementations are stateless from the flow's perspective: the flow owns
/// all validation state and only reads results from here.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Verifies a redemption code for the given product context.
    async fn verify_code(&self, code: &str, context: &str) -> GatewayResult<CodeInfo>;

    /// Verifies a credential against the product backend. The already
    /// validated code is sent along so the server can cross-check.
    async fn verify_identity(
        &self,
        token: &str,
        code: &str,
        context: &str,
    ) -> GatewayResult<Identity>;

    /// Submits a redemption. The server either completes it synchronously,
    /// rejects it, or hands back a task to poll.
    async fn submit_redeem(&self, code: &str, token: &str) -> GatewayResult<RedemptionOutcome>;

    /// Polls an asynchronous redemption task once.
    async fn poll_task(&self, handle: &TaskHandle) -> GatewayResult<TaskStatus>;
}

/// A scriptable mock gateway for testing.
pub mod mock {
    use super::*;
    use crate::error::GatewayError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Call counters, for asserting how many network calls a flow issued.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct CallCounts {
        pub verify_code: usize,
        pub verify_identity: usize,
        pub submit_redeem: usize,
        pub poll_task: usize,
    }

    /// A gateway that replays queued responses and counts calls.
    ///
    /// Each operation pops from its own queue; an empty queue yields a
    /// protocol error so a test that under-scripts fails loudly.
    #[derive(Default)]
    pub struct MockGateway {
        verify_code: Mutex<VecDeque<GatewayResult<CodeInfo>>>,
        verify_identity: Mutex<VecDeque<GatewayResult<Identity>>>,
        submit_redeem: Mutex<VecDeque<GatewayResult<RedemptionOutcome>>>,
        poll_task: Mutex<VecDeque<GatewayResult<TaskStatus>>>,
        counts: Mutex<CallCounts>,
        /// Arguments seen by verify_code / verify_identity, in call order.
        seen_codes: Mutex<Vec<String>>,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl MockGateway {
        /// Creates an empty mock; script it with the `queue_*` methods.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn queue_verify_code(&self, result: GatewayResult<CodeInfo>) {
            self.verify_code.lock().unwrap().push_back(result);
        }

        pub fn queue_verify_identity(&self, result: GatewayResult<Identity>) {
            self.verify_identity.lock().unwrap().push_back(result);
        }

        pub fn queue_submit_redeem(&self, result: GatewayResult<RedemptionOutcome>) {
            self.submit_redeem.lock().unwrap().push_back(result);
        }

        pub fn queue_poll_task(&self, result: GatewayResult<TaskStatus>) {
            self.poll_task.lock().unwrap().push_back(result);
        }

        /// Snapshot of the call counters.
        pub fn counts(&self) -> CallCounts {
            *self.counts.lock().unwrap()
        }

        /// Codes passed to `verify_code`, in call order.
        pub fn seen_codes(&self) -> Vec<String> {
            self.seen_codes.lock().unwrap().clone()
        }

        /// Tokens passed to `verify_identity`, in call order.
        pub fn seen_tokens(&self) -> Vec<String> {
            self.seen_tokens.lock().unwrap().clone()
        }

        fn pop<T>(queue: &Mutex<VecDeque<GatewayResult<T>>>, op: &str) -> GatewayResult<T> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Protocol(format!("unscripted {op} call"))))
        }
    }

    #[async_trait]
    impl RemoteGateway for MockGateway {
        async fn verify_code(&self, code: &str, _context: &str) -> GatewayResult<CodeInfo> {
            self.counts.lock().unwrap().verify_code += 1;
            self.seen_codes.lock().unwrap().push(code.to_string());
            Self::pop(&self.verify_code, "verify_code")
        }

        async fn verify_identity(
            &self,
            token: &str,
            _code: &str,
            _context: &str,
        ) -> GatewayResult<Identity> {
            self.counts.lock().unwrap().verify_identity += 1;
            self.seen_tokens.lock().unwrap().push(token.to_string());
            Self::pop(&self.verify_identity, "verify_identity")
        }

        async fn submit_redeem(
            &self,
            _code: &str,
            _token: &str,
        ) -> GatewayResult<RedemptionOutcome> {
            self.counts.lock().unwrap().submit_redeem += 1;
            Self::pop(&self.submit_redeem, "submit_redeem")
        }

        async fn poll_task(&self, _handle: &TaskHandle) -> GatewayResult<TaskStatus> {
            self.counts.lock().unwrap().poll_task += 1;
            Self::pop(&self.poll_task, "poll_task")
        }
    }
}
