//! The validation/redemption state machine.
//!
//! `ValidationFlow` owns the raw inputs and the two cached validated
//! values (code, identity). Each field moves `Idle → Loading → {Valid,
//! Invalid}` and drops back to `Idle` when its underlying input changes.
//! Code is upstream of identity: editing the code invalidates the cached
//! identity, editing the token invalidates the identity only.
//!
//! Lifecycle: one flow per mounted screen. Create it with explicit
//! collaborators, call `cancel()` on unmount to stop any pending poll loop,
//! then drop it.

use crate::error::{FlowError, FlowResult};
use crate::gateway::RemoteGateway;
use crate::history::HistoryLedger;
use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::policy::{Language, PolicyDecision, Product};
use cdk_types::{
    normalize, CodeInfo, HistoryRecord, Identity, RedemptionOutcome, TaskHandle, TaskStatus,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Sentinel for manual testing: when either raw input contains this
/// marker, a successful redemption keeps the inputs instead of clearing
/// them, so the same data can be resubmitted without retyping.
pub const TEST_INPUT_SENTINEL: &str = "@TEST";

/// Configuration for the flow.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Display language for policy detail lines.
    pub language: Language,
    /// Interval between task polls.
    pub poll_interval: Duration,
    /// Hard deadline for the poll loop.
    pub poll_timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            language: Language::En,
            poll_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(60),
        }
    }
}

/// Validation state of a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldPhase {
    /// Not validated yet, or input changed since the last validation.
    #[default]
    Idle,
    /// A validation call is in flight.
    Loading,
    /// The cached value matches the current input and passed validation.
    Valid,
    /// Validation failed; carries the reason key or server message.
    Invalid(String),
}

#[derive(Debug, Clone)]
struct ValidCode {
    normalized: String,
    info: CodeInfo,
}

#[derive(Debug, Clone)]
struct ValidIdentity {
    token: String,
    identity: Identity,
}

#[derive(Debug, Default)]
struct FlowState {
    code_input: String,
    token_input: String,
    code_phase: FieldPhase,
    identity_phase: FieldPhase,
    valid_code: Option<ValidCode>,
    valid_identity: Option<ValidIdentity>,
    redeeming: bool,
}

/// Maps a flow error to the message surfaced through the sink: the reason
/// key or server body when there is one, the display form otherwise.
fn surface_reason(err: &FlowError) -> String {
    match err {
        FlowError::InputMissing(key) => (*key).to_string(),
        FlowError::RemoteRejected(reason) if !reason.is_empty() => reason.clone(),
        FlowError::Network(body) if !body.is_empty() => body.clone(),
        other => other.to_string(),
    }
}

/// The core exchange flow.
pub struct ValidationFlow {
    product: Product,
    config: FlowConfig,
    gateway: Arc<dyn RemoteGateway>,
    sink: Arc<dyn NotificationSink>,
    ledger: Arc<dyn HistoryLedger>,
    state: RwLock<FlowState>,
    /// Single-action latch. Taken with `try_lock` at every public entry
    /// point and released when the action's future settles, so rapid
    /// repeated UI events (Enter plus blur) cannot start overlapping
    /// validations or double-submit a redemption.
    busy: Mutex<()>,
    cancelled: AtomicBool,
}

impl ValidationFlow {
    /// Creates a flow for one product with explicit collaborators.
    pub fn new(
        product: Product,
        gateway: Arc<dyn RemoteGateway>,
        sink: Arc<dyn NotificationSink>,
        ledger: Arc<dyn HistoryLedger>,
        config: FlowConfig,
    ) -> Self {
        Self {
            product,
            config,
            gateway,
            sink,
            ledger,
            state: RwLock::new(FlowState::default()),
            busy: Mutex::new(()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// The product this flow redeems against.
    #[must_use]
    pub fn product(&self) -> Product {
        self.product
    }

    // ── Input transitions ────────────────────────────────────────

    /// Sets the code input. If the normalized text differs from the cached
    /// valid code, the code field drops to `Idle` and the dependent
    /// identity state is cleared.
    pub async fn set_code_input(&self, text: &str) {
        let mut state = self.state.write().await;
        state.code_input = text.to_string();

        let still_valid = state
            .valid_code
            .as_ref()
            .is_some_and(|v| v.normalized == normalize(text));
        if !still_valid {
            debug!("code input changed, invalidating code and identity");
            state.code_phase = FieldPhase::Idle;
            state.valid_code = None;
            state.identity_phase = FieldPhase::Idle;
            state.valid_identity = None;
        }
    }

    /// Sets the token input. A changed token invalidates the identity
    /// state only; the code cache is unaffected.
    pub async fn set_token_input(&self, text: &str) {
        let mut state = self.state.write().await;
        state.token_input = text.to_string();

        let still_valid = state
            .valid_identity
            .as_ref()
            .is_some_and(|v| v.token == text.trim());
        if !still_valid {
            state.identity_phase = FieldPhase::Idle;
            state.valid_identity = None;
        }
    }

    // ── Validation transitions ───────────────────────────────────

    /// Validates the current code input.
    ///
    /// Idempotent: if the normalized input already matches the cached
    /// valid code, no network call is issued. Returns false immediately
    /// if another action is in flight.
    pub async fn validate_code(&self) -> bool {
        let Ok(_guard) = self.busy.try_lock() else {
            debug!("action already in flight, rejecting validate_code");
            return false;
        };
        self.ensure_code_valid(false).await
    }

    /// Validates the current token input against the product backend.
    ///
    /// Always completes a code validation first; the two network calls are
    /// strictly sequential. `silent` suppresses the success notification
    /// only — failures always notify. Returns false immediately if another
    /// action is in flight.
    pub async fn validate_identity(&self, silent: bool) -> bool {
        let Ok(_guard) = self.busy.try_lock() else {
            debug!("action already in flight, rejecting validate_identity");
            return false;
        };

        if !self.ensure_code_valid(true).await {
            return false;
        }
        match self.try_validate_identity(silent).await {
            Ok(()) => true,
            Err(FlowError::Cancelled) => {
                self.state.write().await.identity_phase = FieldPhase::Idle;
                false
            }
            Err(err) => {
                self.fail_identity(surface_reason(&err)).await;
                false
            }
        }
    }

    /// Named internal transition shared by `validate_code` and
    /// `validate_identity`: brings the code field to `Valid` for the
    /// current input, or settles it into `Invalid` and notifies.
    async fn ensure_code_valid(&self, silent: bool) -> bool {
        match self.try_validate_code(silent).await {
            Ok(()) => true,
            Err(FlowError::Cancelled) => {
                // Cancellation commits nothing; the field just stops loading.
                self.state.write().await.code_phase = FieldPhase::Idle;
                false
            }
            Err(err) => {
                self.fail_code(surface_reason(&err)).await;
                false
            }
        }
    }

    async fn try_validate_code(&self, silent: bool) -> FlowResult<()> {
        let normalized = {
            let state = self.state.read().await;
            normalize(&state.code_input)
        };

        if normalized.is_empty() {
            return Err(FlowError::InputMissing("codeRequired"));
        }

        // Idempotent short-circuit: unchanged valid input, no network call.
        {
            let state = self.state.read().await;
            if state.code_phase == FieldPhase::Valid
                && state
                    .valid_code
                    .as_ref()
                    .is_some_and(|v| v.normalized == normalized)
            {
                debug!(code = %normalized, "code already valid");
                return Ok(());
            }
        }

        {
            let mut state = self.state.write().await;
            state.code_phase = FieldPhase::Loading;
            // Identity depends on code; a re-validation voids it.
            state.identity_phase = FieldPhase::Idle;
            state.valid_identity = None;
        }

        let context = self.product.policy().context();
        let result = self.gateway.verify_code(&normalized, context).await;
        if self.is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        let info = result?;

        if info.used {
            return Err(FlowError::RemoteRejected("cdkUsed".to_string()));
        }

        info!(code = %normalized, "code validated");
        let message = match &info.app {
            Some(app) => format!("{normalized} · {app}"),
            None => normalized.clone(),
        };
        {
            let mut state = self.state.write().await;
            // The input may have been edited while the call was in flight;
            // the newer edit wins and this result is discarded.
            if normalize(&state.code_input) != normalized {
                debug!(code = %normalized, "code input changed mid-validation, discarding result");
                return Err(FlowError::Cancelled);
            }
            state.code_phase = FieldPhase::Valid;
            state.valid_code = Some(ValidCode { normalized, info });
        }
        if !silent {
            self.notify(NotificationKind::Info, "codeValid", message).await;
        }
        Ok(())
    }

    /// Identity half of the validation. Expects the code field to be
    /// `Valid` already (see `ensure_code_valid`).
    async fn try_validate_identity(&self, silent: bool) -> FlowResult<()> {
        let token = {
            let state = self.state.read().await;
            state.token_input.trim().to_string()
        };
        if token.is_empty() {
            return Err(FlowError::InputMissing("tokenRequired"));
        }

        // Idempotent short-circuit for an unchanged valid token.
        {
            let state = self.state.read().await;
            if state.identity_phase == FieldPhase::Valid
                && state.valid_identity.as_ref().is_some_and(|v| v.token == token)
            {
                debug!("identity already valid");
                return Ok(());
            }
        }

        let code = {
            let state = self.state.read().await;
            match &state.valid_code {
                Some(v) => v.normalized.clone(),
                // Code was just ensured; a missing cache means the flow was
                // reset concurrently.
                None => return Err(FlowError::InputMissing("codeRequired")),
            }
        };

        self.state.write().await.identity_phase = FieldPhase::Loading;

        let policy = self.product.policy();
        let result = self
            .gateway
            .verify_identity(&token, &code, policy.context())
            .await;
        if self.is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        let identity = result?;

        if !identity.verified {
            return Err(FlowError::RemoteRejected("tokenInvalid".to_string()));
        }
        if let PolicyDecision::Reject { reason } = policy.validate(&identity) {
            warn!(%reason, "policy rejected identity");
            return Err(FlowError::RemoteRejected(reason));
        }

        info!(subject = %identity.subject, "identity validated");
        let lines = policy.details(&identity, self.config.language);
        {
            let mut state = self.state.write().await;
            // Discard the result if the token or the upstream code changed
            // while the call was in flight.
            let fresh = state.token_input.trim() == token
                && state
                    .valid_code
                    .as_ref()
                    .is_some_and(|v| v.normalized == code);
            if !fresh {
                debug!("inputs changed mid-validation, discarding identity result");
                return Err(FlowError::Cancelled);
            }
            state.identity_phase = FieldPhase::Valid;
            state.valid_identity = Some(ValidIdentity { token, identity });
        }
        if !silent {
            self.notify(NotificationKind::Success, "identityValid", lines.join("\n"))
                .await;
        }
        Ok(())
    }

    // ── Redemption ───────────────────────────────────────────────

    /// Submits the redemption with the current inputs.
    ///
    /// Does not require prior `Valid` states — the server re-validates and
    /// is authoritative. An asynchronous task handle is polled to a
    /// terminal state or until the configured deadline. On success exactly
    /// one history record is appended and, once the notification resolves,
    /// all fields are cleared (unless the product is a mock or an input
    /// carries [`TEST_INPUT_SENTINEL`]). On failure nothing is mutated, so
    /// the user can retry without re-entering data. Returns false
    /// immediately if another action is in flight.
    pub async fn redeem(&self) -> bool {
        let Ok(_guard) = self.busy.try_lock() else {
            debug!("action already in flight, rejecting redeem");
            return false;
        };

        let (code, token, preserve_inputs) = {
            let state = self.state.read().await;
            let preserve = self.product.policy().is_mock()
                || state.code_input.contains(TEST_INPUT_SENTINEL)
                || state.token_input.contains(TEST_INPUT_SENTINEL);
            (
                normalize(&state.code_input),
                state.token_input.trim().to_string(),
                preserve,
            )
        };

        self.state.write().await.redeeming = true;
        let result = self.submit_and_resolve(&code, &token).await;
        self.state.write().await.redeeming = false;

        match result {
            Ok(receipt) => {
                let context = self.product.policy().context();
                info!(code = %code, context, "redemption succeeded");
                self.ledger.append(HistoryRecord::new(code, token, context));

                let message = receipt.unwrap_or_else(|| "redeemSuccess".to_string());
                self.notify(NotificationKind::Success, "redeemSuccess", message)
                    .await;
                // The sink resolved, i.e. the user acknowledged.
                if !preserve_inputs {
                    self.reset().await;
                }
                true
            }
            Err(FlowError::Cancelled) => {
                debug!("redeem cancelled before completion");
                false
            }
            Err(err) => {
                warn!(error = %err, "redemption failed");
                self.notify(NotificationKind::Error, "redeemFailed", surface_reason(&err))
                    .await;
                false
            }
        }
    }

    async fn submit_and_resolve(&self, code: &str, token: &str) -> FlowResult<Option<String>> {
        let result = self.gateway.submit_redeem(code, token).await;
        if self.is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        match result? {
            RedemptionOutcome::Success { receipt } => Ok(receipt),
            RedemptionOutcome::Pending(handle) => self.poll_until_terminal(&handle).await,
            RedemptionOutcome::Failure { reason } => Err(FlowError::RemoteRejected(reason)),
        }
    }

    /// Polls a redemption task at a fixed interval until it is terminal,
    /// cancelled, or past the deadline.
    async fn poll_until_terminal(&self, handle: &TaskHandle) -> FlowResult<Option<String>> {
        let deadline = Instant::now() + self.config.poll_timeout;
        loop {
            if self.is_cancelled() {
                return Err(FlowError::Cancelled);
            }
            match self.gateway.poll_task(handle).await? {
                TaskStatus::Pending => {
                    if Instant::now() + self.config.poll_interval > deadline {
                        warn!(task = %handle.id, "poll deadline exceeded");
                        return Err(FlowError::Timeout);
                    }
                    debug!(task = %handle.id, "task pending");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                TaskStatus::Success { message } => return Ok(message),
                TaskStatus::Failure { message } => {
                    return Err(FlowError::RemoteRejected(message));
                }
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stops any pending poll loop. Nothing commits after cancellation;
    /// intended to be called when the owning screen unmounts.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clears all inputs, caches, and field states.
    pub async fn reset(&self) {
        *self.state.write().await = FlowState::default();
    }

    // ── Read accessors (UI snapshots) ────────────────────────────

    /// Current code field state.
    pub async fn code_state(&self) -> FieldPhase {
        self.state.read().await.code_phase.clone()
    }

    /// Current identity field state.
    pub async fn identity_state(&self) -> FieldPhase {
        self.state.read().await.identity_phase.clone()
    }

    /// Raw code input.
    pub async fn code_input(&self) -> String {
        self.state.read().await.code_input.clone()
    }

    /// Raw token input.
    pub async fn token_input(&self) -> String {
        self.state.read().await.token_input.clone()
    }

    /// The cached valid code (normalized), if any.
    pub async fn cached_code(&self) -> Option<String> {
        self.state
            .read()
            .await
            .valid_code
            .as_ref()
            .map(|v| v.normalized.clone())
    }

    /// The `CodeInfo` for the cached valid code, if any.
    pub async fn cached_code_info(&self) -> Option<CodeInfo> {
        self.state
            .read()
            .await
            .valid_code
            .as_ref()
            .map(|v| v.info.clone())
    }

    /// The cached verified identity, if any.
    pub async fn cached_identity(&self) -> Option<Identity> {
        self.state
            .read()
            .await
            .valid_identity
            .as_ref()
            .map(|v| v.identity.clone())
    }

    /// Whether a redemption is currently in flight.
    pub async fn is_redeeming(&self) -> bool {
        self.state.read().await.redeeming
    }

    // ── Internals ────────────────────────────────────────────────

    /// Marks the code field invalid, clears its cache and the dependent
    /// identity state, and notifies.
    async fn fail_code(&self, reason: String) {
        {
            let mut state = self.state.write().await;
            state.code_phase = FieldPhase::Invalid(reason.clone());
            state.valid_code = None;
            state.identity_phase = FieldPhase::Idle;
            state.valid_identity = None;
        }
        self.notify(NotificationKind::Error, "codeInvalid", reason).await;
    }

    /// Marks the identity field invalid, clears its cache, and notifies.
    async fn fail_identity(&self, reason: String) {
        {
            let mut state = self.state.write().await;
            state.identity_phase = FieldPhase::Invalid(reason.clone());
            state.valid_identity = None;
        }
        self.notify(NotificationKind::Error, "identityInvalid", reason)
            .await;
    }

    async fn notify(&self, kind: NotificationKind, title: &str, message: String) {
        self.sink.notify(Notification::new(kind, title, message)).await;
    }
}
