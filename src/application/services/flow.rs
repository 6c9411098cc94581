//! Payment verification flow service
//!
//! Owns flow sessions and drives the `domain::flow` state machine. Each
//! checkout spawns one driver task that interprets effects: it calls the QR
//! provider, schedules polls, polls the status client, and triggers the
//! notification pipeline. Every timer lives inside the driver task, so a
//! terminal state (or teardown) ends the task and cancels everything at
//! once. Polls are strictly sequential: the driver awaits each status call
//! before another can be issued.

use crate::config::AppConfig;
use crate::domain::flow::{self, Effect, FlowEvent, FlowState, FlowStatus, PollOutcome};
use crate::domain::order::{OrderData, OrderDescriptor};
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::Metrics;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::notification::NotificationService;
use super::payment_token::PaymentTokenService;

/// QR generation request forwarded to the KHQR provider
#[derive(Debug, Clone, Serialize)]
pub struct QrRequest {
    #[serde(rename = "bakongAccountID")]
    pub bakong_account_id: String,
    #[serde(rename = "accName")]
    pub acc_name: String,
    #[serde(rename = "accountInformation")]
    pub account_information: String,
    pub currency: String,
    pub amount: f64,
    pub address: String,
}

/// One generated payment QR. The md5 hash is the sole correlation key
/// between the QR and its status polls.
#[derive(Debug, Clone)]
pub struct QrSession {
    pub qr_image: String,
    pub md5: String,
}

/// QR generation upstream
#[async_trait]
pub trait QrProvider: Send + Sync {
    async fn generate(&self, request: &QrRequest) -> AppResult<QrSession>;
}

/// Payment-status upstream. Transport failures fold into
/// `PollOutcome::TransportError`; the state machine decides what they mean.
#[async_trait]
pub trait PaymentStatusClient: Send + Sync {
    async fn check(&self, md5: &str) -> PollOutcome;
}

/// Externally visible snapshot of a flow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub flow_id: String,
    pub status: FlowStatus,
    pub check_count: u32,
    pub error_message: Option<String>,
    pub transaction_id: Option<String>,
    pub md5: Option<String>,
    pub qr_image: Option<String>,
}

/// Response to a checkout request. A cooldown answer has `qr_cooldown > 0`
/// and no flow id: the provider was not called.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub flow_id: Option<String>,
    pub qr_image: Option<String>,
    pub md5: Option<String>,
    pub qr_cooldown: u64,
}

/// In-memory store for flow snapshots and per-order QR cooldowns
pub struct FlowStore {
    flows: RwLock<HashMap<String, FlowSnapshot>>,
    cooldowns: RwLock<HashMap<String, Instant>>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
            cooldowns: RwLock::new(HashMap::new()),
        }
    }

    pub async fn put(&self, snapshot: FlowSnapshot) {
        self.flows
            .write()
            .await
            .insert(snapshot.flow_id.clone(), snapshot);
    }

    pub async fn get(&self, flow_id: &str) -> Option<FlowSnapshot> {
        self.flows.read().await.get(flow_id).cloned()
    }

    /// Record a successful QR generation for the order key
    pub async fn mark_generated(&self, key: &str) {
        self.cooldowns
            .write()
            .await
            .insert(key.to_string(), Instant::now());
    }

    /// Remaining cooldown for the order key, if any
    pub async fn cooldown_remaining(&self, key: &str, period: Duration) -> Option<Duration> {
        let cooldowns = self.cooldowns.read().await;
        let generated_at = cooldowns.get(key)?;
        let elapsed = generated_at.elapsed();
        if elapsed < period {
            Some(period - elapsed)
        } else {
            None
        }
    }
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Payment verification flow service
pub struct FlowService {
    config: Arc<AppConfig>,
    qr_provider: Arc<dyn QrProvider>,
    status_client: Arc<dyn PaymentStatusClient>,
    notifier: Arc<NotificationService>,
    tokens: Arc<PaymentTokenService>,
    store: Arc<FlowStore>,
    metrics: Arc<Metrics>,
}

impl FlowService {
    pub fn new(
        config: Arc<AppConfig>,
        qr_provider: Arc<dyn QrProvider>,
        status_client: Arc<dyn PaymentStatusClient>,
        notifier: Arc<NotificationService>,
        tokens: Arc<PaymentTokenService>,
        store: Arc<FlowStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            qr_provider,
            status_client,
            notifier,
            tokens,
            store,
            metrics,
        }
    }

    pub fn store(&self) -> Arc<FlowStore> {
        Arc::clone(&self.store)
    }

    /// Start a checkout: enforce the QR cooldown, generate a QR, and begin
    /// verification polling. Returns once the QR is available (or the
    /// cooldown answer, without touching the provider).
    pub async fn start_checkout(&self, order: OrderDescriptor) -> AppResult<CheckoutResponse> {
        order.validate()?;

        let cooldown_key = order.cooldown_key();
        let cooldown_period = Duration::from_secs(self.config.flow.qr_cooldown_seconds);
        if let Some(remaining) = self
            .store
            .cooldown_remaining(&cooldown_key, cooldown_period)
            .await
        {
            info!(
                key = %cooldown_key,
                remaining_secs = remaining.as_secs(),
                "QR generation on cooldown"
            );
            return Ok(CheckoutResponse {
                flow_id: None,
                qr_image: None,
                md5: None,
                qr_cooldown: remaining.as_secs().max(1),
            });
        }

        let flow_id = Uuid::new_v4().to_string();
        self.metrics.flows_started_total.inc();
        self.store
            .put(FlowSnapshot {
                flow_id: flow_id.clone(),
                status: FlowStatus::Pending,
                check_count: 0,
                error_message: None,
                transaction_id: None,
                md5: None,
                qr_image: None,
            })
            .await;

        let (qr_tx, qr_rx) = oneshot::channel();
        let driver = FlowDriver {
            flow_id: flow_id.clone(),
            order,
            config: Arc::clone(&self.config),
            qr_provider: Arc::clone(&self.qr_provider),
            status_client: Arc::clone(&self.status_client),
            notifier: Arc::clone(&self.notifier),
            tokens: Arc::clone(&self.tokens),
            store: Arc::clone(&self.store),
            metrics: Arc::clone(&self.metrics),
            state: FlowState::Idle,
            pending: VecDeque::new(),
            next_poll_at: None,
            verify_deadline: None,
            qr_deadline: None,
            md5: None,
            qr_image: None,
            check_count: 0,
            transaction_id: None,
            notified: false,
            qr_tx: Some(qr_tx),
        };
        tokio::spawn(driver.run());

        match qr_rx.await {
            Ok(Ok(session)) => Ok(CheckoutResponse {
                flow_id: Some(flow_id),
                qr_image: Some(session.qr_image),
                md5: Some(session.md5),
                qr_cooldown: 0,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AppError::Internal(
                "flow driver terminated before QR generation".to_string(),
            )),
        }
    }
}

/// Per-flow driver task. Interprets effects from the state machine and owns
/// every timer; returning from `run` cancels all of them.
struct FlowDriver {
    flow_id: String,
    order: OrderDescriptor,
    config: Arc<AppConfig>,
    qr_provider: Arc<dyn QrProvider>,
    status_client: Arc<dyn PaymentStatusClient>,
    notifier: Arc<NotificationService>,
    tokens: Arc<PaymentTokenService>,
    store: Arc<FlowStore>,
    metrics: Arc<Metrics>,

    state: FlowState,
    pending: VecDeque<Effect>,
    next_poll_at: Option<Instant>,
    verify_deadline: Option<Instant>,
    qr_deadline: Option<Instant>,
    md5: Option<String>,
    qr_image: Option<String>,
    check_count: u32,
    transaction_id: Option<String>,
    notified: bool,
    qr_tx: Option<oneshot::Sender<AppResult<QrSession>>>,
}

impl FlowDriver {
    async fn run(mut self) {
        self.apply(FlowEvent::Start).await;

        loop {
            while let Some(effect) = self.pending.pop_front() {
                self.interpret(effect).await;
            }

            if self.state.is_terminal() {
                match self.state {
                    FlowState::Success => self.metrics.flows_succeeded_total.inc(),
                    _ => self.metrics.flows_failed_total.inc(),
                }
                info!(
                    flow_id = %self.flow_id,
                    status = ?self.state.status(),
                    checks = self.check_count,
                    "flow finished"
                );
                return;
            }

            let Some((deadline, event)) = self.next_deadline() else {
                warn!(flow_id = %self.flow_id, "flow stalled without timers");
                return;
            };
            tokio::time::sleep_until(deadline).await;
            self.fire(event).await;
        }
    }

    /// Feed an event through the transition function and queue its effects
    async fn apply(&mut self, event: FlowEvent) {
        let (state, effects) = flow::step(
            self.state.clone(),
            event,
            self.config.flow.max_verification_attempts,
        );
        self.state = state;
        self.pending.extend(effects);
        self.publish().await;
    }

    /// Fire a timer event, maintaining the deadline bookkeeping
    async fn fire(&mut self, event: FlowEvent) {
        match &event {
            FlowEvent::PollDue => {
                self.next_poll_at = None;
                // Hard verification timeout runs from the first poll
                if self.verify_deadline.is_none() {
                    self.verify_deadline = Some(
                        Instant::now()
                            + Duration::from_secs(self.config.flow.verification_timeout_seconds),
                    );
                }
            }
            FlowEvent::VerificationTimeout => self.verify_deadline = None,
            FlowEvent::QrExpired => self.qr_deadline = None,
            _ => {}
        }
        self.apply(event).await;
    }

    /// Earliest armed deadline. On ties the timeouts win over a poll, so an
    /// exhausted budget resolves before one more upstream call.
    fn next_deadline(&self) -> Option<(Instant, FlowEvent)> {
        let candidates = [
            (self.verify_deadline, FlowEvent::VerificationTimeout),
            (self.qr_deadline, FlowEvent::QrExpired),
            (self.next_poll_at, FlowEvent::PollDue),
        ];

        let mut best: Option<(Instant, FlowEvent)> = None;
        for (at, event) in candidates {
            if let Some(at) = at {
                let earlier = match &best {
                    Some((current, _)) => at < *current,
                    None => true,
                };
                if earlier {
                    best = Some((at, event));
                }
            }
        }
        best
    }

    async fn interpret(&mut self, effect: Effect) {
        match effect {
            Effect::GenerateQr => self.generate_qr().await,
            Effect::ScheduleFirstPoll => {
                let now = Instant::now();
                self.next_poll_at =
                    Some(now + Duration::from_secs(self.config.flow.first_poll_delay_seconds));
                self.qr_deadline =
                    Some(now + Duration::from_secs(self.config.flow.qr_expiry_seconds));
            }
            Effect::ScheduleNextPoll => {
                self.next_poll_at = Some(
                    Instant::now() + Duration::from_secs(self.config.flow.poll_interval_seconds),
                );
            }
            Effect::Poll => {
                self.check_count += 1;
                let md5 = self.md5.clone().unwrap_or_default();
                let outcome = self.status_client.check(&md5).await;
                self.apply(FlowEvent::PollSettled(outcome)).await;
            }
            Effect::ConfirmPoll => {
                let md5 = self.md5.clone().unwrap_or_default();
                let outcome = self.status_client.check(&md5).await;
                self.apply(FlowEvent::ConfirmSettled(outcome)).await;
            }
            Effect::Notify => self.notify().await,
            Effect::CancelTimers => {
                self.next_poll_at = None;
                self.verify_deadline = None;
                self.qr_deadline = None;
            }
        }
    }

    async fn generate_qr(&mut self) {
        let request = QrRequest {
            bakong_account_id: self.config.khqr_account.bakong_account_id.clone(),
            acc_name: self.config.khqr_account.acc_name.clone(),
            account_information: self.config.khqr_account.account_information.clone(),
            currency: self.config.khqr_account.currency.clone(),
            amount: self.order.final_amount(),
            address: self.config.khqr_account.address.clone(),
        };

        match self.qr_provider.generate(&request).await {
            Ok(session) => {
                self.md5 = Some(session.md5.clone());
                self.qr_image = Some(session.qr_image.clone());
                self.store.mark_generated(&self.order.cooldown_key()).await;
                if let Some(tx) = self.qr_tx.take() {
                    let _ = tx.send(Ok(session));
                }
                self.apply(FlowEvent::QrReady).await;
            }
            Err(e) => {
                self.metrics.upstream_failures_total.inc();
                error!(flow_id = %self.flow_id, error = %e, "QR generation failed");
                if let Some(tx) = self.qr_tx.take() {
                    let _ = tx.send(Err(e));
                }
                self.apply(FlowEvent::QrFailed(
                    "Failed to generate QR code".to_string(),
                ))
                .await;
            }
        }
    }

    async fn notify(&mut self) {
        // State inspection already guards re-entry; the latch covers the
        // window before cancellation completes.
        if self.notified {
            return;
        }
        self.notified = true;

        let data = OrderData::for_order(&self.order);
        self.transaction_id = Some(data.transaction_id.clone());

        match self.tokens.issue(&data) {
            Ok(token) => match self.notifier.notify_with_token(&token).await {
                Ok(report) => {
                    info!(
                        flow_id = %self.flow_id,
                        transaction_id = %data.transaction_id,
                        queued = report.queued,
                        "order notification triggered"
                    );
                }
                Err(e) => {
                    error!(flow_id = %self.flow_id, error = %e, "order notification failed");
                }
            },
            Err(e) => {
                error!(flow_id = %self.flow_id, error = %e, "payment token issuance failed");
            }
        }
        self.publish().await;
    }

    async fn publish(&self) {
        let error_message = match &self.state {
            FlowState::Failed { message } => Some(message.clone()),
            FlowState::Expired => Some(flow::QR_EXPIRED_MESSAGE.to_string()),
            _ => None,
        };
        self.store
            .put(FlowSnapshot {
                flow_id: self.flow_id.clone(),
                status: self.state.status(),
                check_count: self.check_count,
                error_message,
                transaction_id: self.transaction_id.clone(),
                md5: self.md5.clone(),
                qr_image: self.qr_image.clone(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::dispatcher::{DispatcherService, MessageSender};
    use crate::application::services::rate_limit::RateLimiterService;
    use crate::domain::order::{Game, Product};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct MockQr {
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl QrProvider for MockQr {
        async fn generate(&self, _request: &QrRequest) -> AppResult<QrSession> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Upstream("provider unavailable".to_string()));
            }
            Ok(QrSession {
                qr_image: "data:image/png;base64,qr".to_string(),
                md5: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            })
        }
    }

    struct MockStatus {
        script: Mutex<std::collections::VecDeque<PollOutcome>>,
        calls: AtomicU32,
    }

    impl MockStatus {
        fn new(script: Vec<PollOutcome>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentStatusClient for MockStatus {
        async fn check(&self, _md5: &str) -> PollOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(PollOutcome::NotFound)
        }
    }

    struct CountingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageSender for CountingSender {
        async fn send(&self, chat_id: &str, text: &str) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct Harness {
        service: FlowService,
        qr: Arc<MockQr>,
        status: Arc<MockStatus>,
        sender: Arc<CountingSender>,
        store: Arc<FlowStore>,
    }

    fn harness_with_config(
        config: AppConfig,
        qr_fail: bool,
        script: Vec<PollOutcome>,
    ) -> Harness {
        let config = Arc::new(config);
        let metrics = Arc::new(Metrics::new());
        let qr = Arc::new(MockQr {
            fail: qr_fail,
            calls: AtomicU32::new(0),
        });
        let status = Arc::new(MockStatus::new(script));
        let sender = Arc::new(CountingSender {
            sent: Mutex::new(Vec::new()),
        });
        let limiter = Arc::new(RateLimiterService::new(
            Duration::from_secs(60),
            1000,
            Duration::from_secs(3600),
        ));
        let dispatcher = Arc::new(DispatcherService::new(
            sender.clone(),
            limiter,
            3,
            Duration::from_secs(300),
            Duration::from_secs(1),
            "main".to_string(),
            "orders".to_string(),
            metrics.clone(),
        ));
        let tokens = Arc::new(PaymentTokenService::new(config.clone()));
        let notifier = Arc::new(NotificationService::new(tokens.clone(), dispatcher));
        let store = Arc::new(FlowStore::new());

        let service = FlowService::new(
            config,
            qr.clone(),
            status.clone(),
            notifier,
            tokens,
            store.clone(),
            metrics,
        );

        Harness {
            service,
            qr,
            status,
            sender,
            store,
        }
    }

    fn harness(qr_fail: bool, script: Vec<PollOutcome>) -> Harness {
        harness_with_config(AppConfig::default(), qr_fail, script)
    }

    fn order() -> OrderDescriptor {
        OrderDescriptor {
            game: Game::Mlbb,
            user_id: "123456789".to_string(),
            server_id: "1234".to_string(),
            nickname: None,
            product: Product {
                name: "86 Diamonds".to_string(),
                code: Some("86".to_string()),
                diamonds: Some(86),
                price: 1.24,
            },
            discount_percent: 0.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_path_notifies_exactly_once() {
        // First poll (t+7s) finds nothing, second (t+12s) is paid; the
        // confirmatory poll is also paid, so notification fires.
        let h = harness(
            false,
            vec![PollOutcome::NotFound, PollOutcome::Paid, PollOutcome::Paid],
        );

        let response = h.service.start_checkout(order()).await.unwrap();
        let flow_id = response.flow_id.unwrap();
        assert!(response.qr_image.is_some());
        assert_eq!(response.qr_cooldown, 0);

        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = h.store.get(&flow_id).await.unwrap();
        assert_eq!(snapshot.status, FlowStatus::Success);
        assert_eq!(snapshot.check_count, 2);
        assert!(snapshot.transaction_id.is_some());

        // Two polls plus one confirmatory poll
        assert_eq!(h.status.calls.load(Ordering::SeqCst), 3);

        // Exactly one notification: one message per channel
        let sent = h.sender.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        let chats: Vec<&str> = sent.iter().map(|(c, _)| c.as_str()).collect();
        assert!(chats.contains(&"main"));
        assert!(chats.contains(&"orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_failure_suppresses_notification() {
        // Flaky upstream: paid once, then not found on the confirmatory
        // poll. The flow still succeeds, but nothing is dispatched.
        let h = harness(false, vec![PollOutcome::Paid, PollOutcome::NotFound]);

        let response = h.service.start_checkout(order()).await.unwrap();
        let flow_id = response.flow_id.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = h.store.get(&flow_id).await.unwrap();
        assert_eq!(snapshot.status, FlowStatus::Success);
        assert!(h.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verification_timeout_stops_all_polling() {
        // No poll ever returns paid; the hard timeout forces an error and
        // no further network calls happen afterwards.
        let h = harness(false, vec![]);

        let response = h.service.start_checkout(order()).await.unwrap();
        let flow_id = response.flow_id.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;

        let snapshot = h.store.get(&flow_id).await.unwrap();
        assert_eq!(snapshot.status, FlowStatus::Error);
        assert!(snapshot.error_message.unwrap().contains("timeout"));

        let calls_at_timeout = h.status.calls.load(Ordering::SeqCst);
        assert!(calls_at_timeout <= 12);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.status.calls.load(Ordering::SeqCst), calls_at_timeout);
        assert!(h.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_failure_code_stops_flow() {
        let h = harness(false, vec![PollOutcome::Declined(5)]);

        let response = h.service.start_checkout(order()).await.unwrap();
        let flow_id = response.flow_id.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = h.store.get(&flow_id).await.unwrap();
        assert_eq!(snapshot.status, FlowStatus::Error);
        assert!(snapshot
            .error_message
            .unwrap()
            .contains("verification failed"));
        assert!(h.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_qr_cooldown_blocks_regeneration() {
        let h = harness(false, vec![]);

        let first = h.service.start_checkout(order()).await.unwrap();
        assert!(first.flow_id.is_some());
        assert_eq!(h.qr.calls.load(Ordering::SeqCst), 1);

        // Second request for the same order inside the cooldown window is
        // answered from cooldown state without a provider call.
        let second = h.service.start_checkout(order()).await.unwrap();
        assert!(second.flow_id.is_none());
        assert!(second.qr_cooldown > 0);
        assert!(second.qr_cooldown <= 180);
        assert_eq!(h.qr.calls.load(Ordering::SeqCst), 1);

        // After the cooldown elapses a new QR may be generated
        tokio::time::sleep(Duration::from_secs(181)).await;
        let third = h.service.start_checkout(order()).await.unwrap();
        assert!(third.flow_id.is_some());
        assert_eq!(h.qr.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_qr_generation_failure_surfaces_generic_error() {
        let h = harness(true, vec![]);

        let err = h.service.start_checkout(order()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(h.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_qr_expiry_when_verification_outlasts_it() {
        let mut config = AppConfig::default();
        config.flow.verification_timeout_seconds = 600;
        config.flow.max_verification_attempts = 120;
        config.flow.qr_expiry_seconds = 300;
        let h = harness_with_config(config, false, vec![]);

        let response = h.service.start_checkout(order()).await.unwrap();
        let flow_id = response.flow_id.unwrap();

        tokio::time::sleep(Duration::from_secs(400)).await;

        let snapshot = h.store.get(&flow_id).await.unwrap();
        assert_eq!(snapshot.status, FlowStatus::Expired);
        assert!(snapshot.error_message.unwrap().contains("expired"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_order_rejected_before_provider_call() {
        let h = harness(false, vec![]);
        let mut bad = order();
        bad.user_id = "not-a-number".to_string();

        let err = h.service.start_checkout(bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.qr.calls.load(Ordering::SeqCst), 0);
    }
}
