//! Telegram dispatcher: priority queue plus retry engine
//!
//! Delivers order-confirmation text to two destination channels with
//! at-least-once semantics. A message denied by the per-chat rate limiter is
//! queued at priority 2; a message that failed in transit is re-queued at
//! priority 3 so the drain loop clears failures before fresh rate-limited
//! entries. Ties break oldest-first. A message is attempted at most
//! `max_retries + 1` times; after that it is dropped with only a log line.

use crate::domain::order::OrderData;
use crate::shared::error::AppResult;
use crate::shared::metrics::Metrics;
use async_trait::async_trait;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::rate_limit::RateLimiterService;

/// Queue priority for messages deferred by the rate limiter
const PRIORITY_RATE_LIMITED: u8 = 2;
/// Queue priority for messages re-queued after a failed send
const PRIORITY_RETRY: u8 = 3;

/// Transport abstraction over the Telegram Bot API
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> AppResult<()>;
}

/// One pending delivery
#[derive(Debug, Clone)]
struct QueuedMessage {
    chat_id: String,
    text: String,
    retry_count: u32,
    priority: u8,
    enqueued_at: Instant,
    seq: u64,
}

impl PartialEq for QueuedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedMessage {}

impl Ord for QueuedMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then oldest (lowest seq) first
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Caller-visible result of an order notification. Partial delivery is a
/// valid terminal state, not an error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub success: bool,
    pub main_group_sent: bool,
    pub orders_group_sent: bool,
    pub queued: bool,
}

/// Message dispatcher with a rate-limited retry queue
pub struct DispatcherService {
    sender: Arc<dyn MessageSender>,
    limiter: Arc<RateLimiterService>,
    queue: Mutex<BinaryHeap<QueuedMessage>>,
    draining: AtomicBool,
    seq: AtomicU64,
    max_retries: u32,
    stale_after: Duration,
    drain_tick: Duration,
    main_chat_id: String,
    orders_chat_id: String,
    metrics: Arc<Metrics>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DispatcherService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sender: Arc<dyn MessageSender>,
        limiter: Arc<RateLimiterService>,
        max_retries: u32,
        stale_after: Duration,
        drain_tick: Duration,
        main_chat_id: String,
        orders_chat_id: String,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            sender,
            limiter,
            queue: Mutex::new(BinaryHeap::new()),
            draining: AtomicBool::new(false),
            seq: AtomicU64::new(0),
            max_retries,
            stale_after,
            drain_tick,
            main_chat_id,
            orders_chat_id,
            metrics,
            worker: Mutex::new(None),
        }
    }

    fn enqueue(&self, chat_id: &str, text: &str, retry_count: u32, priority: u8) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.queue.lock().unwrap().push(QueuedMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            retry_count,
            priority,
            enqueued_at: Instant::now(),
            seq,
        });
        self.metrics.messages_queued_total.inc();
    }

    /// Current queue depth
    pub fn queue_depth(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Immediate send attempt. Returns true only when the message was
    /// delivered; a rate-limited or failed message is queued (when budget
    /// remains) and reported as not-yet-sent.
    pub async fn send(&self, chat_id: &str, text: &str) -> bool {
        self.send_attempt(chat_id, text, 0).await
    }

    async fn send_attempt(&self, chat_id: &str, text: &str, retry_count: u32) -> bool {
        if !self.limiter.try_acquire(chat_id) {
            debug!(chat_id = %chat_id, "rate limited, queueing message");
            self.enqueue(chat_id, text, retry_count, PRIORITY_RATE_LIMITED);
            return false;
        }

        match self.sender.send(chat_id, text).await {
            Ok(()) => {
                self.metrics.messages_sent_total.inc();
                true
            }
            Err(e) => {
                warn!(
                    chat_id = %chat_id,
                    retry_count = retry_count,
                    error = %e,
                    "message send failed"
                );
                if retry_count < self.max_retries {
                    self.enqueue(chat_id, text, retry_count + 1, PRIORITY_RETRY);
                } else {
                    warn!(chat_id = %chat_id, "message dropped after retry exhaustion");
                    self.metrics.messages_dropped_total.inc();
                }
                false
            }
        }
    }

    /// Send the order notification to both channels independently
    pub async fn notify_order(&self, order: &OrderData) -> DispatchReport {
        let (main_group_sent, orders_group_sent) = futures::join!(
            self.send_attempt(&self.main_chat_id, &order.main_message, 0),
            self.send_attempt(&self.orders_chat_id, &order.order_message, 0),
        );

        let report = DispatchReport {
            success: true,
            main_group_sent,
            orders_group_sent,
            queued: !main_group_sent || !orders_group_sent,
        };
        info!(
            transaction_id = %order.transaction_id,
            main_group_sent = report.main_group_sent,
            orders_group_sent = report.orders_group_sent,
            queued = report.queued,
            "order notification dispatched"
        );
        report
    }

    /// Drain the retry queue. Reentrancy-guarded: the drive timer fires
    /// faster than a full drain can sometimes complete.
    pub async fn drain(&self) {
        if self.draining.swap(true, AtomicOrdering::SeqCst) {
            return;
        }

        loop {
            let message = match self.queue.lock().unwrap().pop() {
                Some(message) => message,
                None => break,
            };

            if message.enqueued_at.elapsed() > self.stale_after {
                debug!(chat_id = %message.chat_id, "discarding stale queued message");
                self.metrics.messages_dropped_total.inc();
                continue;
            }

            if !self.limiter.try_acquire(&message.chat_id) {
                // Still rate limited: wait out a full window and retry the
                // same item rather than advancing past it.
                let wait = self.limiter.window();
                self.queue.lock().unwrap().push(message);
                tokio::time::sleep(wait).await;
                continue;
            }

            match self.sender.send(&message.chat_id, &message.text).await {
                Ok(()) => {
                    self.metrics.messages_sent_total.inc();
                }
                Err(e) => {
                    warn!(
                        chat_id = %message.chat_id,
                        retry_count = message.retry_count,
                        error = %e,
                        "queued message send failed"
                    );
                    if message.retry_count < self.max_retries {
                        self.enqueue(
                            &message.chat_id,
                            &message.text,
                            message.retry_count + 1,
                            PRIORITY_RETRY,
                        );
                    } else {
                        warn!(chat_id = %message.chat_id, "queued message dropped after retry exhaustion");
                        self.metrics.messages_dropped_total.inc();
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        self.draining.store(false, AtomicOrdering::SeqCst);
    }

    /// Spawn the periodic drain loop
    pub fn start(self: Arc<Self>) {
        let dispatcher = Arc::clone(&self);
        let tick = self.drain_tick;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                dispatcher.drain().await;
            }
        });
        *self.worker.lock().unwrap() = Some(handle);
    }

    /// Stop the drain loop
    pub fn stop(&self) {
        if let Some(handle) = self.worker.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for DispatcherService {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use std::collections::VecDeque;

    /// Scripted transport: pops one result per send, records every call
    struct MockSender {
        script: Mutex<VecDeque<Result<(), ()>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockSender {
        fn new(script: Vec<Result<(), ()>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for MockSender {
        async fn send(&self, chat_id: &str, text: &str) -> AppResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(())) | None => Ok(()),
                Some(Err(())) => Err(AppError::Upstream("telegram 502".to_string())),
            }
        }
    }

    fn dispatcher(
        sender: Arc<MockSender>,
        limiter: Arc<RateLimiterService>,
    ) -> DispatcherService {
        DispatcherService::new(
            sender,
            limiter,
            3,
            Duration::from_secs(300),
            Duration::from_secs(1),
            "main".to_string(),
            "orders".to_string(),
            Arc::new(Metrics::new()),
        )
    }

    fn wide_limiter() -> Arc<RateLimiterService> {
        Arc::new(RateLimiterService::new(
            Duration::from_secs(60),
            1000,
            Duration::from_secs(3600),
        ))
    }

    fn order() -> OrderData {
        OrderData {
            transaction_id: "tb123456".to_string(),
            order_id: "S1700000000000".to_string(),
            game: "Mobile Legends".to_string(),
            amount: 1.24,
            item: "86 Diamonds".to_string(),
            user_id: "123456789".to_string(),
            server_id: "1234".to_string(),
            order_date: "01/01/2026, 00:00:00".to_string(),
            main_message: "123456789 1234 86".to_string(),
            order_message: "Top up successful✅".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_order_sends_to_both_channels() {
        let sender = Arc::new(MockSender::new(vec![]));
        let dispatcher = dispatcher(sender.clone(), wide_limiter());

        let report = dispatcher.notify_order(&order()).await;
        assert_eq!(
            report,
            DispatchReport {
                success: true,
                main_group_sent: true,
                orders_group_sent: true,
                queued: false,
            }
        );

        let chats: Vec<String> = sender.calls().into_iter().map(|(c, _)| c).collect();
        assert!(chats.contains(&"main".to_string()));
        assert!(chats.contains(&"orders".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_is_reported_and_queued() {
        // Both immediate sends fail, queueing both for retry
        let sender = Arc::new(MockSender::new(vec![Err(()), Err(())]));
        let dispatcher = dispatcher(sender.clone(), wide_limiter());

        let report = dispatcher.notify_order(&order()).await;
        assert!(!report.main_group_sent);
        assert!(!report.orders_group_sent);
        assert!(report.queued);
        assert_eq!(dispatcher.queue_depth(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success_within_budget() {
        // Fails twice, then succeeds: retry_count 0 -> 1 -> 2 -> delivered
        let sender = Arc::new(MockSender::new(vec![Err(()), Err(()), Ok(())]));
        let dispatcher = dispatcher(sender.clone(), wide_limiter());

        assert!(!dispatcher.send("orders", "hello").await);
        assert_eq!(dispatcher.queue_depth(), 1);

        dispatcher.drain().await;
        assert_eq!(dispatcher.queue_depth(), 0);
        assert_eq!(sender.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_drops_message() {
        // Every attempt fails; max_retries = 3 bounds total sends to 4
        let sender = Arc::new(MockSender::new(vec![Err(()); 10]));
        let dispatcher = dispatcher(sender.clone(), wide_limiter());

        assert!(!dispatcher.send("orders", "doomed").await);
        dispatcher.drain().await;

        assert_eq!(dispatcher.queue_depth(), 0);
        assert_eq!(sender.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_send_queues_without_transport_call() {
        let limiter = Arc::new(RateLimiterService::new(
            Duration::from_secs(60),
            1,
            Duration::from_secs(3600),
        ));
        let sender = Arc::new(MockSender::new(vec![]));
        let dispatcher = dispatcher(sender.clone(), limiter);

        assert!(dispatcher.send("orders", "first").await);
        assert!(!dispatcher.send("orders", "second").await);

        // Second message never reached the transport
        assert_eq!(sender.calls().len(), 1);
        assert_eq!(dispatcher.queue_depth(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_out_rate_limit_window_for_head() {
        let limiter = Arc::new(RateLimiterService::new(
            Duration::from_secs(60),
            2,
            Duration::from_secs(3600),
        ));
        let sender = Arc::new(MockSender::new(vec![]));
        let dispatcher = dispatcher(sender.clone(), limiter);

        assert!(dispatcher.send("orders", "first").await);
        assert!(dispatcher.send("orders", "second").await);
        assert!(!dispatcher.send("orders", "third").await);

        // Paused clock auto-advances through the window wait
        dispatcher.drain().await;
        assert_eq!(dispatcher.queue_depth(), 0);
        assert_eq!(sender.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_ordering_retry_before_rate_limited() {
        let sender = Arc::new(MockSender::new(vec![]));
        let dispatcher = dispatcher(sender.clone(), wide_limiter());

        dispatcher.enqueue("orders", "rate-limited-old", 0, PRIORITY_RATE_LIMITED);
        dispatcher.enqueue("orders", "retry", 1, PRIORITY_RETRY);
        dispatcher.enqueue("orders", "rate-limited-new", 0, PRIORITY_RATE_LIMITED);

        dispatcher.drain().await;

        let texts: Vec<String> = sender.calls().into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["retry", "rate-limited-old", "rate-limited-new"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_messages_discarded_on_drain() {
        let sender = Arc::new(MockSender::new(vec![]));
        let dispatcher = dispatcher(sender.clone(), wide_limiter());

        dispatcher.enqueue("orders", "stale", 0, PRIORITY_RATE_LIMITED);
        tokio::time::advance(Duration::from_secs(301)).await;

        dispatcher.drain().await;
        assert_eq!(dispatcher.queue_depth(), 0);
        assert!(sender.calls().is_empty());
    }
}
