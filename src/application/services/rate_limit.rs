//! Fixed-window rate limiting with ban escalation
//!
//! Per-key counters over a fixed window, plus a temporary blacklist for keys
//! that keep hammering after rejection. `try_acquire` never fails; callers
//! branch on the boolean and either queue, reject, or wait. Windows and bans
//! are swept by a periodic background task owned by this service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Window {
    count: u32,
    rejections: u32,
    reset_at: Instant,
}

struct LimiterState {
    windows: HashMap<String, Window>,
    bans: HashMap<String, Instant>,
}

/// Fixed-window per-key rate limiter with IP-ban escalation
pub struct RateLimiterService {
    window: Duration,
    max_requests: u32,
    block_duration: Duration,
    state: Mutex<LimiterState>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiterService {
    pub fn new(window: Duration, max_requests: u32, block_duration: Duration) -> Self {
        Self {
            window,
            max_requests,
            block_duration,
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                bans: HashMap::new(),
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Window length this limiter enforces
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Try to take one slot for `key`. Returns false when the window is
    /// exhausted or the key is blacklisted.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();

        if let Some(banned_until) = state.bans.get(key).copied() {
            if banned_until > now {
                return false;
            }
            state.bans.remove(key);
        }

        let window_len = self.window;
        let entry = state.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            rejections: 0,
            reset_at: now + window_len,
        });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.rejections = 0;
            entry.reset_at = now + window_len;
        }

        if entry.count >= self.max_requests {
            entry.rejections += 1;
            if entry.rejections >= self.max_requests * 2 {
                warn!(key = %key, "rate limit escalation, blacklisting key");
                state.windows.remove(key);
                state.bans.insert(key.to_string(), now + self.block_duration);
            }
            return false;
        }

        entry.count += 1;
        true
    }

    /// Remaining time until the key's window resets. Zero when no window is
    /// tracked for the key.
    pub fn time_until_reset(&self, key: &str) -> Duration {
        let now = Instant::now();
        let state = self.state.lock().unwrap();
        match state.windows.get(key) {
            Some(window) if window.reset_at > now => window.reset_at - now,
            _ => Duration::ZERO,
        }
    }

    /// Drop expired windows and expired bans
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        state.windows.retain(|_, w| w.reset_at > now);
        state.bans.retain(|_, until| *until > now);
        debug!(
            windows = state.windows.len(),
            bans = state.bans.len(),
            "rate limiter sweep complete"
        );
    }

    /// Number of tracked keys (windows plus bans)
    pub fn tracked_keys(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.windows.len() + state.bans.len()
    }

    /// Spawn the periodic sweeper
    pub fn start(self: Arc<Self>) {
        let limiter = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            tick.tick().await; // first tick completes immediately
            loop {
                tick.tick().await;
                limiter.sweep();
            }
        });
        *self.sweeper.lock().unwrap() = Some(handle);
    }

    /// Stop the periodic sweeper
    pub fn stop(&self) {
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for RateLimiterService {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            handle.abort();
        }
    }
}
