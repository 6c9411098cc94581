//! Request signing and replay protection
//!
//! HMAC-SHA256 over the canonical JSON payload, a per-request nonce, and the
//! client timestamp. Accepted nonces are remembered until their replay
//! window closes; a nonce seen twice inside the window is rejected. Expired
//! nonces are swept by a periodic task rather than on each call, so the set
//! may transiently hold expired entries (bounded by window length times
//! request rate).

use crate::config::AppConfig;
use crate::shared::error::{AppError, AppResult};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Request signing and nonce tracking service
pub struct SigningService {
    secret: Vec<u8>,
    timeout_seconds: i64,
    sweep_interval: Duration,
    nonces: Mutex<HashMap<String, i64>>, // nonce -> expiry (unix seconds)
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SigningService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.security.signing_secret.as_bytes().to_vec(),
            timeout_seconds: config.security.signature_timeout_seconds as i64,
            sweep_interval: Duration::from_secs(config.security.nonce_sweep_seconds),
            nonces: Mutex::new(HashMap::new()),
            sweeper: Mutex::new(None),
        }
    }

    fn mac_input(payload: &serde_json::Value, nonce: &str, timestamp: i64) -> String {
        format!("{}|{}|{}", payload, nonce, timestamp)
    }

    /// Compute the signature for a payload. Deterministic: same inputs, same
    /// signature.
    pub fn sign(&self, payload: &serde_json::Value, nonce: &str, timestamp: i64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(Self::mac_input(payload, nonce, timestamp).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a signed request and record its nonce.
    ///
    /// Rejects stale timestamps (replay window), signature mismatches, and
    /// nonce reuse, in that order.
    pub fn verify(
        &self,
        signature: &str,
        payload: &serde_json::Value,
        nonce: &str,
        timestamp: i64,
    ) -> AppResult<()> {
        let now = Utc::now().timestamp();
        if now - timestamp > self.timeout_seconds {
            return Err(AppError::Security("request expired".to_string()));
        }

        let raw = hex::decode(signature)
            .map_err(|_| AppError::Security("invalid signature".to_string()))?;
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(Self::mac_input(payload, nonce, timestamp).as_bytes());
        mac.verify_slice(&raw)
            .map_err(|_| AppError::Security("invalid signature".to_string()))?;

        let mut nonces = self.nonces.lock().unwrap();
        if nonces.contains_key(nonce) {
            return Err(AppError::Security("replay detected".to_string()));
        }
        nonces.insert(nonce.to_string(), timestamp + self.timeout_seconds);

        Ok(())
    }

    /// Drop nonces whose replay window has closed
    pub fn sweep(&self) {
        let now = Utc::now().timestamp();
        let mut nonces = self.nonces.lock().unwrap();
        nonces.retain(|_, expiry| *expiry > now);
        debug!(tracked = nonces.len(), "nonce sweep complete");
    }

    /// Number of tracked nonces
    pub fn tracked_nonces(&self) -> usize {
        self.nonces.lock().unwrap().len()
    }

    /// Spawn the periodic nonce sweeper
    pub fn start(self: Arc<Self>) {
        let service = Arc::clone(&self);
        let interval = self.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.tick().await;
            loop {
                tick.tick().await;
                service.sweep();
            }
        });
        *self.sweeper.lock().unwrap() = Some(handle);
    }

    /// Stop the periodic nonce sweeper
    pub fn stop(&self) {
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for SigningService {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            handle.abort();
        }
    }
}
