//! Rate-limited, retry-aware alert delivery.
//!
//! Per intent:
//!
//! ```text
//!   PENDING ──limited──▶ RATE_LIMITED (dropped)
//!      │
//!      └──▶ SENDING ──2xx──▶ SENT      (last_sent_at = now)
//!               └────else──▶ FAILED    (held for a later cycle while
//!                                       retries remain)
//! ```
//!
//! One attempt per intent per cycle.  A failed intent sits in a single
//! retry slot; [`AlertDispatcher::retry_pending`] re-attempts it on a later
//! cycle once `alert_retry_interval_ms` has passed.  A newer intent always
//! replaces the held one.  The rate limiter is global across alert kinds.

use log::{info, warn};

use crate::app::ports::AlertTransport;
use crate::config::SystemConfig;
use crate::error::TransportError;

use super::payload::{self, CONTENT_TYPE};
use super::{AlertIntent, AlertKind};

// ── Rate limiter ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterState {
    /// `None` until the first successful delivery.
    last_sent_at: Option<u64>,
    min_interval_ms: u64,
}

impl RateLimiterState {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            last_sent_at: None,
            min_interval_ms,
        }
    }

    pub fn last_sent_at(&self) -> Option<u64> {
        self.last_sent_at
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Milliseconds until another alert may go out (0 = not limited).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_sent_at {
            Some(t) => self.min_interval_ms.saturating_sub(now_ms.saturating_sub(t)),
            None => 0,
        }
    }

    pub fn is_limited(&self, now_ms: u64) -> bool {
        self.remaining_ms(now_ms) > 0
    }

    /// Never moves backwards.
    pub fn record_sent(&mut self, now_ms: u64) {
        self.last_sent_at = Some(self.last_sent_at.map_or(now_ms, |t| t.max(now_ms)));
    }
}

// ── Outcome ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent {
        kind: AlertKind,
        status: u16,
    },
    RateLimited {
        kind: AlertKind,
        remaining_ms: u64,
    },
    Failed {
        kind: AlertKind,
        error: TransportError,
        /// Attempts made so far for this intent.
        attempts: u8,
        retry_scheduled: bool,
    },
}

impl DispatchOutcome {
    pub fn kind(&self) -> AlertKind {
        match *self {
            Self::Sent { kind, .. }
            | Self::RateLimited { kind, .. }
            | Self::Failed { kind, .. } => kind,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

// ── Dispatcher ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct HeldIntent {
    intent: AlertIntent,
    attempts: u8,
    last_attempt_at: u64,
}

pub struct AlertDispatcher {
    device_id: heapless::String<16>,
    path: heapless::String<64>,
    connect_timeout_ms: u32,
    max_retries: u8,
    retry_interval_ms: u64,
    held: Option<HeldIntent>,
}

impl AlertDispatcher {
    /// `device_id` longer than 16 bytes is truncated.
    pub fn new(config: &SystemConfig, device_id: &str) -> Self {
        let mut id = heapless::String::new();
        for c in device_id.chars() {
            if id.push(c).is_err() {
                break;
            }
        }
        Self {
            device_id: id,
            path: config.alert_path.clone(),
            connect_timeout_ms: config.connect_timeout_ms,
            max_retries: config.alert_max_retries,
            retry_interval_ms: u64::from(config.alert_retry_interval_ms),
            held: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Kind and attempt count of the intent waiting for a retry.
    pub fn held(&self) -> Option<(AlertKind, u8)> {
        self.held.map(|h| (h.intent.kind, h.attempts))
    }

    /// Deliver a fresh intent.
    pub fn dispatch<T: AlertTransport + ?Sized>(
        &mut self,
        intent: AlertIntent,
        now_ms: u64,
        limiter: &mut RateLimiterState,
        transport: &mut T,
    ) -> DispatchOutcome {
        if let Some(old) = self.held.take() {
            info!(
                "alert: held {} superseded by {}",
                old.intent.kind.as_str(),
                intent.kind.as_str()
            );
        }

        let remaining_ms = limiter.remaining_ms(now_ms);
        if remaining_ms > 0 {
            info!(
                "alert: {} rate limited ({remaining_ms} ms left)",
                intent.kind.as_str()
            );
            return DispatchOutcome::RateLimited {
                kind: intent.kind,
                remaining_ms,
            };
        }

        self.attempt(intent, 1, now_ms, limiter, transport)
    }

    /// Re-attempt the held intent if its retry interval has elapsed.
    pub fn retry_pending<T: AlertTransport + ?Sized>(
        &mut self,
        now_ms: u64,
        limiter: &mut RateLimiterState,
        transport: &mut T,
    ) -> Option<DispatchOutcome> {
        let held = self.held?;
        if now_ms.saturating_sub(held.last_attempt_at) < self.retry_interval_ms {
            return None;
        }
        self.held = None;

        let remaining_ms = limiter.remaining_ms(now_ms);
        if remaining_ms > 0 {
            return Some(DispatchOutcome::RateLimited {
                kind: held.intent.kind,
                remaining_ms,
            });
        }

        info!(
            "alert: retrying {} (attempt {})",
            held.intent.kind.as_str(),
            held.attempts.saturating_add(1)
        );
        let attempts = held.attempts.saturating_add(1);
        Some(self.attempt(held.intent, attempts, now_ms, limiter, transport))
    }

    fn attempt<T: AlertTransport + ?Sized>(
        &mut self,
        intent: AlertIntent,
        attempts: u8,
        now_ms: u64,
        limiter: &mut RateLimiterState,
        transport: &mut T,
    ) -> DispatchOutcome {
        match self.deliver(&intent, transport) {
            Ok(status) => {
                limiter.record_sent(now_ms);
                info!("alert: {} sent (HTTP {status})", intent.kind.as_str());
                DispatchOutcome::Sent {
                    kind: intent.kind,
                    status,
                }
            }
            Err(error) => {
                // attempts - 1 retries used so far; the counter never wraps
                let retry_scheduled = attempts <= self.max_retries && attempts < u8::MAX;
                if retry_scheduled {
                    self.held = Some(HeldIntent {
                        intent,
                        attempts,
                        last_attempt_at: now_ms,
                    });
                }
                warn!(
                    "alert: {} failed: {error} (attempt {attempts}, retry {})",
                    intent.kind.as_str(),
                    if retry_scheduled { "scheduled" } else { "exhausted" }
                );
                DispatchOutcome::Failed {
                    kind: intent.kind,
                    error,
                    attempts,
                    retry_scheduled,
                }
            }
        }
    }

    fn deliver<T: AlertTransport + ?Sized>(
        &self,
        intent: &AlertIntent,
        transport: &mut T,
    ) -> Result<u16, TransportError> {
        if !transport.is_connected() && !transport.connect(self.connect_timeout_ms) {
            return Err(TransportError::ConnectTimeout);
        }
        let body = payload::encode(intent, &self.device_id)?;
        let status = transport.post(&self.path, CONTENT_TYPE, &body)?;
        if (200..300).contains(&status) {
            Ok(status)
        } else {
            Err(TransportError::NonSuccessStatus(status))
        }
    }
}
