//! HTTPS alert transport over Wi-Fi station mode.
//!
//! Implements [`AlertTransport`] for the dispatcher: bring the link up with
//! a timeout, then `POST` one JSON body and hand back the status code.
//! After a failed connect the station is left alone for
//! `wifi_retry_interval_ms`; connects inside that window fail immediately.
//!
//! ## Dual-target design
//!
//! - **`target_os = "espidf"`** drives a `BlockingWifi` station and opens
//!   one `EspHttpConnection` per request (TLS via the built-in certificate
//!   bundle).  Nothing is kept open across sleeps.
//! - **host** simulates the link and the server through static atomics so
//!   simulations and tests can script outages and non-2xx answers.

use log::{info, warn};

use crate::adapters::time::SystemClock;
use crate::app::ports::{AlertTransport, ClockPort};
use crate::config::SystemConfig;
use crate::error::TransportError;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

/// Longest URI we build (`https://` + host + `:port` + path).
pub type UriString = heapless::String<160>;

// ───────────────────────────────────────────────────────────────
// Simulation injection (host only)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_LINK_AVAILABLE: AtomicBool = AtomicBool::new(true);
#[cfg(not(target_os = "espidf"))]
static SIM_STATUS: AtomicU16 = AtomicU16::new(200);
#[cfg(not(target_os = "espidf"))]
static SIM_POSTS: AtomicU32 = AtomicU32::new(0);

/// Whether simulated `connect()` calls succeed.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_link_available(available: bool) {
    SIM_LINK_AVAILABLE.store(available, Ordering::Relaxed);
}

/// Status code the simulated server answers with.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_status(status: u16) {
    SIM_STATUS.store(status, Ordering::Relaxed);
}

/// Requests that reached the simulated server.
#[cfg(not(target_os = "espidf"))]
pub fn sim_post_count() -> u32 {
    SIM_POSTS.load(Ordering::Relaxed)
}

// ───────────────────────────────────────────────────────────────
// Reconnect back-off
// ───────────────────────────────────────────────────────────────

/// Spacing between Wi-Fi connect attempts after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBackoff {
    interval_ms: u64,
    last_failure_at: Option<u64>,
}

impl ReconnectBackoff {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            last_failure_at: None,
        }
    }

    /// Milliseconds until the next connect may be tried (0 = now).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_failure_at {
            Some(t) => self.interval_ms.saturating_sub(now_ms.saturating_sub(t)),
            None => 0,
        }
    }

    pub fn record_failure(&mut self, now_ms: u64) {
        self.last_failure_at = Some(now_ms);
    }

    pub fn reset(&mut self) {
        self.last_failure_at = None;
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct HttpAlertTransport {
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    connected: bool,
    scheme_host: UriString,
    request_timeout_ms: u32,
    clock: SystemClock,
    backoff: ReconnectBackoff,
}

/// `https://host` or `https://host:port` when the port is not 443.
pub fn base_uri(host: &str, port: u16) -> Result<UriString, TransportError> {
    use core::fmt::Write;
    let mut uri = UriString::new();
    let written = if port == 443 {
        write!(uri, "https://{host}")
    } else {
        write!(uri, "https://{host}:{port}")
    };
    written.map_err(|_| TransportError::PayloadEncoding)?;
    Ok(uri)
}

impl HttpAlertTransport {
    /// Wrap a started (not yet connected) Wi-Fi station.
    #[cfg(target_os = "espidf")]
    pub fn new(
        wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
        config: &SystemConfig,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            wifi,
            scheme_host: base_uri(&config.alert_host, config.alert_port)?,
            request_timeout_ms: config.connect_timeout_ms,
            clock: SystemClock::new(),
            backoff: ReconnectBackoff::new(config.wifi_retry_interval_ms),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: &SystemConfig) -> Result<Self, TransportError> {
        Ok(Self {
            connected: false,
            scheme_host: base_uri(&config.alert_host, config.alert_port)?,
            request_timeout_ms: config.connect_timeout_ms,
            clock: SystemClock::new(),
            backoff: ReconnectBackoff::new(config.wifi_retry_interval_ms),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.scheme_host
    }

    pub fn request_timeout_ms(&self) -> u32 {
        self.request_timeout_ms
    }

    pub fn backoff(&self) -> &ReconnectBackoff {
        &self.backoff
    }

    fn uri_for(&self, path: &str) -> Result<UriString, TransportError> {
        let mut uri = self.scheme_host.clone();
        uri.push_str(path).map_err(|_| TransportError::PayloadEncoding)?;
        Ok(uri)
    }

    // ── Platform: link ────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.connected && SIM_LINK_AVAILABLE.load(Ordering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_ms: u32) -> bool {
        use core::time::Duration;

        if let Err(e) = self.wifi.wifi_mut().connect() {
            warn!("HTTP: Wi-Fi connect request failed: {}", e);
            return false;
        }
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        let wifi = &self.wifi;
        match wifi.ip_wait_while(|| wifi.is_up().map(|up| !up), Some(timeout)) {
            Ok(()) => true,
            Err(e) => {
                warn!("HTTP: network not up within {}ms: {}", timeout_ms, e);
                let _ = self.wifi.disconnect();
                false
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, timeout_ms: u32) -> bool {
        self.connected = SIM_LINK_AVAILABLE.load(Ordering::Relaxed);
        if !self.connected {
            warn!("HTTP(sim): link unavailable, gave up after {}ms", timeout_ms);
        }
        self.connected
    }

    // ── Platform: request ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_post(
        &mut self,
        uri: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<u16, TransportError> {
        use core::time::Duration;
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::Write;

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(Duration::from_millis(u64::from(self.request_timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|_| TransportError::NotConnected)?;

        let mut len = heapless::String::<10>::new();
        {
            use core::fmt::Write as _;
            write!(len, "{}", body.len()).map_err(|_| TransportError::PayloadEncoding)?;
        }
        let headers = [("Content-Type", content_type), ("Content-Length", len.as_str())];

        conn.initiate_request(Method::Post, uri, &headers)
            .map_err(|_| TransportError::SendTimeout)?;
        conn.write_all(body).map_err(|_| TransportError::SendTimeout)?;
        conn.initiate_response().map_err(|_| TransportError::SendTimeout)?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(
        &mut self,
        uri: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<u16, TransportError> {
        if !self.platform_is_connected() {
            self.connected = false;
            return Err(TransportError::SendTimeout);
        }
        SIM_POSTS.fetch_add(1, Ordering::Relaxed);
        info!(
            "HTTP(sim): POST {} [{}] {}",
            uri,
            content_type,
            core::str::from_utf8(body).unwrap_or("<binary>"),
        );
        Ok(SIM_STATUS.load(Ordering::Relaxed))
    }
}

// ───────────────────────────────────────────────────────────────
// AlertTransport
// ───────────────────────────────────────────────────────────────

impl AlertTransport for HttpAlertTransport {
    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn connect(&mut self, timeout_ms: u32) -> bool {
        let now_ms = self.clock.now_ms();
        let wait_ms = self.backoff.remaining_ms(now_ms);
        if wait_ms > 0 {
            info!("HTTP: reconnect backing off, {}ms left", wait_ms);
            return false;
        }
        info!("HTTP: connecting (timeout {}ms)", timeout_ms);
        let up = self.platform_connect(timeout_ms);
        if up {
            self.backoff.reset();
            info!("HTTP: link up");
        } else {
            self.backoff.record_failure(self.clock.now_ms());
        }
        up
    }

    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<u16, TransportError> {
        if !self.platform_is_connected() {
            return Err(TransportError::NotConnected);
        }
        let uri = self.uri_for(path)?;
        let status = self.platform_post(&uri, content_type, body)?;
        if !(200..300).contains(&status) {
            warn!("HTTP: {} answered {}", uri, status);
        }
        Ok(status)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
