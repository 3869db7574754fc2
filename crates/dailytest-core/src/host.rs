//! The embedding platform's capability surface.
//!
//! The bridge is optional: outside the chat client there is nothing to send
//! data to, so [`Host`] falls back to a [`LocalSurface`] for alerts and
//! closing, and drops outbound data with a warning.

use std::sync::{Arc, Mutex};

/// Capabilities exposed by the host messaging platform.
pub trait HostBridge: Send + Sync {
    fn ready(&self);
    fn expand(&self);
    fn enable_closing_confirmation(&self);
    /// Deliver a JSON payload to the bot behind the mini-app.
    fn send_data(&self, data: &str);
    fn show_alert(&self, message: &str);
    fn close(&self);
}

/// What the app can do on its own when no bridge is present.
pub trait LocalSurface: Send + Sync {
    fn alert(&self, message: &str);
    fn close(&self);
}

/// Local surface that only logs.
pub struct LogSurface;

impl LocalSurface for LogSurface {
    fn alert(&self, message: &str) {
        tracing::info!(alert = message, "local alert");
    }

    fn close(&self) {
        tracing::info!("local surface closed");
    }
}

/// Host capabilities with an explicit presence check on the bridge.
#[derive(Clone)]
pub struct Host {
    bridge: Option<Arc<dyn HostBridge>>,
    local: Arc<dyn LocalSurface>,
}

impl Host {
    pub fn embedded(bridge: Arc<dyn HostBridge>, local: Arc<dyn LocalSurface>) -> Self {
        Self {
            bridge: Some(bridge),
            local,
        }
    }

    pub fn standalone(local: Arc<dyn LocalSurface>) -> Self {
        Self {
            bridge: None,
            local,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.bridge.is_some()
    }

    /// Startup handshake: ready, expand, and ask for close confirmation.
    pub fn init(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.ready();
            bridge.expand();
            bridge.enable_closing_confirmation();
        } else {
            tracing::debug!("no host bridge, running standalone");
        }
    }

    pub fn alert(&self, message: &str) {
        match &self.bridge {
            Some(bridge) => bridge.show_alert(message),
            None => self.local.alert(message),
        }
    }

    /// Send a payload to the host. Returns `false` when there is no bridge.
    pub fn send_data(&self, data: &str) -> bool {
        match &self.bridge {
            Some(bridge) => {
                bridge.send_data(data);
                true
            }
            None => {
                tracing::warn!("host bridge not available, cannot send data");
                false
            }
        }
    }

    pub fn close(&self) {
        match &self.bridge {
            Some(bridge) => bridge.close(),
            None => self.local.close(),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::standalone(Arc::new(LogSurface))
    }
}

/// A bridge call captured by [`RecordingBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Ready,
    Expand,
    EnableClosingConfirmation,
    SendData(String),
    ShowAlert(String),
    Close,
}

/// In-memory bridge for tests.
#[derive(Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<BridgeCall>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Every payload passed to `send_data`, in order.
    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BridgeCall::SendData(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BridgeCall::ShowAlert(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BridgeCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl HostBridge for RecordingBridge {
    fn ready(&self) {
        self.record(BridgeCall::Ready);
    }

    fn expand(&self) {
        self.record(BridgeCall::Expand);
    }

    fn enable_closing_confirmation(&self) {
        self.record(BridgeCall::EnableClosingConfirmation);
    }

    fn send_data(&self, data: &str) {
        self.record(BridgeCall::SendData(data.to_string()));
    }

    fn show_alert(&self, message: &str) {
        self.record(BridgeCall::ShowAlert(message.to_string()));
    }

    fn close(&self) {
        self.record(BridgeCall::Close);
    }
}
