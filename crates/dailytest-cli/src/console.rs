//! Host surfaces for a terminal.

use std::sync::Arc;

use dailytest_core::host::{Host, HostBridge, LocalSurface};

/// Stands in for the chat client's bridge. Outbound data goes to stdout as
/// `SEND <json>` so a wrapping process can pick it up line by line.
pub struct ConsoleBridge;

impl HostBridge for ConsoleBridge {
    fn ready(&self) {
        tracing::debug!("bridge ready");
    }

    fn expand(&self) {
        tracing::debug!("bridge expand");
    }

    fn enable_closing_confirmation(&self) {
        tracing::debug!("bridge closing confirmation enabled");
    }

    fn send_data(&self, data: &str) {
        println!("SEND {data}");
    }

    fn show_alert(&self, message: &str) {
        println!("ALERT {message}");
    }

    fn close(&self) {
        println!("CLOSE");
    }
}

pub struct ConsoleSurface;

impl LocalSurface for ConsoleSurface {
    fn alert(&self, message: &str) {
        println!("\n{message}");
    }

    fn close(&self) {
        println!("Goodbye.");
    }
}

pub fn host(embedded: bool) -> Host {
    if embedded {
        Host::embedded(Arc::new(ConsoleBridge), Arc::new(ConsoleSurface))
    } else {
        Host::standalone(Arc::new(ConsoleSurface))
    }
}
