// Huddle LAN host: multicast discovery + TCP sessions behind the session layer.

mod config;
mod discovery;
mod session;
mod wire;

use std::time::Duration;

use huddle_core::{
    Connectivity, ConnectionState, ConnectivityObserver, DeliveryMode, LocalDiscoveryAdapter,
    SessionLink,
};
use tracing::{info, warn};
use uuid::Uuid;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Demo observer: logs state changes and prints inbound payloads.
struct LogObserver;

impl ConnectivityObserver for LogObserver {
    fn on_state_changed(&mut self, state: ConnectionState) {
        info!(?state, "session state");
    }

    fn on_data_received(&mut self, link: &mut SessionLink<'_>, payload: &[u8]) {
        match std::str::from_utf8(payload) {
            Ok(text) => info!(peers = link.peers().len(), %text, "received"),
            Err(_) => info!(len = payload.len(), "received binary payload"),
        }
    }

    fn on_transport_failure(&mut self, reason: &str) {
        warn!(%reason, "transport failure");
    }
}

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("huddle-lan {}", VERSION);
            return Ok(());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load();
    let instance = Uuid::new_v4();
    info!(%instance, service = %cfg.service, "starting huddle-lan");

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let (backend, cmd_rx) = session::LanBackend::new();

    let mut net = Connectivity::new();
    net.configure(Box::new(LogObserver));
    net.start_session(Box::new(LocalDiscoveryAdapter::new(Box::new(backend))))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        tokio::spawn(session::run_driver(cfg.clone(), instance, cmd_rx, event_tx));
        net.start_advertising();
        net.request_peers()?;

        let mut greet = tokio::time::interval(Duration::from_secs(10));
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    net.deliver(event);
                }
                _ = greet.tick() => {
                    if net.current_state() == ConnectionState::Connected {
                        let hello = format!("hello from {}", cfg.display_name);
                        let _ = net.send(hello.as_bytes(), DeliveryMode::Unreliable);
                    }
                }
                result = &mut shutdown => {
                    result?;
                    break;
                }
            }
        }
        net.teardown();
        Ok::<_, anyhow::Error>(())
    })?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
