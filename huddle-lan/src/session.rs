//! LAN session driver: TCP sessions with a Hello handshake, command intake
//! from the session layer, and event emission back to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use huddle_core::{DeliveryMode, DiscoveryBackend, PeerId, TransportEvent};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::discovery::{self, Candidate};
use crate::wire::{decode_body, encode_frame, LanMessage, LEN_SIZE, MAX_FRAME_LEN, PROTOCOL_VERSION};

/// Shared on/off switches the session layer toggles through commands.
#[derive(Debug, Default)]
pub struct Flags {
    pub advertising: AtomicBool,
    pub browsing: AtomicBool,
}

/// Command queued by [`LanBackend`] toward the network driver.
#[derive(Debug)]
pub enum Command {
    StartAdvertising,
    StopAdvertising,
    Browse,
    Send { payload: Vec<u8>, mode: DeliveryMode },
    Disconnect,
}

/// `DiscoveryBackend` over an unbounded command queue: every call returns
/// immediately, outcomes come back later as `TransportEvent`s.
pub struct LanBackend {
    tx: mpsc::UnboundedSender<Command>,
}

impl LanBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DiscoveryBackend for LanBackend {
    fn start_advertising(&mut self) {
        let _ = self.tx.send(Command::StartAdvertising);
    }

    fn stop_advertising(&mut self) {
        let _ = self.tx.send(Command::StopAdvertising);
    }

    fn open_peer_picker(&mut self) {
        let _ = self.tx.send(Command::Browse);
    }

    fn send(&mut self, payload: &[u8], mode: DeliveryMode) {
        let _ = self.tx.send(Command::Send {
            payload: payload.to_vec(),
            mode,
        });
    }

    fn disconnect(&mut self) {
        let _ = self.tx.send(Command::Disconnect);
    }
}

type PeerSenders = Arc<Mutex<HashMap<Uuid, mpsc::UnboundedSender<LanMessage>>>>;

/// Run the LAN driver: multicast discovery, TCP listener, outbound dials,
/// command intake. Failures surface as events, never as panics.
pub async fn run_driver(
    cfg: Config,
    instance: Uuid,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let flags = Arc::new(Flags::default());
    let peer_senders: PeerSenders = Arc::new(Mutex::new(HashMap::new()));
    let (candidate_tx, mut candidate_rx) = mpsc::unbounded_channel();

    let disc_cfg = cfg.clone();
    let disc_flags = flags.clone();
    let disc_events = event_tx.clone();
    tokio::spawn(async move {
        if let Err(e) =
            discovery::run_discovery(disc_cfg, instance, disc_flags, candidate_tx).await
        {
            let _ = disc_events.send(TransportEvent::AdvertisingFailed {
                reason: e.to_string(),
            });
        }
    });

    let listener = match TcpListener::bind(("0.0.0.0", cfg.session_port)).await {
        Ok(l) => l,
        Err(e) => {
            let _ = event_tx.send(TransportEvent::SessionFailed {
                reason: e.to_string(),
            });
            return;
        }
    };
    let accept_senders = peer_senders.clone();
    let accept_events = event_tx.clone();
    let accept_name = cfg.display_name.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut stream, _)) => {
                    let senders = accept_senders.clone();
                    let events = accept_events.clone();
                    let name = accept_name.clone();
                    tokio::spawn(async move {
                        if let Ok((remote, remote_name)) =
                            handshake_accept(&mut stream, instance, &name).await
                        {
                            run_connection(stream, remote, remote_name, senders, events).await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    // Candidates sighted before the picker opens, replayed on Browse.
    let mut known: HashMap<Uuid, Candidate> = HashMap::new();
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    Command::StartAdvertising => flags.advertising.store(true, Ordering::Relaxed),
                    Command::StopAdvertising => flags.advertising.store(false, Ordering::Relaxed),
                    Command::Browse => {
                        flags.browsing.store(true, Ordering::Relaxed);
                        let replay: Vec<Candidate> = known.values().cloned().collect();
                        for candidate in replay {
                            dial(candidate, instance, &cfg, peer_senders.clone(), event_tx.clone()).await;
                        }
                    }
                    Command::Send { payload, mode } => {
                        let msg = LanMessage::Data { mode, payload };
                        let senders = peer_senders.lock().await;
                        for tx in senders.values() {
                            let _ = tx.send(msg.clone());
                        }
                    }
                    Command::Disconnect => {
                        flags.advertising.store(false, Ordering::Relaxed);
                        flags.browsing.store(false, Ordering::Relaxed);
                        let mut senders = peer_senders.lock().await;
                        for tx in senders.values() {
                            let _ = tx.send(LanMessage::Bye);
                        }
                        senders.clear();
                    }
                }
            }
            candidate = candidate_rx.recv() => {
                let Some(candidate) = candidate else { break };
                known.insert(candidate.instance, candidate.clone());
                if flags.browsing.load(Ordering::Relaxed) {
                    dial(candidate, instance, &cfg, peer_senders.clone(), event_tx.clone()).await;
                }
            }
        }
    }
}

/// Connect out to a sighted peer unless a session already exists. A crossed
/// dial from both sides just replaces the writer entry.
async fn dial(
    candidate: Candidate,
    instance: Uuid,
    cfg: &Config,
    peer_senders: PeerSenders,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    {
        let senders = peer_senders.lock().await;
        if senders.contains_key(&candidate.instance) {
            return;
        }
    }
    let name = cfg.display_name.clone();
    tokio::spawn(async move {
        match TcpStream::connect(candidate.addr).await {
            Ok(mut stream) => {
                if let Ok((remote, remote_name)) =
                    handshake_connect(&mut stream, instance, &name).await
                {
                    run_connection(stream, remote, remote_name, peer_senders, event_tx).await;
                }
            }
            Err(e) => trace!(addr = %candidate.addr, error = %e, "dial failed"),
        }
    });
}

async fn handshake_accept(
    stream: &mut TcpStream,
    instance: Uuid,
    display_name: &str,
) -> std::io::Result<(Uuid, String)> {
    let remote = read_hello(stream).await?;
    write_hello(stream, instance, display_name).await?;
    Ok(remote)
}

async fn handshake_connect(
    stream: &mut TcpStream,
    instance: Uuid,
    display_name: &str,
) -> std::io::Result<(Uuid, String)> {
    write_hello(stream, instance, display_name).await?;
    read_hello(stream).await
}

async fn write_hello(
    stream: &mut TcpStream,
    instance: Uuid,
    display_name: &str,
) -> std::io::Result<()> {
    let hello = LanMessage::Hello {
        protocol_version: PROTOCOL_VERSION,
        instance,
        display_name: display_name.to_string(),
    };
    let frame = encode_frame(&hello)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    stream.write_all(&frame).await?;
    stream.flush().await
}

async fn read_hello(stream: &mut TcpStream) -> std::io::Result<(Uuid, String)> {
    let body = read_frame_body(stream).await?;
    match decode_body(&body) {
        Ok(LanMessage::Hello {
            protocol_version,
            instance,
            display_name,
        }) => {
            if protocol_version != PROTOCOL_VERSION {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "unsupported protocol version",
                ));
            }
            Ok((instance, display_name))
        }
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "expected hello",
        )),
    }
}

async fn read_frame_body<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut len_buf = [0u8; LEN_SIZE];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "frame too large",
        ));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

async fn run_connection(
    stream: TcpStream,
    remote: Uuid,
    remote_name: String,
    peer_senders: PeerSenders,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let peer = PeerId::new(remote.to_string());
    let (tx, mut rx) = mpsc::unbounded_channel::<LanMessage>();
    {
        let mut senders = peer_senders.lock().await;
        senders.insert(remote, tx.clone());
    }
    debug!(%peer, name = %remote_name, "peer session up");
    let _ = event_tx.send(TransportEvent::PeerConnected {
        peer: peer.clone(),
        display_name: remote_name,
    });

    let (mut reader, mut writer) = stream.into_split();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let leaving = matches!(msg, LanMessage::Bye);
            if let Ok(frame) = encode_frame(&msg) {
                let _ = writer.write_all(&frame).await;
                let _ = writer.flush().await;
            }
            if leaving {
                break;
            }
        }
        // Half-close once the writer is done (Bye sent, or this session's
        // entry was replaced) so the remote's read loop ends promptly.
        let _ = writer.shutdown().await;
    });

    loop {
        let body = match read_frame_body(&mut reader).await {
            Ok(b) => b,
            Err(_) => break,
        };
        match decode_body(&body) {
            Ok(LanMessage::Data { payload, .. }) => {
                let _ = event_tx.send(TransportEvent::DataReceived {
                    peer: peer.clone(),
                    payload,
                });
            }
            Ok(LanMessage::Bye) => break,
            Ok(other) => trace!(?other, "unexpected message on session stream"),
            Err(e) => {
                warn!(error = %e, "undecodable frame, closing session");
                break;
            }
        }
    }

    // A crossed dial replaces this session's writer entry with the newer
    // connection's; only the current holder may evict it and report the
    // disconnect. A superseded session exits silently.
    let mut senders = peer_senders.lock().await;
    let current = senders
        .get(&remote)
        .map(|s| s.same_channel(&tx))
        .unwrap_or(false);
    if current {
        senders.remove(&remote);
    }
    drop(senders);
    if current {
        let _ = event_tx.send(TransportEvent::PeerDisconnected { peer });
    } else {
        trace!(%peer, "superseded session closed");
    }
}
