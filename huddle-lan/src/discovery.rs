//! LAN discovery: UDP multicast beacons advertise the service; received
//! beacons surface candidate peers to the session driver.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use crate::config::Config;
use crate::session::Flags;
use crate::wire::{decode_frame, encode_frame, LanMessage, PROTOCOL_VERSION};

const MULTICAST_GROUP: &str = "239.255.71.71";
const BEACON_INTERVAL: Duration = Duration::from_secs(4);

/// A peer sighted on the multicast group.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub instance: Uuid,
    pub addr: SocketAddr,
    pub display_name: String,
}

/// Beacon while advertising; forward every matching sighting to the session
/// driver, which dedups and decides whether to dial.
pub async fn run_discovery(
    cfg: Config,
    instance: Uuid,
    flags: Arc<Flags>,
    candidate_tx: mpsc::UnboundedSender<Candidate>,
) -> std::io::Result<()> {
    let socket = Arc::new(make_multicast_socket(cfg.discovery_port)?);

    let beacon = LanMessage::Beacon {
        protocol_version: PROTOCOL_VERSION,
        instance,
        service: cfg.service.clone(),
        display_name: cfg.display_name.clone(),
        session_port: cfg.session_port,
    };
    let frame = encode_frame(&beacon)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let dest: SocketAddr = format!("{}:{}", MULTICAST_GROUP, cfg.discovery_port)
        .parse()
        .map_err(|e: std::net::AddrParseError| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
        })?;

    let send_socket = socket.clone();
    let beacon_flags = flags.clone();
    tokio::spawn(async move {
        loop {
            if beacon_flags.advertising.load(Ordering::Relaxed) {
                let _ = send_socket.send_to(&frame, dest).await;
            }
            tokio::time::sleep(BEACON_INTERVAL).await;
        }
    });

    recv_loop(socket, instance, cfg.service, candidate_tx).await
}

fn make_multicast_socket(discovery_port: u16) -> std::io::Result<UdpSocket> {
    let std_sock = std::net::UdpSocket::bind(("0.0.0.0", discovery_port))?;
    let multicast: std::net::Ipv4Addr =
        MULTICAST_GROUP
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
            })?;
    std_sock.join_multicast_v4(&multicast, &std::net::Ipv4Addr::UNSPECIFIED)?;
    std_sock.set_multicast_ttl_v4(1)?;
    std_sock.set_nonblocking(true)?;
    UdpSocket::from_std(std_sock)
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    my_instance: Uuid,
    my_service: String,
    candidate_tx: mpsc::UnboundedSender<Candidate>,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; 65536];
    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;
        let Ok((msg, _)) = decode_frame(&buf[..n]) else {
            continue;
        };
        let LanMessage::Beacon {
            protocol_version,
            instance,
            service,
            display_name,
            session_port,
        } = msg
        else {
            continue;
        };
        if protocol_version != PROTOCOL_VERSION || instance == my_instance {
            continue;
        }
        if service != my_service {
            continue;
        }
        let candidate = Candidate {
            instance,
            addr: SocketAddr::new(from.ip(), session_port),
            display_name,
        };
        trace!(instance = %candidate.instance, addr = %candidate.addr, "beacon sighted");
        if candidate_tx.send(candidate).is_err() {
            // Driver gone; nothing left to report to.
            return Ok(());
        }
    }
}
