//! LAN wire protocol: message types and length-prefix bincode framing.
//! This is the native transport's own format, below the session layer;
//! payloads inside `Data` stay opaque all the way up.

use huddle_core::DeliveryMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current LAN protocol version. Carried in beacons and hellos.
pub const PROTOCOL_VERSION: u8 = 1;

/// Length-prefix size in bytes.
pub const LEN_SIZE: usize = 4;
/// Upper bound on a single frame body.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024; // 16 MiB

/// All LAN message types. Encoding is bincode; framing is length-prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LanMessage {
    /// Discovery: advertise presence on the multicast group.
    Beacon {
        protocol_version: u8,
        instance: Uuid,
        service: String,
        display_name: String,
        session_port: u16,
    },
    /// Session handshake, first frame on a fresh TCP connection.
    Hello {
        protocol_version: u8,
        instance: Uuid,
        display_name: String,
    },
    /// Application payload with its delivery-mode tag preserved.
    Data {
        mode: DeliveryMode,
        payload: Vec<u8>,
    },
    /// Graceful leave.
    Bye,
}

/// Encode a message into a single frame: 4 bytes LE length + bincode payload.
pub fn encode_frame(msg: &LanMessage) -> Result<Vec<u8>, FrameEncodeError> {
    let payload = bincode::serialize(msg).map_err(FrameEncodeError::Encode)?;
    let len = payload.len() as u32;
    if len > MAX_FRAME_LEN {
        return Err(FrameEncodeError::TooLarge);
    }
    let mut out = Vec::with_capacity(LEN_SIZE + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Error encoding a message into a frame (bincode or size limit).
#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("frame too large")]
    TooLarge,
}

/// Decode one frame from the front of `bytes`. Returns the message and the
/// number of bytes consumed. Returns `NeedMore` on a partial buffer.
pub fn decode_frame(bytes: &[u8]) -> Result<(LanMessage, usize), FrameDecodeError> {
    if bytes.len() < LEN_SIZE {
        return Err(FrameDecodeError::NeedMore);
    }
    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if len > MAX_FRAME_LEN as usize {
        return Err(FrameDecodeError::TooLarge);
    }
    if bytes.len() < LEN_SIZE + len {
        return Err(FrameDecodeError::NeedMore);
    }
    let msg: LanMessage =
        bincode::deserialize(&bytes[LEN_SIZE..LEN_SIZE + len]).map_err(FrameDecodeError::Decode)?;
    Ok((msg, LEN_SIZE + len))
}

/// Decode a frame body after the length prefix has already been consumed
/// (stream reads pull the prefix separately).
pub fn decode_body(bytes: &[u8]) -> Result<LanMessage, FrameDecodeError> {
    bincode::deserialize(bytes).map_err(FrameDecodeError::Decode)
}

/// Error decoding a frame (need more bytes, too large, or bincode failure).
#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("need more bytes")]
    NeedMore,
    #[error("frame too large")]
    TooLarge,
    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),
}
