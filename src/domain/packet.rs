// Binary transport envelope and the grenade spawn trigger carried inside it.
//
// Envelope:      [header: u8][subcategory: u8][payload..]
// Spawn payload: [b"XPL_GRN"][peer id: u64 little-endian]
//
// Custom-message subcategories are shared with unrelated features, so the payload
// starts with a fixed tag that must match exactly before anything else is read.

use crate::domain::state::PeerId;

/// Identifies a spawn trigger among other custom messages on subcategory 0.
pub const SPAWN_TAG: [u8; 7] = *b"XPL_GRN";

/// Subcategory reserved for grenade messages.
pub const GRENADE_SUBCATEGORY: u8 = 0;

const PEER_ID_LEN: usize = size_of::<PeerId>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketHeader {
    CustomMessage = 0x20,
}

impl TryFrom<u8> for PacketHeader {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x20 => Ok(PacketHeader::CustomMessage),
            other => Err(DecodeError::UnknownHeader(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the structure requires.
    InsufficientData,
    /// The payload is not tagged as a grenade spawn.
    TagMismatch,
    UnknownHeader(u8),
}

/// Borrowed view of a received envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub header: PacketHeader,
    pub subcategory: u8,
    pub payload: &'a [u8],
}

impl<'a> Envelope<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let Some((&[header, subcategory], payload)) = bytes.split_first_chunk::<2>() else {
            return Err(DecodeError::InsufficientData);
        };

        Ok(Self {
            header: PacketHeader::try_from(header)?,
            subcategory,
            payload,
        })
    }
}

/// "Peer X fired a volley." Receivers rebuild the volley from the peer's live pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnMessage {
    pub peer_id: PeerId,
}

impl SpawnMessage {
    pub const PAYLOAD_LEN: usize = SPAWN_TAG.len() + PEER_ID_LEN;

    /// Full envelope bytes ready for the transport.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + Self::PAYLOAD_LEN);
        bytes.push(PacketHeader::CustomMessage as u8);
        bytes.push(GRENADE_SUBCATEGORY);
        bytes.extend_from_slice(&SPAWN_TAG);
        bytes.extend_from_slice(&self.peer_id.to_le_bytes());
        bytes
    }

    /// Decodes an envelope payload. The tag is checked before the peer id is read.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let Some((tag, rest)) = payload.split_first_chunk::<7>() else {
            return Err(DecodeError::InsufficientData);
        };
        if *tag != SPAWN_TAG {
            return Err(DecodeError::TagMismatch);
        }

        let Some(peer_id) = rest.first_chunk::<PEER_ID_LEN>() else {
            return Err(DecodeError::InsufficientData);
        };
        Ok(Self {
            peer_id: PeerId::from_le_bytes(*peer_id),
        })
    }
}
