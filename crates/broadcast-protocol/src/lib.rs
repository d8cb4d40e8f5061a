//! Assetto Corsa Competizione UDP broadcasting protocol (version 4).
//!
//! The broadcasting interface is a little-endian binary protocol: a client
//! registers with the game over UDP and receives a stream of datagrams, each
//! starting with a one-byte message type. This crate provides the cursor
//! codec ([`codec`]), the typed inbound packet model with its dispatch entry
//! point ([`inbound::decode_packet`]), and the outbound command builders
//! ([`outbound`]).
//!
//! Decoding is strict about length (a datagram shorter than its layout is a
//! [`DecodeError`] and must be discarded whole) but deliberately lenient
//! about string content: the game is known to append undecodable bytes to
//! non-ASCII driver names, so string fields keep their valid UTF-8 chunks
//! and drop the rest.

use thiserror::Error;

pub mod codec;
pub mod enums;
pub mod inbound;
pub mod outbound;

pub use codec::{PacketReader, PacketWriter};
pub use enums::{
    CarLocation, CupCategory, DriverCategory, LapKind, Nationality, SessionPhase, SessionType,
};
pub use inbound::{
    CarEntry, CarUpdate, DriverInfo, EntryRoster, InboundPacket, LapInfo, RegistrationReply,
    SessionUpdate, TrackInfo, decode_packet,
};

/// Protocol version sent with the registration request.
pub const PROTOCOL_VERSION: u8 = 4;

/// Inbound message types (first byte of every datagram from the game).
pub const MSG_REGISTRATION_REPLY: u8 = 1;
pub const MSG_SESSION_UPDATE: u8 = 2;
pub const MSG_CAR_UPDATE: u8 = 3;
pub const MSG_ENTRY_ROSTER: u8 = 4;
pub const MSG_TRACK_INFO: u8 = 5;
pub const MSG_ROSTER_CAR: u8 = 6;
pub const MSG_BROADCASTING_EVENT: u8 = 7;

/// Outbound command opcodes.
pub const REQ_REGISTER: u8 = 1;
pub const REQ_DISCONNECT: u8 = 9;
pub const REQ_ENTRY_ROSTER: u8 = 10;
pub const REQ_TRACK_INFO: u8 = 11;

/// Lap times and splits carry this value when no time is available.
pub const LAP_TIME_SENTINEL: i32 = i32::MAX;

/// Failure to decode one inbound datagram.
///
/// A decode error invalidates only the datagram it came from; the connection
/// and any state built from previous datagrams stay intact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("datagram too short: need {needed} byte(s) at offset {offset}, {remaining} left")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("unknown session type `{0}`")]
    UnknownSessionType(u8),
    #[error("unknown session phase `{0}`")]
    UnknownSessionPhase(u8),
    #[error("unknown car location `{0}`")]
    UnknownCarLocation(u8),
    #[error("unknown driver category `{0}`")]
    UnknownDriverCategory(u8),
    #[error("unknown cup category `{0}`")]
    UnknownCupCategory(u8),
    #[error("unknown nationality `{0}`")]
    UnknownNationality(u16),
}

/// Failure to encode an outbound command or packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("string exceeds u16 length prefix: {0} bytes")]
    StringTooLong(usize),
    #[error("sequence exceeds u8 length prefix: {0} items")]
    SequenceTooLong(usize),
}
