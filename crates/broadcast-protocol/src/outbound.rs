//! Outbound command encoding.
//!
//! The client only ever sends four commands: registration, disconnect, and
//! the two on-demand data requests. Every command after registration carries
//! the connection id handed out in the registration reply.

use crate::codec::PacketWriter;
use crate::{EncodeError, PROTOCOL_VERSION, REQ_DISCONNECT, REQ_ENTRY_ROSTER, REQ_REGISTER, REQ_TRACK_INFO};

/// Build the registration request.
///
/// `update_interval_ms` is the realtime update interval the game should use
/// for this connection, in milliseconds.
///
/// # Errors
/// Fails when a credential string exceeds its `u16` length prefix.
pub fn build_register_packet(
    display_name: &str,
    connection_password: &str,
    update_interval_ms: i32,
    command_password: &str,
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = PacketWriter::with_capacity(32);
    writer.write_u8(REQ_REGISTER);
    writer.write_u8(PROTOCOL_VERSION);
    writer.write_string(display_name)?;
    writer.write_string(connection_password)?;
    writer.write_i32(update_interval_ms);
    writer.write_string(command_password)?;
    Ok(writer.into_bytes())
}

/// Build the disconnect command for a registered connection.
pub fn build_disconnect_packet(connection_id: i32) -> Vec<u8> {
    build_id_command(REQ_DISCONNECT, connection_id)
}

/// Build the entry roster request.
pub fn build_entry_roster_request(connection_id: i32) -> Vec<u8> {
    build_id_command(REQ_ENTRY_ROSTER, connection_id)
}

/// Build the track data request.
pub fn build_track_info_request(connection_id: i32) -> Vec<u8> {
    build_id_command(REQ_TRACK_INFO, connection_id)
}

fn build_id_command(opcode: u8, connection_id: i32) -> Vec<u8> {
    let mut writer = PacketWriter::with_capacity(8);
    writer.write_u8(opcode);
    writer.write_i32(connection_id);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PacketReader;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn register_packet_layout() -> TestResult {
        let packet = build_register_packet("Pitwall", "secret", 250, "cmd")?;
        let mut reader = PacketReader::new(&packet);

        assert_eq!(reader.read_u8()?, REQ_REGISTER);
        assert_eq!(reader.read_u8()?, PROTOCOL_VERSION);
        assert_eq!(reader.read_string()?, "Pitwall");
        assert_eq!(reader.read_string()?, "secret");
        assert_eq!(reader.read_i32()?, 250);
        assert_eq!(reader.read_string()?, "cmd");
        assert_eq!(reader.remaining(), 0);
        Ok(())
    }

    #[test]
    fn id_commands_carry_opcode_and_connection_id() -> TestResult {
        for (packet, opcode) in [
            (build_disconnect_packet(42), REQ_DISCONNECT),
            (build_entry_roster_request(42), REQ_ENTRY_ROSTER),
            (build_track_info_request(42), REQ_TRACK_INFO),
        ] {
            let mut reader = PacketReader::new(&packet);
            assert_eq!(reader.read_u8()?, opcode);
            assert_eq!(reader.read_i32()?, 42);
            assert_eq!(reader.remaining(), 0);
        }
        Ok(())
    }
}
