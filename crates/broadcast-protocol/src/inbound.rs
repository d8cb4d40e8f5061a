//! Typed inbound packet model and the opcode dispatch entry point.
//!
//! Every datagram from the game starts with a one-byte message type followed
//! by a fixed field layout; nested records (laps inside a car update,
//! drivers inside a roster car) are decoded by threading the same cursor
//! through each record's reader in wire order.
//!
//! Each packet also has an `encode` counterpart mirroring its reader field
//! for field. Production code only sends the small command set in
//! [`crate::outbound`]; the builders here exist so hosts and tests can
//! fabricate game traffic without a live server.

use std::collections::HashMap;

use crate::codec::{PacketReader, PacketWriter};
use crate::enums::{
    CarLocation, CupCategory, DriverCategory, LapKind, Nationality, SessionPhase, SessionType,
};
use crate::{
    DecodeError, EncodeError, LAP_TIME_SENTINEL, MSG_BROADCASTING_EVENT, MSG_CAR_UPDATE,
    MSG_ENTRY_ROSTER, MSG_REGISTRATION_REPLY, MSG_ROSTER_CAR, MSG_SESSION_UPDATE, MSG_TRACK_INFO,
};

/// One decoded inbound datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPacket {
    RegistrationReply(RegistrationReply),
    SessionUpdate(SessionUpdate),
    CarUpdate(CarUpdate),
    EntryRoster(EntryRoster),
    TrackInfo(TrackInfo),
    RosterCar(CarEntry),
    /// Broadcasting events are validated for layout but carry no state the
    /// leaderboard needs; the payload is dropped.
    BroadcastingEvent,
    /// Message types outside the fixed opcode set are ignored, not errors.
    Unknown(u8),
}

/// Decode one datagram into its typed packet.
///
/// # Errors
/// Returns a [`DecodeError`] when the datagram is shorter than its layout
/// requires or carries an out-of-range enum discriminant. The error applies
/// to this datagram only.
pub fn decode_packet(data: &[u8]) -> Result<InboundPacket, DecodeError> {
    let mut reader = PacketReader::new(data);
    let message_type = reader.read_u8()?;

    let packet = match message_type {
        MSG_REGISTRATION_REPLY => {
            InboundPacket::RegistrationReply(RegistrationReply::read(&mut reader)?)
        }
        MSG_SESSION_UPDATE => InboundPacket::SessionUpdate(SessionUpdate::read(&mut reader)?),
        MSG_CAR_UPDATE => InboundPacket::CarUpdate(CarUpdate::read(&mut reader)?),
        MSG_ENTRY_ROSTER => InboundPacket::EntryRoster(EntryRoster::read(&mut reader)?),
        MSG_TRACK_INFO => InboundPacket::TrackInfo(TrackInfo::read(&mut reader)?),
        MSG_ROSTER_CAR => InboundPacket::RosterCar(CarEntry::read(&mut reader)?),
        MSG_BROADCASTING_EVENT => {
            read_broadcasting_event(&mut reader)?;
            InboundPacket::BroadcastingEvent
        }
        other => InboundPacket::Unknown(other),
    };

    Ok(packet)
}

/// Reply to a registration request (message type 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationReply {
    pub connection_id: i32,
    pub succeeded: bool,
    pub read_only: bool,
    pub message: String,
}

impl RegistrationReply {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            connection_id: reader.read_i32()?,
            succeeded: reader.read_bool()?,
            read_only: reader.read_bool()?,
            message: reader.read_string()?,
        })
    }

    /// Encode as a full datagram, message type included.
    ///
    /// # Errors
    /// Fails when a string field exceeds its `u16` length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = PacketWriter::with_capacity(16);
        writer.write_u8(MSG_REGISTRATION_REPLY);
        writer.write_i32(self.connection_id);
        writer.write_bool(self.succeeded);
        writer.write_bool(self.read_only);
        writer.write_string(&self.message)?;
        Ok(writer.into_bytes())
    }
}

/// One lap record: total time, per-split times, and validity flags.
///
/// The game reports unavailable times as `i32::MAX`; those are normalized to
/// `0` at decode time, for the lap time and each split independently.
#[derive(Debug, Clone, PartialEq)]
pub struct LapInfo {
    pub lap_time_ms: u32,
    pub car_index: u16,
    pub driver_index: u16,
    pub splits: Vec<i32>,
    pub invalid: bool,
    pub valid_for_best: bool,
    pub kind: LapKind,
}

impl LapInfo {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        let lap_time_ms = reader.read_u32()?;
        let car_index = reader.read_u16()?;
        let driver_index = reader.read_u16()?;

        let split_count = usize::from(reader.read_u8()?);
        let mut splits = Vec::with_capacity(split_count);
        for _ in 0..split_count {
            splits.push(reader.read_i32()?);
        }

        let invalid = reader.read_bool()?;
        let valid_for_best = reader.read_bool()?;
        let is_out_lap = reader.read_bool()?;
        let is_in_lap = reader.read_bool()?;

        let kind = if is_out_lap {
            LapKind::OutLap
        } else if is_in_lap {
            LapKind::InLap
        } else {
            LapKind::Regular
        };

        for split in &mut splits {
            if *split == LAP_TIME_SENTINEL {
                *split = 0;
            }
        }
        let lap_time_ms = if lap_time_ms == LAP_TIME_SENTINEL as u32 {
            0
        } else {
            lap_time_ms
        };

        Ok(Self {
            lap_time_ms,
            car_index,
            driver_index,
            splits,
            invalid,
            valid_for_best,
            kind,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> Result<(), EncodeError> {
        writer.write_u32(self.lap_time_ms);
        writer.write_u16(self.car_index);
        writer.write_u16(self.driver_index);
        let count = u8::try_from(self.splits.len())
            .map_err(|_| EncodeError::SequenceTooLong(self.splits.len()))?;
        writer.write_u8(count);
        for split in &self.splits {
            writer.write_i32(*split);
        }
        writer.write_bool(self.invalid);
        writer.write_bool(self.valid_for_best);
        writer.write_bool(self.kind == LapKind::OutLap);
        writer.write_bool(self.kind == LapKind::InLap);
        Ok(())
    }
}

/// Replay clocks, present only while the game is replaying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayClocks {
    pub session_time_ms: f32,
    pub remaining_time_ms: f32,
}

/// Session-wide state broadcast at the realtime update rate (message type 2).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub event_index: u16,
    pub session_index: u16,
    pub session_type: SessionType,
    pub phase: SessionPhase,
    /// Elapsed session time in milliseconds; `-1` means unbounded.
    pub session_time_ms: f32,
    /// Session end time in milliseconds; `-1` means unbounded.
    pub session_end_time_ms: f32,
    pub focused_car_index: i32,
    pub active_camera_set: String,
    pub active_camera: String,
    pub current_hud_page: String,
    pub replay: Option<ReplayClocks>,
    pub time_of_day_ms: f32,
    pub ambient_temp: u8,
    pub track_temp: u8,
    /// Cloud cover in tenths (0–10).
    pub clouds: u8,
    /// Rain level in tenths (0–10).
    pub rain_level: u8,
    /// Track wetness in tenths (0–10).
    pub wetness: u8,
    pub best_session_lap: LapInfo,
}

impl SessionUpdate {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        let event_index = reader.read_u16()?;
        let session_index = reader.read_u16()?;
        let session_type = SessionType::try_from(reader.read_u8()?)?;
        let phase = SessionPhase::try_from(reader.read_u8()?)?;
        let session_time_ms = reader.read_f32()?;
        let session_end_time_ms = reader.read_f32()?;
        let focused_car_index = reader.read_i32()?;
        let active_camera_set = reader.read_string()?;
        let active_camera = reader.read_string()?;
        let current_hud_page = reader.read_string()?;

        let replay = if reader.read_bool()? {
            Some(ReplayClocks {
                session_time_ms: reader.read_f32()?,
                remaining_time_ms: reader.read_f32()?,
            })
        } else {
            None
        };

        Ok(Self {
            event_index,
            session_index,
            session_type,
            phase,
            session_time_ms,
            session_end_time_ms,
            focused_car_index,
            active_camera_set,
            active_camera,
            current_hud_page,
            replay,
            time_of_day_ms: reader.read_f32()?,
            ambient_temp: reader.read_u8()?,
            track_temp: reader.read_u8()?,
            clouds: reader.read_u8()?,
            rain_level: reader.read_u8()?,
            wetness: reader.read_u8()?,
            best_session_lap: LapInfo::read(reader)?,
        })
    }

    /// Encode as a full datagram, message type included.
    ///
    /// # Errors
    /// Fails when a string or sequence field exceeds its length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = PacketWriter::with_capacity(96);
        writer.write_u8(MSG_SESSION_UPDATE);
        writer.write_u16(self.event_index);
        writer.write_u16(self.session_index);
        writer.write_u8(self.session_type.to_wire());
        writer.write_u8(self.phase.to_wire());
        writer.write_f32(self.session_time_ms);
        writer.write_f32(self.session_end_time_ms);
        writer.write_i32(self.focused_car_index);
        writer.write_string(&self.active_camera_set)?;
        writer.write_string(&self.active_camera)?;
        writer.write_string(&self.current_hud_page)?;
        writer.write_bool(self.replay.is_some());
        if let Some(replay) = &self.replay {
            writer.write_f32(replay.session_time_ms);
            writer.write_f32(replay.remaining_time_ms);
        }
        writer.write_f32(self.time_of_day_ms);
        writer.write_u8(self.ambient_temp);
        writer.write_u8(self.track_temp);
        writer.write_u8(self.clouds);
        writer.write_u8(self.rain_level);
        writer.write_u8(self.wetness);
        self.best_session_lap.write(&mut writer)?;
        Ok(writer.into_bytes())
    }
}

/// Live telemetry for one car (message type 3).
#[derive(Debug, Clone, PartialEq)]
pub struct CarUpdate {
    pub car_index: u16,
    pub driver_index: u16,
    pub driver_count: u8,
    /// Decoded gear: `-1` reverse, `0` neutral, `1..` forward.
    pub gear: i8,
    pub world_pos_x: f32,
    pub world_pos_y: f32,
    pub yaw: f32,
    pub car_location: CarLocation,
    pub speed_kmh: u16,
    pub position: u16,
    pub cup_position: u16,
    pub track_position: u16,
    pub spline_position: f32,
    pub laps: u16,
    pub delta_ms: i32,
    pub best_session_lap: LapInfo,
    pub last_lap: LapInfo,
    pub current_lap: LapInfo,
}

impl CarUpdate {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        let car_index = reader.read_u16()?;
        let driver_index = reader.read_u16()?;
        let driver_count = reader.read_u8()?;

        // Gear is sent offset by +2 so reverse fits in an unsigned byte.
        let gear_raw = reader.read_u8()?;
        let gear =
            (i16::from(gear_raw) - 2).clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8;

        Ok(Self {
            car_index,
            driver_index,
            driver_count,
            gear,
            world_pos_x: reader.read_f32()?,
            world_pos_y: reader.read_f32()?,
            yaw: reader.read_f32()?,
            car_location: CarLocation::try_from(reader.read_u8()?)?,
            speed_kmh: reader.read_u16()?,
            position: reader.read_u16()?,
            cup_position: reader.read_u16()?,
            track_position: reader.read_u16()?,
            spline_position: reader.read_f32()?,
            laps: reader.read_u16()?,
            delta_ms: reader.read_i32()?,
            best_session_lap: LapInfo::read(reader)?,
            last_lap: LapInfo::read(reader)?,
            current_lap: LapInfo::read(reader)?,
        })
    }

    /// Encode as a full datagram, message type included.
    ///
    /// # Errors
    /// Fails when a lap's split sequence exceeds its `u8` length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = PacketWriter::with_capacity(96);
        writer.write_u8(MSG_CAR_UPDATE);
        writer.write_u16(self.car_index);
        writer.write_u16(self.driver_index);
        writer.write_u8(self.driver_count);
        writer.write_u8(u8::try_from(i16::from(self.gear) + 2).unwrap_or(0));
        writer.write_f32(self.world_pos_x);
        writer.write_f32(self.world_pos_y);
        writer.write_f32(self.yaw);
        writer.write_u8(self.car_location.to_wire());
        writer.write_u16(self.speed_kmh);
        writer.write_u16(self.position);
        writer.write_u16(self.cup_position);
        writer.write_u16(self.track_position);
        writer.write_f32(self.spline_position);
        writer.write_u16(self.laps);
        writer.write_i32(self.delta_ms);
        self.best_session_lap.write(&mut writer)?;
        self.last_lap.write(&mut writer)?;
        self.current_lap.write(&mut writer)?;
        Ok(writer.into_bytes())
    }
}

/// The authoritative car list for the session (message type 4).
///
/// Carries only the car indices; per-car details follow as individual
/// [`CarEntry`] datagrams (message type 6).
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRoster {
    pub connection_id: i32,
    pub car_indices: Vec<u16>,
}

impl EntryRoster {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        let connection_id = reader.read_i32()?;
        let count = usize::from(reader.read_u16()?);
        let mut car_indices = Vec::with_capacity(count);
        for _ in 0..count {
            car_indices.push(reader.read_u16()?);
        }
        Ok(Self {
            connection_id,
            car_indices,
        })
    }

    /// Encode as a full datagram, message type included.
    ///
    /// # Errors
    /// Fails when the index list exceeds its `u16` length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = PacketWriter::with_capacity(8 + self.car_indices.len() * 2);
        writer.write_u8(MSG_ENTRY_ROSTER);
        writer.write_i32(self.connection_id);
        let count = u16::try_from(self.car_indices.len())
            .map_err(|_| EncodeError::SequenceTooLong(self.car_indices.len()))?;
        writer.write_u16(count);
        for index in &self.car_indices {
            writer.write_u16(*index);
        }
        Ok(writer.into_bytes())
    }
}

/// One driver on a car's roster entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverInfo {
    pub first_name: String,
    pub last_name: String,
    pub short_name: String,
    pub category: DriverCategory,
    pub nationality: Nationality,
}

impl DriverInfo {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            first_name: reader.read_string()?,
            last_name: reader.read_string()?,
            short_name: reader.read_string()?,
            category: DriverCategory::try_from(reader.read_u8()?)?,
            nationality: Nationality::try_from(reader.read_u16()?)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> Result<(), EncodeError> {
        writer.write_string(&self.first_name)?;
        writer.write_string(&self.last_name)?;
        writer.write_string(&self.short_name)?;
        writer.write_u8(self.category.to_wire());
        writer.write_u16(self.nationality.to_wire());
        Ok(())
    }
}

/// Full roster detail for one car (message type 6).
#[derive(Debug, Clone, PartialEq)]
pub struct CarEntry {
    pub car_index: u16,
    /// Car model identifier; `-1` until the detail packet arrives.
    pub model_type: i32,
    pub team_name: String,
    pub race_number: i32,
    pub cup_category: CupCategory,
    pub current_driver_index: u8,
    pub nationality: Nationality,
    pub drivers: Vec<DriverInfo>,
}

impl CarEntry {
    /// Skeleton entry as created from a roster index, before the per-car
    /// detail packet has arrived.
    pub fn with_index(car_index: u16) -> Self {
        Self {
            car_index,
            model_type: -1,
            team_name: String::new(),
            race_number: -1,
            cup_category: CupCategory::default(),
            current_driver_index: 0,
            nationality: Nationality::default(),
            drivers: Vec::new(),
        }
    }

    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        let car_index = reader.read_u16()?;
        let model_type = i32::from(reader.read_u8()?);
        let team_name = reader.read_string()?;
        let race_number = reader.read_i32()?;
        let cup_category = CupCategory::try_from(reader.read_u8()?)?;
        let current_driver_index = reader.read_u8()?;
        let nationality = Nationality::try_from(reader.read_u16()?)?;

        let driver_count = usize::from(reader.read_u8()?);
        let mut drivers = Vec::with_capacity(driver_count);
        for _ in 0..driver_count {
            drivers.push(DriverInfo::read(reader)?);
        }

        Ok(Self {
            car_index,
            model_type,
            team_name,
            race_number,
            cup_category,
            current_driver_index,
            nationality,
            drivers,
        })
    }

    /// Encode as a full datagram, message type included.
    ///
    /// # Errors
    /// Fails when a string or the driver list exceeds its length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = PacketWriter::with_capacity(48);
        writer.write_u8(MSG_ROSTER_CAR);
        writer.write_u16(self.car_index);
        writer.write_u8(u8::try_from(self.model_type).unwrap_or(0));
        writer.write_string(&self.team_name)?;
        writer.write_i32(self.race_number);
        writer.write_u8(self.cup_category.to_wire());
        writer.write_u8(self.current_driver_index);
        writer.write_u16(self.nationality.to_wire());
        let count = u8::try_from(self.drivers.len())
            .map_err(|_| EncodeError::SequenceTooLong(self.drivers.len()))?;
        writer.write_u8(count);
        for driver in &self.drivers {
            driver.write(&mut writer)?;
        }
        Ok(writer.into_bytes())
    }
}

/// Track metadata: name, length, camera sets, HUD pages (message type 5).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub connection_id: i32,
    pub name: String,
    pub id: i32,
    pub length_m: i32,
    pub camera_sets: HashMap<String, Vec<String>>,
    pub hud_pages: Vec<String>,
}

impl TrackInfo {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self, DecodeError> {
        let connection_id = reader.read_i32()?;
        let name = reader.read_string()?;
        let id = reader.read_i32()?;
        let length_m = reader.read_i32()?;

        let set_count = usize::from(reader.read_u8()?);
        let mut camera_sets = HashMap::with_capacity(set_count);
        for _ in 0..set_count {
            let set_name = reader.read_string()?;
            let camera_count = usize::from(reader.read_u8()?);
            let mut cameras = Vec::with_capacity(camera_count);
            for _ in 0..camera_count {
                cameras.push(reader.read_string()?);
            }
            camera_sets.insert(set_name, cameras);
        }

        let page_count = usize::from(reader.read_u8()?);
        let mut hud_pages = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            hud_pages.push(reader.read_string()?);
        }

        Ok(Self {
            connection_id,
            name,
            id,
            length_m,
            camera_sets,
            hud_pages,
        })
    }

    /// Encode as a full datagram, message type included.
    ///
    /// # Errors
    /// Fails when a string or sequence field exceeds its length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = PacketWriter::with_capacity(64);
        writer.write_u8(MSG_TRACK_INFO);
        writer.write_i32(self.connection_id);
        writer.write_string(&self.name)?;
        writer.write_i32(self.id);
        writer.write_i32(self.length_m);

        let set_count = u8::try_from(self.camera_sets.len())
            .map_err(|_| EncodeError::SequenceTooLong(self.camera_sets.len()))?;
        writer.write_u8(set_count);
        for (set_name, cameras) in &self.camera_sets {
            writer.write_string(set_name)?;
            let camera_count = u8::try_from(cameras.len())
                .map_err(|_| EncodeError::SequenceTooLong(cameras.len()))?;
            writer.write_u8(camera_count);
            for camera in cameras {
                writer.write_string(camera)?;
            }
        }

        let page_count = u8::try_from(self.hud_pages.len())
            .map_err(|_| EncodeError::SequenceTooLong(self.hud_pages.len()))?;
        writer.write_u8(page_count);
        for page in &self.hud_pages {
            writer.write_string(page)?;
        }
        Ok(writer.into_bytes())
    }
}

fn read_broadcasting_event(reader: &mut PacketReader<'_>) -> Result<(), DecodeError> {
    let _kind = reader.read_u8()?;
    let _message = reader.read_string()?;
    let _time_ms = reader.read_i32()?;
    let _car_id = reader.read_i32()?;
    Ok(())
}
