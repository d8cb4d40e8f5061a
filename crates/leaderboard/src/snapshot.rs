//! Consumer-facing leaderboard snapshot types.
//!
//! A snapshot is an immutable value: the worker publishes a new one after
//! mutating its own copy, so a snapshot handed to a consumer is never
//! changed underneath it. Fields mirror what a timing display needs; a
//! missing roster detail shows up as the placeholder values documented on
//! [`LeaderboardEntry`].

use std::collections::HashMap;
use std::time::Duration;

use pitwall_broadcast_protocol::{CarLocation, CupCategory, SessionType};
use serde::{Deserialize, Serialize};

/// Registration state as seen by the consumer.
///
/// Usable only while `connection_id != -1`; any socket failure resets it to
/// the invalid state and flips `connected` off until re-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connection_id: i32,
    pub connected: bool,
    pub succeeded: bool,
    pub read_only: bool,
    pub message: String,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            connection_id: -1,
            connected: false,
            succeeded: false,
            read_only: false,
            message: String::new(),
        }
    }
}

impl ConnectionStatus {
    pub fn is_valid(&self) -> bool {
        self.connection_id != -1
    }

    /// Drop back to the unusable state, keeping the last message for
    /// diagnostics.
    pub(crate) fn invalidate(&mut self) {
        self.connection_id = -1;
        self.connected = false;
        self.succeeded = false;
    }
}

/// Current driver of a car, by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverName {
    pub first_name: String,
    pub last_name: String,
}

/// One row of the leaderboard, keyed by car index.
///
/// Rows are created blank when a new roster arrives and filled in by car
/// updates. When a car's roster detail has not arrived yet, the identity
/// fields carry placeholders: `"Team Name"` / `"First Name"` /
/// `"Last Name"`, `-1` race number and model type, and the default cup
/// category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: u16,
    pub cup_position: u16,
    pub race_number: i32,
    pub car_index: u16,
    pub cup_category: CupCategory,
    pub model_type: i32,
    pub team_name: String,
    pub driver: DriverName,
    pub lap: u16,
    pub current_lap_ms: u32,
    pub last_lap_ms: u32,
    pub best_session_lap_ms: u32,
    /// Sector times of the last completed lap, sentinel-normalized.
    pub sectors: Vec<i32>,
    pub car_location: CarLocation,
    pub world_pos_x: f32,
    pub world_pos_y: f32,
}

/// Session clock and conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub track: String,
    pub session_type: SessionType,
    pub session_time: Duration,
    pub session_end_time: Duration,
    pub air_temp: u8,
    pub track_temp: u8,
}

/// The aggregated, consumer-facing state: registration status, one entry
/// per roster car, and the session clock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub connection: ConnectionStatus,
    pub entries: HashMap<u16, LeaderboardEntry>,
    pub session: SessionSnapshot,
}

/// Convert a wire session clock (milliseconds as `f32`, `-1` meaning
/// unbounded) into a duration.
pub(crate) fn session_duration(raw_ms: f32) -> Duration {
    if raw_ms <= 0.0 {
        // -1 on the wire means no time limit.
        return Duration::ZERO;
    }
    Duration::from_secs_f64(f64::from(raw_ms) / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_connection_is_invalid() {
        let connection = ConnectionStatus::default();
        assert!(!connection.is_valid());
        assert!(!connection.connected);
    }

    #[test]
    fn invalidate_keeps_the_last_message() {
        let mut connection = ConnectionStatus {
            connection_id: 7,
            connected: true,
            succeeded: true,
            read_only: false,
            message: "registered".to_string(),
        };
        connection.invalidate();

        assert!(!connection.is_valid());
        assert!(!connection.connected);
        assert_eq!(connection.message, "registered");
    }

    #[test]
    fn unbounded_session_clock_is_zero() {
        assert_eq!(session_duration(-1.0), Duration::ZERO);
        assert_eq!(session_duration(0.0), Duration::ZERO);
        assert_eq!(session_duration(90_000.0), Duration::from_secs(90));
    }
}
