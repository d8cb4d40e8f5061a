//! Merges decoded packets into the leaderboard snapshot.
//!
//! The aggregator owns the snapshot as an `Arc` and mutates it through
//! [`Arc::make_mut`]: handing a snapshot to a consumer is an `Arc` clone,
//! and the next mutation copies the value instead of touching what the
//! consumer holds.

use std::sync::Arc;

use pitwall_broadcast_protocol::{CarEntry, CarUpdate, CupCategory, RegistrationReply, SessionUpdate};

use crate::snapshot::{DriverName, LeaderboardSnapshot, session_duration};

const PLACEHOLDER_TEAM: &str = "Team Name";
const PLACEHOLDER_FIRST_NAME: &str = "First Name";
const PLACEHOLDER_LAST_NAME: &str = "Last Name";

/// Stateful reducer from inbound packets to the consumer snapshot.
#[derive(Debug, Default)]
pub struct SessionAggregator {
    snapshot: Arc<LeaderboardSnapshot>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<LeaderboardSnapshot> {
        Arc::clone(&self.snapshot)
    }

    fn state(&mut self) -> &mut LeaderboardSnapshot {
        Arc::make_mut(&mut self.snapshot)
    }

    /// Record the outcome of a registration attempt. A rejected registration
    /// leaves the connection unusable but keeps the game's message visible.
    pub fn record_registration(&mut self, reply: &RegistrationReply) {
        let connection = &mut self.state().connection;
        connection.connection_id = if reply.succeeded {
            reply.connection_id
        } else {
            -1
        };
        connection.connected = reply.succeeded;
        connection.succeeded = reply.succeeded;
        connection.read_only = reply.read_only;
        connection.message = reply.message.clone();
    }

    /// A socket timeout or error: the connection is no longer usable.
    pub fn connection_lost(&mut self) {
        self.state().connection.invalidate();
    }

    /// Replace the leaderboard rows wholesale with blank entries for the
    /// given roster; stale car indices disappear.
    pub fn rebuild_entries<I>(&mut self, car_indices: I)
    where
        I: IntoIterator<Item = u16>,
    {
        let entries = &mut self.state().entries;
        entries.clear();
        for car_index in car_indices {
            entries.insert(
                car_index,
                crate::snapshot::LeaderboardEntry {
                    car_index,
                    ..Default::default()
                },
            );
        }
    }

    /// Refresh the session section from a session update.
    pub fn update_session(&mut self, update: &SessionUpdate, track_name: &str) {
        let session = &mut self.state().session;
        session.track = track_name.to_string();
        session.session_type = update.session_type;
        session.session_time = session_duration(update.session_time_ms);
        session.session_end_time = session_duration(update.session_end_time_ms);
        session.air_temp = update.ambient_temp;
        session.track_temp = update.track_temp;
    }

    /// Merge one car update into its leaderboard row.
    ///
    /// The row must already exist (created by [`Self::rebuild_entries`]);
    /// updates for unknown cars are dropped upstream. Identity fields come
    /// from the roster entry when it has parsed drivers, placeholders
    /// otherwise.
    pub fn update_entry(&mut self, update: &CarUpdate, roster_entry: Option<&CarEntry>) {
        let Some(row) = self.state().entries.get_mut(&update.car_index) else {
            return;
        };

        match roster_entry {
            Some(car) if !car.drivers.is_empty() => {
                row.race_number = car.race_number;
                row.cup_category = car.cup_category;
                row.model_type = car.model_type;
                row.team_name = car.team_name.clone();
                row.driver = car
                    .drivers
                    .get(usize::from(update.driver_index))
                    .map(|driver| DriverName {
                        first_name: driver.first_name.clone(),
                        last_name: driver.last_name.clone(),
                    })
                    .unwrap_or_else(placeholder_driver);
            }
            _ => {
                row.race_number = -1;
                row.cup_category = CupCategory::default();
                row.model_type = -1;
                row.team_name = PLACEHOLDER_TEAM.to_string();
                row.driver = placeholder_driver();
            }
        }

        row.position = update.position;
        row.cup_position = update.cup_position;
        row.car_index = update.car_index;
        row.lap = update.laps;
        row.current_lap_ms = update.current_lap.lap_time_ms;
        row.last_lap_ms = update.last_lap.lap_time_ms;
        row.best_session_lap_ms = update.best_session_lap.lap_time_ms;
        row.sectors = update.last_lap.splits.clone();
        row.car_location = update.car_location;
        row.world_pos_x = update.world_pos_x;
        row.world_pos_y = update.world_pos_y;
    }
}

fn placeholder_driver() -> DriverName {
    DriverName {
        first_name: PLACEHOLDER_FIRST_NAME.to_string(),
        last_name: PLACEHOLDER_LAST_NAME.to_string(),
    }
}
