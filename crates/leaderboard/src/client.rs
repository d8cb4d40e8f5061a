//! Protocol client: socket ownership, connect/reconnect state machine, and
//! inbound dispatch.
//!
//! The client is single-task: one loop iteration ([`ProtocolClient::run_once`])
//! either sends a registration request (when disconnected and past the
//! backoff) or performs one bounded socket receive and dispatches the
//! datagram. Decode happens fully before any state is touched, so a short or
//! corrupt datagram is discarded without affecting the aggregate.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pitwall_broadcast_protocol::outbound::{
    build_disconnect_packet, build_entry_roster_request, build_register_packet,
    build_track_info_request,
};
use pitwall_broadcast_protocol::{
    CarEntry, CarUpdate, InboundPacket, RegistrationReply, TrackInfo, decode_packet,
};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::aggregator::SessionAggregator;
use crate::config::BroadcastConfig;
use crate::snapshot::LeaderboardSnapshot;

/// Upper bound on one loop iteration's socket wait; also the cap on how
/// stale a control-channel command can get.
pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Minimum gap between registration attempts while disconnected.
pub(crate) const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// Minimum gap between roster refresh requests triggered by updates for
/// unknown cars.
pub(crate) const ROSTER_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

const MAX_PACKET_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connected,
}

/// Timestamps behind the two recovery policies. Kept separate from the
/// socket machinery so the policies are testable with fabricated instants.
#[derive(Debug, Default)]
pub(crate) struct RecoveryTimers {
    last_register_attempt: Option<Instant>,
    last_roster_request: Option<Instant>,
}

impl RecoveryTimers {
    pub(crate) fn may_register(&self, now: Instant) -> bool {
        self.last_register_attempt
            .is_none_or(|at| now.saturating_duration_since(at) >= RECONNECT_BACKOFF)
    }

    pub(crate) fn note_register(&mut self, now: Instant) {
        self.last_register_attempt = Some(now);
    }

    pub(crate) fn may_request_roster(&self, now: Instant) -> bool {
        self.last_roster_request
            .is_none_or(|at| now.saturating_duration_since(at) >= ROSTER_REQUEST_INTERVAL)
    }

    pub(crate) fn note_roster_request(&mut self, now: Instant) {
        self.last_roster_request = Some(now);
    }
}

/// Owns the UDP socket, the car roster, and the aggregator.
pub struct ProtocolClient {
    socket: UdpSocket,
    config: BroadcastConfig,
    state: ConnectionState,
    connection_id: i32,
    roster: HashMap<u16, CarEntry>,
    track: Option<TrackInfo>,
    aggregator: SessionAggregator,
    timers: RecoveryTimers,
}

impl ProtocolClient {
    /// Bind an ephemeral UDP socket and point it at the game's broadcasting
    /// endpoint. No traffic is sent until [`Self::run_once`] runs.
    ///
    /// # Errors
    /// Fails when the socket cannot be bound or connected.
    pub async fn connect(config: BroadcastConfig) -> Result<Self> {
        let bind_address = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        let socket = UdpSocket::bind(bind_address)
            .await
            .context("failed to bind broadcast UDP socket")?;
        socket
            .connect(config.server_address)
            .await
            .with_context(|| {
                format!("failed to connect UDP socket to {}", config.server_address)
            })?;

        Ok(Self {
            socket,
            config,
            state: ConnectionState::Disconnected,
            connection_id: -1,
            roster: HashMap::new(),
            track: None,
            aggregator: SessionAggregator::new(),
            timers: RecoveryTimers::default(),
        })
    }

    /// The latest aggregated snapshot.
    pub fn snapshot(&self) -> Arc<LeaderboardSnapshot> {
        self.aggregator.snapshot()
    }

    /// One iteration of the protocol loop: register if disconnected and past
    /// the backoff, otherwise one bounded receive plus dispatch.
    pub async fn run_once(&mut self) {
        if self.state == ConnectionState::Disconnected {
            let now = Instant::now();
            if self.timers.may_register(now) {
                self.register(now).await;
                return;
            }
            // Within the backoff the bounded receive below paces the loop.
        }
        self.receive_once().await;
    }

    /// Send the disconnect command for the held connection id. The socket is
    /// released when the client is dropped.
    pub async fn disconnect(&mut self) {
        if let Err(error) = self
            .socket
            .send(&build_disconnect_packet(self.connection_id))
            .await
        {
            warn!(error = %error, "failed to send disconnect command");
        }
        info!(connection_id = self.connection_id, "broadcast connection closed");
    }

    async fn register(&mut self, now: Instant) {
        self.timers.note_register(now);

        let packet = match build_register_packet(
            &self.config.display_name,
            &self.config.connection_password,
            self.config.update_interval_ms,
            &self.config.command_password,
        ) {
            Ok(packet) => packet,
            Err(error) => {
                warn!(error = %error, "failed to encode registration request");
                return;
            }
        };

        match self.socket.send(&packet).await {
            Ok(_) => {
                debug!(endpoint = %self.config.server_address, "registration request sent");
                // Confirmation arrives asynchronously as a registration
                // reply; assume connected until the socket says otherwise.
                self.state = ConnectionState::Connected;
            }
            Err(error) => {
                warn!(error = %error, "failed to send registration request");
            }
        }
    }

    async fn receive_once(&mut self) {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        match tokio::time::timeout(RECV_TIMEOUT, self.socket.recv(&mut buf)).await {
            Ok(Ok(len)) => self.handle_datagram(&buf[..len]).await,
            Ok(Err(error)) => {
                warn!(error = %error, "socket receive failed");
                self.mark_disconnected();
            }
            Err(_) => {
                debug!("no datagram within the receive window");
                self.mark_disconnected();
            }
        }
    }

    fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.aggregator.connection_lost();
    }

    async fn handle_datagram(&mut self, data: &[u8]) {
        let packet = match decode_packet(data) {
            Ok(packet) => packet,
            Err(error) => {
                warn!(error = %error, len = data.len(), "discarding undecodable datagram");
                return;
            }
        };

        match packet {
            InboundPacket::RegistrationReply(reply) => self.on_registration_reply(reply).await,
            InboundPacket::SessionUpdate(update) => {
                let track = self.track.as_ref().map_or("", |info| info.name.as_str());
                self.aggregator.update_session(&update, track);
            }
            InboundPacket::CarUpdate(update) => self.on_car_update(update).await,
            InboundPacket::EntryRoster(roster) => {
                debug!(cars = roster.car_indices.len(), "entry roster replaced");
                self.aggregator
                    .rebuild_entries(roster.car_indices.iter().copied());
                self.roster = roster
                    .car_indices
                    .into_iter()
                    .map(|index| (index, CarEntry::with_index(index)))
                    .collect();
            }
            InboundPacket::TrackInfo(info) => {
                debug!(track = %info.name, length_m = info.length_m, "track data received");
                self.track = Some(info);
            }
            InboundPacket::RosterCar(entry) => {
                // Detail for a car we never saw in a roster is a no-op.
                if let Some(slot) = self.roster.get_mut(&entry.car_index) {
                    *slot = entry;
                }
            }
            InboundPacket::BroadcastingEvent => {}
            InboundPacket::Unknown(opcode) => {
                debug!(opcode, "ignoring unknown message type");
            }
        }
    }

    async fn on_registration_reply(&mut self, reply: RegistrationReply) {
        self.aggregator.record_registration(&reply);

        if reply.succeeded {
            info!(
                connection_id = reply.connection_id,
                read_only = reply.read_only,
                "registration accepted"
            );
            self.connection_id = reply.connection_id;
            self.state = ConnectionState::Connected;
            self.request_track_info().await;
            self.request_entry_roster().await;
        } else {
            warn!(message = %reply.message, "registration rejected");
            self.connection_id = -1;
            self.state = ConnectionState::Disconnected;
        }
    }

    async fn on_car_update(&mut self, update: CarUpdate) {
        if let Some(entry) = self.roster.get(&update.car_index) {
            self.aggregator.update_entry(&update, Some(entry));
        } else {
            // A car we have no roster entry for: the roster is stale. Ask
            // for a fresh one at most once per interval and drop the update.
            let now = Instant::now();
            if self.timers.may_request_roster(now) {
                debug!(car_index = update.car_index, "update for unknown car, refreshing roster");
                self.timers.note_roster_request(now);
                self.request_entry_roster().await;
            }
        }
    }

    async fn request_entry_roster(&mut self) {
        if self.connection_id == -1 {
            return;
        }
        if let Err(error) = self
            .socket
            .send(&build_entry_roster_request(self.connection_id))
            .await
        {
            warn!(error = %error, "failed to request entry roster");
        }
    }

    async fn request_track_info(&mut self) {
        if self.connection_id == -1 {
            return;
        }
        if let Err(error) = self
            .socket
            .send(&build_track_info_request(self.connection_id))
            .await
        {
            warn!(error = %error, "failed to request track data");
        }
    }
}
