//! Live leaderboard client for the ACC UDP broadcasting interface.
//!
//! [`LeaderboardClient::start`] registers with the game, runs the receive
//! and dispatch loop on a background task, and keeps an aggregated
//! [`LeaderboardSnapshot`] up to date: the car roster, per-car live timing,
//! and the session clock. Consumers pull the latest snapshot on demand
//! through a request/reply handshake; shutdown sends the protocol's
//! disconnect command and waits for the worker to acknowledge termination.
//!
//! ```no_run
//! use pitwall_leaderboard::{BroadcastConfig, LeaderboardClient};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = LeaderboardClient::start(BroadcastConfig::default()).await?;
//! if let Some(snapshot) = client.snapshot().await {
//!     for entry in snapshot.entries.values() {
//!         println!("P{} #{}", entry.position, entry.race_number);
//!     }
//! }
//! client.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod client;
pub mod config;
pub mod snapshot;
pub mod worker;

pub use aggregator::SessionAggregator;
pub use client::ProtocolClient;
pub use config::BroadcastConfig;
pub use snapshot::{
    ConnectionStatus, DriverName, LeaderboardEntry, LeaderboardSnapshot, SessionSnapshot,
};
pub use worker::LeaderboardClient;

pub use pitwall_broadcast_protocol as protocol;
