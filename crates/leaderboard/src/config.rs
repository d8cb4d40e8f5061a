//! Connection settings for the broadcasting interface.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use serde::{Deserialize, Serialize};

/// Default port the game's broadcasting interface listens on.
pub const DEFAULT_BROADCAST_PORT: u16 = 9000;

/// Default realtime update interval requested at registration.
pub const DEFAULT_UPDATE_INTERVAL_MS: i32 = 250;

/// Endpoint and credentials used to register with the game.
///
/// The passwords mirror the game's `broadcasting.json`: the connection
/// password gates read access, the command password gates control of the
/// broadcast (camera/HUD), which this client never exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    pub server_address: SocketAddr,
    pub display_name: String,
    pub connection_password: String,
    pub command_password: String,
    pub update_interval_ms: i32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            server_address: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::LOCALHOST,
                DEFAULT_BROADCAST_PORT,
            )),
            display_name: "Pitwall".to_string(),
            connection_password: String::new(),
            command_password: String::new(),
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
        }
    }
}

impl BroadcastConfig {
    /// Config for a broadcasting interface at `server_address`.
    pub fn with_address(server_address: SocketAddr) -> Self {
        Self {
            server_address,
            ..Self::default()
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn passwords(
        mut self,
        connection_password: impl Into<String>,
        command_password: impl Into<String>,
    ) -> Self {
        self.connection_password = connection_password.into();
        self.command_password = command_password.into();
        self
    }

    pub fn update_interval_ms(mut self, interval_ms: i32) -> Self {
        self.update_interval_ms = interval_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_game() {
        let config = BroadcastConfig::default();
        assert_eq!(config.server_address.port(), DEFAULT_BROADCAST_PORT);
        assert_eq!(config.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);
        assert!(config.connection_password.is_empty());
    }

    #[test]
    fn builder_methods_compose() {
        let address: SocketAddr = "192.168.1.40:9231".parse().unwrap_or_else(|_| {
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_BROADCAST_PORT))
        });
        let config = BroadcastConfig::with_address(address)
            .display_name("Timing Stand")
            .passwords("pw", "cmd")
            .update_interval_ms(100);

        assert_eq!(config.server_address, address);
        assert_eq!(config.display_name, "Timing Stand");
        assert_eq!(config.connection_password, "pw");
        assert_eq!(config.command_password, "cmd");
        assert_eq!(config.update_interval_ms, 100);
    }
}
