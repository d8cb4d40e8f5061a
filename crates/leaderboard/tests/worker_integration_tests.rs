//! End-to-end tests against a scripted fake game on the loopback interface.
//!
//! The fake game is a plain UDP socket: each test drives the registration
//! exchange by hand, feeds the worker protocol datagrams, and observes both
//! the outbound commands and the aggregated snapshot.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pitwall_broadcast_protocol::{
    CarEntry, CarLocation, CarUpdate, CupCategory, DriverCategory, DriverInfo, EntryRoster,
    LapInfo, LapKind, Nationality, PROTOCOL_VERSION, PacketReader, REQ_DISCONNECT,
    REQ_ENTRY_ROSTER, REQ_REGISTER, REQ_TRACK_INFO, RegistrationReply, SessionPhase, SessionType,
    SessionUpdate, TrackInfo,
};
use pitwall_leaderboard::{BroadcastConfig, LeaderboardClient, LeaderboardSnapshot};
use tokio::net::UdpSocket;
use tokio::time::timeout;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const STEP: Duration = Duration::from_secs(5);

async fn recv_packet(socket: &UdpSocket) -> Result<(Vec<u8>, SocketAddr), Box<dyn std::error::Error>> {
    let mut buf = [0u8; 2048];
    let (len, addr) = timeout(STEP, socket.recv_from(&mut buf)).await??;
    Ok((buf[..len].to_vec(), addr))
}

async fn wait_for_snapshot<F>(
    client: &LeaderboardClient,
    predicate: F,
) -> Result<Arc<LeaderboardSnapshot>, Box<dyn std::error::Error>>
where
    F: Fn(&LeaderboardSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + STEP;
    loop {
        if let Some(snapshot) = client.snapshot().await {
            if predicate(&snapshot) {
                return Ok(snapshot);
            }
        }
        if tokio::time::Instant::now() > deadline {
            return Err("snapshot never reached the expected state".into());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn lap(lap_time_ms: u32, splits: Vec<i32>) -> LapInfo {
    LapInfo {
        lap_time_ms,
        car_index: 7,
        driver_index: 0,
        splits,
        invalid: false,
        valid_for_best: true,
        kind: LapKind::Regular,
    }
}

fn roster_car_7() -> CarEntry {
    CarEntry {
        car_index: 7,
        model_type: 30,
        team_name: "Dinamic GT".to_string(),
        race_number: 54,
        cup_category: CupCategory::Pro,
        current_driver_index: 0,
        nationality: Nationality::Italy,
        drivers: vec![DriverInfo {
            first_name: "Matteo".to_string(),
            last_name: "Cairoli".to_string(),
            short_name: "CAI".to_string(),
            category: DriverCategory::Gold,
            nationality: Nationality::Italy,
        }],
    }
}

fn car_update_7() -> CarUpdate {
    CarUpdate {
        car_index: 7,
        driver_index: 0,
        driver_count: 1,
        gear: 4,
        world_pos_x: 120.5,
        world_pos_y: -33.0,
        yaw: 0.2,
        car_location: CarLocation::Track,
        speed_kmh: 212,
        position: 3,
        cup_position: 1,
        track_position: 4,
        spline_position: 0.61,
        laps: 14,
        delta_ms: -87,
        best_session_lap: lap(91_422, vec![30_100, 30_500, 30_822]),
        last_lap: lap(92_010, vec![30_400, 30_700, 30_910]),
        current_lap: lap(0, vec![]),
    }
}

fn session_update() -> SessionUpdate {
    SessionUpdate {
        event_index: 0,
        session_index: 1,
        session_type: SessionType::Race,
        phase: SessionPhase::Session,
        session_time_ms: 90_000.0,
        session_end_time_ms: 3_600_000.0,
        focused_car_index: 7,
        active_camera_set: "set1".to_string(),
        active_camera: "cam1".to_string(),
        current_hud_page: "timing".to_string(),
        replay: None,
        time_of_day_ms: 50_400_000.0,
        ambient_temp: 24,
        track_temp: 31,
        clouds: 2,
        rain_level: 0,
        wetness: 0,
        best_session_lap: lap(91_000, vec![30_000, 30_400, 30_600]),
    }
}

fn track_monza() -> TrackInfo {
    TrackInfo {
        connection_id: 17,
        name: "monza".to_string(),
        id: 1,
        length_m: 5_793,
        camera_sets: [("tv".to_string(), vec!["tv1".to_string(), "tv2".to_string()])]
            .into_iter()
            .collect(),
        hud_pages: vec!["timing".to_string(), "broadcasting".to_string()],
    }
}

/// Accept the registration request and reply; returns the client's address
/// and consumes the follow-up track/roster requests.
async fn accept_registration(
    server: &UdpSocket,
    connection_id: i32,
) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let (packet, peer) = recv_packet(server).await?;
    let mut reader = PacketReader::new(&packet);
    assert_eq!(reader.read_u8()?, REQ_REGISTER);
    assert_eq!(reader.read_u8()?, PROTOCOL_VERSION);
    assert_eq!(reader.read_string()?, "Pitwall Test");
    assert_eq!(reader.read_string()?, "pw");
    assert_eq!(reader.read_i32()?, 100);
    assert_eq!(reader.read_string()?, "");

    let reply = RegistrationReply {
        connection_id,
        succeeded: true,
        read_only: false,
        message: String::new(),
    };
    server.send_to(&reply.encode()?, peer).await?;

    let (packet, _) = recv_packet(server).await?;
    assert_eq!(packet.first().copied(), Some(REQ_TRACK_INFO));
    let (packet, _) = recv_packet(server).await?;
    assert_eq!(packet.first().copied(), Some(REQ_ENTRY_ROSTER));

    Ok(peer)
}

fn test_config(server_addr: SocketAddr) -> BroadcastConfig {
    BroadcastConfig::with_address(server_addr)
        .display_name("Pitwall Test")
        .passwords("pw", "")
        .update_interval_ms(100)
}

#[tokio::test]
async fn full_session_reaches_the_snapshot() -> TestResult {
    let server = UdpSocket::bind("127.0.0.1:0").await?;
    let client = LeaderboardClient::start(test_config(server.local_addr()?)).await?;

    let peer = accept_registration(&server, 17).await?;

    let roster = EntryRoster {
        connection_id: 17,
        car_indices: vec![7, 12],
    };
    server.send_to(&roster.encode()?, peer).await?;
    tokio::time::sleep(Duration::from_millis(30)).await;
    server.send_to(&roster_car_7().encode()?, peer).await?;
    server.send_to(&track_monza().encode()?, peer).await?;
    tokio::time::sleep(Duration::from_millis(30)).await;
    server.send_to(&session_update().encode()?, peer).await?;
    server.send_to(&car_update_7().encode()?, peer).await?;

    let snapshot = wait_for_snapshot(&client, |snapshot| {
        snapshot
            .entries
            .get(&7)
            .is_some_and(|row| row.position == 3)
            && snapshot.session.track == "monza"
    })
    .await?;

    assert!(snapshot.connection.connected);
    assert_eq!(snapshot.connection.connection_id, 17);
    assert_eq!(snapshot.entries.len(), 2);

    let row = snapshot.entries.get(&7).cloned().unwrap_or_default();
    assert_eq!(row.team_name, "Dinamic GT");
    assert_eq!(row.driver.first_name, "Matteo");
    assert_eq!(row.race_number, 54);
    assert_eq!(row.lap, 14);
    assert_eq!(row.last_lap_ms, 92_010);
    assert_eq!(row.sectors, vec![30_400, 30_700, 30_910]);

    // Car 12 has no updates yet: a blank row, not a missing one.
    let blank = snapshot.entries.get(&12).cloned().unwrap_or_default();
    assert_eq!(blank.car_index, 12);
    assert_eq!(blank.position, 0);

    assert_eq!(snapshot.session.session_type, SessionType::Race);
    assert_eq!(snapshot.session.session_time, Duration::from_secs(90));
    assert_eq!(snapshot.session.air_temp, 24);
    assert_eq!(snapshot.session.track_temp, 31);

    client.stop().await?;

    // Shutdown sends the disconnect command with the held connection id.
    let (packet, _) = recv_packet(&server).await?;
    let mut reader = PacketReader::new(&packet);
    assert_eq!(reader.read_u8()?, REQ_DISCONNECT);
    assert_eq!(reader.read_i32()?, 17);
    Ok(())
}

#[tokio::test]
async fn unknown_car_triggers_one_roster_request_per_window() -> TestResult {
    let server = UdpSocket::bind("127.0.0.1:0").await?;
    let client = LeaderboardClient::start(test_config(server.local_addr()?)).await?;

    let peer = accept_registration(&server, 9).await?;

    let roster = EntryRoster {
        connection_id: 9,
        car_indices: vec![1],
    };
    server.send_to(&roster.encode()?, peer).await?;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // A burst of updates for a car the roster does not know.
    let mut unknown = car_update_7();
    unknown.car_index = 99;
    for _ in 0..5 {
        server.send_to(&unknown.encode()?, peer).await?;
    }

    // Exactly one roster refresh within the rate-limit window.
    let (packet, _) = recv_packet(&server).await?;
    assert_eq!(packet.first().copied(), Some(REQ_ENTRY_ROSTER));

    let mut buf = [0u8; 2048];
    let second = timeout(Duration::from_millis(400), server.recv_from(&mut buf)).await;
    assert!(second.is_err(), "burst must not trigger a second request");

    // The dropped updates never created a leaderboard row.
    let snapshot = wait_for_snapshot(&client, |snapshot| !snapshot.entries.is_empty()).await?;
    assert!(snapshot.entries.get(&99).is_none());

    client.stop().await?;
    Ok(())
}

#[tokio::test]
async fn rejected_registration_is_surfaced_not_fatal() -> TestResult {
    let server = UdpSocket::bind("127.0.0.1:0").await?;
    let client = LeaderboardClient::start(test_config(server.local_addr()?)).await?;

    let (packet, peer) = recv_packet(&server).await?;
    assert_eq!(packet.first().copied(), Some(REQ_REGISTER));

    let reply = RegistrationReply {
        connection_id: 0,
        succeeded: false,
        read_only: true,
        message: "wrong password".to_string(),
    };
    server.send_to(&reply.encode()?, peer).await?;

    let snapshot = wait_for_snapshot(&client, |snapshot| {
        snapshot.connection.message == "wrong password"
    })
    .await?;
    assert!(!snapshot.connection.connected);
    assert!(!snapshot.connection.succeeded);
    assert!(!snapshot.connection.is_valid());

    // No track/roster requests follow a rejected registration.
    let mut buf = [0u8; 2048];
    let follow_up = timeout(Duration::from_millis(300), server.recv_from(&mut buf)).await;
    assert!(follow_up.is_err(), "rejected registration must not request data");

    // The client stays eligible for reconnection: a fresh registration
    // request arrives after the backoff.
    let (packet, _) = recv_packet(&server).await?;
    assert_eq!(packet.first().copied(), Some(REQ_REGISTER));

    client.stop().await?;
    Ok(())
}

#[tokio::test]
async fn every_snapshot_request_is_answered_exactly_once() -> TestResult {
    // No game on the other side at all: the worker still answers every
    // request with the (empty, disconnected) snapshot.
    let server = UdpSocket::bind("127.0.0.1:0").await?;
    let client = LeaderboardClient::start(test_config(server.local_addr()?)).await?;

    let (a, b, c) = tokio::join!(client.snapshot(), client.snapshot(), client.snapshot());
    for snapshot in [a, b, c] {
        let snapshot = snapshot.ok_or("request must be answered while running")?;
        assert!(snapshot.entries.is_empty());
    }

    client.stop().await?;
    Ok(())
}

#[tokio::test]
async fn stop_completes_without_any_game_traffic() -> TestResult {
    // Stop must terminate cleanly even when the game never answered and the
    // worker is sitting in its bounded receive.
    let server = UdpSocket::bind("127.0.0.1:0").await?;
    let client = LeaderboardClient::start(test_config(server.local_addr()?)).await?;

    timeout(STEP, client.stop()).await??;

    // The final disconnect reached the wire with the never-assigned id.
    // Depending on how quickly the stop command lands, a registration
    // request may or may not precede it.
    loop {
        let (packet, _) = recv_packet(&server).await?;
        if packet.first().copied() == Some(REQ_REGISTER) {
            continue;
        }
        let mut reader = PacketReader::new(&packet);
        assert_eq!(reader.read_u8()?, REQ_DISCONNECT);
        assert_eq!(reader.read_i32()?, -1);
        break;
    }
    Ok(())
}

#[tokio::test]
async fn published_snapshots_are_stable_values() -> TestResult {
    let server = UdpSocket::bind("127.0.0.1:0").await?;
    let client = LeaderboardClient::start(test_config(server.local_addr()?)).await?;

    let peer = accept_registration(&server, 3).await?;
    let roster = EntryRoster {
        connection_id: 3,
        car_indices: vec![7],
    };
    server.send_to(&roster.encode()?, peer).await?;

    let before = wait_for_snapshot(&client, |snapshot| !snapshot.entries.is_empty()).await?;
    assert_eq!(before.entries.get(&7).map(|row| row.position), Some(0));

    // Mutations after the handout must not show through the held Arc.
    server.send_to(&roster_car_7().encode()?, peer).await?;
    tokio::time::sleep(Duration::from_millis(30)).await;
    server.send_to(&car_update_7().encode()?, peer).await?;

    let after = wait_for_snapshot(&client, |snapshot| {
        snapshot.entries.get(&7).is_some_and(|row| row.position == 3)
    })
    .await?;

    assert_eq!(before.entries.get(&7).map(|row| row.position), Some(0));
    assert_eq!(after.entries.get(&7).map(|row| row.position), Some(3));

    client.stop().await?;
    Ok(())
}
