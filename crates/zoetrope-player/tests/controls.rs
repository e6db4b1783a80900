//! Construction contract and transport-control pass-throughs, driven
//! entirely through the mock surface and network.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use rstest::*;
use zoetrope_player::{
    mock::{StaticNet, TestSurface},
    LengthPolicy, MediaFormat, MediaSurface, Player, PlayerConfig, PlayerError,
};

fn small_body() -> Bytes {
    Bytes::from(vec![7u8; 4096])
}

fn quick_config() -> PlayerConfig {
    PlayerConfig::new()
        .with_segment_len(1024)
        .with_append_pause(Duration::ZERO)
        .with_length_policy(LengthPolicy::Explicit)
}

async fn open_player(
    surface: &Arc<TestSurface>,
    net: &Arc<StaticNet>,
) -> Player<TestSurface> {
    Player::open_with_net(
        Arc::clone(surface),
        "http://media.test/video.mp4",
        quick_config(),
        Arc::clone(net) as Arc<dyn zoetrope_player::Net>,
    )
    .await
    .unwrap()
}

async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

// -- Construction contract --------------------------------------------------------

#[rstest]
#[case::empty("")]
#[case::blank("   ")]
#[case::unparseable("not a url")]
#[tokio::test]
async fn construction_rejects_bad_urls(#[case] url: &str) {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));

    let result = Player::open_with_net(surface, url, quick_config(), net).await;

    assert!(matches!(result, Err(PlayerError::InvalidArgument(_))));
}

#[rstest]
#[tokio::test]
async fn construction_rejects_zero_segment_len() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let config = quick_config().with_segment_len(0);

    let result =
        Player::open_with_net(surface, "http://media.test/video.mp4", config, net).await;

    assert!(matches!(result, Err(PlayerError::InvalidArgument(_))));
}

#[rstest]
#[tokio::test]
async fn unsupported_format_fails_before_any_network_activity() {
    let surface = Arc::new(TestSurface::new());
    surface.set_supported(false);
    let net = Arc::new(StaticNet::new(small_body()));
    let config = quick_config().with_format(MediaFormat::new("video/x-unknown"));

    let result = Player::open_with_net(
        Arc::clone(&surface),
        "http://media.test/video.mp4",
        config,
        Arc::clone(&net) as Arc<dyn zoetrope_player::Net>,
    )
    .await;

    assert!(matches!(result, Err(PlayerError::UnsupportedFormat(_))));
    assert_eq!(net.range_requests().len(), 0);
    assert_eq!(net.head_requests(), 0);
    assert_eq!(surface.attach_calls(), 0);
}

#[rstest]
#[tokio::test]
async fn open_attaches_and_streams() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));

    let _player = open_player(&surface, &net).await;

    assert_eq!(surface.attach_calls(), 1);
    let sink = surface.sink_state();
    wait_until("stream completion", || sink.close_count() == 1).await;
    assert_eq!(sink.total_bytes(), 4096);
}

// -- Transport controls -----------------------------------------------------------

#[rstest]
#[tokio::test]
async fn play_on_a_ready_surface_starts_immediately() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    surface.set_ready(true);
    assert!(!player.is_playing());
    player.play();
    assert!(player.is_playing());
}

#[rstest]
#[tokio::test]
async fn play_defers_until_can_play_fires() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    player.play();
    // The waiter is subscribed; the surface is still buffering.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!player.is_playing());

    surface.fire_can_play();
    wait_until("playback start", || player.is_playing()).await;
}

#[rstest]
#[tokio::test]
async fn pause_stops_playback() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    surface.set_ready(true);
    player.play();
    assert!(player.is_playing());

    player.pause();
    assert!(!player.is_playing());
}

#[rstest]
#[tokio::test]
async fn ended_surface_is_not_playing() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    surface.set_ready(true);
    player.play();
    surface.set_ended(true);

    assert!(!player.is_playing());
}

#[rstest]
#[case(0.5, 100.0, 50.0)]
#[case(0.25, 60.0, 15.0)]
#[case(1.5, 100.0, 150.0)] // out-of-range fractions are not validated
#[tokio::test]
async fn seek_to_sets_a_fraction_of_the_duration(
    #[case] fraction: f64,
    #[case] duration: f64,
    #[case] expected: f64,
) {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    surface.set_duration(duration);
    player.seek_to(fraction);

    assert!((surface.position() - expected).abs() < f64::EPSILON);
}

#[rstest]
#[tokio::test]
async fn seek_before_duration_is_known_is_ignored() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    player.seek_to(0.5);

    assert!((surface.position() - 0.0).abs() < f64::EPSILON);
}

// -- Progress callback ------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn time_update_callback_receives_position_fractions() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    let seen: Arc<Mutex<Vec<f64>>> = Arc::default();
    let sink = Arc::clone(&seen);
    player.set_on_time_update(move |fraction| sink.lock().push(fraction));

    surface.set_duration(200.0);
    surface.fire_position_changed(50.0);
    wait_until("first callback", || !seen.lock().is_empty()).await;
    surface.fire_position_changed(100.0);
    wait_until("second callback", || seen.lock().len() == 2).await;

    assert_eq!(*seen.lock(), vec![0.25, 0.5]);
}

#[rstest]
#[tokio::test]
async fn no_callback_before_duration_is_known() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    let seen: Arc<Mutex<Vec<f64>>> = Arc::default();
    let sink = Arc::clone(&seen);
    player.set_on_time_update(move |fraction| sink.lock().push(fraction));

    surface.fire_position_changed(50.0);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(seen.lock().is_empty());
}

#[rstest]
#[tokio::test]
async fn no_callback_before_registration() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    surface.set_duration(100.0);
    surface.fire_position_changed(25.0);
    // Let the relay drain the pre-registration signal into the no-op.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let seen: Arc<Mutex<Vec<f64>>> = Arc::default();
    let sink = Arc::clone(&seen);
    player.set_on_time_update(move |fraction| sink.lock().push(fraction));

    surface.fire_position_changed(50.0);
    wait_until("post-registration callback", || !seen.lock().is_empty()).await;

    assert_eq!(*seen.lock(), vec![0.5]);
}

#[rstest]
#[tokio::test]
async fn host_sink_errors_are_logged_not_fatal() {
    let surface = Arc::new(TestSurface::new());
    let net = Arc::new(StaticNet::new(small_body()));
    let player = open_player(&surface, &net).await;

    surface.fire_sink_error("decode error");
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The player is still operating: controls and callbacks keep working.
    surface.set_ready(true);
    player.play();
    assert!(player.is_playing());
}
