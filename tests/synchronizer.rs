mod common;

use std::sync::Arc;
use std::time::Duration;

use chamberctl::config::PollConfig;
use chamberctl::error::AppError;
use chamberctl::models::mode::Mode;
use chamberctl::models::settings::{PluginSettings, SettingsSource};
use chamberctl::widget::poller::Poller;
use chamberctl::widget::{ModeSync, StateSynchronizer};
use common::*;
use tokio_util::sync::CancellationToken;
use wiremock::{MockServer, ResponseTemplate};

fn synchronizer(server: &MockServer, settings: SettingsSource) -> Arc<StateSynchronizer> {
    Arc::new(StateSynchronizer::new(api_for(server), settings))
}

fn fixed(mode: Mode) -> SettingsSource {
    SettingsSource::Fixed(PluginSettings::with_mode(mode))
}

#[tokio::test]
async fn poll_once_writes_reported_status() {
    let server = MockServer::start().await;
    status_command().respond_with(lights(true)).expect(1).mount(&server).await;

    let sync = synchronizer(&server, fixed(Mode::On));
    assert!(!sync.read_light_status());

    let on = sync.poll_once().await.unwrap();
    assert!(on);
    assert!(sync.read_light_status());
    assert!(sync.snapshot().lights_on);
}

#[tokio::test]
async fn poll_once_reports_lights_off() {
    let server = MockServer::start().await;
    status_command().respond_with(lights(false)).mount(&server).await;

    let sync = synchronizer(&server, fixed(Mode::On));
    sync.write_light_status(true);

    assert!(!sync.poll_once().await.unwrap());
    assert!(!sync.read_light_status());
}

#[tokio::test]
async fn poll_once_rejects_malformed_response() {
    let server = MockServer::start().await;
    status_command()
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::On));
    sync.write_light_status(true);

    let err = sync.poll_once().await.unwrap_err();
    assert!(matches!(err, AppError::MalformedResponse(_)));
    assert!(sync.read_light_status());
}

#[tokio::test]
async fn poll_once_surfaces_http_status() {
    let server = MockServer::start().await;
    status_command()
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::On));
    match sync.poll_once().await {
        Err(AppError::Api { status, .. }) => assert_eq!(status, Some(500)),
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn each_advance_sends_one_command() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::Off));
    sync.write_displayed_mode(Mode::Off);

    assert_eq!(sync.advance_mode().await.unwrap(), Mode::Manual);
    assert_eq!(sync.advance_mode().await.unwrap(), Mode::Auto);
    assert_eq!(sync.advance_mode().await.unwrap(), Mode::On);
    assert_eq!(sync.read_displayed_mode(), Some(Mode::On));
    assert_eq!(sync.mode_sync(), ModeSync::Confirmed);
}

#[tokio::test]
async fn four_advances_return_to_start() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(204))
        .expect(4)
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::Auto));
    sync.write_displayed_mode(Mode::Auto);
    for _ in 0..4 {
        sync.advance_mode().await.unwrap();
    }
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Auto));
}

#[tokio::test]
async fn advance_from_unknown_label_goes_to_manual() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::On));
    assert_eq!(sync.read_displayed_mode(), None);
    assert_eq!(sync.advance_mode().await.unwrap(), Mode::Manual);
}

#[tokio::test]
async fn failed_advance_keeps_display_and_marks_divergence() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::Manual));
    sync.write_displayed_mode(Mode::Manual);

    assert!(sync.advance_mode().await.is_err());
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Auto));
    assert_eq!(sync.mode_sync(), ModeSync::Diverged);
}

#[tokio::test]
async fn poll_reconciles_diverged_mode_from_settings_file() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    status_command().respond_with(lights(true)).mount(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("settings.json");
    std::fs::write(
        &file,
        r#"{"plugins": {"chamber_lighting": {"lighting_mode": 3}}}"#,
    )
    .unwrap();

    let sync = synchronizer(
        &server,
        SettingsSource::File {
            path: file,
            plugin: "chamber_lighting".into(),
        },
    );
    sync.write_displayed_mode(Mode::Manual);
    let _ = sync.advance_mode().await;
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Auto));

    sync.poll_once().await.unwrap();
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Off));
    assert_eq!(sync.mode_sync(), ModeSync::Confirmed);
}

#[tokio::test]
async fn fixed_settings_do_not_reconcile() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    status_command().respond_with(lights(false)).mount(&server).await;

    let sync = synchronizer(&server, fixed(Mode::Off));
    sync.write_displayed_mode(Mode::Manual);
    let _ = sync.advance_mode().await;

    sync.poll_once().await.unwrap();
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Auto));
    assert_eq!(sync.mode_sync(), ModeSync::Diverged);
}

#[tokio::test]
async fn advance_during_in_flight_poll_sends_one_command() {
    let server = MockServer::start().await;
    status_command()
        .respond_with(lights(true).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    next_command()
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::On));
    sync.write_displayed_mode(Mode::On);

    let poll = sync.poll_once();
    let advance = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        sync.advance_mode().await
    };
    let (polled, advanced) = tokio::join!(poll, advance);

    assert!(polled.unwrap());
    assert_eq!(advanced.unwrap(), Mode::Off);
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Off));
    assert!(sync.read_light_status());
}

#[tokio::test]
async fn successful_cycle_schedules_next_poll_after_interval() {
    let server = MockServer::start().await;
    status_command().respond_with(lights(true)).expect(1).mount(&server).await;

    let sync = synchronizer(&server, fixed(Mode::On));
    let poll = PollConfig::default();
    let mut poller = Poller::new(Arc::clone(&sync), poll);

    let delay = poller.cycle().await;
    assert_eq!(delay, poll.interval);
    assert_eq!(poller.consecutive_failures(), 0);
    assert!(sync.read_light_status());
}

#[tokio::test]
async fn failed_cycles_back_off_and_recover() {
    let server = MockServer::start().await;
    status_command()
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    status_command().respond_with(lights(true)).mount(&server).await;

    let sync = synchronizer(&server, fixed(Mode::On));
    let poll = PollConfig {
        interval: Duration::from_millis(100),
        max_backoff: Duration::from_millis(1000),
    };
    let mut poller = Poller::new(sync, poll);

    assert_eq!(poller.cycle().await, Duration::from_millis(200));
    assert_eq!(poller.cycle().await, Duration::from_millis(400));
    assert_eq!(poller.consecutive_failures(), 2);
    assert_eq!(poller.cycle().await, Duration::from_millis(100));
    assert_eq!(poller.consecutive_failures(), 0);
}

#[tokio::test]
async fn pending_poll_blocks_further_polls() {
    let server = MockServer::start().await;
    status_command()
        .respond_with(lights(true).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::On));
    let poll = PollConfig {
        interval: Duration::from_millis(10),
        max_backoff: Duration::from_millis(10),
    };
    let handle = Poller::new(sync, poll).spawn(CancellationToken::new());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(count_commands(&server, "are_lights_turn_on").await, 1);
    handle.join().await;
}

#[tokio::test]
async fn polling_continues_after_failures() {
    let server = MockServer::start().await;
    status_command()
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sync = synchronizer(&server, fixed(Mode::On));
    let poll = PollConfig {
        interval: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
    };
    let handle = Poller::new(sync, poll).spawn(CancellationToken::new());

    let seen = wait_for_commands(&server, "are_lights_turn_on", 3).await;
    assert!(seen >= 3, "only {} polls after failures", seen);
    handle.join().await;
}

#[tokio::test]
async fn stopped_poller_sends_nothing_more() {
    let server = MockServer::start().await;
    status_command().respond_with(lights(true)).mount(&server).await;

    let sync = synchronizer(&server, fixed(Mode::On));
    let poll = PollConfig {
        interval: Duration::from_millis(10),
        max_backoff: Duration::from_millis(10),
    };
    let token = CancellationToken::new();
    let handle = Poller::new(sync, poll).spawn(token.clone());

    wait_for_commands(&server, "are_lights_turn_on", 2).await;
    handle.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.is_stopped());
    assert!(token.is_cancelled());

    let after_stop = count_commands(&server, "are_lights_turn_on").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(count_commands(&server, "are_lights_turn_on").await, after_stop);
}

#[tokio::test]
async fn reconcile_waits_for_unanswered_advance() {
    let server = MockServer::start().await;
    next_command()
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    next_command()
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(400)))
        .mount(&server)
        .await;
    status_command().respond_with(lights(true)).mount(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("settings.json");
    std::fs::write(
        &file,
        r#"{"plugins": {"chamber_lighting": {"lighting_mode": 3}}}"#,
    )
    .unwrap();

    let sync = synchronizer(
        &server,
        SettingsSource::File {
            path: file.clone(),
            plugin: "chamber_lighting".into(),
        },
    );
    sync.write_displayed_mode(Mode::Off);
    assert!(sync.advance_mode().await.is_err());
    assert_eq!(sync.mode_sync(), ModeSync::Diverged);

    // The plugin still reports Off while the second advance is unanswered.
    let slow_advance = sync.advance_mode();
    let poll_meanwhile = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        sync.poll_once().await.unwrap();
        (sync.read_displayed_mode(), sync.mode_sync())
    };
    let (advanced, (mode_during, sync_during)) = tokio::join!(slow_advance, poll_meanwhile);

    assert_eq!(advanced.unwrap(), Mode::Auto);
    assert_eq!(mode_during, Some(Mode::Auto));
    assert_eq!(sync_during, ModeSync::Diverged);
    assert_eq!(sync.mode_sync(), ModeSync::Diverged);

    // Only the second advance reached the plugin.
    std::fs::write(
        &file,
        r#"{"plugins": {"chamber_lighting": {"lighting_mode": 0}}}"#,
    )
    .unwrap();
    sync.poll_once().await.unwrap();
    assert_eq!(sync.read_displayed_mode(), Some(Mode::Manual));
    assert_eq!(sync.mode_sync(), ModeSync::Confirmed);
}
