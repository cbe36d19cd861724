//! Timeline session integration tests
//!
//! Drives a [`TimelineSession`] end to end against real WAV files on disk:
//! load → envelope → viewport/playback events → marker positions.

mod helpers;

use std::sync::Arc;

use helpers::{annotation, asset, silent_wav_bytes, sine_wav_bytes, write_wav};
use mixnote_common::config::EnvelopeConfig;
use mixnote_timeline::envelope::{EnvelopeBuilder, SymphoniaDecoder};
use mixnote_timeline::fetch::FileFetcher;
use mixnote_timeline::markers::{translate, AnnotationType, Priority};
use mixnote_timeline::playback::PlaybackState;
use mixnote_timeline::session::{SessionState, SessionUpdate, TimelineEvent, TimelineSession};
use mixnote_timeline::BuildStatus;

fn builder() -> EnvelopeBuilder {
    EnvelopeBuilder::new(
        Arc::new(FileFetcher),
        Arc::new(SymphoniaDecoder),
        EnvelopeConfig::default(),
    )
}

#[tokio::test]
async fn test_load_real_wav_reports_decoded_duration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    write_wav(&path, &sine_wav_bytes(3.0, 2));
    let location = path.to_string_lossy().to_string();

    let mut session = TimelineSession::new();
    let update = session
        .load(asset(&location, "ramp.wav", 10.0), &builder())
        .await;

    match update {
        SessionUpdate::DurationReported {
            duration_seconds,
            status,
        } => {
            assert!((duration_seconds - 3.0).abs() < 1e-6);
            assert_eq!(status, BuildStatus::Decoded);
        }
        other => panic!("expected duration report, got {:?}", other),
    }
    assert_eq!(session.state(), SessionState::Ready);

    let values = session.envelope().values();
    assert_eq!(values.len(), 150);
    assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    assert!(values[0] < 0.05, "ramp starts near silence");
    assert!(values[values.len() - 1] > 0.9, "ramp ends near full scale");
    assert_eq!(values.iter().copied().fold(0.0f32, f32::max), 1.0);
}

#[tokio::test]
async fn test_silent_audio_gives_all_zero_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav(&path, &silent_wav_bytes(1.0, 1));

    let mut session = TimelineSession::new();
    session
        .load(asset(&path.to_string_lossy(), "silence.wav", 0.0), &builder())
        .await;

    let values = session.envelope().values();
    assert_eq!(values.len(), 50);
    assert!(values.iter().all(|v| *v == 0.0));
}

#[tokio::test]
async fn test_undecodable_file_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let mut session = TimelineSession::new();
    let update = session
        .load(asset(&path.to_string_lossy(), "broken.wav", 8.0), &builder())
        .await;

    match update {
        SessionUpdate::DurationReported { duration_seconds, status } => {
            assert_eq!(duration_seconds, 8.0);
            assert!(status.is_degraded());
        }
        other => panic!("expected degraded build, got {:?}", other),
    }
    assert_eq!(session.envelope().len(), 400);
    assert!(session.build_status().unwrap().is_degraded());
}

#[tokio::test]
async fn test_missing_file_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.wav");

    let mut session = TimelineSession::new();
    let update = session
        .load(asset(&path.to_string_lossy(), "missing.wav", 8.0), &builder())
        .await;

    match update {
        SessionUpdate::LoadFailed { message } => assert!(message.contains("missing.wav")),
        other => panic!("expected load failure, got {:?}", other),
    }
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn test_late_result_for_superseded_asset_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.wav");
    let second = dir.path().join("second.wav");
    write_wav(&first, &sine_wav_bytes(2.0, 1));
    write_wav(&second, &sine_wav_bytes(1.0, 1));

    let first_asset = asset(&first.to_string_lossy(), "first.wav", 0.0);
    let second_asset = asset(&second.to_string_lossy(), "second.wav", 0.0);
    let builder = builder();

    let mut session = TimelineSession::new();
    let stale_ticket = session.begin_load(first_asset.clone()).unwrap();
    let current_ticket = session.begin_load(second_asset.clone()).unwrap();

    // Builds finish out of order
    let current = TimelineSession::run_build(&builder, current_ticket, &second_asset).await;
    let stale = TimelineSession::run_build(&builder, stale_ticket, &first_asset).await;

    assert!(matches!(session.dispatch(current), SessionUpdate::DurationReported { .. }));
    assert_eq!(session.dispatch(stale), SessionUpdate::StaleResultIgnored);
    assert_eq!(session.envelope().len(), 50);
    assert_eq!(session.asset().unwrap().original_file_name, "second.wav");
}

#[tokio::test]
async fn test_playback_follow_and_marker_positions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.wav");
    write_wav(&path, &silent_wav_bytes(20.0, 1));

    let mut session = TimelineSession::new();
    session
        .load(asset(&path.to_string_lossy(), "song.wav", 0.0), &builder())
        .await;

    // 4x zoom: 5 second window
    session.viewport_mut().zoom_at(0.0, 4.0);
    assert_eq!(session.visible_slice(), 0..250);

    let markers = translate(&[
        annotation("a", 1.0, AnnotationType::Comment, Priority::Low, "early"),
        annotation("b", 12.0, AnnotationType::Issue, Priority::Critical, "late"),
    ]);
    let visible = session.marker_positions(&markers);
    assert_eq!(visible.len(), 1);
    assert!((visible[0].fraction - 0.2).abs() < 1e-9);

    session.dispatch(TimelineEvent::PlaybackStateChanged(PlaybackState::Playing));
    for step in 0..=24 {
        session.dispatch(TimelineEvent::PlaybackPositionChanged {
            time_seconds: step as f64 * 0.5,
        });
    }

    // Playhead at 12s sits at the 90% mark of the window
    let viewport = session.viewport();
    assert!((viewport.scroll_offset_seconds - 7.5).abs() < 1e-9);
    let visible = session.marker_positions(&markers);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].color, "#EF4444");
    assert!((visible[0].fraction - 0.9).abs() < 1e-9);

    let progress = session.progress();
    assert_eq!(progress.playhead_seconds, 12.0);
    assert_eq!(progress.playhead_fraction.map(|f| (f * 1e6).round() / 1e6), Some(0.9));
}

#[tokio::test]
async fn test_closed_session_ignores_events() {
    let mut session = TimelineSession::new();
    session.close();
    assert_eq!(
        session.dispatch(TimelineEvent::PlaybackPositionChanged { time_seconds: 1.0 }),
        SessionUpdate::Closed
    );
    let update = session.load(asset("nowhere.wav", "nowhere.wav", 1.0), &builder()).await;
    assert_eq!(update, SessionUpdate::Closed);
}
