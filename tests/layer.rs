mod common;

use std::fmt;
use std::sync::atomic::Ordering;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use common::{parse_batch, text_frames, RecordingSink};
use journal_log_sink::appender::Appender;
use journal_log_sink::init::LayerConfig;
use journal_log_sink::layer::JournalLayer;

#[derive(Debug)]
struct Refused;

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection refused")
    }
}

impl std::error::Error for Refused {}

#[derive(Debug)]
struct LoginFailed(Refused);

impl fmt::Display for LoginFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("login failed")
    }
}

impl std::error::Error for LoginFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

fn value<'a>(frames: &'a [(String, String)], key: &str) -> Option<&'a str> {
    frames
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn events_reach_sink_after_subscriber_is_dropped() {
    let sink = RecordingSink::default();
    let config = LayerConfig {
        static_fields: vec![("service".to_string(), "auth".to_string())],
        flush_interval: Duration::from_secs(60),
        ..Default::default()
    };
    let (layer, handle) = JournalLayer::new(Appender::new(sink.clone()), &config);
    let total = layer.total_events.clone();
    let enqueued = layer.enqueued_events.clone();
    let dropped = layer.dropped_events.clone();

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        info!(user_id = 42u64, "user logged in");
        debug!("below max level");
        let err = LoginFailed(Refused);
        error!(
            error = &err as &(dyn std::error::Error + 'static),
            attempts = 3i64,
            "authentication failed"
        );
    });

    handle.await.unwrap();

    assert_eq!(total.load(Ordering::Relaxed), 3);
    assert_eq!(enqueued.load(Ordering::Relaxed), 2);
    assert_eq!(dropped.load(Ordering::Relaxed), 0);
    assert!(sink.is_closed());

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    let records = parse_batch(&batches[0]);
    assert_eq!(records.len(), 2);

    let first = text_frames(&records[0]);
    assert_eq!(value(&first, "PRIORITY"), Some("6"));
    assert_eq!(value(&first, "MESSAGE"), Some("user logged in"));
    assert_eq!(value(&first, "LOGGER"), Some("layer"));
    assert_eq!(value(&first, "SERVICE"), Some("auth"));
    assert_eq!(value(&first, "USER_ID"), Some("42"));
    assert!(value(&first, "CALLER").unwrap().contains("layer.rs:"));

    let keys: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
    let service = keys.iter().position(|k| *k == "SERVICE").unwrap();
    let user = keys.iter().position(|k| *k == "USER_ID").unwrap();
    assert!(service < user);

    let second = text_frames(&records[1]);
    assert_eq!(value(&second, "PRIORITY"), Some("3"));
    assert_eq!(value(&second, "LEVEL"), Some("error"));
    assert_eq!(value(&second, "ERROR"), Some("login failed"));
    assert_eq!(
        value(&second, "ERROR_VERBOSE"),
        Some("login failed: connection refused")
    );
    assert_eq!(value(&second, "ATTEMPTS"), Some("3"));
}

#[tokio::test]
async fn events_from_this_crate_are_not_journaled() {
    let sink = RecordingSink::default();
    let (layer, handle) = JournalLayer::new(Appender::new(sink.clone()), &LayerConfig::default());
    let total = layer.total_events.clone();
    let enqueued = layer.enqueued_events.clone();

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        warn!(target: "journal_log_sink::appender", "journal sink write failed");
        info!("application event");
    });

    handle.await.unwrap();

    assert_eq!(total.load(Ordering::Relaxed), 2);
    assert_eq!(enqueued.load(Ordering::Relaxed), 1);

    let records: Vec<_> = sink
        .batches()
        .iter()
        .flat_map(|b| parse_batch(b))
        .collect();
    assert_eq!(records.len(), 1);
    let frames = text_frames(&records[0]);
    assert_eq!(value(&frames, "MESSAGE"), Some("application event"));
}

#[tokio::test]
async fn full_channel_drops_and_counts_records() {
    let sink = RecordingSink::default();
    let config = LayerConfig {
        channel_buffer: 16,
        ..Default::default()
    };
    let (layer, handle) = JournalLayer::new(Appender::new(sink.clone()), &config);
    let total = layer.total_events.clone();
    let enqueued = layer.enqueued_events.clone();
    let dropped = layer.dropped_events.clone();

    // The dispatcher cannot run on this current-thread runtime until the
    // test yields, so only the first 16 records fit.
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        for i in 0..40u64 {
            info!(seq = i, "burst");
        }
    });

    handle.await.unwrap();

    let total = total.load(Ordering::Relaxed);
    let enqueued = enqueued.load(Ordering::Relaxed);
    let dropped = dropped.load(Ordering::Relaxed);
    assert_eq!(total, 40);
    assert_eq!(enqueued, 16);
    assert!(dropped > 0);
    assert_eq!(enqueued + dropped, total);

    let journaled: usize = sink.batches().iter().map(|b| parse_batch(b).len()).sum();
    assert_eq!(journaled as u64, enqueued);
}
