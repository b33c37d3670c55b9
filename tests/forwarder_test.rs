//! Forwarding loop behaviour against an in-memory transport.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use monitor_relay::classify::Message;
use monitor_relay::forwarder::{ForwardStats, Forwarder};
use monitor_relay::lifecycle::Shutdown;
use tokio::time::Instant;

mod common;

use common::{quiet_config, ManualClock, MockTransport, ScriptedSource, Step};

async fn run_to_end(
    config: &monitor_relay::MonitorConfig,
    source: ScriptedSource,
    transport: MockTransport,
    clock: ManualClock,
) -> ForwardStats {
    let shutdown = Shutdown::new();
    let forwarder = Forwarder::new(config, source, transport, Box::new(clock));
    forwarder.run(shutdown.subscribe()).await
}

#[tokio::test(start_paused = true)]
async fn test_overflow_scenario_across_two_seconds() {
    let clock = ManualClock::at(100);
    let source = ScriptedSource::new(
        &clock,
        vec![
            Step::Line(100, "m1"),
            Step::Line(100, "m2"),
            Step::Line(100, "m3"),
            Step::Line(101, "m4"),
        ],
    );
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    let stats = run_to_end(&quiet_config(2), source, transport, clock).await;

    let sent = recorded.lock().unwrap().texts();
    assert_eq!(
        sent,
        vec![
            "m1".to_string(),
            "m2".to_string(),
            Message::limit_reached("Monitor", 2).into_text(),
            Message::overflow_report("Monitor", 1).into_text(),
            "m4".to_string(),
        ]
    );
    assert_eq!(
        stats,
        ForwardStats {
            lines_read: 4,
            forwarded: 3,
            rate_limited: 1,
            undelivered: 0,
            notices: 2,
        }
    );
    assert_eq!(recorded.lock().unwrap().disconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_structured_lines_are_classified() {
    let clock = ManualClock::at(1);
    let source = ScriptedSource::lines(
        &clock,
        1,
        &[
            r#"{"message":"hello"}"#,
            r#"{"src_ip":"1.1.1.1","dst_ip":"2.2.2.2","icmp_type":8}"#,
            "not json",
        ],
    );
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    run_to_end(&quiet_config(10), source, transport, clock).await;

    assert_eq!(
        recorded.lock().unwrap().texts(),
        vec![
            "hello",
            "ICMP Echo Request from 1.1.1.1 to 2.2.2.2 (code: )",
            "not json"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_credentials_carry_derived_token() {
    let clock = ManualClock::at(1);
    let mut config = quiet_config(10);
    config.client_name = "edge".to_string();
    config.password = Some("password".to_string());
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    run_to_end(&config, ScriptedSource::new(&clock, vec![]), transport, clock).await;

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.credentials.len(), 1);
    assert_eq!(recorded.credentials[0].username(), "edge");
    assert_eq!(
        recorded.credentials[0].token.as_deref(),
        Some("XohImNooBHFR0OVvjcYpJ3NgPQ1qq73WKhHvch0VQtg=")
    );
}

#[tokio::test(start_paused = true)]
async fn test_forwarding_waits_for_settle_delay() {
    let clock = ManualClock::at(1);
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();
    let start = Instant::now();

    run_to_end(
        &quiet_config(10),
        ScriptedSource::lines(&clock, 1, &["first"]),
        transport,
        clock,
    )
    .await;

    let (sent_at, _) = recorded.lock().unwrap().sent[0].clone();
    assert_eq!(sent_at - start, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_ready_timeout_boundary() {
    let clock = ManualClock::at(1);
    let mut config = quiet_config(10);
    // The settle timer would fire long after the ready timeout.
    config.timing.settle_delay_ms = 120_000;
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();
    let start = Instant::now();

    run_to_end(
        &config,
        ScriptedSource::lines(&clock, 1, &["first"]),
        transport,
        clock,
    )
    .await;

    let (sent_at, _) = recorded.lock().unwrap().sent[0].clone();
    assert_eq!(sent_at - start, Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_pacing_between_admitted_sends() {
    let clock = ManualClock::at(1);
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    run_to_end(
        &quiet_config(10),
        ScriptedSource::lines(&clock, 1, &["a", "b", "c"]),
        transport,
        clock,
    )
    .await;

    let recorded = recorded.lock().unwrap();
    let times: Vec<Instant> = recorded.sent.iter().map(|(at, _)| *at).collect();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(100));
    assert_eq!(times[2] - times[1], Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_refused_connection_degrades_to_no_op() {
    let clock = ManualClock::at(1);
    let transport = MockTransport::refusing();
    let recorded = transport.recorded.clone();
    let start = Instant::now();

    let stats = run_to_end(
        &quiet_config(10),
        ScriptedSource::lines(&clock, 1, &["a", "b"]),
        transport,
        clock,
    )
    .await;

    // Ready timeout (15s) plus drain delay (0.5s).
    assert_eq!(start.elapsed(), Duration::from_millis(15_500));
    assert_eq!(stats.undelivered, 2);
    assert_eq!(stats.forwarded, 0);
    let recorded = recorded.lock().unwrap();
    assert!(recorded.sent.is_empty());
    assert_eq!(recorded.disconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_cap_sends_only_notices() {
    let clock = ManualClock::at(5);
    let source = ScriptedSource::new(
        &clock,
        vec![
            Step::Line(5, "a"),
            Step::Line(5, "b"),
            Step::Line(6, "c"),
        ],
    );
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    let stats = run_to_end(&quiet_config(0), source, transport, clock).await;

    assert_eq!(
        recorded.lock().unwrap().texts(),
        vec![
            Message::limit_reached("Monitor", 0).into_text(),
            Message::overflow_report("Monitor", 2).into_text(),
            Message::limit_reached("Monitor", 0).into_text(),
        ]
    );
    assert_eq!(stats.rate_limited, 3);
    assert_eq!(stats.forwarded, 0);
}

#[tokio::test(start_paused = true)]
async fn test_blank_lines_are_skipped() {
    let clock = ManualClock::at(1);
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    let stats = run_to_end(
        &quiet_config(10),
        ScriptedSource::lines(&clock, 1, &["", "   ", "\t", "kept"]),
        transport,
        clock,
    )
    .await;

    assert_eq!(stats.lines_read, 1);
    assert_eq!(recorded.lock().unwrap().texts(), vec!["kept"]);
}

#[tokio::test(start_paused = true)]
async fn test_source_failure_drains_and_disconnects() {
    let clock = ManualClock::at(1);
    let source = ScriptedSource::new(
        &clock,
        vec![Step::Line(1, "before"), Step::Fail, Step::Line(1, "after")],
    );
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    let stats = run_to_end(&quiet_config(10), source, transport, clock).await;

    assert_eq!(stats.forwarded, 1);
    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.texts(), vec!["before"]);
    assert_eq!(recorded.disconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_while_awaiting_ready() {
    let clock = ManualClock::at(1);
    let mut config = quiet_config(10);
    config.timing.settle_delay_ms = 120_000;
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        trigger.trigger();
    });

    let start = Instant::now();
    let forwarder = Forwarder::new(
        &config,
        ScriptedSource::lines(&clock, 1, &["never sent"]),
        transport,
        Box::new(clock),
    );
    let stats = forwarder.run(receiver).await;

    assert_eq!(start.elapsed(), Duration::from_millis(3_500));
    assert_eq!(stats.lines_read, 0);
    let recorded = recorded.lock().unwrap();
    assert!(recorded.sent.is_empty());
    assert_eq!(recorded.disconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_while_forwarding() {
    let clock = ManualClock::at(1);
    let source = ScriptedSource::new(&clock, vec![Step::Line(1, "one"), Step::Hang]);
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        trigger.trigger();
    });

    let forwarder = Forwarder::new(&quiet_config(10), source, transport, Box::new(clock));
    let stats = forwarder.run(receiver).await;

    assert_eq!(stats.forwarded, 1);
    assert_eq!(recorded.lock().unwrap().disconnects, 1);
}

/// Echo target that keeps everything written to it.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Echo target whose reader has gone away.
#[derive(Clone, Default)]
struct BrokenPipe(Arc<AtomicUsize>);

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_echo_writes_every_classified_line() {
    let clock = ManualClock::at(1);
    let source = ScriptedSource::new(
        &clock,
        vec![
            Step::Line(1, r#"{"message":"hi"}"#),
            Step::Line(1, "plain"),
            Step::Line(1, "dropped"),
        ],
    );
    let echo = SharedBuffer::default();

    let shutdown = Shutdown::new();
    Forwarder::new(&quiet_config(2), source, MockTransport::default(), Box::new(clock))
        .with_echo(echo.clone())
        .run(shutdown.subscribe())
        .await;

    let written = String::from_utf8(echo.0.lock().unwrap().clone()).unwrap();
    assert_eq!(written, "hi\nplain\ndropped\n");
}

#[tokio::test(start_paused = true)]
async fn test_broken_echo_is_dropped_and_forwarding_continues() {
    let clock = ManualClock::at(1);
    let source = ScriptedSource::lines(&clock, 1, &["a", "b", "c"]);
    let transport = MockTransport::default();
    let recorded = transport.recorded.clone();
    let echo = BrokenPipe::default();

    let shutdown = Shutdown::new();
    let stats = Forwarder::new(&quiet_config(10), source, transport, Box::new(clock))
        .with_echo(echo.clone())
        .run(shutdown.subscribe())
        .await;

    // One failed write turns echo off for the rest of the run.
    assert_eq!(echo.0.load(Ordering::SeqCst), 1);
    assert_eq!(stats.forwarded, 3);
    assert_eq!(recorded.lock().unwrap().texts(), vec!["a", "b", "c"]);
}
