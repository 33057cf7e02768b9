// filepath: tests/time_server_tests.rs
// 时间服务器 HTTP 测试, with a recording clock instead of timedatectl.

use async_trait::async_trait;
use axum_test::TestServer;
use chain_healthcheck::api::{ClockError, ClockSetter, TimeServer};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct RecordingClock {
    set_calls: Mutex<Vec<String>>,
    ntp_calls: Mutex<usize>,
    fail: bool,
}

impl RecordingClock {
    fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    fn result(&self, command: &str) -> Result<(), ClockError> {
        if self.fail {
            Err(ClockError::Failed { command: command.to_string(), status: "exit status: 1".into() })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClockSetter for RecordingClock {
    async fn disable_ntp(&self) -> Result<(), ClockError> {
        *self.ntp_calls.lock() += 1;
        self.result("timedatectl set-ntp false")
    }

    async fn set_time(&self, timestamp: &str) -> Result<(), ClockError> {
        self.set_calls.lock().push(timestamp.to_string());
        self.result("timedatectl set-time")
    }
}

struct Body {
    changed: bool,
    old_time: String,
    new_time: String,
}

/// Parse the `{\nchanged: ..,\noldTime: "..",\nnewTime: ".."\n}` body.
fn parse_body(text: &str) -> Body {
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5, "unexpected body: {:?}", text);
    assert_eq!(lines[0], "{");
    assert_eq!(lines[4], "}");
    let quoted = |line: &str, key: &str| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(": \""))
            .and_then(|rest| rest.trim_end_matches(',').strip_suffix('"'))
            .unwrap_or_else(|| panic!("bad {} line: {:?}", key, line))
            .to_string()
    };
    Body {
        changed: match lines[1] {
            "changed: true," => true,
            "changed: false," => false,
            other => panic!("bad changed line: {:?}", other),
        },
        old_time: quoted(lines[2], "oldTime"),
        new_time: quoted(lines[3], "newTime"),
    }
}

fn server_with(clock: Arc<RecordingClock>) -> TestServer {
    let server = TimeServer::new("127.0.0.1:0", clock);
    TestServer::new(server.create_router()).unwrap()
}

#[tokio::test]
async fn valid_timestamp_sets_clock() {
    let clock = Arc::new(RecordingClock::default());
    let server = server_with(Arc::clone(&clock));

    let response = server.get("/2021-03-30%2005:25:55").await;

    response.assert_status_ok();
    let body = parse_body(&response.text());
    assert!(body.changed);
    assert!(!body.old_time.is_empty());
    assert!(!body.new_time.is_empty());
    assert_eq!(*clock.set_calls.lock(), vec!["2021-03-30 05:25:55".to_string()]);
}

#[tokio::test]
async fn any_method_is_accepted() {
    let clock = Arc::new(RecordingClock::default());
    let server = server_with(Arc::clone(&clock));

    let body = parse_body(&server.post("/2030-01-01%2000:00:00").await.text());

    assert!(body.changed);
    assert_eq!(clock.set_calls.lock().len(), 1);
}

#[tokio::test]
async fn malformed_timestamp_leaves_clock_alone() {
    let clock = Arc::new(RecordingClock::default());
    let server = server_with(Arc::clone(&clock));

    for path in ["/2021-03-30T05:25:55", "/yesterday", "/2021-03-30%2005:25:55/extra"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body = parse_body(&response.text());
        assert!(!body.changed, "{} must not change the clock", path);
        assert_eq!(body.old_time, body.new_time);
    }
    assert!(clock.set_calls.lock().is_empty());
}

#[tokio::test]
async fn root_path_reports_unchanged() {
    let clock = Arc::new(RecordingClock::default());
    let server = server_with(Arc::clone(&clock));

    let body = parse_body(&server.get("/").await.text());

    assert!(!body.changed);
    assert_eq!(body.old_time, body.new_time);
    assert!(clock.set_calls.lock().is_empty());
}

#[tokio::test]
async fn clock_failure_reports_unchanged() {
    let clock = Arc::new(RecordingClock::failing());
    let server = server_with(Arc::clone(&clock));

    let response = server.get("/2021-03-30%2005:25:55").await;

    response.assert_status_ok();
    let body = parse_body(&response.text());
    assert!(!body.changed);
    assert_eq!(body.old_time, body.new_time);
    assert_eq!(clock.set_calls.lock().len(), 1);
}

#[tokio::test]
async fn startup_aborts_when_ntp_cannot_be_disabled() {
    let clock = Arc::new(RecordingClock::failing());

    let result = TimeServer::new("127.0.0.1:0", Arc::clone(&clock) as Arc<dyn ClockSetter>).start().await;

    let err = result.expect_err("startup must fail");
    assert!(err.to_string().contains("NTP"), "{}", err);
    assert_eq!(*clock.ntp_calls.lock(), 1);
    assert!(clock.set_calls.lock().is_empty());
}
