//! Integration tests for the HTTP appender.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use logfmt::{
    AppendError, AppenderConfig, HttpAppender, OverflowPolicy, Transport, TransportError,
};

#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

fn header<'a>(request: &'a CapturedRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Spawn a mock HTTP server that captures the first request and answers 200.
fn spawn_mock_server(listener: TcpListener) -> mpsc::Receiver<CapturedRequest> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            let _ = tx.send(read_request(stream));
        }
    });
    rx
}

fn read_request(mut stream: TcpStream) -> CapturedRequest {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase();
            let value = value.trim().to_owned();
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((key, value));
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("body");
    let response = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";
    stream.write_all(response.as_bytes()).expect("write response");
    CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

#[test]
fn posts_the_line_with_the_historical_headers() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let rx = spawn_mock_server(listener);

    let mut appender = HttpAppender::new(AppenderConfig::new(format!("http://{addr}/logs")));
    appender
        .append("key=value msg=hello".to_owned())
        .expect("append");
    assert!(appender.flush());

    let request = rx.recv_timeout(Duration::from_secs(5)).expect("request");
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/logs");
    assert_eq!(request.body, "key=value msg=hello");
    assert_eq!(
        header(&request, "content-type"),
        Some("application/json; charset=UTF-8")
    );
    assert_eq!(header(&request, "accept"), Some("application/json"));
    appender.close();
}

#[test]
fn transport_failure_is_swallowed() {
    // Nothing is listening on this port; append and flush must still
    // succeed from the producer's point of view.
    let mut appender = HttpAppender::new(AppenderConfig::new("http://127.0.0.1:9/logs"));
    appender.append("msg=lost".to_owned()).expect("append");
    assert!(appender.flush());
    appender.close();
}

/// Transport that records every line it receives.
struct RecordingTransport {
    sent: mpsc::Sender<String>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, line: &str) -> Result<String, TransportError> {
        self.sent.send(line.to_owned()).expect("record line");
        Ok(String::new())
    }
}

/// Transport that blocks on a gate, signalling when a send starts.
struct GatedTransport {
    started: mpsc::Sender<()>,
    gate: mpsc::Receiver<()>,
    sent: mpsc::Sender<String>,
}

impl Transport for GatedTransport {
    fn send(&mut self, line: &str) -> Result<String, TransportError> {
        self.started.send(()).expect("signal start");
        self.gate.recv().expect("await gate");
        self.sent.send(line.to_owned()).expect("record line");
        Ok(String::new())
    }
}

#[test]
fn lines_are_delivered_in_arrival_order() {
    let (sent_tx, sent_rx) = mpsc::channel();
    let transport = RecordingTransport { sent: sent_tx };
    let mut appender =
        HttpAppender::with_transport(transport, AppenderConfig::new("http://unused/"));

    for i in 0..5 {
        appender.append(format!("seq={i}")).expect("append");
    }
    assert!(appender.flush());
    appender.close();

    let lines: Vec<String> = sent_rx.try_iter().collect();
    assert_eq!(lines, ["seq=0", "seq=1", "seq=2", "seq=3", "seq=4"]);
}

#[test]
fn close_drains_queued_lines() {
    let (sent_tx, sent_rx) = mpsc::channel();
    let transport = RecordingTransport { sent: sent_tx };
    let mut appender =
        HttpAppender::with_transport(transport, AppenderConfig::new("http://unused/"));

    appender.append("msg=one".to_owned()).expect("append");
    appender.append("msg=two".to_owned()).expect("append");
    appender.close();

    let lines: Vec<String> = sent_rx.try_iter().collect();
    assert_eq!(lines, ["msg=one", "msg=two"]);
}

#[test]
fn append_after_close_reports_closed() {
    let (sent_tx, _sent_rx) = mpsc::channel();
    let transport = RecordingTransport { sent: sent_tx };
    let mut appender =
        HttpAppender::with_transport(transport, AppenderConfig::new("http://unused/"));

    appender.close();
    assert_eq!(
        appender.append("msg=late".to_owned()),
        Err(AppendError::Closed)
    );
}

#[test]
fn drop_policy_rejects_lines_when_the_queue_is_full() {
    let (started_tx, started_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel();
    let (sent_tx, sent_rx) = mpsc::channel();
    let transport = GatedTransport {
        started: started_tx,
        gate: gate_rx,
        sent: sent_tx,
    };
    let mut config = AppenderConfig::new("http://unused/");
    config.capacity = 1;
    config.overflow = OverflowPolicy::Drop;
    let mut appender = HttpAppender::with_transport(transport, config);

    appender.append("msg=first".to_owned()).expect("append");
    // Wait until the worker is busy with the first line, then fill the
    // single queue slot.
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("worker started");
    appender.append("msg=second".to_owned()).expect("append");
    assert_eq!(
        appender.append("msg=third".to_owned()),
        Err(AppendError::QueueFull)
    );

    gate_tx.send(()).expect("release first");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("second started");
    gate_tx.send(()).expect("release second");
    appender.close();

    let lines: Vec<String> = sent_rx.try_iter().collect();
    assert_eq!(lines, ["msg=first", "msg=second"]);
}

#[test]
fn timeout_policy_reports_timeout() {
    let (started_tx, started_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel();
    let (sent_tx, _sent_rx) = mpsc::channel();
    let transport = GatedTransport {
        started: started_tx,
        gate: gate_rx,
        sent: sent_tx,
    };
    let timeout = Duration::from_millis(50);
    let mut config = AppenderConfig::new("http://unused/");
    config.capacity = 1;
    config.overflow = OverflowPolicy::Timeout(timeout);
    let mut appender = HttpAppender::with_transport(transport, config);

    appender.append("msg=first".to_owned()).expect("append");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("worker started");
    appender.append("msg=second".to_owned()).expect("append");
    assert_eq!(
        appender.append("msg=third".to_owned()),
        Err(AppendError::Timeout(timeout))
    );

    gate_tx.send(()).expect("release first");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("second started");
    gate_tx.send(()).expect("release second");
    appender.close();
}
