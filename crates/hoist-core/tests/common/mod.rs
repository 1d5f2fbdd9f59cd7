#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use hoist_core::{Launcher, UpdateEvent};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const EVENT_WAIT: Duration = Duration::from_secs(10);

/// How a raw fixture server answers its single connection.
pub struct RawResponse {
    pub content_length: Option<usize>,
    pub body: Vec<u8>,
    /// Keep the connection open this long after writing the body.
    pub hold_open: Duration,
}

/// Serve one HTTP response over a plain socket and close it. Unlike a mock
/// server this can announce more bytes than it sends, or omit the length.
pub async fn serve_raw(file_name: &str, response: RawResponse) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("fixture listener should bind");
    let addr = listener
        .local_addr()
        .expect("fixture listener should have an address");

    tokio::spawn(async move {
        let (mut socket, _) = listener
            .accept()
            .await
            .expect("fixture should accept a connection");

        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = socket
                .read(&mut buf)
                .await
                .expect("fixture should read the request");
            if read == 0 {
                return;
            }
            request.extend_from_slice(&buf[..read]);
        }

        let mut head = String::from("HTTP/1.1 200 OK\r\nConnection: close\r\n");
        if let Some(len) = response.content_length {
            head.push_str(&format!("Content-Length: {len}\r\n"));
        }
        head.push_str("\r\n");

        socket
            .write_all(head.as_bytes())
            .await
            .expect("fixture should write the head");
        socket
            .write_all(&response.body)
            .await
            .expect("fixture should write the body");
        socket.flush().await.expect("fixture should flush");
        tokio::time::sleep(response.hold_open).await;
    });

    format!("http://{addr}/files/{file_name}")
}

/// Address that refuses connections.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");
    drop(listener);
    format!("http://{addr}/releases/latest")
}

/// Accepts connections and never answers.
pub async fn silent_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/releases/latest")
}

pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub async fn next_event(events: &mut mpsc::Receiver<UpdateEvent>) -> UpdateEvent {
    tokio::time::timeout(EVENT_WAIT, events.recv())
        .await
        .expect("event should arrive in time")
        .expect("event channel should stay open")
}

/// Collect download events up to and including the terminal one.
pub async fn collect_download(events: &mut mpsc::Receiver<UpdateEvent>) -> (Vec<u8>, UpdateEvent) {
    let mut progress = Vec::new();
    loop {
        match next_event(events).await {
            UpdateEvent::DownloadProgress(pct) => progress.push(pct),
            terminal @ (UpdateEvent::DownloadFinished(_) | UpdateEvent::DownloadFailed(_)) => {
                return (progress, terminal);
            }
            other => panic!("unexpected event during download: {other:?}"),
        }
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    calls: Mutex<Vec<(&'static str, PathBuf)>>,
    pub fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, PathBuf)> {
        self.calls
            .lock()
            .expect("launcher lock should not be poisoned")
            .clone()
    }

    fn record(&self, kind: &'static str, path: &Path) -> std::io::Result<()> {
        self.calls
            .lock()
            .expect("launcher lock should not be poisoned")
            .push((kind, path.to_path_buf()));
        if self.fail {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "launch blocked",
            ))
        } else {
            Ok(())
        }
    }
}

impl Launcher for RecordingLauncher {
    fn spawn(&self, path: &Path) -> std::io::Result<()> {
        self.record("spawn", path)
    }

    fn open(&self, path: &Path) -> std::io::Result<()> {
        self.record("open", path)
    }
}
