//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use siren::model::{EntityId, Status};
use siren::notify::{Notifier, NotifyError};
use siren::pipeline::Monitor;
use siren::scheduler::RoundEvent;
use siren::store::Subscriber;

/// Start a programmable mock upstream on an ephemeral port.
///
/// The handler receives the request path and returns a status code and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let path = read_request_path(&mut socket).await;
                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            302 => "302 Found",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let location = if status == 302 { "Location: /\r\n" } else { "" };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            location,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_path(socket: &mut tokio::net::TcpStream) -> String {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&request)
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string()
}

/// Notifier recording everything it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<(EntityId, Status)>>,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<(EntityId, Status)> {
        std::mem::take(&mut *self.notifications.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _: &Subscriber, entity: &EntityId, status: Status) -> Result<(), NotifyError> {
        self.notifications.lock().unwrap().push((entity.clone(), status));
        Ok(())
    }

    async fn alert(&self, _: &Subscriber, text: &str) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Feed one round of scheduler events through the pipeline.
///
/// Returns the round's `(entity, status)` results and whether it failed.
pub async fn drive_round(
    events: &mut mpsc::Receiver<RoundEvent>,
    monitor: &mut Monitor,
) -> (Vec<(EntityId, Status)>, bool) {
    let mut results = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("round timed out")
            .expect("scheduler stopped");
        match event {
            RoundEvent::Result(result) => {
                results.push((result.entity.clone(), result.status));
                monitor.handle_result(&result).await;
            }
            RoundEvent::Completed { failed, .. } => return (results, failed),
        }
    }
}
