//! In-process stand-ins for the backend, used by the module tests.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

type Handler = Arc<dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync>;

/// Minimal HTTP/1.1 server answering one request per connection. `delay` is
/// applied before each response so tests can hold requests in flight.
pub struct MockBackend {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    accept_task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(
        delay: Duration,
        handler: impl Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");

        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak_in_flight = Arc::new(AtomicUsize::new(0));
        let handler: Handler = Arc::new(handler);

        let requests_for_loop = Arc::clone(&requests);
        let in_flight_for_loop = Arc::clone(&in_flight);
        let peak_for_loop = Arc::clone(&peak_in_flight);

        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let requests = Arc::clone(&requests_for_loop);
                let in_flight = Arc::clone(&in_flight_for_loop);
                let peak = Arc::clone(&peak_for_loop);
                let handler = Arc::clone(&handler);

                tokio::spawn(async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(current, Ordering::SeqCst);

                    let result = serve_one(stream, delay, &handler, &requests).await;
                    if let Err(e) = result {
                        eprintln!("mock backend connection error: {}", e);
                    }

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            addr,
            requests,
            in_flight,
            peak_in_flight,
            accept_task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_one(
    mut stream: TcpStream,
    delay: Duration,
    handler: &Handler,
    requests: &Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()> {
    let request = read_request(&mut stream).await?;
    requests.lock().unwrap().push(request.clone());

    if delay > Duration::ZERO {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = handler(&request);
    let response = format!(
        "HTTP/1.1 {} MockBackend\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(index) = find_header_end(&buffer) {
            break index;
        }
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before headers",
            ));
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = headers.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let content_length = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .next()
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buffer.len() < body_start + content_length {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    let body = String::from_utf8_lossy(&buffer[body_start..buffer.len().min(body_start + content_length)])
        .to_string();

    Ok(RecordedRequest { method, path, body })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

/// WebSocket stand-in for the backend's progress channel. Accepts one
/// connection, sends the frames with `frame_delay` between them, then either
/// closes (simulating a backend that dies without a terminal frame) or waits
/// for the client to close.
pub async fn progress_server(
    frames: Vec<String>,
    frame_delay: Duration,
    close_without_terminal: bool,
) -> String {
    use tokio_tungstenite::tungstenite::Message;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind progress server");
    let addr = listener.local_addr().expect("progress server addr");

    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                for frame in frames {
                    if frame_delay > Duration::ZERO {
                        tokio::time::sleep(frame_delay).await;
                    }
                    if ws.send(Message::Text(frame)).await.is_err() {
                        return;
                    }
                }
                if close_without_terminal {
                    let _ = ws.close(None).await;
                } else {
                    while let Some(message) = ws.next().await {
                        if matches!(message, Ok(Message::Close(_)) | Err(_)) {
                            break;
                        }
                    }
                }
            }
        }
    });

    format!("ws://{}", addr)
}
