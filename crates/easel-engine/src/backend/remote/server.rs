use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tungstenite::WebSocket;

/// Bundled browser client.
pub const CLIENT_PAGE: &str = include_str!("../../../assets/client.html");

const MAX_HEADER: usize = 8 * 1024;
const HEADER_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum RequestKind {
    Upgrade,
    Page,
    NotFound,
}

/// Serves the client page until a browser opens the websocket.
///
/// Returns the first upgraded connection; plain page requests seen before it
/// are answered inline.
pub fn accept_session(listener: &TcpListener) -> Result<WebSocket<TcpStream>> {
    loop {
        let (stream, peer) = listener.accept().context("failed to accept connection")?;
        match classify(&stream) {
            Ok(RequestKind::Upgrade) => {
                log::info!("websocket connection from {peer}");
                stream.set_read_timeout(None).context("failed to reset socket timeout")?;
                match tungstenite::accept(stream) {
                    Ok(ws) => return Ok(ws),
                    Err(e) => log::warn!("websocket handshake with {peer} failed: {e}"),
                }
            }
            Ok(kind) => respond(stream, kind),
            Err(e) => log::debug!("dropping request from {peer}: {e}"),
        }
    }
}

/// Keeps answering on `listener` while a session runs: the page is still
/// served, further upgrades are refused with `503`.
pub fn spawn_busy_responder(listener: TcpListener) -> Result<()> {
    std::thread::Builder::new()
        .name("easel-remote-http".into())
        .spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                match classify(&stream) {
                    Ok(RequestKind::Upgrade) => {
                        log::warn!("refusing second websocket connection: session in progress");
                        let mut stream = stream;
                        drain_head(&mut stream);
                        let _ = write_response(stream, "503 Service Unavailable", "text/plain", b"session in progress");
                    }
                    Ok(kind) => respond(stream, kind),
                    Err(e) => log::debug!("dropping request: {e}"),
                }
            }
        })
        .context("failed to spawn HTTP responder")?;
    Ok(())
}

/// Peeks at the request head without consuming it, so an upgrade can still
/// be handed to the websocket handshake untouched.
fn classify(stream: &TcpStream) -> std::io::Result<RequestKind> {
    stream.set_read_timeout(Some(HEADER_TIMEOUT))?;

    let deadline = Instant::now() + HEADER_TIMEOUT;
    let mut buf = vec![0u8; MAX_HEADER];
    let head = loop {
        let n = stream.peek(&mut buf)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        if let Some(end) = find_header_end(&buf[..n]) {
            break String::from_utf8_lossy(&buf[..end]).into_owned();
        }
        if n == MAX_HEADER || Instant::now() >= deadline {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "request head too large or incomplete"));
        }
        std::thread::sleep(Duration::from_millis(2));
    };

    Ok(classify_head(&head))
}

fn classify_head(head: &str) -> RequestKind {
    let is_upgrade = head.lines().skip(1).any(|l| {
        l.split_once(':')
            .is_some_and(|(k, v)| k.trim().eq_ignore_ascii_case("upgrade") && v.trim().eq_ignore_ascii_case("websocket"))
    });
    if is_upgrade {
        return RequestKind::Upgrade;
    }

    let mut parts = head.lines().next().unwrap_or_default().split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some("/" | "/index.html")) => RequestKind::Page,
        _ => RequestKind::NotFound,
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Consumes the request head that `classify` only peeked at.
fn drain_head(stream: &mut TcpStream) {
    let mut sink = [0u8; MAX_HEADER];
    let _ = stream.read(&mut sink);
}

fn respond(mut stream: TcpStream, kind: RequestKind) {
    drain_head(&mut stream);

    let result = match kind {
        RequestKind::Page => write_response(stream, "200 OK", "text/html; charset=utf-8", CLIENT_PAGE.as_bytes()),
        _ => write_response(stream, "404 Not Found", "text/plain", b"not found"),
    };
    if let Err(e) = result {
        log::debug!("failed to write HTTP response: {e}");
    }
}

fn write_response(mut stream: TcpStream, status: &str, content_type: &str, body: &[u8]) -> std::io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(body)?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_request_heads() {
        let upgrade = "GET / HTTP/1.1\r\nHost: x\r\nConnection: Upgrade\r\nUpgrade: WebSocket\r\n\r\n";
        assert_eq!(classify_head(upgrade), RequestKind::Upgrade);
        assert_eq!(classify_head("GET / HTTP/1.1\r\nHost: x\r\n\r\n"), RequestKind::Page);
        assert_eq!(classify_head("GET /index.html HTTP/1.1\r\n\r\n"), RequestKind::Page);
        assert_eq!(classify_head("GET /favicon.ico HTTP/1.1\r\n\r\n"), RequestKind::NotFound);
        assert_eq!(classify_head("POST / HTTP/1.1\r\n\r\n"), RequestKind::NotFound);
    }

    #[test]
    fn serves_page_then_accepts_upgrade() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = std::thread::spawn(move || {
            let mut page = TcpStream::connect(addr).unwrap();
            page.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
            let mut body = String::new();
            page.read_to_string(&mut body).unwrap();
            assert!(body.starts_with("HTTP/1.1 200 OK"));
            assert!(body.contains("<canvas"));

            let stream = TcpStream::connect(addr).unwrap();
            tungstenite::client(format!("ws://{addr}/"), stream).unwrap().0
        });

        let ws = accept_session(&listener).unwrap();
        assert!(ws.can_write());

        // Second connection is refused while the session runs.
        spawn_busy_responder(listener).unwrap();
        let mut second = TcpStream::connect(addr).unwrap();
        second
            .write_all(b"GET / HTTP/1.1\r\nHost: x\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n")
            .unwrap();
        let mut reply = String::new();
        second.read_to_string(&mut reply).unwrap();
        assert!(reply.starts_with("HTTP/1.1 503"));

        drop(client.join().unwrap());
    }
}
