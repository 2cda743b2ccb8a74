use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::{Message, WebSocket};

use crate::error::{EngineError, EngineResult};
use crate::input::InputTracker;

use super::protocol;

/// How long one read waits before the I/O thread goes back to draining outbound messages.
const READ_POLL: Duration = Duration::from_millis(5);

enum Outbound {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

#[derive(Debug, Default)]
struct LinkState {
    closed: AtomicBool,
    /// First non-benign transport failure, reported once by the next `take_fault`.
    fault: Mutex<Option<String>>,
}

/// Handle on the websocket I/O thread.
///
/// Sends are queued and never block the caller. The I/O thread owns the
/// socket, drains the queue, and feeds every inbound line into the tracker.
pub struct RemoteLink {
    tx: Sender<Outbound>,
    state: Arc<LinkState>,
    thread: Option<JoinHandle<()>>,
}

impl RemoteLink {
    pub fn spawn(socket: WebSocket<TcpStream>, input: Arc<InputTracker>) -> EngineResult<Self> {
        socket
            .get_ref()
            .set_read_timeout(Some(READ_POLL))
            .map_err(|e| EngineError::Transport(format!("failed to configure socket: {e}")))?;

        let (tx, rx) = mpsc::channel();
        let state = Arc::new(LinkState::default());

        let thread_state = Arc::clone(&state);
        let thread = std::thread::Builder::new()
            .name("easel-remote-io".into())
            .spawn(move || run_io(socket, rx, input, thread_state))
            .map_err(|e| EngineError::Transport(format!("failed to spawn I/O thread: {e}")))?;

        Ok(Self { tx, state, thread: Some(thread) })
    }

    pub fn send_text(&self, text: String) {
        self.queue(Outbound::Text(text));
    }

    pub fn send_binary(&self, bytes: Vec<u8>) {
        self.queue(Outbound::Binary(bytes));
    }

    fn queue(&self, msg: Outbound) {
        if self.tx.send(msg).is_err() {
            self.state.closed.store(true, Ordering::Release);
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.state.closed.load(Ordering::Acquire)
    }

    /// Takes the recorded transport failure, if any.
    pub fn take_fault(&self) -> Option<EngineError> {
        self.state.fault.lock().take().map(EngineError::Transport)
    }

    /// Asks the peer to close and waits for the I/O thread to finish.
    pub fn close(&mut self) {
        let _ = self.tx.send(Outbound::Close);
        self.state.closed.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("remote I/O thread panicked");
            }
        }
    }
}

impl Drop for RemoteLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Whether a failure only means the peer is already gone.
fn is_benign(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Io(e) => matches!(
            e.kind(),
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof
        ),
        tungstenite::Error::Protocol(tungstenite::error::ProtocolError::ResetWithoutClosingHandshake) => true,
        _ => false,
    }
}

fn is_timeout(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut))
}

fn run_io(mut socket: WebSocket<TcpStream>, rx: Receiver<Outbound>, input: Arc<InputTracker>, state: Arc<LinkState>) {
    log::info!("remote session started");

    let outcome = loop {
        // ── outbound ──────────────────────────────────────────────────────
        let mut closing = false;
        let mut failed = None;
        loop {
            let msg = match rx.try_recv() {
                Ok(Outbound::Text(t)) => Message::text(t),
                Ok(Outbound::Binary(b)) => Message::binary(b),
                Ok(Outbound::Close) | Err(TryRecvError::Disconnected) => {
                    closing = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            };
            if let Err(e) = socket.send(msg) {
                failed = Some(e);
                break;
            }
        }
        if let Some(e) = failed {
            break Err(e);
        }
        if closing {
            let _ = socket.close(None);
            let _ = socket.flush();
            break Ok(());
        }

        // ── inbound ───────────────────────────────────────────────────────
        match socket.read() {
            Ok(Message::Text(text)) => {
                for line in text.lines().filter(|l| !l.is_empty()) {
                    match protocol::parse_inbound(line) {
                        Ok(ev) => input.report(ev),
                        Err(e) => log::debug!("inbound line dropped: {e}"),
                    }
                }
            }
            Ok(Message::Close(_)) => break Ok(()),
            Ok(_) => {}
            Err(e) if is_timeout(&e) => {}
            Err(e) => break Err(e),
        }
    };

    match outcome {
        Ok(()) => log::info!("remote session closed"),
        Err(e) if is_benign(&e) => log::info!("remote peer disconnected"),
        Err(e) => {
            log::error!("remote transport failed: {e}");
            *state.fault.lock() = Some(e.to_string());
        }
    }
    state.closed.store(true, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use super::*;
    use crate::input::{InputId, MouseButton};

    fn pair() -> (WebSocket<TcpStream>, WebSocket<TcpStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            tungstenite::client(format!("ws://{addr}/"), stream).unwrap().0
        });
        let (stream, _) = listener.accept().unwrap();
        let server = tungstenite::accept(stream).unwrap();
        (server, client.join().unwrap())
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn queued_text_reaches_the_peer() {
        let (server, mut client) = pair();
        let link = RemoteLink::spawn(server, Arc::new(InputTracker::new())).unwrap();

        link.send_text("clear    ".into());
        let msg = client.read().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "clear    ");
    }

    #[test]
    fn inbound_lines_feed_the_tracker() {
        let (server, mut client) = pair();
        let input = Arc::new(InputTracker::new());
        let _link = RemoteLink::spawn(server, Arc::clone(&input)).unwrap();

        client.send(Message::text("mouseMov 10,20\nmouseDwn 0\nbogus\n")).unwrap();

        let left = InputId::Mouse(MouseButton::Left);
        assert!(wait_for(|| input.freeze().is_held(&left)));
        let snap = input.freeze();
        assert!(snap.is_held(&left));
        assert_eq!((snap.mouse().x, snap.mouse().y), (10.0, 20.0));
    }

    #[test]
    fn peer_disconnect_is_benign() {
        let (server, client) = pair();
        let link = RemoteLink::spawn(server, Arc::new(InputTracker::new())).unwrap();

        drop(client);
        assert!(wait_for(|| !link.is_open()));
        assert!(link.take_fault().is_none());
    }
}
