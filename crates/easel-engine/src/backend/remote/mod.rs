//! Browser backend.
//!
//! A tiny HTTP server hands out the client page; the page opens a websocket
//! back to the same port. Frames go out as text batches in the line protocol,
//! images as binary messages sent once per path, and input comes back as
//! lines the I/O thread feeds into the tracker.

mod link;
pub mod protocol;
pub mod server;

pub use link::RemoteLink;

use std::collections::{HashMap, HashSet};
use std::net::TcpStream;
use std::sync::Arc;

use tungstenite::WebSocket;

use crate::backend::{Backend, Capabilities, ImageInfo};
use crate::error::{EngineError, EngineResult};
use crate::input::InputTracker;
use crate::scene::SharedFrames;

pub const NAME: &str = "remote";

struct CachedImage {
    info: ImageInfo,
    bytes: Arc<Vec<u8>>,
}

/// [`Backend`] writing to one connected browser.
pub struct RemoteBackend {
    link: RemoteLink,
    images: HashMap<String, CachedImage>,
    /// Paths whose bytes the client already holds.
    sent: HashSet<String>,
    size: (u32, u32),
}

impl RemoteBackend {
    /// Starts the I/O thread on an accepted websocket and sends the handshake.
    pub fn connect(
        socket: WebSocket<TcpStream>,
        input: Arc<InputTracker>,
        title: &str,
        width: u32,
        height: u32,
    ) -> EngineResult<Self> {
        let link = RemoteLink::spawn(socket, input)?;
        link.send_text(protocol::encode_handshake(title, width, height));
        Ok(Self { link, images: HashMap::new(), sent: HashSet::new(), size: (width, height) })
    }

    fn push_new_images(&mut self, paths: &[&str]) {
        for path in paths {
            if self.sent.contains(*path) {
                continue;
            }
            let Some(img) = self.images.get(*path) else {
                // Recorded only after a successful load, so this is unreachable in practice.
                log::warn!("image `{path}` referenced before it was loaded");
                continue;
            };
            self.link.send_binary(protocol::encode_image_payload(path, &img.bytes));
            self.sent.insert(path.to_string());
        }
    }
}

impl Backend for RemoteBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { resize: false, measure_text: false, font_family: true }
    }

    fn present(&mut self, frames: &SharedFrames) -> EngineResult<()> {
        if let Some(fault) = self.link.take_fault() {
            return Err(fault);
        }
        if !self.link.is_open() {
            return Ok(());
        }

        let display = frames.display();
        self.push_new_images(&display.image_paths());
        self.link.send_text(protocol::encode_frame(&display));
        Ok(())
    }

    fn load_image(&mut self, path: &str) -> EngineResult<ImageInfo> {
        if let Some(img) = self.images.get(path) {
            return Ok(img.info);
        }

        let bytes = std::fs::read(path).map_err(|e| EngineError::resource(path, e))?;
        let (width, height) = image::ImageReader::new(std::io::Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| EngineError::resource(path, e))?
            .into_dimensions()
            .map_err(|e| EngineError::resource(path, e))?;

        let info = ImageInfo { width, height };
        log::debug!("image cached for upload: {path} ({width}x{height}, {} bytes)", bytes.len());
        self.images.insert(path.to_string(), CachedImage { info, bytes: Arc::new(bytes) });
        Ok(info)
    }

    fn set_title(&mut self, title: &str) -> EngineResult<()> {
        self.link.send_text(protocol::encode_title(title));
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn is_open(&self) -> bool {
        self.link.is_open()
    }

    fn close(&mut self) {
        self.link.close();
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use tungstenite::Message;

    use super::*;
    use crate::coords::Vec2;
    use crate::error::Capability;
    use crate::paint::PaintState;
    use crate::scene::{DrawCmd, ImageCmd, SwapMode};

    fn connected() -> (RemoteBackend, WebSocket<TcpStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            tungstenite::client(format!("ws://{addr}/"), stream).unwrap().0
        });
        let ws = server::accept_session(&listener).unwrap();
        let backend = RemoteBackend::connect(ws, Arc::new(InputTracker::new()), "pong", 320, 240).unwrap();
        (backend, client.join().unwrap())
    }

    fn temp_png(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("easel-remote-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 255])).save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn declares_browser_capabilities() {
        let (backend, _client) = connected();
        let caps = backend.capabilities();
        assert!(caps.supports(Capability::FontFamily));
        assert!(!caps.supports(Capability::Resize));
        assert!(!caps.supports(Capability::MeasureText));
    }

    #[test]
    fn handshake_then_images_once_then_frames() {
        let (mut backend, mut client) = connected();
        let path = temp_png("dot.png");
        assert_eq!(backend.load_image(&path).unwrap(), ImageInfo { width: 4, height: 3 });

        let state = PaintState::default();
        let frames = SharedFrames::new(&state);
        let img = ImageCmd { at: Vec2::new(1.0, 2.0), scale: 1.0, angle: 0.0, path: path.clone(), centered: false };
        frames.record(DrawCmd::DrawImage(img));
        frames.swap(SwapMode::Accumulate, &state);

        backend.present(&frames).unwrap();
        backend.present(&frames).unwrap();

        let handshake = client.read().unwrap().into_text().unwrap();
        assert!(handshake.starts_with("setTitle pong"));

        let Message::Binary(payload) = client.read().unwrap() else { panic!("expected image payload") };
        let name_len = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
        assert_eq!(&payload[4..4 + name_len], path.as_bytes());

        for _ in 0..2 {
            let frame = client.read().unwrap().into_text().unwrap();
            assert!(frame.starts_with("clear"));
            assert!(frame.contains("drawImg "));
        }
    }

    #[test]
    fn missing_image_is_a_resource_error() {
        let (mut backend, _client) = connected();
        assert!(matches!(backend.load_image("/nonexistent/x.png"), Err(EngineError::ResourceLoad { .. })));
    }

    #[test]
    fn closed_peer_is_not_an_error() {
        let (mut backend, client) = connected();
        drop(client);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while backend.is_open() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(!backend.is_open());
        backend.present(&SharedFrames::new(&PaintState::default())).unwrap();
    }
}
