use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use winit::event_loop::EventLoop;

use crate::backend::local::{FontFace, ImageStore, LocalApp, LocalBackend, LocalShared, Rasterizer, RenderRequest};
use crate::backend::remote::{server, RemoteBackend};
use crate::config::{LaunchConfig, Mode};
use crate::core::Engine;
use crate::input::InputTracker;
use crate::paint::PaintState;
use crate::scene::SharedFrames;

/// How long the program thread gets to notice a closed window before it is detached.
const PROGRAM_GRACE: Duration = Duration::from_secs(2);

/// Runs `program` against the backend selected by `config`.
///
/// Local mode must be called from the main thread: the window event loop
/// takes it over and the program runs on a thread of its own. Remote mode
/// blocks until a browser connects, then runs the program on the calling
/// thread.
pub fn launch<F>(config: LaunchConfig, program: F) -> Result<()>
where
    F: FnOnce(&mut Engine) -> Result<()> + Send + 'static,
{
    match config.mode {
        Mode::Local => launch_local(config, program),
        Mode::Remote { port } => launch_remote(config, port, program),
    }
}

/// [`launch`] with settings read from the environment.
pub fn launch_from_env<F>(program: F) -> Result<()>
where
    F: FnOnce(&mut Engine) -> Result<()> + Send + 'static,
{
    let config = LaunchConfig::from_env().context("invalid launch configuration")?;
    launch(config, program)
}

fn load_font(config: &LaunchConfig) -> Option<Arc<FontFace>> {
    match FontFace::load(&config.font_paths) {
        Ok(face) => {
            log::info!("font loaded: {}", face.source().display());
            Some(Arc::new(face))
        }
        Err(e) => {
            log::warn!("{e}; text will not be drawn");
            None
        }
    }
}

fn launch_local<F>(config: LaunchConfig, program: F) -> Result<()>
where
    F: FnOnce(&mut Engine) -> Result<()> + Send + 'static,
{
    let event_loop = EventLoop::<RenderRequest>::with_user_event()
        .build()
        .context("failed to create winit EventLoop")?;
    let proxy = event_loop.create_proxy();

    let frames = SharedFrames::new(&PaintState::default());
    let input = Arc::new(InputTracker::new());
    let shared = Arc::new(LocalShared::new(config.width, config.height));
    let images = ImageStore::new();
    let font = load_font(&config);

    let backend = LocalBackend::new(proxy.clone(), Arc::clone(&shared), images.clone(), font.clone());
    let mut app = LocalApp::new(
        config.title.clone(),
        Arc::clone(&shared),
        frames.clone(),
        Arc::clone(&input),
        Rasterizer::new(font, images),
        config.linger,
    );

    let program_thread = thread::Builder::new()
        .name("easel-program".into())
        .spawn(move || {
            let mut engine = Engine::new(Box::new(backend), frames, input);
            let result = program(&mut engine);
            let _ = proxy.send_event(RenderRequest::ProgramFinished);
            result
        })
        .context("failed to spawn program thread")?;

    let loop_result = event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error");
    shared.mark_closed();

    let program_result = finish_program(program_thread);
    loop_result?;
    if let Some(e) = app.take_failure() {
        return Err(e);
    }
    program_result
}

/// Joins the program thread if it stops within the grace period.
fn finish_program(handle: JoinHandle<Result<()>>) -> Result<()> {
    let deadline = Instant::now() + PROGRAM_GRACE;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("program did not stop after the window closed; detaching it");
            return Ok(());
        }
        thread::sleep(Duration::from_millis(10));
    }
    handle.join().map_err(|_| anyhow!("program thread panicked"))?
}

fn launch_remote<F>(config: LaunchConfig, port: u16, program: F) -> Result<()>
where
    F: FnOnce(&mut Engine) -> Result<()>,
{
    let listener = TcpListener::bind(("0.0.0.0", port)).with_context(|| format!("failed to listen on port {port}"))?;
    log::info!("waiting for a browser on http://localhost:{port}/");

    let socket = server::accept_session(&listener)?;
    server::spawn_busy_responder(listener)?;

    let frames = SharedFrames::new(&PaintState::default());
    let input = Arc::new(InputTracker::new());
    let backend = RemoteBackend::connect(socket, Arc::clone(&input), &config.title, config.width, config.height)
        .context("failed to start remote session")?;

    let mut engine = Engine::new(Box::new(backend), frames, input);
    let result = program(&mut engine);

    if result.is_ok() && config.linger {
        log::info!("program finished; session stays open until the browser disconnects");
        engine.wait_until_closed();
    }
    engine.close();
    result
}
