use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

/// Environment variable selecting the backend (`local` or `remote`).
pub const ENV_MODE: &str = "EASEL_MODE";
/// Listening port, required in remote mode.
pub const ENV_PORT: &str = "EASEL_PORT";
pub const ENV_TITLE: &str = "EASEL_TITLE";
/// Surface size as `WIDTHxHEIGHT`.
pub const ENV_SIZE: &str = "EASEL_SIZE";

/// Well-known locations of a regular sans-serif face, tried in order.
const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Which backend a program runs against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Mode {
    /// Native window on this machine.
    #[default]
    Local,
    /// Browser page served on `port`, driven over a websocket.
    Remote { port: u16 },
}

/// Launch settings.
///
/// Build one with the chained setters or read it from the environment with
/// [`LaunchConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    pub mode: Mode,
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Candidate font files for the local backend; the first readable one wins.
    pub font_paths: Vec<PathBuf>,
    /// Keep the local window open after the program returns.
    pub linger: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Local,
            title: "easel".to_string(),
            width: 800,
            height: 600,
            font_paths: DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect(),
            linger: true,
        }
    }
}

impl LaunchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Tries `path` before the built-in font locations.
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_paths.insert(0, path.into());
        self
    }

    pub fn linger(mut self, linger: bool) -> Self {
        self.linger = linger;
        self
    }

    /// Reads `EASEL_MODE`, `EASEL_PORT`, `EASEL_TITLE` and `EASEL_SIZE`.
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(title) = lookup(ENV_TITLE) {
            config.title = title;
        }

        if let Some(size) = lookup(ENV_SIZE) {
            let (w, h) = parse_size(&size)?;
            config.width = w;
            config.height = h;
        }

        let mode = lookup(ENV_MODE).unwrap_or_default();
        config.mode = match mode.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Mode::Local,
            "remote" => {
                let raw = lookup(ENV_PORT)
                    .ok_or_else(|| EngineError::Configuration(format!("{ENV_PORT} is required in remote mode")))?;
                let port = raw
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| EngineError::Configuration(format!("invalid {ENV_PORT} `{raw}`: {e}")))?;
                Mode::Remote { port }
            }
            other => {
                return Err(EngineError::Configuration(format!(
                    "invalid {ENV_MODE} `{other}` (expected `local` or `remote`)"
                )));
            }
        };

        Ok(config)
    }
}

fn parse_size(raw: &str) -> EngineResult<(u32, u32)> {
    let invalid = || EngineError::Configuration(format!("invalid {ENV_SIZE} `{raw}` (expected WIDTHxHEIGHT)"));
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}
