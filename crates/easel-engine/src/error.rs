use thiserror::Error;

/// Errors surfaced by the engine and its backends.
///
/// Each variant maps to one failure class with its own propagation rule:
/// configuration and capability failures are synchronous and leave state untouched,
/// resource failures are fatal for the call that triggered the load, transport failures
/// are fatal for the delivery that observes them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Invalid component registration or launch setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The active backend declared this capability as unavailable.
    #[error("{backend} backend does not support {capability}")]
    Unsupported {
        backend: &'static str,
        capability: Capability,
    },

    /// An image could not be read or decoded.
    #[error("failed to load resource `{path}`: {reason}")]
    ResourceLoad { path: String, reason: String },

    /// A raw key or button name outside the recognized vocabulary.
    #[error("invalid input identifier: {0}")]
    InvalidInput(String),

    /// The remote connection failed for a reason other than being closed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A malformed line on the remote wire.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Optional backend features that may be declared unsupported.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Capability {
    Resize,
    MeasureText,
    FontFamily,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Resize => "runtime resizing",
            Capability::MeasureText => "precise text measurement",
            Capability::FontFamily => "font family changes",
        };
        f.write_str(s)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn resource(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceLoad { path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn unsupported(backend: &'static str, capability: Capability) -> Self {
        Self::Unsupported { backend, capability }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_backend_and_capability() {
        let err = EngineError::unsupported("remote", Capability::MeasureText);
        assert_eq!(err.to_string(), "remote backend does not support precise text measurement");
    }

    #[test]
    fn resource_error_keeps_path() {
        let err = EngineError::resource("img/cat.png", "not found");
        assert_eq!(err.to_string(), "failed to load resource `img/cat.png`: not found");
    }
}
