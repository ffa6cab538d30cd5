//! Error types for the explorer server.

use explorer_shared::protocol::ProtocolError;

/// Errors from world operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// Population requests are refused while the world is explorer-only.
    #[error("world is in explorer-only mode; population rejected")]
    ExplorerOnly,

    /// A population request carried a non-finite value or an unusable range.
    #[error("invalid population request: {0}")]
    InvalidPopulation(String),

    /// The world loop has shut down.
    #[error("world loop is no longer running")]
    Closed,
}

/// Errors that end a single explorer session. They never affect other sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The first line was not `<replyPort> <startX> <startY>`.
    #[error("bad handshake: {0}")]
    Handshake(#[from] ProtocolError),

    /// The control connection closed before a handshake arrived.
    #[error("connection closed before handshake")]
    HandshakeClosed,

    /// The handshake did not arrive within the idle timeout.
    #[error("no handshake within idle timeout")]
    HandshakeTimeout,

    /// The handshake line exceeded the control line length cap.
    #[error("handshake line too long")]
    LineTooLong,

    /// Dialing back to the client's reply port failed.
    #[error("reply channel dial failed: {0}")]
    Dial(#[source] std::io::Error),

    /// Reading the control socket failed before the session became active.
    #[error("control socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    World(#[from] WorldError),
}

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
