//! Line-oriented text protocol spoken between the server and explorers.
//!
//! Control channel (client -> server):
//!
//! ```text
//! <replyPort> <startX> <startY>
//! MOVE_UP | MOVE_DOWN | MOVE_LEFT | MOVE_RIGHT | EXIT
//! ```
//!
//! Reply channel (server -> client, dialed back by the server):
//!
//! ```text
//! MOVE <x> <y>
//! STATE (P <x> <y> | E <x> <y>)*
//! ```

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unexpected trailing field `{0}`")]
    ExtraField(String),
    #[error("invalid number for `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid reply port: {0:?}")]
    InvalidPort(String),
    #[error("unknown message: {0:?}")]
    UnknownMessage(String),
}

// === Client -> Server ===

/// First line sent on a control connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handshake {
    /// Port the client listens on for the reply channel
    pub reply_port: u16,
    pub start_x: f64,
    pub start_y: f64,
}

impl Handshake {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_whitespace();

        let port_token = tokens.next().ok_or(ProtocolError::MissingField("replyPort"))?;
        let reply_port = match port_token.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => return Err(ProtocolError::InvalidPort(port_token.to_string())),
        };
        let start_x = parse_coord(tokens.next(), "startX")?;
        let start_y = parse_coord(tokens.next(), "startY")?;

        if let Some(extra) = tokens.next() {
            return Err(ProtocolError::ExtraField(extra.to_string()));
        }

        Ok(Self {
            reply_port,
            start_x,
            start_y,
        })
    }
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {:?}", self.reply_port, self.start_x, self.start_y)
    }
}

/// Commands sent on the control channel after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMsg {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Exit,
}

impl ControlMsg {
    pub const ALL_MOVES: [ControlMsg; 4] = [
        ControlMsg::MoveUp,
        ControlMsg::MoveDown,
        ControlMsg::MoveLeft,
        ControlMsg::MoveRight,
    ];

    /// Parse a control line. Unknown tokens yield `None`; the server ignores them.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim_end() {
            "MOVE_UP" => Some(ControlMsg::MoveUp),
            "MOVE_DOWN" => Some(ControlMsg::MoveDown),
            "MOVE_LEFT" => Some(ControlMsg::MoveLeft),
            "MOVE_RIGHT" => Some(ControlMsg::MoveRight),
            "EXIT" => Some(ControlMsg::Exit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMsg::MoveUp => "MOVE_UP",
            ControlMsg::MoveDown => "MOVE_DOWN",
            ControlMsg::MoveLeft => "MOVE_LEFT",
            ControlMsg::MoveRight => "MOVE_RIGHT",
            ControlMsg::Exit => "EXIT",
        }
    }

    /// Position delta for a movement command. Screen coordinates: y grows downward.
    pub fn delta(&self, step: f64) -> Option<(f64, f64)> {
        match self {
            ControlMsg::MoveUp => Some((0.0, -step)),
            ControlMsg::MoveDown => Some((0.0, step)),
            ControlMsg::MoveLeft => Some((-step, 0.0)),
            ControlMsg::MoveRight => Some((step, 0.0)),
            ControlMsg::Exit => None,
        }
    }
}

impl fmt::Display for ControlMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === Server -> Client ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Particle,
    Explorer,
}

impl EntityKind {
    fn tag(&self) -> &'static str {
        match self {
            EntityKind::Particle => "P",
            EntityKind::Explorer => "E",
        }
    }
}

/// One entity in a `STATE` message, in absolute world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireEntity {
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMsg {
    /// Acknowledges one movement command with the resulting position
    Move { x: f64, y: f64 },
    /// Periphery snapshot for the receiving explorer
    State(Vec<WireEntity>),
}

impl ServerMsg {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("MOVE") => {
                let x = parse_coord(tokens.next(), "x")?;
                let y = parse_coord(tokens.next(), "y")?;
                if let Some(extra) = tokens.next() {
                    return Err(ProtocolError::ExtraField(extra.to_string()));
                }
                Ok(ServerMsg::Move { x, y })
            }
            Some("STATE") => {
                let mut entities = Vec::new();
                while let Some(tag) = tokens.next() {
                    let kind = match tag {
                        "P" => EntityKind::Particle,
                        "E" => EntityKind::Explorer,
                        other => return Err(ProtocolError::UnknownMessage(other.to_string())),
                    };
                    let x = parse_coord(tokens.next(), "x")?;
                    let y = parse_coord(tokens.next(), "y")?;
                    entities.push(WireEntity { kind, x, y });
                }
                Ok(ServerMsg::State(entities))
            }
            _ => Err(ProtocolError::UnknownMessage(line.to_string())),
        }
    }
}

impl fmt::Display for ServerMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMsg::Move { x, y } => write!(f, "MOVE {:?} {:?}", x, y),
            ServerMsg::State(entities) => {
                f.write_str("STATE")?;
                for e in entities {
                    write!(f, " {} {:?} {:?}", e.kind.tag(), e.x, e.y)?;
                }
                Ok(())
            }
        }
    }
}

fn parse_coord(token: Option<&str>, field: &'static str) -> Result<f64, ProtocolError> {
    let token = token.ok_or(ProtocolError::MissingField(field))?;
    match f64::from_str(token) {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ProtocolError::InvalidNumber {
            field,
            value: token.to_string(),
        }),
    }
}
