//! One explorer session: handshake, reverse-dialed reply channel, and the
//! command and broadcast loops that run until the client leaves.

use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::world_loop::WorldHandle;
use explorer_shared::protocol::{ControlMsg, Handshake, ServerMsg};
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// How long to wait for the client's reply listener to accept
const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a single reply write may stall before the session is dropped
const REPLY_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest control line accepted, excluding the newline
pub const MAX_LINE_LEN: usize = 1024;

/// Opens the server -> client reply channel advertised in the handshake.
pub trait ReplyDialer: Send + Sync + 'static {
    type Sink: AsyncWrite + Unpin + Send + 'static;

    fn dial(&self, addr: SocketAddr) -> impl Future<Output = io::Result<Self::Sink>> + Send;
}

/// Dials reply channels over TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl ReplyDialer for TcpDialer {
    type Sink = TcpStream;

    fn dial(&self, addr: SocketAddr) -> impl Future<Output = io::Result<Self::Sink>> + Send {
        async move {
            let stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            Ok(stream)
        }
    }
}

/// Per-session settings derived from the server config
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub step: f64,
    pub broadcast_interval: Duration,
    pub idle_timeout: Option<Duration>,
    pub write_timeout: Duration,
}

impl SessionConfig {
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self {
            step: config.world.step,
            broadcast_interval: config.broadcast_interval(),
            idle_timeout: config.idle_timeout(),
            write_timeout: REPLY_WRITE_TIMEOUT,
        }
    }
}

/// How an active session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Client sent `EXIT`
    Exited,
    /// Control stream ended or either socket failed
    Disconnected,
    /// No control line within the idle timeout
    TimedOut,
}

#[derive(Debug, PartialEq)]
enum ControlLine {
    Text(String),
    TooLong,
    Closed,
    TimedOut,
}

/// Newline-delimited control reader with a per-line length cap. Bytes that
/// are not valid UTF-8 are replaced rather than rejected.
struct ControlReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> ControlReader<R> {
    fn new(control: R) -> Self {
        Self {
            reader: BufReader::new(control),
            buf: Vec::new(),
        }
    }

    /// Partial lines stay in `buf`, so a cancelled call loses nothing.
    async fn read_line(&mut self) -> io::Result<ControlLine> {
        let budget = (MAX_LINE_LEN + 2).saturating_sub(self.buf.len()) as u64;
        let n = (&mut self.reader)
            .take(budget)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            if self.buf.len() > MAX_LINE_LEN {
                return Ok(ControlLine::TooLong);
            }
            return Ok(ControlLine::Text(self.take_text()));
        }
        if self.buf.len() > MAX_LINE_LEN {
            return Ok(ControlLine::TooLong);
        }
        if n == 0 && self.buf.is_empty() {
            return Ok(ControlLine::Closed);
        }
        // Final line without a newline
        Ok(ControlLine::Text(self.take_text()))
    }

    fn take_text(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        text
    }

    async fn next_line(&mut self, idle_timeout: Option<Duration>) -> io::Result<ControlLine> {
        match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.read_line()).await {
                Ok(line) => line,
                Err(_) => Ok(ControlLine::TimedOut),
            },
            None => self.read_line().await,
        }
    }
}

async fn write_msg<W: AsyncWrite + Unpin>(
    sink: &mut W,
    msg: &ServerMsg,
    limit: Duration,
) -> io::Result<()> {
    let mut line = msg.to_string();
    line.push('\n');
    let write = async {
        sink.write_all(line.as_bytes()).await?;
        sink.flush().await
    };
    match tokio::time::timeout(limit, write).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "reply write stalled")),
    }
}

/// Drive one explorer connection from handshake to cleanup.
///
/// Handshake, dial and registration failures return an error with no explorer
/// registered. Once active, every exit path deregisters the explorer and
/// closes the reply channel; only a stopped world loop surfaces as an error.
pub async fn run_session<R, D>(
    control: R,
    peer_ip: IpAddr,
    dialer: &D,
    world: WorldHandle,
    config: SessionConfig,
) -> Result<SessionOutcome, SessionError>
where
    R: AsyncRead + Unpin,
    D: ReplyDialer,
{
    let mut control = ControlReader::new(control);

    let handshake = match control.next_line(config.idle_timeout).await? {
        ControlLine::Text(text) => Handshake::parse(&text)?,
        ControlLine::TooLong => return Err(SessionError::LineTooLong),
        ControlLine::Closed => return Err(SessionError::HandshakeClosed),
        ControlLine::TimedOut => return Err(SessionError::HandshakeTimeout),
    };

    let reply_addr = SocketAddr::new(peer_ip, handshake.reply_port);
    let reply = match tokio::time::timeout(DIAL_TIMEOUT, dialer.dial(reply_addr)).await {
        Ok(Ok(sink)) => sink,
        Ok(Err(e)) => return Err(SessionError::Dial(e)),
        Err(_) => {
            return Err(SessionError::Dial(io::Error::new(
                io::ErrorKind::TimedOut,
                "reply dial timed out",
            )))
        }
    };

    let id = world.register(handshake.start_x, handshake.start_y).await?;
    tracing::info!("Explorer {} joined from {} (reply {})", id, peer_ip, reply_addr);

    let sink = Arc::new(Mutex::new(reply));
    let mut broadcaster = tokio::spawn(broadcast_loop(
        id,
        world.clone(),
        sink.clone(),
        config.broadcast_interval,
        config.write_timeout,
    ));

    let result = command_loop(id, &mut control, &world, &sink, &mut broadcaster, config).await;

    broadcaster.abort();
    let _ = world.remove(id).await;
    let _ = sink.lock().await.shutdown().await;

    match &result {
        Ok(outcome) => tracing::info!("Explorer {} left ({:?})", id, outcome),
        Err(e) => tracing::warn!("Explorer {} dropped: {}", id, e),
    }
    result
}

async fn command_loop<R, W>(
    id: u32,
    control: &mut ControlReader<R>,
    world: &WorldHandle,
    sink: &Mutex<W>,
    broadcaster: &mut tokio::task::JoinHandle<Result<(), SessionError>>,
    config: SessionConfig,
) -> Result<SessionOutcome, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            line = control.next_line(config.idle_timeout) => {
                let text = match line {
                    Ok(ControlLine::Text(text)) => text,
                    Ok(ControlLine::TooLong) => {
                        tracing::warn!(
                            "Explorer {} sent a control line over {} bytes",
                            id,
                            MAX_LINE_LEN
                        );
                        return Ok(SessionOutcome::Disconnected);
                    }
                    Ok(ControlLine::Closed) => return Ok(SessionOutcome::Disconnected),
                    Ok(ControlLine::TimedOut) => return Ok(SessionOutcome::TimedOut),
                    Err(e) => {
                        tracing::debug!("Explorer {} control read failed: {}", id, e);
                        return Ok(SessionOutcome::Disconnected);
                    }
                };

                let Some(cmd) = ControlMsg::parse(&text) else {
                    tracing::debug!("Explorer {} sent unknown command {:?}", id, text);
                    continue;
                };
                let Some((dx, dy)) = cmd.delta(config.step) else {
                    return Ok(SessionOutcome::Exited);
                };

                // Hold the sink across move + ack so no broadcast showing the
                // new position can be written before its ack.
                let mut sink = sink.lock().await;
                let Some((x, y)) = world.move_explorer(id, dx, dy).await? else {
                    continue;
                };
                let ack = ServerMsg::Move { x, y };
                if let Err(e) = write_msg(&mut *sink, &ack, config.write_timeout).await {
                    tracing::debug!("Explorer {} reply write failed: {}", id, e);
                    return Ok(SessionOutcome::Disconnected);
                }
            }

            finished = &mut *broadcaster => {
                if let Ok(Err(e)) = finished {
                    tracing::debug!("Explorer {} broadcast stopped: {}", id, e);
                }
                return Ok(SessionOutcome::Disconnected);
            }
        }
    }
}

async fn broadcast_loop<W>(
    id: u32,
    world: WorldHandle,
    sink: Arc<Mutex<W>>,
    period: Duration,
    write_timeout: Duration,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let mut sink = sink.lock().await;
        let Some(snapshot) = world.snapshot(id).await? else {
            return Ok(());
        };
        write_msg(&mut *sink, &snapshot.into_message(), write_timeout).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PopulateRequest;
    use std::sync::Mutex as StdMutex;
    use tokio::io::{AsyncBufReadExt, DuplexStream};
    use tokio::sync::mpsc;

    /// Hands out one in-memory reply pipe and remembers where it was asked to dial.
    struct PipeDialer {
        server_end: StdMutex<Option<DuplexStream>>,
        dialed: StdMutex<Vec<SocketAddr>>,
    }

    impl PipeDialer {
        fn new() -> (Self, DuplexStream) {
            Self::with_capacity(64 * 1024)
        }

        fn with_capacity(capacity: usize) -> (Self, DuplexStream) {
            let (server_end, client_end) = tokio::io::duplex(capacity);
            let dialer = Self {
                server_end: StdMutex::new(Some(server_end)),
                dialed: StdMutex::new(Vec::new()),
            };
            (dialer, client_end)
        }
    }

    impl ReplyDialer for PipeDialer {
        type Sink = DuplexStream;

        fn dial(&self, addr: SocketAddr) -> impl Future<Output = io::Result<Self::Sink>> + Send {
            self.dialed.lock().unwrap().push(addr);
            let sink = self.server_end.lock().unwrap().take();
            async move {
                sink.ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "no pipe"))
            }
        }
    }

    struct RefusingDialer;

    impl ReplyDialer for RefusingDialer {
        type Sink = DuplexStream;

        fn dial(&self, _addr: SocketAddr) -> impl Future<Output = io::Result<Self::Sink>> + Send {
            async { Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")) }
        }
    }

    fn session_config() -> SessionConfig {
        SessionConfig::from_server_config(&ServerConfig::default())
    }

    fn localhost() -> IpAddr {
        IpAddr::from([127, 0, 0, 1])
    }

    /// Forward every reply line into a channel so the pipe never fills up.
    fn collect_replies(client_end: DuplexStream) -> mpsc::UnboundedReceiver<ServerMsg> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(client_end).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(ServerMsg::parse(&line).unwrap()).is_err() {
                    break;
                }
            }
        });
        rx
    }

    async fn next_ack(rx: &mut mpsc::UnboundedReceiver<ServerMsg>) -> (f64, f64) {
        loop {
            match rx.recv().await.expect("reply channel closed") {
                ServerMsg::Move { x, y } => return (x, y),
                ServerMsg::State(_) => continue,
            }
        }
    }

    #[tokio::test]
    async fn five_moves_up_are_acked_in_order() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let mut replies = collect_replies(client_end);

        let session = {
            let world = world.clone();
            tokio::spawn(async move {
                run_session(control_server, localhost(), &dialer, world, session_config()).await
            })
        };

        control_client.write_all(b"7000 100 100\n").await.unwrap();
        for _ in 0..5 {
            control_client.write_all(b"MOVE_UP\n").await.unwrap();
        }

        let mut acks = Vec::new();
        for _ in 0..5 {
            acks.push(next_ack(&mut replies).await);
        }
        assert_eq!(
            acks,
            vec![(100.0, 95.0), (100.0, 90.0), (100.0, 85.0), (100.0, 80.0), (100.0, 75.0)]
        );

        control_client.write_all(b"EXIT\n").await.unwrap();
        let outcome = session.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::Exited);
        assert_eq!(world.stats().await.unwrap().explorers, 0);
    }

    #[tokio::test]
    async fn dials_back_to_advertised_port() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let dialer = Arc::new(dialer);
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let mut replies = collect_replies(client_end);

        let session = {
            let world = world.clone();
            let dialer = dialer.clone();
            tokio::spawn(async move {
                run_session(control_server, localhost(), dialer.as_ref(), world, session_config())
                    .await
            })
        };

        control_client.write_all(b"6123 10 10\n").await.unwrap();
        // First broadcast arrives once the session is active
        assert!(matches!(replies.recv().await, Some(ServerMsg::State(_))));
        assert_eq!(
            dialer.dialed.lock().unwrap().as_slice(),
            &[SocketAddr::new(localhost(), 6123)]
        );

        drop(control_client);
        assert_eq!(
            session.await.unwrap().unwrap(),
            SessionOutcome::Disconnected
        );
    }

    #[tokio::test]
    async fn move_left_at_edge_clamps_to_zero() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let mut replies = collect_replies(client_end);

        let world_for_session = world.clone();
        tokio::spawn(async move {
            run_session(control_server, localhost(), &dialer, world_for_session, session_config())
                .await
        });

        control_client.write_all(b"7000 5 5\nMOVE_LEFT\nMOVE_LEFT\n").await.unwrap();
        assert_eq!(next_ack(&mut replies).await, (0.0, 5.0));
        assert_eq!(next_ack(&mut replies).await, (0.0, 5.0));
    }

    #[tokio::test]
    async fn unknown_commands_are_ignored() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let mut replies = collect_replies(client_end);

        tokio::spawn(async move {
            run_session(control_server, localhost(), &dialer, world, session_config()).await
        });

        control_client
            .write_all(b"300 300 300\nJUMP\nmove_up\n\nMOVE_RIGHT\n")
            .await
            .unwrap();
        assert_eq!(next_ack(&mut replies).await, (305.0, 300.0));
    }

    #[tokio::test]
    async fn malformed_handshake_registers_nothing() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, _client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);

        control_client.write_all(b"abc\n").await.unwrap();
        let result =
            run_session(control_server, localhost(), &dialer, world.clone(), session_config())
                .await;

        assert!(matches!(result, Err(SessionError::Handshake(_))));
        assert!(dialer.dialed.lock().unwrap().is_empty());
        assert_eq!(world.stats().await.unwrap().explorers, 0);
    }

    #[tokio::test]
    async fn unreachable_reply_port_registers_nothing() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (mut control_client, control_server) = tokio::io::duplex(1024);

        control_client.write_all(b"7000 1 1\n").await.unwrap();
        let result = run_session(
            control_server,
            localhost(),
            &RefusingDialer,
            world.clone(),
            session_config(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::Dial(_))));
        assert_eq!(world.stats().await.unwrap().explorers, 0);
    }

    #[tokio::test]
    async fn closed_before_handshake() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, _client_end) = PipeDialer::new();
        let (control_client, control_server) = tokio::io::duplex(1024);
        drop(control_client);

        let result =
            run_session(control_server, localhost(), &dialer, world, session_config()).await;
        assert!(matches!(result, Err(SessionError::HandshakeClosed)));
    }

    #[tokio::test]
    async fn dropped_reply_channel_ends_session() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);

        let session = {
            let world = world.clone();
            tokio::spawn(async move {
                run_session(control_server, localhost(), &dialer, world, session_config()).await
            })
        };

        control_client.write_all(b"7000 50 50\n").await.unwrap();
        drop(client_end);

        let outcome = session.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::Disconnected);
        assert_eq!(world.stats().await.unwrap().explorers, 0);
    }

    #[tokio::test]
    async fn control_reader_splits_and_caps_lines() {
        let long = vec![b'A'; MAX_LINE_LEN + 1];
        let mut input = b"MOVE_UP\r\n\xff\xfe\n".to_vec();
        input.extend_from_slice(&long);
        input.extend_from_slice(b"\n");
        let mut reader = ControlReader::new(&input[..]);

        assert_eq!(
            reader.read_line().await.unwrap(),
            ControlLine::Text("MOVE_UP".to_string())
        );
        assert_eq!(
            reader.read_line().await.unwrap(),
            ControlLine::Text("\u{FFFD}\u{FFFD}".to_string())
        );
        assert_eq!(reader.read_line().await.unwrap(), ControlLine::TooLong);

        let mut reader = ControlReader::new(&b"EXIT"[..]);
        assert_eq!(
            reader.read_line().await.unwrap(),
            ControlLine::Text("EXIT".to_string())
        );
        assert_eq!(reader.read_line().await.unwrap(), ControlLine::Closed);
    }

    #[tokio::test]
    async fn line_at_length_cap_is_accepted() {
        let mut input = vec![b'B'; MAX_LINE_LEN];
        input.extend_from_slice(b"\r\nEXIT\n");
        let mut reader = ControlReader::new(&input[..]);
        match reader.read_line().await.unwrap() {
            ControlLine::Text(text) => assert_eq!(text.len(), MAX_LINE_LEN),
            other => panic!("Expected Text, got {:?}", other),
        }
        assert_eq!(
            reader.read_line().await.unwrap(),
            ControlLine::Text("EXIT".to_string())
        );
    }

    #[tokio::test]
    async fn non_utf8_command_is_ignored() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let mut replies = collect_replies(client_end);

        tokio::spawn(async move {
            run_session(control_server, localhost(), &dialer, world, session_config()).await
        });

        control_client
            .write_all(b"7000 300 300\n\xff\xfe\nMOVE_RIGHT\n")
            .await
            .unwrap();
        assert_eq!(next_ack(&mut replies).await, (305.0, 300.0));
    }

    #[tokio::test]
    async fn unterminated_flood_ends_session() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let _replies = collect_replies(client_end);

        let session = {
            let world = world.clone();
            tokio::spawn(async move {
                run_session(control_server, localhost(), &dialer, world, session_config()).await
            })
        };

        control_client.write_all(b"7000 50 50\n").await.unwrap();
        // The session stops reading once the cap is hit, so the write may fail
        let _ = control_client.write_all(&vec![b'A'; 16 * MAX_LINE_LEN]).await;

        let outcome = session.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::Disconnected);
        assert_eq!(world.stats().await.unwrap().explorers, 0);
    }

    #[tokio::test]
    async fn oversized_handshake_is_rejected() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, _client_end) = PipeDialer::new();
        let mut input = vec![b'9'; MAX_LINE_LEN + 10];
        input.push(b'\n');

        let result =
            run_session(&input[..], localhost(), &dialer, world.clone(), session_config()).await;
        assert!(matches!(result, Err(SessionError::LineTooLong)));
        assert!(dialer.dialed.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_reply_reader_ends_session() {
        let world = WorldHandle::spawn(ServerConfig::default());
        // Never read from the client end, so the tiny pipe fills up
        let (dialer, _client_end) = PipeDialer::with_capacity(64);
        let (mut control_client, control_server) = tokio::io::duplex(1024);

        let config = SessionConfig {
            write_timeout: Duration::from_secs(1),
            ..session_config()
        };
        let session = {
            let world = world.clone();
            tokio::spawn(async move {
                run_session(control_server, localhost(), &dialer, world, config).await
            })
        };

        control_client.write_all(b"7000 50 50\n").await.unwrap();
        let outcome = session.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::Disconnected);
        assert_eq!(world.stats().await.unwrap().explorers, 0);
        drop(control_client);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_control_connection_times_out() {
        let world = WorldHandle::spawn(ServerConfig::default());
        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let _replies = collect_replies(client_end);

        let config = SessionConfig {
            idle_timeout: Some(Duration::from_secs(1)),
            ..session_config()
        };
        let session = {
            let world = world.clone();
            tokio::spawn(async move {
                run_session(control_server, localhost(), &dialer, world, config).await
            })
        };

        control_client.write_all(b"7000 50 50\n").await.unwrap();
        let outcome = session.await.unwrap().unwrap();
        assert_eq!(outcome, SessionOutcome::TimedOut);
        assert_eq!(world.stats().await.unwrap().explorers, 0);
    }

    #[tokio::test]
    async fn broadcast_shows_nearby_particles() {
        let world = WorldHandle::spawn(ServerConfig::default());
        world
            .populate(PopulateRequest::VelocityRange {
                count: 3,
                pos: (400.0, 400.0),
                angle: 0.0,
                speed_lo: 0.0,
                speed_hi: 0.0,
            })
            .await
            .unwrap();

        let (dialer, client_end) = PipeDialer::new();
        let (mut control_client, control_server) = tokio::io::duplex(1024);
        let mut replies = collect_replies(client_end);

        tokio::spawn(async move {
            run_session(control_server, localhost(), &dialer, world, session_config()).await
        });

        control_client.write_all(b"7000 410 405\n").await.unwrap();
        match replies.recv().await {
            Some(ServerMsg::State(entities)) => {
                assert_eq!(entities.len(), 3);
                assert!(entities.iter().all(|e| (e.x, e.y) == (400.0, 400.0)));
            }
            other => panic!("Expected State, got {:?}", other),
        }
    }
}
