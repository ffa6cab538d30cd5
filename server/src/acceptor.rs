use crate::config::ServerConfig;
use crate::error::{ServerError, SessionError};
use crate::session::{run_session, ReplyDialer, SessionConfig, SessionOutcome};
use crate::world_loop::WorldHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

/// Bind the control listener. Failure here is fatal to startup.
pub async fn bind_listener(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Accept control connections forever, running one session per connection.
///
/// Accept errors are logged and skipped. Finished sessions are reaped from the
/// tracking set as they complete.
pub async fn run_acceptor<D: ReplyDialer>(
    listener: TcpListener,
    world: WorldHandle,
    dialer: Arc<D>,
    config: &ServerConfig,
) {
    let session_config = SessionConfig::from_server_config(config);
    let mut sessions: JoinSet<(SocketAddr, Result<SessionOutcome, SessionError>)> =
        JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("Accept failed: {}", e);
                        continue;
                    }
                };

                if sessions.len() >= config.max_connections {
                    tracing::warn!(
                        "Refusing {}: {} sessions already live",
                        peer,
                        sessions.len()
                    );
                    drop(stream);
                    continue;
                }

                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!("set_nodelay failed for {}: {}", peer, e);
                }
                tracing::debug!("Control connection from {}", peer);

                let world = world.clone();
                let dialer = dialer.clone();
                sessions.spawn(async move {
                    let result = run_session(
                        stream,
                        peer.ip(),
                        dialer.as_ref(),
                        world,
                        session_config,
                    )
                    .await;
                    (peer, result)
                });
            }

            Some(finished) = sessions.join_next() => {
                match finished {
                    Ok((peer, Ok(outcome))) => {
                        tracing::debug!("Session from {} finished: {:?}", peer, outcome);
                    }
                    Ok((peer, Err(e))) => {
                        tracing::warn!("Session from {} failed: {}", peer, e);
                    }
                    Err(e) => {
                        tracing::error!("Session task panicked: {}", e);
                    }
                }
            }
        }
    }
}
