use crate::broadcast::ViewSnapshot;
use crate::config::ServerConfig;
use crate::error::WorldError;
use crate::state::{PopulateRequest, WorldMode, WorldState, WorldStats};
use tokio::sync::{mpsc, oneshot};

/// Commands from sessions (and operators) to the world loop
pub enum WorldCommand {
    Register {
        start_x: f64,
        start_y: f64,
        response: oneshot::Sender<u32>,
    },
    Remove {
        id: u32,
    },
    Move {
        id: u32,
        dx: f64,
        dy: f64,
        response: oneshot::Sender<Option<(f64, f64)>>,
    },
    Snapshot {
        id: u32,
        response: oneshot::Sender<Option<ViewSnapshot>>,
    },
    Populate {
        request: PopulateRequest,
        response: oneshot::Sender<Result<usize, WorldError>>,
    },
    SetMode {
        mode: WorldMode,
    },
    Stats {
        response: oneshot::Sender<WorldStats>,
    },
}

/// Run the world loop. Owns all world state; everything else talks to it
/// through `WorldCommand`s.
pub async fn run_world_loop(mut cmd_rx: mpsc::Receiver<WorldCommand>, config: ServerConfig) {
    let mut state = WorldState::new(&config);

    for request in &config.initial_population {
        match state.populate(request) {
            Ok(n) => tracing::info!("Added {} initial particles", n),
            Err(e) => tracing::warn!("Initial population skipped: {}", e),
        }
    }

    let dt = 1.0 / config.tick_rate_hz as f64;
    let mut tick_interval = tokio::time::interval(config.tick_interval());
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                state.tick(dt);
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    WorldCommand::Register { start_x, start_y, response } => {
                        let id = state.register_explorer(start_x, start_y);
                        if response.send(id).is_err() {
                            // Session vanished before hearing back
                            state.remove_explorer(id);
                        }
                    }
                    WorldCommand::Remove { id } => {
                        state.remove_explorer(id);
                    }
                    WorldCommand::Move { id, dx, dy, response } => {
                        let _ = response.send(state.move_explorer(id, dx, dy));
                    }
                    WorldCommand::Snapshot { id, response } => {
                        let _ = response.send(state.snapshot_for(id));
                    }
                    WorldCommand::Populate { request, response } => {
                        let _ = response.send(state.populate(&request));
                    }
                    WorldCommand::SetMode { mode } => {
                        tracing::info!("World mode set to {:?}", mode);
                        state.set_mode(mode);
                    }
                    WorldCommand::Stats { response } => {
                        let _ = response.send(state.stats());
                    }
                }
            }
        }
    }

    tracing::info!("World loop ended");
}

/// Cloneable handle for talking to the world loop
#[derive(Clone)]
pub struct WorldHandle {
    tx: mpsc::Sender<WorldCommand>,
}

impl WorldHandle {
    pub fn new(tx: mpsc::Sender<WorldCommand>) -> Self {
        Self { tx }
    }

    /// Spawn a world loop on the current runtime and return a handle to it.
    pub fn spawn(config: ServerConfig) -> Self {
        let (tx, rx) = mpsc::channel::<WorldCommand>(256);
        tokio::spawn(run_world_loop(rx, config));
        Self::new(tx)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> WorldCommand,
    ) -> Result<T, WorldError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(make(resp_tx))
            .await
            .map_err(|_| WorldError::Closed)?;
        resp_rx.await.map_err(|_| WorldError::Closed)
    }

    pub async fn register(&self, start_x: f64, start_y: f64) -> Result<u32, WorldError> {
        self.request(|response| WorldCommand::Register {
            start_x,
            start_y,
            response,
        })
        .await
    }

    pub async fn remove(&self, id: u32) -> Result<(), WorldError> {
        self.tx
            .send(WorldCommand::Remove { id })
            .await
            .map_err(|_| WorldError::Closed)
    }

    pub async fn move_explorer(
        &self,
        id: u32,
        dx: f64,
        dy: f64,
    ) -> Result<Option<(f64, f64)>, WorldError> {
        self.request(|response| WorldCommand::Move {
            id,
            dx,
            dy,
            response,
        })
        .await
    }

    pub async fn snapshot(&self, id: u32) -> Result<Option<ViewSnapshot>, WorldError> {
        self.request(|response| WorldCommand::Snapshot { id, response })
            .await
    }

    pub async fn populate(&self, request: PopulateRequest) -> Result<usize, WorldError> {
        self.request(|response| WorldCommand::Populate { request, response })
            .await?
    }

    pub async fn set_mode(&self, mode: WorldMode) -> Result<(), WorldError> {
        self.tx
            .send(WorldCommand::SetMode { mode })
            .await
            .map_err(|_| WorldError::Closed)
    }

    pub async fn stats(&self) -> Result<WorldStats, WorldError> {
        self.request(|response| WorldCommand::Stats { response })
            .await
    }
}
