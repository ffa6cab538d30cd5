use crate::broadcast::{periphery_view, ViewSnapshot};
use crate::config::ServerConfig;
use crate::error::WorldError;
use crate::explorer::Explorer;
use crate::particle::Particle;
use explorer_shared::config::WorldConfig;
use explorer_shared::protocol::{EntityKind, WireEntity};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Whether the world accepts new particles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldMode {
    /// Particles may be added
    #[default]
    Populating,
    /// Only explorers move; population requests are rejected
    ExplorerOnly,
}

/// A batch of particles to add, with one randomized dimension.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopulateRequest {
    /// Positions spread over the rectangle spanned by `start` and `end`
    Region {
        count: usize,
        start: (f64, f64),
        end: (f64, f64),
        heading: f64,
        speed: f64,
    },
    /// Headings spread over `[angle_lo, angle_hi]` from a single point
    AngleRange {
        count: usize,
        pos: (f64, f64),
        speed: f64,
        angle_lo: f64,
        angle_hi: f64,
    },
    /// Speeds spread over `[speed_lo, speed_hi]` from a single point
    VelocityRange {
        count: usize,
        pos: (f64, f64),
        angle: f64,
        speed_lo: f64,
        speed_hi: f64,
    },
}

/// Read-only counters for operator logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub particles: usize,
    pub explorers: usize,
    pub mode: WorldMode,
}

/// Authoritative world owned by the world loop task.
pub struct WorldState {
    pub config: WorldConfig,
    pub mode: WorldMode,
    particles: Vec<Particle>,
    explorers: HashMap<u32, Explorer>,
    rng: ChaCha8Rng,
    next_explorer_id: u32,
}

impl WorldState {
    pub fn new(server_config: &ServerConfig) -> Self {
        use rand::SeedableRng;
        Self {
            config: server_config.world,
            mode: server_config.mode,
            particles: Vec::new(),
            explorers: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(server_config.rng_seed),
            next_explorer_id: 1,
        }
    }

    pub fn set_mode(&mut self, mode: WorldMode) {
        self.mode = mode;
    }

    fn ensure_populating(&self) -> Result<(), WorldError> {
        match self.mode {
            WorldMode::Populating => Ok(()),
            WorldMode::ExplorerOnly => Err(WorldError::ExplorerOnly),
        }
    }

    /// Add `n` particles at random points in the rectangle between two corners.
    pub fn populate_by_region(
        &mut self,
        n: usize,
        start: (f64, f64),
        end: (f64, f64),
        heading: f64,
        speed: f64,
    ) -> Result<usize, WorldError> {
        self.ensure_populating()?;
        check_range("region x", start.0, end.0)?;
        check_range("region y", start.1, end.1)?;
        check_finite("heading", heading)?;
        check_finite("speed", speed)?;
        for _ in 0..n {
            let x = uniform(&mut self.rng, start.0, end.0);
            let y = uniform(&mut self.rng, start.1, end.1);
            self.push_particle(x, y, heading, speed);
        }
        Ok(n)
    }

    /// Add `n` particles at `pos` with headings drawn from `[angle_lo, angle_hi]`.
    pub fn populate_by_angle_range(
        &mut self,
        n: usize,
        pos: (f64, f64),
        speed: f64,
        angle_lo: f64,
        angle_hi: f64,
    ) -> Result<usize, WorldError> {
        self.ensure_populating()?;
        check_finite("x", pos.0)?;
        check_finite("y", pos.1)?;
        check_finite("speed", speed)?;
        check_range("angle", angle_lo, angle_hi)?;
        for _ in 0..n {
            let heading = uniform(&mut self.rng, angle_lo, angle_hi);
            self.push_particle(pos.0, pos.1, heading, speed);
        }
        Ok(n)
    }

    /// Add `n` particles at `pos` with speeds drawn from `[speed_lo, speed_hi]`.
    pub fn populate_by_velocity_range(
        &mut self,
        n: usize,
        pos: (f64, f64),
        angle: f64,
        speed_lo: f64,
        speed_hi: f64,
    ) -> Result<usize, WorldError> {
        self.ensure_populating()?;
        check_finite("x", pos.0)?;
        check_finite("y", pos.1)?;
        check_finite("angle", angle)?;
        check_range("speed", speed_lo, speed_hi)?;
        for _ in 0..n {
            let speed = uniform(&mut self.rng, speed_lo, speed_hi);
            self.push_particle(pos.0, pos.1, angle, speed);
        }
        Ok(n)
    }

    pub fn populate(&mut self, request: &PopulateRequest) -> Result<usize, WorldError> {
        match *request {
            PopulateRequest::Region {
                count,
                start,
                end,
                heading,
                speed,
            } => self.populate_by_region(count, start, end, heading, speed),
            PopulateRequest::AngleRange {
                count,
                pos,
                speed,
                angle_lo,
                angle_hi,
            } => self.populate_by_angle_range(count, pos, speed, angle_lo, angle_hi),
            PopulateRequest::VelocityRange {
                count,
                pos,
                angle,
                speed_lo,
                speed_hi,
            } => self.populate_by_velocity_range(count, pos, angle, speed_lo, speed_hi),
        }
    }

    fn push_particle(&mut self, x: f64, y: f64, heading: f64, speed: f64) {
        let (x, y) = self.config.clamp(x, y);
        self.particles.push(Particle::new(x, y, heading, speed));
    }

    /// Advance every particle by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        let bounds = self.config;
        for particle in &mut self.particles {
            particle.advance(dt, &bounds);
        }
    }

    /// Register a new explorer at the (clamped) start point and return its id.
    /// Ids are never reused.
    pub fn register_explorer(&mut self, start_x: f64, start_y: f64) -> u32 {
        let id = self.next_explorer_id;
        self.next_explorer_id += 1;
        self.explorers
            .insert(id, Explorer::spawn(id, start_x, start_y, &self.config));
        id
    }

    /// Remove an explorer. Returns false if it was already gone.
    pub fn remove_explorer(&mut self, id: u32) -> bool {
        self.explorers.remove(&id).is_some()
    }

    /// Move an explorer by a delta, clamped to the world. Returns the new position.
    pub fn move_explorer(&mut self, id: u32, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let bounds = self.config;
        let explorer = self.explorers.get_mut(&id)?;
        Some(explorer.shift(dx, dy, &bounds))
    }

    /// Periphery view for one explorer. None if the explorer is not registered.
    pub fn snapshot_for(&self, id: u32) -> Option<ViewSnapshot> {
        let viewer = self.explorers.get(&id)?;
        Some(periphery_view(
            viewer,
            &self.particles,
            self.explorers.values(),
            &self.config,
        ))
    }

    /// Every particle and explorer, unfiltered
    pub fn full_view(&self) -> ViewSnapshot {
        let mut explorers: Vec<&Explorer> = self.explorers.values().collect();
        explorers.sort_by_key(|e| e.id);

        let entries = self
            .particles
            .iter()
            .map(|p| WireEntity {
                kind: EntityKind::Particle,
                x: p.x,
                y: p.y,
            })
            .chain(explorers.into_iter().map(|e| WireEntity {
                kind: EntityKind::Explorer,
                x: e.x,
                y: e.y,
            }))
            .collect();
        ViewSnapshot { entries }
    }

    pub fn explorer(&self, id: u32) -> Option<&Explorer> {
        self.explorers.get(&id)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn explorer_count(&self) -> usize {
        self.explorers.len()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            particles: self.particles.len(),
            explorers: self.explorers.len(),
            mode: self.mode,
        }
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), WorldError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(WorldError::InvalidPopulation(format!(
            "{} must be finite, got {}",
            field, value
        )))
    }
}

/// Both ends finite and the span between them representable, so that
/// `uniform` can sample it.
fn check_range(field: &str, a: f64, b: f64) -> Result<(), WorldError> {
    check_finite(field, a)?;
    check_finite(field, b)?;
    if (b - a).is_finite() {
        Ok(())
    } else {
        Err(WorldError::InvalidPopulation(format!(
            "{} range [{}, {}] is too wide",
            field, a, b
        )))
    }
}

/// Uniform draw from the inclusive range between `a` and `b`, in either order.
fn uniform(rng: &mut impl Rng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}
