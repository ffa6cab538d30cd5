//! Periphery filtering for per-explorer state broadcasts.

use crate::explorer::Explorer;
use crate::particle::Particle;
use explorer_shared::config::WorldConfig;
use explorer_shared::protocol::{EntityKind, ServerMsg, WireEntity};

/// What one explorer can see: nearby particles and other explorers,
/// in absolute world coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub entries: Vec<WireEntity>,
}

impl ViewSnapshot {
    pub fn particles(&self) -> impl Iterator<Item = &WireEntity> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntityKind::Particle)
    }

    pub fn explorers(&self) -> impl Iterator<Item = &WireEntity> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntityKind::Explorer)
    }

    pub fn to_message(&self) -> ServerMsg {
        ServerMsg::State(self.entries.clone())
    }

    pub fn into_message(self) -> ServerMsg {
        ServerMsg::State(self.entries)
    }
}

/// Build the snapshot for `viewer`. Particles come first, then other explorers
/// ordered by id. The viewer itself is never included.
pub fn periphery_view<'a>(
    viewer: &Explorer,
    particles: &[Particle],
    explorers: impl IntoIterator<Item = &'a Explorer>,
    config: &WorldConfig,
) -> ViewSnapshot {
    let mut entries: Vec<WireEntity> = particles
        .iter()
        .filter(|p| config.in_periphery(p.x - viewer.x, p.y - viewer.y))
        .map(|p| WireEntity {
            kind: EntityKind::Particle,
            x: p.x,
            y: p.y,
        })
        .collect();

    let mut others: Vec<&Explorer> = explorers
        .into_iter()
        .filter(|e| e.id != viewer.id)
        .filter(|e| config.in_periphery(e.x - viewer.x, e.y - viewer.y))
        .collect();
    others.sort_by_key(|e| e.id);

    entries.extend(others.into_iter().map(|e| WireEntity {
        kind: EntityKind::Explorer,
        x: e.x,
        y: e.y,
    }));

    ViewSnapshot { entries }
}
