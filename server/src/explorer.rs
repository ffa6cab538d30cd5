use explorer_shared::config::WorldConfig;

/// Avatar controlled by one connected explorer session
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Explorer {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

impl Explorer {
    /// Create an explorer, clamping the spawn point into the world.
    pub fn spawn(id: u32, x: f64, y: f64, bounds: &WorldConfig) -> Self {
        let (x, y) = bounds.clamp(x, y);
        Self { id, x, y }
    }

    /// Apply a movement delta. Explorers stop at the world edge instead of bouncing.
    pub fn shift(&mut self, dx: f64, dy: f64, bounds: &WorldConfig) -> (f64, f64) {
        let (x, y) = bounds.clamp(self.x + dx, self.y + dy);
        self.x = x;
        self.y = y;
        (x, y)
    }
}
