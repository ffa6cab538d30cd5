use explorer_shared::config::WorldConfig;

/// A point moving in a straight line that bounces off the world edges.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    /// Direction of travel in degrees, normalized to [0, 360)
    pub heading: f64,
    /// Units per second
    pub speed: f64,
}

impl Particle {
    pub fn new(x: f64, y: f64, heading: f64, speed: f64) -> Self {
        Self {
            x,
            y,
            heading: heading.rem_euclid(360.0),
            speed,
        }
    }

    /// Advance by `dt` seconds. Crossing a vertical edge turns the heading into
    /// `180 - heading`, crossing a horizontal edge into `-heading`, and the
    /// overshoot is mirrored back inside the world.
    pub fn advance(&mut self, dt: f64, bounds: &WorldConfig) {
        let rad = self.heading.to_radians();
        let x = self.x + self.speed * rad.cos() * dt;
        let y = self.y + self.speed * rad.sin() * dt;
        if !x.is_finite() || !y.is_finite() {
            return;
        }

        let mut heading = self.heading;
        let (x, flipped_x) = fold(x, bounds.width);
        if flipped_x {
            heading = 180.0 - heading;
        }
        let (y, flipped_y) = fold(y, bounds.height);
        if flipped_y {
            heading = -heading;
        }

        self.x = x;
        self.y = y;
        self.heading = heading.rem_euclid(360.0);
    }
}

/// Mirror `v` into `[0, limit]`, however many edges it crossed. The flag is
/// set when an odd number of reflections happened.
fn fold(v: f64, limit: f64) -> (f64, bool) {
    if (0.0..=limit).contains(&v) {
        return (v, false);
    }
    let period = 2.0 * limit;
    let u = v.rem_euclid(period);
    if u > limit {
        ((period - u).max(0.0), true)
    } else {
        (u, false)
    }
}
