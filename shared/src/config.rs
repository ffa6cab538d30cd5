/// World geometry shared by the server and explorer clients
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// Half-width of the periphery window around a viewer (world units)
    pub periphery_width: f64,
    /// Half-height of the periphery window around a viewer (world units)
    pub periphery_height: f64,
    /// Distance an explorer moves per movement command
    pub step: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            periphery_width: 33.0,
            periphery_height: 19.0,
            step: 5.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err("width must be finite and > 0".to_string());
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err("height must be finite and > 0".to_string());
        }
        if !self.periphery_width.is_finite() || self.periphery_width < 0.0 {
            return Err("periphery_width must be finite and >= 0".to_string());
        }
        if !self.periphery_height.is_finite() || self.periphery_height < 0.0 {
            return Err("periphery_height must be finite and >= 0".to_string());
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err("step must be finite and > 0".to_string());
        }
        Ok(())
    }

    /// Clamp a point into the world rectangle.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }

    /// Whether an offset from a viewer falls inside the periphery window.
    /// The window edges are inclusive.
    pub fn in_periphery(&self, dx: f64, dy: f64) -> bool {
        dx.abs() <= self.periphery_width && dy.abs() <= self.periphery_height
    }
}
