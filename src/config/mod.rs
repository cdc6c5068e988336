use serde::{Deserialize, Serialize};

pub const DEFAULT_UPPER_THRESHOLD: f64 = 100.0;
pub const DEFAULT_LOWER_THRESHOLD: f64 = 100.0;
pub const DEFAULT_DEBOUNCE_MS: u32 = 200;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid threshold config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{name} must not be negative (got {value})")]
    NegativeThreshold { name: &'static str, value: f64 },
    #[error("{name} must be a finite number")]
    NonFiniteThreshold { name: &'static str },
}

/// Scroll axis the thresholds are measured on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn from_horizontal(horizontal: bool) -> Self {
        if horizontal {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    pub fn is_horizontal(self) -> bool {
        self == Axis::Horizontal
    }
}

/// Monitor settings.
///
/// Field names follow the element attributes (`upperThreshold`,
/// `lowerThreshold`, `horizontal`), so the same JSON can be shared with
/// markup-driven setups. `debounceMs` is an advanced override, mostly
/// useful to shrink the window in tests.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ThresholdConfig {
    /// Distance (px) from the top/left bound where the upper trigger fires.
    pub upper_threshold: f64,
    /// Distance (px) from the bottom/right bound where the lower trigger fires.
    pub lower_threshold: f64,
    pub horizontal: bool,
    pub debounce_ms: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            upper_threshold: DEFAULT_UPPER_THRESHOLD,
            lower_threshold: DEFAULT_LOWER_THRESHOLD,
            horizontal: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl ThresholdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("upperThreshold", self.upper_threshold)?;
        check_threshold("lowerThreshold", self.lower_threshold)
    }

    pub fn with_upper_threshold(mut self, px: f64) -> Self {
        self.upper_threshold = px;
        self
    }

    pub fn with_lower_threshold(mut self, px: f64) -> Self {
        self.lower_threshold = px;
        self
    }

    pub fn with_horizontal(mut self, horizontal: bool) -> Self {
        self.horizontal = horizontal;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn axis(&self) -> Axis {
        Axis::from_horizontal(self.horizontal)
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFiniteThreshold { name });
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeThreshold { name, value });
    }
    Ok(())
}
