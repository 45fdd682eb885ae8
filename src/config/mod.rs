//! Stamp options.
//!
//! One immutable [`StampOptions`] value is built per run and passed by
//! reference to every stage. Overrides arrive as a loosely-typed key/value
//! blob (JSON on the command line, JSON or YAML in a file) and go through
//! [`StampOptions::parse_or_default`], which never fails: anything it
//! cannot make sense of yields the defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::Result;

fn default_text() -> String {
    "LUNAS".to_string()
}

fn default_rotate() -> f64 {
    -25.0
}

fn default_opacity() -> f64 {
    0.18
}

fn default_wm_width_pct() -> f64 {
    0.15
}

fn default_shift_x_pct() -> f64 {
    0.015
}

fn default_shift_y_pct() -> f64 {
    0.010
}

/// Options controlling the stamp text, style and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampOptions {
    /// Text printed inside the stamp border (default: "LUNAS")
    #[serde(default = "default_text")]
    pub text: String,

    /// Rotation in degrees; negative tilts the stamp counter-clockwise (default: -25)
    #[serde(default = "default_rotate")]
    pub rotate: f64,

    /// Alpha for both stroke and text, 0.0 to 1.0 (default: 0.18)
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    /// Stamp width as a fraction of the content width (default: 0.15)
    #[serde(default = "default_wm_width_pct")]
    pub wm_width_pct_of_content: f64,

    /// Horizontal anchor nudge as a fraction of the content width (default: 0.015)
    #[serde(default = "default_shift_x_pct")]
    pub shift_x_pct_of_content: f64,

    /// Vertical anchor nudge as a fraction of the content height (default: 0.010)
    #[serde(default = "default_shift_y_pct")]
    pub shift_y_pct_of_content: f64,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            text: default_text(),
            rotate: default_rotate(),
            opacity: default_opacity(),
            wm_width_pct_of_content: default_wm_width_pct(),
            shift_x_pct_of_content: default_shift_x_pct(),
            shift_y_pct_of_content: default_shift_y_pct(),
        }
    }
}

/// Named option sets used as the base before overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Preset {
    /// The documented defaults
    #[default]
    Default,
    /// Wider, flatter stamp nudged further right, as used by the upload service
    Server,
}

impl Preset {
    /// Options this preset starts from.
    pub fn options(self) -> StampOptions {
        match self {
            Preset::Default => StampOptions::default(),
            Preset::Server => StampOptions {
                text: default_text(),
                rotate: -20.0,
                opacity: 0.18,
                wm_width_pct_of_content: 0.40,
                shift_x_pct_of_content: 0.065,
                shift_y_pct_of_content: -0.020,
            },
        }
    }
}

impl StampOptions {
    /// Parse an options blob, falling back to the defaults on any problem.
    ///
    /// Empty input, malformed JSON, a non-object top level, or a recognized
    /// key holding a value that cannot be coerced all produce
    /// `StampOptions::default()`. Unknown keys are ignored. Values are not
    /// range-checked.
    pub fn parse_or_default(input: &str) -> Self {
        Self::parse_over(StampOptions::default(), input)
    }

    /// Like [`StampOptions::parse_or_default`] but overriding `base`
    /// instead of the defaults. Any failure returns `base` unchanged.
    pub fn parse_over(base: StampOptions, input: &str) -> Self {
        if input.trim().is_empty() {
            return base;
        }

        match serde_json::from_str::<Value>(input) {
            Ok(value) => Self::apply_value(base, value),
            Err(e) => {
                tracing::debug!(error = %e, "options blob is not JSON, using defaults");
                base
            }
        }
    }

    /// Read an options file and parse it over `base`.
    ///
    /// Files may be JSON or YAML. Only failing to read the file is an error;
    /// content that parses as neither falls back to `base` like an inline
    /// blob does.
    pub fn from_file<P: AsRef<Path>>(base: StampOptions, path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(base);
        }

        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(v) => v,
            Err(_) => match serde_yaml::from_str::<Value>(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(error = %e, "options file is not JSON or YAML, using defaults");
                    return Ok(base);
                }
            },
        };
        Ok(Self::apply_value(base, value))
    }

    fn apply_value(base: StampOptions, value: Value) -> Self {
        match value {
            Value::Object(map) => match base.clone().overlay(&map) {
                Some(options) => options,
                None => {
                    tracing::debug!("options have a value of the wrong type, using defaults");
                    base
                }
            },
            _ => {
                tracing::debug!("options are not a key/value object, using defaults");
                base
            }
        }
    }

    /// Apply recognized keys from `map`. `None` means a type error.
    fn overlay(mut self, map: &Map<String, Value>) -> Option<Self> {
        if let Some(v) = map.get("text") {
            self.text = coerce_text(v)?;
        }
        if let Some(v) = map.get("rotate") {
            self.rotate = coerce_number(v)?;
        }
        if let Some(v) = map.get("opacity") {
            self.opacity = coerce_number(v)?;
        }
        if let Some(v) = map.get("wmWidthPctOfContent") {
            self.wm_width_pct_of_content = coerce_number(v)?;
        }
        if let Some(v) = map.get("shiftXPctOfContent") {
            self.shift_x_pct_of_content = coerce_number(v)?;
        }
        if let Some(v) = map.get("shiftYPctOfContent") {
            self.shift_y_pct_of_content = coerce_number(v)?;
        }
        Some(self)
    }
}

/// Non-finite results ("NaN", "inf") count as coercion failures.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;
    number.is_finite().then_some(number)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
