//! Typed access to tool call arguments.

use crate::desktop::Point;
use crate::error::PilotError;

/// Wrapper around parsed tool call arguments providing typed extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, PilotError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| PilotError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional float argument.
    pub fn get_f64_opt(&self, key: &str) -> Option<f64> {
        self.value.get(key).and_then(|v| v.as_f64())
    }

    /// Get an optional `[x, y]` coordinate. Fractional pixels are rounded.
    pub fn get_point_opt(&self, key: &str) -> Result<Option<Point>, PilotError> {
        let Some(value) = self.value.get(key).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let pair = value
            .as_array()
            .filter(|items| items.len() == 2)
            .and_then(|items| Some((items[0].as_f64()?, items[1].as_f64()?)))
            .ok_or_else(|| {
                PilotError::InvalidArgument(format!("{key} must be an [x, y] pair of numbers"))
            })?;
        Ok(Some(Point::new(pair.0.round() as i32, pair.1.round() as i32)))
    }
}
