//! Landmark coordinates

use serde::{Deserialize, Serialize};

/// A single landmark position.
///
/// Points are plain values. A point that was never annotated is represented
/// by the NaN sentinel returned from [`Point::missing`], not by an `Option`,
/// so every node of a skeleton always has a slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    /// Confidence score for predicted points
    pub score: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visible: true,
            score: None,
        }
    }

    pub fn with_visibility(x: f64, y: f64, visible: bool) -> Self {
        Self {
            x,
            y,
            visible,
            score: None,
        }
    }

    /// Predicted point carrying a confidence score
    pub fn predicted(x: f64, y: f64, score: f64) -> Self {
        Self {
            x,
            y,
            visible: true,
            score: Some(score),
        }
    }

    /// The "not annotated" sentinel
    pub fn missing() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            visible: false,
            score: None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    /// Coordinates as `[x, y]`
    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::missing()
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        if self.is_missing() || other.is_missing() {
            return self.is_missing() && other.is_missing();
        }
        self.x == other.x
            && self.y == other.y
            && self.visible == other.visible
            && self.score == other.score
    }
}
