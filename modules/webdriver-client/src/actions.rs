//! W3C pointer action items, serialized into `/actions` sequences.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PointerAction {
    #[serde(rename = "pointerMove")]
    Move { duration: u64, x: i64, y: i64 },
    #[serde(rename = "pointerDown")]
    Down { button: u8 },
    #[serde(rename = "pointerUp")]
    Up { button: u8 },
    #[serde(rename = "pause")]
    Pause { duration: u64 },
}

impl PointerAction {
    /// A press-drag-release stroke from `(x1, y1)` to `(x2, y2)` in
    /// viewport coordinates.
    pub fn stroke(x1: i64, y1: i64, x2: i64, y2: i64) -> Vec<Self> {
        vec![
            Self::Move { duration: 0, x: x1, y: y1 },
            Self::Down { button: 0 },
            Self::Move { duration: 250, x: x2, y: y2 },
            Self::Up { button: 0 },
        ]
    }
}
