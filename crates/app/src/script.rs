//! JSON stroke scripts
//!
//! A script bundles canvas configuration, brush settings, optional texture
//! paths and a timed list of input events.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stipple_config::SessionConfig;
use stipple_painting::{BrushSettings, Point2D, PointerEvent, Rgb};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub config: SessionConfig,
    pub brush: BrushSettings,
    /// Shape texture, relative to the script file
    pub shape_texture: Option<PathBuf>,
    /// Grain texture, relative to the script file
    pub grain_texture: Option<PathBuf>,
    /// Jitter seed; omitted means OS entropy
    pub seed: Option<u64>,
    pub events: Vec<TimedEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Milliseconds since the start of the replay
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: ScriptEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptEvent {
    Start {
        x: f64,
        y: f64,
        #[serde(default)]
        pressure: f64,
    },
    Move {
        x: f64,
        y: f64,
        #[serde(default)]
        pressure: f64,
    },
    End,
    Cancel,
    Clear,
    Color(Rgb),
    Size { size: f64 },
}

impl Script {
    /// Convert logical coordinates and sizes to device pixels using
    /// `config.display.scale`, matching the scaled canvas.
    pub fn scale_to_device(&mut self) {
        let scale = self.config.display.scale as f64;
        if scale == 1.0 {
            return;
        }
        self.brush.size *= scale;
        self.config.stroke.min_point_distance *= scale;
        for timed in &mut self.events {
            match &mut timed.event {
                ScriptEvent::Start { x, y, .. } | ScriptEvent::Move { x, y, .. } => {
                    *x *= scale;
                    *y *= scale;
                }
                ScriptEvent::Size { size } => *size *= scale,
                ScriptEvent::End | ScriptEvent::Cancel | ScriptEvent::Clear | ScriptEvent::Color(_) => {}
            }
        }
    }
}

impl ScriptEvent {
    /// Pointer events map onto the session's input; the rest are UI bindings
    pub fn pointer(&self) -> Option<PointerEvent> {
        match *self {
            ScriptEvent::Start { x, y, pressure } => Some(PointerEvent::Start {
                position: Point2D::new(x, y),
                pressure,
            }),
            ScriptEvent::Move { x, y, pressure } => Some(PointerEvent::Move {
                position: Point2D::new(x, y),
                pressure,
            }),
            ScriptEvent::End => Some(PointerEvent::End),
            ScriptEvent::Cancel => Some(PointerEvent::Cancel),
            ScriptEvent::Clear | ScriptEvent::Color(_) | ScriptEvent::Size { .. } => None,
        }
    }
}
