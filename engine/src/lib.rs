//! Freehand annotation engine: gesture capture, undoable history and
//! incremental rendering onto host-provided 2D surfaces.

pub mod action;
pub mod cache;
pub mod calligraphy;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod freehand;
pub mod geometry;
pub mod history;
pub mod input;
pub mod pens;
pub mod render;
pub mod surface;

pub use action::{Action, ActionKind, FontSnapshot, InkPoint, StrokeStyle, TextBlock};
pub use config::{ConfigUpdate, EngineConfig, UpdateEffect};
pub use engine::{CanvasSize, Command, DrawingEngine, Viewport};
pub use error::{ConfigError, EngineError, RenderError};
pub use history::History;
pub use input::{PointerDevice, PointerInput, Tool};
pub use surface::{Composite, DrawCommand, RecordingSurface, Surface};
