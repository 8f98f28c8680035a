mod alarm;
mod blink;
mod config;
mod detector;
mod ear;
mod error;
mod fatigue;
mod head_pose;
mod history;
mod landmarks;
mod snapshot;
mod yawn;
#[cfg(feature = "wasm")]
mod wasm;

pub use alarm::*;
pub use blink::*;
pub use config::*;
pub use detector::*;
pub use ear::*;
pub use error::*;
pub use fatigue::*;
pub use head_pose::*;
pub use history::*;
pub use landmarks::*;
pub use snapshot::*;
pub use yawn::*;
#[cfg(feature = "wasm")]
pub use wasm::*;
