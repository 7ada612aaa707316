//! Alarm light effect.
//!
//! - `plan` - [`EffectPlan`], colors and timings of the script
//! - `orchestrator` - [`EffectOrchestrator`], runs the script on every light and restores them
//! - `strip` - [`WledStrip`], optional led strip blinking along

mod orchestrator;
mod plan;
mod strip;

pub use crate::effect::orchestrator::{EffectOrchestrator, EffectTrigger};
#[cfg(test)]
pub use crate::effect::orchestrator::MockEffectTrigger;
pub use crate::effect::plan::EffectPlan;
pub use crate::effect::strip::WledStrip;
