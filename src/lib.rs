//! cueFlow: ad break scheduling for a linear media timeline.
//!
//! Maps playhead ticks, seeks, content end and ad outcomes onto the next
//! thing the player should do: play a given ad, resume content, or nothing.
//! Event wiring, ad rendering and network fetches live in the host player.

pub mod ad_break;
pub mod ad_logger;
pub mod ad_scheduler;
pub mod config;
pub mod cue_point;
pub mod error;
pub mod events;
pub mod seek;
pub mod waterfall;

pub use ad_scheduler::AdScheduler;
pub use config::AdvertisingConfig;
pub use error::{Error, Result};
pub use events::{Action, AdEvent, BreakRef, PlaybackEvent};
