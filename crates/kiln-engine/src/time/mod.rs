//! Time subsystem.
//!
//! Provides frame stepping without coupling to the runtime:
//! - one `StepTimer` per window (or per render loop)
//! - call `tick(..)` once per presented frame; the callback runs once per
//!   logical update step

mod step_timer;

pub use step_timer::{StepTimer, TimerConfig};
