//! Dispatch subsystem - classification, normalization and routing
//!
//! 1. [`classifier`] - which category a key or motion event belongs to
//! 2. [`motion`] - canonical mouse and touch payloads
//! 3. [`dispatcher`] - the façade the view layer calls
//! 4. [`worker`] - single-task event queue around the façade
//!
//! # Architecture
//!
//! ```text
//! HostEvent ──► InputDispatcher ──► classifier ──┬─► JoystickRegistry ──┐
//!                                                └─► motion ────────────┴─► EngineSink
//! ```

pub mod classifier;
pub mod dispatcher;
pub mod motion;
pub mod worker;

pub use classifier::{
    classify_key, classify_motion, is_game_controller_source, is_pointer_source, KeyCategory,
    MotionCategory,
};
pub use dispatcher::{HostEvent, InputDispatcher, Stage};
pub use worker::{DispatchError, DispatcherHandle};
