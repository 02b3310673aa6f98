//! Input translation layer between a host view and a game engine
//!
//! Raw key, touch and generic motion events from the host are classified,
//! normalized and forwarded to an [`EngineSink`] as [`CanonicalEvent`]s.
//! Physical controllers are tracked by the [`JoystickRegistry`], which hands
//! out stable logical joystick ids and reports only axis and hat changes.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod engine;
pub mod host;

pub use config::{ConfigError, DispatcherSettings};
pub use controller::JoystickRegistry;
pub use dispatch::{DispatchError, DispatcherHandle, HostEvent, InputDispatcher};
pub use engine::{CanonicalButton, CanonicalEvent, EngineSink, LogicalId};
