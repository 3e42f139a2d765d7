//! # Interaction
//!
//! Gesture state machines that turn raw pointer and touch input into camera
//! moves and landmark operations.
//!
//! Handlers never own landmark state. They resolve intent with ray casts
//! through the scene and act through [`ViewportCallbacks`], which the
//! landmark group implements.

pub mod atomic;
pub mod callbacks;
pub mod context;
pub mod events;
pub mod listeners;
pub mod mouse;
pub mod touch;

pub use atomic::{AtomicGuard, AtomicOperation};
pub use callbacks::ViewportCallbacks;
pub use context::{InteractionContext, Pick};
pub use events::{
    is_click, ModifiersState, MouseButton, MouseScrollDelta, PointerEvent, TouchPhase, TouchPoint,
};
pub use listeners::{DocumentListeners, Listener};
pub use mouse::MouseHandler;
pub use touch::TouchHandler;
