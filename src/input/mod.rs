//! Input Collection
//!
//! Polls keyboard and mouse into the per-frame snapshot the simulation
//! consumes. The core never touches the platform input APIs; it only sees
//! `ControlFlags` and a pointer delta, so its behavior is identical under
//! tests, native windows and wasm.

mod state;

pub use state::InputState;

/// Game actions a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Jump,
    Sprint,
    Pause,
    Reset,
}
