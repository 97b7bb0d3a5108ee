//! Render state: blend modes, snapshots and the bounded snapshot stack.
//!
//! A [`Snapshot`] is everything the diffing engine compares before a draw. The
//! [`StateStack`] lets callers scope changes with push/pop without tracking
//! what to restore.

mod blend;
mod snapshot;
mod stack;

pub use blend::{BlendEquation, BlendFactor, BlendMode};
pub use snapshot::Snapshot;
pub use stack::StateStack;
