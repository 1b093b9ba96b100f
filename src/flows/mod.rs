//! Account lifecycle operations.
//!
//! Each flow composes the gateway, the profile store, and the lifecycle
//! hooks; transport (HTTP, UI events) is the caller's concern.

mod register;
mod sign_in;
mod sign_out;

pub use register::Registration;
