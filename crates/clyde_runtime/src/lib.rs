//! # Clyde runtime
//!
//! The [`Dispatcher`] control loop that serializes every message and tick
//! against one session, and the [`Transport`] capability it sends through.

pub mod dispatcher;
pub mod transport;

pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use transport::{ConsoleTransport, Transport};
