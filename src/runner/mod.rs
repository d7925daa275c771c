//! Session execution: the generate / check / feedback loop.

mod session;

pub use session::{Session, SessionConfig};
