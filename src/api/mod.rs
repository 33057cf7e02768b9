// Test-harness time server.
pub mod clock;
pub mod handlers;
pub mod server;

pub use clock::{ClockError, ClockSetter, Timedatectl};
pub use server::TimeServer;
