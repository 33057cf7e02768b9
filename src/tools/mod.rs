pub mod async_support;

pub use async_support::BlockedWait;
