pub mod time;

pub use time::{change_time, change_time_root};
