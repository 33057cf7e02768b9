// src/lib.rs

pub mod api;
pub mod blockchain;
pub mod cli;
pub mod core;
pub mod ops;
pub mod tools;
