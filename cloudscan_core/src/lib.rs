// cloudscan_core/src/lib.rs

// This file defines the public modules of the library.
pub mod config;
pub mod error;
pub mod messages;
pub mod prelude;
pub mod projection;
pub mod types;
