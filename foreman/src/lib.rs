pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod runner;
pub mod surveyor;
