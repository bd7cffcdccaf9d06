pub mod characteristics;
pub mod config;
pub mod database;
pub mod device;
pub mod error;
pub mod models;
pub mod parser;
pub mod station;
pub mod utils;
