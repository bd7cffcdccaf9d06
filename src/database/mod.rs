pub mod connection;
pub mod operations;

pub use operations::{ensure_history_table, store_history_entry, PostgresHistorySink};
