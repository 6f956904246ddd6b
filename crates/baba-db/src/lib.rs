//! Persistence layer for baba: connection pool, embedded migrations, row
//! models, and query modules for the plan store, recipe catalog, and stored
//! user preferences.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
