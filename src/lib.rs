pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod schema;

#[cfg(test)]
pub mod testing;
