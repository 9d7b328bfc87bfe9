pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod generator;
pub mod session;
pub mod srs;
pub mod tracker;

#[cfg(test)]
pub mod testing;
