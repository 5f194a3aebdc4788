// SQLite-backed record store for the trial statistics engine.

pub mod db;

pub use db::{Database, NewTrial};
