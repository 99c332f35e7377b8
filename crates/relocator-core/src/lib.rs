pub mod config;
pub mod db;
pub mod error;
pub mod intent;
pub mod io;
pub mod locate;
pub mod paths;
pub mod project;
pub mod reconcile;
pub mod recovery;
pub mod relocate;
pub mod templates;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{RelocateError, Result};
