pub mod config;
pub mod folder;
pub mod init;
pub mod locate;
pub mod project;
pub mod reconcile;
pub mod status;
