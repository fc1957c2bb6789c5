pub mod audio;
pub mod cleanup;
pub mod engines;
pub mod error;
pub mod history;
pub mod registry;
pub mod server;
pub mod settings;
