pub mod handlers;
pub mod server;
pub mod server_config;
pub mod types;

pub use server::MultisigServer;
