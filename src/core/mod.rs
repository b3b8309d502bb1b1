pub mod config;
pub mod domain;
pub mod errors;
pub mod threshold;
pub mod validation;
