// src/lib.rs

pub mod api;
pub mod collaborator;
pub mod core;
pub mod engine;
pub mod storage;
