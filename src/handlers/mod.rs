// src/handlers/mod.rs
pub mod credits;
pub mod process;
pub mod status;
pub mod video;
