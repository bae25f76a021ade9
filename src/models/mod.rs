// src/models/mod.rs
pub mod process;
pub mod video;
