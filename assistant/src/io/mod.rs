//! I/O collaborators for the assistant session.

pub mod config;
pub mod model;
pub mod operator;
pub mod process;
pub mod sandbox;
pub mod settings;
