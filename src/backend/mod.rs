pub mod config;
pub mod kick;
pub mod webhook;
