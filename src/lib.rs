#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod actors;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod log;
pub mod mcp;
pub mod platform;

mod http;
