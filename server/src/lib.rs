//! Explorer synchronization server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod acceptor;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod explorer;
pub mod particle;
pub mod session;
pub mod state;
pub mod world_loop;
