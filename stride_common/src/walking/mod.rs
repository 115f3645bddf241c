//! Walking-control shared types.
//!
//! All types exchanged between the scheduler, the ICP engine, the command
//! aggregator and the real-time tasks live here. Organized by domain:
//! sides and contact sets, footsteps and poses, error taxonomy, QP command
//! payloads, real-time context blocks, and configuration structures.

pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod footstep;
pub mod side;
