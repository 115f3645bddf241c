//! # Stride Control Library
//!
//! Real-time balance and locomotion core for a biped. Two periodic tasks,
//! an estimator and a controller, exchange a [`context::RealTimeContext`]
//! by deep copy. Each controller tick plans the contact sequence, evaluates
//! the ICP recursion multipliers and hands a command bundle to the external
//! QP solver.
//!
//! ## Modules
//!
//! - [`scheduler`] - footstep plan → step transitions → contact phases
//! - [`icp`] - exit-CMP projection and state-end recursion multipliers
//! - [`command`] - per-tick momentum command aggregation
//! - [`context`] - handoff state machine and lock-free context exchange
//! - [`task`] - estimator and controller tasks
//! - [`cycle`] - RT setup and periodic pacing
//!
//! ## Zero-Allocation RT Loop
//!
//! Every container touched inside a tick is fixed-capacity and sized at
//! startup. Contexts cross threads only through `clone_from` into
//! pre-allocated slots.

#![deny(clippy::disallowed_types)]

pub mod command;
pub mod config;
pub mod context;
pub mod cycle;
pub mod error;
pub mod icp;
pub mod scheduler;
pub mod task;
