//! Stride Common Library
//!
//! Shared constants, configuration loading and walking domain types for
//! every Stride workspace crate.
//!
//! # Module Structure
//!
//! - [`consts`] - Fixed capacities, timing bounds and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`walking`] - Footsteps, contact sets, commands and real-time context blocks
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use stride_common::prelude::*;
//!
//! let stance = FeetInContact::BOTH;
//! assert!(stance.contains_side(Side::Left));
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod walking;
