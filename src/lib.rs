//! Conjunction screening for catalogued Earth orbiters.
//!
//! Decodes two-line element sets, narrows a catalog to the objects orbitally
//! similar to a target, propagates them over a common window and reports
//! every sample where another object comes within a distance threshold.

pub mod config;
pub mod constants;
pub mod detection;
pub mod elements;
pub mod errors;
pub mod filter;
pub mod physics;
pub mod propagation;
pub mod screening;
pub mod sink;
