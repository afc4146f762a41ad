//! # Node Service
//!
//! The composition root that wires overlay protocols to one codec.
//!
//! A [`Node`] owns its registry outright; two nodes in the same process never
//! see each other's shapes. Registration failures come back from
//! [`NodeBuilder::build`] as [`crate::error::RegistrationError`], and it is up
//! to the caller to stop the process.

pub mod node;

pub use node::{Node, NodeBuilder};
