// src/job/mod.rs

//! Job vocabulary shared by the submitter and the pipeline builder.
//!
//! - [`id`] holds the queue-assigned [`JobId`] with its explicit
//!   "unavailable" variant.
//! - [`deps`] holds [`DependencySet`], the ordered hold list and its wire form.
//! - [`spec`] holds [`JobSpec`] and [`QueueClass`].

pub mod deps;
pub mod id;
pub mod spec;

pub use deps::DependencySet;
pub use id::{JobId, SENTINEL};
pub use spec::{JobSpec, QueueClass};
