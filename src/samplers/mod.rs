//! Sampling strategies for minimal sets.
//!
//! All samplers implement [`Sampler`](crate::core::Sampler) and draw distinct
//! indices. Every sampler can be built from a fixed seed, which makes a whole
//! estimation call reproducible.

pub mod exhaustive;
pub mod prosac;
pub mod uniform;

pub use exhaustive::ExhaustiveSampler;
pub use prosac::ProsacSampler;
pub use uniform::UniformRandomSampler;
