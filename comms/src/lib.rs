//! Specifications exchanged between the job driver and its workers.
//!
//! Everything in here is plain data that travels as JSON: the architecture
//! descriptor every worker rebuilds its model from and the scoring settings.

pub mod specs;
