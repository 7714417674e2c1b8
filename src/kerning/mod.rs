//! Kerning tooling: class derivation and distance rebalancing.

pub mod classes;
pub mod distances;

pub use classes::KerningClassBuilder;
pub use distances::DistanceRebalancer;
