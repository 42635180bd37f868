//! Lightweight inference for exported actor networks.

pub mod dense;

pub use dense::{Activation, DenseLayer, DenseNetwork};
