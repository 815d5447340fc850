//! Layer abstractions for the coordinate network

mod r#trait;
pub mod dense;

pub use dense::DenseLayer;
pub use r#trait::Layer;
