//! Phenotypes: executable networks derived from genomes.
//!
//! Only feed-forward networks are supported. The builder assigns dense
//! indices to the union of all referenced node keys and orders
//! evaluation with a deterministic topological sort, so activation is
//! bit-reproducible for a given genome and input.

mod feed_forward;

pub use feed_forward::{FeedForwardNetwork, NetworkError};
