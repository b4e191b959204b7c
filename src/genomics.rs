//! Genomes and their genes.
//!
//! A genome is a set of node genes plus connection genes keyed by the
//! `(input, output)` node pair, which serves as the innovation marking
//! used for crossover alignment and compatibility distance. Genomes
//! grow through structural mutation and are instantiated as phenotypes
//! by the [`networks`](crate::networks) module.

mod attributes;
mod genes;
mod genome;

pub use genes::{ConnKey, ConnectionGene, NodeGene};
pub use genome::{Genome, NodeIndexer};
