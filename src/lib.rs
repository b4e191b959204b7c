//! An implementation of NeuroEvolution of Augmenting Topologies (NEAT),
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Populations of genomes evolve both connection weights and network
//! topology under a user-supplied fitness evaluator, with
//! compatibility-based speciation, fitness sharing, stagnation pruning
//! and elitist reproduction. Runs are configured from an INI file,
//! deterministic for a given seed, and can be checkpointed to disk.
//!
//! # Example usage: evolution of an XOR function approximator
//! ```no_run
//! use neatgen::networks::FeedForwardNetwork;
//! use neatgen::{Config, Population};
//!
//! const XOR: [([f64; 2], f64); 4] = [
//!     ([0.0, 0.0], 0.0),
//!     ([0.0, 1.0], 1.0),
//!     ([1.0, 0.0], 1.0),
//!     ([1.0, 1.0], 0.0),
//! ];
//!
//! fn main() {
//!     let config = Config::from_file("xor.cfg").unwrap();
//!     let genome_config = config.genome.clone();
//!     let mut population = Population::new(config, 42).unwrap();
//!
//!     for _ in 0..300 {
//!         let winner = population
//!             .run_generation(|genomes| {
//!                 for genome in genomes.values_mut() {
//!                     let network = FeedForwardNetwork::create(genome, &genome_config)?;
//!                     let mut error = 0.0;
//!                     for (inputs, expected) in &XOR {
//!                         let outputs = network.activate(inputs)?;
//!                         error += (outputs[0] - expected).powi(2);
//!                     }
//!                     genome.set_fitness((4.0 - error).max(0.0).powi(2));
//!                 }
//!                 Ok(())
//!             })
//!             .unwrap();
//!
//!         if let Some(winner) = winner {
//!             println!("winner: {}", winner);
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod activations;
pub mod aggregations;
pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod eval;
pub mod genomics;
pub mod math_util;
pub mod networks;
pub mod populations;

pub use config::{Config, ConfigError};
pub use genomics::{ConnKey, ConnectionGene, Genome, NodeGene};
pub use networks::{FeedForwardNetwork, NetworkError};
pub use populations::{Population, PopulationError, Species, SpeciesSet};
