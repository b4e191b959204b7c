//! Node and connection genes.
//!
//! A connection's key doubles as its innovation marking: two genes with
//! the same `(input, output)` pair are homologous in any pair of
//! genomes, because node keys are stable across crossover and mutation.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GenomeConfig;
use crate::genomics::attributes;

/// A neuron gene: bias, response scaling and named activation and
/// aggregation choices.
///
/// Input nodes carry negative keys and are never materialized as
/// `NodeGene`s; output keys are `0..num_outputs`, and hidden keys are
/// handed out by the population's node indexer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    pub key: i32,
    pub bias: f64,
    pub response: f64,
    pub activation: String,
    pub aggregation: String,
}

impl NodeGene {
    /// Creates a node gene with attributes drawn from the configured
    /// initialization distributions.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::NodeGene;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let node = NodeGene::new(0, &config, &mut rng);
    /// assert_eq!(node.key, 0);
    /// assert_eq!(node.activation, "sigmoid");
    /// assert_eq!(node.aggregation, "sum");
    /// assert!(node.bias >= config.bias.min_value && node.bias <= config.bias.max_value);
    /// ```
    pub fn new(key: i32, config: &GenomeConfig, rng: &mut impl Rng) -> NodeGene {
        NodeGene {
            key,
            bias: attributes::init_float(&config.bias, rng),
            response: attributes::init_float(&config.response, rng),
            activation: attributes::init_string(&config.activation, rng),
            aggregation: attributes::init_string(&config.aggregation, rng),
        }
    }

    /// Mutates every attribute in place according to the configured rates.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::NodeGene;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    /// let mut node = NodeGene::new(0, &config, &mut rng);
    ///
    /// for _ in 0..100 {
    ///     node.mutate(&config, &mut rng);
    ///     assert!(node.bias >= config.bias.min_value && node.bias <= config.bias.max_value);
    /// }
    /// ```
    pub fn mutate(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        self.bias = attributes::mutate_float(self.bias, &config.bias, rng);
        self.response = attributes::mutate_float(self.response, &config.response, rng);
        self.activation = attributes::mutate_string(&self.activation, &config.activation, rng);
        self.aggregation = attributes::mutate_string(&self.aggregation, &config.aggregation, rng);
    }

    /// Crosses this gene with a homologous one, inheriting each
    /// attribute from either parent with a fair coin. `self` is the
    /// fitter parent's gene.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::config::GenomeConfig;
    /// # use neatgen::NodeGene;
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// # let config = GenomeConfig::minimal(2, 1);
    /// # let mut rng = ChaCha8Rng::seed_from_u64(2);
    /// let a = NodeGene::new(0, &config, &mut rng);
    /// let b = NodeGene::new(0, &config, &mut rng);
    ///
    /// let child = a.crossover(&b, &mut rng);
    /// assert_eq!(child.key, a.key);
    /// assert!(child.bias == a.bias || child.bias == b.bias);
    /// ```
    pub fn crossover(&self, other: &NodeGene, rng: &mut impl Rng) -> NodeGene {
        let mut child = self.clone();
        if rng.gen::<f64>() < 0.5 {
            child.bias = other.bias;
        }
        if rng.gen::<f64>() < 0.5 {
            child.response = other.response;
        }
        if rng.gen::<f64>() < 0.5 {
            child.activation = other.activation.clone();
        }
        if rng.gen::<f64>() < 0.5 {
            child.aggregation = other.aggregation.clone();
        }
        child
    }

    /// Attribute distance to a homologous gene, scaled by the weight
    /// compatibility coefficient.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::config::GenomeConfig;
    /// # use neatgen::NodeGene;
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// # let config = GenomeConfig::minimal(2, 1);
    /// # let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// let a = NodeGene::new(0, &config, &mut rng);
    /// let b = NodeGene::new(0, &config, &mut rng);
    ///
    /// assert_eq!(a.distance(&a, &config), 0.0);
    /// assert_eq!(a.distance(&b, &config), b.distance(&a, &config));
    /// ```
    pub fn distance(&self, other: &NodeGene, config: &GenomeConfig) -> f64 {
        let mut d = (self.bias - other.bias).abs() + (self.response - other.response).abs();
        if self.activation != other.activation {
            d += 1.0;
        }
        if self.aggregation != other.aggregation {
            d += 1.0;
        }
        d * config.compatibility_weight_coefficient
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NodeGene({}, bias {:.3}, response {:.3}, {}, {})",
            self.key, self.bias, self.response, self.activation, self.aggregation
        )
    }
}

/// Innovation identifier of a connection gene: the directed
/// `(input, output)` node-key pair.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ConnKey {
    pub input: i32,
    pub output: i32,
}

impl ConnKey {
    /// # Examples
    /// ```
    /// use neatgen::ConnKey;
    ///
    /// let key = ConnKey::new(-1, 0);
    /// assert_eq!(key.input, -1);
    /// assert_eq!(key.output, 0);
    /// assert_eq!(key.to_string(), "-1->0");
    /// ```
    pub fn new(input: i32, output: i32) -> ConnKey {
        ConnKey { input, output }
    }
}

impl fmt::Display for ConnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.input, self.output)
    }
}

/// A connection gene: weighted, optionally disabled edge between two
/// nodes. Its `output` is never an input-node key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub key: ConnKey,
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionGene {
    /// Creates a connection gene with a drawn weight and the configured
    /// default enabled state.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::{ConnKey, ConnectionGene};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut rng = ChaCha8Rng::seed_from_u64(4);
    ///
    /// let gene = ConnectionGene::new(ConnKey::new(-1, 0), &config, &mut rng);
    /// assert!(gene.enabled);
    /// assert!(gene.weight >= config.weight.min_value && gene.weight <= config.weight.max_value);
    /// ```
    pub fn new(key: ConnKey, config: &GenomeConfig, rng: &mut impl Rng) -> ConnectionGene {
        ConnectionGene {
            key,
            weight: attributes::init_float(&config.weight, rng),
            enabled: attributes::init_bool(&config.enabled, rng),
        }
    }

    /// Crosses this gene with its homologue, taking each attribute from
    /// either parent with a fair coin. `self` is the fitter parent's gene.
    ///
    /// # Examples
    /// ```
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// use neatgen::{ConnKey, ConnectionGene};
    ///
    /// # let mut rng = ChaCha8Rng::seed_from_u64(5);
    /// let key = ConnKey::new(-1, 0);
    /// let a = ConnectionGene { key, weight: 1.0, enabled: true };
    /// let b = ConnectionGene { key, weight: -1.0, enabled: false };
    ///
    /// let child = a.crossover(&b, &mut rng);
    /// assert_eq!(child.key, key);
    /// assert!(child.weight == 1.0 || child.weight == -1.0);
    /// ```
    pub fn crossover(&self, other: &ConnectionGene, rng: &mut impl Rng) -> ConnectionGene {
        let mut child = self.clone();
        if rng.gen::<f64>() < 0.5 {
            child.weight = other.weight;
        }
        if rng.gen::<f64>() < 0.5 {
            child.enabled = other.enabled;
        }
        child
    }

    /// Attribute distance to a homologous gene, scaled by the weight
    /// compatibility coefficient.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::{ConnKey, ConnectionGene};
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let key = ConnKey::new(-1, 0);
    /// let a = ConnectionGene { key, weight: 1.0, enabled: true };
    /// let b = ConnectionGene { key, weight: -1.0, enabled: false };
    ///
    /// // Weight gap of 2 plus the enabled mismatch, scaled by the
    /// // weight coefficient of 0.5.
    /// assert_eq!(a.distance(&b, &config), 1.5);
    /// assert_eq!(a.distance(&a, &config), 0.0);
    /// ```
    pub fn distance(&self, other: &ConnectionGene, config: &GenomeConfig) -> f64 {
        let mut d = (self.weight - other.weight).abs();
        if self.enabled != other.enabled {
            d += 1.0;
        }
        d * config.compatibility_weight_coefficient
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ConnGene({}, weight {:.3}){}",
            if self.enabled { "" } else { "(" },
            self.key,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
