//! Feed-forward network builder and activator.

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt;

use ahash::RandomState;

use crate::activations::{self, ActivationFn};
use crate::aggregations::{self, AggregationFn};
use crate::config::GenomeConfig;
use crate::errors::LookupError;
use crate::genomics::Genome;

/// Error raised while building or activating a feed-forward network.
#[derive(Debug)]
pub enum NetworkError {
    /// The genome configuration allows recurrent connections.
    NotFeedForward,
    /// The enabled-connection graph contains a cycle.
    CycleDetected,
    /// `activate` was called with the wrong number of inputs.
    InputSizeMismatch { expected: usize, actual: usize },
    /// A node references an unknown activation or aggregation.
    Lookup(LookupError),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFeedForward => {
                write!(f, "cannot build a feed-forward network from a recurrent genome config")
            }
            Self::CycleDetected => {
                write!(f, "enabled connections contain a cycle")
            }
            Self::InputSizeMismatch { expected, actual } => {
                write!(f, "expected {} inputs, got {}", expected, actual)
            }
            Self::Lookup(e) => e.fmt(f),
        }
    }
}

impl Error for NetworkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lookup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LookupError> for NetworkError {
    fn from(e: LookupError) -> Self {
        Self::Lookup(e)
    }
}

/// One node of the built network, addressed by dense index.
struct NetworkNode {
    bias: f64,
    response: f64,
    activation: ActivationFn,
    aggregation: AggregationFn,
    /// Incoming `(source index, weight)` pairs.
    inputs: Vec<(usize, f64)>,
}

/// A genome instantiated for evaluation.
pub struct FeedForwardNetwork {
    input_indices: Vec<usize>,
    output_indices: Vec<usize>,
    /// Topologically sorted node indices, inputs excluded.
    eval_order: Vec<usize>,
    nodes: Vec<NetworkNode>,
}

impl FeedForwardNetwork {
    /// Builds a network from a genome.
    ///
    /// Node indices are assigned over the ascending-sorted union of
    /// configured input and output keys, the genome's node keys, and
    /// the endpoints of enabled connections. Input keys absent from the
    /// node map default to bias 0, response 1, identity and sum, as do
    /// output keys missing from the node map.
    ///
    /// # Errors
    /// Fails if the configuration is not feed-forward, if the enabled
    /// connections contain a cycle, or if a node names an unknown
    /// activation or aggregation.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::genomics::{Genome, NodeIndexer};
    /// use neatgen::FeedForwardNetwork;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut indexer = NodeIndexer::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(11);
    /// let mut genome = Genome::new(1);
    /// genome.configure_new(&config, &mut indexer, &mut rng);
    ///
    /// let network = FeedForwardNetwork::create(&genome, &config).unwrap();
    /// assert_eq!(network.num_inputs(), 2);
    /// assert_eq!(network.num_outputs(), 1);
    /// ```
    pub fn create(genome: &Genome, config: &GenomeConfig) -> Result<FeedForwardNetwork, NetworkError> {
        if !config.feed_forward {
            return Err(NetworkError::NotFeedForward);
        }

        let enabled: Vec<_> = genome.connections().filter(|c| c.enabled).collect();

        let mut keys = BTreeSet::new();
        keys.extend(config.input_keys.iter().copied());
        keys.extend(config.output_keys.iter().copied());
        keys.extend(genome.nodes().map(|n| n.key));
        for conn in &enabled {
            keys.insert(conn.key.input);
            keys.insert(conn.key.output);
        }

        let index_of: HashMap<i32, usize, RandomState> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, index))
            .collect();

        let mut nodes = Vec::with_capacity(keys.len());
        for key in &keys {
            let node = match genome.nodes.get(key) {
                Some(gene) => NetworkNode {
                    bias: gene.bias,
                    response: gene.response,
                    activation: activations::activation(&gene.activation)?,
                    aggregation: aggregations::aggregation(&gene.aggregation)?,
                    inputs: vec![],
                },
                // Pure inputs, and output keys the genome never
                // materialized, evaluate as identity pass-throughs.
                None => NetworkNode {
                    bias: 0.0,
                    response: 1.0,
                    activation: identity,
                    aggregation: crate::math_util::sum,
                    inputs: vec![],
                },
            };
            nodes.push(node);
        }

        for conn in &enabled {
            let source = index_of[&conn.key.input];
            let target = index_of[&conn.key.output];
            nodes[target].inputs.push((source, conn.weight));
        }

        let input_indices: Vec<usize> = config.input_keys.iter().map(|k| index_of[k]).collect();
        let output_indices: Vec<usize> = config.output_keys.iter().map(|k| index_of[k]).collect();

        let eval_order = topological_order(&nodes, &input_indices)?;

        Ok(FeedForwardNetwork {
            input_indices,
            output_indices,
            eval_order,
            nodes,
        })
    }

    /// Number of input slots this network expects.
    pub fn num_inputs(&self) -> usize {
        self.input_indices.len()
    }

    /// Number of output values this network produces.
    pub fn num_outputs(&self) -> usize {
        self.output_indices.len()
    }

    /// Evaluates the network on one input vector, returning outputs in
    /// configured key order. Deterministic: identical inputs produce
    /// bit-identical outputs.
    ///
    /// # Errors
    /// Fails if `inputs` does not match the configured input count.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::config::GenomeConfig;
    /// # use neatgen::genomics::{Genome, NodeIndexer};
    /// # use neatgen::FeedForwardNetwork;
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// # let config = GenomeConfig::minimal(2, 1);
    /// # let mut indexer = NodeIndexer::new(&config);
    /// # let mut rng = ChaCha8Rng::seed_from_u64(12);
    /// # let mut genome = Genome::new(1);
    /// # genome.configure_new(&config, &mut indexer, &mut rng);
    /// let network = FeedForwardNetwork::create(&genome, &config).unwrap();
    ///
    /// let outputs = network.activate(&[0.5, -1.0]).unwrap();
    /// assert_eq!(outputs.len(), 1);
    ///
    /// // Activation is pure: the same inputs give the same outputs.
    /// assert_eq!(outputs, network.activate(&[0.5, -1.0]).unwrap());
    ///
    /// // The input arity is checked.
    /// assert!(network.activate(&[0.5]).is_err());
    /// ```
    pub fn activate(&self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        if inputs.len() != self.input_indices.len() {
            return Err(NetworkError::InputSizeMismatch {
                expected: self.input_indices.len(),
                actual: inputs.len(),
            });
        }

        let mut values = vec![0.0; self.nodes.len()];
        for (slot, value) in self.input_indices.iter().zip(inputs) {
            values[*slot] = *value;
        }

        let mut incoming = Vec::new();
        for &index in &self.eval_order {
            let node = &self.nodes[index];
            incoming.clear();
            incoming.extend(node.inputs.iter().map(|(source, weight)| values[*source] * weight));
            let aggregated = (node.aggregation)(&incoming);
            values[index] = (node.activation)((aggregated + node.bias) * node.response);
        }

        Ok(self.output_indices.iter().map(|i| values[*i]).collect())
    }
}

fn identity(x: f64) -> f64 {
    x
}

/// Kahn's algorithm over dense indices. The ready set is kept in
/// ascending index order and successors expand in ascending order, so
/// the evaluation order is a pure function of the graph. Input indices
/// are dropped from the returned order.
fn topological_order(
    nodes: &[NetworkNode],
    input_indices: &[usize],
) -> Result<Vec<usize>, NetworkError> {
    let n = nodes.len();
    let mut in_degree = vec![0usize; n];
    let mut successors = vec![vec![]; n];
    for (target, node) in nodes.iter().enumerate() {
        for (source, _) in &node.inputs {
            in_degree[target] += 1;
            successors[*source].push(target);
        }
    }
    for list in &mut successors {
        list.sort_unstable();
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|i| in_degree[*i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(&index) = ready.iter().next() {
        ready.remove(&index);
        order.push(index);
        for &next in &successors[index] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() != n {
        return Err(NetworkError::CycleDetected);
    }

    let inputs: BTreeSet<usize> = input_indices.iter().copied().collect();
    order.retain(|index| !inputs.contains(index));
    Ok(order)
}
