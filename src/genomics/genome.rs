//! The genome: an innovation-keyed collection of node and connection
//! genes, with structural mutation, crossover and compatibility
//! distance.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{GenomeConfig, InitialConnection};
use crate::genomics::genes::{ConnKey, ConnectionGene, NodeGene};

/// Budget of attempts for finding an unconnected, acyclic node pair
/// during an add-connection mutation.
const ADD_CONNECTION_ATTEMPTS: usize = 20;

/// Monotonic source of hidden-node keys, shared across the whole
/// population so that node keys stay unique for the lifetime of a run.
/// Seeded at `num_outputs`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeIndexer {
    next: i32,
}

impl NodeIndexer {
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::genomics::NodeIndexer;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut indexer = NodeIndexer::new(&config);
    ///
    /// // The single output occupies key 0; hidden keys follow.
    /// assert_eq!(indexer.next_key(), 1);
    /// assert_eq!(indexer.next_key(), 2);
    /// ```
    pub fn new(config: &GenomeConfig) -> NodeIndexer {
        NodeIndexer {
            next: config.first_hidden_key(),
        }
    }

    pub fn next_key(&mut self) -> i32 {
        let key = self.next;
        self.next += 1;
        key
    }
}

/// An individual: nodes plus innovation-keyed connections.
///
/// Maps are ordered so that every operation that feeds the seeded RNG
/// walks genes in a reproducible order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub(crate) key: u64,
    pub(crate) nodes: BTreeMap<i32, NodeGene>,
    pub(crate) connections: BTreeMap<ConnKey, ConnectionGene>,
    pub(crate) fitness: Option<f64>,
}

impl Genome {
    /// Creates an empty genome. Call [`configure_new`] to populate it
    /// from the configuration, or [`configure_crossover`] to fill it
    /// from two parents.
    ///
    /// [`configure_new`]: Genome::configure_new
    /// [`configure_crossover`]: Genome::configure_crossover
    ///
    /// # Examples
    /// ```
    /// use neatgen::Genome;
    ///
    /// let genome = Genome::new(1);
    /// assert_eq!(genome.key(), 1);
    /// assert_eq!(genome.nodes().count(), 0);
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn new(key: u64) -> Genome {
        Genome {
            key,
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            fitness: None,
        }
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    /// Fitness assigned by the evaluator, or `None` before the first
    /// evaluation.
    ///
    /// # Examples
    /// ```
    /// use neatgen::Genome;
    ///
    /// let mut genome = Genome::new(1);
    /// assert!(genome.fitness().is_none());
    ///
    /// genome.set_fitness(3.5);
    /// assert_eq!(genome.fitness(), Some(3.5));
    /// ```
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Fitness of an evaluated genome. Every reproduction-path caller
    /// runs after evaluation, so absence is an invariant breach.
    pub(crate) fn evaluated_fitness(&self) -> f64 {
        self.fitness
            .unwrap_or_else(|| panic!("genome {} has not been evaluated", self.key))
    }

    /// Iterates over node genes in ascending key order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Iterates over connection genes in ascending key order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    /// Populates a fresh genome: output nodes first, then `num_hidden`
    /// hidden nodes keyed from the shared indexer, then the configured
    /// initial-connection scheme.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::genomics::{Genome, NodeIndexer};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut indexer = NodeIndexer::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(7);
    ///
    /// let mut genome = Genome::new(1);
    /// genome.configure_new(&config, &mut indexer, &mut rng);
    ///
    /// // Full direct wiring: both inputs connected to the output.
    /// assert_eq!(genome.nodes().count(), 1);
    /// assert_eq!(genome.connections().count(), 2);
    /// ```
    pub fn configure_new(
        &mut self,
        config: &GenomeConfig,
        indexer: &mut NodeIndexer,
        rng: &mut impl Rng,
    ) {
        for &key in &config.output_keys {
            self.insert_node(NodeGene::new(key, config, rng));
        }
        for _ in 0..config.num_hidden {
            let key = indexer.next_key();
            self.insert_node(NodeGene::new(key, config, rng));
        }
        self.configure_initial_connections(config, rng);
    }

    fn insert_node(&mut self, node: NodeGene) {
        let key = node.key;
        if self.nodes.insert(key, node).is_some() {
            panic!("duplicate node key {} in genome {}", key, self.key);
        }
    }

    fn configure_initial_connections(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        let hidden: Vec<i32> = self
            .nodes
            .keys()
            .copied()
            .filter(|k| !config.output_keys.contains(k))
            .collect();

        let (direct, fraction) = match config.initial_connection {
            InitialConnection::Unconnected => return,
            InitialConnection::FsNeatNoHidden => {
                for &input in &config.input_keys {
                    for &output in &config.output_keys {
                        self.add_initial_connection(input, output, 1.0, config, rng);
                    }
                }
                return;
            }
            InitialConnection::FsNeatHidden => {
                if hidden.is_empty() {
                    log::warn!(
                        "initial_connection fs_neat_hidden with no hidden nodes wires nothing"
                    );
                }
                for &input in &config.input_keys {
                    for &h in &hidden {
                        self.add_initial_connection(input, h, 1.0, config, rng);
                    }
                }
                for &h in &hidden {
                    for &output in &config.output_keys {
                        self.add_initial_connection(h, output, 1.0, config, rng);
                    }
                }
                return;
            }
            InitialConnection::FullNoDirect => (false, 1.0),
            InitialConnection::FullDirect => (true, 1.0),
            InitialConnection::PartialNoDirect(f) => (false, f),
            InitialConnection::PartialDirect(f) => (true, f),
        };

        for &input in &config.input_keys {
            for &h in &hidden {
                self.add_initial_connection(input, h, fraction, config, rng);
            }
            if direct {
                for &output in &config.output_keys {
                    self.add_initial_connection(input, output, fraction, config, rng);
                }
            }
        }
        for &h1 in &hidden {
            for &h2 in &hidden {
                self.add_initial_connection(h1, h2, fraction, config, rng);
            }
            for &output in &config.output_keys {
                self.add_initial_connection(h1, output, fraction, config, rng);
            }
        }
    }

    /// Adds one candidate connection of an initial wiring scheme,
    /// subject to Bernoulli sampling for the partial schemes. Pairs
    /// that would break the feed-forward invariant (hidden-to-hidden
    /// back edges, self loops) are skipped.
    fn add_initial_connection(
        &mut self,
        input: i32,
        output: i32,
        fraction: f64,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) {
        if config.feed_forward && self.creates_cycle(input, output) {
            return;
        }
        if fraction < 1.0 && rng.gen::<f64>() >= fraction {
            return;
        }
        let key = ConnKey::new(input, output);
        let gene = ConnectionGene::new(key, config, rng);
        self.connections.insert(key, gene);
    }

    /// Fills this genome by crossing two parents. The fitter parent
    /// contributes all nodes and its disjoint/excess connections;
    /// homologous connections mix attributes with a fair coin.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::config::GenomeConfig;
    /// # use neatgen::genomics::{Genome, NodeIndexer};
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// # let config = GenomeConfig::minimal(2, 1);
    /// # let mut indexer = NodeIndexer::new(&config);
    /// # let mut rng = ChaCha8Rng::seed_from_u64(8);
    /// let mut p1 = Genome::new(1);
    /// p1.configure_new(&config, &mut indexer, &mut rng);
    /// p1.set_fitness(2.0);
    ///
    /// let mut p2 = Genome::new(2);
    /// p2.configure_new(&config, &mut indexer, &mut rng);
    /// p2.set_fitness(1.0);
    ///
    /// let mut child = Genome::new(3);
    /// child.configure_crossover(&p1, &p2, &mut rng);
    ///
    /// // The parents are fully homologous, so the child carries the
    /// // same gene set.
    /// assert_eq!(child.connections().count(), 2);
    /// assert_eq!(child.nodes().count(), 1);
    /// ```
    pub fn configure_crossover(&mut self, p1: &Genome, p2: &Genome, rng: &mut impl Rng) {
        let (fit, unfit) = if p1.evaluated_fitness() >= p2.evaluated_fitness() {
            (p1, p2)
        } else {
            (p2, p1)
        };

        for (key, node) in &fit.nodes {
            self.nodes.insert(*key, node.clone());
        }

        for (key, conn) in &fit.connections {
            let child_gene = match unfit.connections.get(key) {
                Some(other) => conn.crossover(other, rng),
                None => conn.clone(),
            };
            self.connections.insert(*key, child_gene);
        }
    }

    /// Applies structural and attribute mutations in order: add-node,
    /// add-connection (skipped after a structural change when
    /// `single_structural_mutation` is set), then per-gene attribute
    /// kernels. Deletion probabilities are reserved in the
    /// configuration but have no semantics yet.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::config::GenomeConfig;
    /// # use neatgen::genomics::{Genome, NodeIndexer};
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// # let config = GenomeConfig::minimal(2, 1);
    /// # let mut indexer = NodeIndexer::new(&config);
    /// # let mut rng = ChaCha8Rng::seed_from_u64(9);
    /// let mut genome = Genome::new(1);
    /// genome.configure_new(&config, &mut indexer, &mut rng);
    ///
    /// for _ in 0..50 {
    ///     genome.mutate(&config, &mut indexer, &mut rng);
    /// }
    ///
    /// // Attributes stay inside their configured bounds.
    /// assert!(genome.connections().all(|c| {
    ///     c.weight >= config.weight.min_value && c.weight <= config.weight.max_value
    /// }));
    /// ```
    pub fn mutate(
        &mut self,
        config: &GenomeConfig,
        indexer: &mut NodeIndexer,
        rng: &mut impl Rng,
    ) {
        let mut structure_mutated = false;

        if rng.gen::<f64>() < config.node_add_prob && self.mutate_add_node(config, indexer, rng) {
            structure_mutated = true;
        }

        if (!config.single_structural_mutation || !structure_mutated)
            && rng.gen::<f64>() < config.conn_add_prob
        {
            self.mutate_add_connection(config, rng);
        }

        for node in self.nodes.values_mut() {
            node.mutate(config, rng);
        }
        self.mutate_connection_attributes(config, rng);
    }

    /// Splits a uniformly chosen connection: the original is disabled,
    /// and the new hidden node is wired with weight 1.0 on the input
    /// side and the original weight on the output side.
    pub(crate) fn mutate_add_node(
        &mut self,
        config: &GenomeConfig,
        indexer: &mut NodeIndexer,
        rng: &mut impl Rng,
    ) -> bool {
        if self.connections.is_empty() {
            return false;
        }
        let keys: Vec<ConnKey> = self.connections.keys().copied().collect();
        let split_key = keys[rng.gen_range(0..keys.len())];

        let new_key = indexer.next_key();
        self.insert_node(NodeGene::new(new_key, config, rng));

        let original_weight = match self.connections.get_mut(&split_key) {
            Some(conn) => {
                conn.enabled = false;
                conn.weight
            }
            None => unreachable!("split key vanished from connection map"),
        };

        let upper = ConnKey::new(split_key.input, new_key);
        self.connections.insert(
            upper,
            ConnectionGene {
                key: upper,
                weight: 1.0,
                enabled: true,
            },
        );
        let lower = ConnKey::new(new_key, split_key.output);
        self.connections.insert(
            lower,
            ConnectionGene {
                key: lower,
                weight: original_weight,
                enabled: true,
            },
        );
        true
    }

    /// Tries to connect a previously unconnected node pair, drawing
    /// candidates at random under a fixed attempt budget.
    pub(crate) fn mutate_add_connection(
        &mut self,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> bool {
        let possible_inputs: Vec<i32> = config
            .input_keys
            .iter()
            .copied()
            .chain(self.nodes.keys().copied())
            .collect();
        let possible_outputs: Vec<i32> = self.nodes.keys().copied().collect();
        if possible_inputs.is_empty() || possible_outputs.is_empty() {
            return false;
        }

        for _ in 0..ADD_CONNECTION_ATTEMPTS {
            let input = possible_inputs[rng.gen_range(0..possible_inputs.len())];
            let output = possible_outputs[rng.gen_range(0..possible_outputs.len())];
            if !self.valid_new_connection(config, input, output) {
                continue;
            }
            let key = ConnKey::new(input, output);
            let gene = ConnectionGene::new(key, config, rng);
            self.connections.insert(key, gene);
            return true;
        }
        log::debug!(
            "genome {}: no viable node pair found for add-connection mutation",
            self.key
        );
        false
    }

    /// Whether a new connection `input -> output` is admissible: the
    /// target may not be an input node, the pair may not already exist,
    /// and in feed-forward genomes it may not close a cycle.
    pub(crate) fn valid_new_connection(
        &self,
        config: &GenomeConfig,
        input: i32,
        output: i32,
    ) -> bool {
        if config.input_keys.contains(&output) {
            return false;
        }
        if self.connections.contains_key(&ConnKey::new(input, output)) {
            return false;
        }
        !(config.feed_forward && self.creates_cycle(input, output))
    }

    /// Whether adding `input -> output` would close a cycle among the
    /// currently enabled connections: true iff `input` is reachable
    /// from `output`. Self loops count as cycles. Shared by the
    /// add-connection mutation and the enable flip in
    /// [`mutate_connection_attributes`](Genome::mutate).
    pub(crate) fn creates_cycle(&self, input: i32, output: i32) -> bool {
        if input == output {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([output]);
        while let Some(current) = queue.pop_front() {
            if current == input {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for conn in self.connections.values() {
                if conn.enabled && conn.key.input == current {
                    queue.push_back(conn.key.output);
                }
            }
        }
        false
    }

    /// Mutates every connection's attributes. A disabled connection
    /// that would re-enable into a cycle stays disabled; the check runs
    /// against the enabled set as it evolves over the pass.
    fn mutate_connection_attributes(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        use crate::genomics::attributes;

        let keys: Vec<ConnKey> = self.connections.keys().copied().collect();
        for key in keys {
            if let Some(mut conn) = self.connections.remove(&key) {
                conn.weight = attributes::mutate_float(conn.weight, &config.weight, rng);
                let was_enabled = conn.enabled;
                let mut enabled = attributes::mutate_bool(was_enabled, &config.enabled, rng);
                if enabled
                    && !was_enabled
                    && config.feed_forward
                    && self.creates_cycle(key.input, key.output)
                {
                    enabled = false;
                }
                conn.enabled = enabled;
                self.connections.insert(key, conn);
            }
        }
    }

    /// Compatibility distance to another genome. `D` counts connection
    /// keys present in exactly one genome, homologous pairs contribute
    /// their gene distance, and the disjoint term is normalized by the
    /// larger gene count. Symmetric by construction.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::config::GenomeConfig;
    /// # use neatgen::genomics::{Genome, NodeIndexer};
    /// # use rand::SeedableRng;
    /// # use rand_chacha::ChaCha8Rng;
    /// # let config = GenomeConfig::minimal(2, 1);
    /// # let mut indexer = NodeIndexer::new(&config);
    /// # let mut rng = ChaCha8Rng::seed_from_u64(10);
    /// let mut a = Genome::new(1);
    /// a.configure_new(&config, &mut indexer, &mut rng);
    /// let mut b = Genome::new(2);
    /// b.configure_new(&config, &mut indexer, &mut rng);
    ///
    /// assert_eq!(a.distance(&a, &config), 0.0);
    /// assert_eq!(a.distance(&b, &config), b.distance(&a, &config));
    /// ```
    pub fn distance(&self, other: &Genome, config: &GenomeConfig) -> f64 {
        let mut disjoint = 0usize;
        let mut homologous = 0usize;
        let mut attr_distance = 0.0;

        for (key, conn) in &self.connections {
            match other.connections.get(key) {
                Some(other_conn) => {
                    attr_distance += conn.distance(other_conn, config);
                    homologous += 1;
                }
                None => disjoint += 1,
            }
        }
        disjoint += other
            .connections
            .keys()
            .filter(|key| !self.connections.contains_key(key))
            .count();

        let n = self.connections.len().max(other.connections.len()).max(1) as f64;
        let mut d = config.compatibility_disjoint_coefficient * disjoint as f64 / n;
        if homologous > 0 {
            d += config.compatibility_weight_coefficient * attr_distance / homologous as f64;
        }
        d
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Genome({}, {} nodes, {} connections, fitness {:?})",
            self.key,
            self.nodes.len(),
            self.connections.len(),
            self.fitness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_genome_config, InitialConnection};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Genome with a single output node 0 and one connection `-1 -> 0`.
    fn single_connection_genome(weight: f64) -> Genome {
        let config = test_genome_config();
        let mut rng = rng();
        let mut genome = Genome::new(1);
        genome.insert_node(NodeGene::new(0, &config, &mut rng));
        let key = ConnKey::new(-1, 0);
        genome.connections.insert(
            key,
            ConnectionGene {
                key,
                weight,
                enabled: true,
            },
        );
        genome
    }

    #[test]
    fn add_node_splits_connection() {
        let config = test_genome_config();
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = single_connection_genome(0.5);
        let mut rng = rng();

        assert!(genome.mutate_add_node(&config, &mut indexer, &mut rng));

        // The indexer starts at num_outputs, so the new hidden node is 1.
        let original = &genome.connections[&ConnKey::new(-1, 0)];
        assert!(!original.enabled);
        let upper = &genome.connections[&ConnKey::new(-1, 1)];
        assert_eq!(upper.weight, 1.0);
        assert!(upper.enabled);
        let lower = &genome.connections[&ConnKey::new(1, 0)];
        assert_eq!(lower.weight, 0.5);
        assert!(lower.enabled);
        assert!(genome.nodes.contains_key(&1));
    }

    #[test]
    fn add_node_on_empty_genome_is_inert() {
        let config = test_genome_config();
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        assert!(!genome.mutate_add_node(&config, &mut indexer, &mut rng()));
    }

    #[test]
    fn cycle_creating_connection_is_rejected() {
        let config = test_genome_config();
        let mut rng = rng();
        let mut genome = Genome::new(1);
        for key in [0, 1, 2] {
            genome.insert_node(NodeGene::new(key, &config, &mut rng));
        }
        for (input, output) in [(-1, 1), (1, 2), (2, 0)] {
            let key = ConnKey::new(input, output);
            genome.connections.insert(
                key,
                ConnectionGene {
                    key,
                    weight: 1.0,
                    enabled: true,
                },
            );
        }

        // 0 -> 1 would close the loop 1 -> 2 -> 0 -> 1.
        assert!(genome.creates_cycle(0, 1));
        assert!(!genome.valid_new_connection(&config, 0, 1));
        let before = genome.connections.len();
        assert!(!genome.connections.contains_key(&ConnKey::new(0, 1)));
        assert_eq!(genome.connections.len(), before);

        // The reverse direction is fine.
        assert!(genome.valid_new_connection(&config, 0, 2));
    }

    #[test]
    fn self_loops_are_cycles() {
        let genome = single_connection_genome(1.0);
        assert!(genome.creates_cycle(0, 0));
    }

    #[test]
    fn disabled_connections_do_not_carry_cycles() {
        let mut genome = single_connection_genome(1.0);
        let config = test_genome_config();
        genome
            .connections
            .get_mut(&ConnKey::new(-1, 0))
            .unwrap()
            .enabled = false;
        // With the only connection disabled there is no path 0 -> -1.
        assert!(!genome.creates_cycle(-1, 0));
        assert!(!genome.valid_new_connection(&config, 0, 0));
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let config = test_genome_config();
        let a = single_connection_genome(0.0);
        let b = single_connection_genome(2.0);
        assert_eq!(a.distance(&a, &config), 0.0);
        assert_eq!(a.distance(&b, &config), b.distance(&a, &config));
    }

    #[test]
    fn distance_counts_disjoint_keys() {
        let mut config = test_genome_config();
        config.compatibility_disjoint_coefficient = 1.0;
        let a = single_connection_genome(1.0);
        let mut b = single_connection_genome(1.0);
        // Replace b's connection with one keyed differently.
        b.connections.clear();
        let key = ConnKey::new(-2, 0);
        b.connections.insert(
            key,
            ConnectionGene {
                key,
                weight: 1.0,
                enabled: true,
            },
        );
        // Two disjoint genes over N = 1.
        assert_eq!(a.distance(&b, &config), 2.0);
    }

    #[test]
    fn crossover_never_inherits_from_less_fit_disjoint() {
        let config = test_genome_config();
        let mut rng = rng();

        let mut p1 = single_connection_genome(1.0);
        p1.set_fitness(10.0);
        let extra = ConnKey::new(-2, 0);
        p1.connections.insert(
            extra,
            ConnectionGene {
                key: extra,
                weight: 0.3,
                enabled: true,
            },
        );

        let mut p2 = single_connection_genome(-1.0);
        p2.set_fitness(1.0);
        let unfit_only = ConnKey::new(-2, 1);
        p2.insert_node(NodeGene::new(1, &config, &mut rng));
        p2.connections.insert(
            unfit_only,
            ConnectionGene {
                key: unfit_only,
                weight: 0.9,
                enabled: true,
            },
        );

        for _ in 0..50 {
            let mut child = Genome::new(99);
            child.configure_crossover(&p1, &p2, &mut rng);
            assert!(child.connections.contains_key(&ConnKey::new(-1, 0)));
            assert!(child.connections.contains_key(&extra));
            assert!(!child.connections.contains_key(&unfit_only));
            // Homologous weights come from one parent or the other.
            let w = child.connections[&ConnKey::new(-1, 0)].weight;
            assert!(w == 1.0 || w == -1.0);
        }
    }

    #[test]
    fn crossover_argument_order_is_irrelevant() {
        let mut rng = rng();
        let mut p1 = single_connection_genome(1.0);
        p1.set_fitness(1.0);
        let extra = ConnKey::new(-2, 0);
        p1.connections.insert(
            extra,
            ConnectionGene {
                key: extra,
                weight: 0.3,
                enabled: true,
            },
        );
        let mut p2 = single_connection_genome(-1.0);
        p2.set_fitness(5.0);

        // p2 is fitter; its gene set shapes the child even as second argument.
        let mut child = Genome::new(7);
        child.configure_crossover(&p1, &p2, &mut rng);
        assert!(!child.connections.contains_key(&extra));
    }

    #[test]
    fn configure_new_full_direct() {
        let config = test_genome_config();
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        genome.configure_new(&config, &mut indexer, &mut rng());
        assert_eq!(genome.nodes.len(), 1);
        assert_eq!(genome.connections.len(), 2);
        assert!(genome.connections.contains_key(&ConnKey::new(-1, 0)));
        assert!(genome.connections.contains_key(&ConnKey::new(-2, 0)));
    }

    #[test]
    fn configure_new_unconnected() {
        let mut config = test_genome_config();
        config.initial_connection = InitialConnection::Unconnected;
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        genome.configure_new(&config, &mut indexer, &mut rng());
        assert!(genome.connections.is_empty());
    }

    #[test]
    fn configure_new_fs_neat_hidden() {
        let mut config = test_genome_config();
        config.num_hidden = 2;
        config.initial_connection = InitialConnection::FsNeatHidden;
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        genome.configure_new(&config, &mut indexer, &mut rng());
        // 2 inputs x 2 hidden + 2 hidden x 1 output.
        assert_eq!(genome.connections.len(), 6);
        assert!(genome.connections.contains_key(&ConnKey::new(-1, 1)));
        assert!(genome.connections.contains_key(&ConnKey::new(2, 0)));
    }

    #[test]
    fn configure_new_full_keeps_feed_forward_acyclic() {
        let mut config = test_genome_config();
        config.num_hidden = 3;
        config.initial_connection = InitialConnection::FullNoDirect;
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        genome.configure_new(&config, &mut indexer, &mut rng());

        // Inputs to hidden (6), forward hidden-to-hidden pairs (3),
        // hidden to output (3); no self loops or back edges.
        assert_eq!(genome.connections.len(), 12);
        for conn in genome.connections.values() {
            assert_ne!(conn.key.input, conn.key.output);
        }
        // Re-checking every edge against the rest finds no cycle.
        for key in genome.connections.keys() {
            assert!(!config.input_keys.contains(&key.output));
        }
    }

    #[test]
    fn configure_new_partial_fraction_extremes() {
        let mut config = test_genome_config();
        config.initial_connection = InitialConnection::PartialDirect(0.0);
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        genome.configure_new(&config, &mut indexer, &mut rng());
        assert!(genome.connections.is_empty());

        config.initial_connection = InitialConnection::PartialDirect(1.0);
        let mut full = Genome::new(2);
        full.configure_new(&config, &mut indexer, &mut rng());
        assert_eq!(full.connections.len(), 2);
    }

    #[test]
    fn mutate_keeps_attributes_in_bounds() {
        let mut config = test_genome_config();
        config.weight.max_value = 3.0;
        config.weight.min_value = -3.0;
        config.bias.max_value = 2.0;
        config.bias.min_value = -2.0;
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        let mut rng = rng();
        genome.configure_new(&config, &mut indexer, &mut rng);
        for _ in 0..200 {
            genome.mutate(&config, &mut indexer, &mut rng);
        }
        for conn in genome.connections.values() {
            assert!((-3.0..=3.0).contains(&conn.weight));
        }
        for node in genome.nodes.values() {
            assert!((-2.0..=2.0).contains(&node.bias));
        }
    }

    #[test]
    fn mutate_preserves_feed_forward_invariant() {
        let mut config = test_genome_config();
        config.node_add_prob = 0.5;
        config.conn_add_prob = 0.8;
        config.enabled.mutate_rate = 0.2;
        let mut indexer = NodeIndexer::new(&config);
        let mut genome = Genome::new(1);
        let mut rng = rng();
        genome.configure_new(&config, &mut indexer, &mut rng);
        for _ in 0..100 {
            genome.mutate(&config, &mut indexer, &mut rng);
        }
        // No enabled edge may be reachable from its own output.
        for conn in genome.connections.values().filter(|c| c.enabled) {
            let mut probe = genome.clone();
            probe.connections.remove(&conn.key);
            assert!(
                !probe.creates_cycle(conn.key.input, conn.key.output),
                "enabled connection {} closes a cycle",
                conn.key
            );
        }
    }
}
