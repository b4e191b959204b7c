//! Reproduction: turns the current species partition into the next
//! generation through fitness sharing, damped spawn allocation,
//! elitism and crossover.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{Config, GenomeConfig};
use crate::genomics::{Genome, NodeIndexer};
use crate::populations::species::SpeciesSet;
use crate::populations::stagnation::Stagnation;

/// Offspring factory. Owns the monotonic genome-key counter, the
/// shared hidden-node indexer and the ancestry map; all three survive
/// checkpointing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reproduction {
    next_genome_key: u64,
    node_indexer: NodeIndexer,
    ancestors: BTreeMap<u64, Vec<u64>>,
}

impl Reproduction {
    pub fn new(config: &GenomeConfig) -> Reproduction {
        Reproduction {
            next_genome_key: 1,
            node_indexer: NodeIndexer::new(config),
            ancestors: BTreeMap::new(),
        }
    }

    fn next_key(&mut self) -> u64 {
        let key = self.next_genome_key;
        self.next_genome_key += 1;
        key
    }

    /// Parent keys of each current genome; elites map to themselves.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let population = Population::new(Config::minimal(2, 1), 5).unwrap();
    /// // Genomes of an initial population have no parents.
    /// for genome in population.genomes() {
    ///     assert!(population.reproduction().ancestors()[&genome.key()].is_empty());
    /// }
    /// ```
    pub fn ancestors(&self) -> &BTreeMap<u64, Vec<u64>> {
        &self.ancestors
    }

    /// Creates a brand-new population of `pop_size` configured genomes.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    /// use neatgen::populations::Reproduction;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GenomeConfig::minimal(2, 1);
    /// let mut reproduction = Reproduction::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(6);
    ///
    /// let genomes = reproduction.create_new_population(&config, 10, &mut rng);
    /// assert_eq!(genomes.len(), 10);
    /// assert!(genomes.values().all(|g| g.fitness().is_none()));
    /// ```
    pub fn create_new_population(
        &mut self,
        config: &GenomeConfig,
        pop_size: usize,
        rng: &mut impl Rng,
    ) -> BTreeMap<u64, Genome> {
        let mut genomes = BTreeMap::new();
        for _ in 0..pop_size {
            let key = self.next_key();
            let mut genome = Genome::new(key);
            genome.configure_new(config, &mut self.node_indexer, rng);
            self.ancestors.insert(key, vec![]);
            genomes.insert(key, genome);
        }
        genomes
    }

    /// Produces the next generation from the speciated population.
    ///
    /// Runs the stagnation pass, shares fitness across surviving
    /// species, allocates spawn counts, transfers elites unchanged and
    /// fills the remainder with mutated crossover offspring. An empty
    /// result signals extinction; the population controller decides
    /// what to do with it.
    pub fn reproduce(
        &mut self,
        config: &Config,
        species_set: &mut SpeciesSet,
        stagnation: &Stagnation,
        generation: usize,
        rng: &mut impl Rng,
    ) -> BTreeMap<u64, Genome> {
        let stagnation_report = stagnation.update(species_set, generation);

        let mut remaining: Vec<u64> = Vec::new();
        let mut all_fitnesses: Vec<f64> = Vec::new();
        for (key, is_stagnant) in stagnation_report {
            let species = &species_set.species[&key];
            if is_stagnant {
                log::info!("species {} removed due to stagnation", key);
            } else if species.is_empty() {
                log::info!("species {} removed: no members", key);
            } else {
                all_fitnesses.extend(species.member_fitnesses());
                remaining.push(key);
            }
        }

        if remaining.is_empty() {
            log::warn!("all species are extinct");
            return BTreeMap::new();
        }

        // Fitness sharing: normalize species fitness into [0, 1] by the
        // population-wide range, floored at 1 to avoid amplification.
        let min_fitness = crate::math_util::min(&all_fitnesses);
        let max_fitness = crate::math_util::max(&all_fitnesses);
        let fitness_range = (max_fitness - min_fitness).max(1.0);

        let mut adjusted_fitnesses = Vec::with_capacity(remaining.len());
        let mut previous_sizes = Vec::with_capacity(remaining.len());
        for &key in &remaining {
            let species = species_set
                .species
                .get_mut(&key)
                .expect("surviving species disappeared");
            let adjusted = (species.fitness.unwrap_or(f64::NEG_INFINITY) - min_fitness)
                / fitness_range;
            species.adjusted_fitness = Some(adjusted);
            adjusted_fitnesses.push(adjusted);
            previous_sizes.push(species.len());
        }
        let adjusted_sum: f64 = adjusted_fitnesses.iter().sum();

        let spawn_floor = config
            .reproduction
            .min_species_size
            .max(config.reproduction.elitism);
        let spawn_amounts = compute_spawn_amounts(
            &adjusted_fitnesses,
            adjusted_sum,
            &previous_sizes,
            config.neat.pop_size,
            spawn_floor,
            rng,
        );

        let mut new_population = BTreeMap::new();
        let mut new_ancestors = BTreeMap::new();

        for (&species_key, &spawn) in remaining.iter().zip(&spawn_amounts) {
            let spawn = spawn.max(config.reproduction.elitism);
            let species = &species_set.species[&species_key];

            let mut old_members: Vec<&Genome> = species.members.values().collect();
            old_members.sort_by(|a, b| {
                b.evaluated_fitness()
                    .partial_cmp(&a.evaluated_fitness())
                    .expect("NaN fitness in species member")
            });

            let elites = config.reproduction.elitism.min(old_members.len());
            for elite in &old_members[..elites] {
                new_population.insert(elite.key(), (*elite).clone());
                new_ancestors.insert(elite.key(), vec![elite.key()]);
            }
            let offspring = spawn.saturating_sub(elites);
            if offspring == 0 {
                continue;
            }

            // Parent pool: the top survival_threshold share, but never
            // fewer than two candidates when the species has them.
            let cutoff = ((config.reproduction.survival_threshold * old_members.len() as f64)
                .ceil() as usize)
                .max(2)
                .min(old_members.len());
            let parents = &old_members[..cutoff];
            if parents.is_empty() {
                log::warn!(
                    "species {} has no parents available; dropping {} offspring",
                    species_key,
                    offspring
                );
                continue;
            }

            for _ in 0..offspring {
                let parent1 = parents[rng.gen_range(0..parents.len())];
                let parent2 = parents[rng.gen_range(0..parents.len())];
                let child_key = self.next_key();
                let mut child = Genome::new(child_key);
                child.configure_crossover(parent1, parent2, rng);
                child.mutate(&config.genome, &mut self.node_indexer, rng);
                new_ancestors.insert(child_key, vec![parent1.key(), parent2.key()]);
                new_population.insert(child_key, child);
            }
        }

        self.ancestors = new_ancestors;

        if new_population.len() != config.neat.pop_size {
            log::warn!(
                "new population size {} differs from configured pop_size {}",
                new_population.len(),
                config.neat.pop_size
            );
        }

        new_population
    }
}

/// Allocates per-species spawn counts.
///
/// Each species gets a proportional target damped halfway toward its
/// previous size, floored at `min_size`; the result is rescaled to
/// `pop_size` and rounding drift is settled by ±1 adjustments at
/// randomly chosen species, never dropping anyone below the floor.
pub(crate) fn compute_spawn_amounts(
    adjusted_fitnesses: &[f64],
    adjusted_sum: f64,
    previous_sizes: &[usize],
    pop_size: usize,
    min_size: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut spawns: Vec<usize> = Vec::with_capacity(adjusted_fitnesses.len());
    for (&adjusted, &previous) in adjusted_fitnesses.iter().zip(previous_sizes) {
        let target = if adjusted_sum > 0.0 {
            (adjusted / adjusted_sum * pop_size as f64).max(min_size as f64)
        } else {
            min_size as f64
        };

        let delta = (target - previous as f64) * 0.5;
        let rounded = delta.round() as i64;
        let mut spawn = previous as i64;
        if rounded != 0 {
            spawn += rounded;
        } else if delta > 0.0 {
            spawn += 1;
        } else if delta < 0.0 {
            spawn -= 1;
        }
        spawns.push((spawn.max(min_size as i64)) as usize);
    }

    let total: usize = spawns.iter().sum();
    if total == 0 {
        return vec![min_size; spawns.len()];
    }

    // Rescale to the target population size and re-apply the floor.
    let norm = pop_size as f64 / total as f64;
    for spawn in &mut spawns {
        *spawn = ((*spawn as f64 * norm).round() as usize).max(min_size);
    }

    let mut diff = pop_size as i64 - spawns.iter().sum::<usize>() as i64;
    let mut indices: Vec<usize> = (0..spawns.len()).collect();
    indices.shuffle(rng);
    while diff != 0 {
        let mut progressed = false;
        for &index in &indices {
            if diff == 0 {
                break;
            }
            if diff > 0 {
                spawns[index] += 1;
                diff -= 1;
                progressed = true;
            } else if spawns[index] > min_size {
                spawns[index] -= 1;
                diff += 1;
                progressed = true;
            }
        }
        if !progressed {
            log::warn!(
                "could not match pop_size exactly; spawn total differs by {}",
                diff
            );
            break;
        }
    }

    spawns
}
