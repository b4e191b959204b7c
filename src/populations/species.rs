//! Species: compatibility-based partitions of the population.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::genomics::Genome;
use crate::math_util;

/// A group of genomes within compatibility range of a representative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species {
    pub(crate) key: u64,
    pub(crate) created: usize,
    pub(crate) last_improved: usize,
    pub(crate) representative: Genome,
    pub(crate) members: BTreeMap<u64, Genome>,
    pub(crate) fitness: Option<f64>,
    pub(crate) adjusted_fitness: Option<f64>,
    pub(crate) fitness_history: Vec<f64>,
}

impl Species {
    pub(crate) fn new(key: u64, generation: usize, representative: Genome) -> Species {
        let mut members = BTreeMap::new();
        members.insert(representative.key(), representative.clone());
        Species {
            key,
            created: generation,
            last_improved: generation,
            representative,
            members,
            fitness: None,
            adjusted_fitness: None,
            fitness_history: Vec::new(),
        }
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    /// Generation in which this species first appeared.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 0).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(1.0);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// for species in population.species_set().species() {
    ///     assert!(species.created() <= population.generation());
    ///     assert!(species.last_improved() >= species.created());
    /// }
    /// ```
    pub fn created(&self) -> usize {
        self.created
    }

    /// Last generation in which the species fitness improved.
    pub fn last_improved(&self) -> usize {
        self.last_improved
    }

    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 0).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(1.0);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// // The representative is always one of the members.
    /// for species in population.species_set().species() {
    ///     let rep = species.representative();
    ///     assert!(species.members().any(|m| m.key() == rep.key()));
    /// }
    /// ```
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    /// Species fitness computed by the configured statistic, once the
    /// stagnation pass has run for the current generation.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 0).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(1.0);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// // Every member scored 1.0, so the max statistic is 1.0.
    /// for species in population.species_set().species() {
    ///     assert_eq!(species.fitness(), Some(1.0));
    /// }
    /// ```
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Share-normalized fitness in `[0, 1]`, assigned during
    /// reproduction; reset to zero by each stagnation pass.
    pub fn adjusted_fitness(&self) -> Option<f64> {
        self.adjusted_fitness
    }

    /// Iterates over members in ascending genome-key order.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 0).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(1.0);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// for species in population.species_set().species() {
    ///     assert_eq!(species.members().count(), species.len());
    ///     assert!(!species.is_empty());
    /// }
    /// ```
    pub fn members(&self) -> impl Iterator<Item = &Genome> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn member_fitnesses(&self) -> Vec<f64> {
        self.members.values().map(Genome::evaluated_fitness).collect()
    }
}

/// Memo of pairwise genome distances, keyed by the unordered key pair.
/// Lives for a single speciation pass.
pub(crate) struct GenomeDistanceCache<'a> {
    config: &'a Config,
    distances: HashMap<(u64, u64), f64, RandomState>,
    hits: usize,
    misses: usize,
}

impl<'a> GenomeDistanceCache<'a> {
    pub(crate) fn new(config: &'a Config) -> GenomeDistanceCache<'a> {
        GenomeDistanceCache {
            config,
            distances: HashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    pub(crate) fn distance(&mut self, a: &Genome, b: &Genome) -> f64 {
        let key = if a.key() <= b.key() {
            (a.key(), b.key())
        } else {
            (b.key(), a.key())
        };
        if let Some(&d) = self.distances.get(&key) {
            self.hits += 1;
            return d;
        }
        self.misses += 1;
        let d = a.distance(b, &self.config.genome);
        self.distances.insert(key, d);
        d
    }

    fn log_stats(&self) {
        let computed: Vec<f64> = self.distances.values().copied().collect();
        log::debug!(
            "distance cache: {} hits, {} misses, mean distance {:.3}, stdev {:.3}",
            self.hits,
            self.misses,
            math_util::mean(&computed),
            math_util::stdev(&computed),
        );
    }
}

/// The population's current partition into species.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesSet {
    pub(crate) species: BTreeMap<u64, Species>,
    pub(crate) genome_to_species: BTreeMap<u64, u64>,
    indexer: u64,
}

impl SpeciesSet {
    /// # Examples
    /// ```
    /// use neatgen::SpeciesSet;
    ///
    /// let set = SpeciesSet::new();
    /// assert!(set.is_empty());
    /// assert_eq!(set.len(), 0);
    /// ```
    pub fn new() -> SpeciesSet {
        SpeciesSet {
            species: BTreeMap::new(),
            genome_to_species: BTreeMap::new(),
            indexer: 1,
        }
    }

    /// Iterates over species in ascending key order.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 0).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(1.0);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// let set = population.species_set();
    /// assert!(!set.is_empty());
    /// assert_eq!(set.species().count(), set.len());
    /// ```
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Species key of the given genome, if it has been speciated.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 0).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(1.0);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// let set = population.species_set();
    /// for species in set.species() {
    ///     for member in species.members() {
    ///         assert_eq!(set.species_of(member.key()), Some(species.key()));
    ///     }
    /// }
    /// ```
    pub fn species_of(&self, genome_key: u64) -> Option<u64> {
        self.genome_to_species.get(&genome_key).copied()
    }

    /// Partitions the population by compatibility distance.
    ///
    /// Each existing species first claims the unspeciated genome
    /// closest to its previous representative as its new
    /// representative. Remaining genomes are walked in ascending key
    /// order and join the first species whose new representative is
    /// within `compatibility_threshold`, or found a new species.
    /// Species that end up without members are dropped.
    pub fn speciate(
        &mut self,
        config: &Config,
        population: &BTreeMap<u64, Genome>,
        generation: usize,
    ) {
        if population.is_empty() {
            self.species.clear();
            self.genome_to_species.clear();
            return;
        }

        let threshold = config.species_set.compatibility_threshold;
        let mut cache = GenomeDistanceCache::new(config);

        let mut unspeciated: BTreeSet<u64> = population.keys().copied().collect();
        // (species key, new representative key) in encounter order.
        let mut representatives: Vec<(u64, u64)> = Vec::new();
        let mut members: BTreeMap<u64, Vec<u64>> = BTreeMap::new();

        for (&skey, species) in &self.species {
            if unspeciated.is_empty() {
                break;
            }
            let mut best: Option<(u64, f64)> = None;
            for &gkey in &unspeciated {
                let d = cache.distance(&species.representative, &population[&gkey]);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((gkey, d));
                }
            }
            if let Some((rep_key, _)) = best {
                unspeciated.remove(&rep_key);
                representatives.push((skey, rep_key));
                members.insert(skey, vec![rep_key]);
            }
        }

        for gkey in unspeciated {
            let genome = &population[&gkey];
            let mut best: Option<(usize, f64)> = None;
            for (slot, &(_, rep_key)) in representatives.iter().enumerate() {
                let d = cache.distance(&population[&rep_key], genome);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((slot, d));
                }
            }
            match best.filter(|&(_, d)| d < threshold) {
                Some((slot, _)) => {
                    let skey = representatives[slot].0;
                    members
                        .get_mut(&skey)
                        .expect("species has a representative but no member list")
                        .push(gkey);
                }
                None => {
                    let skey = self.indexer;
                    self.indexer += 1;
                    representatives.push((skey, gkey));
                    members.insert(skey, vec![gkey]);
                    log::info!(
                        "generation {}: new species {} represented by genome {}",
                        generation,
                        skey,
                        gkey
                    );
                }
            }
        }

        let mut new_species = BTreeMap::new();
        let mut genome_to_species = BTreeMap::new();
        for (skey, rep_key) in representatives {
            let member_keys = members.remove(&skey).unwrap_or_default();
            if member_keys.is_empty() {
                continue;
            }
            let representative = population[&rep_key].clone();
            let mut species = match self.species.remove(&skey) {
                Some(existing) => existing,
                None => Species::new(skey, generation, representative.clone()),
            };
            species.representative = representative;
            species.members = member_keys
                .iter()
                .map(|&gkey| (gkey, population[&gkey].clone()))
                .collect();
            for &gkey in &member_keys {
                genome_to_species.insert(gkey, skey);
            }
            new_species.insert(skey, species);
        }

        for skey in self.species.keys() {
            if !new_species.contains_key(skey) {
                log::info!("species {} has no members and is removed", skey);
            }
        }

        self.species = new_species;
        self.genome_to_species = genome_to_species;
        cache.log_stats();
    }
}

impl Default for SpeciesSet {
    fn default() -> Self {
        SpeciesSet::new()
    }
}
