//! Stagnation tracking: marks species whose fitness has stopped
//! improving, while protecting the fittest `species_elitism` species.

use crate::config::StagnationConfig;
use crate::errors::LookupError;
use crate::math_util;
use crate::populations::species::SpeciesSet;

/// Per-generation stagnation bookkeeping. Holds the resolved species
/// fitness statistic, so it is rebuilt (not serialized) on checkpoint
/// load.
pub struct Stagnation {
    config: StagnationConfig,
    species_fitness: fn(&[f64]) -> f64,
}

impl Stagnation {
    pub fn new(config: &StagnationConfig) -> Result<Stagnation, LookupError> {
        Ok(Stagnation {
            species_fitness: math_util::stat_function(&config.species_fitness_func)?,
            config: config.clone(),
        })
    }

    /// Updates every species' fitness and history, then reports
    /// `(species key, is_stagnant)` in ascending species-fitness order.
    ///
    /// A species is stagnant when its fitness has not improved for
    /// `max_stagnation` generations, unless removing it would leave
    /// fewer than `species_elitism` species; the `species_elitism`
    /// fittest species are never stagnant.
    pub fn update(&self, species_set: &mut SpeciesSet, generation: usize) -> Vec<(u64, bool)> {
        let mut ranked: Vec<(u64, f64)> = Vec::with_capacity(species_set.species.len());

        for (&key, species) in species_set.species.iter_mut() {
            let previous_max = math_util::max(&species.fitness_history);
            let fitnesses = species.member_fitnesses();
            let fitness = if fitnesses.is_empty() {
                f64::NEG_INFINITY
            } else {
                (self.species_fitness)(&fitnesses)
            };
            species.fitness = Some(fitness);
            species.fitness_history.push(fitness);
            species.adjusted_fitness = Some(0.0);
            if fitness > previous_max {
                species.last_improved = generation;
            }
            ranked.push((key, fitness));
        }

        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("NaN species fitness"));

        let total = ranked.len();
        let mut non_stagnant = total;
        let mut result = Vec::with_capacity(total);
        for (rank, &(key, fitness)) in ranked.iter().enumerate() {
            let species = &species_set.species[&key];
            let stagnant_time = generation - species.last_improved;
            let timed_out = stagnant_time >= self.config.max_stagnation;
            let protected_by_rank = total - rank <= self.config.species_elitism;

            let is_stagnant =
                timed_out && !protected_by_rank && non_stagnant > self.config.species_elitism;
            if is_stagnant {
                non_stagnant -= 1;
            } else if timed_out {
                log::info!(
                    "species {} spared from stagnation by elitism (fitness {:.3}, stagnant {} generations)",
                    key,
                    fitness,
                    stagnant_time
                );
            }
            result.push((key, is_stagnant));
        }

        result
    }
}
