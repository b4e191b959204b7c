//! Populations: the generational evolution loop.
//!
//! A [`Population`] owns the genomes, the species partition, the
//! reproduction machinery and the seeded RNG that makes a run
//! reproducible. Each call to [`Population::run_generation`] performs
//! one evaluate → speciate → reproduce cycle.

pub(crate) mod reproduction;
pub(crate) mod species;
pub(crate) mod stagnation;

pub use reproduction::Reproduction;
pub use species::{Species, SpeciesSet};
pub use stagnation::Stagnation;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::Config;
use crate::errors::LookupError;
use crate::genomics::Genome;
use crate::math_util;

/// Error type the fitness evaluator may return.
pub type EvalError = Box<dyn Error + Send + Sync>;

/// Error raised by a generation step.
#[derive(Debug)]
pub enum PopulationError {
    /// The evaluator failed, or left a genome without a finite fitness.
    Evaluation(EvalError),
    /// Every species died and `reset_on_extinction` is disabled. The
    /// best genome observed so far rides along.
    Extinct { best: Option<Box<Genome>> },
}

impl fmt::Display for PopulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluation(e) => write!(f, "fitness evaluation failed: {}", e),
            Self::Extinct { .. } => write!(f, "population has become extinct"),
        }
    }
}

impl Error for PopulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Evaluation(e) => Some(e.as_ref()),
            Self::Extinct { .. } => None,
        }
    }
}

/// The complete state of an evolutionary run.
pub struct Population {
    pub(crate) config: Config,
    pub(crate) genomes: BTreeMap<u64, Genome>,
    pub(crate) species_set: SpeciesSet,
    pub(crate) reproduction: Reproduction,
    pub(crate) stagnation: Stagnation,
    pub(crate) generation: usize,
    pub(crate) best: Option<Genome>,
    pub(crate) rng: ChaCha8Rng,
    criterion: fn(&[f64]) -> f64,
}

impl Population {
    /// Creates a population of `pop_size` freshly configured genomes.
    /// All randomness of the run flows from `seed`.
    ///
    /// # Examples
    /// ```
    /// use neatgen::{Config, Population};
    ///
    /// let population = Population::new(Config::minimal(2, 1), 42).unwrap();
    /// assert_eq!(population.genomes().count(), 50);
    /// assert_eq!(population.generation(), 0);
    /// assert!(population.best_genome().is_none());
    /// ```
    pub fn new(config: Config, seed: u64) -> Result<Population, LookupError> {
        let stagnation = Stagnation::new(&config.stagnation)?;
        let criterion = math_util::stat_function(&config.neat.fitness_criterion)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut reproduction = Reproduction::new(&config.genome);
        let genomes =
            reproduction.create_new_population(&config.genome, config.neat.pop_size, &mut rng);
        Ok(Population {
            config,
            genomes,
            species_set: SpeciesSet::new(),
            reproduction,
            stagnation,
            generation: 0,
            best: None,
            rng,
            criterion,
        })
    }

    pub(crate) fn from_parts(
        config: Config,
        genomes: BTreeMap<u64, Genome>,
        species_set: SpeciesSet,
        reproduction: Reproduction,
        generation: usize,
        best: Option<Genome>,
        seed: u64,
    ) -> Result<Population, LookupError> {
        Ok(Population {
            stagnation: Stagnation::new(&config.stagnation)?,
            criterion: math_util::stat_function(&config.neat.fitness_criterion)?,
            config,
            genomes,
            species_set,
            reproduction,
            generation,
            best,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generations completed so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Best genome observed over the whole run, if any generation has
    /// been evaluated. Its fitness never decreases.
    ///
    /// # Examples
    /// ```
    /// # use neatgen::{Config, Population};
    /// # let mut population = Population::new(Config::minimal(2, 1), 3).unwrap();
    /// # population
    /// #     .run_generation(|genomes| {
    /// #         for genome in genomes.values_mut() {
    /// #             genome.set_fitness(0.5);
    /// #         }
    /// #         Ok(())
    /// #     })
    /// #     .unwrap();
    /// let best = population.best_genome().unwrap();
    /// assert_eq!(best.fitness(), Some(0.5));
    /// ```
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Iterates over the current genomes in ascending key order.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.values()
    }

    pub fn species_set(&self) -> &SpeciesSet {
        &self.species_set
    }

    pub fn reproduction(&self) -> &Reproduction {
        &self.reproduction
    }

    /// Runs one generation: evaluate, track the best genome, test for
    /// termination, then speciate and reproduce.
    ///
    /// Returns the winning genome once the all-time best reaches
    /// `fitness_threshold` (unless `no_fitness_termination` is set).
    /// The winner is sticky: later calls keep returning it.
    ///
    /// # Errors
    /// Propagates evaluator failures, and reports extinction when no
    /// species survives and `reset_on_extinction` is disabled.
    ///
    /// # Examples
    /// ```
    /// use neatgen::{Config, Population};
    ///
    /// let mut population = Population::new(Config::minimal(2, 1), 42).unwrap();
    ///
    /// let winner = population
    ///     .run_generation(|genomes| {
    ///         for genome in genomes.values_mut() {
    ///             genome.set_fitness(0.5);
    ///         }
    ///         Ok(())
    ///     })
    ///     .unwrap();
    ///
    /// // 0.5 is below the fitness threshold, so evolution continues.
    /// assert!(winner.is_none());
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.genomes().count(), 50);
    /// ```
    pub fn run_generation<F>(&mut self, evaluator: F) -> Result<Option<Genome>, PopulationError>
    where
        F: FnOnce(&mut BTreeMap<u64, Genome>) -> Result<(), EvalError>,
    {
        self.generation += 1;

        evaluator(&mut self.genomes).map_err(PopulationError::Evaluation)?;
        self.check_fitnesses()?;

        if let Some(current_best) = self.find_generation_best().cloned() {
            let improved = self
                .best
                .as_ref()
                .map_or(true, |b| current_best.evaluated_fitness() > b.evaluated_fitness());
            if improved {
                log::info!(
                    "generation {}: new all-time best genome {} with fitness {:.4}",
                    self.generation,
                    current_best.key(),
                    current_best.evaluated_fitness()
                );
                self.best = Some(current_best);
            }
        }

        let fitnesses: Vec<f64> = self.genomes.values().map(Genome::evaluated_fitness).collect();
        log::info!(
            "generation {}: {} genomes, {} fitness {:.4}",
            self.generation,
            self.genomes.len(),
            self.config.neat.fitness_criterion,
            (self.criterion)(&fitnesses)
        );

        if !self.config.neat.no_fitness_termination {
            if let Some(best) = &self.best {
                if best.evaluated_fitness() >= self.config.neat.fitness_threshold {
                    return Ok(Some(best.clone()));
                }
            }
        }

        if self.genomes.is_empty() {
            return self.handle_extinction();
        }

        self.species_set
            .speciate(&self.config, &self.genomes, self.generation);
        log::info!(
            "generation {}: population divided into {} species",
            self.generation,
            self.species_set.len()
        );

        let next = self.reproduction.reproduce(
            &self.config,
            &mut self.species_set,
            &self.stagnation,
            self.generation,
            &mut self.rng,
        );
        if next.is_empty() {
            return self.handle_extinction();
        }
        self.genomes = next;

        Ok(None)
    }

    /// Rejects missing or non-finite fitness values after evaluation.
    fn check_fitnesses(&self) -> Result<(), PopulationError> {
        for genome in self.genomes.values() {
            match genome.fitness() {
                Some(f) if f.is_finite() => {}
                Some(f) => {
                    return Err(PopulationError::Evaluation(
                        format!("genome {} has non-finite fitness {}", genome.key(), f).into(),
                    ))
                }
                None => {
                    return Err(PopulationError::Evaluation(
                        format!("evaluator left genome {} without a fitness", genome.key()).into(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn find_generation_best(&self) -> Option<&Genome> {
        let mut best: Option<&Genome> = None;
        for genome in self.genomes.values() {
            if best.map_or(true, |b| genome.evaluated_fitness() > b.evaluated_fitness()) {
                best = Some(genome);
            }
        }
        best
    }

    fn handle_extinction(&mut self) -> Result<Option<Genome>, PopulationError> {
        if self.config.neat.reset_on_extinction {
            log::warn!(
                "generation {}: population extinct, resetting",
                self.generation
            );
            self.genomes = self.reproduction.create_new_population(
                &self.config.genome,
                self.config.neat.pop_size,
                &mut self.rng,
            );
            self.species_set = SpeciesSet::new();
            Ok(None)
        } else {
            Err(PopulationError::Extinct {
                best: self.best.clone().map(Box::new),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::species::tests::test_config;

    fn constant_evaluator(
        value: f64,
    ) -> impl FnOnce(&mut BTreeMap<u64, Genome>) -> Result<(), EvalError> {
        move |genomes| {
            for genome in genomes.values_mut() {
                genome.set_fitness(value);
            }
            Ok(())
        }
    }

    /// Scores each genome by its key, so the best is always the newest.
    fn key_evaluator(genomes: &mut BTreeMap<u64, Genome>) -> Result<(), EvalError> {
        for genome in genomes.values_mut() {
            genome.set_fitness(genome.key() as f64);
        }
        Ok(())
    }

    #[test]
    fn initial_population_has_configured_size() {
        let config = test_config(3.0);
        let population = Population::new(config, 1).unwrap();
        assert_eq!(population.genomes().count(), 10);
        assert_eq!(population.generation(), 0);
        assert!(population.best_genome().is_none());
    }

    #[test]
    fn population_size_is_stable_across_generations() {
        let config = test_config(3.0);
        let mut population = Population::new(config, 2).unwrap();
        for _ in 0..5 {
            let winner = population.run_generation(key_evaluator).unwrap();
            assert!(winner.is_none());
            assert_eq!(population.genomes().count(), 10);
        }
        assert_eq!(population.generation(), 5);
    }

    #[test]
    fn best_fitness_is_monotonic() {
        let config = test_config(3.0);
        let mut population = Population::new(config, 3).unwrap();
        let mut previous = f64::NEG_INFINITY;
        for _ in 0..6 {
            population.run_generation(key_evaluator).unwrap();
            let best = population.best_genome().unwrap().fitness().unwrap();
            assert!(best >= previous);
            previous = best;
        }
    }

    #[test]
    fn threshold_produces_sticky_winner() {
        let mut config = test_config(3.0);
        config.neat.fitness_threshold = 5.0;
        let mut population = Population::new(config, 4).unwrap();

        let winner = population.run_generation(constant_evaluator(7.5)).unwrap();
        let winner = winner.expect("threshold was crossed");
        assert_eq!(winner.fitness(), Some(7.5));

        // The winner persists without further reproduction.
        let again = population.run_generation(constant_evaluator(7.5)).unwrap();
        assert_eq!(again.unwrap().key(), winner.key());
    }

    #[test]
    fn no_fitness_termination_suppresses_winner() {
        let mut config = test_config(3.0);
        config.neat.fitness_threshold = 5.0;
        config.neat.no_fitness_termination = true;
        let mut population = Population::new(config, 5).unwrap();
        let winner = population.run_generation(constant_evaluator(9.0)).unwrap();
        assert!(winner.is_none());
    }

    #[test]
    fn evaluator_error_propagates() {
        let config = test_config(3.0);
        let mut population = Population::new(config, 6).unwrap();
        let result = population.run_generation(|_| Err("simulated failure".into()));
        assert!(matches!(result, Err(PopulationError::Evaluation(_))));
    }

    #[test]
    fn missing_fitness_is_an_evaluation_error() {
        let config = test_config(3.0);
        let mut population = Population::new(config, 7).unwrap();
        let result = population.run_generation(|_| Ok(()));
        assert!(matches!(result, Err(PopulationError::Evaluation(_))));
    }

    #[test]
    fn extinction_without_reset_reports_best_so_far() {
        let mut config = test_config(3.0);
        // Stagnate everything immediately.
        config.stagnation.max_stagnation = 1;
        config.stagnation.species_elitism = 0;
        let mut population = Population::new(config, 8).unwrap();

        // With constant fitness, every species stops improving after
        // its first generation and is culled soon after.
        let mut saw_extinction = false;
        for _ in 0..10 {
            match population.run_generation(constant_evaluator(1.0)) {
                Ok(None) => {}
                Ok(Some(_)) => panic!("no winner expected"),
                Err(PopulationError::Extinct { best }) => {
                    assert_eq!(best.unwrap().fitness(), Some(1.0));
                    saw_extinction = true;
                    break;
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert!(saw_extinction);
    }

    #[test]
    fn extinction_with_reset_rebuilds_population() {
        let mut config = test_config(3.0);
        config.stagnation.max_stagnation = 1;
        config.stagnation.species_elitism = 0;
        config.neat.reset_on_extinction = true;
        let mut population = Population::new(config, 9).unwrap();

        for _ in 0..4 {
            let winner = population.run_generation(constant_evaluator(1.0)).unwrap();
            assert!(winner.is_none());
            assert_eq!(population.genomes().count(), 10);
        }
    }
}
