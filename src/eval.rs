//! Parallel fitness evaluation helper.
//!
//! The core only requires an evaluator that writes each genome's
//! fitness; for fitness functions that are pure per genome, this
//! helper fans the work out over a thread pool while keeping the
//! contract that only the genome's own fitness field is written.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::genomics::Genome;

/// Scores every genome in parallel with `fitness`.
///
/// # Examples
/// ```no_run
/// use neatgen::{Config, Population};
/// use neatgen::eval::parallel_evaluate;
///
/// let config = Config::from_file("neat.cfg").unwrap();
/// let mut population = Population::new(config, 42).unwrap();
/// population
///     .run_generation(|genomes| {
///         parallel_evaluate(genomes, |genome| genome.connections().count() as f64);
///         Ok(())
///     })
///     .unwrap();
/// ```
pub fn parallel_evaluate<F>(genomes: &mut BTreeMap<u64, Genome>, fitness: F)
where
    F: Fn(&Genome) -> f64 + Sync,
{
    genomes.par_iter_mut().for_each(|(_, genome)| {
        let score = fitness(genome);
        genome.set_fitness(score);
    });
}
