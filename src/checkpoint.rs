//! Checkpointing: gzip-compressed snapshots of a run.
//!
//! A checkpoint stores the generation index, the population, the
//! species partition, the reproduction state (key counters and
//! ancestry) and the best genome. The configuration is *not* stored;
//! loading re-reads it from its original path, and the stagnation
//! manager is rebuilt from it. PRNG state is not persisted either: a
//! resumed run is re-seeded and diverges stochastically from the
//! uninterrupted one.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::errors::LookupError;
use crate::genomics::Genome;
use crate::populations::{Population, Reproduction, SpeciesSet};

#[derive(Serialize, Deserialize)]
struct CheckpointData {
    generation: usize,
    genomes: BTreeMap<u64, Genome>,
    species_set: SpeciesSet,
    reproduction: Reproduction,
    best: Option<Genome>,
}

/// Error raised while saving or loading a checkpoint.
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    /// The configuration file referenced on load failed to parse.
    Config(ConfigError),
    /// The reloaded configuration names an unknown statistic.
    Lookup(LookupError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "checkpoint I/O error: {}", e),
            Self::Serialization(e) => write!(f, "checkpoint serialization error: {}", e),
            Self::Config(e) => write!(f, "checkpoint config reload failed: {}", e),
            Self::Lookup(e) => write!(f, "checkpoint config reload failed: {}", e),
        }
    }
}

impl Error for CheckpointError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Lookup(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<ConfigError> for CheckpointError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LookupError> for CheckpointError {
    fn from(e: LookupError) -> Self {
        Self::Lookup(e)
    }
}

/// Saves the population's state as a gzipped snapshot.
///
/// # Examples
/// ```no_run
/// use neatgen::checkpoint::save_checkpoint;
/// use neatgen::{Config, Population};
///
/// let config = Config::from_file("neat.cfg").unwrap();
/// let population = Population::new(config, 42).unwrap();
/// save_checkpoint(&population, "run-gen0.ckpt").unwrap();
/// ```
pub fn save_checkpoint(
    population: &Population,
    path: impl AsRef<Path>,
) -> Result<(), CheckpointError> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let data = CheckpointData {
        generation: population.generation,
        genomes: population.genomes.clone(),
        species_set: population.species_set.clone(),
        reproduction: population.reproduction.clone(),
        best: population.best.clone(),
    };
    bincode::serialize_into(&mut encoder, &data)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Restores a population from a checkpoint, re-reading the
/// configuration from `config_path` and seeding a fresh RNG.
///
/// # Examples
/// ```no_run
/// use neatgen::checkpoint::load_checkpoint;
///
/// let population = load_checkpoint("run-gen0.ckpt", "neat.cfg", 43).unwrap();
/// println!("resuming at generation {}", population.generation());
/// ```
pub fn load_checkpoint(
    checkpoint_path: impl AsRef<Path>,
    config_path: impl AsRef<Path>,
    seed: u64,
) -> Result<Population, CheckpointError> {
    let config = Config::from_file(config_path)?;

    let file = File::open(checkpoint_path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let data: CheckpointData = bincode::deserialize_from(decoder)?;

    let population = Population::from_parts(
        config,
        data.genomes,
        data.species_set,
        data.reproduction,
        data.generation,
        data.best,
        seed,
    )?;
    log::info!(
        "checkpoint loaded at generation {}",
        population.generation()
    );
    Ok(population)
}
