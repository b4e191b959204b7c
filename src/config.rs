//! Configuration loading and validation.
//!
//! Runs are configured from an INI file with the sections `[NEAT]`,
//! `[DefaultGenome]`, `[DefaultReproduction]`, `[DefaultSpeciesSet]`
//! and `[DefaultStagnation]`. Inline `#`/`;` comments are stripped and
//! string values trimmed. Key lists derived at load time (input keys,
//! output keys) live on [`GenomeConfig`].

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math_util;

/// Top-level configuration, one field per INI section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub neat: NeatConfig,
    pub genome: GenomeConfig,
    pub reproduction: ReproductionConfig,
    pub species_set: SpeciesSetConfig,
    pub stagnation: StagnationConfig,
}

/// `[NEAT]` section: population size and termination policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeatConfig {
    pub pop_size: usize,
    /// Statistic (`max`, `min` or `mean`) summarizing a generation's
    /// fitnesses in reports.
    pub fitness_criterion: String,
    pub fitness_threshold: f64,
    pub reset_on_extinction: bool,
    pub no_fitness_termination: bool,
}

/// Distribution used for float attribute initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitType {
    Gaussian,
    Uniform,
}

/// Initial wiring scheme applied when a genome is first configured.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InitialConnection {
    Unconnected,
    /// All inputs connected to all outputs.
    FsNeatNoHidden,
    /// Inputs to hidden nodes, hidden nodes to outputs.
    FsNeatHidden,
    /// Inputs to hidden, hidden to hidden, hidden to outputs.
    FullNoDirect,
    /// `FullNoDirect` plus direct input-to-output connections.
    FullDirect,
    /// `FullNoDirect` with each connection kept with the given probability.
    PartialNoDirect(f64),
    /// `FullDirect` with each connection kept with the given probability.
    PartialDirect(f64),
}

/// Settings of one bounded real gene attribute (bias, response, weight).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloatAttrConfig {
    pub init_mean: f64,
    pub init_stdev: f64,
    pub init_type: InitType,
    pub replace_rate: f64,
    pub mutate_rate: f64,
    pub mutate_power: f64,
    pub max_value: f64,
    pub min_value: f64,
}

/// Settings of one symbolic gene attribute (activation, aggregation).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StringAttrConfig {
    /// Either a member of `options`, or `random`/`none` for a uniform pick.
    pub default: String,
    pub options: Vec<String>,
    pub mutate_rate: f64,
}

/// Default value of the `enabled` connection attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultBool {
    True,
    False,
    /// Fair coin at initialization time.
    Random,
}

/// Settings of the boolean `enabled` connection attribute.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoolAttrConfig {
    pub default: DefaultBool,
    pub mutate_rate: f64,
    pub rate_to_true_add: f64,
    pub rate_to_false_add: f64,
}

/// `[DefaultGenome]` section: genome structure, mutation rates and
/// per-attribute settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenomeConfig {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_hidden: usize,
    /// When true, the enabled-connection subgraph must stay acyclic.
    pub feed_forward: bool,
    pub compatibility_disjoint_coefficient: f64,
    pub compatibility_weight_coefficient: f64,
    pub conn_add_prob: f64,
    /// Reserved: deletion mutations have no semantics yet.
    pub conn_delete_prob: f64,
    pub node_add_prob: f64,
    /// Reserved: deletion mutations have no semantics yet.
    pub node_delete_prob: f64,
    pub single_structural_mutation: bool,
    /// Accepted and validated for config compatibility; currently inert.
    pub structural_mutation_surer: String,
    pub initial_connection: InitialConnection,
    pub bias: FloatAttrConfig,
    pub response: FloatAttrConfig,
    pub weight: FloatAttrConfig,
    pub activation: StringAttrConfig,
    pub aggregation: StringAttrConfig,
    pub enabled: BoolAttrConfig,
    /// Derived: `[-1, -2, …, -num_inputs]`.
    pub input_keys: Vec<i32>,
    /// Derived: `[0, …, num_outputs - 1]`.
    pub output_keys: Vec<i32>,
}

/// `[DefaultReproduction]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReproductionConfig {
    pub elitism: usize,
    pub survival_threshold: f64,
    pub min_species_size: usize,
}

/// `[DefaultSpeciesSet]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesSetConfig {
    pub compatibility_threshold: f64,
}

/// `[DefaultStagnation]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StagnationConfig {
    pub species_fitness_func: String,
    pub max_stagnation: usize,
    pub species_elitism: usize,
}

/// Error raised while loading or validating a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Syntax { line: usize, message: String },
    Missing { section: String, key: String },
    Invalid { key: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {}", e),
            Self::Syntax { line, message } => {
                write!(f, "config syntax error on line {}: {}", line, message)
            }
            Self::Missing { section, key } => {
                write!(f, "config is missing key '{}' in section [{}]", key, section)
            }
            Self::Invalid { key, message } => {
                write!(f, "config error: {}: {}", key, message)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Config {
    /// Loads and validates a configuration from an INI file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        Config::parse(&fs::read_to_string(path)?)
    }

    /// Returns a small self-contained configuration with the given
    /// input and output counts: a population of 50, sigmoid/sum nodes
    /// and full direct initial wiring. Useful for examples and tests;
    /// real runs should load a tuned file via [`Config::from_file`].
    ///
    /// # Examples
    /// ```
    /// use neatgen::Config;
    ///
    /// let config = Config::minimal(2, 1);
    /// assert_eq!(config.neat.pop_size, 50);
    /// assert_eq!(config.genome.input_keys, vec![-1, -2]);
    /// assert_eq!(config.genome.output_keys, vec![0]);
    /// ```
    pub fn minimal(num_inputs: usize, num_outputs: usize) -> Config {
        Config {
            neat: NeatConfig {
                pop_size: 50,
                fitness_criterion: "max".to_string(),
                fitness_threshold: 3.9,
                reset_on_extinction: false,
                no_fitness_termination: false,
            },
            genome: GenomeConfig::minimal(num_inputs, num_outputs),
            reproduction: ReproductionConfig {
                elitism: 2,
                survival_threshold: 0.2,
                min_species_size: 1,
            },
            species_set: SpeciesSetConfig {
                compatibility_threshold: 3.0,
            },
            stagnation: StagnationConfig {
                species_fitness_func: "max".to_string(),
                max_stagnation: 15,
                species_elitism: 2,
            },
        }
    }

    /// Parses and validates configuration text in INI format.
    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        let raw = parse_ini(text)?;

        let neat = NeatConfig::read(&Section::of(&raw, "NEAT"))?;
        let genome = GenomeConfig::read(&Section::of(&raw, "DefaultGenome"))?;
        let reproduction = ReproductionConfig::read(&Section::of(&raw, "DefaultReproduction"))?;
        let species_set = SpeciesSetConfig::read(&Section::of(&raw, "DefaultSpeciesSet"))?;
        let stagnation = StagnationConfig::read(&Section::of(&raw, "DefaultStagnation"))?;

        Ok(Config {
            neat,
            genome,
            reproduction,
            species_set,
            stagnation,
        })
    }
}

impl NeatConfig {
    fn read(s: &Section) -> Result<NeatConfig, ConfigError> {
        let no_fitness_termination = s.parse_bool_or("no_fitness_termination", false)?;
        let fitness_threshold = if no_fitness_termination {
            s.parse_or("fitness_threshold", 0.0)?
        } else {
            s.parse("fitness_threshold")?
        };
        let fitness_criterion = s.get("fitness_criterion")?.to_lowercase();
        if !matches!(fitness_criterion.as_str(), "max" | "min" | "mean") {
            return Err(invalid(
                "fitness_criterion",
                format!("'{}' must be one of max, min, mean", fitness_criterion),
            ));
        }
        let pop_size: usize = s.parse("pop_size")?;
        if pop_size == 0 {
            return Err(invalid("pop_size", "must be positive".into()));
        }
        Ok(NeatConfig {
            pop_size,
            fitness_criterion,
            fitness_threshold,
            reset_on_extinction: s.parse_bool_or("reset_on_extinction", false)?,
            no_fitness_termination,
        })
    }
}

impl GenomeConfig {
    fn read(s: &Section) -> Result<GenomeConfig, ConfigError> {
        let num_inputs: usize = s.parse("num_inputs")?;
        let num_outputs: usize = s.parse("num_outputs")?;
        if num_inputs == 0 {
            return Err(invalid("num_inputs", "must be positive".into()));
        }
        if num_outputs == 0 {
            return Err(invalid("num_outputs", "must be positive".into()));
        }

        let compatibility_disjoint_coefficient =
            s.parse("compatibility_disjoint_coefficient")?;
        let compatibility_weight_coefficient = s.parse("compatibility_weight_coefficient")?;
        if compatibility_disjoint_coefficient < 0.0 {
            return Err(invalid(
                "compatibility_disjoint_coefficient",
                "cannot be negative".into(),
            ));
        }
        if compatibility_weight_coefficient < 0.0 {
            return Err(invalid(
                "compatibility_weight_coefficient",
                "cannot be negative".into(),
            ));
        }

        let structural_mutation_surer =
            s.get_or("structural_mutation_surer", "default").to_lowercase();
        if !matches!(
            structural_mutation_surer.as_str(),
            "default" | "true" | "false" | "yes" | "no" | "on" | "off" | "1" | "0"
        ) {
            return Err(invalid(
                "structural_mutation_surer",
                format!("unrecognized value '{}'", structural_mutation_surer),
            ));
        }

        let genome = GenomeConfig {
            num_inputs,
            num_outputs,
            num_hidden: s.parse_or("num_hidden", 0)?,
            feed_forward: s.parse_bool("feed_forward")?,
            compatibility_disjoint_coefficient,
            compatibility_weight_coefficient,
            conn_add_prob: probability(s, "conn_add_prob")?,
            conn_delete_prob: probability(s, "conn_delete_prob")?,
            node_add_prob: probability(s, "node_add_prob")?,
            node_delete_prob: probability(s, "node_delete_prob")?,
            single_structural_mutation: s.parse_bool_or("single_structural_mutation", false)?,
            structural_mutation_surer,
            initial_connection: initial_connection(s)?,
            bias: float_attr(s, "bias")?,
            response: float_attr(s, "response")?,
            weight: float_attr(s, "weight")?,
            activation: string_attr(s, "activation", activation_exists)?,
            aggregation: string_attr(s, "aggregation", aggregation_exists)?,
            enabled: bool_attr(s)?,
            input_keys: (1..=num_inputs).map(|i| -(i as i32)).collect(),
            output_keys: (0..num_outputs as i32).collect(),
        };
        Ok(genome)
    }

    /// First key available to hidden nodes; the node indexer starts here.
    pub fn first_hidden_key(&self) -> i32 {
        self.num_outputs as i32
    }

    /// Returns a minimal genome configuration: no hidden nodes,
    /// feed-forward, sigmoid/sum attributes with gaussian
    /// initialization bounded to ±30, and full direct initial wiring.
    ///
    /// # Examples
    /// ```
    /// use neatgen::config::GenomeConfig;
    ///
    /// let config = GenomeConfig::minimal(3, 2);
    /// assert_eq!(config.input_keys, vec![-1, -2, -3]);
    /// assert_eq!(config.output_keys, vec![0, 1]);
    /// assert_eq!(config.first_hidden_key(), 2);
    /// assert!(config.feed_forward);
    /// ```
    pub fn minimal(num_inputs: usize, num_outputs: usize) -> GenomeConfig {
        let float = |mean: f64, stdev: f64, mutate_rate: f64, replace_rate: f64, power: f64| {
            FloatAttrConfig {
                init_mean: mean,
                init_stdev: stdev,
                init_type: InitType::Gaussian,
                replace_rate,
                mutate_rate,
                mutate_power: power,
                max_value: 30.0,
                min_value: -30.0,
            }
        };
        GenomeConfig {
            num_inputs,
            num_outputs,
            num_hidden: 0,
            feed_forward: true,
            compatibility_disjoint_coefficient: 1.0,
            compatibility_weight_coefficient: 0.5,
            conn_add_prob: 0.5,
            conn_delete_prob: 0.0,
            node_add_prob: 0.2,
            node_delete_prob: 0.0,
            single_structural_mutation: false,
            structural_mutation_surer: "default".to_string(),
            initial_connection: InitialConnection::FullDirect,
            bias: float(0.0, 1.0, 0.7, 0.1, 0.5),
            response: float(1.0, 0.0, 0.0, 0.0, 0.0),
            weight: float(0.0, 1.0, 0.8, 0.1, 0.5),
            activation: StringAttrConfig {
                default: "sigmoid".to_string(),
                options: vec!["sigmoid".to_string()],
                mutate_rate: 0.0,
            },
            aggregation: StringAttrConfig {
                default: "sum".to_string(),
                options: vec!["sum".to_string()],
                mutate_rate: 0.0,
            },
            enabled: BoolAttrConfig {
                default: DefaultBool::True,
                mutate_rate: 0.01,
                rate_to_true_add: 0.0,
                rate_to_false_add: 0.0,
            },
            input_keys: (1..=num_inputs).map(|i| -(i as i32)).collect(),
            output_keys: (0..num_outputs as i32).collect(),
        }
    }
}

impl ReproductionConfig {
    fn read(s: &Section) -> Result<ReproductionConfig, ConfigError> {
        let survival_threshold = s.parse_or("survival_threshold", 0.2)?;
        if !(0.0..=1.0).contains(&survival_threshold) {
            return Err(invalid("survival_threshold", "must be between 0 and 1".into()));
        }
        let min_species_size = s.parse_or("min_species_size", 1)?;
        if min_species_size == 0 {
            return Err(invalid("min_species_size", "must be positive".into()));
        }
        Ok(ReproductionConfig {
            elitism: s.parse_or("elitism", 0)?,
            survival_threshold,
            min_species_size,
        })
    }
}

impl SpeciesSetConfig {
    fn read(s: &Section) -> Result<SpeciesSetConfig, ConfigError> {
        let compatibility_threshold = s.parse("compatibility_threshold")?;
        if compatibility_threshold < 0.0 {
            return Err(invalid("compatibility_threshold", "cannot be negative".into()));
        }
        Ok(SpeciesSetConfig {
            compatibility_threshold,
        })
    }
}

impl StagnationConfig {
    fn read(s: &Section) -> Result<StagnationConfig, ConfigError> {
        let species_fitness_func = s.get_or("species_fitness_func", "mean").to_lowercase();
        if !matches!(
            species_fitness_func.as_str(),
            "mean" | "max" | "min" | "median" | "sum"
        ) {
            return Err(invalid(
                "species_fitness_func",
                format!("'{}' must be one of mean, max, min, median, sum", species_fitness_func),
            ));
        }
        // The registry must agree with the validation list above.
        debug_assert!(math_util::stat_function(&species_fitness_func).is_ok());

        let max_stagnation = s.parse_or("max_stagnation", 15)?;
        if max_stagnation == 0 {
            return Err(invalid("max_stagnation", "must be positive".into()));
        }
        Ok(StagnationConfig {
            species_fitness_func,
            max_stagnation,
            species_elitism: s.parse_or("species_elitism", 0)?,
        })
    }
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message,
    }
}

fn probability(s: &Section, key: &'static str) -> Result<f64, ConfigError> {
    let v: f64 = s.parse(key)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(invalid(key, "must be between 0 and 1".into()));
    }
    Ok(v)
}

fn initial_connection(s: &Section) -> Result<InitialConnection, ConfigError> {
    let value = s.get_or("initial_connection", "unconnected");
    let mut parts = value.split_whitespace();
    let base = parts.next().unwrap_or("unconnected");

    match base {
        "unconnected" => Ok(InitialConnection::Unconnected),
        "fs_neat_nohidden" | "fs_neat" => Ok(InitialConnection::FsNeatNoHidden),
        "fs_neat_hidden" => Ok(InitialConnection::FsNeatHidden),
        "full_nodirect" | "full" => Ok(InitialConnection::FullNoDirect),
        "full_direct" => Ok(InitialConnection::FullDirect),
        "partial_nodirect" | "partial" => {
            Ok(InitialConnection::PartialNoDirect(partial_fraction(base, parts.next())?))
        }
        "partial_direct" => {
            Ok(InitialConnection::PartialDirect(partial_fraction(base, parts.next())?))
        }
        other => Err(invalid(
            "initial_connection",
            format!("unrecognized scheme '{}'", other),
        )),
    }
}

/// Extracts the trailing connection fraction of a `partial*` scheme.
fn partial_fraction(base: &str, raw: Option<&str>) -> Result<f64, ConfigError> {
    let raw = raw.ok_or_else(|| {
        invalid(
            "initial_connection",
            format!("'{}' requires a connection fraction", base),
        )
    })?;
    let fraction: f64 = raw.parse().map_err(|_| {
        invalid(
            "initial_connection",
            format!("invalid connection fraction '{}'", raw),
        )
    })?;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(invalid(
            "initial_connection",
            "connection fraction must be between 0 and 1".into(),
        ));
    }
    Ok(fraction)
}

fn float_attr(s: &Section, prefix: &str) -> Result<FloatAttrConfig, ConfigError> {
    let key = |suffix: &str| format!("{}_{}", prefix, suffix);

    let init_type = match s.get_or(&key("init_type"), "gaussian").to_lowercase().as_str() {
        "gaussian" | "normal" => InitType::Gaussian,
        "uniform" => InitType::Uniform,
        other => {
            return Err(invalid(
                &key("init_type"),
                format!("'{}' must be gaussian or uniform", other),
            ))
        }
    };

    let init_stdev: f64 = s.parse(&key("init_stdev"))?;
    if init_stdev < 0.0 {
        return Err(invalid(&key("init_stdev"), "cannot be negative".into()));
    }
    let max_value: f64 = s.parse(&key("max_value"))?;
    let min_value: f64 = s.parse(&key("min_value"))?;
    if max_value < min_value {
        return Err(invalid(
            &key("max_value"),
            format!("cannot be less than {}", key("min_value")),
        ));
    }

    Ok(FloatAttrConfig {
        init_mean: s.parse(&key("init_mean"))?,
        init_stdev,
        init_type,
        replace_rate: s.parse(&key("replace_rate"))?,
        mutate_rate: s.parse(&key("mutate_rate"))?,
        mutate_power: s.parse(&key("mutate_power"))?,
        max_value,
        min_value,
    })
}

fn string_attr(
    s: &Section,
    prefix: &str,
    name_exists: fn(&str) -> bool,
) -> Result<StringAttrConfig, ConfigError> {
    let options_key = format!("{}_options", prefix);
    let options: Vec<String> = s
        .get(&options_key)?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if options.is_empty() {
        return Err(invalid(&options_key, "must list at least one option".into()));
    }
    for option in &options {
        if !name_exists(option) {
            return Err(invalid(&options_key, format!("unknown name '{}'", option)));
        }
    }
    Ok(StringAttrConfig {
        default: s.get_or(&format!("{}_default", prefix), "random").to_string(),
        options,
        mutate_rate: s.parse(&format!("{}_mutate_rate", prefix))?,
    })
}

fn activation_exists(name: &str) -> bool {
    crate::activations::activation(name).is_ok()
}

fn aggregation_exists(name: &str) -> bool {
    crate::aggregations::aggregation(name).is_ok()
}

fn bool_attr(s: &Section) -> Result<BoolAttrConfig, ConfigError> {
    let default = match s.get_or("enabled_default", "true").to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => DefaultBool::True,
        "false" | "no" | "off" | "0" => DefaultBool::False,
        "random" | "none" => DefaultBool::Random,
        other => {
            return Err(invalid(
                "enabled_default",
                format!("unrecognized value '{}'", other),
            ))
        }
    };
    Ok(BoolAttrConfig {
        default,
        mutate_rate: s.parse("enabled_mutate_rate")?,
        rate_to_true_add: s.parse_or("enabled_rate_to_true_add", 0.0)?,
        rate_to_false_add: s.parse_or("enabled_rate_to_false_add", 0.0)?,
    })
}

type RawConfig = BTreeMap<String, BTreeMap<String, String>>;

/// Minimal INI reader: `[Section]` headers, `key = value` pairs,
/// full-line and inline `#`/`;` comments.
fn parse_ini(text: &str) -> Result<RawConfig, ConfigError> {
    let mut sections = RawConfig::new();
    let mut current: Option<String> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[') {
            let name = name.strip_suffix(']').ok_or(ConfigError::Syntax {
                line: index + 1,
                message: "unterminated section header".to_string(),
            })?;
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let (key, value) = line.split_once('=').ok_or(ConfigError::Syntax {
            line: index + 1,
            message: "expected 'key = value'".to_string(),
        })?;
        let section = current.as_ref().ok_or(ConfigError::Syntax {
            line: index + 1,
            message: "key outside of any section".to_string(),
        })?;
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(sections)
}

fn strip_comment(line: &str) -> &str {
    match line.find(|c| c == '#' || c == ';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Typed accessor over one raw INI section.
struct Section<'a> {
    name: &'a str,
    values: Option<&'a BTreeMap<String, String>>,
}

impl<'a> Section<'a> {
    fn of(raw: &'a RawConfig, name: &'a str) -> Section<'a> {
        Section {
            name,
            values: raw.get(name),
        }
    }

    fn get(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.values
            .and_then(|v| v.get(key))
            .map(String::as_str)
            .ok_or_else(|| ConfigError::Missing {
                section: self.name.to_string(),
                key: key.to_string(),
            })
    }

    fn get_or(&self, key: &str, default: &'a str) -> &'a str {
        self.values
            .and_then(|v| v.get(key))
            .map(String::as_str)
            .unwrap_or(default)
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get(key)?;
        value.parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            message: format!("cannot parse '{}'", value),
        })
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.values.and_then(|v| v.get(key)) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                message: format!("cannot parse '{}'", value),
            }),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, key: &str) -> Result<bool, ConfigError> {
        parse_bool_value(self.get(key)?).ok_or_else(|| ConfigError::Invalid {
            key: key.to_string(),
            message: "cannot parse as bool".to_string(),
        })
    }

    fn parse_bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.values.and_then(|v| v.get(key)) {
            Some(value) => parse_bool_value(value).ok_or_else(|| ConfigError::Invalid {
                key: key.to_string(),
                message: format!("cannot parse '{}' as bool", value),
            }),
            None => Ok(default),
        }
    }
}

/// Accepts the spellings Python-style config files use.
fn parse_bool_value(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Genome settings shared by unit tests across the crate: two inputs
/// and one sigmoid/sum output.
#[cfg(test)]
pub(crate) fn test_genome_config() -> GenomeConfig {
    GenomeConfig::minimal(2, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
[NEAT]
pop_size              = 150
fitness_criterion     = max   # summary statistic
fitness_threshold     = 3.9
reset_on_extinction   = False

[DefaultGenome]
num_inputs            = 2
num_outputs           = 1
num_hidden            = 0
feed_forward          = True
initial_connection    = full_direct
compatibility_disjoint_coefficient = 1.0
compatibility_weight_coefficient   = 0.5
conn_add_prob         = 0.5
conn_delete_prob      = 0.0
node_add_prob         = 0.2
node_delete_prob      = 0.0
bias_init_mean        = 0.0
bias_init_stdev       = 1.0
bias_replace_rate     = 0.1
bias_mutate_rate      = 0.7
bias_mutate_power     = 0.5
bias_max_value        = 30.0
bias_min_value        = -30.0
response_init_mean    = 1.0
response_init_stdev   = 0.0
response_replace_rate = 0.0
response_mutate_rate  = 0.0
response_mutate_power = 0.0
response_max_value    = 30.0
response_min_value    = -30.0
weight_init_mean      = 0.0
weight_init_stdev     = 1.0
weight_replace_rate   = 0.1
weight_mutate_rate    = 0.8
weight_mutate_power   = 0.5
weight_max_value      = 30.0
weight_min_value      = -30.0
activation_default    = sigmoid
activation_options    = sigmoid
activation_mutate_rate = 0.0
aggregation_default   = sum
aggregation_options   = sum
aggregation_mutate_rate = 0.0
enabled_default       = True  ; enable new connections
enabled_mutate_rate   = 0.01

[DefaultReproduction]
elitism               = 2
survival_threshold    = 0.2

[DefaultSpeciesSet]
compatibility_threshold = 3.0

[DefaultStagnation]
species_fitness_func  = max
max_stagnation        = 20
species_elitism       = 2
";

    #[test]
    fn parses_sample_with_inline_comments() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.neat.pop_size, 150);
        assert_eq!(config.neat.fitness_criterion, "max");
        assert!(!config.neat.reset_on_extinction);
        assert_eq!(config.genome.input_keys, vec![-1, -2]);
        assert_eq!(config.genome.output_keys, vec![0]);
        assert_eq!(config.genome.first_hidden_key(), 1);
        assert_eq!(config.genome.initial_connection, InitialConnection::FullDirect);
        assert_eq!(config.genome.enabled.default, DefaultBool::True);
        assert_eq!(config.genome.bias.init_type, InitType::Gaussian);
        assert_eq!(config.reproduction.elitism, 2);
        // Defaults fill keys the sample omits.
        assert_eq!(config.reproduction.min_species_size, 1);
        assert!(!config.neat.no_fitness_termination);
        assert_eq!(config.stagnation.max_stagnation, 20);
    }

    #[test]
    fn partial_fraction_is_extracted() {
        let text = SAMPLE.replace(
            "initial_connection    = full_direct",
            "initial_connection    = partial_direct 0.4",
        );
        let config = Config::parse(&text).unwrap();
        assert_eq!(
            config.genome.initial_connection,
            InitialConnection::PartialDirect(0.4)
        );
    }

    #[test]
    fn partial_without_fraction_is_rejected() {
        let text = SAMPLE.replace(
            "initial_connection    = full_direct",
            "initial_connection    = partial",
        );
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn missing_key_is_reported() {
        let text = SAMPLE.replace("pop_size              = 150", "");
        match Config::parse(&text) {
            Err(ConfigError::Missing { section, key }) => {
                assert_eq!(section, "NEAT");
                assert_eq!(key, "pop_size");
            }
            other => panic!("expected missing-key error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn bounds_are_validated() {
        let text = SAMPLE.replace("bias_max_value        = 30.0", "bias_max_value = -40.0");
        assert!(Config::parse(&text).is_err());

        let text = SAMPLE.replace("conn_add_prob         = 0.5", "conn_add_prob = 1.5");
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn unknown_option_names_are_rejected() {
        let text = SAMPLE.replace(
            "activation_options    = sigmoid",
            "activation_options    = sigmoid warp",
        );
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn unknown_criterion_is_rejected() {
        let text = SAMPLE.replace("fitness_criterion     = max   # summary statistic", "fitness_criterion = mode");
        assert!(Config::parse(&text).is_err());
    }
}
