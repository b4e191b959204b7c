//! Initialization and mutation kernels for gene attributes.
//!
//! Float mutation draws a single uniform value `r` and walks the
//! `[0, mutate_rate)` perturb band before the
//! `[mutate_rate, mutate_rate + replace_rate)` replace band; that
//! ordering is part of the contract. All randomness comes from the
//! caller's RNG.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{BoolAttrConfig, DefaultBool, FloatAttrConfig, InitType, StringAttrConfig};

fn gaussian(mean: f64, stdev: f64, rng: &mut impl Rng) -> f64 {
    match Normal::new(mean, stdev) {
        Ok(dist) => dist.sample(rng),
        // Config validation keeps stdev non-negative; a degenerate
        // distribution collapses to its mean.
        Err(_) => mean,
    }
}

pub(crate) fn init_float(cfg: &FloatAttrConfig, rng: &mut impl Rng) -> f64 {
    let value = match cfg.init_type {
        InitType::Gaussian => gaussian(cfg.init_mean, cfg.init_stdev, rng),
        InitType::Uniform => {
            let lo = cfg.min_value.max(cfg.init_mean - 2.0 * cfg.init_stdev);
            let hi = cfg.max_value.min(cfg.init_mean + 2.0 * cfg.init_stdev);
            if hi > lo {
                rng.gen_range(lo..hi)
            } else {
                lo
            }
        }
    };
    value.clamp(cfg.min_value, cfg.max_value)
}

pub(crate) fn mutate_float(value: f64, cfg: &FloatAttrConfig, rng: &mut impl Rng) -> f64 {
    let r: f64 = rng.gen();
    if r < cfg.mutate_rate {
        let perturbed = value + gaussian(0.0, cfg.mutate_power, rng);
        return perturbed.clamp(cfg.min_value, cfg.max_value);
    }
    if r < cfg.mutate_rate + cfg.replace_rate {
        return init_float(cfg, rng);
    }
    value
}

pub(crate) fn init_string(cfg: &StringAttrConfig, rng: &mut impl Rng) -> String {
    let default = cfg.default.to_lowercase();
    if default == "random" || default == "none" || default.is_empty() {
        return choose(&cfg.options, rng);
    }
    if cfg.options.iter().any(|o| *o == cfg.default) {
        return cfg.default.clone();
    }
    log::warn!(
        "default '{}' is not among the configured options; choosing at random",
        cfg.default
    );
    choose(&cfg.options, rng)
}

pub(crate) fn mutate_string(value: &str, cfg: &StringAttrConfig, rng: &mut impl Rng) -> String {
    if cfg.options.len() <= 1 {
        return value.to_string();
    }
    if cfg.mutate_rate > 0.0 && rng.gen::<f64>() < cfg.mutate_rate {
        let different: Vec<&String> = cfg.options.iter().filter(|o| *o != value).collect();
        if different.is_empty() {
            return value.to_string();
        }
        return different[rng.gen_range(0..different.len())].clone();
    }
    value.to_string()
}

fn choose(options: &[String], rng: &mut impl Rng) -> String {
    options[rng.gen_range(0..options.len())].clone()
}

pub(crate) fn init_bool(cfg: &BoolAttrConfig, rng: &mut impl Rng) -> bool {
    match cfg.default {
        DefaultBool::True => true,
        DefaultBool::False => false,
        DefaultBool::Random => rng.gen::<f64>() < 0.5,
    }
}

/// Proposes a new value for a boolean attribute. The effective rate
/// depends on the current value, and a firing mutation re-draws the
/// value rather than flipping it. Enable-side suppression for
/// feed-forward genomes is applied by the genome, which owns the
/// connectivity needed for the cycle check.
pub(crate) fn mutate_bool(value: bool, cfg: &BoolAttrConfig, rng: &mut impl Rng) -> bool {
    let effective_rate = cfg.mutate_rate
        + if value {
            cfg.rate_to_false_add
        } else {
            cfg.rate_to_true_add
        };
    if effective_rate > 0.0 && rng.gen::<f64>() < effective_rate {
        return rng.gen::<f64>() < 0.5;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn float_cfg() -> FloatAttrConfig {
        FloatAttrConfig {
            init_mean: 0.0,
            init_stdev: 1.0,
            init_type: InitType::Gaussian,
            replace_rate: 0.1,
            mutate_rate: 0.7,
            mutate_power: 0.5,
            max_value: 2.0,
            min_value: -2.0,
        }
    }

    #[test]
    fn init_float_respects_bounds() {
        let cfg = float_cfg();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = init_float(&cfg, &mut rng);
            assert!((cfg.min_value..=cfg.max_value).contains(&v));
        }
    }

    #[test]
    fn init_float_uniform_band() {
        let cfg = FloatAttrConfig {
            init_type: InitType::Uniform,
            init_mean: 5.0,
            init_stdev: 1.0,
            max_value: 6.0,
            min_value: 0.0,
            ..float_cfg()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = init_float(&cfg, &mut rng);
            // Uniform band is [mean - 2σ, min(max, mean + 2σ)] = [3, 6].
            assert!((3.0..=6.0).contains(&v));
        }
    }

    #[test]
    fn mutate_float_stays_in_bounds() {
        let cfg = FloatAttrConfig {
            mutate_rate: 1.0,
            mutate_power: 10.0,
            ..float_cfg()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..1000 {
            let v = mutate_float(1.9, &cfg, &mut rng);
            assert!((cfg.min_value..=cfg.max_value).contains(&v));
        }
    }

    #[test]
    fn mutate_float_zero_rates_is_identity() {
        let cfg = FloatAttrConfig {
            mutate_rate: 0.0,
            replace_rate: 0.0,
            ..float_cfg()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(mutate_float(0.25, &cfg, &mut rng), 0.25);
        }
    }

    #[test]
    fn mutate_string_prefers_a_different_option() {
        let cfg = StringAttrConfig {
            default: "random".to_string(),
            options: vec!["sigmoid".to_string(), "tanh".to_string(), "relu".to_string()],
            mutate_rate: 1.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            assert_ne!(mutate_string("sigmoid", &cfg, &mut rng), "sigmoid");
        }
    }

    #[test]
    fn mutate_string_single_option_is_inert() {
        let cfg = StringAttrConfig {
            default: "sum".to_string(),
            options: vec!["sum".to_string()],
            mutate_rate: 1.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(mutate_string("sum", &cfg, &mut rng), "sum");
    }

    #[test]
    fn bool_effective_rate_redraws() {
        let cfg = BoolAttrConfig {
            default: DefaultBool::True,
            mutate_rate: 0.0,
            rate_to_true_add: 1.0,
            rate_to_false_add: 0.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        // Every call on a false value fires; the outcome is a fair coin,
        // so both values must appear.
        let outcomes: Vec<bool> = (0..200).map(|_| mutate_bool(false, &cfg, &mut rng)).collect();
        assert!(outcomes.iter().any(|v| *v));
        assert!(outcomes.iter().any(|v| !*v));
        // A true value never fires under these rates.
        for _ in 0..100 {
            assert!(mutate_bool(true, &cfg, &mut rng));
        }
    }
}
