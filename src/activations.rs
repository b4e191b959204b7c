//! Registry of node activation functions.
//!
//! Genomes store activation choices by name; the phenotype builder
//! resolves them here. Unknown names surface as a [`LookupError`].

use crate::errors::LookupError;

/// A unary activation applied to a node's scaled input sum.
pub type ActivationFn = fn(f64) -> f64;

/// Resolves an activation function by name.
///
/// # Examples
/// ```
/// use neatgen::activations::activation;
///
/// let sigmoid = activation("sigmoid").unwrap();
/// assert_eq!(sigmoid(0.0), 0.5);
/// assert!(activation("softmax").is_err());
/// ```
pub fn activation(name: &str) -> Result<ActivationFn, LookupError> {
    match name {
        "sigmoid" => Ok(sigmoid),
        "tanh" => Ok(tanh),
        "relu" => Ok(relu),
        "identity" => Ok(identity),
        "clamped" => Ok(clamped),
        "gaussian" => Ok(gaussian),
        "abs" | "absolute" => Ok(abs),
        "sin" | "sine" => Ok(sin),
        "cos" | "cosine" => Ok(cos),
        "inv" => Ok(inv),
        "log" => Ok(log),
        "exp" => Ok(exp),
        "hat" => Ok(hat),
        "square" => Ok(square),
        "cube" => Ok(cube),
        _ => Err(LookupError::new("activation function", name)),
    }
}

/// Steepness of the logistic sigmoid, per the original NEAT experiments.
const SIGMOID_STEEPNESS: f64 = 4.9;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-SIGMOID_STEEPNESS * x).exp())
}

fn tanh(x: f64) -> f64 {
    x.tanh()
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

fn identity(x: f64) -> f64 {
    x
}

fn clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

fn gaussian(x: f64) -> f64 {
    (-x * x / 2.0).exp()
}

fn abs(x: f64) -> f64 {
    x.abs()
}

fn sin(x: f64) -> f64 {
    x.sin()
}

fn cos(x: f64) -> f64 {
    x.cos()
}

fn inv(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        1.0 / x
    }
}

fn log(x: f64) -> f64 {
    x.max(1e-9).ln()
}

fn exp(x: f64) -> f64 {
    x.clamp(-60.0, 60.0).exp()
}

fn hat(x: f64) -> f64 {
    (1.0 - x.abs()).max(0.0)
}

fn square(x: f64) -> f64 {
    x * x
}

fn cube(x: f64) -> f64 {
    x * x * x
}
