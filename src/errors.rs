use std::error::Error;
use std::fmt;

/// Error returned when a name does not resolve in one of the
/// function registries (activations, aggregations, stat functions).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupError {
    kind: &'static str,
    name: String,
}

impl LookupError {
    pub(crate) fn new(kind: &'static str, name: &str) -> LookupError {
        LookupError {
            kind,
            name: name.to_string(),
        }
    }

    /// The name that failed to resolve.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.name)
    }
}

impl Error for LookupError {}
