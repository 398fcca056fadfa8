use crate::error::{SimplifyError, VectorError};
use crate::vector_math;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// A similarity metric: a name, a direction, and one vector math routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Metric {
    Euclidean,
    Cosine,
    Jaccard,
    Manhattan,
    Pearson,
    Chebyshev,
}

impl Metric {
    /// The full catalogue, in display order.
    pub const ALL: [Metric; 6] = [
        Metric::Euclidean,
        Metric::Cosine,
        Metric::Jaccard,
        Metric::Manhattan,
        Metric::Pearson,
        Metric::Chebyshev,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Euclidean => "Euclidean",
            Metric::Cosine => "Cosine",
            Metric::Jaccard => "Jaccard",
            Metric::Manhattan => "Manhattan",
            Metric::Pearson => "Pearson",
            Metric::Chebyshev => "Chebyshev",
        }
    }

    /// true when a larger score means the vectors are closer
    pub fn higher_is_better(self) -> bool {
        matches!(self, Metric::Cosine | Metric::Jaccard | Metric::Pearson)
    }

    /// Case-insensitive lookup by name.
    pub fn lookup(name: &str) -> Option<Metric> {
        let name = name.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Raw score, possibly NaN or infinite for degenerate vectors.
    pub fn calculate(self, v1: &[f64], v2: &[f64]) -> Result<f64, VectorError> {
        let f: fn(&[f64], &[f64]) -> Result<f64, VectorError> = match self {
            Metric::Euclidean => vector_math::euclidean,
            Metric::Cosine => vector_math::cosine,
            Metric::Jaccard => vector_math::jaccard,
            Metric::Manhattan => vector_math::manhattan,
            Metric::Pearson => vector_math::pearson,
            Metric::Chebyshev => vector_math::chebyshev,
        };
        f(v1, v2)
    }

    /// Score usable for ranking. `None` for a length mismatch or a non-finite
    /// result; such a pair never wins in either direction.
    pub fn score(self, v1: &[f64], v2: &[f64]) -> Option<f64> {
        match self.calculate(v1, v2) {
            Ok(s) if s.is_finite() => Some(s),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("{}: skipping comparison: {e}", self.name());
                None
            }
        }
    }

    /// Is `candidate` strictly more similar than `incumbent` under this metric?
    pub fn prefers(self, candidate: f64, incumbent: f64) -> bool {
        if self.higher_is_better() {
            candidate > incumbent
        } else {
            candidate < incumbent
        }
    }

    /// Like [`Metric::prefers`] but equal scores also count.
    pub fn prefers_or_ties(self, candidate: f64, incumbent: f64) -> bool {
        candidate == incumbent || self.prefers(candidate, incumbent)
    }
}

/// Canonical names of every registered metric.
pub fn names() -> impl Iterator<Item = &'static str> {
    Metric::ALL.into_iter().map(Metric::name)
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = SimplifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::lookup(s).ok_or_else(|| SimplifyError::UnknownMetric(s.trim().to_string()))
    }
}
