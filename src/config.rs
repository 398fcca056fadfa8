use crate::error::SimplifyError;
use crate::metric::Metric;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// How a replacement is picked from the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Policy {
    #[default]
    MostSimilar,
    LeastSimilar,
    Random,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Policy::MostSimilar => "Most Similar",
            Policy::LeastSimilar => "Least Similar",
            Policy::Random => "Random",
        })
    }
}

impl FromStr for Policy {
    type Err = SimplifyError;

    // accepts "most similar", "most-similar", "most_similar", "most", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "mostsimilar" | "most" | "best" => Ok(Policy::MostSimilar),
            "leastsimilar" | "least" | "worst" => Ok(Policy::LeastSimilar),
            "random" => Ok(Policy::Random),
            _ => Err(SimplifyError::UnknownPolicy(s.trim().to_string())),
        }
    }
}

/// The active metrics and selection policy for a session.
///
/// The shell owns this value and lends it to the simplifier for the length of
/// one call, so it cannot change while a replacement is being computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementConfig {
    metrics: Vec<Metric>,
    policy: Policy,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            metrics: vec![Metric::Cosine],
            policy: Policy::MostSimilar,
        }
    }
}

impl ReplacementConfig {
    pub fn new(metrics: Vec<Metric>, policy: Policy) -> Self {
        Self { metrics, policy }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The metric that drives most/least similar selection.
    pub fn primary_metric(&self) -> Option<Metric> {
        self.metrics.first().copied()
    }

    /// Replace the metric list with the registry entries for `names`.
    ///
    /// Unknown names are dropped. Returns how many metrics were selected; on
    /// zero the list is left empty and it is up to the caller to tell the user.
    pub fn select_metrics<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.metrics = names
            .into_iter()
            .filter_map(|name| Metric::lookup(name.as_ref()))
            .collect();
        if self.metrics.is_empty() {
            tracing::warn!("no valid similarity metrics selected");
        }
        self.metrics.len()
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn reset_to_default(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for ReplacementConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selected similarity metrics:")?;
        if self.metrics.is_empty() {
            writeln!(f, " - [none selected]")?;
        }
        for m in &self.metrics {
            writeln!(f, " - {m}")?;
        }
        write!(f, "Replacement policy: {}", self.policy)
    }
}
