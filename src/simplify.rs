//! The substitution engine: swap uncommon words for common ones.
//!
//! Every word of the input that has an embedding and is not already common is
//! compared against the embeddings of all common words, and the configured
//! [`Policy`] picks the replacement.

use crate::config::{Policy, ReplacementConfig};
use crate::metric::Metric;
use crate::word_vectors::WordSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// A segment of the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'t> {
    Word(&'t str),
    Punct(char),
}

/// Split `text` into words and punctuation.
///
/// Each ASCII punctuation character is a token of its own. Whitespace only
/// separates words and is dropped.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        let punct = c.is_ascii_punctuation();
        if punct || c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token::Word(&text[s..i]));
            }
            if punct {
                tokens.push(Token::Punct(c));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token::Word(&text[s..]));
    }

    tokens
}

/// What a policy picked from the candidate pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Match(String),
    /// No candidate produced a comparable score.
    NoMatch,
}

/// Best candidate found when every selected metric is swept over the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepBest {
    pub word: String,
    pub metric: Metric,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoVector,
    Common,
    NoCandidates,
    NoMetrics,
    Selected(Selection),
}

/// How one word was (or was not) replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    /// the lowercased input word
    pub word: String,
    pub pool_size: usize,
    pub sweep: Option<SweepBest>,
    pub outcome: Outcome,
}

impl Explanation {
    /// The word that ends up in the output.
    pub fn replacement(&self) -> &str {
        match &self.outcome {
            Outcome::Selected(Selection::Match(w)) => w,
            _ => &self.word,
        }
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::NoVector => return write!(f, "'{}' has no embedding, kept as is", self.word),
            Outcome::Common => return write!(f, "'{}' is already a common word", self.word),
            Outcome::NoCandidates => return write!(f, "no common words have embeddings"),
            Outcome::NoMetrics => return write!(f, "no similarity metric selected"),
            Outcome::Selected(_) => {}
        }
        writeln!(f, "'{}' -> '{}'", self.word, self.replacement())?;
        writeln!(f, "  candidates: {}", self.pool_size)?;
        if let Outcome::Selected(Selection::NoMatch) = self.outcome {
            writeln!(f, "  no candidate had a comparable score")?;
        }
        match &self.sweep {
            Some(s) => write!(f, "  best over all metrics: '{}' ({} {:.6})", s.word, s.metric, s.score),
            None => write!(f, "  best over all metrics: none"),
        }
    }
}

type Candidate<'a> = (&'a str, &'a [f64]);

/// Rewrites text against a word table.
///
/// The table is borrowed read-only; the random source is only used by
/// [`Policy::Random`].
pub struct Simplifier<'a, W, R = StdRng> {
    words: &'a W,
    rng: R,
}

impl<'a, W: WordSource> Simplifier<'a, W, StdRng> {
    pub fn new(words: &'a W) -> Self {
        Self::with_rng(words, StdRng::from_os_rng())
    }

    pub fn seeded(words: &'a W, seed: u64) -> Self {
        Self::with_rng(words, StdRng::seed_from_u64(seed))
    }
}

impl<'a, W: WordSource, R: Rng> Simplifier<'a, W, R> {
    pub fn with_rng(words: &'a W, rng: R) -> Self {
        Self { words, rng }
    }

    /// Replace every eligible word of `text` and re-join the tokens.
    ///
    /// Punctuation is attached to the preceding token; every other token is
    /// followed by a single space.
    pub fn simplify(&mut self, text: &str, config: &ReplacementConfig) -> String {
        let tokens = tokenize(text);
        let pool = self.candidate_pool();
        let mut out = String::with_capacity(text.len());

        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Word(word) => out.push_str(self.resolve(word, &pool, config, false).replacement()),
                Token::Punct(c) => out.push(*c),
            }
            if let Some(Token::Word(_)) = tokens.get(i + 1) {
                out.push(' ');
            }
        }

        out.trim().to_owned()
    }

    /// Replacement for a single word, lowercased.
    pub fn replace_word(&mut self, word: &str, config: &ReplacementConfig) -> String {
        let pool = self.candidate_pool();
        self.resolve(word, &pool, config, false).replacement().to_owned()
    }

    /// Like [`Simplifier::replace_word`], but reports how the result came about.
    pub fn explain(&mut self, word: &str, config: &ReplacementConfig) -> Explanation {
        let pool = self.candidate_pool();
        self.resolve(word, &pool, config, true)
    }

    fn candidate_pool(&self) -> Vec<Candidate<'a>> {
        let words: &'a W = self.words;
        words.entries().filter(|(w, _)| words.is_common(w)).collect()
    }

    fn resolve(
        &mut self,
        word: &str,
        pool: &[Candidate<'a>],
        config: &ReplacementConfig,
        with_sweep: bool,
    ) -> Explanation {
        let words: &'a W = self.words;
        let mut explanation = Explanation {
            word: word.to_lowercase(),
            pool_size: pool.len(),
            sweep: None,
            outcome: Outcome::NoVector,
        };

        let Some(target) = words.vector(&explanation.word) else {
            return explanation;
        };
        explanation.outcome = if words.is_common(&explanation.word) {
            Outcome::Common
        } else if pool.is_empty() {
            Outcome::NoCandidates
        } else if config.metrics().is_empty() {
            Outcome::NoMetrics
        } else {
            if with_sweep || tracing::enabled!(tracing::Level::TRACE) {
                explanation.sweep = sweep(target, pool, config.metrics());
                tracing::trace!("{}: sweep over all metrics: {:?}", explanation.word, explanation.sweep);
            }
            Outcome::Selected(select(target, pool, config, &mut self.rng))
        };

        explanation
    }
}

// Run every metric over every candidate, keeping one running best. A later
// metric that finds a strictly better score under its own direction takes over.
fn sweep(target: &[f64], pool: &[Candidate<'_>], metrics: &[Metric]) -> Option<SweepBest> {
    let mut bound = if metrics.iter().any(|m| m.higher_is_better()) {
        -f64::MAX
    } else {
        f64::MAX
    };
    let mut best = None;

    for &metric in metrics {
        for &(word, vector) in pool {
            let Some(score) = metric.score(target, vector) else {
                continue;
            };
            if metric.prefers(score, bound) {
                bound = score;
                best = Some((word, metric));
            }
        }
    }

    best.map(|(word, metric)| SweepBest {
        word: word.to_string(),
        metric,
        score: bound,
    })
}

fn select<R: Rng>(
    target: &[f64],
    pool: &[Candidate<'_>],
    config: &ReplacementConfig,
    rng: &mut R,
) -> Selection {
    let most_similar = match config.policy() {
        Policy::Random => {
            if pool.is_empty() {
                return Selection::NoMatch;
            }
            let (word, _) = pool[rng.random_range(0..pool.len())];
            return Selection::Match(word.to_string());
        }
        Policy::MostSimilar => true,
        Policy::LeastSimilar => false,
    };
    let Some(metric) = config.primary_metric() else {
        return Selection::NoMatch;
    };

    // ties go to the candidate seen last
    let mut best: Option<(&str, f64)> = None;
    for &(word, vector) in pool {
        let Some(score) = metric.score(target, vector) else {
            continue;
        };
        let wins = match best {
            None => true,
            Some((_, incumbent)) if most_similar => metric.prefers_or_ties(score, incumbent),
            Some((_, incumbent)) => metric.prefers_or_ties(incumbent, score),
        };
        if wins {
            best = Some((word, score));
        }
    }

    match best {
        Some((word, _)) => Selection::Match(word.to_string()),
        None => Selection::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word_vectors::WordVectors;
    use std::collections::HashSet;
    use std::io::Cursor;

    fn table(embeddings: &str, common: &[&str]) -> WordVectors {
        let mut wv = WordVectors::new();
        wv.read_embeddings(Cursor::new(embeddings)).unwrap();
        for w in common {
            wv.add_common(w);
        }
        wv
    }

    fn moods() -> WordVectors {
        table("happy 1 0\ncontent 0.9 0.1\nsad -1 0\n", &["content", "sad"])
    }

    fn config(metrics: &[Metric], policy: Policy) -> ReplacementConfig {
        ReplacementConfig::new(metrics.to_vec(), policy)
    }

    #[test]
    fn tokenize_isolates_punctuation() {
        assert_eq!(
            tokenize("Hi, world!"),
            [
                Token::Word("Hi"),
                Token::Punct(','),
                Token::Word("world"),
                Token::Punct('!'),
            ]
        );
        assert_eq!(
            tokenize("  don't\tstop... "),
            [
                Token::Word("don"),
                Token::Punct('\''),
                Token::Word("t"),
                Token::Word("stop"),
                Token::Punct('.'),
                Token::Punct('.'),
                Token::Punct('.'),
            ]
        );
        assert!(tokenize("   ").is_empty());
        assert_eq!(tokenize("café"), [Token::Word("café")]);
    }

    #[test]
    fn most_similar_picks_closest_common_word() {
        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = config(&[Metric::Cosine], Policy::MostSimilar);
        assert_eq!(s.replace_word("happy", &cfg), "content");
        assert_eq!(s.replace_word("HAPPY", &cfg), "content");
    }

    #[test]
    fn least_similar_picks_farthest_common_word() {
        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = config(&[Metric::Cosine], Policy::LeastSimilar);
        assert_eq!(s.replace_word("happy", &cfg), "sad");

        let cfg = config(&[Metric::Euclidean], Policy::LeastSimilar);
        assert_eq!(s.replace_word("happy", &cfg), "sad");
    }

    #[test]
    fn unknown_and_common_words_are_kept() {
        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = ReplacementConfig::default();
        assert_eq!(s.replace_word("Ecstatic", &cfg), "ecstatic");
        assert_eq!(s.replace_word("Sad", &cfg), "sad");
        assert_eq!(s.replace_word("content", &cfg), "content");
    }

    #[test]
    fn single_candidate_wins_under_every_metric() {
        let wv = table("rare 0.3 0.7 0.2\nonly 0.5 0.1 0.9\n", &["only"]);
        let mut s = Simplifier::seeded(&wv, 7);
        for metric in Metric::ALL {
            for policy in [Policy::MostSimilar, Policy::LeastSimilar] {
                assert_eq!(s.replace_word("rare", &config(&[metric], policy)), "only");
            }
        }
    }

    #[test]
    fn empty_pool_or_metrics_keep_the_word() {
        let wv = table("happy 1 0\ncontent 0.9 0.1\n", &["unrelated"]);
        let mut s = Simplifier::seeded(&wv, 1);
        assert_eq!(s.replace_word("Happy", &ReplacementConfig::default()), "happy");

        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 1);
        for policy in [Policy::MostSimilar, Policy::LeastSimilar, Policy::Random] {
            assert_eq!(s.replace_word("happy", &config(&[], policy)), "happy");
        }
    }

    #[test]
    fn only_the_first_metric_drives_selection() {
        // cosine prefers "same" (same direction), euclidean prefers "near"
        let wv = table("word 1 1\nsame 5 5\nnear 1 0.8\n", &["same", "near"]);
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = config(&[Metric::Cosine, Metric::Euclidean], Policy::MostSimilar);
        assert_eq!(s.replace_word("word", &cfg), "same");
        let cfg = config(&[Metric::Euclidean, Metric::Cosine], Policy::MostSimilar);
        assert_eq!(s.replace_word("word", &cfg), "near");
    }

    #[test]
    fn ties_go_to_the_last_candidate() {
        let wv = table("word 1 0\nfirst 2 0\nsecond 3 0\n", &["first", "second"]);
        let mut s = Simplifier::seeded(&wv, 1);
        // both have cosine 1.0 and are equally "least similar" too
        let cfg = config(&[Metric::Cosine], Policy::MostSimilar);
        assert_eq!(s.replace_word("word", &cfg), "second");
        let cfg = config(&[Metric::Cosine], Policy::LeastSimilar);
        assert_eq!(s.replace_word("word", &cfg), "second");
    }

    #[test]
    fn mismatched_and_degenerate_candidates_are_skipped() {
        let wv = table(
            "word 1 2 3\nshort 1 2\nzero 0 0 0\nfine 1 2 4\n",
            &["short", "zero", "fine"],
        );
        let mut s = Simplifier::seeded(&wv, 1);
        for policy in [Policy::MostSimilar, Policy::LeastSimilar] {
            assert_eq!(s.replace_word("word", &config(&[Metric::Cosine], policy)), "fine");
        }
    }

    #[test]
    fn no_comparable_candidate_is_no_match() {
        let wv = table("word 1 2 3\nshort 1 2\n", &["short"]);
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = ReplacementConfig::default();
        let e = s.explain("Word", &cfg);
        assert_eq!(e.outcome, Outcome::Selected(Selection::NoMatch));
        assert_eq!(e.replacement(), "word");
        assert_eq!(e.sweep, None);

        // random still picks from a non-empty pool
        let cfg = config(&[Metric::Cosine], Policy::Random);
        assert_eq!(s.replace_word("word", &cfg), "short");
    }

    #[test]
    fn random_reaches_every_candidate() {
        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 42);
        let cfg = config(&[Metric::Cosine], Policy::Random);
        let seen: HashSet<String> = (0..1000).map(|_| s.replace_word("happy", &cfg)).collect();
        assert_eq!(seen, HashSet::from(["content".to_string(), "sad".to_string()]));
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let wv = table(
            "x 1 0\na 1 1\nb 1 2\nc 1 3\nd 1 4\ne 1 5\n",
            &["a", "b", "c", "d", "e"],
        );
        let cfg = config(&[Metric::Cosine], Policy::Random);
        let run = |seed| {
            let mut s = Simplifier::seeded(&wv, seed);
            (0..20).map(|_| s.replace_word("x", &cfg)).collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn simplify_reattaches_punctuation() {
        let wv = table(
            "hi 1 0\nhello 0.9 0.1\nworld 0 1\nearth 0.1 0.9\n",
            &["hello", "earth"],
        );
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = ReplacementConfig::default();
        assert_eq!(s.simplify("Hi, world!", &cfg), "hello, earth!");
        assert_eq!(s.simplify("  Hi   World  ", &cfg), "hello earth");
        assert_eq!(s.simplify("Hi-world? Yes.", &cfg), "hello- earth? yes.");
        assert_eq!(s.simplify("", &cfg), "");
    }

    #[test]
    fn sweep_lets_later_metrics_take_over() {
        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 1);
        // the sweep bound starts at -MAX because cosine is higher-is-better;
        // euclidean then finds 0.14 < 0.99 and takes over
        let cfg = config(&[Metric::Cosine, Metric::Euclidean], Policy::MostSimilar);
        let e = s.explain("happy", &cfg);
        let sweep = e.sweep.clone().unwrap();
        assert_eq!(sweep.word, "content");
        assert_eq!(sweep.metric, Metric::Euclidean);
        assert!((sweep.score - 0.02f64.sqrt()).abs() < 1e-9);
        assert_eq!(e.pool_size, 2);
        assert_eq!(e.replacement(), "content");

        let cfg = config(&[Metric::Euclidean], Policy::MostSimilar);
        let sweep = s.explain("happy", &cfg).sweep.unwrap();
        assert_eq!(sweep.metric, Metric::Euclidean);
        assert_eq!(sweep.word, "content");
    }

    #[test]
    fn explain_reports_why_a_word_was_kept() {
        let wv = moods();
        let mut s = Simplifier::seeded(&wv, 1);
        let cfg = ReplacementConfig::default();
        assert_eq!(s.explain("nothing", &cfg).outcome, Outcome::NoVector);
        assert_eq!(s.explain("sad", &cfg).outcome, Outcome::Common);
        assert_eq!(s.explain("happy", &config(&[], Policy::MostSimilar)).outcome, Outcome::NoMetrics);
        assert!(s.explain("happy", &cfg).to_string().starts_with("'happy' -> 'content'"));
    }
}
