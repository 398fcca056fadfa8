use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{ArgAction, Parser};
use simplify_rs::settings::DEFAULT_OUTPUT;
use simplify_rs::{Metric, Policy, ReplacementConfig, Settings, Simplifier, WordVectors, metric};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::Level;

/// Command-line arguments parsed by Clap.
#[derive(Parser, Debug)]
#[command(author, version, about = "Replace uncommon words with similar common ones", long_about = None)]
struct Cli {
    /// Word embedding file, one `word v1 v2 ... vN` row per line
    #[arg(long, value_name = "FILE")]
    embeddings: PathBuf,

    /// Common word file, one word per line
    #[arg(long, value_name = "FILE")]
    vocabulary: PathBuf,

    /// Similarity metric; may be repeated, the first one ranks candidates
    #[arg(short, long = "metric", value_enum, default_values_t = [Metric::Cosine])]
    metrics: Vec<Metric>,

    /// How a replacement is picked among the common words
    #[arg(short, long, value_enum, default_value_t = Policy::MostSimilar)]
    policy: Policy,

    /// Seed for the random policy
    #[arg(long)]
    seed: Option<u64>,

    /// Simplified text is appended here
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Simplify every line of this file instead of starting the shell
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Simplify this text instead of starting the shell
    #[arg(short, long, conflicts_with = "input")]
    text: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// A `:command` entered in the shell.
#[derive(Debug, PartialEq, Eq)]
enum Command<'s> {
    Metrics(&'s str),
    Policy(&'s str),
    Output(&'s str),
    Reset,
    Config,
    Explain(&'s str),
    Near(&'s str),
    Help,
    Quit,
    Unknown(&'s str),
}

// None when the line is text to simplify
fn parse_command(line: &str) -> Option<Command<'_>> {
    let line = line.trim();
    if line == "EXIT" {
        return Some(Command::Quit);
    }
    let rest = line.strip_prefix(':')?;
    let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let arg = arg.trim();

    Some(match name {
        "metrics" | "m" => Command::Metrics(arg),
        "policy" | "p" => Command::Policy(arg),
        "output" | "o" => Command::Output(arg),
        "reset" => Command::Reset,
        "config" | "c" => Command::Config,
        "explain" | "e" => Command::Explain(arg),
        "near" | "n" => Command::Near(arg),
        "help" | "h" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name),
    })
}

const HELP: &str = "\
Type text to simplify it, or one of:
  :metrics [a,b,...]  select similarity metrics (no argument lists them)
  :policy <policy>    most-similar, least-similar or random
  :output [FILE]      append results to FILE (no argument: ./output.txt)
  :reset              back to Cosine + most-similar
  :config             show the current configuration
  :explain <word>     show how a single word is replaced
  :near <word>        rank the common words closest to <word>
  :q                  quit";

struct Shell<'a> {
    simplifier: Simplifier<'a, WordVectors>,
    words: &'a WordVectors,
    config: ReplacementConfig,
    settings: Settings,
}

impl Shell<'_> {
    fn run(&mut self) -> Result<()> {
        println!("Text Simplifier - :help for commands, :q to quit\n");
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("> ");
            io::stdout().flush()?;
            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break; // EOF
            }
            match parse_command(&line) {
                Some(Command::Quit) => break,
                Some(cmd) => self.execute(cmd),
                None if line.trim().is_empty() => continue,
                None => self.simplify(line.trim()),
            }
        }
        println!("Goodbye!");
        Ok(())
    }

    fn simplify(&mut self, text: &str) {
        let simplified = self.simplifier.simplify(text, &self.config);
        println!("{simplified}");
        if let Err(e) = self.settings.append_output(&simplified) {
            tracing::error!("{e}");
        }
    }

    fn execute(&mut self, cmd: Command<'_>) {
        match cmd {
            Command::Metrics("") => {
                println!("Available metrics: {}", metric::names().collect::<Vec<_>>().join(", "));
            }
            Command::Metrics(list) => match self.config.select_metrics(list.split(',')) {
                0 => println!("No valid metrics selected; words are kept as they are until you pick one."),
                _ => println!("Selected metrics updated."),
            },
            Command::Policy(name) => match name.parse::<Policy>() {
                Ok(policy) => {
                    self.config.set_policy(policy);
                    println!("Replacement policy set to: {policy}");
                }
                Err(e) => println!("{e}"),
            },
            Command::Output("") => {
                self.settings.reset_output();
                println!("Output file set to: {}", self.settings.output.display());
            }
            Command::Output(path) => {
                self.settings.output = PathBuf::from(path);
                println!("Output file set to: {path}");
            }
            Command::Reset => {
                self.config.reset_to_default();
                println!("Configuration reset to default.");
            }
            Command::Config => println!("{}\n{}", self.settings, self.config),
            Command::Explain("") | Command::Near("") => println!("Expected a word."),
            Command::Explain(word) => println!("{}", self.simplifier.explain(word, &self.config)),
            Command::Near(word) => {
                let metric = self.config.primary_metric().unwrap_or(Metric::Cosine);
                print_nearest(self.words, word, metric, 10);
            }
            Command::Help => println!("{HELP}"),
            Command::Unknown(name) => println!("Unknown command ':{name}', try :help"),
            Command::Quit => {}
        }
    }
}

fn print_nearest(words: &WordVectors, word: &str, metric: Metric, n: usize) {
    let Some(topn) = words.nearest_common(word, metric, n) else {
        println!("'{word}' is out of vocabulary");
        return;
    };
    println!("{:>4} {:>10} Word ({metric})", "Rank", "Score");
    println!("{}", "-".repeat(30));
    for (i, (idx, score)) in topn.iter().enumerate() {
        println!("{:4}: {:10.6} {}", i + 1, score, words.get_word(*idx));
    }
}

fn load_tables(settings: &Settings) -> Result<WordVectors> {
    let (Some(embeddings), Some(vocabulary)) = (&settings.embeddings, &settings.vocabulary) else {
        bail!("missing {}", settings.missing().join(" and "));
    };

    let mut words = WordVectors::new();
    let report = words
        .load_embeddings(embeddings)
        .context("loading word embeddings")?;
    if report.skipped > 0 {
        tracing::warn!("skipped {} malformed embedding lines", report.skipped);
    }
    words
        .load_vocabulary(vocabulary)
        .context("loading common words")?;

    if words.is_empty() {
        bail!("no word embeddings found in {}", embeddings.display());
    }
    if words.common_len() == 0 {
        bail!("no common words found in {}", vocabulary.display());
    }
    Ok(words)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings {
        embeddings: Some(cli.embeddings),
        vocabulary: Some(cli.vocabulary),
        output: cli.output,
    };
    let words = load_tables(&settings)?;

    let time_str = Local::now().format("%x - %I:%M.%S%p");
    eprintln!(
        "{time_str}, {} embeddings ({} dims), {} common words",
        words.len(),
        words.dims(),
        words.common_len()
    );

    let config = ReplacementConfig::new(cli.metrics, cli.policy);
    let simplifier = match cli.seed {
        Some(seed) => Simplifier::seeded(&words, seed),
        None => Simplifier::new(&words),
    };
    let mut shell = Shell {
        simplifier,
        words: &words,
        config,
        settings,
    };

    if let Some(text) = cli.text {
        shell.simplify(&text);
    } else if let Some(input) = cli.input {
        let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("reading {}", input.display()))?;
            shell.simplify(&line);
        }
    } else {
        shell.run()?;
    }

    Ok(())
}
