use anyhow::{Context, Result};
use clap::Parser;
use simplify_rs::{Metric, WordVectors};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rank the common words nearest to a word", long_about = None)]
struct Args {
    #[arg(long, value_name = "FILE", default_value = "vectors.txt")]
    embeddings: PathBuf,

    #[arg(long, value_name = "FILE", default_value = "google-1000.txt")]
    vocabulary: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Metric::Cosine)]
    metric: Metric,

    /// Number of words to list
    #[arg(short = 'n', long, default_value_t = 30)]
    top: usize,
}

fn get_input() -> io::Result<String> {
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut word_vectors = WordVectors::new();
    word_vectors
        .load_embeddings(&args.embeddings)
        .context("loading word embeddings")?;
    word_vectors
        .load_vocabulary(&args.vocabulary)
        .context("loading common words")?;

    println!("Near Words Tool ({}) - Type 'EXIT' to quit\n", args.metric);
    loop {
        println!("\nRanking the common words nearest to a word.");
        print!("Enter 1 or more words: ");
        io::stdout().flush()?;
        let s = get_input()?;
        if s == "EXIT" {
            println!("Goodbye!");
            break;
        }
        let words: Vec<&str> = s.split_whitespace().collect();
        if words.is_empty() {
            println!("No words were input. Try again");
            continue;
        }

        for word in words {
            let Some(topn) = word_vectors.nearest_common(word, args.metric, args.top) else {
                println!("'{word}' is out of vocabulary");
                continue;
            };

            println!("\nNearest common words to '{word}':");
            println!("{:>4} {:>10} Word", "Rank", "Score");
            println!("{}", "-".repeat(30));

            for (i, (idx, score)) in topn.iter().enumerate() {
                println!(
                    "{:4}: {:10.6} {}",
                    i + 1,
                    score,
                    word_vectors.get_word(*idx)
                );
            }
        }
    }

    Ok(())
}
