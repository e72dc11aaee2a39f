//! Explore Pre-trained GloVe Vectors
//!
//! Loads a GloVe text file and prints the nearest neighbours of a few words
//! by cosine similarity, plus an optional analogy query.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example 03_word_similarity -- --glove data/glove.6B.100d.txt
//! cargo run --release --example 03_word_similarity -- \
//!     --glove data/glove.6B.100d.txt --words frog,france,computer --top 5
//! cargo run --release --example 03_word_similarity -- \
//!     --glove data/glove.6B.100d.txt --analogy man,king,woman
//! ```
//!
//! ## Prerequisites
//!
//! `glove.6B.zip` from the Stanford NLP site, unpacked. `--max-words` keeps
//! only the most frequent entries, which loads much faster.

use clap::Parser;
use wordbag::embeddings::{cosine_similarity, PretrainedEmbeddings};

#[derive(Parser)]
#[command(name = "03_word_similarity", about = "Nearest neighbours in GloVe space")]
struct Args {
    /// GloVe text file (word followed by its vector on each line)
    #[arg(long, default_value = "data/glove.6B.100d.txt")]
    glove: String,

    /// Comma-separated query words
    #[arg(long, value_delimiter = ',', default_value = "frog,king,computer,baseball")]
    words: Vec<String>,

    /// Neighbours to show per word
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Load only the first N words of the file
    #[arg(long)]
    max_words: Option<usize>,

    /// Three words a,b,c: find ? in "a is to b as c is to ?"
    #[arg(long, value_delimiter = ',', num_args = 3)]
    analogy: Option<Vec<String>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("\n{}", "=".repeat(70));
    println!("  GloVe Word Similarity");
    println!("{}", "=".repeat(70));

    let glove = PretrainedEmbeddings::load_limited(&args.glove, args.max_words)?;
    println!("\nLoaded {} words, {} dimensions", glove.len(), glove.dim());

    for word in &args.words {
        println!("\n{}", "-".repeat(70));
        match glove.most_similar(word, args.top) {
            Some(neighbors) => {
                println!("Nearest to '{}':", word);
                for (rank, n) in neighbors.iter().enumerate() {
                    println!("  {:2}. {:<20} {:.4}", rank + 1, n.word, n.similarity);
                }
            }
            None => println!("'{}' is not in the vocabulary", word),
        }
    }

    // Pairwise similarity of the query words
    let known: Vec<&String> = args.words.iter().filter(|w| glove.contains(w)).collect();
    if known.len() > 1 {
        println!("\n{}", "-".repeat(70));
        println!("Pairwise cosine similarity:");
        for (i, a) in known.iter().enumerate() {
            for b in &known[i + 1..] {
                if let (Some(va), Some(vb)) = (glove.get(a), glove.get(b)) {
                    println!("  {:<12} {:<12} {:.4}", a, b, cosine_similarity(va, vb));
                }
            }
        }
    }

    if let Some(words) = args.analogy {
        if let [a, b, c] = words.as_slice() {
            println!("\n{}", "-".repeat(70));
            match glove.analogy(a, b, c, args.top.min(5)) {
                Some(answers) => {
                    println!("{} is to {} as {} is to:", a, b, c);
                    for n in answers {
                        println!("  {:<20} {:.4}", n.word, n.similarity);
                    }
                }
                None => println!("analogy words must all be in the vocabulary"),
            }
        }
    }
    Ok(())
}
