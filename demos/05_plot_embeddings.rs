//! Plot GloVe Vectors in Two Dimensions
//!
//! Projects the first (most frequent) words of a GloVe file onto their two
//! principal components and writes a labelled SVG scatter plot. Related
//! words such as numbers, months or country names end up near each other.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example 05_plot_embeddings -- --glove data/glove.6B.50d.txt
//! cargo run --release --example 05_plot_embeddings -- \
//!     --glove data/glove.6B.50d.txt --points 300 --output glove_300.svg
//! ```

use clap::Parser;
use wordbag::projection::{plot_embeddings, MAX_PLOT_POINTS};
use wordbag::PretrainedEmbeddings;

#[derive(Parser)]
#[command(name = "05_plot_embeddings", about = "2-D plot of GloVe word vectors")]
struct Args {
    #[arg(long, default_value = "data/glove.6B.50d.txt")]
    glove: String,

    /// Words to plot (capped at 1000)
    #[arg(long, default_value_t = 500)]
    points: usize,

    #[arg(long, default_value = "embeddings.svg")]
    output: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("\n{}", "=".repeat(70));
    println!("  Word Vectors in 2-D");
    println!("{}", "=".repeat(70));

    if args.points > MAX_PLOT_POINTS {
        println!("\nOnly the first {} words will be drawn", MAX_PLOT_POINTS);
    }

    // Only the plotted words are needed
    let limit = args.points.min(MAX_PLOT_POINTS);
    let glove = PretrainedEmbeddings::load_limited(&args.glove, Some(limit))?;
    let drawn = plot_embeddings(&glove, args.points, &args.output)?;

    println!("\nDrew {} words to {}", drawn, args.output);
    Ok(())
}
