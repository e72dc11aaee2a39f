//! Tokenize and Pad the 20 Newsgroups Corpus
//!
//! Loads the training split, fits a word tokenizer on it, and shows what the
//! documents look like as index sequences before and after padding.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example 01_tokenize_and_pad -- --data data/20news-bydate
//! cargo run --release --example 01_tokenize_and_pad -- --data data/20news-bydate --max-len 500
//! ```
//!
//! ## Prerequisites
//!
//! Unpack `20news-bydate.tar.gz` so that `<data>/20news-bydate-train/` exists.

use clap::Parser;
use wordbag::dataset::{NewsgroupsLoader, Remove, Subset};
use wordbag::padding::{pad_sequences, sequence_length_stats, Truncating};
use wordbag::WordTokenizer;

#[derive(Parser)]
#[command(name = "01_tokenize_and_pad", about = "Tokenize and pad 20 Newsgroups")]
struct Args {
    /// Directory containing 20news-bydate-train/ and 20news-bydate-test/
    #[arg(long, default_value = "data/20news-bydate")]
    data: String,

    /// Vocabulary cap (indices below this are kept)
    #[arg(long, default_value_t = 20_000)]
    num_words: usize,

    /// Padded sequence length
    #[arg(long, default_value_t = 1000)]
    max_len: usize,

    /// Strip headers, signatures and quoted replies
    #[arg(long)]
    clean: bool,

    /// Save the fitted tokenizer as JSON
    #[arg(long)]
    save: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("\n{}", "=".repeat(70));
    println!("  Tokenizing 20 Newsgroups");
    println!("{}", "=".repeat(70));

    let remove = if args.clean { Remove::all() } else { Remove::default() };
    let train = NewsgroupsLoader::new(&args.data)
        .with_remove(remove)
        .load(Subset::Train)?;

    println!("\n{} documents, {} categories:", train.len(), train.num_classes());
    for (name, count) in train.target_names.iter().zip(train.class_counts()) {
        println!("  {:<28} {:>5}", name, count);
    }

    let texts = train.texts();
    let mut tokenizer = WordTokenizer::new(Some(args.num_words));
    tokenizer.fit_on_texts(&texts);
    let stats = tokenizer.stats();
    println!(
        "\nFound {} unique tokens ({} words total), keeping {} indices",
        stats.distinct_words, stats.total_words, stats.vocab_size
    );

    let sequences = tokenizer.texts_to_sequences(&texts);
    let lengths = sequence_length_stats(&sequences, args.max_len);
    println!(
        "Sequence length: mean {:.1}, max {}, {:.1}% longer than {}",
        lengths.mean,
        lengths.max,
        lengths.truncated_fraction * 100.0,
        args.max_len
    );

    let padded = pad_sequences(&sequences, args.max_len, Truncating::Pre);
    println!("\nPadded tensor shape: [{}, {}]", padded.len(), args.max_len);

    if let (Some(doc), Some(seq)) = (train.documents.first(), padded.first()) {
        let preview: String = doc.text.chars().take(200).collect();
        println!("\nFirst document ({}):\n{}", doc.label_name, preview);
        println!("\nFirst 20 indices: {:?}", &seq[..seq.len().min(20)]);
        let decoded = tokenizer.sequences_to_texts(&[seq.clone()]);
        let words: Vec<&str> = decoded[0].split(' ').take(20).collect();
        println!("Decoded back:     {}", words.join(" "));
    }

    if let Some(path) = args.save {
        tokenizer.save(&path)?;
        println!("\nTokenizer saved to {}", path);
    }
    Ok(())
}
