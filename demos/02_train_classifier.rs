//! Train a Newsgroup Classifier
//!
//! The full pipeline on 20 Newsgroups: tokenize, pad, train an
//! averaged-embedding (or convolutional) classifier, then report test
//! accuracy and a per-class breakdown.
//!
//! ## Usage
//!
//! ```bash
//! # Bag-of-embeddings baseline
//! cargo run --release --example 02_train_classifier -- --data data/20news-bydate
//!
//! # Convolutional encoder, cleaned text, metrics logged to CSV
//! cargo run --release --example 02_train_classifier -- \
//!     --data data/20news-bydate --conv --clean --log training_log.csv
//! ```
//!
//! ## What to Expect
//!
//! With the defaults (20 000 words, 50 dimensions, 1000 tokens) the averaged
//! model reaches roughly 0.7 to 0.8 test accuracy after 10 epochs. The first
//! epoch's loss should start near ln 20 ≈ 3.0.

use clap::Parser;
use wordbag::dataset::{NewsgroupsLoader, Remove, Subset};
use wordbag::model::{ClassifierConfig, EncoderConfig, TextClassifier};
use wordbag::padding::{pad_sequences, Truncating};
use wordbag::train::{evaluate, fit, TrainingConfig};
use wordbag::{ConfusionMatrix, WordTokenizer};

#[derive(Parser)]
#[command(name = "02_train_classifier", about = "Train a 20 Newsgroups classifier")]
struct Args {
    /// Directory containing 20news-bydate-train/ and 20news-bydate-test/
    #[arg(long, default_value = "data/20news-bydate")]
    data: String,

    /// Vocabulary size, including the padding index
    #[arg(long, default_value_t = 20_000)]
    num_words: usize,

    /// Padded sequence length
    #[arg(long, default_value_t = 1000)]
    max_len: usize,

    /// Embedding dimension
    #[arg(long, default_value_t = 50)]
    dim: usize,

    /// Use the convolutional encoder instead of averaging
    #[arg(long)]
    conv: bool,

    /// Average only over real tokens (ignore padding)
    #[arg(long, conflicts_with = "conv")]
    masked: bool,

    #[arg(long, default_value_t = 10)]
    epochs: usize,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    lr: f32,

    /// Strip headers, signatures and quoted replies
    #[arg(long)]
    clean: bool,

    /// Write per-epoch metrics to this CSV file
    #[arg(long)]
    log: Option<String>,

    /// Save the trained model to this checkpoint
    #[arg(long)]
    save: Option<String>,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("\n{}", "=".repeat(70));
    println!("  20 Newsgroups: Text Classification with Word Embeddings");
    println!("{}", "=".repeat(70));

    // Data
    let remove = if args.clean { Remove::all() } else { Remove::default() };
    let loader = NewsgroupsLoader::new(&args.data)
        .with_remove(remove)
        .with_shuffle(Some(args.seed));
    let train = loader.load(Subset::Train)?;
    let test = loader.load(Subset::Test)?;
    println!(
        "\n{} training / {} test documents, {} classes",
        train.len(),
        test.len(),
        train.num_classes()
    );

    let mut tokenizer = WordTokenizer::new(Some(args.num_words));
    tokenizer.fit_on_texts(&train.texts());
    let x_train = pad_sequences(
        &tokenizer.texts_to_sequences(&train.texts()),
        args.max_len,
        Truncating::Pre,
    );
    let x_test = pad_sequences(
        &tokenizer.texts_to_sequences(&test.texts()),
        args.max_len,
        Truncating::Pre,
    );
    let (y_train, y_test) = (train.labels(), test.labels());

    // Model
    let base = if args.conv {
        ClassifierConfig::convolutional()
    } else {
        ClassifierConfig::default()
    };
    let encoder = if args.masked {
        EncoderConfig::MaskedAverage
    } else {
        base.encoder
    };
    let config = ClassifierConfig {
        vocab_size: args.num_words,
        embedding_dim: args.dim,
        max_len: args.max_len,
        num_classes: train.num_classes(),
        encoder,
        seed: args.seed,
        ..base
    };
    let mut model = TextClassifier::new(config)?;
    println!("\n{}", model.summary());

    // Training
    let training = TrainingConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.lr,
        seed: args.seed,
        log_path: args.log.clone(),
        ..TrainingConfig::default()
    };
    println!("{}", "-".repeat(70));
    let history = fit(&mut model, &x_train, &y_train, &training)?;
    println!("{}", "-".repeat(70));

    if let Some(best) = history.best_epoch() {
        println!(
            "Best epoch {}: val_loss {:.4}, val_acc {:.4}",
            best.epoch,
            best.val_loss.unwrap_or(f32::NAN),
            best.val_accuracy.unwrap_or(f32::NAN)
        );
    }

    // Evaluation
    let result = evaluate(&model, &x_test, &y_test, 128)?;
    println!("\nTest loss: {:.4}", result.loss);
    println!("Test accuracy: {:.4}", result.accuracy);

    let predictions = model.predict(&x_test)?;
    let confusion = ConfusionMatrix::new(&predictions, &y_test, train.num_classes());
    println!("\n{}", confusion.report(&train.target_names));

    if let Some(path) = args.save {
        model.save(&path)?;
        println!("Model saved to {}", path);
    }
    Ok(())
}
