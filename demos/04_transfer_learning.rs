//! Transfer Learning with GloVe
//!
//! Initializes the classifier's embedding table from pre-trained GloVe
//! vectors instead of random values. By default the table is frozen and only
//! the layers above it learn; `--fine-tune` lets it move too.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example 04_transfer_learning -- \
//!     --data data/20news-bydate --glove data/glove.6B.100d.txt
//!
//! cargo run --release --example 04_transfer_learning -- \
//!     --data data/20news-bydate --glove data/glove.6B.100d.txt --conv --fine-tune
//! ```
//!
//! Words the GloVe file doesn't know keep an all-zero row, as does the
//! padding index.

use clap::Parser;
use wordbag::dataset::{NewsgroupsLoader, Remove, Subset};
use wordbag::model::{ClassifierConfig, EncoderConfig, TextClassifier};
use wordbag::padding::{pad_sequences, Truncating};
use wordbag::train::{evaluate, fit, TrainingConfig};
use wordbag::{build_embedding_matrix, PretrainedEmbeddings, WordTokenizer};

#[derive(Parser)]
#[command(name = "04_transfer_learning", about = "Classify newsgroups on top of GloVe")]
struct Args {
    /// Directory containing 20news-bydate-train/ and 20news-bydate-test/
    #[arg(long, default_value = "data/20news-bydate")]
    data: String,

    /// GloVe text file; its dimension sets the embedding size
    #[arg(long, default_value = "data/glove.6B.100d.txt")]
    glove: String,

    #[arg(long, default_value_t = 20_000)]
    num_words: usize,

    #[arg(long, default_value_t = 1000)]
    max_len: usize,

    /// Convolutional encoder instead of averaging
    #[arg(long)]
    conv: bool,

    /// Keep training the embedding table
    #[arg(long)]
    fine_tune: bool,

    #[arg(long, default_value_t = 10)]
    epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    lr: f32,

    /// Strip headers, signatures and quoted replies
    #[arg(long)]
    clean: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("\n{}", "=".repeat(70));
    println!("  Transfer Learning: GloVe Embeddings for 20 Newsgroups");
    println!("{}", "=".repeat(70));

    let remove = if args.clean { Remove::all() } else { Remove::default() };
    let loader = NewsgroupsLoader::new(&args.data)
        .with_remove(remove)
        .with_shuffle(Some(args.seed));
    let train = loader.load(Subset::Train)?;
    let test = loader.load(Subset::Test)?;

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

    let glove = PretrainedEmbeddings::load(&args.glove)?;
    println!("\nGloVe: {} words, {} dimensions", glove.len(), glove.dim());

    let transfer = build_embedding_matrix(&tokenizer, &glove, args.num_words);
    println!(
        "{} of {} vocabulary words found ({:.1}%)",
        transfer.words_found,
        args.num_words - 1,
        transfer.coverage() * 100.0
    );

    let base = if args.conv {
        ClassifierConfig {
            encoder: EncoderConfig::Convolution {
                filters: 128,
                kernel_size: 5,
            },
            hidden_units: Some(128),
            dropout_rate: 0.5,
            ..ClassifierConfig::glove(glove.dim())
        }
    } else {
        ClassifierConfig::glove(glove.dim())
    };
    let config = ClassifierConfig {
        vocab_size: args.num_words,
        max_len: args.max_len,
        num_classes: train.num_classes(),
        trainable_embeddings: args.fine_tune,
        seed: args.seed,
        ..base
    };
    let mut model = TextClassifier::with_pretrained_embeddings(config, transfer.matrix)?;
    println!("\n{}", model.summary());

    let training = TrainingConfig {
        epochs: args.epochs,
        learning_rate: args.lr,
        seed: args.seed,
        ..TrainingConfig::default()
    };
    println!("{}", "-".repeat(70));
    fit(&mut model, &x_train, &train.labels(), &training)?;
    println!("{}", "-".repeat(70));

    let result = evaluate(&model, &x_test, &test.labels(), 128)?;
    println!("\nTest loss: {:.4}", result.loss);
    println!("Test accuracy: {:.4}", result.accuracy);
    Ok(())
}
