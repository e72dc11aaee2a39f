//! End-to-end: tokenize, pad, train, evaluate, checkpoint.

use wordbag::model::{ClassifierConfig, EncoderConfig, TextClassifier};
use wordbag::padding::{pad_sequences, Truncating};
use wordbag::train::{evaluate, fit, TrainingConfig};
use wordbag::{ConfusionMatrix, WordTokenizer};

const SPACE: [&str; 6] = ["orbit", "shuttle", "launch", "nasa", "moon", "rocket"];
const AUTOS: [&str; 6] = ["engine", "brake", "clutch", "sedan", "tires", "dealer"];
const FILLER: [&str; 4] = ["the", "a", "of", "and"];
const MAX_LEN: usize = 12;

/// Two topics with disjoint keywords and shared filler words
fn corpus(n: usize) -> (Vec<String>, Vec<usize>) {
    let mut texts = Vec::new();
    let mut labels = Vec::new();
    for i in 0..n {
        let label = i % 2;
        let words = if label == 0 { &SPACE } else { &AUTOS };
        let len = 4 + i % 5;
        let text: Vec<&str> = (0..len)
            .map(|j| {
                if j % 3 == 2 {
                    FILLER[(i + j) % FILLER.len()]
                } else {
                    words[(i * 7 + j * 3) % words.len()]
                }
            })
            .collect();
        texts.push(text.join(" "));
        labels.push(label);
    }
    (texts, labels)
}

fn prepare(n: usize) -> (WordTokenizer, Vec<Vec<usize>>, Vec<usize>) {
    let (texts, labels) = corpus(n);
    let mut tokenizer = WordTokenizer::new(None);
    tokenizer.fit_on_texts(&texts);
    let x = pad_sequences(&tokenizer.texts_to_sequences(&texts), MAX_LEN, Truncating::Pre);
    (tokenizer, x, labels)
}

fn config(tokenizer: &WordTokenizer, encoder: EncoderConfig) -> ClassifierConfig {
    ClassifierConfig {
        vocab_size: tokenizer.vocab_size(),
        embedding_dim: 8,
        max_len: MAX_LEN,
        num_classes: 2,
        encoder,
        ..ClassifierConfig::default()
    }
}

fn training(epochs: usize) -> TrainingConfig {
    TrainingConfig {
        epochs,
        batch_size: 8,
        learning_rate: 0.05,
        validation_split: 0.2,
        verbose: false,
        ..TrainingConfig::default()
    }
}

#[test]
fn averaged_model_separates_topics() {
    let (tokenizer, x, y) = prepare(100);
    let mut model = TextClassifier::new(config(&tokenizer, EncoderConfig::Average)).unwrap();
    let history = fit(&mut model, &x, &y, &training(40)).unwrap();
    assert!(history.last().unwrap().val_accuracy.unwrap() >= 0.9);

    let (test_texts, test_labels) = corpus(30);
    let x_test = pad_sequences(&tokenizer.texts_to_sequences(&test_texts), MAX_LEN, Truncating::Pre);
    let eval = evaluate(&model, &x_test, &test_labels, 16).unwrap();
    assert!(eval.accuracy >= 0.9, "accuracy {}", eval.accuracy);

    let predictions = model.predict(&x_test).unwrap();
    let cm = ConfusionMatrix::new(&predictions, &test_labels, 2);
    assert_eq!(cm.total(), 30);
    assert!((cm.accuracy() - eval.accuracy).abs() < 1e-6);
}

#[test]
fn masked_average_model_trains() {
    let (tokenizer, x, y) = prepare(100);
    let mut model = TextClassifier::new(config(&tokenizer, EncoderConfig::MaskedAverage)).unwrap();
    let history = fit(&mut model, &x, &y, &training(30)).unwrap();
    assert!(history.last().unwrap().accuracy >= 0.9);
}

#[test]
fn convolutional_model_loss_decreases() {
    let (tokenizer, x, y) = prepare(60);
    let mut cfg = config(
        &tokenizer,
        EncoderConfig::Convolution {
            filters: 6,
            kernel_size: 3,
        },
    );
    cfg.hidden_units = Some(8);
    cfg.dropout_rate = 0.2;
    let mut model = TextClassifier::new(cfg).unwrap();
    let train_config = TrainingConfig {
        learning_rate: 0.01,
        grad_clip: Some(5.0),
        ..training(15)
    };
    let history = fit(&mut model, &x, &y, &train_config).unwrap();
    let losses = history.losses();
    assert!(losses[losses.len() - 1] < losses[0]);
}

#[test]
fn checkpoint_round_trip_gives_identical_predictions() {
    let (tokenizer, x, y) = prepare(40);
    let mut model = TextClassifier::new(config(&tokenizer, EncoderConfig::Average)).unwrap();
    fit(&mut model, &x, &y, &training(3)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifier.ckpt");
    model.save(&path).unwrap();
    let restored = TextClassifier::load(&path).unwrap();

    assert_eq!(restored.predict_proba(&x).unwrap(), model.predict_proba(&x).unwrap());
    assert_eq!(restored.summary(), model.summary());
}

#[test]
fn frozen_embedding_unchanged_by_training() {
    let (tokenizer, x, y) = prepare(40);
    let mut cfg = config(&tokenizer, EncoderConfig::Average);
    cfg.trainable_embeddings = false;
    let mut model = TextClassifier::new(cfg).unwrap();
    let before = model.embedding_weights().clone();
    let output_before = model.parameters().last().map(|t| (*t).clone());

    fit(&mut model, &x, &y, &training(3)).unwrap();

    assert_eq!(model.embedding_weights(), &before);
    assert_ne!(model.parameters().last().map(|t| (*t).clone()), output_before);
}

#[test]
fn analytic_gradients_match_finite_differences() {
    let (tokenizer, x, y) = prepare(6);
    let mut model = TextClassifier::new(config(&tokenizer, EncoderConfig::Average)).unwrap();

    let loss_of = |model: &TextClassifier| {
        let (probs, _) = model.forward(&x, None).unwrap();
        model.compute_loss(&probs, &y)
    };

    let (_, cache) = model.forward(&x, None).unwrap();
    let grads = model.backward(&y, &cache);
    let analytic: Vec<Vec<f32>> = grads.tensors().iter().map(|t| t.data.clone()).collect();

    // Embedding row of the first word of the first document, then the head
    let first_word = x[0][0];
    let dim = model.config().embedding_dim;
    let checks: Vec<(usize, usize)> = (0..dim)
        .map(|j| (0, first_word * dim + j))
        .chain((0..6).map(|i| (1, i)))
        .chain((0..2).map(|i| (2, i)))
        .collect();

    let eps = 1e-2;
    for (param, idx) in checks {
        let original = model.trainable_parameters_mut()[param].data[idx];

        model.trainable_parameters_mut()[param].data[idx] = original + eps;
        let plus = loss_of(&model);
        model.trainable_parameters_mut()[param].data[idx] = original - eps;
        let minus = loss_of(&model);
        model.trainable_parameters_mut()[param].data[idx] = original;

        let numeric = (plus - minus) / (2.0 * eps);
        let exact = analytic[param][idx];
        assert!(
            (numeric - exact).abs() < 2e-3,
            "param {} index {}: numeric {} vs analytic {}",
            param,
            idx,
            numeric,
            exact
        );
    }
}
