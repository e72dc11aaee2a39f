//! GloVe file loading, similarity queries and the transfer-learning matrix.

use std::fmt::Write as _;

use wordbag::model::{ClassifierConfig, TextClassifier};
use wordbag::padding::{pad_sequences, Truncating};
use wordbag::projection::plot_embeddings;
use wordbag::{build_embedding_matrix, PretrainedEmbeddings, WordTokenizer};

const DIM: usize = 6;

/// 30 words with deterministic, pairwise non-parallel vectors
fn glove_text() -> String {
    let mut text = String::new();
    for w in 0..30 {
        write!(text, "word{}", w).unwrap();
        for d in 0..DIM {
            let v = ((w + 1) as f32 * (d + 1) as f32 * 0.37).sin();
            write!(text, " {:.4}", v).unwrap();
        }
        text.push('\n');
    }
    text
}

fn load() -> (tempfile::TempDir, PretrainedEmbeddings) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glove.test.6d.txt");
    std::fs::write(&path, glove_text()).unwrap();
    let glove = PretrainedEmbeddings::load(&path).unwrap();
    (dir, glove)
}

#[test]
fn top_ten_is_sorted_and_exact() {
    let (_dir, glove) = load();
    assert_eq!(glove.len(), 30);
    assert_eq!(glove.dim(), DIM);

    for word in ["word0", "word7", "word29"] {
        let neighbors = glove.most_similar(word, 10).unwrap();
        assert_eq!(neighbors.len(), 10);
        assert_eq!(neighbors[0].word, word);
        assert!((neighbors[0].similarity - 1.0).abs() < 1e-5);
        assert!(neighbors
            .windows(2)
            .all(|pair| pair[0].similarity >= pair[1].similarity));
    }
    assert!(glove.get("python").is_none());
}

#[test]
fn load_limited_reads_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glove.txt");
    std::fs::write(&path, glove_text()).unwrap();
    let glove = PretrainedEmbeddings::load_limited(&path, Some(5)).unwrap();
    assert_eq!(glove.len(), 5);
    assert_eq!(glove.word(4), Some("word4"));
}

#[test]
fn transfer_matrix_matches_vocabulary() {
    let (_dir, glove) = load();
    let texts = [
        "word3 word3 word3 unknownword word5",
        "word5 word9 unknownword unknownword",
    ];
    let mut tokenizer = WordTokenizer::new(None);
    tokenizer.fit_on_texts(&texts);

    let max_words = 4;
    let transfer = build_embedding_matrix(&tokenizer, &glove, max_words);
    assert_eq!(transfer.matrix.shape, vec![max_words, DIM]);
    assert!(transfer.words_found < max_words);
    assert!(transfer.matrix.row(0).iter().all(|&v| v == 0.0));

    for (word, &index) in tokenizer.word_index() {
        if index >= max_words {
            continue;
        }
        match glove.get(word) {
            Some(vector) => assert_eq!(transfer.matrix.row(index), vector),
            None => assert!(transfer.matrix.row(index).iter().all(|&v| v == 0.0)),
        }
    }

    let config = ClassifierConfig {
        vocab_size: max_words,
        max_len: 5,
        num_classes: 2,
        ..ClassifierConfig::glove(DIM)
    };
    let model = TextClassifier::with_pretrained_embeddings(config, transfer.matrix.clone()).unwrap();
    assert!(!model.embeddings_trainable());
    assert_eq!(model.embedding_weights(), &transfer.matrix);
}

#[test]
fn encode_pad_decode_keeps_vocabulary_tokens() {
    let texts = ["The shuttle reached orbit.", "Orbit, shuttle; the moon!"];
    let mut tokenizer = WordTokenizer::new(None);
    tokenizer.fit_on_texts(&texts);

    let sequences = tokenizer.texts_to_sequences(&["the moon and the shuttle"]);
    let padded = pad_sequences(&sequences, 8, Truncating::Pre);
    assert_eq!(padded[0].len(), 8);
    assert!(!tokenizer.word_index().values().any(|&i| i == 0));

    let decoded = tokenizer.sequences_to_texts(&padded);
    // "and" was never seen, so it is dropped
    assert_eq!(decoded[0], "the moon the shuttle");
}

#[test]
fn plot_caps_points() {
    let (dir, glove) = load();
    let path = dir.path().join("words.svg");
    let drawn = plot_embeddings(&glove, 5000, &path).unwrap();
    assert_eq!(drawn, 30);
    let svg = std::fs::read_to_string(&path).unwrap();
    assert_eq!(svg.matches("<circle").count(), 30);
    assert!(svg.contains("word17"));
}
