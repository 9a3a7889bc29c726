//! Benchmarks for greedy caption decoding.
//!
//! Run with: cargo bench -p captioner-core

use std::collections::HashMap;

use captioner_core::config::DecodingConfig;
use captioner_core::math::{argmax, pad_left};
use captioner_core::tokenizer::TextSettings;
use captioner_core::{CaptionModel, CaptionResult, GreedyDecoder, Tokenizer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const VOCAB_SIZE: usize = 8485;

/// Never predicts the end sentinel, so every decode runs the full budget.
struct CyclingModel;

impl CaptionModel for CyclingModel {
    fn predict(&self, _feature: &[f32], sequence: &[i64]) -> CaptionResult<Vec<f32>> {
        let last = *sequence.last().unwrap_or(&0) as usize;
        let mut probabilities = vec![0.0; VOCAB_SIZE];
        probabilities[3 + (last + 1) % (VOCAB_SIZE - 3)] = 1.0;
        Ok(probabilities)
    }
}

fn tokenizer() -> Tokenizer {
    let mut word_index: HashMap<String, i64> = HashMap::new();
    word_index.insert("startseq".to_string(), 1);
    word_index.insert("endseq".to_string(), 2);
    for i in 3..VOCAB_SIZE {
        word_index.insert(format!("word{i}"), i as i64);
    }
    Tokenizer::from_word_index(word_index, TextSettings::default()).unwrap()
}

fn benchmark_full_budget_decode(c: &mut Criterion) {
    let decoder = GreedyDecoder::new(&DecodingConfig::default());
    let tokenizer = tokenizer();
    let feature = vec![0.1f32; 4096];

    c.bench_function("greedy_decode_34_steps", |b| {
        b.iter(|| {
            let _ = decoder.decode(&CyclingModel, black_box(&tokenizer), black_box(&feature));
        })
    });
}

fn benchmark_argmax(c: &mut Criterion) {
    let probabilities: Vec<f32> = (0..VOCAB_SIZE).map(|i| (i % 97) as f32).collect();

    c.bench_function("argmax_vocab", |b| {
        b.iter(|| argmax(black_box(&probabilities)))
    });
}

fn benchmark_encode_and_pad(c: &mut Criterion) {
    let tokenizer = tokenizer();
    let text = (3..37)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ");

    c.bench_function("encode_and_pad", |b| {
        b.iter(|| {
            let sequence = tokenizer.encode(black_box(&text)).unwrap();
            pad_left(&sequence, 35, 0)
        })
    });
}

criterion_group!(
    benches,
    benchmark_full_budget_decode,
    benchmark_argmax,
    benchmark_encode_and_pad,
);
criterion_main!(benches);
