//! Greedy autoregressive caption decoding.
//!
//! Starting from the start sentinel, each step re-encodes the caption so far,
//! pads it to the model's sequence width, asks the model for the next-word
//! distribution and appends the most probable word. Decoding stops on the end
//! sentinel or after `max_length` steps, so a model that never emits the end
//! sentinel still finishes in bounded time.

use crate::config::DecodingConfig;
use crate::error::{CaptionError, CaptionResult};
use crate::math::{argmax, pad_left};
use crate::model::CaptionModel;
use crate::tokenizer::{Tokenizer, PAD_INDEX};
use crate::types::{Caption, StopReason};

/// Greedy (argmax) decoder. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct GreedyDecoder {
    max_length: usize,
    sequence_width: usize,
    start_token: String,
    end_token: String,
}

impl GreedyDecoder {
    pub fn new(config: &DecodingConfig) -> Self {
        Self {
            max_length: config.max_length,
            sequence_width: config.sequence_width,
            start_token: config.start_token.clone(),
            end_token: config.end_token.clone(),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn sequence_width(&self) -> usize {
        self.sequence_width
    }

    /// Decode a caption for one image feature vector.
    ///
    /// Performs at most `max_length` model invocations. Any tokenizer or model
    /// failure aborts decoding and is returned as is.
    pub fn decode(
        &self,
        model: &dyn CaptionModel,
        tokenizer: &Tokenizer,
        feature: &[f32],
    ) -> CaptionResult<Caption> {
        let mut buffer = self.start_token.clone();
        let mut generated: Vec<String> = Vec::new();
        let mut stop_reason = StopReason::StepBudget;
        let mut steps = 0;

        while steps < self.max_length {
            let sequence = tokenizer.encode(&buffer)?;
            let padded = pad_left(&sequence, self.sequence_width, PAD_INDEX);

            let probabilities = model.predict(feature, &padded)?;
            steps += 1;

            let index = argmax(&probabilities).ok_or_else(|| CaptionError::Model {
                message: "Model returned an empty distribution".to_string(),
            })?;
            let word = tokenizer.decode_index(index)?;
            tracing::trace!(step = steps, index, word, "Decoded next word");

            buffer.push(' ');
            buffer.push_str(word);

            if word == self.end_token {
                stop_reason = StopReason::EndToken;
                break;
            }
            generated.push(word.to_string());
        }

        // The end sentinel never reaches `generated`; a start sentinel the
        // model predicted mid-caption is dropped here.
        let words: Vec<String> = generated
            .into_iter()
            .filter(|w| *w != self.start_token)
            .collect();

        tracing::debug!(
            steps,
            ?stop_reason,
            words = words.len(),
            "Greedy decoding finished"
        );

        Ok(Caption {
            words,
            steps,
            stop_reason,
        })
    }
}
