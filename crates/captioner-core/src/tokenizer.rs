//! Word-level vocabulary used by the caption model.
//!
//! The vocabulary is the word index a Keras `Tokenizer` built during training.
//! Text normalization mirrors that tokenizer (lowercasing, filter characters
//! replaced by the split string, empty pieces dropped) so that encoding here
//! produces the same indices the model saw while training.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::OovPolicy;
use crate::error::{AssetError, CaptionError, CaptionResult};

/// Characters the Keras tokenizer strips by default.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Index reserved for padding. Never maps to a word.
pub const PAD_INDEX: i64 = 0;

/// Text normalization settings carried by the tokenizer artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSettings {
    pub filters: String,
    pub lower: bool,
    pub split: String,
    /// Only indices below this limit are produced by `encode`.
    pub num_words: Option<usize>,
    pub oov_token: Option<String>,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            filters: DEFAULT_FILTERS.to_string(),
            lower: true,
            split: " ".to_string(),
            num_words: None,
            oov_token: None,
        }
    }
}

/// Bidirectional word <-> index mapping.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    word_index: HashMap<String, i64>,
    index_word: HashMap<i64, String>,
    settings: TextSettings,
    oov_policy: OovPolicy,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WordIndexField {
    /// `to_json()` stores the mapping as an embedded JSON string
    Encoded(String),
    Map(HashMap<String, i64>),
}

#[derive(Deserialize)]
struct KerasTokenizerConfig {
    num_words: Option<usize>,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    oov_token: Option<String>,
    word_index: WordIndexField,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenizerFile {
    Keras { config: KerasTokenizerConfig },
    Plain(HashMap<String, i64>),
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_lower() -> bool {
    true
}

fn default_split() -> String {
    " ".to_string()
}

impl Tokenizer {
    /// Load a tokenizer from disk.
    ///
    /// Accepts either the JSON written by Keras `Tokenizer.to_json()` or a
    /// plain `{"word": index}` object (which gets default text settings).
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }

        let asset_err = |message: String| AssetError::Tokenizer {
            path: path.to_path_buf(),
            message,
        };

        tracing::info!("Loading tokenizer from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| asset_err(e.to_string()))?;
        let file: TokenizerFile = serde_json::from_str(&content)
            .map_err(|e| asset_err(format!("Unrecognized tokenizer format: {e}")))?;

        let tokenizer = match file {
            TokenizerFile::Plain(word_index) => {
                Self::from_word_index(word_index, TextSettings::default()).map_err(asset_err)?
            }
            TokenizerFile::Keras { config } => {
                if config.char_level {
                    return Err(asset_err(
                        "Character-level tokenizers are not supported".to_string(),
                    ));
                }
                let word_index = match config.word_index {
                    WordIndexField::Map(map) => map,
                    WordIndexField::Encoded(text) => serde_json::from_str(&text)
                        .map_err(|e| asset_err(format!("Invalid embedded word_index: {e}")))?,
                };
                let settings = TextSettings {
                    filters: config.filters,
                    lower: config.lower,
                    split: config.split,
                    num_words: config.num_words,
                    oov_token: config.oov_token,
                };
                Self::from_word_index(word_index, settings).map_err(asset_err)?
            }
        };

        tracing::info!("Loaded vocabulary of {} words", tokenizer.len());
        Ok(tokenizer)
    }

    /// Build a tokenizer from a word index.
    ///
    /// Indices must be positive and unique; 0 is reserved for padding.
    pub fn from_word_index(
        word_index: HashMap<String, i64>,
        settings: TextSettings,
    ) -> Result<Self, String> {
        if settings.split.is_empty() {
            return Err("Split string must not be empty".to_string());
        }

        let mut index_word = HashMap::with_capacity(word_index.len());
        for (word, &index) in &word_index {
            if index <= PAD_INDEX {
                return Err(format!(
                    "Word {word:?} has index {index}; indices must be positive"
                ));
            }
            if let Some(existing) = index_word.insert(index, word.clone()) {
                return Err(format!(
                    "Index {index} is assigned to both {existing:?} and {word:?}"
                ));
            }
        }

        if let Some(oov) = &settings.oov_token {
            if !word_index.contains_key(oov) {
                return Err(format!("OOV token {oov:?} is not in the vocabulary"));
            }
        }

        Ok(Self {
            word_index,
            index_word,
            settings,
            oov_policy: OovPolicy::default(),
        })
    }

    /// Set how words without an index are handled by `encode`.
    pub fn with_oov_policy(mut self, policy: OovPolicy) -> Self {
        self.oov_policy = policy;
        self
    }

    pub fn oov_policy(&self) -> OovPolicy {
        self.oov_policy
    }

    pub fn settings(&self) -> &TextSettings {
        &self.settings
    }

    /// Split text into normalized words.
    pub fn words(&self, text: &str) -> Vec<String> {
        let text = if self.settings.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let translated: String = text
            .chars()
            .map(|c| {
                if self.settings.filters.contains(c) {
                    self.settings.split.clone()
                } else {
                    c.to_string()
                }
            })
            .collect();
        translated
            .split(self.settings.split.as_str())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Encode text into vocabulary indices.
    pub fn encode(&self, text: &str) -> CaptionResult<Vec<i64>> {
        let oov_index = self
            .settings
            .oov_token
            .as_ref()
            .and_then(|t| self.word_index.get(t).copied());

        let mut sequence = Vec::new();
        for word in self.words(text) {
            match self.index_of(&word) {
                Some(index) => sequence.push(index),
                None => match self.oov_policy {
                    OovPolicy::Error => return Err(CaptionError::OutOfVocabulary { word }),
                    OovPolicy::Drop => {
                        if let Some(index) = oov_index {
                            sequence.push(index);
                        }
                    }
                },
            }
        }
        Ok(sequence)
    }

    /// Index of a word, honoring the `num_words` limit.
    pub fn index_of(&self, word: &str) -> Option<i64> {
        let index = *self.word_index.get(word)?;
        match self.settings.num_words {
            Some(limit) if index as usize >= limit => None,
            _ => Some(index),
        }
    }

    /// Inverse lookup of a predicted index.
    pub fn decode_index(&self, index: usize) -> CaptionResult<&str> {
        i64::try_from(index)
            .ok()
            .and_then(|i| self.index_word.get(&i))
            .map(String::as_str)
            .ok_or(CaptionError::UnknownIndex { index })
    }

    /// Number of words in the vocabulary.
    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }

    /// Size of the model's output layer: largest index plus one (for padding).
    pub fn vocab_size(&self) -> usize {
        self.index_word.keys().max().map_or(1, |&max| max as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(words: &[&str]) -> HashMap<String, i64> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i as i64 + 1))
            .collect()
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::from_word_index(
            vocab(&["startseq", "endseq", "a", "dog", "runs", "on", "grass"]),
            TextSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_maps_words_to_indices() {
        let t = tokenizer();
        assert_eq!(t.encode("startseq a dog runs").unwrap(), vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_encode_normalizes_case_and_punctuation() {
        let t = tokenizer();
        assert_eq!(t.encode("A Dog, runs!").unwrap(), vec![3, 4, 5]);
        assert_eq!(t.encode("  dog\truns  ").unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_encode_drops_unknown_words_by_default() {
        let t = tokenizer();
        assert_eq!(t.encode("a cat runs").unwrap(), vec![3, 5]);
    }

    #[test]
    fn test_encode_error_policy_rejects_unknown_words() {
        let t = tokenizer().with_oov_policy(OovPolicy::Error);
        let err = t.encode("a cat runs").unwrap_err();
        assert_eq!(
            err,
            CaptionError::OutOfVocabulary {
                word: "cat".to_string()
            }
        );
    }

    #[test]
    fn test_encode_uses_oov_token_when_present() {
        let settings = TextSettings {
            oov_token: Some("<unk>".to_string()),
            ..TextSettings::default()
        };
        let t = Tokenizer::from_word_index(vocab(&["<unk>", "a", "dog"]), settings).unwrap();
        assert_eq!(t.encode("a cat").unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_num_words_limits_encoding() {
        let settings = TextSettings {
            num_words: Some(4),
            ..TextSettings::default()
        };
        let t = Tokenizer::from_word_index(vocab(&["a", "dog", "runs", "far"]), settings).unwrap();
        assert_eq!(t.encode("a dog runs far").unwrap(), vec![1, 2, 3]);
        // Decoding is not limited.
        assert_eq!(t.decode_index(4).unwrap(), "far");
    }

    #[test]
    fn test_round_trip_in_vocabulary_words() {
        let t = tokenizer();
        let caption = "a dog runs on grass";
        let decoded: Vec<&str> = t
            .encode(caption)
            .unwrap()
            .into_iter()
            .map(|i| t.decode_index(i as usize).unwrap())
            .collect();
        assert_eq!(decoded.join(" "), caption);
    }

    #[test]
    fn test_decode_unknown_index() {
        let t = tokenizer();
        assert_eq!(
            t.decode_index(0).unwrap_err(),
            CaptionError::UnknownIndex { index: 0 }
        );
        assert!(t.decode_index(99).is_err());
    }

    #[test]
    fn test_rejects_duplicate_and_zero_indices() {
        let mut word_index = vocab(&["a", "b"]);
        word_index.insert("c".to_string(), 1);
        assert!(Tokenizer::from_word_index(word_index, TextSettings::default()).is_err());

        let word_index = HashMap::from([("pad".to_string(), 0)]);
        assert!(Tokenizer::from_word_index(word_index, TextSettings::default()).is_err());
    }

    #[test]
    fn test_vocab_size() {
        assert_eq!(tokenizer().vocab_size(), 8);
    }

    #[test]
    fn test_load_keras_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let word_index = serde_json::to_string(&vocab(&["startseq", "endseq", "dog"])).unwrap();
        let doc = serde_json::json!({
            "class_name": "Tokenizer",
            "config": {
                "num_words": null,
                "filters": DEFAULT_FILTERS,
                "lower": true,
                "split": " ",
                "char_level": false,
                "oov_token": null,
                "document_count": 3,
                "word_index": word_index,
            }
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let t = Tokenizer::load(&path).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.encode("startseq dog").unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_load_plain_word_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, r#"{"startseq": 1, "endseq": 2}"#).unwrap();

        let t = Tokenizer::load(&path).unwrap();
        assert_eq!(t.index_of("endseq"), Some(2));
        assert_eq!(t.settings(), &TextSettings::default());
    }

    #[test]
    fn test_load_rejects_char_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        let doc = serde_json::json!({
            "config": { "char_level": true, "word_index": {"a": 1} }
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = Tokenizer::load(&path).unwrap_err();
        assert!(err.to_string().contains("Character-level"));
    }
}
