//! Word-level vocabulary tokenization
//!
//! The vocabulary is built from the training corpus and fixed afterwards. It
//! is persisted in the Hugging Face `tokenizer.json` format so the exact same
//! encoding is available again at serving time.

use std::{collections::HashMap, path::Path};

use serde_json::json;
use tokenizers::Tokenizer;

/// The padding token
pub static PAD_TOKEN: &str = "[PAD]";

/// The unknown-word token
pub static UNK_TOKEN: &str = "[UNK]";

/// The id of the padding token
pub const PAD_ID: usize = 0;

/// The id of the unknown-word token
pub const UNK_ID: usize = 1;

/// Vocabulary Error
#[derive(thiserror::Error, Debug)]
pub enum VocabError {
    /// The tokenizer definition could not be assembled or parsed
    #[error("unable to build tokenizer: {0}")]
    Build(String),

    /// The tokenizer file could not be read or written
    #[error("unable to persist tokenizer: {0}")]
    Persist(String),

    /// Text could not be encoded
    #[error("unable to encode text: {0}")]
    Encode(String),

    /// Token ids could not be decoded
    #[error("unable to decode ids: {0}")]
    Decode(String),
}

/// A word-level vocabulary mapping tokens to integer ids, fixed after
/// training
#[derive(Clone)]
pub struct WordVocab {
    tokenizer: Tokenizer,
}

impl WordVocab {
    /// Build the vocabulary from a training corpus
    ///
    /// Words are lowercased and split on whitespace. Ids are assigned by
    /// descending corpus frequency, ties broken lexicographically, after the
    /// reserved `[PAD]` and `[UNK]` entries.
    pub fn build(
        corpus: &[String],
        max_size: Option<usize>,
        min_frequency: usize,
    ) -> Result<Self, VocabError> {
        let mut freq: HashMap<String, usize> = HashMap::new();

        for text in corpus {
            for word in text.to_lowercase().split_whitespace() {
                *freq.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(_, count)| *count >= min_frequency)
            .collect();

        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if let Some(max_size) = max_size {
            words.truncate(max_size.saturating_sub(2));
        }

        let mut vocab = serde_json::Map::new();
        vocab.insert(PAD_TOKEN.to_string(), json!(PAD_ID));
        vocab.insert(UNK_TOKEN.to_string(), json!(UNK_ID));

        for (id, (word, _)) in words.into_iter().enumerate() {
            vocab.insert(word, json!(id + 2));
        }

        Self::from_vocab(serde_json::Value::Object(vocab))
    }

    // Assemble a full `tokenizer.json` document around the vocabulary and
    // parse it back into a tokenization pipeline. Writing the document
    // directly sidesteps the trainer APIs, which are built around subword
    // models rather than fixed word-level vocabularies.
    fn from_vocab(vocab: serde_json::Value) -> Result<Self, VocabError> {
        let definition = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {
                    "id": PAD_ID,
                    "content": PAD_TOKEN,
                    "single_word": false,
                    "lstrip": false,
                    "rstrip": false,
                    "normalized": false,
                    "special": true
                },
                {
                    "id": UNK_ID,
                    "content": UNK_TOKEN,
                    "single_word": false,
                    "lstrip": false,
                    "rstrip": false,
                    "normalized": false,
                    "special": true
                }
            ],
            "normalizer": {"type": "Lowercase"},
            "pre_tokenizer": {"type": "WhitespaceSplit"},
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tokenizer =
            serde_json::from_value(definition).map_err(|e| VocabError::Build(e.to_string()))?;

        Ok(Self { tokenizer })
    }

    /// Load a previously saved vocabulary
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VocabError> {
        let tokenizer =
            Tokenizer::from_file(path.as_ref()).map_err(|e| VocabError::Persist(e.to_string()))?;

        Ok(Self { tokenizer })
    }

    /// Save the vocabulary beside the other run artifacts
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), VocabError> {
        self.tokenizer
            .save(path.as_ref(), true)
            .map_err(|e| VocabError::Persist(e.to_string()))
    }

    /// Encode text into token ids
    pub fn encode(&self, text: &str) -> Result<Vec<usize>, VocabError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| VocabError::Encode(e.to_string()))?;

        Ok(encoding.get_ids().iter().map(|id| *id as usize).collect())
    }

    /// Return the token strings of a text, as the model sees them
    pub fn tokens(&self, text: &str) -> Result<Vec<String>, VocabError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| VocabError::Encode(e.to_string()))?;

        Ok(encoding.get_tokens().to_vec())
    }

    /// Decode token ids back into text, skipping special tokens
    pub fn decode(&self, ids: &[usize]) -> Result<String, VocabError> {
        let ids: Vec<u32> = ids.iter().map(|id| *id as u32).collect();

        self.tokenizer
            .decode(&ids, true)
            .map_err(|e| VocabError::Decode(e.to_string()))
    }

    /// The number of entries in the vocabulary, special tokens included;
    /// this is the row count of the embedding matrix
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(false)
    }

    /// The id of the padding token
    pub fn pad_token_id(&self) -> usize {
        PAD_ID
    }

    /// The id of the unknown-word token
    pub fn unk_token_id(&self) -> usize {
        UNK_ID
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "Transfer learning with transformers for text classification".to_string(),
            "Generative adversarial networks for image synthesis".to_string(),
            "Text classification with convolutional networks".to_string(),
        ]
    }

    #[test]
    fn round_trips_in_vocabulary_text() {
        let vocab = WordVocab::build(&corpus(), None, 1).unwrap();

        let text = "text classification with convolutional networks";
        let ids = vocab.encode(text).unwrap();
        let decoded = vocab.decode(&ids).unwrap();

        assert_eq!(decoded, text);
    }

    #[test]
    fn lowercases_before_lookup() {
        let vocab = WordVocab::build(&corpus(), None, 1).unwrap();

        assert_eq!(
            vocab.encode("Text Classification").unwrap(),
            vocab.encode("text classification").unwrap(),
        );
    }

    #[test]
    fn maps_out_of_vocabulary_words_to_unk() {
        let vocab = WordVocab::build(&corpus(), None, 1).unwrap();

        let ids = vocab.encode("quantum chromodynamics").unwrap();

        assert_eq!(ids, vec![vocab.unk_token_id(), vocab.unk_token_id()]);
    }

    #[test]
    fn reserves_the_pad_and_unk_ids() {
        let vocab = WordVocab::build(&corpus(), None, 1).unwrap();

        assert_eq!(vocab.pad_token_id(), 0);
        assert_eq!(vocab.unk_token_id(), 1);

        let ids = vocab.encode("text").unwrap();
        assert!(ids[0] > 1);
    }

    #[test]
    fn caps_the_vocabulary_size() {
        let vocab = WordVocab::build(&corpus(), Some(4), 1).unwrap();

        assert_eq!(vocab.vocab_size(), 4);
    }

    #[test]
    fn drops_words_below_the_minimum_frequency() {
        let vocab = WordVocab::build(&corpus(), None, 2).unwrap();

        // "generative" only appears once in the corpus
        let ids = vocab.encode("generative text").unwrap();

        assert_eq!(ids[0], vocab.unk_token_id());
        assert!(ids[1] > 1);
    }

    #[test]
    fn reloads_to_an_identical_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");

        let vocab = WordVocab::build(&corpus(), None, 1).unwrap();
        vocab.save(&path).unwrap();

        let reloaded = WordVocab::from_file(&path).unwrap();

        let text = "transfer learning for image synthesis";
        assert_eq!(
            vocab.encode(text).unwrap(),
            reloaded.encode(text).unwrap(),
        );
        assert_eq!(vocab.vocab_size(), reloaded.vocab_size());
    }
}
