use std::collections::BTreeMap;

use burn::{
    data::dataloader,
    tensor::{backend::Backend, Data, ElementConversion, Int, Tensor},
};
use derive_new::new;

use crate::{tokenizer::WordVocab, utils::tensors::pad_to};

use super::{config, Item};

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Tokenized text as 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Classifier input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching text classification items
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Vocabulary for converting text to token IDs
    pub vocab: WordVocab,

    /// Fixed sequence length for tokenized text
    pub max_seq_length: usize,

    /// ID of the padding token
    pub pad_token_id: usize,

    /// A mapping from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,

    /// A mapping from class name labels to class ids
    pub label2id: BTreeMap<String, usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(vocab: WordVocab, config: config::Config, device: B::Device) -> Self {
        Self {
            vocab,
            pad_token_id: config.pad_token_id,
            max_seq_length: config.max_seq_length,
            id2label: config.id2label,
            label2id: config.label2id,
            device,
        }
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<String, Infer<B>> for Batcher<B> {
    /// Collects a vector of texts into an inference batch
    fn batch(&self, items: Vec<String>) -> Infer<B> {
        let mut token_ids_list = Vec::with_capacity(items.len());

        // Tokenize text for each item
        for input in items {
            let token_ids = self.vocab.encode(&input).expect("unable to encode");

            token_ids_list.push(token_ids);
        }

        let tokens = pad_to(
            self.pad_token_id,
            token_ids_list,
            self.max_seq_length,
            &self.device,
        );

        // Create and return inference batch
        Infer { tokens }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend, I: Item> dataloader::batcher::Batcher<I, Train<B>> for Batcher<B> {
    /// Collects a vector of text classification items into a training batch
    fn batch(&self, items: Vec<I>) -> Train<B> {
        let batch_size = items.len();

        let inputs = items.iter().map(|item| item.input().to_string()).collect();
        let input: Infer<B> = self.batch(inputs);

        let mut class_id_list = Vec::with_capacity(batch_size);

        // Create a class_id tensor for each item; labels outside the
        // configured set map to class 0
        for item in &items {
            let class_id = self.label2id.get(item.class_label()).copied().unwrap_or(0);

            class_id_list.push(Tensor::from_data(
                Data::from([(class_id as i64).elem()]),
                &self.device,
            ));
        }

        let targets = Tensor::cat(class_id_list, 0);

        // Create and return training batch
        Train { input, targets }
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{ndarray::NdArrayDevice, NdArray},
        data::dataloader::batcher::Batcher as _,
    };
    use pretty_assertions::assert_eq;

    use crate::tokenizer::{PAD_ID, UNK_ID};

    use super::*;

    fn batcher(max_seq_length: usize) -> Batcher<NdArray> {
        let corpus = vec![
            "transformers for text classification".to_string(),
            "convolutional networks for text".to_string(),
        ];
        let vocab = WordVocab::build(&corpus, None, 1).unwrap();

        let id2label = BTreeMap::from([(0, "a".to_string()), (1, "b".to_string())]);
        let label2id = BTreeMap::from([("a".to_string(), 0), ("b".to_string(), 1)]);

        Batcher::new(
            vocab,
            config::Config {
                pad_token_id: PAD_ID,
                max_seq_length,
                id2label,
                label2id,
            },
            NdArrayDevice::default(),
        )
    }

    #[test]
    fn pads_every_sequence_to_the_fixed_length() {
        let batcher = batcher(6);

        let batch: Infer<NdArray> = batcher.batch(vec![
            "text classification".to_string(),
            "transformers".to_string(),
        ]);

        assert_eq!(batch.tokens.dims(), [2, 6]);

        let values = batch.tokens.into_data().convert::<i64>().value;

        // The tail of each row is padding
        assert_eq!(values[2..6], [PAD_ID as i64; 4]);
        assert_eq!(values[7..12], [PAD_ID as i64; 5]);
    }

    #[test]
    fn truncates_sequences_beyond_the_fixed_length() {
        let batcher = batcher(2);

        let batch: Infer<NdArray> =
            batcher.batch(vec!["convolutional networks for text".to_string()]);

        assert_eq!(batch.tokens.dims(), [1, 2]);
    }

    #[test]
    fn encodes_unknown_words_as_unk() {
        let batcher = batcher(3);

        let batch: Infer<NdArray> = batcher.batch(vec!["zyzzyva".to_string()]);

        let values = batch.tokens.into_data().convert::<i64>().value;

        assert_eq!(values[0], UNK_ID as i64);
    }

    #[test]
    fn builds_targets_from_class_labels() {
        #[derive(Clone, Debug)]
        struct TestItem(&'static str, &'static str);

        impl Item for TestItem {
            fn input(&self) -> &str {
                self.0
            }

            fn class_label(&self) -> &str {
                self.1
            }
        }

        let batcher = batcher(4);

        let batch: Train<NdArray> = batcher.batch(vec![
            TestItem("text classification", "b"),
            TestItem("transformers", "a"),
        ]);

        assert_eq!(
            batch.targets.into_data().convert::<i64>().value,
            vec![1, 0]
        );
    }
}
