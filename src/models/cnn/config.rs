use std::collections::BTreeMap;

use burn::{
    module::Module,
    nn::{conv::Conv1dConfig, DropoutConfig, EmbeddingConfig, LinearConfig, PaddingConfig1d},
    tensor::backend::Backend,
};

use crate::utils::classes::invert_map;

use super::{conv_outputs::ConvOutputs, model::Model};

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct Config {
    /// Size of the vocabulary, padding and unknown tokens included
    pub vocab_size: usize,

    /// Size of a token embedding
    #[config(default = 100)]
    pub embedding_dim: usize,

    /// The kernel widths of the parallel convolutions, in tokens
    #[config(default = "vec![2, 3, 4]")]
    pub filter_sizes: Vec<usize>,

    /// Number of filters per convolution width
    #[config(default = 50)]
    pub num_filters: usize,

    /// Size of the dense hidden layer
    #[config(default = 100)]
    pub hidden_dim: usize,

    /// The dropout probability applied after the hidden layer during training
    #[config(default = 0.1)]
    pub dropout: f64,

    /// Index of the padding token
    #[config(default = 0)]
    pub pad_token_id: usize,

    /// Fixed sequence length inputs are padded or truncated to
    #[config(default = 128)]
    pub max_seq_length: usize,

    /// Keep the embedding matrix fixed during training
    #[config(default = false)]
    pub freeze_embeddings: bool,

    /// A map from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,

    /// A reverse map from class name labels to class ids
    pub label2id: BTreeMap<String, usize>,
}

impl Config {
    /// Create a configuration from the class labels of a dataset
    pub fn new_with_labels(vocab_size: usize, labels: &[String]) -> Self {
        let id2label: BTreeMap<usize, String> = labels
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.trim().to_string()))
            .collect();

        let label2id = invert_map(id2label.clone());

        Config::new(vocab_size, id2label, label2id)
    }

    /// Initializes the classifier with default weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);

        if self.freeze_embeddings {
            embedding = embedding.no_grad();
        }

        let n_classes = self.id2label.len();

        Model {
            embedding,
            convs: self.init_convs(device),
            fc1: LinearConfig::new(self.num_filters * self.filter_sizes.len(), self.hidden_dim)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(self.hidden_dim, n_classes).init(device),
            n_classes,
        }
    }

    /// Initializes the activation model with default weights
    pub fn init_conv_outputs<B: Backend>(&self, device: &B::Device) -> ConvOutputs<B> {
        ConvOutputs {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            convs: self.init_convs(device),
        }
    }

    fn init_convs<B: Backend>(&self, device: &B::Device) -> Vec<burn::nn::conv::Conv1d<B>> {
        self.filter_sizes
            .iter()
            .map(|&width| {
                Conv1dConfig::new(self.embedding_dim, self.num_filters, width)
                    .with_padding(PaddingConfig1d::Same)
                    .init(device)
            })
            .collect()
    }
}
