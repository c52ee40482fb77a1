use burn::{
    module::Module,
    nn::{conv::Conv1d, loss::CrossEntropyLossConfig, Dropout, Embedding, Linear},
    tensor::{
        activation::{relu, softmax},
        backend::Backend,
        Int, Tensor,
    },
    train::ClassificationOutput,
};
use derive_new::new;

use crate::pipelines::text_classification::batcher;

/// A convolutional classifier over token embeddings
#[derive(Module, Debug, new)]
pub struct Model<B: Backend> {
    /// The token embedding table
    pub embedding: Embedding<B>,

    /// One convolution per configured kernel width
    pub convs: Vec<Conv1d<B>>,

    /// Dense hidden layer over the concatenated pooled features
    pub fc1: Linear<B>,

    /// Dropout applied after the hidden layer, training only
    pub dropout: Dropout,

    /// Linear layer producing one score per class
    pub fc2: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Embed, convolve, and max-pool a batch of token sequences into one
    /// feature vector per sequence
    fn pooled_features(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        // Conv1d expects [batch_size, channels, seq_length]
        let embedded = self.embedding.forward(tokens).swap_dims(1, 2);

        let pooled: Vec<Tensor<B, 2>> = self
            .convs
            .iter()
            .map(|conv| {
                let activated = relu(conv.forward(embedded.clone()));

                activated.max_dim(2).squeeze(2)
            })
            .collect();

        Tensor::cat(pooled, 1)
    }

    /// Defines forward pass for training
    pub fn forward(
        &self,
        input: batcher::Infer<B>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let features = self.pooled_features(input.tokens);

        let hidden = self.dropout.forward(relu(self.fc1.forward(features)));
        let output = self.fc2.forward(hidden);

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// Defines forward pass for inference
    pub fn infer(&self, input: batcher::Infer<B>) -> Tensor<B, 2> {
        let features = self.pooled_features(input.tokens);

        let hidden = relu(self.fc1.forward(features));
        let output = self.fc2.forward(hidden);

        softmax(output, 1)
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{ndarray::NdArrayDevice, NdArray},
        tensor::Data,
    };
    use pretty_assertions::assert_eq;

    use crate::models::cnn;

    use super::*;

    fn config() -> cnn::Config {
        cnn::Config::new_with_labels(
            16,
            &["computer-vision".to_string(), "nlp".to_string()],
        )
    }

    fn tokens(device: &NdArrayDevice) -> Tensor<NdArray, 2, Int> {
        Tensor::from_data(
            Data::from([[2, 3, 4, 5, 0, 0], [6, 7, 0, 0, 0, 0]]).convert(),
            device,
        )
    }

    #[test]
    fn infer_produces_a_probability_distribution() {
        let device = NdArrayDevice::default();
        let model = config().init::<NdArray>(&device);

        let probabilities = model.infer(batcher::Infer::new(tokens(&device)));

        assert_eq!(probabilities.dims(), [2, 2]);

        let values = probabilities.into_data().convert::<f32>().value;

        for value in &values {
            assert!(*value >= 0.0);
        }

        for row in values.chunks(2) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn forward_computes_a_finite_loss() {
        let device = NdArrayDevice::default();
        let model = config().init::<NdArray>(&device);

        let targets: Tensor<NdArray, 1, Int> =
            Tensor::from_data(Data::from([0, 1]).convert(), &device);

        let output = model.forward(batcher::Infer::new(tokens(&device)), targets);

        assert_eq!(output.output.dims(), [2, 2]);

        let loss: f64 = output.loss.into_scalar().into();
        assert!(loss.is_finite());
    }
}
