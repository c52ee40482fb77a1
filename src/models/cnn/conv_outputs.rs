use burn::{
    module::Module,
    nn::{conv::Conv1d, Embedding},
    tensor::{activation::relu, backend::Backend, Int, Tensor},
};

use super::model::Model;

/// Exposes the raw per-filter convolution activations of the classifier,
/// without pooling, for downstream visualization
#[derive(Module, Debug)]
pub struct ConvOutputs<B: Backend> {
    /// The token embedding table
    pub embedding: Embedding<B>,

    /// One convolution per configured kernel width
    pub convs: Vec<Conv1d<B>>,
}

impl<B: Backend> ConvOutputs<B> {
    /// Copy the embedding and convolution parameters out of a trained
    /// classifier
    pub fn from_classifier(model: &Model<B>) -> Self {
        Self {
            embedding: model.embedding.clone(),
            convs: model.convs.clone(),
        }
    }

    /// One activation map per configured kernel width, each of shape
    /// `[batch_size, num_filters, seq_length]`
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Vec<Tensor<B, 3>> {
        let embedded = self.embedding.forward(tokens).swap_dims(1, 2);

        self.convs
            .iter()
            .map(|conv| relu(conv.forward(embedded.clone())))
            .collect()
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

    #[test]
    fn produces_one_activation_map_per_filter_width() {
        let device = NdArrayDevice::default();

        let config = cnn::Config::new_with_labels(16, &["a".to_string(), "b".to_string()]);
        let model = config.init_conv_outputs::<NdArray>(&device);

        let tokens: Tensor<NdArray, 2, Int> =
            Tensor::from_data(Data::from([[2, 3, 4, 5, 0, 0]]).convert(), &device);

        let maps = model.forward(tokens);

        assert_eq!(maps.len(), config.filter_sizes.len());

        for map in maps {
            assert_eq!(map.dims(), [1, config.num_filters, 6]);
        }
    }

    #[test]
    fn copies_the_classifier_parameters() {
        let device = NdArrayDevice::default();

        let config = cnn::Config::new_with_labels(16, &["a".to_string(), "b".to_string()]);
        let classifier = config.init::<NdArray>(&device);
        let model = ConvOutputs::from_classifier(&classifier);

        let weights = classifier.embedding.weight.val().into_data().value;
        let copied = model.embedding.weight.val().into_data().value;

        assert_eq!(weights, copied);
    }
}
