use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Pad or truncate each token sequence to a fixed length, filling the tail of
/// short sequences with the padding token
pub fn pad_to<B: Backend>(
    pad_token: usize,
    tokens_list: Vec<Vec<usize>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = tokens_list.len();

    let mut tensor = Tensor::zeros([batch_size, seq_length], device);
    tensor = tensor.add_scalar(pad_token as i64);

    for (index, mut tokens) in tokens_list.into_iter().enumerate() {
        tokens.truncate(seq_length);

        let token_count = tokens.len();

        if token_count == 0 {
            continue;
        }

        tensor = tensor.slice_assign(
            [index..index + 1, 0..token_count],
            Tensor::from_data(
                Data::new(
                    tokens.into_iter().map(|e| (e as i64).elem()).collect(),
                    Shape::new([1, token_count]),
                ),
                device,
            ),
        );
    }

    tensor
}

#[cfg(test)]
mod tests {
    use burn::backend::{ndarray::NdArrayDevice, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pads_short_sequences_with_the_pad_token() {
        let device = NdArrayDevice::default();

        let tensor = pad_to::<NdArray>(0, vec![vec![5, 6], vec![7]], 4, &device);

        assert_eq!(tensor.dims(), [2, 4]);
        assert_eq!(
            tensor.into_data().convert::<i64>().value,
            vec![5, 6, 0, 0, 7, 0, 0, 0]
        );
    }

    #[test]
    fn truncates_long_sequences() {
        let device = NdArrayDevice::default();

        let tensor = pad_to::<NdArray>(0, vec![vec![1, 2, 3, 4, 5]], 3, &device);

        assert_eq!(tensor.into_data().convert::<i64>().value, vec![1, 2, 3]);
    }

    #[test]
    fn handles_empty_sequences() {
        let device = NdArrayDevice::default();

        let tensor = pad_to::<NdArray>(9, vec![vec![]], 2, &device);

        assert_eq!(tensor.into_data().convert::<i64>().value, vec![9, 9]);
    }
}
