//! Cat-vs-Dog Classifier Model
//!
//! A convolutional network with a single sigmoid-activated output unit.
//! Four conv blocks extract features, global average pooling collapses the
//! spatial dimensions (so both 204x204 training crops and 224x224 evaluation
//! images are accepted), and a small fully connected head produces one logit.

use std::path::Path;

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    record::CompactRecorder,
    tensor::{activation, backend::Backend, ElementConversion, Int, Tensor},
};

use crate::utils::error::Error;

/// Configuration for the CatDogClassifier CNN model
#[derive(Config, Debug)]
pub struct CatDogClassifierConfig {
    /// Dropout rate for the classifier head
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,
}

/// A CNN block with Conv2d, BatchNorm, ReLU, and MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
    pub relu: Relu,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Binary cat/dog classifier
///
/// Architecture:
/// - 4 convolutional blocks with increasing filter counts
/// - BatchNorm and ReLU after each convolution, MaxPooling per block
/// - Global average pooling
/// - Fully connected head with dropout, single output unit
#[derive(Module, Debug)]
pub struct CatDogClassifier<B: Backend> {
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,
    pub conv4: ConvBlock<B>,

    pub global_pool: AdaptiveAvgPool2d,

    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc2: Linear<B>,
}

impl<B: Backend> CatDogClassifier<B> {
    /// Create a new classifier from configuration
    pub fn new(config: &CatDogClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        // Convolutional blocks: 3 -> 32 -> 64 -> 128 -> 256
        let conv1 = ConvBlock::new(config.in_channels, base, device);
        let conv2 = ConvBlock::new(base, base * 2, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 8, 128).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(128, 1).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
            fc1,
            dropout,
            fc2,
        }
    }

    /// Forward pass producing sigmoid probabilities.
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Probability of the positive class (cat), shape [batch_size], in [0, 1]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 1> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // Global pooling: [B, C, H, W] -> [B, C, 1, 1]
        let x = self.global_pool.forward(x);

        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        let logits = self.fc2.forward(x);

        activation::sigmoid(logits).squeeze(1)
    }

    /// Persist the model record, overwriting any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::utils::error::Result<()> {
        self.clone()
            .save_file(path.as_ref(), &CompactRecorder::new())
            .map_err(|e| Error::CheckpointFormat(e.to_string()))
    }

    /// Load a model record saved by [`CatDogClassifier::save`].
    ///
    /// The architecture must match the saved record; a shape mismatch or an
    /// undecodable file fails with [`Error::CheckpointFormat`].
    pub fn load<P: AsRef<Path>>(self, path: P, device: &B::Device) -> crate::utils::error::Result<Self> {
        self.load_file(path.as_ref(), &CompactRecorder::new(), device)
            .map_err(|e| Error::CheckpointFormat(e.to_string()))
    }
}

/// Mean binary cross-entropy over a batch of sigmoid probabilities.
///
/// Probabilities are clamped away from 0 and 1 before the logarithm to keep
/// the loss finite.
pub fn binary_cross_entropy<B: Backend>(
    probs: Tensor<B, 1>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let p = probs.clamp(eps, 1.0 - eps);
    let y = targets.float();

    let positive = y.clone() * p.clone().log();
    let negative = (y.neg().add_scalar(1.0)) * (p.neg().add_scalar(1.0)).log();

    (positive + negative).mean().neg()
}

/// Fraction of thresholded predictions matching the targets, on a 0-100
/// scale. A probability of at least 0.5 predicts the positive class (cat).
pub fn accuracy<B: Backend>(probs: Tensor<B, 1>, targets: Tensor<B, 1, Int>) -> f64 {
    let total = probs.dims()[0];
    if total == 0 {
        return 0.0;
    }

    let predictions = probs.greater_equal_elem(0.5).int();
    let correct: i64 = predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem();

    100.0 * correct as f64 / total as f64
}
