/// Tensor Utilities
pub mod tensors;

/// Renderer Utilities
pub mod renderer;

/// Utilities for classification tasks
pub mod classes;
