pub mod optimizer;
pub mod policies;
pub mod selector;
pub mod tensors;
