pub mod builder;
pub mod classifier;
pub mod engine;
pub mod normalizer;
pub mod types;
pub mod vocabulary;
