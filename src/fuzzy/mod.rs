pub mod similarity;

pub use similarity::{suggest, BigramDice, Similarity, Suggestion};
