// src/lib.rs

pub mod core;
pub mod error;
pub mod fuzzy;
pub mod persistence;
pub mod runtime;
pub mod c_api;
pub use crate::core::engine::CategoryEngine;
pub use crate::core::types::{Category, Classification, MatchStage};
pub use crate::core::vocabulary::Vocabulary;
