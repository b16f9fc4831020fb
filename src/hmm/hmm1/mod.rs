//! First-order hidden Markov model.

mod context;
pub mod model;
pub mod tagger;
