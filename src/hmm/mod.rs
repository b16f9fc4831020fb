pub mod hmm1;
pub mod model;
pub mod tagger;
pub mod trainer;

pub use hmm1::{
    model::{EmissionTable, HmmModel, State, TransitionTable, START},
    tagger::HmmTagger,
};
pub use model::Model;
pub use tagger::{Tagger, Tagging};
pub use trainer::{train, HmmTrainer};
