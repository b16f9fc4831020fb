//! Part-of-speech tagging with a first-order hidden Markov model.
//!
//! Train once with [`HmmTrainer`] (or [`hmm::train`]), then decode any
//! number of sentences with an [`HmmTagger`] borrowing the trained
//! [`HmmModel`].
//!
//! ```
//! use hmmtag::{HmmTrainer, Model, Params, Tagger};
//!
//! let mut trainer = HmmTrainer::new(Params::default());
//! trainer.append(&["DET", "N"], &["the", "dog"]).unwrap();
//! trainer.append(&["N", "V"], &["dogs", "bark"]).unwrap();
//! let model = trainer.train().unwrap();
//!
//! let tagger = model.tagger(Params::default());
//! let tagging = tagger.tag(&["The", "dog"]).unwrap();
//! assert_eq!(tagging.labels, ["DET", "N"]);
//! ```

pub mod dataset;
pub mod errors;
pub mod evaluation;
pub mod hmm;
pub mod params;
pub mod quark;

pub use dataset::{read_sentences, Dataset, Sequence};
pub use errors::{Error, Result};
pub use evaluation::{Estimation, Evaluation};
pub use hmm::{HmmModel, HmmTagger, HmmTrainer, Model, State, Tagger, Tagging};
pub use params::{DeadStatePolicy, Params};
