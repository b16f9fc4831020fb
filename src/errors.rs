//! Definition of errors.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A tag sequence and its word sequence have different lengths.
    ///
    /// `index` is the position of the pair in a corpus or evaluation run.
    /// Calls on a single sequence, such as path scoring, report 0.
    #[error("sequence #{index} is misaligned: {tags} tags, {words} words")]
    DataShape {
        index: usize,
        tags: usize,
        words: usize,
    },

    /// Training was attempted without a single observation.
    #[error("no training data")]
    EmptyCorpus,

    /// Decoding was requested for a sequence without words.
    #[error("cannot decode an empty sequence")]
    EmptySequence,

    /// No state is reachable at `position`.
    #[error("no reachable state at position {position}")]
    DecodeDeadEnd { position: usize },

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    #[error("invalid parameter {name}: {msg}")]
    InvalidParameter { name: String, msg: String },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_parameter<S: Into<String>>(name: &str, msg: S) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            msg: msg.into(),
        }
    }

    pub(crate) fn invalid_model<S: Into<String>>(msg: S) -> Self {
        Self::InvalidModel(msg.into())
    }
}
