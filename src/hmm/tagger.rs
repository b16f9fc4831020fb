use crate::errors::{Error, Result};

/// The result of decoding one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagging {
    /// One label per input word.
    pub labels: Vec<String>,
    /// Log-score of the path.
    pub score: f64,
}

pub trait Tagger {
    fn num_labels(&self) -> usize;
    fn label(&self, id: usize) -> Option<&str>;
    /// Finds the best label ids for `words` and the log-score of that path.
    fn viterbi<S: AsRef<str>>(&self, words: &[S]) -> Result<(Vec<usize>, f64)>;
    /// Log-score of a given label path under the same rules as [`Tagger::viterbi`].
    fn score<S: AsRef<str>, L: AsRef<str>>(&self, words: &[S], labels: &[L]) -> Result<f64>;

    fn tag<S: AsRef<str>>(&self, words: &[S]) -> Result<Tagging> {
        let (ids, score) = self.viterbi(words)?;
        let labels = ids
            .into_iter()
            .map(|i| {
                self.label(i)
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid_model(format!("label #{i} out of range")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Tagging { labels, score })
    }
}
