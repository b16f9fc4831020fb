use crate::{
    dataset::Dataset,
    errors::{Error, Result},
    evaluation::Evaluation,
    hmm::{
        model::Model,
        tagger::{Tagger, Tagging},
    },
    params::{DeadStatePolicy, Params, DEFAULT_UNKNOWN_PENALTY},
    quark::StringTable,
};

use super::{
    context::DecodeState,
    model::{HmmModel, State},
};

/// Viterbi decoder over a borrowed [`HmmModel`].
///
/// The tagger holds no per-call state, so one instance can decode any
/// number of sequences concurrently.
#[derive(Debug)]
pub struct HmmTagger<'a> {
    model: &'a HmmModel,
    params: Params,
    /// Fallback row used by [`DeadStatePolicy::Uniform`].
    uniform: Vec<(usize, f64)>,
}

impl<'a> HmmTagger<'a> {
    /// Creates a tagger. An invalid unknown-word penalty is replaced by the
    /// default so every candidate score stays comparable.
    pub fn new(model: &'a HmmModel, mut params: Params) -> Self {
        if let Err(e) = params.validate() {
            log::warn!("{e}; using {DEFAULT_UNKNOWN_PENALTY}");
            params.unknown_penalty = DEFAULT_UNKNOWN_PENALTY;
        }
        let num_labels = model.num_labels();
        let uniform = match params.dead_state {
            DeadStatePolicy::Uniform if num_labels > 0 => {
                let p = -(num_labels as f64).ln();
                (0..num_labels).map(|j| (j, p)).collect()
            }
            _ => Vec::new(),
        };
        Self { model, params, uniform }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Outgoing edges of `from` under the dead-state policy.
    fn successors(&self, from: State) -> Option<&[(usize, f64)]> {
        let edges = self.model.transitions().successors(from);
        if !edges.is_empty() {
            return Some(edges);
        }
        match (from, self.params.dead_state) {
            (State::Label(_), DeadStatePolicy::Uniform) => Some(&self.uniform),
            _ => None,
        }
    }

    fn transition(&self, from: State, to: usize) -> f64 {
        match self.successors(from) {
            Some(edges) => edges
                .binary_search_by_key(&to, |&(dst, _)| dst)
                .map(|i| edges[i].1)
                .unwrap_or(f64::NEG_INFINITY),
            None => f64::NEG_INFINITY,
        }
    }

    #[inline]
    fn emission(&self, label: usize, word: &str) -> f64 {
        self.model
            .emissions()
            .get(label, word)
            .unwrap_or(self.params.unknown_penalty)
    }

    /// Tags every sequence in `batch`, one result per sequence in input order.
    ///
    /// Sequences are decoded in parallel with the `parallel` feature.
    pub fn tag_batch<S>(&self, batch: &[Vec<S>]) -> Vec<Result<Tagging>>
    where
        S: AsRef<str> + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            batch.par_iter().map(|words| self.tag(words.as_slice())).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            batch.iter().map(|words| self.tag(words.as_slice())).collect()
        }
    }

    /// Tags the words of every sequence in `ds`, in order.
    pub fn tag_dataset(&self, ds: &Dataset) -> Vec<Result<Tagging>> {
        let batch: Vec<&[String]> = ds.iter().map(|seq| seq.words.as_slice()).collect();
        self.tag_slices(&batch)
    }

    /// Decodes every sequence of a labelled dataset and compares the result
    /// with its tags. Sequences the decoder rejects are counted, not fatal.
    pub fn evaluate(&self, ds: &Dataset) -> Evaluation {
        Evaluation::compare(ds, &self.tag_dataset(ds))
    }

    fn tag_slices(&self, batch: &[&[String]]) -> Vec<Result<Tagging>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            batch.par_iter().map(|words| self.tag(*words)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            batch.iter().map(|words| self.tag(*words)).collect()
        }
    }
}

impl<'a> Tagger for HmmTagger<'a> {
    fn num_labels(&self) -> usize {
        self.model.num_labels()
    }

    fn label(&self, id: usize) -> Option<&str> {
        self.model.labels().to_str(id)
    }

    #[allow(non_snake_case)]
    fn viterbi<S: AsRef<str>>(&self, words: &[S]) -> Result<(Vec<usize>, f64)> {
        let T = words.len();
        let L = self.num_labels();
        if T == 0 {
            return Err(Error::EmptySequence);
        }

        let mut ctx = DecodeState::new(L, T);
        let mut emission = vec![0.0; L];
        for (t, word) in words.iter().enumerate() {
            let word = self.model.normalize(word.as_ref());
            for (j, e) in emission.iter_mut().enumerate() {
                *e = self.emission(j, &word);
            }
            ctx.advance(t, |s| self.successors(s), &emission);
            if ctx.active().is_empty() {
                log::debug!("dead end at position {t} ({word:?})");
                return Err(Error::DecodeDeadEnd { position: t });
            }
        }

        let mut labels = vec![0; T];
        let score = ctx
            .backtrack(&mut labels)
            .ok_or(Error::DecodeDeadEnd { position: T - 1 })?;
        log::debug!("decoded {T} items, score = {score}");
        Ok((labels, score))
    }

    fn score<S: AsRef<str>, L: AsRef<str>>(&self, words: &[S], labels: &[L]) -> Result<f64> {
        if words.is_empty() {
            return Err(Error::EmptySequence);
        }
        if words.len() != labels.len() {
            return Err(Error::DataShape {
                index: 0,
                tags: labels.len(),
                words: words.len(),
            });
        }
        let mut prev = State::Start;
        let mut r = 0.0;
        for (word, label) in words.iter().zip(labels) {
            let j = self
                .model
                .labels()
                .to_id(label.as_ref())
                .ok_or_else(|| Error::UnknownLabel(label.as_ref().to_string()))?;
            r += self.transition(prev, j);
            r += self.emission(j, &self.model.normalize(word.as_ref()));
            prev = State::Label(j);
        }
        Ok(r)
    }
}
