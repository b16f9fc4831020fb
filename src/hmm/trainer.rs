use std::{collections::BTreeMap, time::Instant};

use crate::{
    dataset::Dataset,
    errors::{Error, Result},
    params::Params,
    quark::{Quark, StringTable},
};

use super::hmm1::model::{normalize, EmissionTable, HmmModel, TransitionTable};

/// Frequency counts keyed by source, then by destination.
#[derive(Debug, Default)]
struct FreqTable {
    m: BTreeMap<String, BTreeMap<String, u64>>,
}

impl FreqTable {
    fn add(&mut self, src: &str, dst: &str) {
        *self
            .m
            .entry(src.to_string())
            .or_default()
            .entry(dst.to_string())
            .or_insert(0) += 1;
    }

    fn sources(&self) -> impl Iterator<Item = &str> {
        self.m.keys().map(String::as_str)
    }

    fn row(&self, src: &str) -> Option<&BTreeMap<String, u64>> {
        self.m.get(src)
    }
}

/// Converts the counts of one source into log-probabilities.
fn log_probs(row: &BTreeMap<String, u64>) -> impl Iterator<Item = (&str, f64)> {
    let total: u64 = row.values().sum();
    let total = total as f64;
    row.iter().map(move |(k, &n)| (k.as_str(), (n as f64 / total).ln()))
}

/// Counts aligned (tags, words) pairs and turns them into an [`HmmModel`].
///
/// Counting and normalization are separate phases: [`HmmTrainer::train`]
/// consumes the trainer, so a model only exists once fully normalized.
#[derive(Debug, Default)]
pub struct HmmTrainer {
    params: Params,
    emissions: FreqTable,
    initial: BTreeMap<String, u64>,
    transitions: FreqTable,
    num_pairs: usize,
    num_items: usize,
}

impl HmmTrainer {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Number of pairs appended so far.
    pub fn len(&self) -> usize {
        self.num_pairs
    }

    pub fn is_empty(&self) -> bool {
        self.num_pairs == 0
    }

    /// Counts one training pair. A misaligned pair is rejected before
    /// anything is counted.
    pub fn append<T: AsRef<str>, W: AsRef<str>>(&mut self, tags: &[T], words: &[W]) -> Result<()> {
        if tags.len() != words.len() {
            return Err(Error::DataShape {
                index: self.num_pairs,
                tags: tags.len(),
                words: words.len(),
            });
        }
        self.num_pairs += 1;
        self.num_items += tags.len();

        /* Emission: label #tags[i] outputs word #words[i]. */
        for (tag, word) in tags.iter().zip(words) {
            let word = normalize(word.as_ref(), self.params.lowercase);
            self.emissions.add(tag.as_ref(), &word);
        }

        /* Transition: start -> tags[0], then tags[i] -> tags[i+1]. */
        if let Some(first) = tags.first() {
            *self.initial.entry(first.as_ref().to_string()).or_insert(0) += 1;
        }
        for pair in tags.windows(2) {
            self.transitions.add(pair[0].as_ref(), pair[1].as_ref());
        }
        Ok(())
    }

    pub fn append_dataset(&mut self, ds: &Dataset) -> Result<()> {
        for seq in ds.iter() {
            self.append(&seq.tags, &seq.words)?;
        }
        Ok(())
    }

    /// Normalizes every source once and builds the model.
    pub fn train(self) -> Result<HmmModel> {
        if self.num_items == 0 {
            return Err(Error::EmptyCorpus);
        }
        let begin = Instant::now();

        /* Every label emits at least once, so emission sources are all labels. */
        let labels = Quark::from(self.emissions.sources().map(str::to_string).collect::<Vec<_>>());
        let id = |s: &str| {
            labels
                .to_id(s)
                .ok_or_else(|| Error::invalid_model(format!("label {s:?} never emitted")))
        };

        let emissions = EmissionTable::new(
            labels
                .iter()
                .map(|label| {
                    self.emissions
                        .row(label)
                        .map(|row| log_probs(row).map(|(w, p)| (w.to_string(), p)).collect())
                        .unwrap_or_default()
                })
                .collect(),
        );

        let edges = |row: &BTreeMap<String, u64>| -> Result<Vec<(usize, f64)>> {
            let mut v = log_probs(row)
                .map(|(dst, p)| id(dst).map(|i| (i, p)))
                .collect::<Result<Vec<_>>>()?;
            v.sort_by_key(|&(dst, _)| dst);
            Ok(v)
        };
        let initial = edges(&self.initial)?;
        let rows = labels
            .iter()
            .map(|label| match self.transitions.row(label) {
                Some(row) => edges(row),
                None => Ok(Vec::new()),
            })
            .collect::<Result<Vec<_>>>()?;
        let transitions = TransitionTable::new(initial, rows);

        log::info!(
            "trained on {} pairs ({} items): {} labels, {} emission entries, time cost: {:?}",
            self.num_pairs,
            self.num_items,
            labels.len(),
            emissions.num_entries(),
            begin.elapsed()
        );
        Ok(HmmModel::new(labels, self.params.lowercase, emissions, transitions))
    }
}

/// Trains a model on every pair of `ds`.
pub fn train(ds: &Dataset, params: Params) -> Result<HmmModel> {
    if ds.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    log::info!("training on {} sequences ({})", ds.len(), params);
    let mut trainer = HmmTrainer::new(params);
    trainer.append_dataset(ds)?;
    trainer.train()
}
