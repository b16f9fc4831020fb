use std::{
    borrow::Cow,
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    hmm::{model::Model, tagger::Tagger},
    params::Params,
    quark::{Quark, StringTable},
};

use super::tagger::HmmTagger;

/// Name printed for the start state in dumps.
pub const START: &str = "<START>";

/// A source state of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Precedes the first label of every sequence.
    Start,
    Label(usize),
}

/// log P(word | label), one row per label id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionTable {
    rows: Vec<HashMap<String, f64>>,
}

impl EmissionTable {
    pub(crate) fn new(rows: Vec<HashMap<String, f64>>) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn get(&self, label: usize, word: &str) -> Option<f64> {
        self.rows.get(label)?.get(word).copied()
    }

    pub fn row(&self, label: usize) -> Option<&HashMap<String, f64>> {
        self.rows.get(label)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of observed (label, word) pairs.
    pub fn num_entries(&self) -> usize {
        self.rows.iter().map(HashMap::len).sum()
    }
}

/// log P(next | prev); each row is sorted by destination id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable {
    initial: Vec<(usize, f64)>,
    rows: Vec<Vec<(usize, f64)>>,
}

impl TransitionTable {
    pub(crate) fn new(initial: Vec<(usize, f64)>, rows: Vec<Vec<(usize, f64)>>) -> Self {
        Self { initial, rows }
    }

    /// Outgoing edges of `from`; empty when it was never seen as a source.
    #[inline]
    pub fn successors(&self, from: State) -> &[(usize, f64)] {
        match from {
            State::Start => &self.initial,
            State::Label(i) => self.rows.get(i).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    pub fn get(&self, from: State, to: usize) -> Option<f64> {
        let row = self.successors(from);
        row.binary_search_by_key(&to, |&(dst, _)| dst).ok().map(|i| row[i].1)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A trained first-order HMM. Immutable once built; share it freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmmModel {
    labels: Quark,
    lowercase: bool,
    emissions: EmissionTable,
    transitions: TransitionTable,
}

impl HmmModel {
    pub(crate) fn new(labels: Quark, lowercase: bool, emissions: EmissionTable, transitions: TransitionTable) -> Self {
        Self {
            labels,
            lowercase,
            emissions,
            transitions,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model = Self::from_reader(BufReader::new(File::open(path)?))?;
        log::info!("loaded model from {} ({} labels)", path.display(), model.num_labels());
        Ok(model)
    }

    pub fn from_reader<R: Read>(r: R) -> Result<Self> {
        let model: Self = serde_json::from_reader(r)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        self.to_writer(&mut w)?;
        w.flush()?;
        log::info!("wrote model to {}", path.as_ref().display());
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, w: W) -> Result<()> {
        serde_json::to_writer(w, self)?;
        Ok(())
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Whether words are lower-cased before lookup.
    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    pub fn emissions(&self) -> &EmissionTable {
        &self.emissions
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// log P(word | label) if the pair was observed in training.
    pub fn emission(&self, label: &str, word: &str) -> Option<f64> {
        let id = self.labels.to_id(label)?;
        self.emissions.get(id, &self.normalize(word))
    }

    /// log P(to | from); `from = None` stands for the start state.
    pub fn transition(&self, from: Option<&str>, to: &str) -> Option<f64> {
        let from = match from {
            Some(s) => State::Label(self.labels.to_id(s)?),
            None => State::Start,
        };
        self.transitions.get(from, self.labels.to_id(to)?)
    }

    #[inline]
    pub(crate) fn normalize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        normalize(word, self.lowercase)
    }

    fn validate(&self) -> Result<()> {
        let num_labels = self.num_labels();
        if num_labels == 0 {
            return Err(Error::invalid_model("no labels"));
        }
        if !self.labels.is_consistent() {
            return Err(Error::invalid_model("duplicate labels"));
        }
        if self.emissions.len() != num_labels {
            return Err(Error::invalid_model(format!(
                "{} emission rows for {} labels",
                self.emissions.len(),
                num_labels
            )));
        }
        if self.transitions.len() != num_labels {
            return Err(Error::invalid_model(format!(
                "{} transition rows for {} labels",
                self.transitions.len(),
                num_labels
            )));
        }
        let valid = |p: f64| p.is_finite() && p <= 0.0;
        let sources = std::iter::once(State::Start).chain((0..num_labels).map(State::Label));
        for src in sources {
            let row = self.transitions.successors(src);
            if row.iter().any(|&(dst, p)| dst >= num_labels || !valid(p)) {
                return Err(Error::invalid_model(format!("bad transition from {src:?}")));
            }
            if row.windows(2).any(|w| w[0].0 >= w[1].0) {
                return Err(Error::invalid_model(format!("unsorted transitions from {src:?}")));
            }
        }
        for (i, row) in self.emissions.rows.iter().enumerate() {
            if row.values().any(|&p| !valid(p)) {
                return Err(Error::invalid_model(format!("bad emission for label #{i}")));
            }
        }
        Ok(())
    }

    fn state_name(&self, state: State) -> &str {
        match state {
            State::Start => START,
            State::Label(i) => self.labels.to_str(i).unwrap_or("?"),
        }
    }
}

impl Model for HmmModel {
    fn tagger(&self, params: Params) -> impl Tagger + '_ {
        HmmTagger::new(self, params)
    }

    fn labels(&self) -> &Quark {
        &self.labels
    }

    fn dump<W: Write>(&self, mut w: W) -> Result<()> {
        writeln!(w, "LABELS = {{")?;
        for (i, label) in self.labels.iter().enumerate() {
            writeln!(w, "  {i:5}: {label}")?;
        }
        writeln!(w, "}}")?;
        writeln!(w)?;

        writeln!(w, "TRANSITIONS = {{")?;
        let sources = std::iter::once(State::Start).chain((0..self.num_labels()).map(State::Label));
        for src in sources {
            for &(dst, p) in self.transitions.successors(src) {
                writeln!(w, "  {} --> {}: {:.6}", self.state_name(src), self.state_name(State::Label(dst)), p)?;
            }
        }
        writeln!(w, "}}")?;
        writeln!(w)?;

        writeln!(w, "EMISSIONS = {{")?;
        for (i, row) in self.emissions.rows.iter().enumerate() {
            let mut words: Vec<_> = row.iter().collect();
            words.sort_by(|a, b| a.0.cmp(b.0));
            for (word, p) in words {
                writeln!(w, "  {} --> {}: {:.6}", self.state_name(State::Label(i)), word, p)?;
            }
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}

/// Case-folds `word` when `lowercase` is set, borrowing when nothing changes.
pub fn normalize(word: &str, lowercase: bool) -> Cow<'_, str> {
    if lowercase && word.chars().any(char::is_uppercase) {
        Cow::Owned(word.to_lowercase())
    } else {
        Cow::Borrowed(word)
    }
}
