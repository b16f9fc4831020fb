use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::errors::Result;

/// One training or test example: a tag sequence and the words it labels.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sequence {
    pub tags: Vec<String>,
    pub words: Vec<String>,
}

impl Sequence {
    pub fn new<T: AsRef<str>, W: AsRef<str>>(tags: &[T], words: &[W]) -> Self {
        Self {
            tags: tags.iter().map(|s| s.as_ref().to_string()).collect(),
            words: words.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn push(&mut self, tag: &str, word: &str) {
        self.tags.push(tag.to_string());
        self.words.push(word.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_aligned(&self) -> bool {
        self.tags.len() == self.words.len()
    }
}

#[derive(Debug, Default, Clone)]
pub struct Dataset {
    pub seqs: Vec<Sequence>,
}

impl Dataset {
    /// Reads a line-aligned corpus: line `n` of `tags` labels line `n` of
    /// `sentences`, tokens separated by whitespace.
    ///
    /// Lines blank on both sides are skipped. When one stream runs out
    /// first, its remaining partners are paired with an empty sequence so
    /// the misalignment surfaces at training time.
    pub fn read<T: BufRead, S: BufRead>(tags: T, sentences: S) -> Result<Self> {
        let mut ds = Dataset::default();
        let mut tag_lines = tags.lines();
        let mut sentence_lines = sentences.lines();
        let mut lineno = 0;
        loop {
            lineno += 1;
            let (t, s) = match (tag_lines.next(), sentence_lines.next()) {
                (None, None) => break,
                (t, s) => (t.transpose()?, s.transpose()?),
            };
            let seq = Sequence {
                tags: split(t.as_deref()),
                words: split(s.as_deref()),
            };
            if seq.is_empty() {
                continue;
            }
            if !seq.is_aligned() {
                log::warn!(
                    "line {} is misaligned: {} tags, {} words",
                    lineno,
                    seq.tags.len(),
                    seq.words.len()
                );
            }
            ds.seqs.push(seq);
        }
        log::info!("read {} sequences ({} items)", ds.len(), ds.total_items());
        Ok(ds)
    }

    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(tags: P, sentences: Q) -> Result<Self> {
        let tags = BufReader::new(File::open(tags)?);
        let sentences = BufReader::new(File::open(sentences)?);
        Self::read(tags, sentences)
    }

    pub fn push(&mut self, seq: Sequence) {
        self.seqs.push(seq);
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.seqs.iter()
    }

    pub fn max_length(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn total_items(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).sum()
    }
}

impl FromIterator<Sequence> for Dataset {
    fn from_iter<I: IntoIterator<Item = Sequence>>(iter: I) -> Self {
        Self {
            seqs: iter.into_iter().collect(),
        }
    }
}

/// Reads untagged input, one whitespace-tokenized sentence per line.
/// Blank lines are skipped.
pub fn read_sentences<R: BufRead>(r: R) -> Result<Vec<Vec<String>>> {
    let mut sentences = Vec::new();
    for line in r.lines() {
        let words = split(Some(line?.as_str()));
        if !words.is_empty() {
            sentences.push(words);
        }
    }
    Ok(sentences)
}

fn split(line: Option<&str>) -> Vec<String> {
    line.map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
