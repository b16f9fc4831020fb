use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub trait StringTable {
    fn to_str(&self, id: usize) -> Option<&str>;
    fn to_id(&self, s: &str) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bidirectional map between label strings and dense ids.
///
/// Ids follow the order of the vector the quark was built from; the trainer
/// builds it from sorted labels so ids are lexicographic.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Quark {
    v: Vec<String>,
    m: HashMap<String, usize>,
}

impl From<Vec<String>> for Quark {
    fn from(value: Vec<String>) -> Self {
        let m = value.iter().enumerate().map(|(i, s)| (s.to_string(), i)).collect();
        Self { v: value, m }
    }
}

impl From<Quark> for Vec<String> {
    fn from(value: Quark) -> Self {
        value.v
    }
}

impl StringTable for Quark {
    fn to_str(&self, id: usize) -> Option<&str> {
        self.v.get(id).map(|x| x.as_str())
    }

    fn to_id(&self, s: &str) -> Option<usize> {
        self.m.get(s).copied()
    }

    fn len(&self) -> usize {
        self.v.len()
    }
}

impl Quark {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.v.iter().map(String::as_str)
    }

    /// True when every string maps to a distinct id.
    pub(crate) fn is_consistent(&self) -> bool {
        self.m.len() == self.v.len()
    }
}
