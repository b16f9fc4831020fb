use std::{collections::BTreeMap, fmt::Display};

use crate::{
    dataset::Dataset,
    errors::{Error, Result},
    hmm::Tagging,
};

/// Label-wise performance values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelMeasure {
    /// Number of correct predictions.
    pub num_correct: usize,
    /// Number of occurrences of the label in the gold-standard data.
    pub num_observation: usize,
    /// Number of predictions.
    pub num_prediction: usize,
    pub precision: f64,
    pub recall: f64,
    /// F1 score.
    pub fmeasure: f64,
}

impl LabelMeasure {
    fn compute(&mut self) {
        self.precision = 0.0;
        self.recall = 0.0;
        self.fmeasure = 0.0;
        if self.num_prediction > 0 {
            self.precision = self.num_correct as f64 / self.num_prediction as f64;
        }
        if self.num_observation > 0 {
            self.recall = self.num_correct as f64 / self.num_observation as f64;
        }
        if self.precision + self.recall > 0.0 {
            self.fmeasure = self.precision * self.recall * 2.0 / (self.precision + self.recall);
        }
    }
}

/// An overall performance values.
#[derive(Debug, Default, Clone)]
pub struct Evaluation {
    /// Label-wise evaluations, ordered by label.
    tbl: BTreeMap<String, LabelMeasure>,

    /** Number of correctly predicted items. */
    item_total_correct: usize,
    /** Total number of items. */
    item_total_num: usize,
    /** Item-level accuracy. */
    item_accuracy: f64,

    /** Number of correctly predicted instances. */
    inst_total_correct: usize,
    /** Total number of instances. */
    inst_total_num: usize,
    /** Instance-level accuracy. */
    inst_accuracy: f64,
    /** Number of instances the tagger rejected. */
    inst_rejected: usize,

    /** Macro-averaged precision. */
    macro_precision: f64,
    /** Macro-averaged recall. */
    macro_recall: f64,
    /** Macro-averaged F1 score. */
    macro_fmeasure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimation {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
    pub accuracy: f64,
}

impl Evaluation {
    /// Compares one predicted sequence with its reference, position by position.
    pub fn accumulate<R: AsRef<str>, P: AsRef<str>>(&mut self, reference: &[R], prediction: &[P]) -> Result<()> {
        if reference.len() != prediction.len() {
            return Err(Error::DataShape {
                index: self.inst_total_num,
                tags: reference.len(),
                words: prediction.len(),
            });
        }
        let mut matched = 0;
        for (r, p) in reference.iter().zip(prediction) {
            let (r, p) = (r.as_ref(), p.as_ref());
            self.entry(r).num_observation += 1;
            self.entry(p).num_prediction += 1;
            if r == p {
                self.entry(r).num_correct += 1;
                matched += 1;
            }
        }
        self.item_total_num += reference.len();
        self.item_total_correct += matched;

        if matched == prediction.len() {
            self.inst_total_correct += 1;
        }
        self.inst_total_num += 1;
        Ok(())
    }

    /// Compares each sequence of `ds` with the prediction at the same
    /// position. Failed or misaligned predictions are counted as rejected.
    pub fn compare(ds: &Dataset, predictions: &[Result<Tagging>]) -> Self {
        let mut evaluation = Self::default();
        for (i, (seq, prediction)) in ds.iter().zip(predictions).enumerate() {
            let outcome = match prediction {
                Ok(tagging) => evaluation.accumulate(&seq.tags, &tagging.labels),
                Err(e) => {
                    log::warn!("sequence #{i} rejected: {e}");
                    evaluation.reject();
                    continue;
                }
            };
            if let Err(e) = outcome {
                log::warn!("sequence #{i} rejected: {e}");
                evaluation.reject();
            }
        }
        evaluation.evaluate();
        evaluation
    }

    /// Records an instance the tagger could not decode.
    pub fn reject(&mut self) {
        self.inst_rejected += 1;
    }

    fn entry(&mut self, label: &str) -> &mut LabelMeasure {
        self.tbl.entry(label.to_string()).or_default()
    }

    /// Computes the label-wise and overall measures from the counts so far.
    pub fn evaluate(&mut self) -> Estimation {
        self.macro_precision = 0.0;
        self.macro_recall = 0.0;
        self.macro_fmeasure = 0.0;

        let mut num_labels = 0;
        for lev in self.tbl.values_mut() {
            lev.compute();
            if lev.num_observation == 0 {
                continue;
            }
            num_labels += 1;
            self.macro_precision += lev.precision;
            self.macro_recall += lev.recall;
            self.macro_fmeasure += lev.fmeasure;
        }

        if num_labels > 0 {
            self.macro_precision /= num_labels as f64;
            self.macro_recall /= num_labels as f64;
            self.macro_fmeasure /= num_labels as f64;
        }
        if self.item_total_num > 0 {
            self.item_accuracy = self.item_total_correct as f64 / self.item_total_num as f64;
        }
        if self.inst_total_num > 0 {
            self.inst_accuracy = self.inst_total_correct as f64 / self.inst_total_num as f64;
        }
        Estimation {
            precision: self.macro_precision,
            recall: self.macro_recall,
            fmeasure: self.macro_fmeasure,
            accuracy: self.item_accuracy,
        }
    }

    /// Number of items tagged correctly.
    pub fn correct(&self) -> usize {
        self.item_total_correct
    }

    /// Number of items tagged incorrectly.
    pub fn incorrect(&self) -> usize {
        self.item_total_num - self.item_total_correct
    }

    pub fn rejected(&self) -> usize {
        self.inst_rejected
    }

    pub fn label(&self, label: &str) -> Option<&LabelMeasure> {
        self.tbl.get(label)
    }

    pub fn item_accuracy(&self) -> f64 {
        self.item_accuracy
    }

    pub fn sequence_accuracy(&self) -> f64 {
        self.inst_accuracy
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance by label (#match, #model, #ref) (precision, recall, F1):")?;
        for (label, lev) in &self.tbl {
            if lev.num_observation == 0 {
                writeln!(
                    f,
                    "    {}: ({}, {}, {}) (******, ******, ******)",
                    label, lev.num_correct, lev.num_prediction, lev.num_observation
                )?;
            } else {
                writeln!(
                    f,
                    "    {}: ({}, {}, {}) ({:.4}, {:.4}, {:.4})",
                    label,
                    lev.num_correct,
                    lev.num_prediction,
                    lev.num_observation,
                    lev.precision,
                    lev.recall,
                    lev.fmeasure
                )?;
            }
        }
        writeln!(
            f,
            "Macro-average precision, recall, F1: ({:.6}, {:.6}, {:.6})",
            self.macro_precision, self.macro_recall, self.macro_fmeasure
        )?;
        writeln!(
            f,
            "Item accuracy: {} / {} ({:.4})",
            self.item_total_correct, self.item_total_num, self.item_accuracy
        )?;
        writeln!(
            f,
            "Instance accuracy: {} / {} ({:.4})",
            self.inst_total_correct, self.inst_total_num, self.inst_accuracy
        )?;
        write!(f, "Rejected instances: {}", self.inst_rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let mut e = Evaluation::default();
        e.accumulate(&["DET", "N", "V"], &["DET", "N", "N"]).expect("aligned");
        e.accumulate(&["N", "V"], &["N", "V"]).expect("aligned");
        let est = e.evaluate();

        assert_eq!(e.correct(), 4);
        assert_eq!(e.incorrect(), 1);
        assert!((e.item_accuracy() - 0.8).abs() < 1e-12);
        assert!((e.sequence_accuracy() - 0.5).abs() < 1e-12);
        assert!((est.accuracy - 0.8).abs() < 1e-12);

        let n = e.label("N").expect("observed");
        assert_eq!((n.num_correct, n.num_prediction, n.num_observation), (2, 3, 2));
        assert!((n.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((n.recall - 1.0).abs() < 1e-12);
        let v = e.label("V").expect("observed");
        assert!((v.recall - 0.5).abs() < 1e-12);

        // DET: p=1 r=1, N: p=2/3 r=1, V: p=1 r=1/2
        assert!((est.precision - (1.0 + 2.0 / 3.0 + 1.0) / 3.0).abs() < 1e-12);
        assert!((est.recall - (1.0 + 1.0 + 0.5) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_is_idempotent() {
        let mut e = Evaluation::default();
        e.accumulate(&["N"], &["V"]).expect("aligned");
        let first = e.evaluate();
        let second = e.evaluate();
        assert_eq!(first, second);
        assert_eq!(e.label("V").map(|m| m.num_observation), Some(0));
    }

    #[test]
    fn misaligned() {
        let mut e = Evaluation::default();
        assert!(matches!(e.accumulate(&["N", "V"], &["N"]), Err(Error::DataShape { .. })));
        e.reject();
        assert_eq!(e.rejected(), 1);
        assert_eq!(e.correct() + e.incorrect(), 0);
    }

    #[test]
    fn compare_by_position() {
        let ds = Dataset::read(&b"DET N\n\nN V\nN\n"[..], &b"the dog\n\ndogs bark\ncats\n"[..]).expect("failed to read");
        assert_eq!(ds.len(), 3);
        let predictions = vec![
            Ok(Tagging {
                labels: vec!["DET".to_string(), "N".to_string()],
                score: -1.0,
            }),
            Ok(Tagging {
                labels: vec!["N".to_string(), "V".to_string()],
                score: -1.0,
            }),
            Err(Error::DecodeDeadEnd { position: 0 }),
        ];
        let e = Evaluation::compare(&ds, &predictions);
        assert_eq!(e.correct(), 4);
        assert_eq!(e.incorrect(), 0);
        assert_eq!(e.rejected(), 1);
    }

    #[test]
    fn report() {
        let mut e = Evaluation::default();
        e.accumulate(&["N", "V"], &["N", "N"]).expect("aligned");
        e.evaluate();
        let s = e.to_string();
        assert!(s.contains("    N: (1, 2, 1) (0.5000, 1.0000, 0.6667)"));
        assert!(s.contains("    V: (0, 0, 1) (0.0000, 0.0000, 0.0000)"));
        assert!(s.contains("Item accuracy: 1 / 2 (0.5000)"));
        assert!(s.ends_with("Rejected instances: 0"));
    }
}
