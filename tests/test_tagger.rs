use std::io::Cursor;

use hmmtag::{
    hmm::{self, HmmTagger, State},
    Dataset, DeadStatePolicy, Error, Evaluation, HmmModel, HmmTrainer, Model, Params, Tagger,
};

fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn train(pairs: &[(&[&str], &[&str])]) -> HmmModel {
    let mut trainer = HmmTrainer::default();
    for &(tags, words) in pairs {
        trainer.append(tags, words).expect("aligned");
    }
    trainer.train().expect("failed to train")
}

fn small_model() -> HmmModel {
    train(&[
        (&["DET", "N"], &["the", "dog"]),
        (&["DET", "N"], &["the", "cat"]),
        (&["N", "V"], &["dog", "barks"]),
    ])
}

#[test]
fn decode() {
    init_logger();
    let model = small_model();
    let tagger = model.tagger(Params::default());
    let tagging = tagger.tag(&["the", "dog"]).expect("failed to tag");
    assert_eq!(tagging.labels, ["DET", "N"]);
    // START -> DET: 2/3, DET -> N: 1, DET emits "the": 1, N emits "dog": 2/3.
    assert!((tagging.score - 2.0 * (2.0f64 / 3.0).ln()).abs() < 1e-9);
}

#[test]
fn decode_is_case_insensitive() {
    let model = small_model();
    let tagger = model.tagger(Params::default());
    assert_eq!(tagger.tag(&["The", "DOG"]).expect("failed to tag").labels, ["DET", "N"]);
}

#[test]
fn training_sentence_round_trip() {
    let model = train(&[
        (&["DET", "N", "V"], &["the", "dog", "runs"]),
        (&["PRO", "V", "ADV"], &["he", "runs", "fast"]),
        (&["DET", "ADJ", "N"], &["a", "big", "cat"]),
    ]);
    let tagger = model.tagger(Params::default());
    for (tags, words) in [
        (["DET", "N", "V"], ["the", "dog", "runs"]),
        (["PRO", "V", "ADV"], ["he", "runs", "fast"]),
        (["DET", "ADJ", "N"], ["a", "big", "cat"]),
    ] {
        assert_eq!(tagger.tag(&words).expect("failed to tag").labels, tags);
    }
}

#[test]
fn case_follows_the_model() {
    let model = small_model();
    let tagger = model.tagger(Params {
        lowercase: false,
        ..Default::default()
    });
    let tagging = tagger.tag(&["The", "DOG"]).expect("failed to tag");
    assert_eq!(tagging.labels, ["DET", "N"]);
    assert!(tagging.score > -999.0);
}

#[test]
fn unseen_word() {
    let model = small_model();
    let tagger = model.tagger(Params::default());
    let tagging = tagger.tag(&["the", "zebra"]).expect("failed to tag");
    assert_eq!(tagging.labels.len(), 2);
    assert_eq!(tagging.labels, ["DET", "N"]);
    assert!(tagging.score < -999.0);

    let tagger = model.tagger(Params {
        unknown_penalty: -5.0,
        ..Default::default()
    });
    let tagging = tagger.tag(&["the", "zebra"]).expect("failed to tag");
    assert!((tagging.score - ((2.0f64 / 3.0).ln() - 5.0)).abs() < 1e-9);
}

#[test]
fn empty_sequence() {
    let model = small_model();
    let tagger = model.tagger(Params::default());
    assert!(matches!(tagger.tag::<&str>(&[]), Err(Error::EmptySequence)));
    assert!(matches!(tagger.score::<&str, &str>(&[], &[]), Err(Error::EmptySequence)));
}

#[test]
fn dead_end() {
    let model = train(&[(&["A", "B"], &["x", "y"])]);

    let tagger = model.tagger(Params::default());
    assert!(matches!(tagger.tag(&["x", "y", "z"]), Err(Error::DecodeDeadEnd { position: 2 })));
    assert_eq!(tagger.tag(&["x", "y"]).expect("failed to tag").labels, ["A", "B"]);

    let mut params = Params::default();
    params.set("dead_state", "uniform").expect("valid parameter");
    let tagger = model.tagger(params);
    let tagging = tagger.tag(&["x", "y", "z"]).expect("failed to tag");
    assert_eq!(tagging.labels.len(), 3);
    assert_eq!(&tagging.labels[..2], ["A", "B"]);
}

#[test]
fn ties_break_by_label_name() {
    for pairs in [
        [(&["V"][..], &["fish"][..]), (&["N"][..], &["fish"][..])],
        [(&["N"][..], &["fish"][..]), (&["V"][..], &["fish"][..])],
    ] {
        let model = train(&pairs);
        let tagger = model.tagger(Params::default());
        assert_eq!(tagger.tag(&["fish"]).expect("failed to tag").labels, ["N"]);
    }
}

#[test]
fn score_of_best_path() {
    let model = small_model();
    let tagger = HmmTagger::new(&model, Params::default());
    let tagging = tagger.tag(&["dog", "barks"]).expect("failed to tag");
    assert_eq!(tagging.labels, ["N", "V"]);
    let score = tagger.score(&["dog", "barks"], &tagging.labels).expect("known labels");
    assert!((score - tagging.score).abs() < 1e-9);

    let other = tagger.score(&["dog", "barks"], &["DET", "N"]).expect("known labels");
    assert!(other < tagging.score);
    assert!(matches!(
        tagger.score(&["dog", "barks"], &["N", "ADJ"]),
        Err(Error::UnknownLabel(label)) if label == "ADJ"
    ));
    assert!(matches!(
        tagger.score(&["dog"], &["N", "V"]),
        Err(Error::DataShape { index: 0, tags: 2, words: 1 })
    ));
}

#[test]
fn batch_matches_sequential() {
    let model = small_model();
    let tagger = HmmTagger::new(&model, Params::default());
    let batch: Vec<Vec<&str>> = vec![
        vec!["the", "cat"],
        vec!["dog", "barks"],
        vec![],
        vec!["the", "dog", "barks"],
        vec!["a", "zebra"],
    ];
    let results = tagger.tag_batch(&batch);
    assert_eq!(results.len(), batch.len());
    for (words, result) in batch.iter().zip(results) {
        match (tagger.tag(words), result) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("{a:?} != {b:?}"),
        }
    }
}

#[test]
fn json_round_trip() {
    let model = small_model();
    let mut buf = Vec::new();
    model.to_writer(&mut buf).expect("failed to serialize");
    let loaded = HmmModel::from_reader(buf.as_slice()).expect("failed to load");
    assert_eq!(loaded.labels().iter().collect::<Vec<_>>(), ["DET", "N", "V"]);

    let a = model.tagger(Params::default());
    let b = loaded.tagger(Params::default());
    for words in [&["the", "dog"][..], &["dog", "barks"], &["the", "zebra"]] {
        assert_eq!(a.tag(words).expect("failed to tag"), b.tag(words).expect("failed to tag"));
    }

    for i in 0..model.num_labels() {
        let (x, y) = (model.emissions().row(i), loaded.emissions().row(i));
        let (x, y) = (x.expect("one row per label"), y.expect("one row per label"));
        assert_eq!(x.len(), y.len());
        for (word, p) in x {
            assert_eq!(y.get(word).map(|q| q.to_bits()), Some(p.to_bits()), "{i} --> {word}");
        }
    }
    for src in std::iter::once(State::Start).chain((0..model.num_labels()).map(State::Label)) {
        let bits = |row: &[(usize, f64)]| row.iter().map(|&(j, p)| (j, p.to_bits())).collect::<Vec<_>>();
        assert_eq!(bits(model.transitions().successors(src)), bits(loaded.transitions().successors(src)));
    }

    let mut x = Vec::new();
    let mut y = Vec::new();
    model.dump(&mut x).expect("failed to dump");
    loaded.dump(&mut y).expect("failed to dump");
    assert_eq!(x, y);
}

#[test]
fn evaluate_dataset() {
    init_logger();
    let tags = "DET N V\nN V\nDET N\n";
    let sentences = "the dog runs\ndogs run\nthe cat\n";
    let ds = Dataset::read(Cursor::new(tags), Cursor::new(sentences)).expect("failed to read");
    let model = hmm::train(&ds, Params::default()).expect("failed to train");

    let tagger = HmmTagger::new(&model, Params::default());
    let evaluation = tagger.evaluate(&ds);
    assert_eq!(evaluation.correct(), 7);
    assert_eq!(evaluation.incorrect(), 0);
    assert_eq!(evaluation.rejected(), 0);
    assert!((evaluation.sequence_accuracy() - 1.0).abs() < 1e-12);

    // "V" never has a successor, so the fourth item is unreachable.
    let test = Dataset::read(Cursor::new("DET N V N\nN V\n"), Cursor::new("the dog runs dogs\ndogs run\n"))
        .expect("failed to read");
    let evaluation = tagger.evaluate(&test);
    assert_eq!(evaluation.rejected(), 1);
    assert_eq!(evaluation.correct(), 2);

    let tagger = HmmTagger::new(
        &model,
        Params {
            dead_state: DeadStatePolicy::Uniform,
            ..Default::default()
        },
    );
    assert_eq!(tagger.evaluate(&test).rejected(), 0);
}

#[test]
fn evaluate_with_blank_lines() {
    let model = small_model();
    let tagger = HmmTagger::new(&model, Params::default());
    let ds = Dataset::read(Cursor::new("DET N\n\nN V\n"), Cursor::new("the dog\n\ndog barks\n")).expect("failed to read");
    assert_eq!(ds.len(), 2);

    let results = tagger.tag_dataset(&ds);
    let evaluation = Evaluation::compare(&ds, &results);
    assert_eq!(evaluation.correct(), 4);
    assert_eq!(evaluation.rejected(), 0);
    assert_eq!(tagger.evaluate(&ds).correct(), 4);
}
