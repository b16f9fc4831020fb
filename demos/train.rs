use std::path::PathBuf;

use clap::Parser;
use hmmtag::{hmm, Dataset, Params};

/// train a tagger from a tag file (TAGS) and a sentence file (SENTENCES);
/// line n of TAGS labels line n of SENTENCES
#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    /// write the trained model to a file (MODEL)
    #[arg(short, long, value_name = "MODEL")]
    model: PathBuf,
    /// set a parameter as NAME=VALUE (unknown_penalty, lowercase)
    #[arg(short, value_name = "NAME=VALUE")]
    parameters: Vec<String>,
    tags: PathBuf,
    sentences: PathBuf,
}

fn main() {
    env_logger::init();

    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);
    let mut params = Params::default();
    params
        .parse_pairs(&argv.parameters)
        .expect("failed to set parameters");
    let ds = Dataset::from_paths(&argv.tags, &argv.sentences).expect("failed to read the corpus");
    let model = hmm::train(&ds, params).expect("failed to train");
    model.save(&argv.model).expect("failed to write the model");
}
