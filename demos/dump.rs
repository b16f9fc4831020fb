use std::io::stdout;

use clap::Parser;
use hmmtag::{HmmModel, Model};

/// output the model stored in the file (MODEL) in a plain-text format
#[derive(Debug, Parser)]
struct Argv {
    #[arg(short, long, required = true, value_name = "MODEL")]
    model: String,
}

fn main() {
    env_logger::init();
    let argv = Argv::parse();
    let model = HmmModel::from_path(&argv.model).expect("failed to load model");
    model.dump(stdout().lock()).expect("failed to dump model");
}
