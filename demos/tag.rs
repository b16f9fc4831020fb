use std::{
    fs::File,
    io::{stdin, BufRead, BufReader},
    path::PathBuf,
    time::Instant,
};

use clap::Parser;
use hmmtag::{read_sentences, Dataset, DeadStatePolicy, Evaluation, HmmModel, HmmTagger, Params};

/// Assign suitable tags to the sentences given by a file (SENTENCES), one per line.
/// If SENTENCES is omitted or '-', this utility reads sentences from STDIN.
/// Evaluate the performance of the model against reference tags (with -t option).
#[derive(Debug, Parser)]
struct Argv {
    /// read a model from a file (MODEL)
    #[arg(short, long, required = true, value_name = "MODEL")]
    model: PathBuf,
    /// report the performance of the model against the reference tags in a file (TAGS)
    #[arg(short = 't', long = "tags", value_name = "TAGS")]
    tags: Option<PathBuf>,
    /// output the score of the tag sequences
    #[arg(short, long)]
    score: bool,
    /// suppress tagging results (useful for test mode)
    #[arg(short, long)]
    quiet: bool,
    /// how to treat a tag without any observed successor
    #[arg(long, value_enum)]
    dead_state: Option<DeadStatePolicy>,
    /// set a decoding parameter as NAME=VALUE (unknown_penalty, dead_state)
    #[arg(short, value_name = "NAME=VALUE")]
    parameters: Vec<String>,
    #[arg(value_name = "SENTENCES")]
    sentences: Option<PathBuf>,
}

fn open(path: Option<&PathBuf>) -> Box<dyn BufRead> {
    match path {
        Some(p) if p.as_os_str() != "-" => Box::new(BufReader::new(File::open(p).expect("failed to open the input data"))),
        _ => Box::new(BufReader::new(stdin())),
    }
}

fn main() {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("{:?}", argv);

    let model = HmmModel::from_path(&argv.model).expect("failed to load model");
    let mut params = Params::default();
    params
        .parse_pairs(&argv.parameters)
        .expect("failed to set parameters");
    if let Some(policy) = argv.dead_state {
        params.dead_state = policy;
    }
    let tagger = HmmTagger::new(&model, params);

    let begin = Instant::now();
    let input = open(argv.sentences.as_ref());
    let (ds, results) = match &argv.tags {
        // Read gold tags and input line by line together so blank lines stay aligned.
        Some(tags) => {
            let tags = BufReader::new(File::open(tags).expect("failed to open the reference tags"));
            let ds = Dataset::read(tags, input).expect("failed to read the input data");
            let results = tagger.tag_dataset(&ds);
            (Some(ds), results)
        }
        None => {
            let sentences = read_sentences(input).expect("failed to read sentences");
            (None, tagger.tag_batch(&sentences))
        }
    };

    if !argv.quiet {
        for (i, result) in results.iter().enumerate() {
            match result {
                Ok(tagging) if argv.score => println!("@score\t{:.6}\t{}", tagging.score, tagging.labels.join(" ")),
                Ok(tagging) => println!("{}", tagging.labels.join(" ")),
                Err(e) => {
                    log::warn!("sentence #{i}: {e}");
                    println!();
                }
            }
        }
    }

    if let Some(ds) = &ds {
        let evaluation = Evaluation::compare(ds, &results);
        println!("{}", evaluation);
        let sec = begin.elapsed().as_secs_f64();
        println!(
            "Elapsed time: {:.6} [sec] ({:.1} [instance/sec])",
            sec,
            ds.len() as f64 / sec
        );
    }
}
