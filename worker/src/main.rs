use std::{
    env, fs,
    io::{self, BufRead, BufWriter, Write},
    num::NonZeroUsize,
};

use comms::specs::worker::ScoringSpec;
use log::{error, info};
use machine_learning::data::Example;

use worker::{Broadcast, PartitionScorer, WorkerConfig, data::ExampleRecord};

const DEFAULT_MINIBATCH_SIZE: &str = "32";

fn main() -> io::Result<()> {
    env_logger::init();

    let architecture = fs::read_to_string(env::var("ARCHITECTURE").map_err(io::Error::other)?)?;
    let params = fs::read(env::var("PARAMS").map_err(io::Error::other)?)?;
    let params = Broadcast::from_bytes(&params)?;
    let config = read_config()?;

    info!(
        params = params.value().len(),
        minibatch_size = config.minibatch_size().get();
        "scoring partition from stdin"
    );

    let scorer = PartitionScorer::new(architecture, params, config)?;

    let mut failure = None;
    let examples = io::stdin()
        .lock()
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map_while(|line| match parse_example(line) {
            Ok(example) => Some(example),
            Err(e) => {
                failure = Some(e);
                None
            }
        });

    let results = scorer.score_partition(examples);
    if let Some(e) = failure {
        error!("bad example line: {e}");
        return Err(e);
    }

    let mut out = BufWriter::new(io::stdout().lock());
    for result in results? {
        serde_json::to_writer(&mut out, &result)?;
        writeln!(out)?;
    }

    out.flush()
}

/// Reads the scoring settings from `SPEC`, falling back to `MINIBATCH_SIZE` with eager execution.
fn read_config() -> io::Result<WorkerConfig> {
    if let Ok(path) = env::var("SPEC") {
        let spec: ScoringSpec = serde_json::from_str(&fs::read_to_string(path)?)?;
        return Ok(spec.into());
    }

    let minibatch_size = env::var("MINIBATCH_SIZE")
        .unwrap_or_else(|_| DEFAULT_MINIBATCH_SIZE.to_string())
        .parse::<NonZeroUsize>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    Ok(WorkerConfig::new(minibatch_size))
}

fn parse_example(line: io::Result<String>) -> io::Result<Example> {
    let record: ExampleRecord = serde_json::from_str(&line?)?;
    Ok(record.into())
}
