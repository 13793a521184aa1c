use std::path::Path;
use std::process;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::{load_config, ConfigReadError};
use crate::node::Node;

mod configuration;
mod log;
mod mutation;
mod node;
mod payloads;

fn main() {
    let config = match load_config("fuzz.toml") {
        Ok(config) => config,
        Err(ConfigReadError::ReadError(e)) => {
            eprintln!("failed to read fuzz.toml: {e}");
            process::exit(exitcode::IOERR)
        }

        Err(ConfigReadError::ParseError(e)) => {
            eprintln!("{e}");
            process::exit(exitcode::CONFIG)
        }
    };

    let payload_dir = Path::new(&config.payloads.directory);

    let xss_payloads = match payloads::load_xss_collection(payload_dir, &config.payloads.xss) {
        Ok(collection) => collection,
        Err(e) => {
            eprintln!("error loading xss payloads: {e:#}");
            process::exit(exitcode::IOERR)
        }
    };

    let syntax_tokens = match payloads::load_syntax_collection(payload_dir, &config.payloads.syntax)
    {
        Ok(collection) => collection,
        Err(e) => {
            eprintln!("error loading syntax tokens: {e:#}");
            process::exit(exitcode::IOERR)
        }
    };

    log::log!(
        "loaded {} xss categories and {} syntax categories",
        xss_payloads.categories().len(),
        syntax_tokens.categories().len()
    );

    let engine = match mutation::build_engine(&config.mutation, xss_payloads, syntax_tokens) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("bad mutation configuration: {e}");
            process::exit(exitcode::CONFIG)
        }
    };

    let mut rng = match config.generation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let seed_node = Rc::new(Node::new(
        config.target.url.clone(),
        config.target.method,
        config.target.params(),
    ));

    let mut corpus: Vec<Rc<Node>> = vec![seed_node];

    for _ in 0..config.generation.count {
        let source = corpus[rng.gen_range(0..corpus.len())].clone();

        let mutated = engine.mutate(&mut rng, &source, &corpus);

        match serde_json::to_string(&mutated) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                eprintln!("error serializing node: {e}");
                process::exit(exitcode::SOFTWARE)
            }
        }

        corpus.push(Rc::new(mutated));
    }

    if config.generation.log_tail > 0 {
        for message in log::pull_messages(config.generation.log_tail) {
            eprintln!("{message}");
        }
    }
}
