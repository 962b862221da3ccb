//! Inspects a saved model file and optionally evaluates one input.
//!
//! ```text
//! feedforward <model.bin> [x1,x2,...]
//! ```
//!
//! Log output is controlled through `RUST_LOG` (default `info`).

use std::process::ExitCode;

use feedforward::{NnError, Network};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first() else {
        eprintln!("usage: feedforward <model.bin> [x1,x2,...]");
        return ExitCode::from(2);
    };

    match run(path, args.get(1).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "feedforward failed");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, input: Option<&str>) -> feedforward::Result<()> {
    let mut network = Network::load_model(path)?;

    println!("model:  {path}");
    println!("inputs: {}", network.input_size());
    println!("loss:   {:?}", network.loss());
    for (i, layer) in network.layers().iter().enumerate() {
        println!(
            "layer {i}: {} -> {} ({:?})",
            layer.input_size(),
            layer.size(),
            layer.activator
        );
    }

    if let Some(raw) = input {
        let values = parse_input(raw)?;
        let output = network.predict(&values)?;
        let best = network.eval(&values)?;
        println!("output: {output:?}");
        println!("argmax: {} (value {:.6})", best.index, best.value);
    }
    Ok(())
}

fn parse_input(raw: &str) -> feedforward::Result<Vec<f64>> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| NnError::InvalidConfig(format!("bad input value {part:?}: {e}")))
        })
        .collect()
}
