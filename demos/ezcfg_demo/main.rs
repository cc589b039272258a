//! # ezcfg demo application
//!
//! A pretend training script whose flags are generated from
//! `demos/ezcfg_demo/default.cfg`. It exists to exercise ezcfg by hand.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example ezcfg_demo -- --help
//! cargo run --example ezcfg_demo -- --batch_size 16 --layer_size "(256, 128)"
//! cargo run --example ezcfg_demo -- --config extra.cfg --show verbose
//! RUST_LOG=ezcfg=debug cargo run --example ezcfg_demo
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                   |
//! |--------------------------|------------------------------------------------------|
//! | Generated flags          | `--help` lists one flag per parameter, by section    |
//! | Vague parameters         | `dropout` is in DATA and HEAD, so it has no flag     |
//! | Extra config file        | `--config extra.cfg`; command-line values still win  |
//! | Short-name access        | the summary reads `learning_rate` and `batch_size`   |
//! | Writing config           | `--write out.cfg` saves the resolved config          |
//! | Template                 | `--template starter.cfg` writes a starter file       |
//! | Logging                  | `RUST_LOG=ezcfg=debug`                               |

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Arg, ArgAction, value_parser};
use tracing_subscriber::EnvFilter;

use ezcfg::{ConfigStore, EzcfgError, Value};

fn default_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/ezcfg_demo/default.cfg")
}

fn run() -> Result<(), EzcfgError> {
    let mut store = ConfigStore::from_file(default_config())?;

    // Demo-only flags live next to the generated ones.
    let cmd = store
        .command("ezcfg-demo")
        .arg(
            Arg::new("show")
                .long("show")
                .value_parser(["compact", "verbose"])
                .default_value("compact")
                .help("How to print the resolved config"),
        )
        .arg(
            Arg::new("write")
                .long("write")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Save the resolved config to PATH"),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Write a starter config to PATH and exit"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only print the summary line"),
        );
    let matches = cmd.try_get_matches()?;

    if let Some(path) = matches.get_one::<PathBuf>("template") {
        ConfigStore::write_template(path)?;
        println!("wrote template to {}", path.display());
        return Ok(());
    }

    store.apply_matches(&matches)?;

    for warning in store.warnings() {
        eprintln!("warning: {warning}");
    }

    let lr = store
        .get("learning_rate")?
        .as_value()
        .and_then(Value::as_float)
        .unwrap_or_default();
    let batch = store
        .get("batch_size")?
        .as_value()
        .and_then(Value::as_int)
        .unwrap_or_default();
    println!("training with learning_rate={lr} batch_size={batch}");

    if !matches.get_flag("quiet") {
        let compact = matches.get_one::<String>("show").map(String::as_str) != Some("verbose");
        println!();
        print!("{}", store.to_text(None, compact));
    }

    if let Some(path) = matches.get_one::<PathBuf>("write") {
        store.write(path, None, true)?;
        println!("wrote config to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(EzcfgError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
