//! Command-line entrypoint for the demo binary.
//!
//! Loads the module, runs the demo scenario and prints the rows it returns.

use crate::demo::{DemoError, run_demo};
use crate::messages::display_messages::print_interop_error;
use crate::messages::interop_errors::InteropError;
use crate::runtime::Runtime;
use crate::runtime::loader::ModuleSource;
use crate::settings::{CONFIG_FILE_NAME, RuntimeConfig};
use saying::say;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run {
        module: Option<PathBuf>,
        config: Option<PathBuf>,
    },
    Help,
}

pub fn start_cli() {
    let args: Vec<String> = env::args().skip(1).collect();

    let command = match get_command(&args) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return;
        }
    };

    match command {
        Command::Help => print_help(false),

        Command::Run { module, config } => {
            let config = match load_config(config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    print_interop_error(&e);
                    return;
                }
            };

            let source = match module {
                Some(path) => ModuleSource::Path(path),
                None => ModuleSource::Default,
            };

            let mut runtime = Runtime::new(config);
            let start = Instant::now();
            if let Err(e) = runtime.load(source) {
                print_interop_error(&e);
                return;
            }

            say!(Bright Black "Module loaded in: ", Green #start.elapsed());

            match run_demo(&mut runtime) {
                Ok(rows) => {
                    say!(Green Bold "\nRows:");
                    for row in rows {
                        match serde_json::to_string(&row) {
                            Ok(json) => {
                                say!("  ", json);
                            }
                            Err(e) => {
                                say!(Red "Can't render row: ", e);
                            }
                        }
                    }
                }
                Err(DemoError::Interop(e)) => print_interop_error(&e),
                Err(e) => {
                    say!(Red e);
                }
            }
        }
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let mut module = None;
    let mut config = None;
    let mut index = 0usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "help" | "--help" | "-h" => return Ok(Command::Help),

            "--config" => {
                let Some(path) = args.get(index + 1) else {
                    return Err(String::from("Missing value for --config"));
                };
                if path.starts_with("--") {
                    return Err(String::from("Missing value for --config"));
                }
                config = Some(PathBuf::from(path));
                index += 2;
            }

            _ if arg.starts_with("--") => {
                return Err(format!(
                    "Unknown flag: '{arg}'. The only supported flag is --config."
                ));
            }

            _ => {
                if module.is_some() {
                    return Err(String::from("Only one module path can be given."));
                }
                module = Some(PathBuf::from(arg));
                index += 1;
            }
        }
    }

    Ok(Command::Run { module, config })
}

// An explicit --config must exist, the default config file is optional
fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, InteropError> {
    match path {
        Some(path) => RuntimeConfig::from_file(path),
        None => {
            let default_path = Path::new(CONFIG_FILE_NAME);
            if default_path.exists() {
                RuntimeConfig::from_file(default_path)
            } else {
                Ok(RuntimeConfig::default())
            }
        }
    }
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "sqlwasm demo");
        say!("Usage: ", Bold "sqlwasm-demo ", Italic "[module.wasm] [--config <file>]");
    }
    say!(Green Bold "\nArguments:");
    say!("  [module.wasm]      - Module to load (default: module_path from the config)");
    say!("  --config <file>    - Runtime config (default: ", CONFIG_FILE_NAME, " if present)");
    say!("  help               - Shows this message");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
