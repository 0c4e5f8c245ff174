#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::{IsTerminal, Write};

use xom_cli::args::CliArgs;
use xom_cli::driver;

fn main() -> Result<()> {
    // Only installs a subscriber when XOM_LOG or RUST_LOG is set.
    xom::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let color = std::io::stdout().is_terminal() && std::io::stderr().is_terminal();
    let output = driver::run(&args, color)?;

    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    if output.exit_code != driver::EXIT_SUCCESS {
        std::process::exit(output.exit_code);
    }
    Ok(())
}
