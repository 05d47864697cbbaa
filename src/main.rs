mod cli;
mod logging;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use irrigation_demand::file_input::{read_crop_calendar, read_environmental};
use irrigation_demand::{RunConfig, compute_requirements, report};

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = RunConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let run = &mut config.run;
    if let Some(first) = cli.first {
        run.first_period = first;
    }
    if let Some(last) = cli.last {
        run.last_period = last;
    }
    if let Some(sp) = cli.spreading_period {
        run.spreading_period = sp;
    }
    if let Some(efficiency) = cli.efficiency {
        run.efficiency = efficiency;
    }

    let environment = read_environmental(&config.input.environmental)?;
    let calendar = read_crop_calendar(&config.input.crop_calendar)?;
    tracing::info!(
        periods = environment.periods(),
        stages = calendar.stages(),
        "input tables read"
    );

    let requirements =
        compute_requirements(&config.run, config.tolerances, &environment, &calendar)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_table(
        &mut out,
        &requirements,
        config.run.first_period,
        config.run.last_period,
    )?;
    out.flush()?;

    if let Some(path) = cli.output {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        report::write_csv(&mut writer, &requirements)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), "requirements written");
    }
    Ok(())
}
