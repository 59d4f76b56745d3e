use clap::Parser;
use log::info;
use ssprofilter::config::{normalize_args, Cli};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse_from(normalize_args(std::env::args()));
    let config = cli.resolve()?;
    info!(
        "running {} on {} with patterns from {}",
        config.calc_type,
        config.input.display(),
        config.smarts.display()
    );

    let summary = ssprofilter::run(&config)?;
    info!("{summary}");

    Ok(())
}
