//! read a molecule file and write it back out in the format given by the
//! output file's extension

use std::fs::File;
use std::io::BufWriter;

use anyhow::{bail, Context};
use log::warn;
use ssprofilter::chem::{MolFormat, MolReader, MolWriter, ReadError};

fn detect(path: &str) -> anyhow::Result<MolFormat> {
    MolFormat::from_path(path)
        .with_context(|| format!("unrecognized molecule file format for {path}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<_> = std::env::args().collect();
    if args.len() < 3 {
        bail!("Usage: convert <input> <output>");
    }
    let (input, output) = (&args[1], &args[2]);

    let mols = MolReader::open(input, detect(input)?)
        .with_context(|| format!("unable to open input file {input}"))?;
    let out = File::create(output)
        .with_context(|| format!("unable to open output file {output}"))?;
    let mut out = MolWriter::new(BufWriter::new(out), detect(output)?);

    for mol in mols {
        match mol {
            Ok(mol) => out.write(&mol)?,
            Err(e @ ReadError::Record { .. }) => warn!("skipping {e}"),
            Err(e) => return Err(e).context(format!("reading {input}")),
        }
    }
    out.finish()?;

    Ok(())
}
