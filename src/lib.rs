use std::{fs::File, io::BufWriter, path::Path};

use chem::{MolFormat, MolReader, MolWriter};
use config::{CalcType, Config};
use log::info;
use patterns::PatternTable;
use process::{ProfileWriter, StreamError, Summary};

pub use bindings::VectorBindings;
pub use error::{Error, FileKind, Result};

pub mod chem;

pub mod bindings;
pub mod config;
pub mod patterns;
pub mod process;

mod error;

fn create(path: &Path, kind: FileKind) -> Result<BufWriter<File>> {
    let f = File::create(path).map_err(|source| Error::Open {
        kind,
        path: path.to_owned(),
        source,
    })?;
    Ok(BufWriter::new(f))
}

fn detect_format(path: &Path) -> Result<MolFormat> {
    MolFormat::from_path(path).ok_or_else(|| Error::Format {
        path: path.to_owned(),
    })
}

/// load the bindings and patterns named in `config`, then stream the input
/// file through them. nothing is written until the patterns have compiled
pub fn run(config: &Config) -> Result<Summary> {
    let bindings = match &config.vectorbind {
        Some(path) => VectorBindings::load(path)?,
        None => VectorBindings::default(),
    };
    let table =
        PatternTable::load(&config.smarts, config.calc_type, &bindings)?;
    info!(
        "loaded {} patterns and {} vector bindings for {}",
        table.len(),
        bindings.len(),
        config.calc_type
    );

    let in_format = detect_format(&config.input)?;
    let out_format = match config.calc_type {
        CalcType::Filter => Some(detect_format(&config.output)?),
        CalcType::Profile => None,
    };
    let mols =
        MolReader::open(&config.input, in_format).map_err(|source| {
            Error::Open {
                kind: FileKind::Input,
                path: config.input.clone(),
                source,
            }
        })?;
    info!("reading {in_format} from {}", config.input.display());

    let stream_err = |e: StreamError| match e {
        StreamError::Read(source) => Error::Io {
            path: config.input.clone(),
            source,
        },
        StreamError::Write(source) => Error::Io {
            path: config.output.clone(),
            source,
        },
    };
    let write_err = |source: std::io::Error| Error::Io {
        path: config.output.clone(),
        source,
    };

    let summary = match out_format {
        Some(format) => {
            let out = create(&config.output, FileKind::Output)?;
            let mut out = MolWriter::new(out, format);
            let summary =
                process::filter(mols, &table, &mut out).map_err(stream_err)?;
            out.finish().map_err(write_err)?;
            summary
        }
        None => {
            let out = create(&config.output, FileKind::Profile)?;
            let mut out =
                ProfileWriter::new(out, table.labels()).map_err(write_err)?;
            let summary =
                process::profile(mols, &table, &mut out).map_err(stream_err)?;
            out.finish().map_err(write_err)?;
            summary
        }
    };
    Ok(summary)
}
