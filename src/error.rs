use std::{fmt::Display, io, path::PathBuf};

use thiserror::Error;

use crate::chem::SmartsError;

/// the role a file plays in a run, used to name it in error messages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Input,
    Output,
    Profile,
    Smarts,
    VectorBinding,
    Config,
}

impl Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileKind::Input => "input",
            FileKind::Output => "output",
            FileKind::Profile => "profile",
            FileKind::Smarts => "SMARTS",
            FileKind::VectorBinding => "vector binding",
            FileKind::Config => "config",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to open {kind} file {}: {source}", path.display())]
    Open {
        kind: FileKind,
        path: PathBuf,
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}:{line}: {msg}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    #[error("unable to parse {smarts}: {source}")]
    Smarts { smarts: String, source: SmartsError },

    #[error("vector binding ${name} in {smarts} refers back to itself")]
    BindingCycle { name: String, smarts: String },

    #[error("undefined vector binding ${name} in {smarts}")]
    UnknownBinding { name: String, smarts: String },

    #[error("unrecognized molecule file format for {}", path.display())]
    Format { path: PathBuf },

    #[error("missing required option -{0}")]
    Missing(&'static str),

    #[error("failed to parse config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
