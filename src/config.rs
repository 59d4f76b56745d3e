use std::{
    fmt::Display,
    fs::read_to_string,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::{Error, FileKind, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcType {
    /// keep only the molecules whose match counts fall in every range
    Filter,
    /// write a table of match counts for every molecule
    Profile,
}

impl Display for CalcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcType::Filter => write!(f, "filter"),
            CalcType::Profile => write!(f, "profile"),
        }
    }
}

/// Profile or filter a molecule file against a list of SMARTS patterns.
#[derive(Debug, Default, Parser)]
pub struct Cli {
    /// The molecule file to read. The format is taken from the extension.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Where to write the output: the filtered molecules in filter mode, or
    /// the table of match counts in profile mode.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// The pattern file. In filter mode each line is `smarts min max`, in
    /// profile mode each line is `label smarts`.
    #[arg(short, long)]
    pub smarts: Option<PathBuf>,

    /// Optional file of `name definition` pairs. `$name` in a pattern is
    /// replaced by the definition before compiling.
    #[arg(short, long)]
    pub vectorbind: Option<PathBuf>,

    /// The calculation to run.
    #[arg(short = 't', long = "type", value_enum)]
    pub calc_type: Option<CalcType>,

    /// A TOML file supplying any of the other options. Values given on the
    /// command line take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// long option names that may also be spelled with a single dash
const LONG_NAMES: [&str; 7] = [
    "input",
    "output",
    "smarts",
    "vectorbind",
    "type",
    "config",
    "help",
];

/// rewrite single-dash long options like `-input` or `-type=filter` into
/// their double-dash form so clap can parse them. everything else is passed
/// through untouched
pub fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            let Some(rest) = arg.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LONG_NAMES.contains(&name) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

/// the contents of a `--config` run file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub smarts: Option<PathBuf>,
    pub vectorbind: Option<PathBuf>,
    #[serde(rename = "type")]
    pub calc_type: Option<CalcType>,
}

impl RunFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = read_to_string(path).map_err(|source| Error::Open {
            kind: FileKind::Config,
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&s).map_err(|source| Error::Config {
            path: path.to_owned(),
            source,
        })
    }
}

/// fully resolved settings for a single run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub smarts: PathBuf,
    pub vectorbind: Option<PathBuf>,
    pub calc_type: CalcType,
}

impl Cli {
    /// merge the command line with the run file named by `--config`, if any
    pub fn resolve(self) -> Result<Config> {
        let file = match &self.config {
            Some(path) => RunFile::load(path)?,
            None => RunFile::default(),
        };
        Ok(Config {
            input: self.input.or(file.input).ok_or(Error::Missing("input"))?,
            output: self
                .output
                .or(file.output)
                .ok_or(Error::Missing("output"))?,
            smarts: self
                .smarts
                .or(file.smarts)
                .ok_or(Error::Missing("smarts"))?,
            vectorbind: self.vectorbind.or(file.vectorbind),
            calc_type: self
                .calc_type
                .or(file.calc_type)
                .ok_or(Error::Missing("type"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn single_dash_long_options() {
        let got = normalize_args(args(
            "ssprofilter -input a.sdf -o b.sdf -smarts=p.txt --type filter -x",
        ));
        assert_eq!(
            got,
            args("ssprofilter --input a.sdf -o b.sdf --smarts=p.txt --type filter -x")
        );
    }

    #[test]
    fn parse_single_dash_flags() {
        let cli = Cli::parse_from(normalize_args(args(
            "ssprofilter -input in.smi -output out.txt -smarts p.txt \
             -vectorbind vb.txt -type profile",
        )));
        let config = cli.resolve().unwrap();
        assert_eq!(
            config,
            Config {
                input: "in.smi".into(),
                output: "out.txt".into(),
                smarts: "p.txt".into(),
                vectorbind: Some("vb.txt".into()),
                calc_type: CalcType::Profile,
            }
        );
    }

    #[test]
    fn short_flags() {
        let cli = Cli::parse_from(args(
            "ssprofilter -i in.sdf -o out.sdf -s p.txt -t filter",
        ));
        let config = cli.resolve().unwrap();
        assert_eq!(config.calc_type, CalcType::Filter);
        assert_eq!(config.vectorbind, None);
    }

    #[test]
    fn missing_option() {
        let cli = Cli::parse_from(args("ssprofilter -i in.sdf -s p.txt"));
        let err = cli.resolve().unwrap_err();
        assert!(matches!(err, Error::Missing("output")), "got {err:?}");
    }

    #[test]
    fn bad_type() {
        let got = Cli::try_parse_from(args("ssprofilter -t count"));
        assert!(got.is_err());
    }

    #[test]
    fn run_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            r#"
input = "in.sdf"
output = "out.sdf"
smarts = "filter.txt"
type = "filter"
"#,
        )
        .unwrap();
        let cli = Cli {
            output: Some("other.sdf".into()),
            config: Some(path),
            ..Default::default()
        };
        let config = cli.resolve().unwrap();
        assert_eq!(config.input, PathBuf::from("in.sdf"));
        assert_eq!(config.output, PathBuf::from("other.sdf"));
        assert_eq!(config.calc_type, CalcType::Filter);
    }

    #[test]
    fn run_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "type = \"sort\"\n").unwrap();
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        assert!(matches!(cli.resolve(), Err(Error::Config { .. })));

        let cli = Cli {
            config: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        assert!(matches!(
            cli.resolve(),
            Err(Error::Open {
                kind: FileKind::Config,
                ..
            })
        ));
    }
}
