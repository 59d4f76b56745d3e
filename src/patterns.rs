//! The pattern table. Filter mode reads `smarts min max` lines, profile mode
//! reads `label smarts` lines. Both produce the same entries in file order.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    ops::RangeInclusive,
    path::Path,
};

use log::{debug, warn};

use crate::{
    bindings::VectorBindings,
    chem::{Molecule, Query},
    config::CalcType,
    error::{Error, FileKind, Result},
};

#[derive(Clone, Debug)]
pub struct PatternEntry {
    /// column header in profile mode, the pattern as written in filter mode
    pub label: String,

    /// accepted match counts. only present in filter mode
    pub range: Option<RangeInclusive<usize>>,

    pub query: Query,
}

impl PatternEntry {
    /// whether `count` is inside this entry's range. entries without a range
    /// accept anything
    pub fn accepts_count(&self, count: usize) -> bool {
        self.range.as_ref().map_or(true, |r| r.contains(&count))
    }
}

#[derive(Clone, Debug)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
}

impl PatternTable {
    pub fn load(
        path: impl AsRef<Path>,
        kind: CalcType,
        bindings: &VectorBindings,
    ) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|source| Error::Open {
            kind: FileKind::Smarts,
            path: path.to_owned(),
            source,
        })?;
        Self::from_reader(BufReader::new(f), path, kind, bindings)
    }

    pub fn from_reader(
        reader: impl BufRead,
        path: &Path,
        kind: CalcType,
        bindings: &VectorBindings,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| Error::Io {
                path: path.to_owned(),
                source,
            })?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let syntax = |msg: String| Error::Syntax {
                path: path.to_owned(),
                line: i + 1,
                msg,
            };
            let mut fields = line.split_whitespace();
            let (label, smarts, range) = match kind {
                CalcType::Filter => {
                    let (Some(smarts), Some(min), Some(max)) =
                        (fields.next(), fields.next(), fields.next())
                    else {
                        return Err(syntax(
                            "expected a pattern, minimum and maximum count"
                                .to_owned(),
                        ));
                    };
                    let min: usize = min.parse().map_err(|e| {
                        syntax(format!("invalid minimum `{min}`: {e}"))
                    })?;
                    let max: usize = max.parse().map_err(|e| {
                        syntax(format!("invalid maximum `{max}`: {e}"))
                    })?;
                    if min > max {
                        warn!(
                            "{}:{}: minimum {min} exceeds maximum {max}, \
                             no molecule can pass",
                            path.display(),
                            i + 1
                        );
                    }
                    (smarts, smarts, Some(min..=max))
                }
                CalcType::Profile => {
                    let (Some(label), Some(smarts)) =
                        (fields.next(), fields.next())
                    else {
                        return Err(syntax(
                            "expected a label and a pattern".to_owned(),
                        ));
                    };
                    (label, smarts, None)
                }
            };
            if fields.next().is_some() {
                warn!("{}:{}: ignoring extra fields", path.display(), i + 1);
            }

            let expanded = bindings.apply(smarts)?;
            debug!("{label}: {expanded}");
            let query = Query::parse(&expanded).map_err(|source| {
                Error::Smarts {
                    smarts: expanded.clone(),
                    source,
                }
            })?;
            entries.push(PatternEntry {
                label: label.to_owned(),
                range,
                query,
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// the number of unique matches of every pattern in `mol`, in table order
    pub fn counts(&self, mol: &Molecule) -> Vec<usize> {
        self.entries
            .iter()
            .map(|e| e.query.count_matches(mol))
            .collect()
    }

    /// whether every pattern's match count in `mol` is inside its range.
    /// stops at the first pattern out of range
    pub fn accepts(&self, mol: &Molecule) -> bool {
        self.entries
            .iter()
            .all(|e| e.accepts_count(e.query.count_matches(mol)))
    }
}
