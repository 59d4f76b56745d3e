//! Streaming the molecules through a pattern table.

use std::{
    fmt::Display,
    io::{self, Write},
};

use log::{trace, warn};
use thiserror::Error;

use crate::{
    chem::{Molecule, MolWriter, ReadError},
    patterns::PatternTable,
};

/// molecule counts for a finished run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// records read successfully
    pub read: usize,
    /// records that could not be parsed
    pub skipped: usize,
    /// molecules written, or table rows in profile mode
    pub written: usize,
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "read {} molecules, skipped {} invalid records, wrote {}",
            self.read, self.skipped, self.written
        )
    }
}

/// a fatal I/O error on one side of the stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to read molecules: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

/// whitespace-separated table of match counts with one header line
pub struct ProfileWriter<W: Write> {
    out: W,
}

impl<W: Write> ProfileWriter<W> {
    /// write the `Name label...` header and return the writer
    pub fn new<'a>(
        mut out: W,
        labels: impl IntoIterator<Item = &'a str>,
    ) -> io::Result<Self> {
        write!(out, "Name")?;
        for label in labels {
            write!(out, " {label}")?;
        }
        writeln!(out)?;
        Ok(Self { out })
    }

    pub fn row(&mut self, title: &str, counts: &[usize]) -> io::Result<()> {
        write!(self.out, "{title}")?;
        for c in counts {
            write!(self.out, " {c}")?;
        }
        writeln!(self.out)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// unwrap the next readable molecule, counting and logging bad records
fn next_molecule(
    item: Result<Molecule, ReadError>,
    summary: &mut Summary,
) -> Result<Option<Molecule>, StreamError> {
    match item {
        Ok(mol) => {
            summary.read += 1;
            Ok(Some(mol))
        }
        Err(ReadError::Io(e)) => Err(StreamError::Read(e)),
        Err(e @ ReadError::Record { .. }) => {
            warn!("skipping {e}");
            summary.skipped += 1;
            Ok(None)
        }
    }
}

/// write one row of match counts per molecule in `mols`
pub fn profile<W: Write>(
    mols: impl IntoIterator<Item = Result<Molecule, ReadError>>,
    table: &PatternTable,
    out: &mut ProfileWriter<W>,
) -> Result<Summary, StreamError> {
    let mut summary = Summary::default();
    for item in mols {
        let Some(mol) = next_molecule(item, &mut summary)? else {
            continue;
        };
        let counts = table.counts(&mol);
        trace!("{} => {counts:?}", mol.title);
        out.row(&mol.title, &counts).map_err(StreamError::Write)?;
        summary.written += 1;
    }
    Ok(summary)
}

/// write every molecule in `mols` that satisfies all of the ranges in
/// `table`
pub fn filter<W: Write>(
    mols: impl IntoIterator<Item = Result<Molecule, ReadError>>,
    table: &PatternTable,
    out: &mut MolWriter<W>,
) -> Result<Summary, StreamError> {
    let mut summary = Summary::default();
    for item in mols {
        let Some(mol) = next_molecule(item, &mut summary)? else {
            continue;
        };
        let keep = table.accepts(&mol);
        trace!("{} => {}", mol.title, if keep { "kept" } else { "rejected" });
        if keep {
            out.write(&mol).map_err(StreamError::Write)?;
            summary.written += 1;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{
        bindings::VectorBindings,
        chem::{MolFormat, MolReader},
        config::CalcType,
    };

    use super::*;

    fn table(s: &str, kind: CalcType) -> PatternTable {
        PatternTable::from_reader(
            s.as_bytes(),
            Path::new("p.txt"),
            kind,
            &VectorBindings::default(),
        )
        .unwrap()
    }

    fn run_profile(table: &PatternTable, input: &str) -> (String, Summary) {
        let mols = MolReader::new(input.as_bytes(), MolFormat::Smiles);
        let mut w = ProfileWriter::new(Vec::new(), table.labels()).unwrap();
        let summary = profile(mols, table, &mut w).unwrap();
        (String::from_utf8(w.finish().unwrap()).unwrap(), summary)
    }

    fn run_filter(table: &PatternTable, input: &str) -> (String, Summary) {
        let mols = MolReader::new(input.as_bytes(), MolFormat::Smiles);
        let mut w = MolWriter::new(Vec::new(), MolFormat::Smiles);
        let summary = filter(mols, table, &mut w).unwrap();
        (String::from_utf8(w.finish().unwrap()).unwrap(), summary)
    }

    #[test]
    fn profile_single_ring() {
        let t = table("Ring c1ccccc1\n", CalcType::Profile);
        let (got, summary) = run_profile(&t, "c1ccccc1 M1\n");
        assert_eq!(got, "Name Ring\nM1 1\n");
        assert_eq!(
            summary,
            Summary {
                read: 1,
                skipped: 0,
                written: 1
            }
        );
    }

    #[test]
    fn profile_rows() {
        let t = table(
            "Ring c1ccccc1\nCarbonyl [CX3]=O\nN [#7]\n",
            CalcType::Profile,
        );
        let (got, _) = run_profile(
            &t,
            "c1ccccc1-c1ccccc1 biphenyl\nCC(=O)NC(C)=O diacetamide\nC methane\n",
        );
        let want = "\
Name Ring Carbonyl N
biphenyl 2 0 0
diacetamide 0 2 1
methane 0 0 0
";
        assert_eq!(got, want);
    }

    #[test]
    fn profile_empty_table() {
        let t = table("", CalcType::Profile);
        let (got, summary) = run_profile(&t, "C a\nCC b\n");
        assert_eq!(got, "Name\na\nb\n");
        assert_eq!(summary.written, 2);
    }

    #[test]
    fn profile_skips_bad_records() {
        let t = table("Ring c1ccccc1\n", CalcType::Profile);
        let (got, summary) = run_profile(&t, "c1ccccc1 M1\nc1cc( M2\nC M3\n");
        assert_eq!(got, "Name Ring\nM1 1\nM3 0\n");
        assert_eq!(
            summary,
            Summary {
                read: 2,
                skipped: 1,
                written: 2
            }
        );
    }

    #[test]
    fn filter_keeps_benzene() {
        let t = table("c1ccccc1 1 1\n", CalcType::Filter);
        let (got, summary) =
            run_filter(&t, "Cc1ccccc1 toluene\nC1CCCCC1 cyclohexane\n");
        assert_eq!(got, "Cc1ccccc1 toluene\n");
        assert_eq!(summary.read, 2);
        assert_eq!(summary.written, 1);
    }

    #[test]
    fn filter_ranges() {
        let t = table("[OX2H] 1 2\nc1ccccc1 0 1\n", CalcType::Filter);
        let input = "\
Oc1ccccc1 phenol
Oc1ccc(O)cc1O triol
OCCO glycol
c1ccccc1-c1ccccc1O biphenylol
CC ethane
";
        let (got, _) = run_filter(&t, input);
        assert_eq!(got, "Oc1ccccc1 phenol\nOCCO glycol\n");
    }

    #[test]
    fn filter_empty_table_accepts_all() {
        let t = table("", CalcType::Filter);
        let input = "CCO ethanol\nc1ccccc1 benzene\n";
        let (got, summary) = run_filter(&t, input);
        assert_eq!(got, input);
        assert_eq!(summary.written, 2);
    }

    #[test]
    fn summary_display() {
        let s = Summary {
            read: 10,
            skipped: 1,
            written: 4,
        };
        assert_eq!(
            s.to_string(),
            "read 10 molecules, skipped 1 invalid records, wrote 4"
        );
    }

    #[test]
    fn stream_error_display() {
        use std::error::Error as _;

        let e = StreamError::Write(io::Error::other("disk full"));
        assert_eq!(e.to_string(), "failed to write output: disk full");
        assert_eq!(e.source().unwrap().to_string(), "disk full");

        let e = StreamError::Read(io::Error::other("bad sector"));
        assert_eq!(e.to_string(), "failed to read molecules: bad sector");
    }
}
