//! Molecule input and output and SMARTS matching on top of RDKit. Records are
//! kept as read, so a molecule written back out in its input format is
//! unchanged, and only conversions go through RDKit's writers.

use std::{
    fmt::Display,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use cxx::let_cxx_string;
use rdkit::{substruct_match, ROMol, RWMol, SubstructMatchParameters};
use rdkit_sys::rw_mol_ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid record starting at line {line}: {msg}")]
    Record { line: usize, msg: String },
}

#[derive(Debug, Error)]
pub enum SmartsError {
    #[error("RDKit could not parse the pattern")]
    Invalid,

    #[error("RDKit raised an exception: {0}")]
    Exception(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MolFormat {
    Sdf,
    Smiles,
}

impl MolFormat {
    /// detect the format from the extension of `path`, ignoring case
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "sdf" | "sd" | "mol" | "mdl" => Some(Self::Sdf),
            "smi" | "smiles" | "ism" | "can" => Some(Self::Smiles),
            _ => None,
        }
    }
}

impl Display for MolFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MolFormat::Sdf => write!(f, "SDF"),
            MolFormat::Smiles => write!(f, "SMILES"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Molecule {
    pub title: String,
    mol: ROMol,
    /// the record as it appeared in the input, newline terminated
    record: String,
    format: MolFormat,
}

impl Molecule {
    pub fn from_smiles(smiles: &str, title: &str) -> Result<Self, String> {
        let mol = ROMol::from_smiles(smiles).map_err(|e| e.to_string())?;
        let record = if title.is_empty() {
            format!("{smiles}\n")
        } else {
            format!("{smiles} {title}\n")
        };
        Ok(Self {
            title: title.to_owned(),
            mol,
            record,
            format: MolFormat::Smiles,
        })
    }

    /// `lines` is a single SD record without its `$$$$` terminator
    pub fn from_sd_record(lines: &[String]) -> Result<Self, String> {
        let block = lines.join("\n");
        let mol = RWMol::from_mol_block(&block, true, true, false)
            .ok_or("RDKit could not parse the molecule block")?
            .to_ro_mol();
        Ok(Self {
            title: lines.first().map_or("", |t| t.trim()).to_owned(),
            mol,
            record: format!("{block}\n$$$$\n"),
            format: MolFormat::Sdf,
        })
    }

    pub fn smiles(&self) -> String {
        self.mol.as_smiles()
    }

    /// an SD record for this molecule, with the title on the first line
    fn sd_record(&self) -> String {
        let block = self.mol.to_molblock();
        let body = block.split_once('\n').map_or("", |(_, rest)| rest);
        let body = body.trim_end_matches('\n');
        format!("{}\n{body}\n$$$$\n", self.title)
    }
}

/// a compiled SMARTS pattern
#[derive(Clone, Debug)]
pub struct Query(ROMol);

impl Query {
    pub fn parse(smarts: &str) -> Result<Self, SmartsError> {
        let_cxx_string!(cxx_smarts = smarts);
        let ptr = rw_mol_ffi::smarts_to_mol(&cxx_smarts)
            .map_err(|e| SmartsError::Exception(e.what().to_owned()))?;
        if ptr.is_null() {
            return Err(SmartsError::Invalid);
        }
        // rdkit::RWMol does not expose its pointer, so it has to be built
        // again from the text once the pattern is known to parse
        let mol = RWMol::from_smarts(smarts)
            .map_err(|e| SmartsError::Exception(e.to_string()))?;
        Ok(Self(mol.to_ro_mol()))
    }

    /// the number of unique matches of the pattern in `mol`
    pub fn count_matches(&self, mol: &Molecule) -> usize {
        let mut params = SubstructMatchParameters::default();
        params.set_uniquify(true);
        substruct_match(&mol.mol, &self.0, &params).len()
    }
}

/// one molecule per line: a SMILES string optionally followed by whitespace
/// and a title
pub struct SmilesReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> Iterator for SmilesReader<R> {
    type Item = Result<Molecule, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (smi, title) = line
                .split_once(char::is_whitespace)
                .unwrap_or((line, ""));
            return Some(Molecule::from_smiles(smi, title.trim()).map_err(
                |msg| ReadError::Record {
                    line: self.line_no,
                    msg,
                },
            ));
        }
    }
}

/// records separated by `$$$$` lines
pub struct SdfReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> Iterator for SdfReader<R> {
    type Item = Result<Molecule, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = Vec::new();
        let start = self.line_no + 1;
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_no += 1;
                    if line.trim_end() == "$$$$" {
                        break;
                    }
                    record.push(line);
                }
                Some(Err(e)) => return Some(Err(e.into())),
                None if record.iter().all(|l| l.trim().is_empty()) => {
                    return None
                }
                None => break,
            }
        }
        Some(Molecule::from_sd_record(&record).map_err(|msg| {
            ReadError::Record { line: start, msg }
        }))
    }
}

pub enum MolReader<R> {
    Sdf(SdfReader<R>),
    Smiles(SmilesReader<R>),
}

impl<R: BufRead> MolReader<R> {
    pub fn new(reader: R, format: MolFormat) -> Self {
        let lines = reader.lines();
        match format {
            MolFormat::Sdf => Self::Sdf(SdfReader { lines, line_no: 0 }),
            MolFormat::Smiles => {
                Self::Smiles(SmilesReader { lines, line_no: 0 })
            }
        }
    }
}

impl MolReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, format: MolFormat) -> io::Result<Self> {
        let f = File::open(path)?;
        Ok(Self::new(BufReader::new(f), format))
    }
}

impl<R: BufRead> Iterator for MolReader<R> {
    type Item = Result<Molecule, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            MolReader::Sdf(r) => r.next(),
            MolReader::Smiles(r) => r.next(),
        }
    }
}

pub struct MolWriter<W: Write> {
    out: W,
    format: MolFormat,
}

impl<W: Write> MolWriter<W> {
    pub fn new(out: W, format: MolFormat) -> Self {
        Self { out, format }
    }

    pub fn write(&mut self, mol: &Molecule) -> io::Result<()> {
        match self.format {
            f if f == mol.format => self.out.write_all(mol.record.as_bytes()),
            MolFormat::Sdf => self.out.write_all(mol.sd_record().as_bytes()),
            MolFormat::Smiles if mol.title.is_empty() => {
                writeln!(self.out, "{}", mol.smiles())
            }
            MolFormat::Smiles => {
                writeln!(self.out, "{} {}", mol.smiles(), mol.title)
            }
        }
    }

    /// flush and return the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
