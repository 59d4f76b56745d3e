//! Vector bindings: named SMARTS fragments substituted into patterns before
//! they are compiled. A pattern refers to the binding `Hal` as `$Hal`, and
//! the reference is replaced by the recursive form `$(definition)`.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::{debug, warn};

use crate::error::{Error, FileKind, Result};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorBindings(Vec<(String, String)>);

impl VectorBindings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|source| Error::Open {
            kind: FileKind::VectorBinding,
            path: path.to_owned(),
            source,
        })?;
        Self::from_reader(BufReader::new(f), path)
    }

    /// read `name definition` pairs from `reader`. `path` is only used for
    /// error messages
    pub fn from_reader(reader: impl BufRead, path: &Path) -> Result<Self> {
        let mut defs = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| Error::Io {
                path: path.to_owned(),
                source,
            })?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(name), Some(def)) = (fields.next(), fields.next()) else {
                return Err(Error::Syntax {
                    path: path.to_owned(),
                    line: i + 1,
                    msg: "expected a binding name and definition".to_owned(),
                });
            };
            if fields.next().is_some() {
                warn!("{}:{}: ignoring extra fields", path.display(), i + 1);
            }
            debug!("vector binding {name} = {def}");
            defs.push((name.to_owned(), def.to_owned()));
        }
        Ok(Self(defs))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// replace every `$name` reference in `smarts`, repeating until the
    /// definitions are fully expanded. references left to names without a
    /// binding and bindings that expand to themselves are errors
    pub fn apply(&self, smarts: &str) -> Result<String> {
        let mut s = smarts.to_owned();
        // each pass resolves at least one level of nesting, and a chain of
        // distinct bindings can't nest deeper than the table is long
        for _ in 0..=self.0.len() {
            let next = self.expand_once(&s);
            if next == s {
                return match first_reference(&s) {
                    Some(name) => Err(Error::UnknownBinding {
                        name: name.to_owned(),
                        smarts: smarts.to_owned(),
                    }),
                    None => Ok(s),
                };
            }
            s = next;
        }
        Err(Error::BindingCycle {
            name: first_reference(&s).unwrap_or_default().to_owned(),
            smarts: smarts.to_owned(),
        })
    }

    /// one substitution of every binding, in definition order
    fn expand_once(&self, smarts: &str) -> String {
        let mut s = smarts.to_owned();
        for (name, def) in &self.0 {
            s = replace_reference(&s, name, def);
        }
        s
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// the name in the first `$name` reference in `smarts`, if any
fn first_reference(smarts: &str) -> Option<&str> {
    smarts.match_indices('$').find_map(|(i, _)| {
        let after = &smarts[i + 1..];
        let len = after.find(|c| !is_name_char(c)).unwrap_or(after.len());
        (len > 0).then(|| &after[..len])
    })
}

fn replace_reference(smarts: &str, name: &str, def: &str) -> String {
    let mut out = String::with_capacity(smarts.len());
    let mut rest = smarts;
    while let Some(i) = rest.find('$') {
        out.push_str(&rest[..i]);
        let after = &rest[i + 1..];
        let whole_name = after.starts_with(name)
            && !after[name.len()..].starts_with(is_name_char);
        if whole_name && !name.is_empty() {
            out.push_str("$(");
            out.push_str(def);
            out.push(')');
            rest = &after[name.len()..];
        } else {
            out.push('$');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}
