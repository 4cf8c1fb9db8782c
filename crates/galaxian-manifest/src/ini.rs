use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IniError {
    #[error("malformed section heading on line {line}: {content:?}")]
    MalformedSection { line: usize, content: String },
    #[error("malformed syntax on line {line}: {content:?}")]
    MalformedSyntax { line: usize, content: String },
    #[error("bad key/value pair on line {line}: {content:?}")]
    BadKeyPair { line: usize, content: String },
}

/// One named section and its key/value pairs.
///
/// Keys and values are stored exactly as written — the dialect never strips
/// whitespace around either side of the `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    pub pairs: BTreeMap<String, String>,
}

/// A parsed manifest: sections in order of first appearance.
///
/// The empty-string section is the implicit global region before the first
/// heading and always exists. Re-declaring a section name later in the file
/// replaces its mapping but keeps its original position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

/// Whitespace the dialect permits outside comments and keypairs.
/// `\n` is absent (lines are already split); `\r` covers CRLF input.
fn is_wspace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0B' | '\x0C' | '\r')
}

impl IniDocument {
    /// Parse manifest text line by line.
    ///
    /// Per line: comments (`#` to end of line, anywhere) are stripped first;
    /// a line containing both `[` and `]` must be a well-formed heading even
    /// if it also contains `=`; a line without `=` must be whitespace-only;
    /// anything else splits on the first `=` into an untrimmed key and value.
    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut doc = IniDocument {
            sections: vec![IniSection {
                name: String::new(),
                pairs: BTreeMap::new(),
            }],
        };
        let mut current = 0usize;

        for (idx, raw) in text.split('\n').enumerate() {
            let line = idx + 1;
            let ln = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            };

            if ln.contains('[') && ln.contains(']') {
                let heading = ln.trim_matches(is_wspace);
                if !heading.starts_with('[') || !heading.ends_with(']') {
                    return Err(IniError::MalformedSection {
                        line,
                        content: ln.to_owned(),
                    });
                }
                let name = &heading[1..heading.len() - 1];
                current = doc.reset_section(name);
            } else if let Some((key, value)) = ln.split_once('=') {
                if key.is_empty() || value.is_empty() {
                    return Err(IniError::BadKeyPair {
                        line,
                        content: ln.to_owned(),
                    });
                }
                doc.sections[current]
                    .pairs
                    .insert(key.to_owned(), value.to_owned());
            } else if ln.chars().any(|c| !is_wspace(c)) {
                return Err(IniError::MalformedSyntax {
                    line,
                    content: ln.to_owned(),
                });
            }
        }

        Ok(doc)
    }

    /// Point `name` at a fresh empty mapping, returning its index.
    /// An existing section of the same name is replaced in place.
    fn reset_section(&mut self, name: &str) -> usize {
        if let Some(pos) = self.sections.iter().position(|s| s.name == name) {
            self.sections[pos].pairs = BTreeMap::new();
            pos
        } else {
            self.sections.push(IniSection {
                name: name.to_owned(),
                pairs: BTreeMap::new(),
            });
            self.sections.len() - 1
        }
    }

    /// The implicit global region before the first section heading.
    pub fn global(&self) -> &BTreeMap<String, String> {
        &self.sections[0].pairs
    }

    pub fn get(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.pairs)
    }

    /// Sections in order of first appearance, the global region first.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.sections.iter().map(|s| (s.name.as_str(), &s.pairs))
    }
}
