//! Output alphabet loaded from an `alphabet.txt` file.
//!
//! Format: one symbol per line.  Lines starting with `#` are comments; a
//! literal `#` symbol is written as `\#`.  A line holding a single space
//! declares the space symbol, though space is always accepted regardless.
//!
//! The alphabet constrains what the engine may emit: [`Alphabet::normalize`]
//! maps raw backend text onto it.

use std::collections::BTreeSet;
use std::path::Path;

use super::adapter::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    symbols: BTreeSet<char>,
    has_uppercase: bool,
}

impl Alphabet {
    /// Read and parse an alphabet file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::MissingFile {
            kind: "alphabet",
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse alphabet file contents.
    ///
    /// ```
    /// use live_stt::engine::Alphabet;
    ///
    /// let alphabet = Alphabet::parse("# letters\na\nb\n'\n").unwrap();
    /// assert_eq!(alphabet.len(), 3);
    /// ```
    pub fn parse(content: &str) -> Result<Self, EngineError> {
        let mut symbols = BTreeSet::new();

        for raw in content.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let symbol = if line == "\\#" { "#" } else { line };
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    if c != ' ' {
                        symbols.insert(c);
                    }
                }
                _ => {
                    return Err(EngineError::InvalidAlphabet(format!(
                        "symbol {symbol:?} is not a single character"
                    )))
                }
            }
        }

        if symbols.is_empty() {
            return Err(EngineError::InvalidAlphabet("no symbols defined".into()));
        }

        let has_uppercase = symbols.iter().any(|c| c.is_uppercase());
        Ok(Self {
            symbols,
            has_uppercase,
        })
    }

    /// Number of non-space symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        c == ' ' || self.symbols.contains(&c)
    }

    /// Restrict `text` to this alphabet.
    ///
    /// Letters are lower-cased first when the alphabet has no upper-case
    /// symbols.  Whitespace runs collapse to one space; every other
    /// character outside the alphabet is removed.
    ///
    /// ```
    /// use live_stt::engine::Alphabet;
    ///
    /// let alphabet = Alphabet::parse("a\nb\nc\nd\ne\nh\nl\no\nr\nw\n'\n").unwrap();
    /// assert_eq!(alphabet.normalize(" Hello,  World! "), "hello world");
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pending_space = false;

        let folded: String = if self.has_uppercase {
            text.to_owned()
        } else {
            text.to_lowercase()
        };

        for c in folded.chars() {
            if c.is_whitespace() {
                pending_space = !out.is_empty();
                continue;
            }
            if !self.symbols.contains(&c) {
                continue;
            }
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
        out
    }
}
