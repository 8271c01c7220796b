//! Identifiers and symbols

use serde::{Deserialize, Serialize};

/// Whether an identifier was written delimited (`"Foo"`) or regular (`foo`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    /// Delimited identifier, matched exactly
    Sensitive,
    /// Regular identifier, matched ignoring case
    Insensitive,
}

/// A single identifier part
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Text as written, without delimiters
    pub text: String,
    /// Case sensitivity of the symbol
    pub case: CaseSensitivity,
}

impl Symbol {
    /// Create a regular (case-insensitive) symbol
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case: CaseSensitivity::Insensitive,
        }
    }

    /// Create a delimited (case-sensitive) symbol
    pub fn delimited(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case: CaseSensitivity::Sensitive,
        }
    }

    /// True if the symbol was written delimited
    pub fn is_delimited(&self) -> bool {
        self.case == CaseSensitivity::Sensitive
    }

    /// Check whether this symbol refers to `name` under its case rules
    pub fn matches(&self, name: &str) -> bool {
        match self.case {
            CaseSensitivity::Sensitive => self.text == name,
            CaseSensitivity::Insensitive => self.text.eq_ignore_ascii_case(name),
        }
    }

    /// Lookup key: lower-cased for regular symbols, verbatim for delimited ones
    pub fn normalized(&self) -> String {
        match self.case {
            CaseSensitivity::Sensitive => self.text.clone(),
            CaseSensitivity::Insensitive => self.text.to_lowercase(),
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.case {
            CaseSensitivity::Sensitive => write!(f, "\"{}\"", self.text),
            CaseSensitivity::Insensitive => f.write_str(&self.text),
        }
    }
}

/// A possibly-qualified name (`a` or `a.b.c`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    /// Single-part name
    Symbol(Symbol),
    /// Multi-part name
    Qualified {
        /// First part
        root: Symbol,
        /// Remaining parts, in order
        steps: Vec<Symbol>,
    },
}

impl Identifier {
    /// Single-part regular identifier
    pub fn regular(text: impl Into<String>) -> Self {
        Identifier::Symbol(Symbol::regular(text))
    }

    /// Single-part delimited identifier
    pub fn delimited(text: impl Into<String>) -> Self {
        Identifier::Symbol(Symbol::delimited(text))
    }

    /// The first part
    pub fn root(&self) -> &Symbol {
        match self {
            Identifier::Symbol(s) => s,
            Identifier::Qualified { root, .. } => root,
        }
    }

    /// Parts after the first
    pub fn steps(&self) -> &[Symbol] {
        match self {
            Identifier::Symbol(_) => &[],
            Identifier::Qualified { steps, .. } => steps,
        }
    }

    /// The last part
    pub fn last(&self) -> &Symbol {
        self.steps().last().unwrap_or_else(|| self.root())
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        1 + self.steps().len()
    }

    /// Always false; an identifier has at least one part
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True for multi-part names
    pub fn is_qualified(&self) -> bool {
        !self.steps().is_empty()
    }

    /// Append parts, producing a qualified identifier when any are given
    pub fn extend(self, more: impl IntoIterator<Item = Symbol>) -> Identifier {
        let (root, mut steps) = match self {
            Identifier::Symbol(root) => (root, Vec::new()),
            Identifier::Qualified { root, steps } => (root, steps),
        };
        steps.extend(more);
        if steps.is_empty() {
            Identifier::Symbol(root)
        } else {
            Identifier::Qualified { root, steps }
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root())?;
        for step in self.steps() {
            write!(f, ".{step}")?;
        }
        Ok(())
    }
}

impl From<Symbol> for Identifier {
    fn from(symbol: Symbol) -> Self {
        Identifier::Symbol(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_matching() {
        assert!(Symbol::regular("Foo").matches("foo"));
        assert!(Symbol::regular("foo").matches("FOO"));
        assert!(Symbol::delimited("Foo").matches("Foo"));
        assert!(!Symbol::delimited("Foo").matches("foo"));
    }

    #[test]
    fn test_extend_identifier() {
        let id = Identifier::regular("a").extend(vec![Symbol::regular("b"), Symbol::regular("c")]);
        assert_eq!(id.len(), 3);
        assert_eq!(id.to_string(), "a.b.c");
        assert_eq!(id.last().text, "c");

        let unchanged = Identifier::regular("a").extend(vec![]);
        assert!(!unchanged.is_qualified());
    }

    #[test]
    fn test_display_delimited() {
        let id = Identifier::delimited("Mixed").extend(vec![Symbol::regular("x")]);
        assert_eq!(id.to_string(), "\"Mixed\".x");
    }
}
