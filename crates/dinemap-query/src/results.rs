//! SPARQL 1.1 JSON result-set model
//!
//! ```text
//! { "head": { "vars": ["r", "name"] },
//!   "results": { "bindings": [ { "r": { "type": "uri", "value": "..." }, ... } ] } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// RDF term kind of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Uri,
    Literal,
    /// Emitted by some older endpoints instead of `literal` + `datatype`
    #[serde(rename = "typed-literal")]
    TypedLiteral,
    Bnode,
}

/// One bound value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    /// IRI term
    #[must_use]
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Plain literal term
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Literal with datatype IRI
    #[must_use]
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::literal(value)
        }
    }
}

/// One solution: variable name to bound term, unbound variables absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, Term>);

impl Row {
    /// Empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a bound variable
    #[must_use]
    pub fn with(mut self, var: impl Into<String>, term: Term) -> Self {
        self.0.insert(var.into(), term);
        self
    }

    /// With a plain literal bound
    #[must_use]
    pub fn with_literal(self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(var, Term::literal(value))
    }

    /// Bound term for a variable
    #[inline]
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.0.get(var)
    }

    /// Bound value text for a variable
    #[inline]
    #[must_use]
    pub fn value(&self, var: &str) -> Option<&str> {
        self.0.get(var).map(|t| t.value.as_str())
    }

    /// Bound variables in response order
    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Result header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

/// Result body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    #[serde(default)]
    pub bindings: Vec<Row>,
}

/// Tabular query result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub results: Bindings,
}

impl ResultSet {
    /// Build a result set from rows
    #[must_use]
    pub fn from_rows<I, S>(vars: I, rows: Vec<Row>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            head: Head {
                vars: vars.into_iter().map(Into::into).collect(),
            },
            results: Bindings { bindings: rows },
        }
    }

    /// Solutions in response order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.results.bindings
    }

    /// Number of solutions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    /// Whether there are no solutions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.bindings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_builder_keeps_insertion_order() {
        let row = Row::new()
            .with("r", Term::uri("http://x/r1"))
            .with_literal("name", "Chez Nous");
        assert_eq!(row.vars().collect::<Vec<_>>(), vec!["r", "name"]);
        assert_eq!(row.value("name"), Some("Chez Nous"));
        assert_eq!(row.value("city"), None);
    }

    #[test]
    fn typed_literal_carries_datatype() {
        let term = Term::typed("4.5", "http://www.w3.org/2001/XMLSchema#decimal");
        assert_eq!(term.kind, TermKind::Literal);
        assert!(term.datatype.is_some());
    }
}
