//! Compiles `term -> combinator` mappings into the API's filter grammar.
//!
//! The first term opens the expression as `filter=<term>`. Each later term is
//! joined with `,filter=<term>` when its combinator is `or` (same group) or
//! `&filter=<term>` when it is `and` (new group). The first term's combinator
//! carries no meaning and is ignored.
//!
//! Later terms whose combinator is missing or unrecognized are skipped in
//! [`FilterMode::Lenient`] and rejected in [`FilterMode::Strict`].
//!
//! Terms are stored verbatim and only percent-encoded when the query string is rendered.

use crate::errors::FgtError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded::byte_serialize;

const FILTER_OPEN: &str = "filter=";
const OR_JOIN: &str = ",filter=";
const AND_JOIN: &str = "&filter=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
    None,
    Unrecognized(String),
}

impl Combinator {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "and" => Combinator::And,
            "or" => Combinator::Or,
            "" | "none" => Combinator::None,
            _ => Combinator::Unrecognized(raw.to_string()),
        }
    }

    fn joiner(&self) -> Option<&'static str> {
        match self {
            Combinator::And => Some(AND_JOIN),
            Combinator::Or => Some(OR_JOIN),
            Combinator::None | Combinator::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("and"),
            Combinator::Or => f.write_str("or"),
            Combinator::None => f.write_str("none"),
            Combinator::Unrecognized(raw) => write!(f, "{:?}", raw),
        }
    }
}

impl From<&str> for Combinator {
    fn from(raw: &str) -> Self {
        Combinator::parse(raw)
    }
}

impl From<Option<&str>> for Combinator {
    fn from(raw: Option<&str>) -> Self {
        raw.map(Combinator::parse).unwrap_or(Combinator::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Lenient,
    Strict,
}

/// Insertion-ordered mapping of filter term to combinator.
///
/// Re-inserting a term updates its combinator but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    terms: Vec<(String, Combinator)>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, term: impl Into<String>, combinator: impl Into<Combinator>) -> Self {
        self.insert(term, combinator);
        self
    }

    pub fn insert(&mut self, term: impl Into<String>, combinator: impl Into<Combinator>) {
        let term = term.into();
        let combinator = combinator.into();
        match self.terms.iter_mut().find(|(existing, _)| *existing == term) {
            Some(slot) => slot.1 = combinator,
            None => self.terms.push((term, combinator)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Combinator)> {
        self.terms.iter().map(|(term, comb)| (term.as_str(), comb))
    }
}

impl<T, C> FromIterator<(T, C)> for FilterSpec
where
    T: Into<String>,
    C: Into<Combinator>,
{
    fn from_iter<I: IntoIterator<Item = (T, C)>>(iter: I) -> Self {
        let mut spec = FilterSpec::new();
        for (term, combinator) in iter {
            spec.insert(term, combinator);
        }
        spec
    }
}

/// `&` and `,filter=` are the grammar's own separators and cannot appear inside a term.
fn ensure_plain_term(term: &str) -> Result<(), FgtError> {
    if term.trim().is_empty() || term.contains('&') || term.contains(OR_JOIN) {
        return Err(FgtError::invalid_config(format!(
            "filter term '{}' must be non-empty and must not contain '&' or ',filter='",
            term
        )));
    }
    Ok(())
}

/// Returns `Ok(None)` for an empty spec so callers leave any existing filter alone.
pub fn compile_filter(spec: &FilterSpec, mode: FilterMode) -> Result<Option<String>, FgtError> {
    let mut terms = spec.terms.iter();
    let Some((first, _)) = terms.next() else {
        return Ok(None);
    };

    ensure_plain_term(first)?;
    let mut expression = format!("{}{}", FILTER_OPEN, first);
    for (term, combinator) in terms {
        match combinator.joiner() {
            Some(joiner) => {
                ensure_plain_term(term)?;
                expression.push_str(joiner);
                expression.push_str(term);
            }
            None if mode == FilterMode::Strict => {
                return Err(FgtError::invalid_config(format!(
                    "filter term '{}' has combinator {}; expected 'and' or 'or'",
                    term, combinator
                )));
            }
            None => continue,
        }
    }
    Ok(Some(expression))
}

/// Renders a compiled expression as `filter` query pairs for the wire.
///
/// Each term is percent-encoded; the `filter=`, `,` and `&` separators stay literal.
pub(crate) fn filter_query_fragments(expression: &str) -> Vec<String> {
    expression
        .split('&')
        .filter_map(|group| group.strip_prefix(FILTER_OPEN))
        .map(|group| {
            let terms: Vec<String> = group
                .split(OR_JOIN)
                .map(|term| byte_serialize(term.as_bytes()).collect())
                .collect();
            format!("{}{}", FILTER_OPEN, terms.join(OR_JOIN))
        })
        .collect()
}
