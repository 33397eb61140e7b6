//! Operator table and reserved tokens.
//!
//! Every comparison operator has a keyword form written as the last path
//! component (`age.gte=30`) and, for most of them, a symbolic form written
//! between path and value (`age>=30`). All lookups are derived from the
//! single [`OPERATORS`] table.

use serde::{Deserialize, Serialize};

/// Separates path components: `address.city`.
pub const PATH_SEPARATOR: char = '.';
/// Separates values: `fruit=apples,oranges`.
pub const VALUE_SEPARATOR: char = ',';
/// Negates a clause (`!foo=1`), a symbol (`foo!=1`) or a group (`!(…)`).
pub const NEGATION: char = '!';
/// Starts a directive: `created:desc`.
pub const DIRECTIVE_MARKER: char = ':';
/// AND combinator.
pub const AND: char = '&';
/// OR combinator.
pub const OR: char = ';';
pub const GROUP_OPEN: char = '(';
pub const GROUP_CLOSE: char = ')';
/// Negation spelled as a trailing path component: `foo.not=1`.
pub const NEGATION_KEYWORD: &str = "not";

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `==` / `.exact`
    Exact,
    /// `=` / `.iexact` case-insensitive equality (the default)
    IExact,
    /// `<` / `.lt`
    LessThan,
    /// `<=` / `.lte`
    LessOrEqual,
    /// `>` / `.gt`
    GreaterThan,
    /// `>=` / `.gte`
    GreaterOrEqual,
    /// `.regex`
    Regex,
    /// `.isnull`
    IsNull,
    /// `.in`
    In,
}

struct OperatorEntry {
    op: Operator,
    keyword: &'static str,
    symbol: Option<&'static str>,
}

const OPERATORS: &[OperatorEntry] = &[
    OperatorEntry { op: Operator::Exact, keyword: "exact", symbol: Some("==") },
    OperatorEntry { op: Operator::IExact, keyword: "iexact", symbol: Some("=") },
    OperatorEntry { op: Operator::LessThan, keyword: "lt", symbol: Some("<") },
    OperatorEntry { op: Operator::LessOrEqual, keyword: "lte", symbol: Some("<=") },
    OperatorEntry { op: Operator::GreaterThan, keyword: "gt", symbol: Some(">") },
    OperatorEntry { op: Operator::GreaterOrEqual, keyword: "gte", symbol: Some(">=") },
    OperatorEntry { op: Operator::Regex, keyword: "regex", symbol: None },
    OperatorEntry { op: Operator::IsNull, keyword: "isnull", symbol: None },
    OperatorEntry { op: Operator::In, keyword: "in", symbol: None },
];

impl Operator {
    /// Operator used when a clause names none.
    pub const DEFAULT: Operator = Operator::IExact;

    fn spec(self) -> &'static OperatorEntry {
        // Every variant has exactly one row.
        match OPERATORS.iter().find(|s| s.op == self) {
            Some(spec) => spec,
            None => unreachable!("operator {:?} missing from table", self),
        }
    }

    /// Keyword form (`gte`).
    pub fn keyword(self) -> &'static str {
        self.spec().keyword
    }

    /// Symbolic form (`>=`), if the operator has one.
    pub fn symbol(self) -> Option<&'static str> {
        self.spec().symbol
    }

    /// Look up an operator by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Operator> {
        OPERATORS.iter().find(|s| s.keyword == keyword).map(|s| s.op)
    }

    /// Look up an operator by symbol.
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        OPERATORS
            .iter()
            .find(|s| s.symbol == Some(symbol))
            .map(|s| s.op)
    }

    /// All operators in table order.
    pub fn all() -> impl Iterator<Item = Operator> {
        OPERATORS.iter().map(|s| s.op)
    }
}

/// True if `text` is a non-empty prefix of some symbolic operator.
pub fn is_symbol_prefix(text: &str) -> bool {
    !text.is_empty()
        && OPERATORS
            .iter()
            .filter_map(|s| s.symbol)
            .any(|sym| sym.starts_with(text))
}

/// True if a symbolic operator can start at `c`.
pub fn starts_symbol(c: char) -> bool {
    c == NEGATION
        || OPERATORS
            .iter()
            .filter_map(|s| s.symbol)
            .any(|sym| sym.starts_with(c))
}

/// True if `component` would be read back as a keyword rather than a path.
pub fn is_reserved(component: &str) -> bool {
    component == NEGATION_KEYWORD || Operator::from_keyword(component).is_some()
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.symbol() {
            Some(sym) => write!(f, "{}", sym),
            None => write!(f, "{}{}", PATH_SEPARATOR, self.keyword()),
        }
    }
}
