//! Filter/sort query language.
//!
//! # Syntax Overview
//!
//! A query is a list of clauses joined by combinators, e.g.
//! `foo.gte=32&bar!=5;(baz=1,2)`.
//!
//! - **Clause**: `[!]path[.keyword][:directive…][symbol value[,value…]]`
//! - **Operators**: `==` `=` `<` `<=` `>` `>=`, or the keywords `exact`,
//!   `iexact`, `lt`, `lte`, `gt`, `gte`, `regex`, `isnull`, `in`
//! - **Negation**: `!foo=1`, `foo!=1`, `foo.not=1`, `!(…)`
//! - **Combinators**: `&` (and), `;` (or); no precedence, they fold left
//!   to right: `a&b;c` is `(a&b);c`
//! - **Groups**: `(…)` override the left-to-right order

mod node;
mod operator;
mod parser;
mod segment;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use node::{BinaryOp, FilterSegment, Node, Segments, UnaryOp};
pub use operator::Operator;
pub use parser::{parse_query, Parser};
pub use segment::parse_segment;

/// A parsed query: the original text and the expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    root: Node,
}

impl Query {
    pub(crate) fn new(text: impl Into<String>, root: Node) -> Self {
        Self {
            text: text.into(),
            root,
        }
    }

    /// The text this query was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Check if this query matches everything (no filters applied).
    pub fn is_match_all(&self) -> bool {
        matches!(self.root, Node::Noop)
    }

    /// Leaf segments, left to right.
    pub fn segments(&self) -> Segments<'_> {
        self.root.segments()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
