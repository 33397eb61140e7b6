//! sift: filter and sort query strings for storage backends.
//!
//! Parses compact, URL-embeddable query strings such as
//! `age.gte=30&!(name=ada;town=oslo)` into an immutable expression tree,
//! and translates trees into SQL `WHERE` clauses.

pub mod attribute;
pub mod config;
pub mod error;
pub mod query;
pub mod sql;

pub use attribute::{Attribute, AttributeKind, AttributeResolver, FieldMap, TypedValue};
pub use config::Config;
pub use error::{Error, Result};
pub use query::{parse_query, BinaryOp, FilterSegment, Node, Operator, Parser, Query, UnaryOp};
pub use sql::SqlFilter;
