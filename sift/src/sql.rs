//! Translate a parsed query into a parameterized SQL `WHERE` clause.
//!
//! Values are bound through `?` placeholders in the order they appear in
//! [`SqlFilter::params`]; identifiers are double-quoted. The generated SQL
//! targets DuckDB.

use crate::attribute::{parse_bool, Attribute, AttributeKind, AttributeResolver, TypedValue};
use crate::query::{BinaryOp, FilterSegment, Node, Operator, Query, UnaryOp};

const ALWAYS: &str = "TRUE";
const NEVER: &str = "FALSE";

/// A `WHERE` clause with its bound parameters and sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub where_clause: String,
    pub params: Vec<TypedValue>,
    /// `ORDER BY` items taken from `asc`/`desc` directives.
    pub order_by: Vec<String>,
}

impl SqlFilter {
    /// Translate `query`, resolving attribute names through `resolver`.
    ///
    /// Unknown attributes are ignored (`TRUE`). Values the attribute cannot
    /// clean are dropped; a comparison left with no values matches nothing.
    pub fn build<R: AttributeResolver + ?Sized>(query: &Query, resolver: &R) -> Self {
        let mut translator = Translator {
            resolver,
            params: Vec::new(),
        };
        let where_clause = translator.node(query.root());

        let order_by = query
            .segments()
            .filter_map(|segment| {
                let attr = resolver.resolve(segment.name())?;
                let direction = segment.directives.iter().rev().find_map(|d| {
                    match d.to_ascii_lowercase().as_str() {
                        "asc" => Some("ASC"),
                        "desc" => Some("DESC"),
                        _ => None,
                    }
                })?;
                Some(format!("{} {}", quote_path(attr, segment), direction))
            })
            .collect();

        let filter = Self {
            where_clause,
            params: translator.params,
            order_by,
        };
        tracing::trace!(sql = %filter.where_clause, params = filter.params.len(), "translated query");
        filter
    }

    /// `ORDER BY …`, or an empty string when there are no sort keys.
    pub fn order_by_clause(&self) -> String {
        if self.order_by.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", self.order_by.join(", "))
        }
    }
}

struct Translator<'r, R: ?Sized> {
    resolver: &'r R,
    params: Vec<TypedValue>,
}

impl<R: AttributeResolver + ?Sized> Translator<'_, R> {
    fn node(&mut self, node: &Node) -> String {
        match node {
            Node::Noop => ALWAYS.to_string(),
            Node::Segment(segment) => self.segment(segment),
            Node::Binary { op, left, right } => {
                let left = self.node(left);
                let right = self.node(right);
                let joiner = match op {
                    BinaryOp::And => "AND",
                    BinaryOp::Or => "OR",
                };
                format!("({} {} {})", left, joiner, right)
            }
            Node::Unary {
                op: UnaryOp::Not,
                operand,
            } => format!("NOT ({})", self.node(operand)),
        }
    }

    fn segment(&mut self, segment: &FilterSegment) -> String {
        let Some(attr) = self.resolver.resolve(segment.name()) else {
            tracing::trace!(name = segment.name(), "ignoring unknown attribute");
            return ALWAYS.to_string();
        };
        let column = quote_path(attr, segment);

        let predicate = match segment.operator {
            Operator::IsNull if segment.values.is_empty() => format!("{} IS NULL", column),
            // Directive-only or bare paths do not filter.
            _ if segment.values.is_empty() => return ALWAYS.to_string(),
            op => {
                let values: Vec<TypedValue> = segment
                    .values
                    .iter()
                    .filter_map(|raw| clean(op, attr, raw))
                    .collect();
                self.compare(op, attr.kind(), &column, values)
            }
        };

        if segment.negated {
            format!("NOT ({})", predicate)
        } else {
            predicate
        }
    }

    fn compare(
        &mut self,
        op: Operator,
        kind: AttributeKind,
        column: &str,
        values: Vec<TypedValue>,
    ) -> String {
        if values.is_empty() {
            return NEVER.to_string();
        }
        if op == Operator::In {
            let placeholders = vec!["?"; values.len()].join(", ");
            self.params.extend(values);
            return format!("{} IN ({})", column, placeholders);
        }

        let mut parts: Vec<String> = values
            .into_iter()
            .map(|value| {
                self.params.push(value);
                comparison(op, kind, column)
            })
            .collect();
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            format!("({})", parts.join(" OR "))
        }
    }
}

/// Clean a raw value for `op` against `attr`.
fn clean(op: Operator, attr: &Attribute, raw: &str) -> Option<TypedValue> {
    match op {
        Operator::Regex => Some(TypedValue::Text(raw.to_string())),
        Operator::IsNull => parse_bool(raw).map(TypedValue::Boolean),
        _ => attr.try_clean(raw),
    }
}

/// Predicate comparing `column` with a single placeholder.
fn comparison(op: Operator, kind: AttributeKind, column: &str) -> String {
    match op {
        Operator::IExact if kind == AttributeKind::Text => {
            format!("lower({}) = lower(?)", column)
        }
        // Booleans and numbers have no case, so `=` compares exactly.
        Operator::Exact | Operator::IExact | Operator::In => format!("{} = ?", column),
        Operator::LessThan => format!("{} < ?", column),
        Operator::LessOrEqual => format!("{} <= ?", column),
        Operator::GreaterThan => format!("{} > ?", column),
        Operator::GreaterOrEqual => format!("{} >= ?", column),
        Operator::Regex => format!("regexp_matches(CAST({} AS VARCHAR), ?)", column),
        Operator::IsNull => format!("({} IS NULL) = ?", column),
    }
}

fn quote_path(attr: &Attribute, segment: &FilterSegment) -> String {
    attr.storage_path(segment)
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
