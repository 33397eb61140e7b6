//! Expression tree produced by the parser.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::operator::{
    is_reserved, Operator, AND, DIRECTIVE_MARKER, GROUP_CLOSE, GROUP_OPEN, NEGATION,
    NEGATION_KEYWORD, OR, PATH_SEPARATOR, VALUE_SEPARATOR,
};

/// A node of the expression tree.
///
/// Consumers translate a tree by matching on every variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Matches everything. Only produced for empty input.
    Noop,
    /// A single comparison.
    Segment(FilterSegment),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
}

/// Combinators joining two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `&`
    And,
    /// `;`
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `!(…)`
    Not,
}

/// Leaf predicate: `[!]path[.keyword][:directive…][op value,…]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSegment {
    /// Dotted path, never empty (`["address", "city"]`).
    pub path: Vec<String>,
    pub operator: Operator,
    pub negated: bool,
    /// Free-form modifiers such as sort order (`created:desc`).
    pub directives: Vec<String>,
    /// Raw, uncleaned values.
    pub values: Vec<String>,
}

impl FilterSegment {
    /// Segment comparing `path` to `values` with the default operator.
    pub fn new<P, V>(path: P, values: V) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            operator: Operator::DEFAULT,
            negated: false,
            directives: Vec::new(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Logical attribute name (first path component).
    pub fn name(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// Path components after the attribute name.
    pub fn subpath(&self) -> &[String] {
        self.path.get(1..).unwrap_or_default()
    }

    /// True if the segment carries directives but no comparison.
    pub fn is_directive_only(&self) -> bool {
        self.values.is_empty() && !self.directives.is_empty()
    }

    pub fn has_directive(&self, directive: &str) -> bool {
        self.directives.iter().any(|d| d == directive)
    }
}

impl Node {
    pub fn and(left: Node, right: Node) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::binary(BinaryOp::Or, left, right)
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Negate a node, folding the negation where possible.
    ///
    /// Segments flip their own `negated` flag and a `Not` node unwraps, so
    /// negating twice always gives back the original tree.
    pub fn negate(self) -> Self {
        match self {
            Node::Segment(segment) => Node::Segment(segment.negate()),
            Node::Unary {
                op: UnaryOp::Not,
                operand,
            } => *operand,
            other => Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(other),
            },
        }
    }

    /// Leaf segments, left to right.
    pub fn segments(&self) -> Segments<'_> {
        Segments { stack: vec![self] }
    }
}

impl From<FilterSegment> for Node {
    fn from(segment: FilterSegment) -> Self {
        Node::Segment(segment)
    }
}

/// Depth-first iterator over the leaves of a tree.
pub struct Segments<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a FilterSegment;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Noop => {}
                Node::Segment(segment) => return Some(segment),
                Node::Binary { left, right, .. } => {
                    self.stack.push(right.as_ref());
                    self.stack.push(left.as_ref());
                }
                Node::Unary { operand, .. } => self.stack.push(operand.as_ref()),
            }
        }
        None
    }
}

impl BinaryOp {
    pub fn as_char(self) -> char {
        match self {
            BinaryOp::And => AND,
            BinaryOp::Or => OR,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// Canonical rendering. Re-parsing the output of any parsed tree gives the
// same tree back.

impl fmt::Display for FilterSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.path.last().map(String::as_str).unwrap_or_default();
        let last_is_reserved = is_reserved(last);
        let symbol = self.operator.symbol();

        // A trailing `not` component is kept by writing one more `not` and
        // inverting the leading marker, which leaves the symbol form usable.
        let escape_not = last == NEGATION_KEYWORD && !self.values.is_empty() && symbol.is_some();
        let keyword = if self.values.is_empty() {
            self.operator != Operator::DEFAULT || last_is_reserved
        } else {
            symbol.is_none() || (last_is_reserved && !escape_not)
        };

        if self.negated != escape_not {
            write!(f, "{}", NEGATION)?;
        }
        write_joined(f, &self.path, PATH_SEPARATOR)?;
        if escape_not {
            write!(f, "{}{}", PATH_SEPARATOR, NEGATION_KEYWORD)?;
        }
        if keyword {
            write!(f, "{}{}", PATH_SEPARATOR, self.operator.keyword())?;
        }
        for directive in &self.directives {
            write!(f, "{}{}", DIRECTIVE_MARKER, directive)?;
        }
        if !self.values.is_empty() {
            let op = match symbol {
                Some(sym) if !keyword => sym,
                _ => Operator::DEFAULT.symbol().unwrap_or("="),
            };
            write!(f, "{}", op)?;
            write_joined(f, &self.values, VALUE_SEPARATOR)?;
        }
        Ok(())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[String], separator: char) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Noop => Ok(()),
            Node::Segment(segment) => write!(f, "{}", segment),
            Node::Binary { op, left, right } => {
                // Left operands fold without brackets; right ones need them.
                write!(f, "{}{}", left, op)?;
                match right.as_ref() {
                    Node::Binary { .. } => write!(f, "{}{}{}", GROUP_OPEN, right, GROUP_CLOSE),
                    _ => write!(f, "{}", right),
                }
            }
            Node::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "{}{}{}{}", NEGATION, GROUP_OPEN, operand, GROUP_CLOSE),
        }
    }
}
