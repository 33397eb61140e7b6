//! Combinator parser: splits the query on `&`/`;`, descends into groups and
//! hands each clause to the segment parser.

use crate::config::Config;
use crate::{Error, Result};

use super::node::{BinaryOp, Node};
use super::operator::{AND, GROUP_CLOSE, GROUP_OPEN, NEGATION, OR};
use super::segment::parse_segment;
use super::Query;

/// Parse a query string with the default limits.
pub fn parse_query(text: &str) -> Result<Query> {
    Parser::default().parse(text)
}

/// Query parser with configurable limits.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: Config,
}

impl Parser {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse `text` into a [`Query`]. Empty text matches everything.
    pub fn parse(&self, text: &str) -> Result<Query> {
        let result = self.parse_root(text);
        if let Err(e) = &result {
            tracing::debug!(error = %e, len = text.len(), "rejected query");
        }
        result.map(|root| Query::new(text, root))
    }

    fn parse_root(&self, text: &str) -> Result<Node> {
        if text.len() > self.config.max_length {
            return Err(Error::malformed(format!(
                "query is {} bytes, limit is {}",
                text.len(),
                self.config.max_length
            )));
        }
        if text.is_empty() {
            return Ok(Node::Noop);
        }

        let mut cursor = Cursor::new(text);
        self.parse_group(&mut cursor, 0)
    }

    /// Parse operands and combinators until end of input, or until the `)`
    /// closing this group when `depth > 0`. Leaves the cursor just past
    /// whatever ended the group.
    fn parse_group(&self, cursor: &mut Cursor<'_>, depth: usize) -> Result<Node> {
        let mut group = GroupBuilder::default();

        while let Some(c) = cursor.bump() {
            match c {
                AND => group.push_combinator(BinaryOp::And, cursor.pos)?,
                OR => group.push_combinator(BinaryOp::Or, cursor.pos)?,
                NEGATION if group.buffer.is_empty() && cursor.peek() == Some(GROUP_OPEN) => {
                    group.pending_negation = true;
                }
                GROUP_OPEN => {
                    group.expect_operand(cursor.pos)?;
                    if depth + 1 > self.config.max_depth {
                        return Err(Error::malformed(format!(
                            "groups nested deeper than {} at byte {}",
                            self.config.max_depth, cursor.pos
                        )));
                    }
                    let mut inner = self.parse_group(cursor, depth + 1)?;
                    if std::mem::take(&mut group.pending_negation) {
                        inner = inner.negate();
                    }
                    tracing::trace!(depth = depth + 1, node = %inner, "parsed group");
                    group.push_group(inner);
                }
                GROUP_CLOSE => {
                    if depth == 0 {
                        return Err(Error::malformed(format!(
                            "unmatched `)` at byte {}",
                            cursor.pos
                        )));
                    }
                    return group.finish(cursor.pos);
                }
                _ => {
                    if group.last_was_group {
                        return Err(Error::malformed(format!(
                            "missing combinator after group at byte {}",
                            cursor.pos
                        )));
                    }
                    group.buffer.push(c);
                }
            }
        }

        if depth > 0 {
            return Err(Error::malformed("unbalanced parentheses, `)` expected"));
        }
        group.finish(cursor.pos)
    }
}

/// Byte position into the input shared by a group and its nested groups.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

/// Operands and combinators collected for one group.
#[derive(Default)]
struct GroupBuilder {
    operands: Vec<Node>,
    combinators: Vec<BinaryOp>,
    buffer: String,
    last_was_group: bool,
    pending_negation: bool,
}

impl GroupBuilder {
    /// Turn the buffered clause into an operand, if there is one.
    ///
    /// Returns false when nothing was buffered and no group just closed.
    fn flush_clause(&mut self) -> Result<bool> {
        if !self.buffer.is_empty() {
            let segment = parse_segment(&self.buffer)?;
            self.operands.push(segment.into());
            self.buffer.clear();
            Ok(true)
        } else {
            Ok(self.last_was_group)
        }
    }

    fn push_combinator(&mut self, op: BinaryOp, pos: usize) -> Result<()> {
        if !self.flush_clause()? {
            return Err(Error::malformed(format!(
                "combinator `{}` out of place at byte {}",
                op, pos
            )));
        }
        self.combinators.push(op);
        self.last_was_group = false;
        Ok(())
    }

    /// A group may only start where an operand is expected.
    fn expect_operand(&self, pos: usize) -> Result<()> {
        if !self.buffer.is_empty() || self.operands.len() != self.combinators.len() {
            return Err(Error::malformed(format!(
                "group must follow a combinator at byte {}",
                pos
            )));
        }
        Ok(())
    }

    fn push_group(&mut self, node: Node) {
        self.operands.push(node);
        self.last_was_group = true;
    }

    /// Fold the collected operands strictly left to right.
    fn finish(mut self, pos: usize) -> Result<Node> {
        if !self.flush_clause()? {
            return Err(Error::malformed(format!("empty clause at byte {}", pos)));
        }

        let mut operands = self.operands.into_iter();
        let mut node = operands
            .next()
            .ok_or_else(|| Error::malformed(format!("empty clause at byte {}", pos)))?;
        for (op, right) in self.combinators.into_iter().zip(operands) {
            node = Node::binary(op, node, right);
        }
        Ok(node)
    }
}
