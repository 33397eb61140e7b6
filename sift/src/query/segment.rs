//! Parser for a single clause (no top-level combinators).
//!
//! Clause shape: `[!]path[.path…][.not][.keyword][:directive…][symbol value[,value…]]`

use crate::{Error, Result};

use super::node::FilterSegment;
use super::operator::{
    is_symbol_prefix, starts_symbol, Operator, DIRECTIVE_MARKER, NEGATION, NEGATION_KEYWORD,
    PATH_SEPARATOR, VALUE_SEPARATOR,
};

/// Parse one clause into a [`FilterSegment`].
pub fn parse_segment(text: &str) -> Result<FilterSegment> {
    let mut scanner = PathScanner::default();
    let mut symbol: Option<(Operator, usize)> = None;

    for (i, c) in text.char_indices() {
        match c {
            NEGATION if scanner.at_start() => scanner.negated = !scanner.negated,
            c if starts_symbol(c) => {
                scanner.finish(text)?;
                symbol = Some(scan_symbol(text, i, &mut scanner.negated)?);
                break;
            }
            PATH_SEPARATOR => scanner.complete_component(text)?,
            DIRECTIVE_MARKER => scanner.start_directive(text)?,
            _ => scanner.buffer.push(c),
        }
    }
    if symbol.is_none() {
        scanner.finish(text)?;
    }

    let PathScanner {
        mut path,
        mut negated,
        directives,
        ..
    } = scanner;

    if path.last().map(String::as_str) == Some(NEGATION_KEYWORD) {
        path.pop();
        negated = !negated;
    }

    let mut operator = symbol.map(|(op, _)| op).unwrap_or(Operator::DEFAULT);
    if let Some(op) = path.last().and_then(|c| Operator::from_keyword(c)) {
        if operator != Operator::DEFAULT {
            return Err(Error::malformed(format!(
                "both path-style and equality-style operator provided in {:?}",
                text
            )));
        }
        path.pop();
        operator = op;
    }

    if path.is_empty() {
        return Err(Error::malformed(format!("no path given in {:?}", text)));
    }

    let values = match symbol {
        Some((_, start)) => text[start..]
            .split(VALUE_SEPARATOR)
            .map(String::from)
            .collect(),
        None => Vec::new(),
    };

    let segment = FilterSegment {
        path,
        operator,
        negated,
        directives,
        values,
    };
    tracing::trace!(?segment, "parsed segment");
    Ok(segment)
}

/// Accumulates path components and directives ahead of the operator.
#[derive(Default)]
struct PathScanner {
    path: Vec<String>,
    directives: Vec<String>,
    buffer: String,
    in_directives: bool,
    negated: bool,
}

impl PathScanner {
    /// Nothing buffered yet, so a `!` is a leading negation.
    fn at_start(&self) -> bool {
        self.path.is_empty() && self.buffer.is_empty() && !self.in_directives
    }

    fn complete_component(&mut self, text: &str) -> Result<()> {
        if self.in_directives {
            return Err(Error::malformed(format!(
                "path component after directive in {:?}",
                text
            )));
        }
        if self.buffer.is_empty() {
            return Err(Error::malformed(format!("empty path component in {:?}", text)));
        }
        self.path.push(std::mem::take(&mut self.buffer));
        Ok(())
    }

    fn complete_directive(&mut self, text: &str) -> Result<()> {
        if self.buffer.is_empty() {
            return Err(Error::malformed(format!("empty directive in {:?}", text)));
        }
        self.directives.push(std::mem::take(&mut self.buffer));
        Ok(())
    }

    fn start_directive(&mut self, text: &str) -> Result<()> {
        if self.in_directives {
            self.complete_directive(text)
        } else {
            self.complete_component(text)?;
            self.in_directives = true;
            Ok(())
        }
    }

    /// Flush whatever is buffered when the path section ends.
    fn finish(&mut self, text: &str) -> Result<()> {
        if self.in_directives {
            self.complete_directive(text)
        } else if self.buffer.is_empty() && self.path.is_empty() {
            Err(Error::malformed(format!("no path given in {:?}", text)))
        } else {
            self.complete_component(text)
        }
    }
}

/// Greedily read a symbolic operator starting at byte `start`.
///
/// Returns the operator and the byte offset where the value text begins.
/// A `!` ahead of the first symbol character flips `negated`.
fn scan_symbol(text: &str, start: usize, negated: &mut bool) -> Result<(Operator, usize)> {
    let mut symbol = String::new();
    let mut end = start;

    for (i, c) in text[start..].char_indices() {
        if c == NEGATION && symbol.is_empty() {
            *negated = !*negated;
        } else {
            symbol.push(c);
            if !is_symbol_prefix(&symbol) {
                symbol.pop();
                break;
            }
        }
        end = start + i + c.len_utf8();
    }

    Operator::from_symbol(&symbol)
        .map(|op| (op, end))
        .ok_or_else(|| {
            Error::malformed(format!(
                "unknown operator {:?} in {:?}",
                &text[start..end],
                text
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(segment: &FilterSegment) -> Vec<&str> {
        segment.values.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_simple_equality() {
        let s = parse_segment("foo=bar").unwrap();
        assert_eq!(s.path, vec!["foo"]);
        assert_eq!(s.operator, Operator::IExact);
        assert!(!s.negated);
        assert!(s.directives.is_empty());
        assert_eq!(values(&s), vec!["bar"]);
    }

    #[test]
    fn test_keyword_operator() {
        let s = parse_segment("foo.gte=32").unwrap();
        assert_eq!(s.path, vec!["foo"]);
        assert_eq!(s.operator, Operator::GreaterOrEqual);
        assert_eq!(values(&s), vec!["32"]);
    }

    #[test]
    fn test_symbol_operators() {
        let cases = [
            ("a==1", Operator::Exact),
            ("a=1", Operator::IExact),
            ("a<1", Operator::LessThan),
            ("a<=1", Operator::LessOrEqual),
            ("a>1", Operator::GreaterThan),
            ("a>=1", Operator::GreaterOrEqual),
        ];
        for (text, op) in cases {
            let s = parse_segment(text).unwrap();
            assert_eq!(s.operator, op, "{}", text);
            assert_eq!(values(&s), vec!["1"], "{}", text);
        }
    }

    #[test]
    fn test_symbol_scan_stops_at_first_non_extending_char() {
        let s = parse_segment("a=>3").unwrap();
        assert_eq!(s.operator, Operator::IExact);
        assert_eq!(values(&s), vec![">3"]);

        let s = parse_segment("a===3").unwrap();
        assert_eq!(s.operator, Operator::Exact);
        assert_eq!(values(&s), vec!["=3"]);

        let s = parse_segment("a=!x").unwrap();
        assert!(!s.negated);
        assert_eq!(values(&s), vec!["!x"]);
    }

    #[test]
    fn test_negation_forms() {
        let bang = parse_segment("foo!=bar").unwrap();
        let keyword = parse_segment("foo.not=bar").unwrap();
        let leading = parse_segment("!foo=bar").unwrap();
        assert!(bang.negated);
        assert_eq!(bang, keyword);
        assert_eq!(bang, leading);

        let twice = parse_segment("!foo.not=bar").unwrap();
        assert!(!twice.negated);

        let symbol = parse_segment("age!<3").unwrap();
        assert!(symbol.negated);
        assert_eq!(symbol.operator, Operator::LessThan);
    }

    #[test]
    fn test_negation_keyword_before_operator_keyword() {
        let s = parse_segment("age.gte.not=3").unwrap();
        assert!(s.negated);
        assert_eq!(s.operator, Operator::GreaterOrEqual);
        assert_eq!(s.path, vec!["age"]);

        // Only the last component is a keyword.
        let s = parse_segment("age.not.gte=3").unwrap();
        assert!(!s.negated);
        assert_eq!(s.path, vec!["age", "not"]);
    }

    #[test]
    fn test_multi_value() {
        let s = parse_segment("fruit=apples,oranges").unwrap();
        assert_eq!(values(&s), vec!["apples", "oranges"]);

        let s = parse_segment("fruit=").unwrap();
        assert_eq!(values(&s), vec![""]);
    }

    #[test]
    fn test_dotted_path() {
        let s = parse_segment("address.city.iexact=oslo").unwrap();
        assert_eq!(s.path, vec!["address", "city"]);
        assert_eq!(s.operator, Operator::IExact);
    }

    #[test]
    fn test_keyword_only_operators() {
        let s = parse_segment("deleted.isnull=true").unwrap();
        assert_eq!(s.operator, Operator::IsNull);

        let s = parse_segment("id.in=1,2,3").unwrap();
        assert_eq!(s.operator, Operator::In);
        assert_eq!(values(&s), vec!["1", "2", "3"]);

        let s = parse_segment("name.regex=^a.*$").unwrap();
        assert_eq!(s.operator, Operator::Regex);
        assert_eq!(values(&s), vec!["^a.*$"]);
    }

    #[test]
    fn test_no_comparison() {
        let s = parse_segment("foo").unwrap();
        assert_eq!(s.operator, Operator::DEFAULT);
        assert!(s.values.is_empty());

        let s = parse_segment("deleted.isnull").unwrap();
        assert_eq!(s.operator, Operator::IsNull);
        assert!(s.values.is_empty());
    }

    #[test]
    fn test_directives() {
        let s = parse_segment("created:desc").unwrap();
        assert_eq!(s.path, vec!["created"]);
        assert_eq!(s.directives, vec!["desc"]);
        assert!(s.is_directive_only());
        assert_eq!(s.operator, Operator::DEFAULT);

        let s = parse_segment("age.gte:asc:nulls_last=18").unwrap();
        assert_eq!(s.path, vec!["age"]);
        assert_eq!(s.operator, Operator::GreaterOrEqual);
        assert_eq!(s.directives, vec!["asc", "nulls_last"]);
        assert_eq!(values(&s), vec!["18"]);
    }

    #[test]
    fn test_conflicting_operators() {
        let err = parse_segment("foo.gte<=3").unwrap_err();
        assert!(err.to_string().contains("both path-style and equality-style"));
        assert!(parse_segment("foo.lt==3").is_err());
    }

    #[test]
    fn test_empty_path() {
        assert!(parse_segment("").is_err());
        assert!(parse_segment("=3").is_err());
        assert!(parse_segment("!=3").is_err());
        assert!(parse_segment("not=3").is_err());
        assert!(parse_segment("gte=3").is_err());

        // `not` is only a keyword in last position.
        let s = parse_segment("not.gte=3").unwrap();
        assert_eq!(s.path, vec!["not"]);
    }

    #[test]
    fn test_malformed_components() {
        assert!(parse_segment("foo..bar=1").is_err());
        assert!(parse_segment(".foo=1").is_err());
        assert!(parse_segment("foo.=1").is_err());
        assert!(parse_segment("foo.").is_err());
        assert!(parse_segment("foo::desc").is_err());
        assert!(parse_segment("foo:desc.bar").is_err());
        assert!(parse_segment(":desc").is_err());
    }

    #[test]
    fn test_unknown_operator() {
        assert!(parse_segment("foo!bar").is_err());
        assert!(parse_segment("foo!").is_err());
    }

    #[test]
    fn test_errors_are_malformed_query() {
        let err = parse_segment("foo!bar").unwrap_err();
        assert!(matches!(err, Error::MalformedQuery(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_unicode_text() {
        let s = parse_segment("städte.näme=Zürich,Tromsø").unwrap();
        assert_eq!(s.path, vec!["städte", "näme"]);
        assert_eq!(values(&s), vec!["Zürich", "Tromsø"]);
    }
}
