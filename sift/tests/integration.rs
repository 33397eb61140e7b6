//! Integration tests for the public sift API.

use sift::config::{CONFIG_ENV_VAR, MAX_DEPTH_ENV_VAR};
use sift::{parse_query, Config, FieldMap, Node, Operator, Parser, SqlFilter, TypedValue};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const FIELDS: &str = r#"
[name]
path = "full_name"
kind = "text"

[age]
path = "age"
kind = "integer"

[active]
path = "active"
kind = "boolean"
"#;

#[test]
fn test_parse_and_translate() {
    init_tracing();

    let query = parse_query("age.gte=18&!(name=bob;active=no)&age:desc").unwrap();
    assert_eq!(query.segments().count(), 4);

    let fields = FieldMap::from_toml_str(FIELDS).unwrap();
    let filter = SqlFilter::build(&query, &fields);
    assert_eq!(
        filter.where_clause,
        r#"(("age" >= ? AND NOT ((lower("full_name") = lower(?) OR "active" = ?))) AND TRUE)"#
    );
    assert_eq!(
        filter.params,
        vec![
            TypedValue::Integer(18),
            TypedValue::Text("bob".to_string()),
            TypedValue::Boolean(false),
        ]
    );
    assert_eq!(filter.order_by_clause(), r#"ORDER BY "age" DESC"#);
}

#[test]
fn test_rejected_queries_are_client_errors() {
    init_tracing();

    for text in ["(a=1", "a=1)", "&;bar=baz", "foo.gte<=3", "()", "=1"] {
        let err = parse_query(text).unwrap_err();
        assert!(err.is_client_error(), "{}", text);
        assert!(err.to_string().starts_with("Malformed query: "), "{}", err);
    }
}

#[test]
fn test_config_from_environment() {
    init_tracing();

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sift.toml");
    std::fs::write(&path, "max_depth = 1\nmax_length = 64\n").unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &path);
    std::env::remove_var(MAX_DEPTH_ENV_VAR);
    let config = Config::load().unwrap();
    assert_eq!(config.max_depth, 1);
    assert_eq!(config.max_length, 64);

    let parser = Parser::new(config);
    assert!(parser.parse("a=1&(b=2;c=3)").is_ok());
    assert!(parser.parse("a=1&(b=2;(c=3))").is_err());
    assert!(parser.parse(&"a".repeat(65)).is_err());

    std::env::set_var(MAX_DEPTH_ENV_VAR, "3");
    let config = Config::load().unwrap();
    assert_eq!(config.max_depth, 3);
    assert!(Parser::new(config).parse("a=1&(b=2;(c=3))").is_ok());

    std::env::set_var(MAX_DEPTH_ENV_VAR, "deep");
    assert!(Config::load().is_err());

    std::env::remove_var(MAX_DEPTH_ENV_VAR);
    std::env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(Config::load().unwrap(), Config::default());
}

#[test]
fn test_tree_is_shareable_across_threads() {
    let query = parse_query("a=1&(b=2;!(c=3&d=4))").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let query = query.clone();
            std::thread::spawn(move || {
                let reparsed = parse_query(&query.to_string()).unwrap();
                reparsed.root() == query.root()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_keyword_and_symbol_forms_agree() {
    for op in [
        Operator::Exact,
        Operator::IExact,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
    ] {
        let symbol = op.symbol().unwrap();
        let by_symbol = parse_query(&format!("price{}10", symbol)).unwrap();
        let by_keyword = parse_query(&format!("price.{}=10", op.keyword())).unwrap();
        assert_eq!(by_symbol.root(), by_keyword.root(), "{:?}", op);
        assert!(matches!(by_symbol.root(), Node::Segment(s) if s.operator == op));
    }
}
