//! End-to-end tests for phrase capture, resolution and positional rewriting.

use spanq::QueryError;
use spanq::config::{Operator, ParserConfig};
use spanq::query::{
    AnchorQueue, Occur, PhraseQueryParser, PositionalClause, Query, TermClause,
};
use spanq::utils::TermDictionary;

fn dictionary() -> TermDictionary {
    let mut dict = TermDictionary::with_terms(
        "body",
        ["john", "johnny", "jon", "smith", "smyth", "jones", "fred", "freddy"],
    );
    dict.insert("title", "manual");
    dict.insert("title", "manuals");
    dict
}

fn p(field: &str, text: &str) -> PositionalClause {
    PositionalClause::Term(TermClause::new(field, text))
}

/// Replace every phrase placeholder with the query the full parse produced
/// for it, so the remaining structure can be compared directly.
fn fill_placeholders(tree: Query, resolved: &mut Vec<Query>) -> Query {
    match tree {
        Query::Phrase(_) => resolved.remove(0),
        Query::Boolean(children) => Query::Boolean(
            children
                .into_iter()
                .map(|(c, o)| (fill_placeholders(c, resolved), o))
                .collect(),
        ),
        Query::Boosted { query, boost } => Query::Boosted {
            query: Box::new(fill_placeholders(*query, resolved)),
            boost,
        },
        other => other,
    }
}

fn collect_positional(query: &Query, out: &mut Vec<Query>) {
    match query {
        Query::Positional(_) => out.push(query.clone()),
        Query::Boolean(children) => children.iter().for_each(|(c, _)| collect_positional(c, out)),
        Query::Boosted { query, .. } => collect_positional(query, out),
        _ => {}
    }
}

#[test]
fn test_wildcard_phrase() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"jo* smith\"").unwrap();
    assert_eq!(
        query.to_string(),
        "spanNear([spanOr([body:john, body:johnny, body:jon, body:jones]), body:smith], 0, true)"
    );
}

#[test]
fn test_wildcard_with_no_expansion_never_matches_alone() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"zed* smith\"").unwrap();
    match query {
        Query::Positional(PositionalClause::Near { clauses, slop, in_order }) => {
            assert_eq!(clauses.len(), 2);
            assert!(clauses[0].is_never_match());
            assert_eq!(clauses[1], p("body", "smith"));
            assert_eq!(slop, 0);
            assert!(in_order);
        }
        other => panic!("expected near, got {}", other),
    }
}

#[test]
fn test_lone_multi_term_phrase_fills_one_position() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);

    let cases = [
        ("\"fre*\"", "spanNear([spanOr([body:fred, body:freddy])], 0, true)"),
        ("\"smith~1\"", "spanNear([spanOr([body:smith, body:smyth])], 0, true)"),
        ("\"[jon TO jones]\"", "spanNear([spanOr([body:jon, body:jones])], 0, true)"),
        ("\"(fre*)^2\"", "spanNear([spanOr([body:fred^2, body:freddy^2])], 0, true)"),
    ];
    for (input, expected) in cases {
        let query = parser.parse(input).unwrap();
        assert_eq!(query.to_string(), expected, "input: {}", input);
    }
}

#[test]
fn test_lone_wildcard_without_expansion_never_matches() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"zzz*\"").unwrap();
    match query {
        Query::Positional(PositionalClause::Near { clauses, .. }) => {
            assert_eq!(clauses.len(), 1);
            assert!(clauses[0].is_never_match());
        }
        other => panic!("expected near, got {}", other),
    }
}

#[test]
fn test_negated_term_in_phrase() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"john -jones smith\"~1").unwrap();
    assert_eq!(
        query,
        Query::Positional(PositionalClause::not(
            PositionalClause::near(vec![p("body", "john"), p("body", "smith")], 2, true),
            PositionalClause::near(
                vec![p("body", "john"), p("body", "jones"), p("body", "smith")],
                1,
                true
            ),
        ))
    );
}

#[test]
fn test_fuzzy_and_range_inside_phrase() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);

    let query = parser.parse("\"john smith~1\"").unwrap();
    assert_eq!(
        query.to_string(),
        "spanNear([body:john, spanOr([body:smith, body:smyth])], 0, true)"
    );

    let query = parser.parse("\"[fred TO freddy] smith\"").unwrap();
    assert_eq!(
        query.to_string(),
        "spanNear([spanOr([body:fred, body:freddy]), body:smith], 0, true)"
    );
}

#[test]
fn test_group_alternatives_inside_phrase() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"(john jon -johnny) smith\"").unwrap();
    assert_eq!(
        query.to_string(),
        "spanNear([spanNot(spanOr([body:john, body:jon]), body:johnny), body:smith], 0, true)"
    );
}

#[test]
fn test_single_term_phrase() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"smith\"").unwrap();
    assert_eq!(query, Query::Term(TermClause::new("body", "smith")));
}

#[test]
fn test_empty_phrase() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("\"\"").unwrap();
    assert_eq!(query, Query::Positional(PositionalClause::near(vec![], 0, true)));
}

#[test]
fn test_field_phrase_uses_its_field() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("title:\"user manual*\"").unwrap();
    assert_eq!(
        query.to_string(),
        "spanNear([title:user, spanOr([title:manual, title:manuals])], 0, true)"
    );
}

#[test]
fn test_field_mismatch_aborts_parse() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let err = parser.parse("smith \"john title:manual\" jones").unwrap_err();
    assert_eq!(
        err,
        QueryError::FieldMismatch {
            candidate: "title".into(),
            anchor: "body".into()
        }
    );
}

#[test]
fn test_expansion_limit_aborts_parse() {
    let terms = dictionary();
    let config = ParserConfig {
        max_expansions: 2,
        ..ParserConfig::default()
    };
    let parser = PhraseQueryParser::new(config, &terms);
    assert!(matches!(
        parser.parse("\"jo* smith\""),
        Err(QueryError::TooManyExpansions { limit: 2, .. })
    ));
}

#[test]
fn test_multi_term_outside_phrases_stays_opaque() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let query = parser.parse("jo* smith~1 \"fred smith\"").unwrap();
    assert_eq!(
        query.to_string(),
        "(body:jo* body:smith~1 spanNear([body:fred, body:smith], 0, true))"
    );
}

#[test]
fn test_each_phrase_resolved_once() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let text = "+\"john smith\" -title:\"user manual\"~2 (fred OR \"jo* jones\")^2 smith";

    let (captured, mut anchors): (Query, AnchorQueue) = parser.capture(text).unwrap();
    assert_eq!(anchors.len(), 3);
    assert_eq!(parser.resolve(&mut anchors).unwrap(), 3);
    assert!(anchors.iter().all(|a| a.is_resolved()));

    let full = parser.parse(text).unwrap();
    assert!(!full.has_placeholders());

    let mut rewritten = Vec::new();
    collect_positional(&full, &mut rewritten);
    assert_eq!(rewritten.len(), 3);

    // Outside the phrase substitutions the tree is unchanged
    assert_eq!(fill_placeholders(captured, &mut rewritten), full);
}

#[test]
fn test_phrases_resolved_in_discovery_order() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let (_, anchors) = parser
        .capture("\"a b\" (\"c d\" title:\"e f\") \"g h\"")
        .unwrap();
    let texts: Vec<_> = anchors.iter().map(|a| a.raw_text.as_str()).collect();
    assert_eq!(texts, vec!["a b", "c d", "e f", "g h"]);
}

#[test]
fn test_default_and_operator_inside_phrase() {
    let terms = dictionary();
    let config = ParserConfig {
        default_operator: Operator::And,
        ..ParserConfig::default()
    };
    let parser = PhraseQueryParser::new(config, &terms);
    let query = parser.parse("fred \"john smith\"").unwrap();
    assert_eq!(
        query,
        Query::Boolean(vec![
            (Query::Term(TermClause::new("body", "fred")), Occur::Must),
            (
                Query::Positional(PositionalClause::near(
                    vec![p("body", "john"), p("body", "smith")],
                    0,
                    true
                )),
                Occur::Must
            ),
        ])
    );
}

#[test]
fn test_parser_is_reusable() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    let first = parser.parse("\"john smith\"").unwrap();
    assert!(parser.parse("\"john title:x\"").is_err());
    let again = parser.parse("\"john smith\"").unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_syntax_error_surfaces() {
    let terms = dictionary();
    let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
    assert!(matches!(
        parser.parse("\"john smith"),
        Err(QueryError::Syntax { position: 0, .. })
    ));
    assert!(matches!(
        parser.parse("\"(john smith\""),
        Err(QueryError::Syntax { .. })
    ));
}
