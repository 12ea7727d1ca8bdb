//! Output formatting for rewritten queries

use crate::query::clause::{PositionalClause, Query, RangeClause, TermClause};
use std::fmt;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Output format for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lucene-style query string
    Text,
    /// Serialized tree
    Json,
}

impl fmt::Display for TermClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)?;
        write_boost(f, self.boost)
    }
}

impl fmt::Display for RangeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{} TO {}{}",
            self.field,
            if self.include_lower { '[' } else { '{' },
            self.lower.as_deref().unwrap_or("*"),
            self.upper.as_deref().unwrap_or("*"),
            if self.include_upper { ']' } else { '}' },
        )?;
        write_boost(f, self.boost)
    }
}

impl fmt::Display for PositionalClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionalClause::Term(term) => write!(f, "{}", term),
            PositionalClause::Near {
                clauses,
                slop,
                in_order,
            } => {
                write!(f, "spanNear([")?;
                write_list(f, clauses)?;
                write!(f, "], {}, {})", slop, in_order)
            }
            PositionalClause::Or(clauses) => {
                write!(f, "spanOr([")?;
                write_list(f, clauses)?;
                write!(f, "])")
            }
            PositionalClause::Not { include, exclude } => {
                write!(f, "spanNot({}, {})", include, exclude)
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(term) => write!(f, "{}", term),
            Query::Boolean(children) => {
                write!(f, "(")?;
                for (i, (child, occur)) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}{}", occur, child)?;
                }
                write!(f, ")")
            }
            Query::Wildcard {
                field,
                pattern,
                boost,
            } => {
                write!(f, "{}:{}", field, pattern)?;
                write_boost(f, *boost)
            }
            Query::Fuzzy {
                field,
                text,
                max_edits,
                boost,
            } => {
                write!(f, "{}:{}~{}", field, text, max_edits)?;
                write_boost(f, *boost)
            }
            Query::Range(range) => write!(f, "{}", range),
            Query::Boosted { query, boost } => write!(f, "({})^{}", query, boost),
            Query::Phrase(id) => write!(f, "<phrase #{}>", id.0),
            Query::Positional(clause) => write!(f, "{}", clause),
        }
    }
}

fn write_boost(f: &mut fmt::Formatter<'_>, boost: f32) -> fmt::Result {
    if boost != 1.0 {
        write!(f, "^{}", boost)?;
    }
    Ok(())
}

fn write_list(f: &mut fmt::Formatter<'_>, clauses: &[PositionalClause]) -> fmt::Result {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", clause)?;
    }
    Ok(())
}

/// Render a query in the requested format
pub fn render_query(query: &Query, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(query.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(query),
    }
}

/// Print a rewritten query to stdout
pub fn print_query(query: &Query, format: OutputFormat) -> io::Result<()> {
    let rendered = render_query(query, format).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered)
}

/// Print an error to stderr, highlighted when `color` is set
pub fn print_error(message: &str, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(stderr, "error")?;
    stderr.reset()?;
    writeln!(stderr, ": {}", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::anchor::AnchorId;
    use crate::query::clause::Occur;

    fn p(text: &str) -> PositionalClause {
        PositionalClause::Term(TermClause::new("body", text))
    }

    #[test]
    fn test_render_near() {
        let q = Query::Positional(PositionalClause::near(vec![p("a"), p("b")], 2, true));
        assert_eq!(q.to_string(), "spanNear([body:a, body:b], 2, true)");
    }

    #[test]
    fn test_render_not_and_or() {
        let q = Query::Positional(PositionalClause::not(
            PositionalClause::Or(vec![p("a"), p("b")]),
            p("c"),
        ));
        assert_eq!(q.to_string(), "spanNot(spanOr([body:a, body:b]), body:c)");
    }

    #[test]
    fn test_render_boolean() {
        let q = Query::Boolean(vec![
            (Query::Term(TermClause::new("body", "a").with_boost(2.0)), Occur::Must),
            (Query::Phrase(AnchorId(0)), Occur::MustNot),
            (
                Query::Range(RangeClause {
                    field: "date".into(),
                    lower: Some("a".into()),
                    upper: None,
                    include_lower: true,
                    include_upper: false,
                    boost: 1.0,
                }),
                Occur::Should,
            ),
        ]);
        assert_eq!(q.to_string(), "(+body:a^2 -<phrase #0> date:[a TO *})");
    }

    #[test]
    fn test_render_json() {
        let q = Query::Term(TermClause::new("body", "a"));
        let json = render_query(&q, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["term"]["field"], "body");
        assert_eq!(value["term"]["text"], "a");
    }
}
