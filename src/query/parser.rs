//! Base query grammar.
//!
//! A small Lucene-flavoured syntax: bare and field-qualified terms, `+`/`-`
//! modifiers, `AND`/`OR`/`NOT`, groups, wildcards, fuzzy terms, ranges,
//! quoted phrases with `~slop` and `^boost` suffixes.
//!
//! The grammar does not decide what a clause *is*. Every construct is handed
//! to a [`ClauseBuilder`], so the same parser drives both phrase capture and
//! field-restricted phrase resolution.

use crate::config::Operator;
use crate::error::{QueryError, Result};
use crate::query::clause::{Occur, RangeClause};

/// How multi-term constructs (wildcard, fuzzy, range) are realised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiTermMode {
    /// Kept as a single opaque clause
    Opaque,
    /// Enumerated into a boolean composite of terms
    Expand,
}

/// Per-call parse settings, threaded through every builder hook
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub default_field: &'a str,
    pub default_operator: Operator,
    pub fuzzy_max_edits: u32,
    pub multi_term: MultiTermMode,
}

/// Construction hooks the grammar calls for every clause it recognises.
pub trait ClauseBuilder {
    type Clause;

    fn term(&mut self, ctx: &ParseContext<'_>, field: &str, text: &str) -> Result<Self::Clause>;

    fn wildcard(
        &mut self,
        ctx: &ParseContext<'_>,
        field: &str,
        pattern: &str,
    ) -> Result<Self::Clause>;

    fn fuzzy(
        &mut self,
        ctx: &ParseContext<'_>,
        field: &str,
        text: &str,
        max_edits: u32,
    ) -> Result<Self::Clause>;

    fn range(&mut self, ctx: &ParseContext<'_>, range: RangeClause) -> Result<Self::Clause>;

    fn phrase(
        &mut self,
        ctx: &ParseContext<'_>,
        field: &str,
        text: &str,
        slop: u32,
    ) -> Result<Self::Clause>;

    fn boolean(
        &mut self,
        ctx: &ParseContext<'_>,
        clauses: Vec<(Self::Clause, Occur)>,
    ) -> Result<Self::Clause>;

    fn boost(&mut self, clause: Self::Clause, boost: f32) -> Result<Self::Clause>;
}

/// Parse `input` under `ctx`, building clauses with `builder`.
pub fn parse_with<B: ClauseBuilder>(
    input: &str,
    ctx: &ParseContext<'_>,
    builder: &mut B,
) -> Result<B::Clause> {
    let mut grammar = Grammar {
        input,
        pos: 0,
        depth: 0,
        ctx,
        builder,
    };
    let clause = grammar.parse_query(ctx.default_field)?;
    grammar.skip_whitespace();
    if !grammar.is_eof() {
        return Err(QueryError::syntax(grammar.pos, "unexpected `)`"));
    }
    Ok(clause)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    None,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

/// A bare word as written, and with escapes removed
struct TermToken {
    raw: String,
    text: String,
    wildcard: bool,
}

const SPECIAL: &[char] = &['(', ')', '"', ':', '^', '~', '[', ']', '{', '}'];

/// Maximum group nesting
const MAX_DEPTH: usize = 128;

struct Grammar<'a, 'b, B> {
    input: &'a str,
    pos: usize,
    depth: usize,
    ctx: &'b ParseContext<'b>,
    builder: &'b mut B,
}

impl<B: ClauseBuilder> Grammar<'_, '_, B> {
    fn parse_query(&mut self, field: &str) -> Result<B::Clause> {
        let mut clauses: Vec<(B::Clause, Occur)> = Vec::new();
        let mut bare_first = false;

        loop {
            self.skip_whitespace();
            if self.is_eof() || self.peek_char() == Some(')') {
                break;
            }

            let conj = self.parse_conjunction();
            self.skip_whitespace();
            if conj != Conjunction::None && (self.is_eof() || self.peek_char() == Some(')')) {
                return Err(QueryError::syntax(self.pos, "expected clause after conjunction"));
            }

            let modifier = self.parse_modifier();
            self.skip_whitespace();
            let clause = self.parse_clause(field)?;

            if let Some(last) = clauses.last_mut() {
                match conj {
                    Conjunction::And if last.1 == Occur::Should => last.1 = Occur::Must,
                    Conjunction::Or
                        if self.ctx.default_operator == Operator::And && last.1 == Occur::Must =>
                    {
                        last.1 = Occur::Should
                    }
                    _ => {}
                }
            }

            let occur = self.occur_for(conj, modifier);
            if clauses.is_empty() {
                bare_first = conj == Conjunction::None && modifier == Modifier::None;
            }
            clauses.push((clause, occur));
        }

        if clauses.len() == 1 && bare_first {
            if let Some((clause, _)) = clauses.pop() {
                return Ok(clause);
            }
        }
        self.builder.boolean(self.ctx, clauses)
    }

    fn occur_for(&self, conj: Conjunction, modifier: Modifier) -> Occur {
        if modifier == Modifier::Prohibited {
            return Occur::MustNot;
        }
        let required = match self.ctx.default_operator {
            Operator::Or => modifier == Modifier::Required || conj == Conjunction::And,
            Operator::And => conj != Conjunction::Or || modifier == Modifier::Required,
        };
        if required { Occur::Must } else { Occur::Should }
    }

    fn parse_conjunction(&mut self) -> Conjunction {
        if self.remaining().starts_with("&&") {
            self.pos += 2;
            Conjunction::And
        } else if self.remaining().starts_with("||") {
            self.pos += 2;
            Conjunction::Or
        } else if self.consume_keyword("AND") {
            Conjunction::And
        } else if self.consume_keyword("OR") {
            Conjunction::Or
        } else {
            Conjunction::None
        }
    }

    fn parse_modifier(&mut self) -> Modifier {
        if self.consume_char('+') {
            Modifier::Required
        } else if self.consume_char('-') || self.consume_char('!') || self.consume_keyword("NOT") {
            Modifier::Prohibited
        } else {
            Modifier::None
        }
    }

    fn parse_clause(&mut self, field: &str) -> Result<B::Clause> {
        let clause = self.parse_primary(field)?;
        if self.consume_char('^') {
            let boost = self.parse_number::<f32>("boost")?;
            return self.builder.boost(clause, boost);
        }
        Ok(clause)
    }

    fn parse_primary(&mut self, field: &str) -> Result<B::Clause> {
        match self.peek_char() {
            Some('(') => {
                if self.depth == MAX_DEPTH {
                    return Err(QueryError::syntax(self.pos, "groups nested too deeply"));
                }
                self.advance();
                self.depth += 1;
                let clause = self.parse_query(field)?;
                self.depth -= 1;
                self.skip_whitespace();
                if !self.consume_char(')') {
                    return Err(QueryError::syntax(self.pos, "missing `)`"));
                }
                Ok(clause)
            }
            Some('"') => self.parse_phrase(field),
            Some('[') | Some('{') => self.parse_range(field),
            _ => self.parse_term(field),
        }
    }

    fn parse_phrase(&mut self, field: &str) -> Result<B::Clause> {
        let open = self.pos;
        self.consume_char('"');
        let start = self.pos;

        loop {
            match self.peek_char() {
                None => return Err(QueryError::syntax(open, "unterminated phrase")),
                Some('"') => break,
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(_) => self.advance(),
            }
        }

        let input = self.input;
        let text = &input[start..self.pos];
        self.consume_char('"');

        let mut slop = 0;
        if self.consume_char('~') && self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            slop = self.parse_number::<u32>("slop")?;
        }

        self.builder.phrase(self.ctx, field, text, slop)
    }

    fn parse_range(&mut self, field: &str) -> Result<B::Clause> {
        let open = self.pos;
        let include_lower = self.peek_char() == Some('[');
        self.advance();

        self.skip_whitespace();
        let lower = self.parse_range_bound()?;
        self.skip_whitespace();
        if !self.consume_keyword("TO") {
            return Err(QueryError::syntax(self.pos, "expected `TO` in range"));
        }
        self.skip_whitespace();
        let upper = self.parse_range_bound()?;
        self.skip_whitespace();

        let include_upper = match self.peek_char() {
            Some(']') => true,
            Some('}') => false,
            _ => return Err(QueryError::syntax(open, "unterminated range")),
        };
        self.advance();

        let range = RangeClause {
            field: field.to_string(),
            lower,
            upper,
            include_lower,
            include_upper,
            boost: 1.0,
        };
        self.builder.range(self.ctx, range)
    }

    fn parse_range_bound(&mut self) -> Result<Option<String>> {
        let start = self.pos;
        let bound = if self.consume_char('"') {
            let inner = self.pos;
            while !self.is_eof() && self.peek_char() != Some('"') {
                self.advance();
            }
            let text = self.input[inner..self.pos].to_string();
            if !self.consume_char('"') {
                return Err(QueryError::syntax(start, "unterminated range bound"));
            }
            text
        } else {
            while let Some(ch) = self.peek_char() {
                if ch.is_whitespace() || ch == ']' || ch == '}' {
                    break;
                }
                self.advance();
            }
            self.input[start..self.pos].to_string()
        };

        match bound.as_str() {
            "" => Err(QueryError::syntax(start, "empty range bound")),
            "*" => Ok(None),
            _ => Ok(Some(bound)),
        }
    }

    fn parse_term(&mut self, field: &str) -> Result<B::Clause> {
        let start = self.pos;
        let token = self.read_term();
        if token.raw.is_empty() {
            return Err(QueryError::syntax(start, "expected term"));
        }

        if !token.wildcard && self.consume_char(':') {
            if self.is_eof() || self.peek_char().is_some_and(char::is_whitespace) {
                return Err(QueryError::syntax(self.pos, "expected value after field"));
            }
            if self.depth == MAX_DEPTH {
                return Err(QueryError::syntax(start, "fields nested too deeply"));
            }
            self.depth += 1;
            let clause = self.parse_primary(&token.text);
            self.depth -= 1;
            return clause;
        }

        if self.consume_char('~') {
            let max_edits = if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.parse_number::<u32>("edit distance")?
            } else {
                self.ctx.fuzzy_max_edits
            };
            return self.builder.fuzzy(self.ctx, field, &token.text, max_edits);
        }

        if token.wildcard {
            self.builder.wildcard(self.ctx, field, &token.raw)
        } else {
            self.builder.term(self.ctx, field, &token.text)
        }
    }

    fn read_term(&mut self) -> TermToken {
        let mut token = TermToken {
            raw: String::new(),
            text: String::new(),
            wildcard: false,
        };

        while let Some(ch) = self.peek_char() {
            if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.peek_char() {
                    token.raw.push('\\');
                    token.raw.push(escaped);
                    token.text.push(escaped);
                    self.advance();
                }
                continue;
            }
            if ch.is_whitespace() || SPECIAL.contains(&ch) {
                break;
            }
            if ch == '*' || ch == '?' {
                token.wildcard = true;
            }
            token.raw.push(ch);
            token.text.push(ch);
            self.advance();
        }

        token
    }

    fn parse_number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| QueryError::syntax(start, format!("invalid {}", what)))
    }

    /// Consume `keyword` only when it stands alone as a word
    fn consume_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.remaining();
        if !rest.starts_with(keyword) {
            return false;
        }
        let boundary = rest[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '(' || c == '"');
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }
}
