//! Query parsing and matching.
//!
//! The query surface is `field:value` clauses with `*`/`?` wildcards, bare
//! free-text terms matching any non-reserved field, quoted values for terms
//! containing whitespace, implicit AND between clauses, and explicit `OR`
//! between clause groups. Matching is case-insensitive.

use crate::document::IndexedDocument;
use crate::error::{IndexError, IndexResult};

/// One parsed clause.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    /// `field:value` - the pattern must match one of the field's values.
    Term { field: String, pattern: String },
    /// A bare term - the pattern must match somewhere in the document.
    Text { pattern: String },
}

/// A parsed query: an OR of AND-groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    groups: Vec<Vec<Clause>>,
}

impl Query {
    /// Parses a query string.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::QuerySyntax`] on malformed input: empty query,
    /// empty field name, missing value, dangling operator, or an
    /// unterminated quote. No partial results are ever produced.
    pub fn parse(input: &str) -> IndexResult<Self> {
        let tokens = tokenize(input)?;
        let tokens = merge_dangling_fields(tokens)?;

        let mut groups = Vec::new();
        let mut current = Vec::new();
        let mut expect_clause = true;

        for token in tokens {
            if !token.quoted && token.text == "OR" {
                if expect_clause || current.is_empty() {
                    return Err(IndexError::query_syntax("dangling `OR`"));
                }
                groups.push(std::mem::take(&mut current));
                expect_clause = true;
                continue;
            }
            if !token.quoted && token.text == "AND" {
                if expect_clause || current.is_empty() {
                    return Err(IndexError::query_syntax("dangling `AND`"));
                }
                expect_clause = true;
                continue;
            }
            current.push(parse_clause(&token)?);
            expect_clause = false;
        }

        if expect_clause && !(groups.is_empty() && current.is_empty()) {
            return Err(IndexError::query_syntax("query ends with an operator"));
        }
        if !current.is_empty() {
            groups.push(current);
        }
        if groups.is_empty() {
            return Err(IndexError::query_syntax("empty query"));
        }
        Ok(Self { groups })
    }

    /// Returns true if the document satisfies the query.
    #[must_use]
    pub fn matches(&self, document: &IndexedDocument) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|clause| clause_matches(clause, document)))
    }
}

fn clause_matches(clause: &Clause, document: &IndexedDocument) -> bool {
    match clause {
        Clause::Term { field, pattern } => document
            .values(field)
            .iter()
            .any(|value| wildcard_match(pattern, value)),
        Clause::Text { pattern } => document.fields().iter().any(|(name, values)| {
            !IndexedDocument::is_reserved(name)
                && values.iter().any(|value| {
                    wildcard_match(pattern, value)
                        || value
                            .split_whitespace()
                            .any(|token| wildcard_match(pattern, token))
                })
        }),
    }
}

#[derive(Debug)]
struct Token {
    text: String,
    /// The token contains a quoted run.
    quoted: bool,
    /// The token begins with a quote: the whole token is a literal phrase.
    literal: bool,
}

/// Splits on whitespace, honoring double-quoted runs.
fn tokenize(input: &str) -> IndexResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut quoted = false;
    let mut literal = false;
    let mut in_quotes = false;

    for c in input.chars() {
        if in_quotes {
            if c == '"' {
                in_quotes = false;
            } else {
                text.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
            literal |= !quoted && text.is_empty();
            quoted = true;
        } else if c.is_whitespace() {
            if !text.is_empty() || quoted {
                tokens.push(Token {
                    text: std::mem::take(&mut text),
                    quoted,
                    literal,
                });
                quoted = false;
                literal = false;
            }
        } else {
            text.push(c);
        }
    }
    if in_quotes {
        return Err(IndexError::query_syntax("unterminated quote"));
    }
    if !text.is_empty() || quoted {
        tokens.push(Token {
            text,
            quoted,
            literal,
        });
    }
    Ok(tokens)
}

/// Joins a `field:` token with the following value token, so
/// `givenName: T*` parses the same as `givenName:T*`.
fn merge_dangling_fields(tokens: Vec<Token>) -> IndexResult<Vec<Token>> {
    let mut merged: Vec<Token> = Vec::new();
    let mut pending: Option<Token> = None;

    for token in tokens {
        if let Some(mut field) = pending.take() {
            field.text.push_str(&token.text);
            field.quoted |= token.quoted;
            merged.push(field);
        } else if !token.quoted && token.text.ends_with(':') {
            pending = Some(token);
        } else {
            merged.push(token);
        }
    }
    if let Some(field) = pending {
        return Err(IndexError::query_syntax(format!(
            "missing value after `{}`",
            field.text
        )));
    }
    Ok(merged)
}

fn parse_clause(token: &Token) -> IndexResult<Clause> {
    // A quoted phrase is always a literal free-text term, colon included.
    if token.literal {
        return Ok(Clause::Text {
            pattern: token.text.clone(),
        });
    }
    match token.text.split_once(':') {
        Some((field, value)) => {
            let field = field.trim();
            let value = value.trim();
            if field.is_empty() {
                return Err(IndexError::query_syntax(format!(
                    "missing field name in `{}`",
                    token.text
                )));
            }
            if value.is_empty() {
                return Err(IndexError::query_syntax(format!(
                    "missing value after `{field}:`"
                )));
            }
            Ok(Clause::Term {
                field: field.to_string(),
                pattern: value.to_string(),
            })
        }
        None => Ok(Clause::Text {
            pattern: token.text.clone(),
        }),
    }
}

/// Case-insensitive glob match with `*` (any run) and `?` (any one char).
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }
    pi == pattern.len()
}
