//! Lexing and shape checks for Newick statements handed to `phylotree`.
//!
//! `phylotree` builds topology, branch lengths and comments, but it only
//! knows double quotes (and keeps them inside the name), drops whitespace
//! from single-quoted labels, and cannot parse a statement that does not
//! open with `(`. Every statement is lexed here first:
//!
//! - `'…'` and `"…"` labels are unquoted; a doubled quote inside stands for
//!   one quote character;
//! - each label is swapped for a numbered placeholder, so label text never
//!   reaches `phylotree`;
//! - BEAST-style `[&…]` annotations are dropped, other `[…]` comments kept;
//! - the bracket structure is checked;
//! - statements without parentheses (`label;` and `;`) are returned as is,
//!   without a skeleton.
//!
//! ```text
//! ('Homo sapiens_gene1':0.1,b[&rate=1][x]);
//!     ──►  skeleton (L0:0.1,L1[x]);   labels ["Homo sapiens_gene1", "b"]
//! ```

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::TreeError;

const PLACEHOLDER: char = 'L';

/// Label, branch length and comment written after a node.
#[derive(Debug, Clone, Default, PartialEq)]
struct Suffix {
    name: Option<String>,
    length: Option<String>,
    comment: Option<String>,
}

impl Suffix {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.length.is_none() && self.comment.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Comma,
    Suffix(Suffix),
    End,
}

/// A lexed Newick statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    /// `;` on its own: a tree without nodes.
    Empty,
    /// `label[:length];` without parentheses: a single-node tree.
    Leaf { name: Option<String>, comment: Option<String> },
    /// A parenthesized tree, rewritten with placeholder labels.
    Nested { skeleton: String, labels: Vec<String> },
}

/// Label behind a placeholder name produced by [`lex_statement`].
pub(crate) fn placeholder_label<'a>(labels: &'a [String], name: &str) -> Option<&'a str> {
    let k: usize = name.strip_prefix(PLACEHOLDER)?.parse().ok()?;
    labels.get(k).map(String::as_str)
}

fn parse_error(msg: impl Into<String>) -> TreeError {
    TreeError::Parse(msg.into())
}

/// Lex the first `;`-terminated statement of `text`; anything after it is ignored.
pub(crate) fn lex_statement(text: &str) -> Result<Statement, TreeError> {
    let tokens = tokenize(text)?;
    check_shape(&tokens)?;

    if !tokens.contains(&Token::Open) {
        return Ok(match tokens.into_iter().next() {
            Some(Token::Suffix(suffix)) => Statement::Leaf { name: suffix.name, comment: suffix.comment },
            _ => Statement::Empty,
        });
    }

    let mut skeleton = String::new();
    let mut labels = Vec::new();
    for token in tokens {
        match token {
            Token::Open => skeleton.push('('),
            Token::Close => skeleton.push(')'),
            Token::Comma => skeleton.push(','),
            Token::End => skeleton.push(';'),
            Token::Suffix(suffix) => {
                // Writing into a String cannot fail.
                if let Some(name) = suffix.name {
                    let _ = write!(skeleton, "{PLACEHOLDER}{}", labels.len());
                    labels.push(name);
                }
                if let Some(length) = suffix.length {
                    let _ = write!(skeleton, ":{length}");
                }
                if let Some(comment) = suffix.comment {
                    let _ = write!(skeleton, "[{comment}]");
                }
            }
        }
    }
    Ok(Statement::Nested { skeleton, labels })
}

fn tokenize(text: &str) -> Result<Vec<Token>, TreeError> {
    let mut tokens = Vec::new();
    let mut suffix = Suffix::default();
    let mut in_length = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                if suffix.name.is_some() || suffix.length.is_some() {
                    return Err(parse_error("label or branch length before '('"));
                }
                suffix = Suffix::default();
                tokens.push(Token::Open);
            }
            ')' | ',' | ';' => {
                let done = std::mem::take(&mut suffix);
                if let Some(length) = &done.length {
                    check_length(length)?;
                }
                if !done.is_empty() {
                    tokens.push(Token::Suffix(done));
                }
                in_length = false;
                tokens.push(match c {
                    ')' => Token::Close,
                    ',' => Token::Comma,
                    _ => Token::End,
                });
                if c == ';' {
                    return Ok(tokens);
                }
            }
            '[' => {
                let comment = read_comment(&mut chars)?;
                if !comment.starts_with('&') {
                    suffix.comment.get_or_insert_with(String::new).push_str(&comment);
                }
            }
            ']' => return Err(parse_error("unmatched ']'")),
            ':' => {
                if suffix.length.is_some() {
                    return Err(parse_error("two branch lengths on one node"));
                }
                suffix.length = Some(String::new());
                in_length = true;
            }
            c if c.is_whitespace() => {}
            c if in_length => {
                if let Some(length) = suffix.length.as_mut() {
                    length.push(c);
                }
            }
            '\'' | '"' => read_quoted(c, &mut chars, suffix.name.get_or_insert_with(String::new))?,
            c => suffix.name.get_or_insert_with(String::new).push(c),
        }
    }

    Err(parse_error("missing terminating ';'"))
}

fn check_length(length: &str) -> Result<(), TreeError> {
    length
        .parse::<f64>()
        .map(|_| ())
        .map_err(|_| parse_error(format!("invalid branch length '{length}'")))
}

/// Append a quoted label body to `out`; a doubled quote is one literal quote.
fn read_quoted(quote: char, chars: &mut Peekable<Chars<'_>>, out: &mut String) -> Result<(), TreeError> {
    while let Some(c) = chars.next() {
        if c != quote {
            out.push(c);
        } else if chars.peek() == Some(&quote) {
            chars.next();
            out.push(quote);
        } else {
            return Ok(());
        }
    }
    Err(parse_error("unterminated quoted label"))
}

fn read_comment(chars: &mut Peekable<Chars<'_>>) -> Result<String, TreeError> {
    let mut comment = String::new();
    for c in chars.by_ref() {
        if c == ']' {
            return Ok(comment);
        }
        comment.push(c);
    }
    Err(parse_error("unterminated comment"))
}

/// Brackets balance, the root closes last, and `(` only opens a node.
fn check_shape(tokens: &[Token]) -> Result<(), TreeError> {
    let mut depth = 0usize;
    let mut root_closed = false;
    let mut prev: Option<&Token> = None;

    for token in tokens {
        match token {
            Token::Open => {
                if root_closed || !matches!(prev, None | Some(Token::Open) | Some(Token::Comma)) {
                    return Err(parse_error("'(' may only open a node"));
                }
                depth += 1;
            }
            Token::Comma if depth == 0 => return Err(parse_error("',' outside parentheses")),
            Token::Close => {
                depth = depth.checked_sub(1).ok_or_else(|| parse_error("unbalanced ')'"))?;
                root_closed |= depth == 0;
            }
            Token::End if depth > 0 => return Err(parse_error("unclosed '('")),
            _ => {}
        }
        prev = Some(token);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(text: &str) -> (String, Vec<String>) {
        match lex_statement(text).unwrap() {
            Statement::Nested { skeleton, labels } => (skeleton, labels),
            other => panic!("expected a nested tree, got {other:?}"),
        }
    }

    #[test]
    fn swaps_labels_for_placeholders() {
        let (skeleton, labels) = nested("((A:0.1,B:0.2)90:0.3,C);");
        assert_eq!(skeleton, "((L0:0.1,L1:0.2)L2:0.3,L3);");
        assert_eq!(labels, vec!["A", "B", "90", "C"]);
        assert_eq!(placeholder_label(&labels, "L2"), Some("90"));
        assert_eq!(placeholder_label(&labels, "L9"), None);
        assert_eq!(placeholder_label(&labels, "A"), None);
    }

    #[test]
    fn unquotes_single_and_double_quoted_labels() {
        let (_, labels) = nested("('x_gene1',\"y_gene1\",'Homo sapiens_gene2','it''s',' a ; b ');");
        assert_eq!(labels, vec!["x_gene1", "y_gene1", "Homo sapiens_gene2", "it's", " a ; b "]);
    }

    #[test]
    fn drops_annotations_and_keeps_comments() {
        let (skeleton, labels) = nested("(A:[&rate=0.1]1.0,B[note]:2.0,'c[&x]');");
        assert_eq!(skeleton, "(L0:1.0,L1:2.0[note],L2);");
        assert_eq!(labels, vec!["A", "B", "c[&x]"]);
    }

    #[test]
    fn stops_at_the_first_statement() {
        let (skeleton, _) = nested("  (A,B);\n(C,D);\n");
        assert_eq!(skeleton, "(L0,L1);");
        let (_, labels) = nested("('x;y',B);");
        assert_eq!(labels, vec!["x;y", "B"]);
    }

    #[test]
    fn bare_statements_skip_the_skeleton() {
        assert_eq!(lex_statement(";").unwrap(), Statement::Empty);
        assert_eq!(lex_statement("  ;\n").unwrap(), Statement::Empty);
        assert_eq!(
            lex_statement("x_gene1:0.4;").unwrap(),
            Statement::Leaf { name: Some("x_gene1".to_string()), comment: None }
        );
        assert_eq!(
            lex_statement("'Homo sapiens'[seen];").unwrap(),
            Statement::Leaf { name: Some("Homo sapiens".to_string()), comment: Some("seen".to_string()) }
        );
    }

    #[test]
    fn rejects_malformed_statements() {
        for bad in [
            "a,b;",
            "(a,b),c;",
            "(a,b));",
            "((a,b);",
            "(a,b)",
            "(a)(b);",
            "a(b,c);",
            "(a:x,b);",
            "(a:,b);",
            "(a:1:2,b);",
            "('a,b);",
            "(a[note,b);",
            "(a],b);",
            "",
        ] {
            assert!(matches!(lex_statement(bad), Err(TreeError::Parse(_))), "{bad:?} should not lex");
        }
    }
}
