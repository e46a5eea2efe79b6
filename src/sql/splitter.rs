//! Worksheet text to statement list.
//!
//! A best-effort tokenizer: `;` ends a statement unless it sits inside a
//! literal, a quoted identifier or a comment. Anonymous blocks and stored
//! program bodies contain semicolons of their own, so any hint of block syntax
//! makes the whole worksheet run as one statement.

use super::lexer::{self, Mode, Token};

const SEPARATOR: char = ';';

/// Keywords that start a block, or that only make sense inside one.
const BLOCK_KEYWORDS: &[&str] = &["BEGIN", "DECLARE", "END", "EXCEPTION", "WHEN", "ELSE", "ELSIF", "LOOP", "THEN"];

/// Splits worksheet text into trimmed, non-empty statements without their
/// trailing separator and without leading comments.
pub fn split_statements(text: &str) -> Vec<String> {
  let fragments = split_fragments(text);

  let needs_block_fallback = fragments.iter().any(|fragment| {
    lexer::leading_keyword(fragment).is_some_and(|keyword| BLOCK_KEYWORDS.contains(&keyword.as_str()))
  });
  if !needs_block_fallback {
    return fragments;
  }

  let whole = normalize_block(text);
  if is_blank_sql(&whole) {
    Vec::new()
  } else {
    vec![whole]
  }
}

fn split_fragments(text: &str) -> Vec<String> {
  let mut fragments = Vec::new();
  let mut buffer = String::new();
  let mut mode = Mode::Code;
  let mut chars = text.chars().peekable();

  while let Some(ch) = chars.next() {
    let token = lexer::step(&mut mode, ch, &mut chars);
    if token == Token::Code(SEPARATOR) {
      push_fragment(&mut fragments, &buffer);
      buffer.clear();
    } else {
      token.push_to(&mut buffer);
    }
  }
  push_fragment(&mut fragments, &buffer);

  fragments
}

fn push_fragment(fragments: &mut Vec<String>, buffer: &str) {
  let statement = lexer::strip_leading_comments(buffer).trim();
  // A lone `/` is a SQL*Plus run command, not a statement.
  if statement != "/" && !is_blank_sql(statement) {
    fragments.push(statement.to_string());
  }
}

fn is_blank_sql(sql: &str) -> bool {
  lexer::mask_quotes_and_comments(sql).trim().is_empty()
}

/// Whole-worksheet form used for blocks: leading comments and trailing
/// SQL*Plus `/` terminator lines removed, inner semicolons kept.
fn normalize_block(text: &str) -> String {
  let body = lexer::strip_leading_comments(text);
  let mut lines: Vec<&str> = body.lines().collect();
  while lines.last().is_some_and(|line| line.trim().is_empty() || line.trim() == "/") {
    lines.pop();
  }
  lines.join("\n").trim().to_string()
}
