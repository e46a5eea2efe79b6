//! Character-level helpers shared by the splitter and the preflight check.
//!
//! None of this is a SQL parser: it only knows enough about quoting and
//! comments to avoid treating their contents as code.

use std::{iter::Peekable, str::Chars};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
  #[default]
  Code,
  SingleQuote,
  DoubleQuote,
  LineComment,
  BlockComment,
}

/// Advances `mode` past `ch`, consuming the second character of two-character
/// tokens (`--`, `/*`, `*/`, doubled quotes) from `chars`.
///
/// Returns the characters that make up the token so callers can copy them
/// verbatim.
pub(crate) fn step(mode: &mut Mode, ch: char, chars: &mut Peekable<Chars<'_>>) -> Token {
  match *mode {
    Mode::Code => match ch {
      '\'' => {
        *mode = Mode::SingleQuote;
        Token::QuoteOpen(ch)
      },
      '"' => {
        *mode = Mode::DoubleQuote;
        Token::QuoteOpen(ch)
      },
      '-' if chars.peek() == Some(&'-') => {
        chars.next();
        *mode = Mode::LineComment;
        Token::CommentOpen("--")
      },
      '/' if chars.peek() == Some(&'*') => {
        chars.next();
        *mode = Mode::BlockComment;
        Token::CommentOpen("/*")
      },
      _ => Token::Code(ch),
    },
    Mode::SingleQuote | Mode::DoubleQuote => {
      let quote = if *mode == Mode::SingleQuote { '\'' } else { '"' };
      if ch != quote {
        Token::Quoted(ch)
      } else if chars.peek() == Some(&quote) {
        chars.next();
        Token::EscapedQuote(quote)
      } else {
        *mode = Mode::Code;
        Token::QuoteClose(ch)
      }
    },
    Mode::LineComment => {
      if ch == '\n' {
        *mode = Mode::Code;
        Token::CommentClose("\n")
      } else {
        Token::Comment(ch)
      }
    },
    Mode::BlockComment => {
      if ch == '*' && chars.peek() == Some(&'/') {
        chars.next();
        *mode = Mode::Code;
        Token::CommentClose("*/")
      } else {
        Token::Comment(ch)
      }
    },
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
  Code(char),
  QuoteOpen(char),
  Quoted(char),
  EscapedQuote(char),
  QuoteClose(char),
  CommentOpen(&'static str),
  Comment(char),
  CommentClose(&'static str),
}

impl Token {
  pub(crate) fn push_to(self, out: &mut String) {
    match self {
      Token::Code(ch) | Token::QuoteOpen(ch) | Token::Quoted(ch) | Token::QuoteClose(ch) | Token::Comment(ch) => {
        out.push(ch)
      },
      Token::EscapedQuote(quote) => {
        out.push(quote);
        out.push(quote);
      },
      Token::CommentOpen(text) | Token::CommentClose(text) => out.push_str(text),
    }
  }
}

/// Removes comments and blanks at the start of `sql`.
pub(crate) fn strip_leading_comments(sql: &str) -> &str {
  let mut rest = sql.trim_start();
  loop {
    if let Some(after) = rest.strip_prefix("--") {
      rest = match after.find('\n') {
        Some(end) => after[end + 1..].trim_start(),
        None => "",
      };
    } else if let Some(after) = rest.strip_prefix("/*") {
      rest = match after.find("*/") {
        Some(end) => after[end + 2..].trim_start(),
        None => "",
      };
    } else {
      return rest;
    }
  }
}

/// Replaces comments with a single space and collapses quoted text to an empty
/// pair of quotes, so keywords inside string data or identifiers are not seen.
pub(crate) fn mask_quotes_and_comments(sql: &str) -> String {
  let mut masked = String::with_capacity(sql.len());
  let mut mode = Mode::Code;
  let mut chars = sql.chars().peekable();
  while let Some(ch) = chars.next() {
    match step(&mut mode, ch, &mut chars) {
      Token::Code(c) => masked.push(c),
      Token::QuoteOpen(q) | Token::QuoteClose(q) => masked.push(q),
      Token::Quoted(_) | Token::EscapedQuote(_) | Token::Comment(_) => {},
      Token::CommentOpen(_) => masked.push(' '),
      Token::CommentClose(text) => {
        if text == "\n" {
          masked.push('\n');
        }
      },
    }
  }
  masked
}

pub(crate) fn is_word_char(ch: char) -> bool {
  ch.is_alphanumeric() || matches!(ch, '_' | '$' | '#')
}

/// Upper-cased word tokens of already masked SQL.
pub(crate) fn words(masked: &str) -> impl Iterator<Item = String> + '_ {
  masked.split(|ch: char| !is_word_char(ch)).filter(|word| !word.is_empty()).map(str::to_ascii_uppercase)
}

/// First keyword of a statement, skipping leading comments and parentheses.
pub(crate) fn leading_keyword(sql: &str) -> Option<String> {
  let body = strip_leading_comments(sql).trim_start_matches(|ch: char| ch == '(' || ch.is_whitespace());
  let word: String = body.chars().take_while(|ch| is_word_char(*ch)).collect();
  if word.is_empty() {
    None
  } else {
    Some(word.to_ascii_uppercase())
  }
}
