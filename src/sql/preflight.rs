//! Keyword sniffing that decides whether a batch needs the user's go-ahead.

use serde::Serialize;

use super::lexer;

const MUTATING_KEYWORDS: &[&str] = &[
  "INSERT", "UPDATE", "DELETE", "MERGE", "TRUNCATE", "DROP", "ALTER", "CREATE", "RENAME", "GRANT", "REVOKE", "COMMENT",
  "BEGIN", "DECLARE", "CALL", "EXECUTE",
];

const READ_ONLY_LEADERS: &[&str] = &["SELECT", "WITH", "EXPLAIN", "DESCRIBE", "DESC"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assessment {
  pub should_confirm: bool,
  pub reasons: Vec<String>,
}

impl Assessment {
  fn push_reason(&mut self, reason: String) {
    self.should_confirm = true;
    if !self.reasons.contains(&reason) {
      self.reasons.push(reason);
    }
  }
}

/// Classifies one statement. Mutating keywords anywhere outside literals and
/// comments are reported in the order they appear; otherwise an unrecognised
/// leading verb is reported on its own.
pub fn assess(statement: &str) -> Assessment {
  let mut assessment = Assessment::default();
  let masked = lexer::mask_quotes_and_comments(statement);

  for word in lexer::words(&masked) {
    if MUTATING_KEYWORDS.contains(&word.as_str()) {
      assessment.push_reason(word);
    }
  }

  if !assessment.should_confirm {
    if let Some(keyword) = lexer::leading_keyword(&masked) {
      if !READ_ONLY_LEADERS.contains(&keyword.as_str()) {
        assessment.push_reason(keyword);
      }
    }
  }

  assessment
}

/// Union of the per-statement assessments, reasons deduplicated in first-seen
/// order.
pub fn assess_all<S: AsRef<str>>(statements: &[S]) -> Assessment {
  let mut combined = Assessment::default();
  for statement in statements {
    for reason in assess(statement.as_ref()).reasons {
      combined.push_reason(reason);
    }
  }
  combined
}
