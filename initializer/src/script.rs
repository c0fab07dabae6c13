//! Statement script loading
//!
//! Reads the bundled SQL script and cuts it into the ordered statement
//! sequence. Statement mode ignores semicolons that appear inside quoted
//! text or comments, so one statement may span several lines.

use crate::config::SplitMode;
use crate::error::InitError;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use tokio::fs;
use tracing::debug;

/// Read the script at `path` and split it into statements, in file order.
pub async fn load_script(path: &Path, mode: SplitMode) -> Result<Vec<String>, InitError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| InitError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;

    let statements = match mode {
        SplitMode::Statements => {
            split_statements(&content).map_err(|reason| InitError::ScriptParse {
                path: path.to_path_buf(),
                reason,
            })?
        }
        SplitMode::Lines => split_lines(&content),
    };

    debug!(path = %path.display(), ?mode, count = statements.len(), "Script split");
    Ok(statements)
}

/// One statement per line. Lines are trimmed and blank lines dropped.
pub fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexer {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// `--` opens a comment only when followed by whitespace, a control
/// character or the end of input. `5--3` is arithmetic.
fn opens_dash_comment(rest: &Peekable<Chars<'_>>) -> bool {
    let mut ahead = rest.clone();
    if ahead.next() != Some('-') {
        return false;
    }
    match ahead.next() {
        None => true,
        Some(c) => c.is_whitespace() || c.is_control(),
    }
}

/// Split a script on statement-terminating semicolons.
///
/// Understands MySQL quoting (`'...'`, `"..."`, `` `...` ``, doubled quotes
/// and backslash escapes) and comments (`--`, `#`, `/* */`). Fragments that
/// hold only whitespace or comments are dropped; the server rejects them as
/// empty queries.
pub fn split_statements(content: &str) -> Result<Vec<String>, String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut state = Lexer::Code;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            Lexer::LineComment => {
                current.push(ch);
                if ch == '\n' {
                    state = Lexer::Code;
                }
            }
            Lexer::BlockComment => {
                current.push(ch);
                if ch == '*' && chars.peek() == Some(&'/') {
                    current.push('/');
                    chars.next();
                    state = Lexer::Code;
                }
            }
            Lexer::Quoted(quote) => {
                current.push(ch);
                if ch == '\\' && quote != '`' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if ch == quote {
                    if chars.peek() == Some(&quote) {
                        current.push(quote);
                        chars.next();
                    } else {
                        state = Lexer::Code;
                    }
                }
            }
            Lexer::Code => match ch {
                ';' => {
                    if has_code {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_code = false;
                }
                '\'' | '"' | '`' => {
                    current.push(ch);
                    has_code = true;
                    state = Lexer::Quoted(ch);
                }
                '#' => {
                    current.push(ch);
                    state = Lexer::LineComment;
                }
                '-' if opens_dash_comment(&chars) => {
                    current.push_str("--");
                    chars.next();
                    state = Lexer::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    current.push_str("/*");
                    chars.next();
                    state = Lexer::BlockComment;
                }
                _ => {
                    current.push(ch);
                    has_code |= !ch.is_whitespace();
                }
            },
        }
    }

    match state {
        Lexer::Quoted(quote) => return Err(format!("unterminated {} quoted text", quote)),
        Lexer::BlockComment => return Err("unterminated block comment".to_string()),
        Lexer::Code | Lexer::LineComment => {}
    }

    if has_code {
        statements.push(current.trim().to_string());
    }

    Ok(statements)
}
