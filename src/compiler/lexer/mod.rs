//! Lexer for the template language.
//!
//! Splits a template into literal spans and `{{ ... }}` directives, line by
//! line. Directive contents are not interpreted here.


use super::error::{SyntaxError, SyntaxErrorKind};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal SQL text between directives (may be empty).
    Literal,
    /// Trimmed directive text, without the braces.
    Directive,
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based byte column where the token starts (at `{{` for directives).
    pub column: usize,
    /// Set on the first literal of every line after the first. Every such
    /// line starts with one, possibly empty.
    pub line_start: bool,
}

impl Token {
    pub fn is_directive(&self) -> bool {
        self.kind == TokenKind::Directive
    }
}

/// The lexer for template input.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenizes the entire input.
    pub fn tokenize(self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        for (idx, line) in self.input.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            Self::lex_line(line, idx + 1, &mut tokens)?;
        }
        Ok(tokens)
    }

    fn lex_line(line: &str, line_no: usize, tokens: &mut Vec<Token>) -> Result<(), SyntaxError> {
        let mut pos = 0;
        let mut first = true;

        loop {
            let rest = &line[pos..];
            let Some(start) = rest.find(OPEN) else {
                tokens.push(Self::literal(rest, line_no, pos, first));
                return Ok(());
            };

            // A continuation line always gets a leading literal, even when
            // it starts with a directive, so the line break is not lost.
            if start > 0 || (first && line_no > 1) {
                tokens.push(Self::literal(&rest[..start], line_no, pos, first));
            }
            first = false;

            let open_at = pos + start;
            let body_start = open_at + OPEN.len();
            let Some(end) = line[body_start..].find(CLOSE) else {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnterminatedDirective,
                    line_no,
                    open_at + 1,
                )
                .with_found(line[open_at..].trim()));
            };

            tokens.push(Token {
                kind: TokenKind::Directive,
                text: line[body_start..body_start + end].trim().to_string(),
                line: line_no,
                column: open_at + 1,
                line_start: false,
            });
            pos = body_start + end + CLOSE.len();
        }
    }

    fn literal(text: &str, line: usize, pos: usize, first: bool) -> Token {
        Token {
            kind: TokenKind::Literal,
            text: text.to_string(),
            line,
            column: pos + 1,
            line_start: first && line > 1,
        }
    }
}
