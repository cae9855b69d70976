//! ECA lexer: converts source text into tokens.
use eca_syntax::error::{error_at, Error, Result};
use eca_syntax::token::{Token, TokenKind};

/// Streaming character scanner that produces tokens with positions.
///
/// Newlines are significant and reported as [`TokenKind::Newline`] (runs of
/// blank lines collapse into one). Leading whitespace on a line that holds
/// code is reported as a single [`TokenKind::Indent`]. `;` starts a comment
/// that runs to the end of the line.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer over the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            at_line_start: true,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }
    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }

    fn make_token(&self, kind: TokenKind, line: usize, col: usize) -> Token {
        Token { kind, line, col }
    }

    /// Skips spaces, tabs, carriage returns and comments, stopping at a newline.
    fn skip_inline_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                ';' => {
                    while let Some(c2) = self.peek() {
                        if c2 == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Consumes leading whitespace and reports whether the line carries code
    /// after it.
    fn scan_indent(&mut self) -> bool {
        let mut indented = false;
        while let Some(' ' | '\t') = self.peek() {
            self.advance();
            indented = true;
        }
        let blank = matches!(self.peek(), None | Some('\n') | Some('\r') | Some(';'));
        indented && !blank
    }

    fn read_word(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    fn read_number(&mut self) -> Result<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let s = self.read_word();
        let val: u64 = s
            .parse()
            .map_err(|_| Error::with_span(format!("Invalid number '{}'", s), start_line, start_col))?;
        Ok(self.make_token(TokenKind::Number(val), start_line, start_col))
    }

    fn read_bytes(&mut self) -> Result<Token> {
        let start_line = self.line;
        let start_col = self.col;
        // 0x
        self.advance();
        self.advance();
        let digits = self.read_word();
        if digits.is_empty() {
            return error_at(start_line, start_col, "Empty bytes literal '0x'");
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return error_at(
                start_line,
                start_col,
                format!("Invalid hex digit '{}' in bytes literal '0x{}'", bad, digits),
            );
        }
        if digits.len() % 2 != 0 {
            return error_at(
                start_line,
                start_col,
                format!("Bytes literal '0x{}' has an odd number of hex digits", digits),
            );
        }
        let bytes = digits
            .as_bytes()
            .chunks(2)
            .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
            .collect();
        Ok(self.make_token(TokenKind::Bytes(bytes), start_line, start_col))
    }

    fn read_variable(&mut self, sigil: char) -> Result<Token> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();
        let name = self.read_word();
        if name.is_empty() {
            return error_at(
                start_line,
                start_col,
                format!("Expected variable name after '{}'", sigil),
            );
        }
        let kind = if sigil == '#' { TokenKind::VarDef(name) } else { TokenKind::VarRef(name) };
        Ok(self.make_token(kind, start_line, start_col))
    }

    /// Tokenize the entire input into a vector of tokens ending with Eof.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            if self.at_line_start {
                self.at_line_start = false;
                let line = self.line;
                if self.scan_indent() {
                    tokens.push(self.make_token(TokenKind::Indent, line, 1));
                }
            }
            self.skip_inline_whitespace();
            let line = self.line;
            let col = self.col;
            let tk = match self.peek() {
                None => {
                    tokens.push(self.make_token(TokenKind::Eof, line, col));
                    break;
                }
                Some('\n') => {
                    self.advance();
                    self.at_line_start = true;
                    let collapse = match tokens.last() {
                        None => true,
                        Some(t) => t.kind == TokenKind::Newline,
                    };
                    if collapse {
                        continue;
                    }
                    self.make_token(TokenKind::Newline, line, col)
                }
                Some('(') => {
                    self.advance();
                    self.make_token(TokenKind::LParen, line, col)
                }
                Some(')') => {
                    self.advance();
                    self.make_token(TokenKind::RParen, line, col)
                }
                Some(',') => {
                    self.advance();
                    self.make_token(TokenKind::Comma, line, col)
                }
                Some(':') => {
                    self.advance();
                    self.make_token(TokenKind::Colon, line, col)
                }
                Some(c @ ('#' | '@')) => self.read_variable(c)?,
                Some('0') if matches!(self.peek_next(), Some('x') | Some('X')) => self.read_bytes()?,
                Some(c) if c.is_ascii_digit() => self.read_number()?,
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    let word = self.read_word();
                    self.make_token(TokenKind::Ident(word), line, col)
                }
                Some(other) => {
                    return error_at(line, col, format!("Unexpected character '{}'", other));
                }
            };
            tokens.push(tk);
        }
        Ok(tokens)
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
