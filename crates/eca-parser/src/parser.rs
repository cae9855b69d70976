//! Recursive-descent parser for the ECA assembly dialect.

use eca_syntax::ast::*;
use eca_syntax::error::{error_at, Result};
use eca_syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        // tokenize() always terminates the stream with Eof
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            error_at(
                tok.line,
                tok.col,
                format!("Expected {} but found {}", what, tok.kind.describe()),
            )
        }
    }

    fn skip_newlines(&mut self) {
        while self.at(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_line_end(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => {
                let tok = self.peek();
                error_at(tok.line, tok.col, format!("Expected end of line but found {}", tok.kind.describe()))
            }
        }
    }

    /// A function header starts with `name (` followed by a number; a call is `name ( )`.
    fn at_function_header(&self) -> bool {
        matches!(self.peek_kind_at(0), Some(TokenKind::Ident(_)))
            && matches!(self.peek_kind_at(1), Some(TokenKind::LParen))
            && matches!(self.peek_kind_at(2), Some(TokenKind::Number(_)))
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut items = Vec::new();
        let mut block: Vec<Instruction> = Vec::new();
        loop {
            self.skip_newlines();
            let tok = self.peek().clone();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Indent => {
                    return error_at(tok.line, tok.col, "Unexpected indentation outside of a function body");
                }
                _ if self.at_function_header() => {
                    if !block.is_empty() {
                        items.push(Item::Block(std::mem::take(&mut block)));
                    }
                    items.push(Item::Function(self.parse_function()?));
                }
                _ => {
                    while !self.at_line_end() {
                        block.push(self.parse_instruction(None)?);
                    }
                }
            }
        }
        if !block.is_empty() {
            items.push(Item::Block(block));
        }
        Ok(Program { items })
    }

    fn parse_arg_count(&mut self) -> Result<usize> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Number(n) => usize::try_from(n)
                .or_else(|_| error_at(tok.line, tok.col, format!("Argument count {} is too large", n))),
            other => error_at(
                tok.line,
                tok.col,
                format!("Expected argument count but found {}", other.describe()),
            ),
        }
    }

    pub fn parse_function(&mut self) -> Result<FunctionDef> {
        let head = self.advance();
        let name = match head.kind {
            TokenKind::Ident(name) => name,
            other => {
                return error_at(head.line, head.col, format!("Expected function name but found {}", other.describe()));
            }
        };
        self.expect(TokenKind::LParen, "'('")?;
        let in_args = self.parse_arg_count()?;
        self.expect(TokenKind::Comma, "','")?;
        let out_args = self.parse_arg_count()?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Colon, "':' after function header")?;
        self.expect_line_end()?;

        let mut body = Vec::new();
        while self.at(&TokenKind::Indent) {
            self.advance();
            while !self.at_line_end() {
                body.push(self.parse_instruction(Some(&name))?);
            }
            self.expect_line_end()?;
        }
        if body.is_empty() {
            return error_at(head.line, head.col, format!("Function '{}' has an empty body", name));
        }
        Ok(FunctionDef { name, in_args, out_args, body })
    }

    /// Parses one instruction; `function` names the enclosing function, if any.
    pub fn parse_instruction(&mut self, function: Option<&str>) -> Result<Instruction> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::VarDef(name) => match function {
                Some(f) => error_at(
                    tok.line,
                    tok.col,
                    format!("Variable '#{}' cannot be defined inside function '{}'", name, f),
                ),
                None => Ok(Instruction::VarDef { name }),
            },
            TokenKind::Ident(name) => {
                if self.at(&TokenKind::LParen) {
                    self.advance();
                    self.expect(TokenKind::RParen, "')' to close call")?;
                    return Ok(Instruction::Call { name });
                }
                match push_suffix(&name) {
                    Some(n) if (1..=MAX_PUSH_WIDTH).contains(&n) => {
                        let operand = self.parse_push_operand(&name)?;
                        Ok(Instruction::Op { name, operand: Some(operand) })
                    }
                    Some(n) => error_at(
                        tok.line,
                        tok.col,
                        format!("Invalid push size {} in '{}' (expected 1..=32)", n, name),
                    ),
                    None => Ok(Instruction::Op { name, operand: None }),
                }
            }
            other => error_at(
                tok.line,
                tok.col,
                format!("Unexpected {}, expected an instruction", other.describe()),
            ),
        }
    }

    fn parse_push_operand(&mut self, push: &str) -> Result<Operand> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Bytes(bytes) => Ok(Operand::Literal(bytes)),
            TokenKind::VarRef(var) => Ok(Operand::Var(var)),
            other => error_at(
                tok.line,
                tok.col,
                format!("Expected bytes literal or @variable after '{}' but found {}", push, other.describe()),
            ),
        }
    }
}
