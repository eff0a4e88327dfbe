use std::borrow::Cow;

use crate::ast::Node;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::token::{Pos, Token, TokenKind};

/// Deepest lookahead the parser needs.
const LOOKAHEAD: usize = 5;

/// Lookahead and pushback over a token stream, as seen by the parser and by
/// tag plugins.
///
/// A lexer error token is never handed out: it surfaces as a
/// [`ParseErrorKind::Lex`] error instead.
pub trait Stepper<'src> {
    /// Consumes and returns the next token.
    fn next(&mut self) -> ParseResult<Token<'src>>;

    /// Returns the next token without consuming it.
    fn peek(&mut self) -> ParseResult<Token<'src>>;

    /// Pushes `token` back so the next [`Stepper::next`] returns it.
    fn backup(&mut self, token: Token<'src>);

    /// Discards tokens up to and including the next one of `kind`, or up to
    /// the end of input.
    fn consume_until(&mut self, kind: TokenKind) -> ParseResult<()>;

    /// Builds an error located at the most recently consumed token.
    fn errorf(&self, kind: ParseErrorKind) -> ParseError;

    /// Parses one tag whose `{%` has already been consumed.
    fn parse_tag(&mut self) -> ParseResult<Node>;

    /// Parses text and nested tags up to a `{% <end> %}` tag, which is
    /// consumed.
    ///
    /// # Errors
    /// Fails on end-of-input before the closing tag.
    fn parse_body_until(&mut self, end: &str) -> ParseResult<Vec<Node>>;
}

/// Buffers tokens from any token source for lookahead and pushback.
pub struct TokenStream<'src, I> {
    source: I,
    /// Pushed-back tokens, the next one last.
    pending: Vec<Token<'src>>,
    /// Location of the most recently handed out token.
    last: (Pos, usize, usize),
    /// Whether the source has delivered its end-of-input token.
    ended: bool,
}

impl<'src, I> TokenStream<'src, I>
where
    I: Iterator<Item = Token<'src>>,
{
    pub fn new(source: I) -> Self {
        Self {
            source,
            pending: Vec::with_capacity(LOOKAHEAD),
            last: (Pos(0), 1, 1),
            ended: false,
        }
    }

    fn pull(&mut self) -> Token<'src> {
        if let Some(token) = self.pending.pop() {
            return token;
        }
        let (pos, line, column) = self.last;
        match self.source.next() {
            Some(token) => {
                if token.kind == TokenKind::EndOfInput {
                    self.ended = true;
                }
                token
            }
            // Reading past a delivered end-of-input keeps yielding it.
            None if self.ended => Token {
                kind: TokenKind::EndOfInput,
                pos,
                text: Cow::Borrowed(""),
                line,
                column,
            },
            None => Token {
                kind: TokenKind::Error,
                pos,
                text: Cow::Borrowed("token stream closed before end of input"),
                line,
                column,
            },
        }
    }

    fn checked(&mut self, token: Token<'src>) -> ParseResult<Token<'src>> {
        self.last = (token.pos, token.line, token.column);
        if token.kind == TokenKind::Error {
            let message = token.text.to_string();
            // Keep the error at the front so later reads fail the same way.
            self.pending.push(token.clone());
            return Err(ParseError::at(&token, ParseErrorKind::Lex { message }));
        }
        Ok(token)
    }

    pub fn next(&mut self) -> ParseResult<Token<'src>> {
        let token = self.pull();
        self.checked(token)
    }

    pub fn peek(&mut self) -> ParseResult<Token<'src>> {
        let token = self.pull();
        self.pending.push(token.clone());
        if token.kind == TokenKind::Error {
            return Err(ParseError::at(
                &token,
                ParseErrorKind::Lex {
                    message: token.text.to_string(),
                },
            ));
        }
        Ok(token)
    }

    pub fn backup(&mut self, token: Token<'src>) {
        self.pending.push(token);
    }

    pub fn consume_until(&mut self, kind: TokenKind) -> ParseResult<()> {
        loop {
            let token = self.next()?;
            if token.kind == kind || token.kind == TokenKind::EndOfInput {
                return Ok(());
            }
        }
    }

    pub fn errorf(&self, kind: ParseErrorKind) -> ParseError {
        let (position, line, column) = self.last;
        ParseError {
            line,
            column,
            position,
            kind,
        }
    }
}
