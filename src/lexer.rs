use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;

use crate::token::{Pos, Token, TokenKind};

const TAG_START: &str = "{%";
const TAG_END: &str = "%}";
const VAR_START: &str = "{{";
const VAR_END: &str = "}}";

const DECIMAL_DIGITS: &str = "0123456789_";
const HEX_DIGITS: &str = "0123456789abcdefABCDEF_";
const OCTAL_DIGITS: &str = "01234567_";
const BINARY_DIGITS: &str = "01_";

/// A lexer state: scans some input, emits tokens and names the next state.
/// `None` stops the machine.
struct StateFn(fn(&mut Lexer<'_>) -> Option<StateFn>);

/// Streaming lexer over a template source.
///
/// Tokens are produced on demand by running the state machine until at least
/// one token is pending. The stream ends after [`TokenKind::EndOfInput`] or
/// after the first [`TokenKind::Error`] token.
pub struct Lexer<'a> {
    name: &'a str,
    input: &'a str,
    state: Option<StateFn>,
    pending: VecDeque<Token<'a>>,

    /// Current position in the input.
    pos: usize,
    /// Start of the token being scanned.
    start: usize,
    /// Line at `pos`.
    line: usize,
    /// Offset of the first byte of the line at `pos`.
    line_start: usize,
    start_line: usize,
    start_column: usize,
    paren_depth: usize,
}

/// Creates a lexer for `input`. `name` labels diagnostics.
pub fn lex<'a>(name: &'a str, input: &'a str) -> Lexer<'a> {
    Lexer::new(name, input)
}

impl<'a> Lexer<'a> {
    pub fn new(name: &'a str, input: &'a str) -> Self {
        Self {
            name,
            input,
            state: Some(StateFn(lex_text)),
            pending: VecDeque::new(),
            pos: 0,
            start: 0,
            line: 1,
            line_start: 0,
            start_line: 1,
            start_column: 1,
            paren_depth: 0,
        }
    }

    pub const fn name(&self) -> &'a str {
        self.name
    }

    fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes the next char, keeping the line bookkeeping current.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    /// Moves forward to `target`, counting any newlines skipped over.
    fn skip_to(&mut self, target: usize) {
        let skipped = self.input.get(self.pos..target).unwrap_or_default();
        if let Some(last) = skipped.rfind('\n') {
            self.line += skipped.matches('\n').count();
            self.line_start = self.pos + last + 1;
        }
        self.pos = target;
    }

    fn accept(&mut self, valid: &str) -> bool {
        match self.peek() {
            Some(c) if valid.contains(c) => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn accept_run(&mut self, valid: &str) {
        while self.accept(valid) {}
    }

    fn emit(&mut self, kind: TokenKind) {
        let text = self.input.get(self.start..self.pos).unwrap_or_default();
        self.pending.push_back(Token {
            kind,
            pos: Pos(self.start),
            text: Cow::Borrowed(text),
            line: self.start_line,
            column: self.start_column,
        });
        self.ignore();
    }

    /// Drops the pending input before `pos`.
    fn ignore(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.pos - self.line_start + 1;
    }

    /// Emits an error token and stops the machine.
    fn errorf(&mut self, message: String) -> Option<StateFn> {
        log::trace!(
            "{}: lex error at {}:{}: {}",
            self.name,
            self.start_line,
            self.start_column,
            message
        );
        self.pending.push_back(Token {
            kind: TokenKind::Error,
            pos: Pos(self.start),
            text: Cow::Owned(message),
            line: self.start_line,
            column: self.start_column,
        });
        None
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            let StateFn(state) = self.state.take()?;
            self.state = state(self);
        }
        self.pending.pop_front()
    }
}

/// Scans plain text up to the next `{`.
fn lex_text(l: &mut Lexer<'_>) -> Option<StateFn> {
    let Some(offset) = l.rest().find('{') else {
        l.skip_to(l.input.len());
        if l.pos > l.start {
            l.emit(TokenKind::Text);
        }
        l.emit(TokenKind::EndOfInput);
        return None;
    };

    l.skip_to(l.pos + offset);
    if l.pos > l.start {
        l.emit(TokenKind::Text);
    }

    let rest = l.rest();
    if rest.starts_with(TAG_START) {
        Some(StateFn(lex_tag_start))
    } else if rest.starts_with(VAR_START) {
        Some(StateFn(lex_var_start))
    } else {
        let sequence: String = rest.chars().take(2).collect();
        l.errorf(format!(
            "unexpected sequence {sequence}, expected {TAG_START} or {VAR_START}"
        ))
    }
}

fn lex_tag_start(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.pos += TAG_START.len();
    l.emit(TokenKind::TagStart);
    Some(StateFn(lex_inside_tag))
}

fn lex_tag_end(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.pos += TAG_END.len();
    l.emit(TokenKind::TagEnd);
    Some(StateFn(lex_text))
}

fn lex_var_start(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.pos += VAR_START.len();
    l.emit(TokenKind::VarStart);
    Some(StateFn(lex_inside_tag))
}

fn lex_var_end(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.pos += VAR_END.len();
    l.emit(TokenKind::VarEnd);
    Some(StateFn(lex_text))
}

/// Scans the elements between tag or variable delimiters.
fn lex_inside_tag(l: &mut Lexer<'_>) -> Option<StateFn> {
    let rest = l.rest();
    if rest.starts_with(TAG_END) || rest.starts_with(VAR_END) {
        if l.paren_depth > 0 {
            return l.errorf("missing right paren".to_string());
        }
        return if rest.starts_with(TAG_END) {
            Some(StateFn(lex_tag_end))
        } else {
            Some(StateFn(lex_var_end))
        };
    }

    let Some(c) = l.peek() else {
        return l.errorf("unclosed action".to_string());
    };

    match c {
        '+' | '-' | '0'..='9' => return Some(StateFn(lex_number)),
        '.' if rest.chars().nth(1).is_some_and(is_alphanumeric) => {
            return Some(StateFn(lex_identifier));
        }
        c if is_alphanumeric(c) => return Some(StateFn(lex_identifier)),
        _ => {}
    }

    l.bump();
    match c {
        '\r' | '\n' => return l.errorf("unclosed action".to_string()),
        ' ' | '\t' => l.ignore(),
        '!' => {
            if !l.accept("=") {
                return l.errorf("expected = after !".to_string());
            }
            l.emit(TokenKind::Comparison);
        }
        '>' | '<' => {
            l.accept("=");
            l.emit(TokenKind::Comparison);
        }
        '=' => {
            if l.accept("=") {
                l.emit(TokenKind::Comparison);
            } else {
                l.emit(TokenKind::Assign);
            }
        }
        '|' => l.emit(TokenKind::Pipe),
        '"' => return Some(StateFn(lex_quote)),
        '\'' => return Some(StateFn(lex_single_quote)),
        '(' => {
            l.emit(TokenKind::LeftParen);
            l.paren_depth += 1;
        }
        ')' => {
            if l.paren_depth == 0 {
                return l.errorf(format!("unexpected right paren {}", describe(c)));
            }
            l.emit(TokenKind::RightParen);
            l.paren_depth -= 1;
        }
        c if c.is_ascii() && !c.is_ascii_control() => l.emit(TokenKind::Char),
        c => {
            return l.errorf(format!(
                "unrecognized character in action: {}",
                describe(c)
            ));
        }
    }
    Some(StateFn(lex_inside_tag))
}

/// Scans a number literal. Whether it is an integer or a float is decided by
/// the parser.
fn lex_number(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.accept("+-");
    let mut digits = DECIMAL_DIGITS;
    if l.accept("0") {
        // A leading 0 alone does not mean octal.
        if l.accept("xX") {
            digits = HEX_DIGITS;
        } else if l.accept("oO") {
            digits = OCTAL_DIGITS;
        } else if l.accept("bB") {
            digits = BINARY_DIGITS;
        }
    }
    l.accept_run(digits);
    if l.accept(".") {
        l.accept_run(digits);
    }
    if digits == DECIMAL_DIGITS && l.accept("eE") {
        l.accept("+-");
        l.accept_run(DECIMAL_DIGITS);
    }
    if digits == HEX_DIGITS && l.accept("pP") {
        l.accept("+-");
        l.accept_run(DECIMAL_DIGITS);
    }
    l.emit(TokenKind::Number);
    Some(StateFn(lex_inside_tag))
}

fn lex_quote(l: &mut Lexer<'_>) -> Option<StateFn> {
    scan_quoted(l, '"')
}

fn lex_single_quote(l: &mut Lexer<'_>) -> Option<StateFn> {
    scan_quoted(l, '\'')
}

/// Scans to the closing `quote`; the opening one is already consumed.
fn scan_quoted(l: &mut Lexer<'_>, quote: char) -> Option<StateFn> {
    loop {
        match l.bump() {
            Some('\\') => {
                if matches!(l.bump(), None | Some('\n')) {
                    return l.errorf("unterminated quoted string".to_string());
                }
            }
            None | Some('\n') => return l.errorf("unterminated quoted string".to_string()),
            Some(c) if c == quote => break,
            Some(_) => {}
        }
    }
    l.emit(TokenKind::String);
    Some(StateFn(lex_inside_tag))
}

/// Scans a word and classifies it as keyword, field, bool or identifier.
fn lex_identifier(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.bump();
    while l.peek().is_some_and(is_alphanumeric) {
        l.bump();
    }

    let word = l.input.get(l.start..l.pos).unwrap_or_default();
    let kind = match TokenKind::keyword(word) {
        Some(keyword) => keyword,
        _ if word.starts_with('.') => TokenKind::Field,
        _ if word == "true" || word == "false" => TokenKind::Bool,
        _ => TokenKind::Identifier,
    };
    l.emit(kind);
    Some(StateFn(lex_inside_tag))
}

fn is_alphanumeric(c: char) -> bool {
    c == '_' || c.is_alphabetic() || c.is_numeric()
}

fn describe(c: char) -> String {
    format!("U+{:04X} '{c}'", u32::from(c))
}

/// Tokens produced by a lexer running on its own thread.
///
/// The producer hands over one token at a time through a rendezvous channel,
/// so it never runs ahead of the consumer. Dropping the receiver disconnects
/// the channel and waits for the producer thread to finish.
pub struct TokenReceiver {
    tokens: Option<mpsc::IntoIter<Token<'static>>>,
    producer: Option<thread::JoinHandle<()>>,
}

impl Iterator for TokenReceiver {
    type Item = Token<'static>;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.as_mut()?.next()
    }
}

impl Drop for TokenReceiver {
    fn drop(&mut self) {
        // The producer is blocked in `send` until the channel disconnects.
        drop(self.tokens.take());
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                log::warn!("lexer thread panicked");
            }
        }
    }
}

/// Runs a lexer over `input` on a dedicated thread.
pub fn spawn(name: impl Into<String>, input: impl Into<String>) -> TokenReceiver {
    let name = name.into();
    let input = input.into();
    let (sender, receiver) = mpsc::sync_channel(0);

    let producer = thread::spawn(move || {
        for token in Lexer::new(&name, &input) {
            if sender.send(token.into_owned()).is_err() {
                log::trace!("{name}: token consumer went away, stopping lexer");
                break;
            }
        }
    });

    TokenReceiver {
        tokens: Some(receiver.into_iter()),
        producer: Some(producer),
    }
}
