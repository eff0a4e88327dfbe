use std::borrow::Cow;

/// Byte offset into the template source.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(pub usize);

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// The kind of a lexed token.
///
/// Keyword kinds are declared after [`TokenKind::Keyword`], so checking whether
/// a kind is a keyword is a single comparison of discriminants.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TokenKind {
    /// Lexical error; the token text is the message.
    Error,
    /// `true` or `false`.
    Bool,
    /// Printable ASCII character with no other meaning, e.g. a comma.
    Char,
    /// `=`
    Assign,
    /// `==`, `!=`, `>`, `>=`, `<`, `<=`
    Comparison,
    EndOfInput,
    /// Identifier starting with `.`
    Field,
    Identifier,
    /// `{%`
    TagStart,
    LeftParen,
    Number,
    Pipe,
    /// `%}`
    TagEnd,
    RightParen,
    Space,
    /// Quoted string, quotes included.
    String,
    Text,
    Variable,
    /// `{{`
    VarStart,
    /// `}}`
    VarEnd,
    /// Delimits the keyword kinds; never emitted.
    Keyword,
    Block,
    Else,
    ElseIf,
    End,
    If,
}

impl TokenKind {
    pub const fn is_keyword(self) -> bool {
        self as u8 > Self::Keyword as u8
    }

    /// Looks up a word in the keyword table.
    pub fn keyword(word: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(_, kind)| *kind)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Assign => "assign",
            Self::Comparison => "comparison",
            Self::EndOfInput => "EOF",
            Self::Field => "field",
            Self::Identifier => "identifier",
            Self::TagStart => "left-delim",
            Self::LeftParen => "left-paren",
            Self::Number => "number",
            Self::Pipe => "pipe",
            Self::TagEnd => "right-delim",
            Self::RightParen => "right-paren",
            Self::Space => "space",
            Self::String => "string",
            Self::Text => "text",
            Self::Variable => "variable",
            Self::VarStart => "left-var",
            Self::VarEnd => "right-var",
            Self::Keyword => "keyword",
            Self::Block => "block",
            Self::Else => "else",
            Self::ElseIf => "elif",
            Self::End => "end",
            Self::If => "if",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

static KEYWORDS: [(&str, TokenKind); 4] = [
    ("block", TokenKind::Block),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("elif", TokenKind::ElseIf),
];

/// A single lexed entity of a template.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Byte offset where the token starts.
    pub pos: Pos,
    /// Source text of the token, or the message for [`TokenKind::Error`].
    pub text: Cow<'a, str>,
    /// Line (1-indexed) the token starts on.
    pub line: usize,
    /// Column (1-indexed, in bytes) the token starts at.
    pub column: usize,
}

impl Token<'_> {
    pub fn into_owned(self) -> Token<'static> {
        Token {
            kind: self.kind,
            pos: self.pos,
            text: Cow::Owned(self.text.into_owned()),
            line: self.line,
            column: self.column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Whether this is an identifier spelled `word`, e.g. `endif`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{} {} - {}",
            self.line, self.pos, self.kind, self.text
        )
    }
}
