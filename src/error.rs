use crate::token::{Pos, Token};

pub type TagtreeResult<T> = std::result::Result<T, TagtreeError>;
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The lexer gave up on the input.
    Lex {
        message: String,
    },
    UnexpectedToken {
        expected: String,
        found: String,
    },
    UnexpectedEOF {
        /// Describes what was expected, e.g., " (expected 'endif'-tag)"
        expected_what: String,
    },
    UnknownTag {
        name: String,
    },
    InvalidNumber {
        literal: String,
    },
    Message(String),
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex { message } => write!(f, "Lex error: {}", message),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "Expected {}, found {}", expected, found)
            }
            Self::UnexpectedEOF { expected_what } => {
                write!(f, "Unexpected end-of-file{}", expected_what)
            }
            Self::UnknownTag { name } => write!(f, "Unknown tag '{}'", name),
            Self::InvalidNumber { literal } => {
                write!(f, "Invalid integer literal '{}'", literal)
            }
            Self::Message(msg) => write!(f, "Parser error: {}", msg),
        }
    }
}

impl std::error::Error for ParseErrorKind {}

impl ParseErrorKind {
    pub fn unexpected_eof(expected: Option<&str>) -> Self {
        Self::UnexpectedEOF {
            expected_what: expected.map_or_else(String::new, |e| format!(" (expected {})", e)),
        }
    }

    pub fn unexpected_token<E: Into<String>>(expected: E, found: &Token<'_>) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: format!("{} '{}'", found.kind, found.text),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub position: Pos,
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Builds an error located at `token`.
    pub fn at(token: &Token<'_>, kind: ParseErrorKind) -> Self {
        Self {
            line: token.line,
            column: token.column,
            position: token.pos,
            kind,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.kind
        )
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Failures while reducing an expression to a boolean.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EvalError {
    EmptyExpression,
    NotSupported {
        what: String,
    },
    UnexpectedNode {
        found: String,
    },
    ExpectedComparison {
        found: String,
    },
    InvalidBool {
        literal: String,
    },
    InvalidInt {
        literal: String,
    },
    UnsupportedComparison {
        operator: String,
        lhs: String,
        rhs: String,
    },
    TooManyParts {
        count: usize,
    },
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyExpression => write!(f, "Empty expression"),
            Self::NotSupported { what } => {
                write!(f, "Support for {} is not implemented in expressions", what)
            }
            Self::UnexpectedNode { found } => write!(f, "Unexpected node {} in expression", found),
            Self::ExpectedComparison { found } => {
                write!(f, "Expected comparison, found {}", found)
            }
            Self::InvalidBool { literal } => {
                write!(f, "'{}' is not a boolean, expected 'true' or 'false'", literal)
            }
            Self::InvalidInt { literal } => write!(f, "'{}' is not an integer", literal),
            Self::UnsupportedComparison { operator, lhs, rhs } => write!(
                f,
                "Comparison {} {} {} is not supported",
                lhs, operator, rhs
            ),
            Self::TooManyParts { count } => {
                write!(f, "Expressions with {} parts are not supported", count)
            }
        }
    }
}

impl std::error::Error for EvalError {}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagtreeError {
    Parse(ParseError),
    Eval(EvalError),
    /// Execution stopped because its context was cancelled or timed out.
    Cancelled,
    /// The tree has no successfully parsed root to walk or execute.
    NotParsed {
        template_name: String,
    },
}

impl std::fmt::Display for TagtreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(parse_error) => write!(f, "{}", parse_error),
            Self::Eval(eval_error) => write!(f, "Evaluation error: {}", eval_error),
            Self::Cancelled => write!(f, "Execution cancelled"),
            Self::NotParsed { template_name } => {
                write!(f, "Template '{}' has not been parsed", template_name)
            }
        }
    }
}

impl std::error::Error for TagtreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(parse_error) => Some(parse_error),
            Self::Eval(eval_error) => Some(eval_error),
            Self::Cancelled | Self::NotParsed { .. } => None,
        }
    }
}

impl From<ParseError> for TagtreeError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<EvalError> for TagtreeError {
    fn from(error: EvalError) -> Self {
        Self::Eval(error)
    }
}
