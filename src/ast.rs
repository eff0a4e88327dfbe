use crate::interface::Context;
use crate::token::Pos;
use crate::TagtreeResult;

/// An element of the parse tree.
///
/// Every variant records the byte offset where it starts in the source and can
/// be executed to produce output, see [`Node::execute`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Literal text copied to the output as-is.
    Text(TextValue),
    String(StringValue),
    Int(IntValue),
    Identifier(Identifier),
    Comparison(Comparison),
    Block(BlockStmt),
    If(IfStmt),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextValue {
    pub start: Pos,
    pub text: String,
}

/// A string literal, with quotes removed and escapes processed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringValue {
    pub start: Pos,
    pub value: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntValue {
    pub start: Pos,
    pub value: i64,
}

/// A name that would be resolved at runtime.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub start: Pos,
    pub name: String,
}

/// A comparison operator. Its operands are its neighbours in an expression.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparison {
    pub start: Pos,
    pub operator: Operator,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Operator {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterOrEqual),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessOrEqual),
            _ => None,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A named group of nodes.
///
/// Blocks with an empty name are anonymous wrappers, used for the bodies of
/// `else` branches and for desugared `elif` chains.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockStmt {
    pub start: Pos,
    pub name: String,
    pub arguments: Vec<Node>,
    pub body: Vec<Node>,
}

impl BlockStmt {
    pub(crate) const fn anonymous(start: Pos, body: Vec<Node>) -> Self {
        Self {
            start,
            name: String::new(),
            arguments: Vec::new(),
            body,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

/// A conditional. `body` runs when `expression` holds, `else_branch`
/// otherwise.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfStmt {
    pub start: Pos,
    pub expression: Vec<Node>,
    pub body: Vec<Node>,
    pub else_branch: Option<Box<Node>>,
}

impl Node {
    /// Byte offset of the start of this node in the source.
    pub const fn position(&self) -> Pos {
        match self {
            Self::Text(n) => n.start,
            Self::String(n) => n.start,
            Self::Int(n) => n.start,
            Self::Identifier(n) => n.start,
            Self::Comparison(n) => n.start,
            Self::Block(n) => n.start,
            Self::If(n) => n.start,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Identifier(_) => "identifier",
            Self::Comparison(_) => "comparison",
            Self::Block(_) => "block",
            Self::If(_) => "if",
        }
    }

    /// Direct children in traversal order: an if-statement yields its
    /// expression, then its body, then its else branch.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Block(block) => block.body.iter().collect(),
            Self::If(stmt) => stmt
                .expression
                .iter()
                .chain(stmt.body.iter())
                .chain(stmt.else_branch.as_deref())
                .collect(),
            Self::Text(_)
            | Self::String(_)
            | Self::Int(_)
            | Self::Identifier(_)
            | Self::Comparison(_) => Vec::new(),
        }
    }

    /// Renders this node.
    ///
    /// # Errors
    /// Fails if an expression cannot be evaluated, if an identifier has to be
    /// resolved, or if `context` has been cancelled.
    pub fn execute(&self, context: &Context) -> TagtreeResult<String> {
        crate::template::execute_node(self, context)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(n) => write!(f, "text {:?}", n.text),
            Self::String(n) => write!(f, "string {:?}", n.value),
            Self::Int(n) => write!(f, "int {}", n.value),
            Self::Identifier(n) => write!(f, "identifier {}", n.name),
            Self::Comparison(n) => write!(f, "comparison {}", n.operator),
            Self::Block(n) if n.is_anonymous() => write!(f, "anonymous block"),
            Self::Block(n) => write!(f, "block {}", n.name),
            Self::If(n) => write!(f, "if ({} expression nodes)", n.expression.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(start: usize, text: &str) -> Node {
        Node::Text(TextValue {
            start: Pos(start),
            text: text.to_string(),
        })
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_operator_symbols() {
        for symbol in ["==", "!=", ">", ">=", "<", "<="] {
            assert_eq!(Operator::parse(symbol).unwrap().symbol(), symbol);
        }
        assert_eq!(Operator::parse("=<"), None);
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_if_children_order() {
        let stmt = Node::If(IfStmt {
            start: Pos(0),
            expression: vec![Node::Int(IntValue {
                start: Pos(6),
                value: 1,
            })],
            body: vec![text(10, "a")],
            else_branch: Some(Box::new(Node::Block(BlockStmt::anonymous(
                Pos(20),
                vec![text(23, "b")],
            )))),
        });

        let kinds: Vec<_> = stmt.children().iter().map(|n| n.kind_name()).collect();
        assert_eq!(kinds, vec!["int", "text", "block"]);
        assert_eq!(stmt.position(), Pos(0));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_leaves_have_no_children() {
        assert!(text(0, "x").children().is_empty());
    }
}
