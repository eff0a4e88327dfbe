//! A small template front end.
//!
//! Source text with `{% ... %}` tags is lexed into positioned tokens, parsed
//! into a tree by recursive descent, and then either walked or executed to a
//! string. The built-in tags are `if`/`elif`/`else` and `block`; other tag
//! names can be handled by registering a [`Tag`].
//!
//! ```
//! use tagtree::{Context, Tree};
//!
//! let mut tree = Tree::new("page");
//! tree.parse("<p>{% if 2 == 3 %}equal{% elif 1 %}first{% endif %}</p>").unwrap();
//! assert_eq!(tree.execute(&Context::new()).unwrap(), "<p>first</p>");
//! ```

mod ast;
mod error;
mod expression;
mod interface;
pub mod lexer;
mod parser;
mod stepper;
mod tag;
mod template;
mod token;
mod walk;

// Public exports.
pub use ast::{
    BlockStmt, Comparison, Identifier, IfStmt, IntValue, Node, Operator, StringValue, TextValue,
};
pub use error::{EvalError, ParseError, ParseErrorKind, ParseResult, TagtreeError, TagtreeResult};
pub use expression::evaluate;
pub use interface::Context;
pub use lexer::{Lexer, lex};
pub use parser::Tree;
pub use stepper::{Stepper, TokenStream};
pub use tag::{Tag, TagRegistry};
pub use template::{Template, execute_nodes};
pub use token::{Pos, Token, TokenKind};
pub use walk::{Walker, walk};
