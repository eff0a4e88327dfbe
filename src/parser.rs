use crate::ast::{BlockStmt, Comparison, Identifier, IfStmt, IntValue, Node, Operator, StringValue, TextValue};
use crate::error::{ParseError, ParseErrorKind, ParseResult, TagtreeError};
use crate::interface::Context;
use crate::lexer::lex;
use crate::stepper::{Stepper, TokenStream};
use crate::tag::{Tag, TagRegistry};
use crate::token::{Token, TokenKind};
use crate::walk::Walker;
use crate::TagtreeResult;

/// A parsed template: the root node sequence plus the tag registry used to
/// build it.
///
/// # Example
///
/// ```
/// use tagtree::{Context, Tree};
///
/// let mut tree = Tree::new("greeting");
/// tree.parse("{% if 1 == \"1\" %}yes{% else %}no{% endif %}").unwrap();
/// assert_eq!(tree.execute(&Context::new()).unwrap(), "yes");
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    name: String,
    tags: TagRegistry,
    root: Vec<Node>,
    parsed: bool,
}

impl Tree {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self::with_tags(name, TagRegistry::new())
    }

    pub fn with_tags<N: Into<String>>(name: N, tags: TagRegistry) -> Self {
        Self {
            name: name.into(),
            tags,
            root: Vec::new(),
            parsed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Makes `{% <name> ... %}` parse through `tag`.
    pub fn register_tag<N: Into<String>, T: Tag + 'static>(&mut self, name: N, tag: T) -> &mut Self {
        self.tags.register(name, tag);
        self
    }

    pub const fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// The root node sequence. Empty, or partially built, unless the last
    /// [`Tree::parse`] succeeded.
    pub fn root(&self) -> &[Node] {
        &self.root
    }

    pub const fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Builds the tree for `input`, replacing any earlier one.
    ///
    /// # Errors
    /// Returns the first lexical or structural problem found; the tree must
    /// not be executed afterwards.
    pub fn parse(&mut self, input: &str) -> TagtreeResult<()> {
        let name = self.name.clone();
        self.parse_tokens(lex(&name, input))
    }

    /// Builds the tree from an already running token source, such as
    /// [`crate::lexer::spawn`].
    ///
    /// # Errors
    /// As [`Tree::parse`]. A source that stops before its end-of-input token
    /// is a failure too.
    pub fn parse_tokens<'src, I>(&mut self, tokens: I) -> TagtreeResult<()>
    where
        I: Iterator<Item = Token<'src>>,
    {
        log::debug!("{}: parsing", self.name);
        self.parsed = false;
        self.root.clear();

        let mut parser = Parser {
            tags: &self.tags,
            stream: TokenStream::new(tokens),
        };
        let mut root = Vec::new();
        let result = parser.parse_into(&mut root);
        self.root = root;
        result?;

        self.parsed = true;
        log::debug!("{}: parsed {} root nodes", self.name, self.root.len());
        Ok(())
    }

    fn parsed_root(&self) -> TagtreeResult<&[Node]> {
        if !self.parsed {
            return Err(TagtreeError::NotParsed {
                template_name: self.name.clone(),
            });
        }
        Ok(&self.root)
    }

    /// Visits every node depth-first, see [`Walker`].
    ///
    /// # Errors
    /// Fails if the tree has not been parsed successfully.
    pub fn walk(&self, walker: Walker<'_>) -> TagtreeResult<()> {
        crate::walk::walk(walker, self.parsed_root()?);
        Ok(())
    }

    /// Renders the whole tree.
    ///
    /// # Errors
    /// Fails if the tree has not been parsed successfully, or with the first
    /// error raised by a node.
    pub fn execute(&self, context: &Context) -> TagtreeResult<String> {
        crate::template::execute_nodes(context, self.parsed_root()?)
    }
}

struct Parser<'t, 'src, I> {
    tags: &'t TagRegistry,
    stream: TokenStream<'src, I>,
}

impl<'src, I> Parser<'_, 'src, I>
where
    I: Iterator<Item = Token<'src>>,
{
    /// Parses the top level, appending to `root` as it goes so a failed parse
    /// still leaves what was built.
    fn parse_into(&mut self, root: &mut Vec<Node>) -> ParseResult<()> {
        loop {
            let token = self.stream.next()?;
            match token.kind {
                TokenKind::EndOfInput => return Ok(()),
                TokenKind::Text => root.push(text_node(token)),
                TokenKind::TagStart => root.push(self.tag()?),
                _ => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_token("text or tag", &token),
                    ));
                }
            }
        }
    }

    /// Parses a tag whose `{%` has been consumed.
    fn tag(&mut self) -> ParseResult<Node> {
        let name = self.stream.next()?;
        match name.kind {
            TokenKind::Block => self.block_stmt(name),
            TokenKind::If => self.if_stmt(name),
            TokenKind::Identifier => self.new_tag(&name),
            TokenKind::EndOfInput => Err(ParseError::at(
                &name,
                ParseErrorKind::unexpected_eof(Some("tag name")),
            )),
            _ => Err(ParseError::at(
                &name,
                ParseErrorKind::UnknownTag {
                    name: name.text.to_string(),
                },
            )),
        }
    }

    /// Hands a tag the core does not know to its registered plugin.
    fn new_tag(&mut self, name: &Token<'src>) -> ParseResult<Node> {
        let Some(tag) = self.tags.get(&name.text) else {
            return Err(ParseError::at(
                name,
                ParseErrorKind::UnknownTag {
                    name: name.text.to_string(),
                },
            ));
        };
        log::trace!("dispatching tag '{}' to its plugin", name.text);
        tag.parse(self)
    }

    // {% block <name> %} ... {% endblock %}
    fn block_stmt(&mut self, keyword: Token<'src>) -> ParseResult<Node> {
        let name = self.stream.next()?;
        if name.kind != TokenKind::Identifier {
            return Err(ParseError::at(
                &name,
                ParseErrorKind::unexpected_token("block name", &name),
            ));
        }
        self.expect_tag_end("block name")?;

        let body = self.body_until("endblock")?;
        Ok(Node::Block(BlockStmt {
            start: keyword.pos,
            name: name.text.into_owned(),
            arguments: Vec::new(),
            body,
        }))
    }

    // {% if expression %} ... [{% elif expression %} ...]* [{% else %} ...] {% endif %}
    fn if_stmt(&mut self, keyword: Token<'src>) -> ParseResult<Node> {
        let expression = self.expression()?;

        let mut body = Vec::new();
        let else_branch = loop {
            let token = self.stream.next()?;
            match token.kind {
                TokenKind::Text => body.push(text_node(token)),
                TokenKind::TagStart => {
                    let tag_name = self.stream.peek()?;
                    match tag_name.kind {
                        TokenKind::ElseIf => {
                            // `elif C` reads as `else` + a nested `if C`, which
                            // owns the rest of the chain and the `endif`.
                            let elif = self.stream.next()?;
                            log::trace!("desugaring elif at {} into a nested if", elif.pos);
                            let nested = self.if_stmt(elif)?;
                            let wrapper = BlockStmt::anonymous(nested.position(), vec![nested]);
                            break Some(Box::new(Node::Block(wrapper)));
                        }
                        TokenKind::Else => {
                            let else_keyword = self.stream.next()?;
                            break Some(Box::new(self.else_stmt(else_keyword)?));
                        }
                        _ if tag_name.is_word("endif") => {
                            self.stream.consume_until(TokenKind::TagEnd)?;
                            break None;
                        }
                        _ => body.push(self.tag()?),
                    }
                }
                TokenKind::EndOfInput => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_eof(Some("'endif'-tag")),
                    ));
                }
                _ => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_token("text or tag", &token),
                    ));
                }
            }
        };

        Ok(Node::If(IfStmt {
            start: keyword.pos,
            expression,
            body,
            else_branch,
        }))
    }

    // {% else %} ... {% endif %}
    fn else_stmt(&mut self, keyword: Token<'src>) -> ParseResult<Node> {
        let token = self.stream.next()?;
        if token.kind != TokenKind::TagEnd {
            return Err(ParseError::at(
                &token,
                ParseErrorKind::unexpected_token("'%}' with no arguments to 'else'", &token),
            ));
        }
        let body = self.body_until("endif")?;
        Ok(Node::Block(BlockStmt::anonymous(keyword.pos, body)))
    }

    /// Collects the expression of an if-statement up to its `%}`.
    fn expression(&mut self) -> ParseResult<Vec<Node>> {
        let mut expression = Vec::new();
        loop {
            let token = self.stream.next()?;
            let node = match token.kind {
                TokenKind::TagEnd => return Ok(expression),
                TokenKind::EndOfInput => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_eof(Some("'%}'")),
                    ));
                }
                TokenKind::String => Node::String(StringValue {
                    start: token.pos,
                    value: unquote(&token.text),
                }),
                TokenKind::Number => Node::Int(IntValue {
                    start: token.pos,
                    value: parse_int(&token)?,
                }),
                TokenKind::Comparison => {
                    let Some(operator) = Operator::parse(&token.text) else {
                        return Err(ParseError::at(
                            &token,
                            ParseErrorKind::unexpected_token("comparison operator", &token),
                        ));
                    };
                    Node::Comparison(Comparison {
                        start: token.pos,
                        operator,
                    })
                }
                TokenKind::Identifier => Node::Identifier(Identifier {
                    start: token.pos,
                    name: token.text.into_owned(),
                }),
                _ => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_token(
                            "string, number, comparison or identifier in expression",
                            &token,
                        ),
                    ));
                }
            };
            expression.push(node);
        }
    }

    /// Parses text and nested tags until `{% <end> %}`, consuming it.
    fn body_until(&mut self, end: &str) -> ParseResult<Vec<Node>> {
        let mut body = Vec::new();
        loop {
            let token = self.stream.next()?;
            match token.kind {
                TokenKind::Text => body.push(text_node(token)),
                TokenKind::TagStart => {
                    if self.stream.peek()?.is_word(end) {
                        self.stream.consume_until(TokenKind::TagEnd)?;
                        return Ok(body);
                    }
                    body.push(self.tag()?);
                }
                TokenKind::EndOfInput => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_eof(Some(format!("'{end}'-tag").as_str())),
                    ));
                }
                _ => {
                    return Err(ParseError::at(
                        &token,
                        ParseErrorKind::unexpected_token("text or tag", &token),
                    ));
                }
            }
        }
    }

    fn expect_tag_end(&mut self, after: &str) -> ParseResult<()> {
        let token = self.stream.next()?;
        if token.kind != TokenKind::TagEnd {
            return Err(ParseError::at(
                &token,
                ParseErrorKind::unexpected_token(format!("'%}}' after {after}"), &token),
            ));
        }
        Ok(())
    }
}

impl<'src, I> Stepper<'src> for Parser<'_, 'src, I>
where
    I: Iterator<Item = Token<'src>>,
{
    fn next(&mut self) -> ParseResult<Token<'src>> {
        self.stream.next()
    }

    fn peek(&mut self) -> ParseResult<Token<'src>> {
        self.stream.peek()
    }

    fn backup(&mut self, token: Token<'src>) {
        self.stream.backup(token);
    }

    fn consume_until(&mut self, kind: TokenKind) -> ParseResult<()> {
        self.stream.consume_until(kind)
    }

    fn errorf(&self, kind: ParseErrorKind) -> ParseError {
        self.stream.errorf(kind)
    }

    fn parse_tag(&mut self) -> ParseResult<Node> {
        self.tag()
    }

    fn parse_body_until(&mut self, end: &str) -> ParseResult<Vec<Node>> {
        self.body_until(end)
    }
}

fn text_node(token: Token<'_>) -> Node {
    Node::Text(TextValue {
        start: token.pos,
        text: token.text.into_owned(),
    })
}

/// Converts a number token to an integer. Only base-10 integers are
/// supported.
fn parse_int(token: &Token<'_>) -> ParseResult<i64> {
    token.text.parse().map_err(|_| {
        ParseError::at(
            token,
            ParseErrorKind::InvalidNumber {
                literal: token.text.to_string(),
            },
        )
    })
}

/// Strips the quotes off a string literal and resolves its escapes.
fn unquote(literal: &str) -> String {
    let mut chars = literal.chars();
    chars.next();
    chars.next_back();

    let mut value = String::with_capacity(literal.len());
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(escaped) => value.push(escaped),
            None => break,
        }
    }
    value
}
