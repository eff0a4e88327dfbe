use crate::ast::Node;
use crate::error::EvalError;
use crate::expression::evaluate;
use crate::interface::Context;
use crate::parser::Tree;
use crate::tag::TagRegistry;
use crate::TagtreeResult;

/// A template source together with its parsed tree.
///
/// # Example
///
/// ```rust
/// use tagtree::{Context, TagRegistry, Template};
///
/// let template = Template::new(
///     "answer",
///     "{% if 42 == \"42\" %}right{% else %}wrong{% endif %}",
///     &TagRegistry::new(),
/// )
/// .unwrap();
///
/// assert_eq!(template.render(&Context::new()).unwrap(), "right");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    tree: Tree,
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Template {
    /// Rebuilds the tree from the source. Custom tags are not serialized, so
    /// only templates using the built-in tags can be restored.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct TemplateHelper {
            name: String,
            source: String,
        }

        let helper = TemplateHelper::deserialize(deserializer)?;
        Self::new(helper.name, helper.source, &TagRegistry::new())
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse template: {}", e)))
    }
}

impl Template {
    /// Parses `source` with the given custom tags.
    ///
    /// # Errors
    ///
    /// Returns a `TagtreeError::Parse` error if the template syntax is invalid.
    pub fn new<N: Into<String>, S: Into<String>>(
        name: N,
        source: S,
        tags: &TagRegistry,
    ) -> TagtreeResult<Self> {
        let name = name.into();
        let source = source.into();

        let mut tree = Tree::with_tags(name.clone(), tags.clone());
        tree.parse(&source)?;

        Ok(Self { name, source, tree })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Renders the template.
    ///
    /// # Errors
    ///
    /// * `TagtreeError::Eval` - If an if-statement's expression cannot be evaluated
    /// * `TagtreeError::Cancelled` - If `context` is cancelled or past its deadline
    pub fn render(&self, context: &Context) -> TagtreeResult<String> {
        self.tree.execute(context)
    }
}

/// Executes `nodes` in order and concatenates their output, stopping at the
/// first error.
///
/// # Errors
/// The first error raised by any node.
pub fn execute_nodes(context: &Context, nodes: &[Node]) -> TagtreeResult<String> {
    let mut output = String::new();
    for node in nodes {
        render_node(node, context, &mut output)?;
    }
    Ok(output)
}

pub(crate) fn execute_node(node: &Node, context: &Context) -> TagtreeResult<String> {
    let mut output = String::new();
    render_node(node, context, &mut output)?;
    Ok(output)
}

/// Appends the output of `node` to `output`.
///
/// - Text and literals render as themselves
/// - Blocks render their body
/// - If-statements evaluate their expression and render the matching branch
/// - Identifiers cannot be resolved and fail
fn render_node(node: &Node, context: &Context, output: &mut String) -> TagtreeResult<()> {
    context.check()?;

    match node {
        Node::Text(text) => output.push_str(&text.text),
        Node::String(string) => output.push_str(&string.value),
        Node::Int(int) => output.push_str(&int.value.to_string()),
        Node::Comparison(comparison) => output.push_str(comparison.operator.symbol()),
        Node::Identifier(identifier) => {
            return Err(EvalError::NotSupported {
                what: format!("resolving identifier '{}'", identifier.name),
            }
            .into());
        }
        Node::Block(block) => {
            for child in &block.body {
                render_node(child, context, output)?;
            }
        }
        Node::If(stmt) => {
            if evaluate(&stmt.expression)? {
                for child in &stmt.body {
                    render_node(child, context, output)?;
                }
            } else if let Some(else_node) = &stmt.else_branch {
                render_node(else_node, context, output)?;
            }
        }
    }

    Ok(())
}
