use crate::ast::Node;

/// A visit function for [`walk`].
///
/// It is called once per node. Returning `None` skips the node's children;
/// returning another walker visits the children with it.
pub struct Walker<'w>(Box<dyn FnMut(&Node) -> Option<Walker<'w>> + 'w>);

impl<'w> Walker<'w> {
    pub fn new<F>(visit: F) -> Self
    where
        F: FnMut(&Node) -> Option<Walker<'w>> + 'w,
    {
        Self(Box::new(visit))
    }

    fn visit(&mut self, node: &Node) -> Option<Walker<'w>> {
        (self.0)(node)
    }
}

/// Visits `nodes` depth-first and in order. An if-statement's children are
/// its expression, then its body, then its else branch.
pub fn walk(mut walker: Walker<'_>, nodes: &[Node]) {
    for node in nodes {
        walk_node(&mut walker, node);
    }
}

fn walk_node(walker: &mut Walker<'_>, node: &Node) {
    let Some(mut sub) = walker.visit(node) else {
        return;
    };
    for child in node.children() {
        walk_node(&mut sub, child);
    }
}
