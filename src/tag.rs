use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Node;
use crate::error::ParseResult;
use crate::stepper::Stepper;

/// A parser for a custom tag.
///
/// The plugin is invoked with the stream positioned right after the tag name
/// and must consume its own arguments, the closing `%}`, and any body and
/// closing tag it owns.
pub trait Tag: Send + Sync {
    fn parse(&self, stepper: &mut dyn Stepper<'_>) -> ParseResult<Node>;
}

impl<F> Tag for F
where
    F: Fn(&mut dyn Stepper<'_>) -> ParseResult<Node> + Send + Sync,
{
    fn parse(&self, stepper: &mut dyn Stepper<'_>) -> ParseResult<Node> {
        self(stepper)
    }
}

/// Maps tag names to their parsers.
#[derive(Clone, Default)]
pub struct TagRegistry {
    tags: HashMap<String, Arc<dyn Tag>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tag` under `name`, replacing any earlier registration.
    pub fn register<N: Into<String>, T: Tag + 'static>(&mut self, name: N, tag: T) -> &mut Self {
        let name = name.into();
        log::debug!("registering tag '{}'", name);
        if self.tags.insert(name.clone(), Arc::new(tag)).is_some() {
            log::warn!("tag '{}' was already registered and has been replaced", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tag>> {
        self.tags.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.tags.keys().collect();
        names.sort();
        f.debug_struct("TagRegistry").field("tags", &names).finish()
    }
}
