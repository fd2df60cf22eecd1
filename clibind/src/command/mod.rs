//! Command definitions and the arena-backed command tree.
//!
//! Commands are declared with the [`Command`] builder and registered into a
//! [`CommandTree`], which owns every node in an arena and addresses them by
//! [`NodeId`]. Parent links are stored as ids, never as owning pointers,
//! and the topology is immutable once wired: `register` consumes the
//! command, so a node can never acquire a second parent.

mod context;
mod dispatch;
mod suggest;

pub use context::Context;

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::binding::FlagRecord;
use crate::error::CliError;
use crate::registry::ParserRegistry;
use crate::usage::UsageStyle;

/// Handle of one node in a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A command handler or hook.
pub type Handler = Box<dyn Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync>;

/// Factory producing a fresh record instance per invocation.
pub type RecordFactory = Box<dyn Fn() -> Box<dyn FlagRecord> + Send + Sync>;

/// Filter applied to routing and binding errors before they surface.
pub type PrepareFilter = Box<dyn Fn(CliError) -> Result<(), CliError> + Send + Sync>;

/// Declaration of one command, consumed by [`CommandTree::register`].
pub struct Command {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) desc: String,
    pub(crate) text: String,
    pub(crate) handler: Option<Handler>,
    pub(crate) factory: Option<RecordFactory>,
    pub(crate) can_sub_route: bool,
    pub(crate) no_hook: bool,
    pub(crate) http_methods: Vec<String>,
    pub(crate) http_routes: Vec<String>,
    pub(crate) on_before: Option<Handler>,
    pub(crate) on_after: Option<Handler>,
}

impl Command {
    /// Starts a command declaration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            desc: String::new(),
            text: String::new(),
            handler: None,
            factory: None,
            can_sub_route: false,
            no_hook: false,
            http_methods: Vec::new(),
            http_routes: Vec::new(),
            on_before: None,
            on_after: None,
        }
    }

    /// Adds an alias the command also routes under.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the one-line description shown in command listings.
    #[must_use]
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Sets the long-form text shown in the command's own usage.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the handler invoked when the command is dispatched.
    #[must_use]
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Sets the record factory producing the command's argument record.
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FlagRecord> + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Allows the command to accept a partial route, keeping the trailing
    /// segments as free arguments.
    #[must_use]
    pub const fn can_sub_route(mut self, yes: bool) -> Self {
        self.can_sub_route = yes;
        self
    }

    /// Bypasses every hook for this command.
    #[must_use]
    pub const fn no_hook(mut self, yes: bool) -> Self {
        self.no_hook = yes;
        self
    }

    /// Restricts the HTTP methods the bridge may dispatch with.
    #[must_use]
    pub fn http_method(mut self, method: impl Into<String>) -> Self {
        self.http_methods.push(method.into());
        self
    }

    /// Declares an HTTP route alias resolving to this command.
    #[must_use]
    pub fn http_route(mut self, route: impl Into<String>) -> Self {
        self.http_routes.push(route.into());
        self
    }

    /// Sets a hook run before the handler.
    #[must_use]
    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.on_before = Some(Box::new(hook));
        self
    }

    /// Sets a hook run after the handler.
    #[must_use]
    pub fn on_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.on_after = Some(Box::new(hook));
        self
    }
}

pub(crate) struct Node {
    pub(crate) cmd: Command,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) usage_cache: Mutex<Option<CachedUsage>>,
}

pub(crate) struct CachedUsage {
    pub(crate) style: UsageStyle,
    pub(crate) text: String,
}

/// The command tree: an arena of nodes plus the parser registry and the
/// root-level hooks.
pub struct CommandTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) registry: ParserRegistry,
    pub(crate) routes: BTreeMap<String, String>,
    pub(crate) on_root_before: Option<Handler>,
    pub(crate) on_root_after: Option<Handler>,
    pub(crate) on_prepare_error: Option<PrepareFilter>,
}

impl CommandTree {
    /// Creates a tree with `root` at its top and the builtin parser
    /// registry.
    #[must_use]
    pub fn new(root: Command) -> Self {
        Self::with_registry(root, ParserRegistry::new())
    }

    /// Creates a tree with an explicit parser registry.
    #[must_use]
    pub fn with_registry(root: Command, registry: ParserRegistry) -> Self {
        Self {
            nodes: vec![Node {
                cmd: root,
                parent: None,
                children: Vec::new(),
                usage_cache: Mutex::new(None),
            }],
            registry,
            routes: BTreeMap::new(),
            on_root_before: None,
            on_root_after: None,
            on_prepare_error: None,
        }
    }

    /// The root node's handle.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The parser registry attached to this tree.
    #[must_use]
    pub const fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Sets a hook run before every dispatched handler.
    pub fn root_before<F>(&mut self, hook: F)
    where
        F: Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.on_root_before = Some(Box::new(hook));
    }

    /// Sets a hook run after every dispatched handler.
    pub fn root_after<F>(&mut self, hook: F)
    where
        F: Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.on_root_after = Some(Box::new(hook));
    }

    /// Sets a filter applied to routing and binding errors; returning
    /// `Ok(())` swallows the error.
    pub fn prepare_error_filter<F>(&mut self, filter: F)
    where
        F: Fn(CliError) -> Result<(), CliError> + Send + Sync + 'static,
    {
        self.on_prepare_error = Some(Box::new(filter));
    }

    /// Registers `command` as a child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::EmptyCommandName`] for a nameless command and
    /// [`CliError::DuplicateChild`] when the name or an alias collides with
    /// an existing sibling.
    pub fn register(&mut self, parent: NodeId, command: Command) -> Result<NodeId, CliError> {
        let parent_name = self.nodes[parent.0].cmd.name.clone();
        if command.name.is_empty() {
            return Err(CliError::EmptyCommandName {
                parent: parent_name,
            });
        }
        for candidate in std::iter::once(&command.name).chain(command.aliases.iter()) {
            if self.find_child(parent, candidate).is_some() {
                return Err(CliError::DuplicateChild {
                    parent: parent_name,
                    name: candidate.clone(),
                });
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            cmd: command,
            parent: Some(parent),
            children: Vec::new(),
            usage_cache: Mutex::new(None),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// The node's name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].cmd.name
    }

    /// The node's one-line description.
    #[must_use]
    pub fn desc(&self, id: NodeId) -> &str {
        &self.nodes[id.0].cmd.desc
    }

    /// The node's parent, or `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The node's children, in registration order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The node's space-separated full path, excluding the root's name.
    #[must_use]
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.nodes[cursor.0].parent {
            let name = &self.nodes[cursor.0].cmd.name;
            if !name.is_empty() {
                segments.push(name.clone());
            }
            cursor = parent;
        }
        segments.reverse();
        segments.join(" ")
    }

    /// Finds an immediate child by name or alias.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| {
                let cmd = &self.nodes[child.0].cmd;
                cmd.name == name || cmd.aliases.iter().any(|alias| alias == name)
            })
    }

    /// Walks from `from`, consuming one segment per matching child.
    ///
    /// Returns the deepest node reached and the number of segments
    /// consumed; a full match consumed every segment.
    #[must_use]
    pub fn sub_route<S: AsRef<str>>(&self, from: NodeId, segments: &[S]) -> (NodeId, usize) {
        let mut cursor = from;
        for (i, segment) in segments.iter().enumerate() {
            match self.find_child(cursor, segment.as_ref()) {
                Some(child) => cursor = child,
                None => return (cursor, i),
            }
        }
        (cursor, segments.len())
    }

    /// Resolves a full path match, or `None`.
    #[must_use]
    pub fn route<S: AsRef<str>>(&self, from: NodeId, segments: &[S]) -> Option<NodeId> {
        let (node, consumed) = self.sub_route(from, segments);
        (consumed == segments.len()).then_some(node)
    }

    /// Formats the immediate children as a left-justified name column
    /// followed by descriptions.
    #[must_use]
    pub fn children_descriptions(&self, id: NodeId, prefix: &str, indent: &str) -> String {
        let children = &self.nodes[id.0].children;
        if children.is_empty() {
            return String::new();
        }
        let width = children
            .iter()
            .map(|&child| self.nodes[child.0].cmd.name.len())
            .max()
            .unwrap_or(0);
        let mut out = String::new();
        for &child in children {
            let cmd = &self.nodes[child.0].cmd;
            out.push_str(&format!(
                "{prefix}{name:<width$}{indent}{desc}\n",
                name = cmd.name,
                desc = cmd.desc,
            ));
        }
        out
    }
}
