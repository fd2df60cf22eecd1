//! Per-invocation context handed to handlers and hooks.

use std::any::Any;
use std::io;

use serde::Serialize;

use crate::binding::{FlagRecord, FlagSet, FormValues};
use crate::error::CliError;
use crate::palette::Palette;
use crate::usage::UsageStyle;

use super::{CommandTree, NodeId};

/// Running context for one dispatched command.
///
/// Exposes the matched path, the consumed router segments, the raw
/// remainder tokens, the bound record and the free arguments, plus writers
/// for the handler's output.
pub struct Context<'a> {
    tree: &'a CommandTree,
    node: NodeId,
    pub(crate) path: String,
    router: Vec<String>,
    native_args: Vec<String>,
    pub(crate) record: Option<Box<dyn FlagRecord>>,
    pub(crate) flag_set: FlagSet,
    writer: &'a mut dyn io::Write,
    palette: Palette,
    style: UsageStyle,
}

impl<'a> Context<'a> {
    #[expect(clippy::too_many_arguments, reason = "assembled in one place by dispatch")]
    pub(crate) fn new(
        tree: &'a CommandTree,
        node: NodeId,
        path: String,
        router: Vec<String>,
        native_args: Vec<String>,
        record: Option<Box<dyn FlagRecord>>,
        flag_set: FlagSet,
        writer: &'a mut dyn io::Write,
        palette: Palette,
        style: UsageStyle,
    ) -> Self {
        Self {
            tree,
            node,
            path,
            router,
            native_args,
            record,
            flag_set,
            writer,
            palette,
            style,
        }
    }

    /// The matched command path, e.g. `"sub1 sub11"`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The consumed router segments.
    #[must_use]
    pub fn router(&self) -> &[String] {
        &self.router
    }

    /// The raw tokens left after the router segments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.native_args
    }

    /// Tokens the binding engine left as free arguments.
    #[must_use]
    pub fn free_args(&self) -> &[String] {
        self.flag_set.free_args()
    }

    /// Final string representations of every assigned flag.
    #[must_use]
    pub const fn form_values(&self) -> &FormValues {
        self.flag_set.values()
    }

    /// The dispatched command's handle.
    #[must_use]
    pub const fn command(&self) -> NodeId {
        self.node
    }

    /// The tree the command was dispatched from.
    #[must_use]
    pub const fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    /// The palette dispatch was invoked with.
    #[must_use]
    pub const fn palette(&self) -> Palette {
        self.palette
    }

    /// The bound argument record, downcast to its concrete type.
    #[must_use]
    pub fn argv<T: FlagRecord>(&self) -> Option<&T> {
        let record: &dyn FlagRecord = self.record.as_deref()?;
        let any: &dyn Any = record;
        any.downcast_ref::<T>()
    }

    /// The dispatched command's usage text.
    #[must_use]
    pub fn usage(&self) -> String {
        self.tree.usage(self.node, &self.palette, self.style)
    }

    /// Writes the command's usage text to the context writer.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] when the writer fails.
    pub fn write_usage(&mut self) -> Result<(), CliError> {
        let text = self.usage();
        self.string(text)
    }

    /// Writes `text` to the context writer.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] when the writer fails.
    pub fn string(&mut self, text: impl AsRef<str>) -> Result<(), CliError> {
        self.writer.write_all(text.as_ref().as_bytes())?;
        Ok(())
    }

    /// Writes `value` as compact JSON to the context writer.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Json`] when encoding fails and [`CliError::Io`]
    /// when the writer fails.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), CliError> {
        let text = serde_json::to_string(value).map_err(|e| CliError::Json(Box::new(e)))?;
        self.string(text)
    }

    /// Writes `value` as pretty-printed JSON to the context writer.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Json`] when encoding fails and [`CliError::Io`]
    /// when the writer fails.
    pub fn json_pretty<T: Serialize>(&mut self, value: &T) -> Result<(), CliError> {
        let text = serde_json::to_string_pretty(value).map_err(|e| CliError::Json(Box::new(e)))?;
        self.string(text)
    }
}
