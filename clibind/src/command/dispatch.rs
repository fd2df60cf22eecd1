//! Route resolution, usage composition and handler dispatch.

use std::io;
use std::sync::PoisonError;

use tracing::debug;

use crate::binding::{FlagRecord, FlagSet};
use crate::error::CliError;
use crate::palette::Palette;
use crate::usage::{UsageStyle, record_usage};

use super::{CachedUsage, CommandTree, Context, Handler, NodeId};

struct Prepared {
    node: NodeId,
    path: String,
    router: Vec<String>,
    rest: Vec<String>,
    record: Option<Box<dyn FlagRecord>>,
    flag_set: FlagSet,
}

impl CommandTree {
    /// Dispatches `args` to the matching command, writing to standard
    /// output with terminal-aware highlighting.
    ///
    /// # Errors
    ///
    /// Returns the invocation's terminal error: a routing failure with
    /// suggestions attached, a binding failure, or whatever the handler
    /// chain reported.
    pub fn dispatch<I, S>(&self, args: I) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stdout = io::stdout();
        self.dispatch_with(args, &mut stdout, None, Palette::auto())
    }

    /// Dispatches `args` with an explicit writer, request method and
    /// palette.
    ///
    /// The method is only checked when the matched command restricts its
    /// HTTP methods, which is how the bridge reports 405s.
    ///
    /// # Errors
    ///
    /// As [`CommandTree::dispatch`].
    pub fn dispatch_with<I, S>(
        &self,
        args: I,
        writer: &mut dyn io::Write,
        method: Option<&str>,
        palette: Palette,
    ) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let prepared = match self.prepare(&args, method) {
            Ok(prepared) => prepared,
            Err(e) => {
                return match &self.on_prepare_error {
                    Some(filter) => filter(e),
                    None => Err(e),
                };
            }
        };

        let node = &self.nodes[prepared.node.0];
        debug!(command = %node.cmd.name, path = %prepared.path, "dispatching");

        let mut ctx = Context::new(
            self,
            prepared.node,
            prepared.path,
            prepared.router,
            prepared.rest,
            prepared.record,
            prepared.flag_set,
            writer,
            palette,
            UsageStyle::default(),
        );

        if ctx.record.as_deref().is_some_and(|rec| rec.wants_help()) {
            ctx.write_usage()?;
            return Ok(());
        }

        let Some(handler) = node.cmd.handler.as_ref() else {
            return Err(CliError::CommandNotFound {
                path: ctx.path.clone(),
                suggestions: Vec::new(),
            });
        };

        if node.cmd.no_hook {
            return run_step(handler, &mut ctx);
        }

        let chain: [Option<&Handler>; 5] = [
            node.cmd.on_before.as_ref(),
            self.on_root_before.as_ref(),
            Some(handler),
            self.on_root_after.as_ref(),
            node.cmd.on_after.as_ref(),
        ];
        for step in chain.into_iter().flatten() {
            if let Err(e) = step(&mut ctx) {
                // The exit sentinel ends the chain without failing.
                return if e.is_exit() { Ok(()) } else { Err(e) };
            }
        }
        Ok(())
    }

    fn prepare(&self, args: &[String], method: Option<&str>) -> Result<Prepared, CliError> {
        let router: Vec<String> = args
            .iter()
            .take_while(|arg| !arg.starts_with('-'))
            .cloned()
            .collect();
        let root = &self.nodes[0];
        if router.is_empty() && root.cmd.handler.is_none() {
            return Err(CliError::CommandNotFound {
                path: root.cmd.name.clone(),
                suggestions: Vec::new(),
            });
        }

        let path = router.join(" ");
        let (node, end) = self.sub_route(self.root(), &router);
        if end != router.len() && !self.nodes[node.0].cmd.can_sub_route {
            let suggestions = self.suggestions(&path);
            return Err(CliError::CommandNotFound { path, suggestions });
        }

        let allowed = &self.nodes[node.0].cmd.http_methods;
        if let Some(m) = method {
            if !allowed.is_empty() && !allowed.iter().any(|candidate| candidate == m) {
                return Err(CliError::MethodNotAllowed {
                    method: m.to_owned(),
                });
            }
        }

        let rest: Vec<String> = args.get(end..).unwrap_or(&[]).to_vec();
        let mut record = self.nodes[node.0].cmd.factory.as_ref().map(|f| f());
        let flag_set = match record.as_deref_mut() {
            Some(rec) => FlagSet::bind(rec, rest.iter().cloned(), &self.registry)?,
            None => FlagSet::free_only(&rest),
        };

        if !flag_set.validation_suppressed() {
            if let Some(rec) = record.as_deref() {
                rec.validate()?;
            }
        }

        Ok(Prepared {
            node,
            path,
            router: router.get(..end).unwrap_or(&[]).to_vec(),
            rest,
            record,
            flag_set,
        })
    }

    /// Composes the node's usage: description, long text, the record's
    /// flag table and the immediate children listing.
    ///
    /// The composed text is cached per node and recomputed when the style
    /// changes.
    #[must_use]
    pub fn usage(&self, id: NodeId, palette: &Palette, style: UsageStyle) -> String {
        let node = &self.nodes[id.0];
        {
            let cache = node
                .usage_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.as_ref() {
                if cached.style == style && !cached.text.is_empty() {
                    debug!(command = %node.cmd.name, "usage served from cache");
                    return cached.text.clone();
                }
            }
        }

        let mut out = String::new();
        if !node.cmd.desc.is_empty() {
            out.push_str(&node.cmd.desc);
            out.push_str("\n\n");
        }
        if !node.cmd.text.is_empty() {
            out.push_str(&node.cmd.text);
            out.push_str("\n\n");
        }
        if let Some(factory) = &node.cmd.factory {
            let mut record = factory();
            let options = record_usage(record.as_mut(), &self.registry, palette, style)
                .unwrap_or_default();
            out.push_str(&format!("{}:\n\n{options}", palette.bold("Options")));
        }
        if !node.children.is_empty() {
            if node.cmd.factory.is_some() {
                out.push('\n');
            }
            out.push_str(&format!(
                "{}:\n\n{}",
                palette.bold("Commands"),
                self.children_descriptions(id, "  ", "   ")
            ));
        }

        let mut cache = node
            .usage_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cache = Some(CachedUsage {
            style,
            text: out.clone(),
        });
        out
    }
}

fn run_step(step: &Handler, ctx: &mut Context<'_>) -> Result<(), CliError> {
    match step(ctx) {
        Err(e) if e.is_exit() => Ok(()),
        other => other,
    }
}
