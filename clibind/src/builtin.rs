//! Builtin argument records and the builtin help command.

use crate::binding::{FieldDecl, FlagRecord};
use crate::command::Command;
use crate::error::CliError;

/// Builtin `-h, --help` flag record.
///
/// Embed it in an argument record and delegate
/// [`wants_help`](FlagRecord::wants_help) to it:
///
/// ```
/// use clibind::{FieldDecl, FlagRecord, Helper};
///
/// #[derive(Default)]
/// struct Args {
///     helper: Helper,
///     port: u16,
/// }
///
/// impl FlagRecord for Args {
///     fn fields(&mut self) -> Vec<FieldDecl<'_>> {
///         vec![
///             FieldDecl::embed(&mut self.helper),
///             FieldDecl::value("port", &mut self.port).named("p,port"),
///         ]
///     }
///
///     fn wants_help(&self) -> bool {
///         self.helper.wants_help()
///     }
/// }
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Helper {
    /// Whether help was requested.
    pub help: bool,
}

impl FlagRecord for Helper {
    fn fields(&mut self) -> Vec<FieldDecl<'_>> {
        vec![
            FieldDecl::value("help", &mut self.help)
                .named("!h,help")
                .usage("display help information"),
        ]
    }

    fn wants_help(&self) -> bool {
        self.help
    }
}

/// Builtin host and port flag record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Addr {
    /// Bind host, defaulting to `0.0.0.0`.
    pub host: String,
    /// Bind port, defaulting to `8080`.
    pub port: u16,
}

impl Addr {
    /// Formats the address as `host:port`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FlagRecord for Addr {
    fn fields(&mut self) -> Vec<FieldDecl<'_>> {
        vec![
            FieldDecl::value("host", &mut self.host)
                .named("H,host")
                .usage("specify host")
                .default_value("0.0.0.0"),
            FieldDecl::value("port", &mut self.port)
                .named("p,port")
                .usage("specify port")
                .default_value("8080"),
        ]
    }
}

/// A builtin `help` command.
///
/// Without arguments it prints its parent's usage; with arguments it
/// routes them from the parent and prints the resolved command's usage.
#[must_use]
pub fn help_command(desc: impl Into<String>) -> Command {
    Command::new("help")
        .desc(desc)
        .can_sub_route(true)
        .no_hook(true)
        .handler(|ctx| {
            let tree = ctx.tree();
            let parent = tree.parent(ctx.command()).unwrap_or_else(|| tree.root());
            let args = ctx.args().to_vec();
            if args.is_empty() {
                let text = tree.usage(parent, &ctx.palette(), crate::UsageStyle::default());
                return ctx.string(text);
            }
            match tree.route(parent, &args) {
                Some(target) => {
                    let text = tree.usage(target, &ctx.palette(), crate::UsageStyle::default());
                    ctx.string(text)
                }
                None => Err(CliError::CommandNotFound {
                    path: args.join(" "),
                    suggestions: tree.suggestions(&args.join(" ")),
                }),
            }
        })
}
