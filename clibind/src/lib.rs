//! Declarative command-line argument binding and hierarchical command
//! dispatch.
//!
//! Applications describe their flags as annotated record fields via
//! [`FlagRecord`]; the binding engine parses a token stream into those
//! fields, honouring defaults (including environment expressions), short
//! and long names, folded and siamese short flags, slice and map
//! accumulation and required-field validation. Commands are organised in
//! a [`CommandTree`] with prefix routing, generated usage text and
//! edit-distance suggestions for mistyped paths, and the whole tree can be
//! exposed over HTTP request/response pairs with [`HttpBridge`].
//!
//! ```
//! use clibind::{Command, CommandTree, FieldDecl, FlagRecord, Helper, Palette};
//!
//! #[derive(Default)]
//! struct GreetArgs {
//!     helper: Helper,
//!     name: String,
//! }
//!
//! impl FlagRecord for GreetArgs {
//!     fn fields(&mut self) -> Vec<FieldDecl<'_>> {
//!         vec![
//!             FieldDecl::embed(&mut self.helper),
//!             FieldDecl::value("name", &mut self.name)
//!                 .named("n,name")
//!                 .usage("who to greet")
//!                 .default_value("world"),
//!         ]
//!     }
//!
//!     fn wants_help(&self) -> bool {
//!         self.helper.wants_help()
//!     }
//! }
//!
//! # fn main() -> Result<(), clibind::CliError> {
//! let mut tree = CommandTree::new(Command::new("app"));
//! tree.register(
//!     tree.root(),
//!     Command::new("greet")
//!         .desc("say hello")
//!         .factory(|| Box::new(GreetArgs::default()))
//!         .handler(|ctx| {
//!             let argv = ctx.argv::<GreetArgs>().ok_or(clibind::CliError::Exit)?;
//!             let line = format!("hello {}", argv.name);
//!             ctx.string(line)
//!         }),
//! )?;
//!
//! let mut out = Vec::new();
//! tree.dispatch_with(["greet", "--name", "ana"], &mut out, None, Palette::plain())?;
//! assert_eq!(String::from_utf8_lossy(&out), "hello ana");
//! # Ok(())
//! # }
//! ```

mod binding;
mod bridge;
mod builtin;
mod command;
mod error;
mod fieldspec;
mod palette;
mod registry;
mod usage;
mod value;

pub use binding::{FieldDecl, FlagRecord, FlagSet, FormValues};
pub use bridge::{
    BridgeResponse, HttpBridge, STATUS_INTERNAL_ERROR, STATUS_METHOD_NOT_ALLOWED,
    STATUS_NOT_FOUND, STATUS_OK, parse_query,
};
pub use builtin::{Addr, Helper, help_command};
pub use command::{Command, CommandTree, Context, Handler, NodeId, PrepareFilter, RecordFactory};
pub use error::{BindFailures, CliError};
pub use palette::Palette;
pub use registry::{FlagParser, ParserRegistry};
pub use usage::{UsageStyle, record_usage};
pub use value::{Bind, CoerceError, Counter, Decode, Encode, Json};

/// Runs a single-command application against the given tokens.
///
/// The implicit root accepts partial routes, so every non-flag token lands
/// in the context's free arguments.
///
/// # Errors
///
/// Returns the invocation's terminal error, as
/// [`CommandTree::dispatch_with`].
pub fn run_with_args<I, S, R, F>(
    name: impl Into<String>,
    args: I,
    factory: impl Fn() -> R + Send + Sync + 'static,
    handler: F,
) -> Result<(), CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    R: FlagRecord,
    F: Fn(&mut Context<'_>) -> Result<(), CliError> + Send + Sync + 'static,
{
    let tree = CommandTree::new(
        Command::new(name)
            .can_sub_route(true)
            .factory(move || Box::new(factory()) as Box<dyn FlagRecord>)
            .handler(handler),
    );
    tree.dispatch(args)
}
