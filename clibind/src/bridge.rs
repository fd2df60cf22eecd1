//! HTTP bridge: maps request paths and form fields onto the command tree.
//!
//! The bridge performs no networking. A consumer hands it the request
//! method, path and decoded form pairs; path segments become router
//! segments, form fields become synthetic flag tokens, and the dispatch
//! outcome maps back to a status code.

use std::collections::BTreeMap;

use tracing::debug;

use crate::command::CommandTree;
use crate::error::CliError;
use crate::palette::Palette;

/// HTTP status for a successful dispatch.
pub const STATUS_OK: u16 = 200;
/// HTTP status for an unmatched command path.
pub const STATUS_NOT_FOUND: u16 = 404;
/// HTTP status for a rejected request method.
pub const STATUS_METHOD_NOT_ALLOWED: u16 = 405;
/// HTTP status for any other dispatch failure.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Outcome of one bridged request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    /// The mapped status code.
    pub status: u16,
    /// The handler's output, or the rendered error.
    pub body: String,
}

/// Bridges requests onto a [`CommandTree`].
pub struct HttpBridge<'a> {
    tree: &'a CommandTree,
}

impl<'a> HttpBridge<'a> {
    /// Wraps `tree` for request handling.
    #[must_use]
    pub const fn new(tree: &'a CommandTree) -> Self {
        Self { tree }
    }

    /// Handles one request.
    ///
    /// The path maps to router segments (route aliases registered with
    /// [`CommandTree::register_http`] are honoured first). Each form field
    /// becomes a flag token: single-character keys get a single dash,
    /// longer keys a double dash, already-dashed keys are kept as-is, and
    /// only the last value of a multi-valued field is used.
    #[must_use]
    pub fn handle(&self, method: &str, path: &str, form: &[(String, String)]) -> BridgeResponse {
        let resolved = self
            .tree
            .routes
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.trim_matches('/').replace('/', " "));

        let mut args: Vec<String> = resolved
            .split(' ')
            .filter(|segment| !segment.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        for (key, value) in last_values(form) {
            let flag = if key.starts_with('-') {
                key.to_owned()
            } else if key.chars().count() == 1 {
                format!("-{key}")
            } else {
                format!("--{key}")
            };
            args.push(flag);
            args.push(value.to_owned());
        }
        debug!(?args, %method, "bridging request");

        let mut buf: Vec<u8> = Vec::new();
        let outcome = self
            .tree
            .dispatch_with(args, &mut buf, Some(method), Palette::plain());
        let mut body = String::from_utf8_lossy(&buf).into_owned();
        match outcome {
            Ok(()) => BridgeResponse {
                status: STATUS_OK,
                body,
            },
            Err(e) => {
                let status = match &e {
                    CliError::CommandNotFound { .. } => STATUS_NOT_FOUND,
                    CliError::MethodNotAllowed { .. } => STATUS_METHOD_NOT_ALLOWED,
                    _ => STATUS_INTERNAL_ERROR,
                };
                body.push_str(&e.render(&Palette::plain()));
                BridgeResponse { status, body }
            }
        }
    }
}

/// Keeps the last value of each form key, preserving first-seen key order.
fn last_values(form: &[(String, String)]) -> Vec<(&str, &str)> {
    let mut order: Vec<&str> = Vec::new();
    let mut last: BTreeMap<&str, &str> = BTreeMap::new();
    for (key, value) in form {
        if key.is_empty() {
            continue;
        }
        if !last.contains_key(key.as_str()) {
            order.push(key);
        }
        last.insert(key, value);
    }
    order
        .into_iter()
        .filter_map(|key| last.get(key).map(|&value| (key, value)))
        .collect()
}

/// Decodes an `application/x-www-form-urlencoded` query string into pairs.
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    let plus_decoded = component.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(plus_decoded)
}

impl CommandTree {
    /// Indexes every node-declared HTTP route alias.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::DuplicateRoute`] when two commands declare the
    /// same route.
    pub fn register_http(&mut self) -> Result<(), CliError> {
        let mut routes = BTreeMap::new();
        for at in 0..self.nodes.len() {
            let id = crate::command::NodeId(at);
            let path = self.path(id);
            for route in &self.nodes[at].cmd.http_routes {
                if routes.contains_key(route) {
                    return Err(CliError::DuplicateRoute {
                        route: route.clone(),
                    });
                }
                routes.insert(route.clone(), path.clone());
            }
        }
        self.routes = routes;
        Ok(())
    }
}
