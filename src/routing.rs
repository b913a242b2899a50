//! Path routing.
//!
//! The route table is compiled once, on first use, and tried in a fixed
//! order from most to least specific; the first full match wins. A path no
//! route matches, or whose captured ids are malformed, resolves to
//! [`Resource::NotFound`].

use regex::Regex;
use std::sync::OnceLock;
use tracing::error;

use crate::models::DocId;
use crate::resources::Resource;

/// A path template with positional capture groups, matched against the
/// whole path.
#[derive(Debug)]
pub struct RoutePattern {
    regex: Option<Regex>,
}

impl RoutePattern {
    /// Compile `pattern`. A pattern that does not compile is logged and
    /// never matches anything.
    pub fn new(pattern: &'static str) -> Self {
        let regex = match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                error!(pattern, "Invalid route pattern: {}", e);
                None
            }
        };
        Self { regex }
    }

    /// Captured groups, in order and excluding the whole match, or `None`
    /// when the path does not match. Optional groups that did not take part
    /// in the match are `None`.
    pub fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.as_ref()?.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    CollectionStrings,
    Collection,
    Collections,
}

#[derive(Debug)]
struct Route {
    kind: RouteKind,
    pattern: RoutePattern,
}

static ROUTES: OnceLock<Vec<Route>> = OnceLock::new();

fn routes() -> &'static [Route] {
    ROUTES.get_or_init(|| {
        vec![
            Route {
                kind: RouteKind::CollectionStrings,
                pattern: RoutePattern::new(r"/collections/([a-z0-9]+)/strings(?:/([a-z0-9]+))?/?"),
            },
            Route {
                kind: RouteKind::Collection,
                pattern: RoutePattern::new(r"/collections/([a-z0-9]+)/?"),
            },
            Route {
                kind: RouteKind::Collections,
                pattern: RoutePattern::new(r"/collections/?"),
            },
        ]
    })
}

fn captured_id(captures: &[Option<String>], index: usize) -> Option<DocId> {
    captures
        .get(index)
        .and_then(|c| c.as_deref())
        .and_then(DocId::parse)
}

impl RouteKind {
    fn resource(self, captures: &[Option<String>]) -> Resource {
        match self {
            RouteKind::CollectionStrings => {
                let Some(collection_id) = captured_id(captures, 0) else {
                    return Resource::NotFound;
                };
                let string_id = match captures.get(1).and_then(|c| c.as_deref()) {
                    None => None,
                    Some(raw) => match DocId::parse(raw) {
                        Some(id) => Some(id),
                        None => return Resource::NotFound,
                    },
                };
                Resource::CollectionStrings {
                    collection_id,
                    string_id,
                }
            }
            RouteKind::Collection => match captured_id(captures, 0) {
                Some(id) => Resource::Collection { id },
                None => Resource::NotFound,
            },
            RouteKind::Collections => Resource::Collections,
        }
    }
}

/// Resolve a request path to the resource it addresses.
pub fn route(path: &str) -> Resource {
    routes()
        .iter()
        .find_map(|route| {
            route
                .pattern
                .captures(path)
                .map(|captures| route.kind.resource(&captures))
        })
        .unwrap_or(Resource::NotFound)
}
