//! orchard-router: Zero-dependency trie HTTP router
//!
//! Maps `(method, path)` pairs to values of any type. The orchard app stores
//! a chain index per route; tests store plain strings.
//!
//! ## Path Syntax
//! - `/fruits` - static segments
//! - `/fruits/:id` - named parameter (captures one segment)
//!
//! Unmatched paths are left to the caller; there is no catch-all segment.
//!
//! ## Priority
//! 1. Exact static match (highest)
//! 2. Parameter match
//!
//! ## Example
//! ```
//! use orchard_router::Router;
//!
//! let mut router = Router::new();
//! router.insert("GET", "/fruits", 0).unwrap();
//! router.insert("PUT", "/fruits/:id", 1).unwrap();
//!
//! let m = router.find("PUT", "/fruits/2").unwrap();
//! assert_eq!(*m.value, 1);
//! assert_eq!(m.params.get("id"), Some("2"));
//! ```

use std::collections::HashMap;
use std::fmt;

/// Route registration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The same method and path were registered twice
    Duplicate { method: String, path: String },
    /// Two routes use different parameter names at the same position
    ParamConflict { path: String, existing: String, new: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Duplicate { method, path } => {
                write!(f, "route already registered: {} {}", method, path)
            }
            RouteError::ParamConflict { path, existing, new } => write!(
                f,
                "parameter :{} in {} conflicts with existing parameter :{}",
                new, path, existing
            ),
        }
    }
}

impl std::error::Error for RouteError {}

/// Captured path parameters, in path order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert into a map for owned access
    pub fn into_map(self) -> HashMap<String, String> {
        self.0.into_iter().collect()
    }
}

/// Route match result
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a, T> {
    /// The value registered for the route
    pub value: &'a T,
    /// Captured path parameters
    pub params: Params,
}

#[derive(Debug)]
struct Node<T> {
    children: HashMap<String, Node<T>>,
    param_child: Option<Box<ParamNode<T>>>,
    value: Option<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            value: None,
        }
    }
}

#[derive(Debug)]
struct ParamNode<T> {
    name: String,
    node: Node<T>,
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Zero-dependency trie HTTP router
///
/// Routes are grouped by method (one trie per method), then matched segment
/// by segment. Trailing slashes and repeated slashes are ignored.
#[derive(Debug)]
pub struct Router<T> {
    trees: HashMap<String, Node<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }
}

impl<T> Router<T> {
    /// Create a new router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route
    ///
    /// Fails if the route is already registered, or if a parameter name
    /// clashes with an existing one at the same position.
    pub fn insert(&mut self, method: &str, path: &str, value: T) -> Result<(), RouteError> {
        let method = method.to_uppercase();
        let segments = split_path(path);
        let tree = self.trees.entry(method.clone()).or_default();
        Self::insert_node(tree, &segments, value, &method, path)
    }

    fn insert_node(
        node: &mut Node<T>,
        segments: &[&str],
        value: T,
        method: &str,
        path: &str,
    ) -> Result<(), RouteError> {
        let Some((&segment, rest)) = segments.split_first() else {
            if node.value.is_some() {
                return Err(RouteError::Duplicate {
                    method: method.to_string(),
                    path: path.to_string(),
                });
            }
            node.value = Some(value);
            return Ok(());
        };

        if let Some(name) = segment.strip_prefix(':') {
            let param = node.param_child.get_or_insert_with(|| {
                Box::new(ParamNode {
                    name: name.to_string(),
                    node: Node::default(),
                })
            });
            if param.name != name {
                return Err(RouteError::ParamConflict {
                    path: path.to_string(),
                    existing: param.name.clone(),
                    new: name.to_string(),
                });
            }
            Self::insert_node(&mut param.node, rest, value, method, path)
        } else {
            let child = node.children.entry(segment.to_string()).or_default();
            Self::insert_node(child, rest, value, method, path)
        }
    }

    /// Find the route matching `method` and `path`
    pub fn find(&self, method: &str, path: &str) -> Option<Match<'_, T>> {
        let tree = self.trees.get(&method.to_uppercase())?;
        let segments = split_path(path);
        let mut params = Vec::new();
        let value = Self::find_node(tree, &segments, &mut params)?;
        Some(Match {
            value,
            params: Params(params),
        })
    }

    fn find_node<'a>(
        node: &'a Node<T>,
        segments: &[&str],
        params: &mut Vec<(String, String)>,
    ) -> Option<&'a T> {
        let Some((&segment, rest)) = segments.split_first() else {
            return node.value.as_ref();
        };

        if let Some(child) = node.children.get(segment) {
            if let Some(value) = Self::find_node(child, rest, params) {
                return Some(value);
            }
        }

        if let Some(param) = &node.param_child {
            params.push((param.name.clone(), segment.to_string()));
            if let Some(value) = Self::find_node(&param.node, rest, params) {
                return Some(value);
            }
            params.pop();
        }

        None
    }

    /// Methods that have a route matching `path`
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        let segments = split_path(path);
        let mut methods: Vec<String> = self
            .trees
            .iter()
            .filter(|(_, tree)| Self::find_node(tree, &segments, &mut Vec::new()).is_some())
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort();
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit_router() -> Router<&'static str> {
        let mut router = Router::new();
        router.insert("GET", "/", "home").unwrap();
        router.insert("GET", "/fruits", "list").unwrap();
        router.insert("POST", "/fruits", "create").unwrap();
        router.insert("PUT", "/fruits/:id", "replace").unwrap();
        router.insert("PATCH", "/fruits/:id", "merge").unwrap();
        router.insert("DELETE", "/fruits/:id", "remove").unwrap();
        router
    }

    #[test]
    fn test_static_routes() {
        let router = fruit_router();

        assert_eq!(*router.find("GET", "/").unwrap().value, "home");
        assert_eq!(*router.find("GET", "/fruits").unwrap().value, "list");
        assert_eq!(*router.find("POST", "/fruits").unwrap().value, "create");
        assert!(router.find("GET", "/vegetables").is_none());
        assert!(router.find("POST", "/blah").is_none());
    }

    #[test]
    fn test_param_routes() {
        let router = fruit_router();

        let m = router.find("PUT", "/fruits/42").unwrap();
        assert_eq!(*m.value, "replace");
        assert_eq!(m.params.get("id"), Some("42"));
        assert_eq!(m.params.len(), 1);

        // parameter only spans a single segment
        assert!(router.find("PUT", "/fruits/42/seeds").is_none());
        assert!(router.find("PUT", "/fruits").is_none());
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let router = fruit_router();
        assert_eq!(*router.find("patch", "/fruits/1").unwrap().value, "merge");
    }

    #[test]
    fn test_trailing_slash() {
        let router = fruit_router();
        assert_eq!(*router.find("GET", "/fruits/").unwrap().value, "list");
        assert_eq!(*router.find("GET", "//fruits").unwrap().value, "list");
    }

    #[test]
    fn test_priority_exact_over_param() {
        let mut router = Router::new();
        router.insert("GET", "/fruits/:id", 1).unwrap();
        router.insert("GET", "/fruits/ripe", 2).unwrap();

        assert_eq!(*router.find("GET", "/fruits/ripe").unwrap().value, 2);
        assert_eq!(*router.find("GET", "/fruits/7").unwrap().value, 1);
    }

    #[test]
    fn test_static_miss_falls_back_to_param() {
        let mut router = Router::new();
        router.insert("GET", "/fruits/ripe/count", 1).unwrap();
        router.insert("GET", "/fruits/:id", 2).unwrap();

        let m = router.find("GET", "/fruits/ripe").unwrap();
        assert_eq!(*m.value, 2);
        assert_eq!(m.params.get("id"), Some("ripe"));
    }

    #[test]
    fn test_star_segment_is_literal() {
        let mut router = Router::new();
        router.insert("GET", "/fruits/*", 1).unwrap();

        assert_eq!(*router.find("GET", "/fruits/*").unwrap().value, 1);
        assert!(router.find("GET", "/fruits/apple").is_none());
        assert!(router.find("GET", "/fruits/a/b").is_none());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut router = fruit_router();
        let err = router.insert("get", "/fruits", "again").unwrap_err();
        assert_eq!(
            err,
            RouteError::Duplicate {
                method: "GET".to_string(),
                path: "/fruits".to_string()
            }
        );
    }

    #[test]
    fn test_param_conflict_rejected() {
        let mut router = fruit_router();
        let err = router.insert("PUT", "/fruits/:name/seeds", "x").unwrap_err();
        assert!(matches!(err, RouteError::ParamConflict { .. }));
        assert!(err.to_string().contains(":name"));
    }

    #[test]
    fn test_allowed_methods() {
        let router = fruit_router();
        assert_eq!(
            router.allowed_methods("/fruits/3"),
            vec!["DELETE".to_string(), "PATCH".to_string(), "PUT".to_string()]
        );
        assert!(router.allowed_methods("/nope").is_empty());
    }

    #[test]
    fn test_params_into_map() {
        let mut router = Router::new();
        router.insert("GET", "/orchards/:orchard/fruits/:id", ()).unwrap();

        let m = router.find("GET", "/orchards/north/fruits/9").unwrap();
        let pairs: Vec<_> = m.params.iter().collect();
        assert_eq!(pairs, vec![("orchard", "north"), ("id", "9")]);

        let map = m.params.into_map();
        assert_eq!(map.get("id"), Some(&"9".to_string()));
    }
}
