use std::rc::{Rc, Weak};

use serde_derive::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// The two partitions of a request's parameters: query-string parameters
/// and body (form) parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamGroup {
    Query,
    Body,
}

impl ParamGroup {
    pub const ALL: [ParamGroup; 2] = [ParamGroup::Query, ParamGroup::Body];
}

/// Insertion-ordered mapping from parameter name to its list of values.
/// A parameter may legally appear with multiple values, and mutation
/// iterates entries in the order the request carried them, so a plain
/// HashMap does not fit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap {
    entries: Vec<(String, Vec<String>)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or overwrite. Overwriting keeps the entry's position, a new
    /// key is appended at the end.
    pub fn insert(&mut self, name: String, values: Vec<String>) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            *existing = values;
        } else {
            self.entries.push((name, values));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for ParamMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        let mut map = ParamMap::new();
        for (name, values) in iter {
            map.insert(name, values);
        }
        map
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub query: ParamMap,
    #[serde(default)]
    pub body: ParamMap,
}

impl Params {
    pub fn group(&self, group: ParamGroup) -> &ParamMap {
        match group {
            ParamGroup::Query => &self.query,
            ParamGroup::Body => &self.body,
        }
    }

    pub fn group_mut(&mut self, group: ParamGroup) -> &mut ParamMap {
        match group {
            ParamGroup::Query => &mut self.query,
            ParamGroup::Body => &mut self.body,
        }
    }

    pub fn total_len(&self) -> usize {
        self.query.len() + self.body.len()
    }
}

/// One observed (or synthesized) request. Nodes are value-like: mutation
/// never touches its source node, it builds a new one from a copy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub url: String,
    pub method: HttpMethod,
    pub params: Params,

    /// count of parameters across both groups, refreshed after mutation
    pub size: usize,

    /// provenance only, never used for traversal
    #[serde(skip)]
    pub parent: Weak<Node>,
}

impl Node {
    pub fn new(url: String, method: HttpMethod, params: Params) -> Self {
        let size = params.total_len();
        Node {
            url,
            method,
            params,
            size,
            parent: Weak::new(),
        }
    }

    /// Empty-parameter child carrying the source's url and method and a
    /// back-reference to it.
    pub fn derived_from(source: &Rc<Node>) -> Self {
        Node {
            url: source.url.clone(),
            method: source.method,
            params: Params::default(),
            size: 0,
            parent: Rc::downgrade(source),
        }
    }

    pub fn recalculate_size(&mut self) {
        self.size = self.params.total_len();
    }
}

// parent is provenance, not identity
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.method == other.method
            && self.params == other.params
            && self.size == other.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_keeps_first_seen_order() {
        let mut map = ParamMap::new();
        map.insert("b".to_string(), values(&["1"]));
        map.insert("a".to_string(), values(&["2"]));
        map.insert("c".to_string(), values(&["3"]));

        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut map = ParamMap::new();
        map.insert("a".to_string(), values(&["1"]));
        map.insert("b".to_string(), values(&["2"]));
        map.insert("a".to_string(), values(&["changed"]));

        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(values(&["changed"]).as_slice()));
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let mut map = ParamMap::new();
        map.insert("a".to_string(), values(&["1"]));
        map.insert("b".to_string(), values(&["2"]));
        map.insert("c".to_string(), values(&["3"]));

        assert_eq!(map.remove("b"), Some(values(&["2"])));
        assert_eq!(map.remove("b"), None);

        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn node_size_tracks_both_groups() {
        let mut params = Params::default();
        params.query.insert("id".to_string(), values(&["1"]));
        params.body.insert("name".to_string(), values(&["x"]));
        params.body.insert("mail".to_string(), values(&["y"]));

        let mut node = Node::new("/form".to_string(), HttpMethod::Post, params);
        assert_eq!(node.size, 3);

        node.params.body.remove("mail");
        node.recalculate_size();
        assert_eq!(node.size, 2);
    }

    #[test]
    fn derived_node_tracks_parent() {
        let parent = Rc::new(Node::new(
            "/a".to_string(),
            HttpMethod::Get,
            Params::default(),
        ));

        let child = Node::derived_from(&parent);
        assert_eq!(child.url, "/a");
        assert_eq!(child.method, HttpMethod::Get);
        assert!(child.parent.upgrade().is_some());
        assert_eq!(*child.parent.upgrade().unwrap(), *parent);
    }
}
