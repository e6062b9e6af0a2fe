/// The hierarchical database behind the façade.
///
/// [`RemoteStore`] is the narrow interface the façade needs from a
/// tree-structured JSON database: generate child keys, and set, read, list
/// and remove the subtree at a path. [`MemoryStore`] implements it in
/// process with the usual semantics of such databases:
///
/// - `null` is never stored; writing `null` deletes, and objects left empty
///   by a write or delete disappear
/// - children are listed in key order (integer-like keys first, numerically,
///   then the rest lexicographically)
/// - reading a missing path yields nothing rather than an error
use crate::error::RefDbResult;
use crate::path::RefPath;
use crate::push_id::PushIdGenerator;
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::cmp::Ordering;
use tokio::sync::RwLock;

/// Operations the façade needs from the database.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Generate a fresh, chronologically ordered key for a child of `parent`.
    async fn push_key(&self, parent: &RefPath) -> RefDbResult<String>;

    /// Replace the subtree at `path` with `value`.
    async fn set(&self, path: &RefPath, value: JsonValue) -> RefDbResult<()>;

    /// Read the subtree at `path`, `None` if nothing is stored there.
    async fn read(&self, path: &RefPath) -> RefDbResult<Option<JsonValue>>;

    /// Direct children of the node at `path`, in key order.
    async fn children(&self, path: &RefPath) -> RefDbResult<Vec<(String, JsonValue)>>;

    /// Delete the subtree at `path`. Deleting a missing path is a no-op.
    async fn remove(&self, path: &RefPath) -> RefDbResult<()>;
}

/// In-process [`RemoteStore`] holding the whole database as one JSON tree.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<JsonValue>,
    ids: PushIdGenerator,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `tree`, normalised the same way writes are.
    pub fn from_snapshot(tree: JsonValue) -> Self {
        Self {
            root: RwLock::new(prune_nulls(tree).unwrap_or(JsonValue::Null)),
            ids: PushIdGenerator::new(),
        }
    }

    /// A copy of the whole tree (`null` when empty).
    pub async fn snapshot(&self) -> JsonValue {
        self.root.read().await.clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn push_key(&self, _parent: &RefPath) -> RefDbResult<String> {
        Ok(self.ids.next_id())
    }

    async fn set(&self, path: &RefPath, value: JsonValue) -> RefDbResult<()> {
        let Some(value) = prune_nulls(value) else {
            return self.remove(path).await;
        };

        tracing::trace!("set {}", path);
        let mut root = self.root.write().await;
        let mut node = &mut *root;
        for segment in path.segments() {
            if !node.is_object() {
                *node = JsonValue::Object(JsonMap::new());
            }
            let JsonValue::Object(map) = node else {
                unreachable!("node was just made an object");
            };
            node = map.entry(segment.clone()).or_insert(JsonValue::Null);
        }
        *node = value;
        Ok(())
    }

    async fn read(&self, path: &RefPath) -> RefDbResult<Option<JsonValue>> {
        let root = self.root.read().await;
        Ok(node_at(&root, path.segments())
            .filter(|node| !node.is_null())
            .cloned())
    }

    async fn children(&self, path: &RefPath) -> RefDbResult<Vec<(String, JsonValue)>> {
        let root = self.root.read().await;
        let mut children: Vec<(String, JsonValue)> = match node_at(&root, path.segments()) {
            Some(JsonValue::Object(map)) => {
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            Some(JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            _ => Vec::new(),
        };
        children.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        Ok(children)
    }

    async fn remove(&self, path: &RefPath) -> RefDbResult<()> {
        tracing::trace!("remove {}", path);
        let mut root = self.root.write().await;
        if remove_at(&mut root, path.segments()) {
            *root = JsonValue::Null;
        }
        Ok(())
    }
}

/// Drop `null` entries and the objects they leave empty.
///
/// Returns `None` if nothing is left. Arrays are stored as given.
fn prune_nulls(value: JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Null => None,
        JsonValue::Object(map) => {
            let pruned: JsonMap<String, JsonValue> = map
                .into_iter()
                .filter_map(|(k, v)| prune_nulls(v).map(|v| (k, v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(JsonValue::Object(pruned))
            }
        }
        other => Some(other),
    }
}

fn node_at<'a>(root: &'a JsonValue, segments: &[String]) -> Option<&'a JsonValue> {
    segments.iter().try_fold(root, |node, segment| match node {
        JsonValue::Object(map) => map.get(segment),
        _ => None,
    })
}

/// Remove the subtree at `segments` below `node`.
///
/// Returns `true` if `node` itself should be removed, either because it is
/// the target or because it became empty.
fn remove_at(node: &mut JsonValue, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return true;
    };
    let JsonValue::Object(map) = node else {
        return false;
    };
    let Some(child) = map.get_mut(first) else {
        return false;
    };
    if remove_at(child, rest) {
        map.remove(first);
    }
    map.is_empty()
}

/// Child key ordering: 32-bit integer keys first (numerically), then the rest
/// lexicographically.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i32>(), b.parse::<i32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> RefPath {
        RefPath::new(p)
    }

    #[tokio::test]
    async fn test_set_and_read() {
        let store = MemoryStore::new();
        store
            .set(&path("users/alice"), json!({"name": "Alice"}))
            .await
            .unwrap();

        assert_eq!(
            store.read(&path("users/alice")).await.unwrap(),
            Some(json!({"name": "Alice"}))
        );
        assert_eq!(
            store.read(&path("users")).await.unwrap(),
            Some(json!({"alice": {"name": "Alice"}}))
        );
        assert_eq!(store.read(&path("users/bob")).await.unwrap(), None);
        assert_eq!(store.read(&path("users/alice/name/x")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_replaces_subtree() {
        let store = MemoryStore::new();
        store.set(&path("a"), json!({"x": 1, "y": 2})).await.unwrap();
        store.set(&path("a"), json!({"z": 3})).await.unwrap();

        assert_eq!(store.read(&path("a")).await.unwrap(), Some(json!({"z": 3})));
    }

    #[tokio::test]
    async fn test_set_through_scalar_replaces_it() {
        let store = MemoryStore::new();
        store.set(&path("a"), json!(5)).await.unwrap();
        store.set(&path("a/b"), json!(true)).await.unwrap();

        assert_eq!(store.read(&path("a")).await.unwrap(), Some(json!({"b": true})));
    }

    #[tokio::test]
    async fn test_nulls_are_not_stored() {
        let store = MemoryStore::new();
        store
            .set(&path("a"), json!({"keep": 1, "drop": null, "empty": {"x": null}}))
            .await
            .unwrap();

        assert_eq!(store.read(&path("a")).await.unwrap(), Some(json!({"keep": 1})));

        store.set(&path("a/keep"), JsonValue::Null).await.unwrap();
        assert_eq!(store.read(&path("a")).await.unwrap(), None);
        assert_eq!(store.snapshot().await, JsonValue::Null);
    }

    #[tokio::test]
    async fn test_remove_prunes_empty_parents() {
        let store = MemoryStore::new();
        store.set(&path("a/b/c"), json!(1)).await.unwrap();
        store.set(&path("a/d"), json!(2)).await.unwrap();

        store.remove(&path("a/b/c")).await.unwrap();
        assert_eq!(store.read(&path("a")).await.unwrap(), Some(json!({"d": 2})));

        store.remove(&path("a/d")).await.unwrap();
        assert_eq!(store.snapshot().await, JsonValue::Null);

        // removing a missing path is fine
        store.remove(&path("nothing/here")).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_root() {
        let store = MemoryStore::new();
        store.set(&path("a"), json!(1)).await.unwrap();
        store.remove(&RefPath::root()).await.unwrap();
        assert_eq!(store.read(&RefPath::root()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_children_key_order() {
        let store = MemoryStore::new();
        store
            .set(
                &path("items"),
                json!({"b": 1, "10": 2, "a": 3, "9": 4, "-1": 5, "Z": 6}),
            )
            .await
            .unwrap();

        let keys: Vec<String> = store
            .children(&path("items"))
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        assert_eq!(keys, ["-1", "9", "10", "Z", "a", "b"]);
    }

    #[tokio::test]
    async fn test_children_of_missing_or_scalar() {
        let store = MemoryStore::new();
        store.set(&path("n"), json!(1)).await.unwrap();

        assert!(store.children(&path("missing")).await.unwrap().is_empty());
        assert!(store.children(&path("n")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_keys_are_unique() {
        let store = MemoryStore::new();
        let a = store.push_key(&path("x")).await.unwrap();
        let b = store.push_key(&path("x")).await.unwrap();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_from_snapshot_prunes() {
        let store = MemoryStore::from_snapshot(json!({"a": null, "b": {"c": 1}}));
        assert_eq!(store.snapshot().await, json!({"b": {"c": 1}}));
    }
}
