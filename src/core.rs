/// The CRUD façade.
///
/// [`RefDb`] sequences every operation the same way: validate the arguments,
/// resolve the path (applying the configured prefix), serialize the payload,
/// call the store, and parse what comes back. Items live at `<path>/<id>` and
/// always carry their own id in an `id` property.
use crate::config::RefDbConfig;
use crate::convert::convert_by_type;
use crate::error::{RefDbError, RefDbResult};
use crate::guard::not_null;
use crate::parser::parse;
use crate::path::RefPath;
use crate::serializer::{date_marker, serialize};
use crate::store::{MemoryStore, RemoteStore};
use crate::value::{Map, Timestamp, Value};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Property every stored item carries its id in.
pub const ID_FIELD: &str = "id";

/// Data-access helper over a [`RemoteStore`].
///
/// Cheap to clone; clones share the store.
///
/// # Example
///
/// ```ignore
/// use refdb::{RefDb, Timestamp, Value};
///
/// let db = RefDb::in_memory();
/// let id = db
///     .insert("events", &Value::object([("at", Timestamp::now())]))
///     .await?;
/// let event = db.get("events", &id).await?;
/// ```
pub struct RefDb<S: RemoteStore = MemoryStore> {
    store: Arc<S>,
    config: RefDbConfig,
}

impl<S: RemoteStore> Clone for RefDb<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: RemoteStore> std::fmt::Debug for RefDb<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefDb")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RefDb<MemoryStore> {
    /// A façade over a fresh in-memory store, configured from the
    /// environment.
    pub fn in_memory() -> Self {
        Self::with_config(MemoryStore::new(), RefDbConfig::from_env())
    }
}

impl<S: RemoteStore> RefDb<S> {
    /// Connect the façade to `store`, configured from the environment.
    pub fn new(store: S) -> Self {
        Self::with_config(store, RefDbConfig::from_env())
    }

    pub fn with_config(store: S, config: RefDbConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Connect to a store that is shared with other owners.
    pub fn from_shared(store: Arc<S>, config: RefDbConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &RefDbConfig {
        &self.config
    }

    /// Insert `data` under a freshly generated push id and return the id.
    ///
    /// Any `id` property in `data` is overwritten by the generated id.
    pub async fn insert(&self, path: &str, data: &Value) -> RefDbResult<String> {
        not_null(data, "data")?;
        not_null(path, "pathValue")?;

        let parent = self.config.resolve(path);
        let id = self.store.push_key(&parent).await?;
        tracing::debug!("insert {} under {}", id, parent);

        self.write_item(&parent.join(&id), &id, item_fields(serialize(data))?)
            .await?;
        Ok(id)
    }

    /// Insert `data` under a caller-chosen id and return the id.
    ///
    /// An existing item with the same id is replaced.
    pub async fn insert_with_id(&self, path: &str, id: &str, data: &Value) -> RefDbResult<String> {
        not_null(data, "data")?;
        not_null(path, "pathValue")?;
        not_null(id, "id")?;

        let target = self.config.resolve(path).join(id);
        tracing::debug!("insert {}", target);

        self.write_item(&target, id, item_fields(serialize(data))?)
            .await?;
        Ok(id.to_string())
    }

    /// Insert `data` and read the stored item back.
    pub async fn insert_and_get(&self, path: &str, data: &Value) -> RefDbResult<Value> {
        let id = self.insert(path, data).await?;
        self.get(path, &id).await
    }

    /// Whether anything is stored at `path`, or at `path/id` when an id is
    /// given.
    pub async fn exists(&self, path: &str, id: Option<&str>) -> RefDbResult<bool> {
        not_null(path, "pathValue")?;

        let mut target = self.config.resolve(path);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            target = target.join(id);
        }
        tracing::debug!("exists {}", target);

        Ok(self.store.read(&target).await?.is_some())
    }

    /// Read and parse the item stored under `id`.
    ///
    /// # Errors
    ///
    /// [`RefDbError::UnknownId`] if nothing is stored there.
    pub async fn get(&self, path: &str, id: &str) -> RefDbResult<Value> {
        not_null(id, "id")?;
        not_null(path, "pathValue")?;

        let target = self.config.resolve(path).join(id);
        tracing::debug!("get {}", target);

        match self.store.read(&target).await? {
            Some(json) => Ok(parse(&Value::from(json))),
            None => Err(RefDbError::UnknownId {
                id: id.to_string(),
                path: target.to_string(),
            }),
        }
    }

    /// Read and parse every item stored directly under `path`, in key order.
    pub async fn get_all(&self, path: &str) -> RefDbResult<Vec<Value>> {
        not_null(path, "pathValue")?;

        let parent = self.config.resolve(path);
        tracing::debug!("get all {}", parent);

        Ok(self
            .store
            .children(&parent)
            .await?
            .into_iter()
            .map(|(_, json)| parse(&Value::from(json)))
            .collect())
    }

    /// Replace the item stored under `id` with `data`.
    ///
    /// The stored `id` property always stays `id`, whatever `data` says.
    ///
    /// # Errors
    ///
    /// [`RefDbError::UnknownId`] if nothing is stored there.
    pub async fn update(&self, path: &str, id: &str, data: &Value) -> RefDbResult<()> {
        not_null(id, "id")?;
        not_null(path, "pathValue")?;
        not_null(data, "data")?;

        self.get(path, id).await?;

        let target = self.config.resolve(path).join(id);
        tracing::debug!("update {}", target);
        self.write_item(&target, id, item_fields(serialize(data))?)
            .await
    }

    /// Update then read the item back.
    pub async fn update_and_get(&self, path: &str, id: &str, data: &Value) -> RefDbResult<Value> {
        self.update(path, id, data).await?;
        self.get(path, id).await
    }

    /// Overwrite some properties of the item stored under `id`.
    ///
    /// Properties not named in `fields` keep their value. A `Null` field
    /// deletes the property. Timestamps at any object depth of `fields` are
    /// stored as date markers.
    ///
    /// # Errors
    ///
    /// [`RefDbError::UnknownId`] if nothing is stored there.
    pub async fn update_fields(&self, path: &str, id: &str, fields: &Value) -> RefDbResult<()> {
        not_null(id, "id")?;
        not_null(path, "pathValue")?;
        not_null(fields, "fields")?;

        let original = self.get(path, id).await?;

        let mut item = item_fields(serialize(&original))?;
        let overlay = item_fields(convert_by_type::<Timestamp, _>(fields, date_marker))
            .map_err(|_| RefDbError::invalid_argument("fields"))?;
        item.extend(overlay);

        let target = self.config.resolve(path).join(id);
        tracing::debug!("update fields {}", target);
        self.write_item(&target, id, item).await
    }

    /// Update some fields then read the item back.
    pub async fn update_fields_and_get(
        &self,
        path: &str,
        id: &str,
        fields: &Value,
    ) -> RefDbResult<Value> {
        self.update_fields(path, id, fields).await?;
        self.get(path, id).await
    }

    /// Delete the item stored under `id`.
    ///
    /// # Errors
    ///
    /// [`RefDbError::UnknownId`] if nothing is stored there.
    pub async fn delete(&self, path: &str, id: &str) -> RefDbResult<()> {
        not_null(id, "id")?;
        not_null(path, "pathValue")?;

        self.get(path, id).await?;

        let target = self.config.resolve(path).join(id);
        tracing::debug!("delete {}", target);
        self.store.remove(&target).await
    }

    /// Delete everything stored at `path`.
    pub async fn delete_all(&self, path: &str) -> RefDbResult<()> {
        not_null(path, "pathValue")?;

        let target = self.config.resolve(path);
        tracing::debug!("delete all {}", target);
        self.store.remove(&target).await
    }

    async fn write_item(&self, target: &RefPath, id: &str, mut item: Map) -> RefDbResult<()> {
        item.insert(ID_FIELD.to_string(), Value::from(id));
        let json: JsonValue = Value::Object(item).into();
        self.store.set(target, json).await
    }
}

/// The properties of a serialized payload; payloads must be objects.
fn item_fields(serialized: Value) -> RefDbResult<Map> {
    match serialized {
        Value::Object(map) => Ok(map),
        _ => Err(RefDbError::invalid_argument("data")),
    }
}
