//! High-level geoDB operations
//!
//! [`GeoDbClient`] wraps the PostgREST transport with the operations
//! callers actually use: collection CRUD, bounded and paginated reads,
//! chunked inserts, and the management RPCs (`/rpc/geodb_*`). Collection
//! names on the wire are namespaced `{database}_{collection}`; the
//! database defaults to the configured one and falls back to the
//! authenticated user (`whoami`).

mod reader;
mod types;

pub use reader::CollectionReader;
pub use types::{
    BboxQuery, CollectionDef, InsertOptions, PgQuery, DEFAULT_INSERT_CHUNK_SIZE,
    MANDATORY_PROPERTIES,
};

use crate::config::GeoDbConfig;
use crate::decode::RowSet;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::CollectionIterator;
use crate::types::{JsonObject, JsonValue};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Media type asking PostgREST for a single object instead of an array
const ACCEPT_OBJECT: (&str, &str) = ("Accept", "application/vnd.pgrst.object+json");

/// Client for a geoDB service
#[derive(Debug, Clone)]
pub struct GeoDbClient {
    http: HttpClient,
    database: Option<String>,
    // SRID per dataset, looked up once and reused across page fetches
    srid_cache: Arc<RwLock<HashMap<String, i32>>>,
    // The authenticated user name, fetched once
    whoami_cache: Arc<RwLock<Option<String>>>,
}

impl GeoDbClient {
    /// Create a client from a configuration
    pub fn new(config: &GeoDbConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::from_config(config)?,
            database: config.database.clone(),
            srid_cache: Arc::new(RwLock::new(HashMap::new())),
            whoami_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a client from `GEODB_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&GeoDbConfig::from_env()?)
    }

    /// The underlying HTTP transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// The configured default database, if any
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    // ------------------------------------------------------------------
    // Identity and metadata
    // ------------------------------------------------------------------

    /// Name of the authenticated user, fetched once and cached
    pub async fn whoami(&self) -> Result<String> {
        if let Some(user) = self.whoami_cache.read().await.as_ref() {
            return Ok(user.clone());
        }

        let mut cached = self.whoami_cache.write().await;
        // Another task may have fetched it while we waited for the lock.
        if let Some(user) = cached.as_ref() {
            return Ok(user.clone());
        }

        let value = self.http.get("/rpc/geodb_whoami").await?;
        let user = value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::decode(format!("expected a user name, got: {value}")))?;
        *cached = Some(user.clone());
        Ok(user)
    }

    /// Storage usage of the authenticated user
    pub async fn get_my_usage(&self) -> Result<JsonValue> {
        let value = self
            .http
            .post_with_headers(
                "/rpc/geodb_get_my_usage",
                &json!({"pretty": true}),
                &[ACCEPT_OBJECT],
            )
            .await?;
        let usage = unwrap_src(value);
        // The procedure wraps the single usage object in an array.
        Ok(match usage {
            JsonValue::Array(mut items) if !items.is_empty() => items.remove(0),
            other => other,
        })
    }

    /// Collections the authenticated user can see in one database,
    /// defaulting to the configured one. Rows carry `owner`, `database`
    /// and `table_name`.
    pub async fn get_my_collections(&self, database: Option<&str>) -> Result<RowSet> {
        let database = self.resolve_database(database).await?;
        let value = self
            .http
            .post_with_headers(
                "/rpc/geodb_get_my_collections",
                &json!({"database": database}),
                &[ACCEPT_OBJECT],
            )
            .await?;
        RowSet::from_json(unwrap_src(value), None)
    }

    /// Access grants the authenticated user has handed out
    pub async fn list_my_grants(&self) -> Result<RowSet> {
        let value = self
            .http
            .post("/rpc/geodb_list_grants", &json!({}))
            .await?;
        RowSet::from_json(unwrap_src(value), None)
    }

    /// Whether a collection exists in the given (or default) database
    pub async fn collection_exists(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<bool> {
        match self.head_collection(collection, database).await {
            Ok(()) => Ok(true),
            Err(Error::CollectionNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Probe a collection without reading any rows; errors with
    /// [`Error::CollectionNotFound`] when it is missing
    pub async fn head_collection(&self, collection: &str, database: Option<&str>) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        match self.http.get(&format!("/{dataset}?limit=0")).await {
            Ok(_) => Ok(()),
            Err(Error::HttpStatus { status: 404, .. }) => {
                Err(Error::collection_not_found(dataset))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a database exists, read from the `geodb_user_databases`
    /// registry collection
    pub async fn database_exists(&self, database: &str) -> Result<bool> {
        let rows = self
            .get_collection(
                "user_databases",
                Some(&format!("name=eq.{database}")),
                Some("geodb"),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Databases the authenticated user owns, read from the
    /// `geodb_user_databases` registry collection
    pub async fn get_my_databases(&self) -> Result<RowSet> {
        let user = self.whoami().await?;
        self.get_collection("user_databases", Some(&format!("owner=eq.{user}")), Some("geodb"))
            .await
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// One bounded read of a collection.
    ///
    /// `query` is an opaque PostgREST query string (filters, `order`,
    /// `limit`, `offset`, ...) appended to the collection path unmodified.
    pub async fn get_collection(
        &self,
        collection: &str,
        query: Option<&str>,
        database: Option<&str>,
    ) -> Result<RowSet> {
        let dataset = self.dataset(collection, database).await?;
        self.fetch_rows(&dataset, query).await
    }

    /// Iterate a collection page by page.
    ///
    /// The returned iterator drives a [`CollectionReader`] bound to the
    /// collection and the base `query`; each step appends `limit` and
    /// `offset` for its window. A `page_size` of 0 falls back to the
    /// default of 10.
    pub async fn iterate_collection(
        &self,
        collection: &str,
        query: Option<&str>,
        page_size: u32,
        database: Option<&str>,
    ) -> Result<CollectionIterator<CollectionReader>> {
        let dataset = self.dataset(collection, database).await?;
        let reader = CollectionReader::new(self.clone(), dataset);
        Ok(CollectionIterator::new(
            reader,
            query.map(str::to_string),
            page_size,
        ))
    }

    /// Read a collection through the `geodb_get_pg` procedure, which
    /// accepts raw SQL fragments for select/where/group/order
    pub async fn get_collection_pg(
        &self,
        collection: &str,
        query: &PgQuery,
        database: Option<&str>,
    ) -> Result<RowSet> {
        if let Some(select) = &query.select {
            reject_injection(select)?;
        }
        let dataset = self.dataset(collection, database).await?;

        let mut payload = json!({"collection": dataset});
        set_if_some(&mut payload, "select", query.select.as_deref());
        set_if_some(&mut payload, "where", query.where_clause.as_deref());
        set_if_some(&mut payload, "group", query.group.as_deref());
        set_if_some(&mut payload, "order", query.order.as_deref());
        if let Some(limit) = query.limit {
            payload["limit"] = json!(limit);
        }
        if let Some(offset) = query.offset {
            payload["offset"] = json!(offset);
        }

        let value = self
            .http
            .post_with_headers("/rpc/geodb_get_pg", &payload, &[ACCEPT_OBJECT])
            .await?;
        let srid = self.collection_srid(&dataset).await?;
        RowSet::from_json(unwrap_src(value), srid)
    }

    /// Read the rows of a collection matching a bounding box through the
    /// `geodb_get_by_bbox` procedure
    pub async fn get_collection_by_bbox(
        &self,
        collection: &str,
        query: &BboxQuery,
        database: Option<&str>,
    ) -> Result<RowSet> {
        let dataset = self.dataset(collection, database).await?;

        let mut payload = json!({
            "collection": dataset,
            "minx": query.minx,
            "miny": query.miny,
            "maxx": query.maxx,
            "maxy": query.maxy,
            "bbox_mode": query.mode.as_str(),
            "bbox_crs": query.crs,
        });
        set_if_some(&mut payload, "where", query.where_clause.as_deref());
        if query.where_clause.is_some() {
            payload["op"] = json!(query.op.as_str());
        }
        if let Some(limit) = query.limit {
            payload["limit"] = json!(limit);
        }
        if let Some(offset) = query.offset {
            payload["offset"] = json!(offset);
        }

        let value = self
            .http
            .post_with_headers("/rpc/geodb_get_by_bbox", &payload, &[ACCEPT_OBJECT])
            .await?;
        let srid = self.collection_srid(&dataset).await?;
        RowSet::from_json(unwrap_src(value), srid)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert rows into a collection, in chunks.
    ///
    /// Geometries are serialized as EWKT in the collection's SRID. A
    /// plain insert strips the `id` column and lets the database assign
    /// ids; an upsert keeps it and merges duplicates.
    pub async fn insert_into_collection(
        &self,
        collection: &str,
        rows: &RowSet,
        options: InsertOptions,
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;

        let collection_srid = self.collection_srid(&dataset).await?;
        if let (Some(given), Some(expected)) = (options.crs, collection_srid) {
            if given != expected {
                return Err(Error::SridMismatch { given, expected });
            }
        }
        let srid = options.crs.or(collection_srid);

        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let mut value = row.to_insert_json(srid)?;
            if !options.upsert {
                if let JsonValue::Object(object) = &mut value {
                    object.remove("id");
                }
            }
            values.push(value);
        }

        let chunk_size = options.effective_chunk_size();
        let path = format!("/{dataset}");
        for chunk in values.chunks(chunk_size) {
            debug!("inserting {} rows into {}", chunk.len(), dataset);
            let payload = JsonValue::Array(chunk.to_vec());
            if options.upsert {
                self.http
                    .post_with_headers(
                        &path,
                        &payload,
                        &[("Prefer", "resolution=merge-duplicates")],
                    )
                    .await?;
            } else {
                self.http.post(&path, &payload).await?;
            }
        }
        info!("inserted {} rows into {}", values.len(), dataset);
        Ok(())
    }

    /// Update the rows matching `query`, setting the given columns.
    /// The `id` column is never updated.
    pub async fn update_collection(
        &self,
        collection: &str,
        values: &JsonObject,
        query: &str,
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        let mut values = values.clone();
        values.remove("id");
        self.http
            .patch(&format!("/{dataset}?{query}"), &JsonValue::Object(values))
            .await?;
        Ok(())
    }

    /// Delete the rows matching `query`
    pub async fn delete_from_collection(
        &self,
        collection: &str,
        query: &str,
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        self.http.delete(&format!("/{dataset}?{query}")).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Collection management
    // ------------------------------------------------------------------

    /// Create one collection
    pub async fn create_collection(
        &self,
        collection: &str,
        def: &CollectionDef,
        database: Option<&str>,
    ) -> Result<()> {
        self.create_collections(&[(collection, def.clone())], database)
            .await
    }

    /// Create several collections in one call
    pub async fn create_collections(
        &self,
        collections: &[(&str, CollectionDef)],
        database: Option<&str>,
    ) -> Result<()> {
        let database = self.resolve_database(database).await?;
        let mut namespaced = serde_json::Map::new();
        for (name, def) in collections {
            namespaced.insert(
                format!("{database}_{name}"),
                serde_json::to_value(def)?,
            );
        }
        self.http
            .post(
                "/rpc/geodb_create_collections",
                &json!({"collections": namespaced}),
            )
            .await?;
        info!("created {} collection(s) in {}", collections.len(), database);
        Ok(())
    }

    /// Create a collection unless it already exists; returns whether it
    /// was created
    pub async fn create_collection_if_not_exists(
        &self,
        collection: &str,
        def: &CollectionDef,
        database: Option<&str>,
    ) -> Result<bool> {
        if self.collection_exists(collection, database).await? {
            return Ok(false);
        }
        self.create_collection(collection, def, database).await?;
        Ok(true)
    }

    /// Create the collections that do not exist yet; returns the names
    /// of those actually created
    pub async fn create_collections_if_not_exist(
        &self,
        collections: &[(&str, CollectionDef)],
        database: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for (name, def) in collections {
            if !self.collection_exists(name, database).await? {
                missing.push((*name, def.clone()));
            }
        }
        if !missing.is_empty() {
            self.create_collections(&missing, database).await?;
        }
        Ok(missing.into_iter().map(|(name, _)| name.to_string()).collect())
    }

    /// Drop one collection
    pub async fn drop_collection(&self, collection: &str, database: Option<&str>) -> Result<()> {
        self.drop_collections(&[collection], database).await
    }

    /// Drop several collections in one call
    pub async fn drop_collections(
        &self,
        collections: &[&str],
        database: Option<&str>,
    ) -> Result<()> {
        let database = self.resolve_database(database).await?;
        let namespaced: Vec<String> = collections
            .iter()
            .map(|name| format!("{database}_{name}"))
            .collect();
        self.http
            .post(
                "/rpc/geodb_drop_collections",
                &json!({"collections": namespaced}),
            )
            .await?;
        self.invalidate_srid_cache(&namespaced).await;
        info!("dropped {} collection(s) from {}", collections.len(), database);
        Ok(())
    }

    /// Move a collection to another database; on the wire this is a
    /// rename across database prefixes
    pub async fn move_collection(
        &self,
        collection: &str,
        new_database: &str,
        database: Option<&str>,
    ) -> Result<()> {
        let database = self.resolve_database(database).await?;
        let dataset = format!("{database}_{collection}");
        self.http
            .post(
                "/rpc/geodb_rename_collection",
                &json!({
                    "collection": dataset,
                    "new_name": format!("{new_database}_{collection}"),
                }),
            )
            .await?;
        self.invalidate_srid_cache(&[dataset]).await;
        Ok(())
    }

    /// Rename a collection within its database
    pub async fn rename_collection(
        &self,
        collection: &str,
        new_name: &str,
        database: Option<&str>,
    ) -> Result<()> {
        let database = self.resolve_database(database).await?;
        let dataset = format!("{database}_{collection}");
        self.http
            .post(
                "/rpc/geodb_rename_collection",
                &json!({
                    "collection": dataset,
                    "new_name": format!("{database}_{new_name}"),
                }),
            )
            .await?;
        self.invalidate_srid_cache(&[dataset]).await;
        Ok(())
    }

    /// Copy a collection, possibly across databases
    pub async fn copy_collection(
        &self,
        collection: &str,
        new_collection: &str,
        database: Option<&str>,
        new_database: Option<&str>,
    ) -> Result<()> {
        let database = self.resolve_database(database).await?;
        let new_database = match new_database {
            Some(db) => db.to_string(),
            None => database.clone(),
        };
        self.http
            .post(
                "/rpc/geodb_copy_collection",
                &json!({
                    "old_collection": format!("{database}_{collection}"),
                    "new_collection": format!("{new_database}_{new_collection}"),
                }),
            )
            .await?;
        Ok(())
    }

    /// Add columns to a collection (column name to PostgreSQL type)
    pub async fn add_properties(
        &self,
        collection: &str,
        properties: &[(&str, &str)],
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        let properties: Vec<JsonValue> = properties
            .iter()
            .map(|(name, pg_type)| json!({"name": name, "type": pg_type}))
            .collect();
        self.http
            .post(
                "/rpc/geodb_add_properties",
                &json!({"collection": dataset, "properties": properties}),
            )
            .await?;
        Ok(())
    }

    /// Columns of a collection; rows carry `table_name`, `column_name`
    /// and `data_type`
    pub async fn get_properties(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<RowSet> {
        let dataset = self.dataset(collection, database).await?;
        let value = self
            .http
            .post("/rpc/geodb_get_properties", &json!({"collection": dataset}))
            .await?;
        RowSet::from_json(unwrap_src(value), None)
    }

    /// Drop columns from a collection; the mandatory columns are refused
    pub async fn drop_properties(
        &self,
        collection: &str,
        properties: &[&str],
        database: Option<&str>,
    ) -> Result<()> {
        for property in properties {
            if MANDATORY_PROPERTIES.contains(property) {
                return Err(Error::MandatoryProperty {
                    property: (*property).to_string(),
                });
            }
        }
        let dataset = self.dataset(collection, database).await?;
        self.http
            .post(
                "/rpc/geodb_drop_properties",
                &json!({"collection": dataset, "properties": properties}),
            )
            .await?;
        Ok(())
    }

    /// Grant read access on a collection to another user
    pub async fn grant_access_to_collection(
        &self,
        collection: &str,
        user: &str,
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        self.http
            .post(
                "/rpc/geodb_grant_access_to_collection",
                &json!({"collection": dataset, "usr": user}),
            )
            .await?;
        Ok(())
    }

    /// Revoke read access on a collection from another user
    pub async fn revoke_access_from_collection(
        &self,
        collection: &str,
        user: &str,
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        self.http
            .post(
                "/rpc/geodb_revoke_access_from_collection",
                &json!({"collection": dataset, "usr": user}),
            )
            .await?;
        Ok(())
    }

    /// Make a collection readable by everyone
    pub async fn publish_collection(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<()> {
        self.grant_access_to_collection(collection, "public", database)
            .await
    }

    /// Withdraw public read access from a collection
    pub async fn unpublish_collection(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<()> {
        self.revoke_access_from_collection(collection, "public", database)
            .await
    }

    // ------------------------------------------------------------------
    // Database management
    // ------------------------------------------------------------------

    /// Create a database (a namespace for collections)
    pub async fn create_database(&self, database: &str) -> Result<()> {
        self.http
            .post("/rpc/geodb_create_database", &json!({"database": database}))
            .await?;
        Ok(())
    }

    /// Drop all collections of a database
    pub async fn truncate_database(&self, database: &str) -> Result<()> {
        self.http
            .post(
                "/rpc/geodb_truncate_database",
                &json!({"database": database}),
            )
            .await?;
        self.srid_cache.write().await.clear();
        Ok(())
    }

    // ------------------------------------------------------------------
    // SRID
    // ------------------------------------------------------------------

    /// SRID of a collection's geometry column, `None` when the service
    /// does not know one
    pub async fn get_collection_srid(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<Option<i32>> {
        let dataset = self.dataset(collection, database).await?;
        self.collection_srid(&dataset).await
    }

    /// Change the SRID of a collection's geometry column
    pub async fn set_collection_srid(
        &self,
        collection: &str,
        srid: i32,
        database: Option<&str>,
    ) -> Result<()> {
        let dataset = self.dataset(collection, database).await?;
        self.http
            .post(
                "/rpc/geodb_set_collection_srid",
                &json!({"collection": dataset, "srid": srid}),
            )
            .await?;
        self.srid_cache.write().await.remove(&dataset);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Run one bounded read against a namespaced dataset and decode the
    /// page, resolving the SRID through the cache
    pub(crate) async fn fetch_rows(&self, dataset: &str, query: Option<&str>) -> Result<RowSet> {
        let path = match query {
            Some(query) => format!("/{dataset}?{query}"),
            None => format!("/{dataset}"),
        };
        let value = self.http.get(&path).await?;
        let srid = self.collection_srid(dataset).await?;
        RowSet::from_json(value, srid)
    }

    /// The namespaced `{database}_{collection}` wire name
    async fn dataset(&self, collection: &str, database: Option<&str>) -> Result<String> {
        let database = self.resolve_database(database).await?;
        Ok(format!("{database}_{collection}"))
    }

    /// Explicit database, else the configured one, else the user name
    async fn resolve_database(&self, database: Option<&str>) -> Result<String> {
        if let Some(database) = database {
            return Ok(database.to_string());
        }
        if let Some(database) = &self.database {
            return Ok(database.clone());
        }
        self.whoami().await
    }

    /// SRID lookup with a per-dataset cache. An unanswered lookup (any
    /// error status) means the SRID is simply unknown, not a failure.
    async fn collection_srid(&self, dataset: &str) -> Result<Option<i32>> {
        if let Some(srid) = self.srid_cache.read().await.get(dataset) {
            return Ok(Some(*srid));
        }

        let value = match self
            .http
            .get(&format!("/rpc/geodb_get_collection_srid?collection={dataset}"))
            .await
        {
            Ok(value) => value,
            Err(Error::HttpStatus { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let srid = first_row(unwrap_src(value))
            .and_then(|row| row.get("srid").and_then(JsonValue::as_i64))
            .map(|srid| srid as i32);

        if let Some(srid) = srid {
            self.srid_cache.write().await.insert(dataset.to_string(), srid);
        }
        Ok(srid)
    }

    async fn invalidate_srid_cache(&self, datasets: &[String]) {
        let mut cache = self.srid_cache.write().await;
        for dataset in datasets {
            cache.remove(dataset);
        }
    }
}

/// Unwrap the `[{"src": ...}]` / `{"src": ...}` envelope some stored
/// procedures put around their payload
fn unwrap_src(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(mut object) => match object.remove("src") {
            Some(src) => src,
            None => JsonValue::Object(object),
        },
        JsonValue::Array(mut items) if items.len() == 1 => {
            if let JsonValue::Object(object) = &mut items[0] {
                if let Some(src) = object.remove("src") {
                    return src;
                }
            }
            JsonValue::Array(items)
        }
        other => other,
    }
}

/// Refuse a select fragment carrying DDL/DML keywords before it
/// reaches the `geodb_get_pg` procedure
fn reject_injection(select: &str) -> Result<()> {
    const FORBIDDEN: [&str; 5] = ["update", "delete", "drop", "create", "function"];
    let lowered = select.to_lowercase();
    if FORBIDDEN.iter().any(|keyword| lowered.contains(keyword)) {
        return Err(Error::config(format!(
            "select fragment refused, it contains a forbidden keyword: {select}"
        )));
    }
    Ok(())
}

fn first_row(value: JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Array(mut items) if !items.is_empty() => Some(items.remove(0)),
        JsonValue::Object(_) => Some(value),
        _ => None,
    }
}

fn set_if_some(payload: &mut JsonValue, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        payload[key] = json!(value);
    }
}

#[cfg(test)]
mod tests;
