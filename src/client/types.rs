//! Request option types for [`GeoDbClient`](super::GeoDbClient) operations

use crate::types::{BboxMode, FilterOp};
use serde::Serialize;
use std::collections::BTreeMap;

/// Columns every collection carries and that can never be dropped
pub const MANDATORY_PROPERTIES: [&str; 4] = ["id", "geometry", "created_at", "modified_at"];

/// Rows per POST when inserting large batches
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 1000;

/// Definition of a new collection: its CRS and its extra columns
/// (column name to PostgreSQL type). The mandatory columns are added
/// by the service and must not appear here.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionDef {
    /// SRID of the geometry column
    pub crs: i32,
    /// Extra columns, name to PostgreSQL type
    pub properties: BTreeMap<String, String>,
}

impl CollectionDef {
    /// Define a collection with the given CRS and no extra columns
    pub fn new(crs: i32) -> Self {
        Self {
            crs,
            properties: BTreeMap::new(),
        }
    }

    /// Add a column to the definition
    pub fn property(mut self, name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.properties.insert(name.into(), pg_type.into());
        self
    }
}

/// Options for [`insert_into_collection`](super::GeoDbClient::insert_into_collection)
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOptions {
    /// Merge duplicate keys instead of failing on them; also keeps the
    /// `id` column, which a plain insert strips
    pub upsert: bool,
    /// SRID the supplied geometries are in; must match the collection's
    /// SRID when the collection has one
    pub crs: Option<i32>,
    /// Rows per POST, 0 falls back to [`DEFAULT_INSERT_CHUNK_SIZE`]
    pub chunk_size: usize,
}

impl InsertOptions {
    /// Plain insert with merge-duplicates enabled
    pub fn upsert() -> Self {
        Self {
            upsert: true,
            ..Self::default()
        }
    }

    pub(super) fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            DEFAULT_INSERT_CHUNK_SIZE
        } else {
            self.chunk_size
        }
    }
}

/// Query options for the `geodb_get_pg` stored procedure, the
/// SQL-fragment flavor of reading a collection
#[derive(Debug, Clone, Default)]
pub struct PgQuery {
    /// Columns to select, `None` selects everything
    pub select: Option<String>,
    /// SQL `WHERE` fragment
    pub where_clause: Option<String>,
    /// SQL `GROUP BY` fragment
    pub group: Option<String>,
    /// SQL `ORDER BY` fragment
    pub order: Option<String>,
    /// Maximum number of rows
    pub limit: Option<u64>,
    /// Number of rows to skip
    pub offset: Option<u64>,
}

impl PgQuery {
    /// Select everything, no filters
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the selected columns
    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    /// Set the `WHERE` fragment
    pub fn where_clause(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    /// Set the `GROUP BY` fragment
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the `ORDER BY` fragment
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Set the row limit
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row offset
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Query options for the `geodb_get_by_bbox` stored procedure
#[derive(Debug, Clone)]
pub struct BboxQuery {
    /// Left bound
    pub minx: f64,
    /// Lower bound
    pub miny: f64,
    /// Right bound
    pub maxx: f64,
    /// Upper bound
    pub maxy: f64,
    /// How geometries are matched against the box
    pub mode: BboxMode,
    /// CRS the box coordinates are in
    pub crs: i32,
    /// Extra `WHERE` fragment combined with the bbox condition
    pub where_clause: Option<String>,
    /// Combinator between the bbox condition and the `WHERE` fragment
    pub op: FilterOp,
    /// Maximum number of rows
    pub limit: Option<u64>,
    /// Number of rows to skip
    pub offset: Option<u64>,
}

impl BboxQuery {
    /// Query a box given as (minx, miny, maxx, maxy) in EPSG:4326
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
            mode: BboxMode::default(),
            crs: 4326,
            where_clause: None,
            op: FilterOp::default(),
            limit: None,
            offset: None,
        }
    }

    /// Set the comparison mode
    pub fn mode(mut self, mode: BboxMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the CRS of the box coordinates
    pub fn crs(mut self, crs: i32) -> Self {
        self.crs = crs;
        self
    }

    /// Set the extra `WHERE` fragment
    pub fn where_clause(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    /// Set the filter combinator
    pub fn op(mut self, op: FilterOp) -> Self {
        self.op = op;
        self
    }

    /// Set the row limit
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row offset
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}
