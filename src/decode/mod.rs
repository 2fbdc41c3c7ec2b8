//! Page payload conversion
//!
//! PostgREST hands back collections as JSON arrays of row objects, with the
//! reserved `geometry` column carried as a hex-encoded (E)WKB string. This
//! module turns such a payload into a [`RowSet`] of [`Row`]s with the
//! geometry decoded exactly once, before anything downstream (the paginated
//! iterator in particular) ever sees the page. The reverse direction,
//! EWKT encoding for inserts, lives here too.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use geo_types::Geometry;
use geozero::wkb::Ewkb;
use geozero::{ToGeo, ToWkt};

/// Name of the reserved geometry column
pub const GEOMETRY_COLUMN: &str = "geometry";

/// One row of a collection: plain columns plus the decoded geometry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// All non-geometry columns, keyed by column name
    pub properties: JsonObject,
    /// The decoded geometry column, when the collection has one
    pub geometry: Option<Geometry<f64>>,
}

impl Row {
    /// Create a row from plain columns and an optional geometry
    pub fn new(properties: JsonObject, geometry: Option<Geometry<f64>>) -> Self {
        Self {
            properties,
            geometry,
        }
    }

    /// Look up a non-geometry column by name
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.properties.get(column)
    }

    /// Build a row from one PostgREST result object, decoding the
    /// geometry column from hex-encoded (E)WKB when present.
    pub fn from_json(value: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut properties) = value else {
            return Err(Error::decode(format!(
                "expected a row object, got: {value}"
            )));
        };

        let geometry = match properties.remove(GEOMETRY_COLUMN) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(hex_wkb)) => Some(decode_hex_ewkb(&hex_wkb)?),
            Some(other) => {
                return Err(Error::decode(format!(
                    "geometry column must be a hex WKB string, got: {other}"
                )));
            }
        };

        Ok(Self {
            properties,
            geometry,
        })
    }

    /// Serialize the row for an insert, encoding the geometry as EWKT
    /// (`SRID=n;...`) the way the database expects it.
    pub fn to_insert_json(&self, srid: Option<i32>) -> Result<JsonValue> {
        let mut object = self.properties.clone();
        if let Some(geometry) = &self.geometry {
            object.insert(
                GEOMETRY_COLUMN.to_string(),
                JsonValue::String(geometry_to_ewkt(geometry, srid)?),
            );
        }
        Ok(JsonValue::Object(object))
    }
}

/// An ordered page of rows, the tabular unit the iterator yields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    rows: Vec<Row>,
    srid: Option<i32>,
}

impl RowSet {
    /// Create a row set from decoded rows
    pub fn new(rows: Vec<Row>, srid: Option<i32>) -> Self {
        Self { rows, srid }
    }

    /// Decode a PostgREST JSON array into a row set.
    ///
    /// `null` decodes as an empty set (some RPCs answer that way for an
    /// empty result); anything other than an array or `null` is an error,
    /// never an empty page.
    pub fn from_json(value: JsonValue, srid: Option<i32>) -> Result<Self> {
        let rows = match value {
            JsonValue::Null => Vec::new(),
            JsonValue::Array(values) => values
                .into_iter()
                .map(Row::from_json)
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(Error::decode(format!(
                    "expected an array of rows, got: {other}"
                )));
            }
        };
        Ok(Self { rows, srid })
    }

    /// Number of rows in this page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether this page has no rows (the exhaustion signal)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows of this page, in server order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the page into its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// SRID of the geometry column, when known
    pub fn srid(&self) -> Option<i32> {
        self.srid
    }

    /// Iterate over the rows
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Decode a hex-encoded (E)WKB string into a geometry.
///
/// PostGIS emits EWKB with the SRID flag set; plain WKB decodes the same
/// way, the reader handles both.
pub fn decode_hex_ewkb(hex_wkb: &str) -> Result<Geometry<f64>> {
    let bytes = hex::decode(hex_wkb)
        .map_err(|e| Error::geometry(format!("invalid hex encoding: {e}")))?;
    Ewkb(bytes)
        .to_geo()
        .map_err(|e| Error::geometry(format!("invalid WKB payload: {e}")))
}

/// Encode a geometry as EWKT (`SRID=n;WKT`), the representation the
/// database accepts on insert.
pub fn geometry_to_ewkt(geometry: &Geometry<f64>, srid: Option<i32>) -> Result<String> {
    geometry
        .to_ewkt(srid)
        .map_err(|e| Error::geometry(format!("WKT encoding failed: {e}")))
}
