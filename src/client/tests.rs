//! Tests for the high-level client

use super::*;
use crate::config::GeoDbConfig;
use crate::decode::{Row, RowSet};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// POINT(1 2) as EWKB with SRID=4326
const POINT_EWKB_HEX: &str = "0101000020E6100000000000000000F03F0000000000000040";

fn client_for(server: &MockServer) -> GeoDbClient {
    let config = GeoDbConfig::builder()
        .server_url(server.uri())
        .database("my_db")
        .access_token("test-token")
        .max_retries(0)
        .build();
    GeoDbClient::new(&config).unwrap()
}

async fn mount_srid(server: &MockServer, dataset: &str, srid: i64) {
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_get_collection_srid"))
        .and(query_param("collection", dataset))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"src": [{"srid": srid}]}])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_whoami() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("geodb_user")))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).whoami().await.unwrap(), "geodb_user");
}

#[tokio::test]
async fn test_database_falls_back_to_whoami() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("geodb_user")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geodb_user_land_use"))
        .and(query_param("limit", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // No configured database on this client.
    let config = GeoDbConfig::builder()
        .server_url(server.uri())
        .access_token("test-token")
        .build();
    let client = GeoDbClient::new(&config).unwrap();
    client.head_collection("land_use", None).await.unwrap();
}

#[tokio::test]
async fn test_collection_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/my_db_missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"message":"relation does not exist"}"#),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.collection_exists("land_use", None).await.unwrap());
    assert!(!client.collection_exists("missing", None).await.unwrap());
}

#[tokio::test]
async fn test_get_collection_decodes_geometry_and_caches_srid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "raba_id": 1410, "geometry": POINT_EWKB_HEX},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_get_collection_srid"))
        .and(query_param("collection", "my_db_land_use"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"src": [{"srid": 4326}]}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.get_collection("land_use", None, None).await.unwrap();
    let second = client.get_collection("land_use", None, None).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first.srid(), Some(4326));
    assert!(first.rows()[0].geometry.is_some());
    // The second read answers the SRID from the cache.
    assert_eq!(second.srid(), Some(4326));
}

#[tokio::test]
async fn test_get_collection_passes_query_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .and(query_param("raba_id", "eq.1410"))
        .and(query_param("order", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_get_collection_srid"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let rows = client_for(&server)
        .get_collection("land_use", Some("raba_id=eq.1410&order=id"), None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    // Unknown SRID is not an error.
    assert_eq!(rows.srid(), None);
}

#[tokio::test]
async fn test_iterate_collection_pages_through_everything() {
    let server = MockServer::start().await;
    let page = |ids: Vec<u64>| {
        json!(ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>())
    };

    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![1, 2])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .and(query_param("offset", "2"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![3])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .and(query_param("offset", "4"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_get_collection_srid"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut iterator = client
        .iterate_collection("land_use", None, 2, None)
        .await
        .unwrap();
    assert_eq!(iterator.fetcher().dataset(), "my_db_land_use");

    let pages: Vec<RowSet> = iterator.pages().try_collect().await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].len(), 2);
    assert_eq!(pages[1].len(), 1);
}

#[tokio::test]
async fn test_head_collection_maps_missing_to_collection_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my_db_missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"message":"relation does not exist"}"#),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .head_collection("missing", None)
        .await
        .unwrap_err();
    match err {
        Error::CollectionNotFound { collection } => {
            assert_eq!(collection, "my_db_missing");
        }
        other => panic!("expected CollectionNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_head_collection_keeps_other_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my_db_forbidden"))
        .respond_with(ResponseTemplate::new(401).set_body_string("no grants"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.head_collection("forbidden", None).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
    // And collection_exists does not mistake it for a missing collection.
    assert!(client.collection_exists("forbidden", None).await.is_err());
}

#[tokio::test]
async fn test_whoami_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("geodb_user")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geodb_user_land_use"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // No configured database: both reads resolve it through whoami, but
    // only the first one goes over the wire.
    let config = GeoDbConfig::builder()
        .server_url(server.uri())
        .access_token("test-token")
        .build();
    let client = GeoDbClient::new(&config).unwrap();
    client.head_collection("land_use", None).await.unwrap();
    client.head_collection("land_use", None).await.unwrap();
}

#[tokio::test]
async fn test_get_collection_pg_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_get_pg"))
        .and(header("Accept", "application/vnd.pgrst.object+json"))
        .and(body_json(json!({
            "collection": "my_db_land_use",
            "select": "raba_id, count(*) as cnt",
            "group": "raba_id",
            "limit": 5,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"src": [{"raba_id": 1410, "cnt": 2}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_get_collection_srid"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let query = PgQuery::all()
        .select("raba_id, count(*) as cnt")
        .group("raba_id")
        .limit(5);
    let rows = client_for(&server)
        .get_collection_pg("land_use", &query, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.rows()[0].get("cnt"), Some(&json!(2)));
}

#[tokio::test]
async fn test_get_collection_by_bbox_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_get_by_bbox"))
        .and(body_json(json!({
            "collection": "my_db_land_use",
            "minx": 452750.0,
            "miny": 88909.5,
            "maxx": 464000.0,
            "maxy": 102486.0,
            "bbox_mode": "contains",
            "bbox_crs": 3794,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "src": [{"id": 1, "geometry": POINT_EWKB_HEX}],
            })),
        )
        .mount(&server)
        .await;
    mount_srid(&server, "my_db_land_use", 3794).await;

    let query = BboxQuery::new(452750.0, 88909.5, 464000.0, 102486.0).crs(3794);
    let rows = client_for(&server)
        .get_collection_by_bbox("land_use", &query, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.srid(), Some(3794));
    assert!(rows.rows()[0].geometry.is_some());
}

#[tokio::test]
async fn test_insert_chunks_and_strips_id() {
    let server = MockServer::start().await;
    mount_srid(&server, "my_db_land_use", 4326).await;

    // Three rows at chunk size two: a chunk of two POSTs, then one.
    Mock::given(method("POST"))
        .and(path("/my_db_land_use"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let rows: Vec<Row> = (1..=3)
        .map(|id| {
            Row::from_json(json!({"id": id, "raba_id": 1410, "geometry": POINT_EWKB_HEX}))
                .unwrap()
        })
        .collect();
    let rows = RowSet::new(rows, Some(4326));

    let options = InsertOptions {
        chunk_size: 2,
        ..InsertOptions::default()
    };
    client_for(&server)
        .insert_into_collection("land_use", &rows, options, None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<JsonValue> = requests
        .iter()
        .filter(|r| r.url.path() == "/my_db_land_use")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].as_array().unwrap().len(), 2);
    assert_eq!(bodies[1].as_array().unwrap().len(), 1);
    // A plain insert never sends ids; geometries go out as EWKT.
    for row in bodies.iter().flat_map(|b| b.as_array().unwrap()) {
        assert!(row.get("id").is_none());
        assert!(row["geometry"].as_str().unwrap().starts_with("SRID=4326;"));
    }
}

#[tokio::test]
async fn test_upsert_keeps_id_and_merges_duplicates() {
    let server = MockServer::start().await;
    mount_srid(&server, "my_db_land_use", 4326).await;
    Mock::given(method("POST"))
        .and(path("/my_db_land_use"))
        .and(header("Prefer", "resolution=merge-duplicates"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = RowSet::new(
        vec![Row::from_json(json!({"id": 5, "raba_id": 1410})).unwrap()],
        None,
    );
    client_for(&server)
        .insert_into_collection("land_use", &rows, InsertOptions::upsert(), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: JsonValue = requests
        .iter()
        .find(|r| r.url.path() == "/my_db_land_use")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .unwrap();
    assert_eq!(body[0]["id"], json!(5));
}

#[tokio::test]
async fn test_insert_rejects_mismatched_crs() {
    let server = MockServer::start().await;
    mount_srid(&server, "my_db_land_use", 4326).await;

    let rows = RowSet::new(
        vec![Row::from_json(json!({"raba_id": 1})).unwrap()],
        None,
    );
    let options = InsertOptions {
        crs: Some(3794),
        ..InsertOptions::default()
    };
    let err = client_for(&server)
        .insert_into_collection("land_use", &rows, options, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::SridMismatch {
            given: 3794,
            expected: 4326,
        }
    ));
}

#[tokio::test]
async fn test_update_drops_id_and_targets_query() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/my_db_land_use"))
        .and(query_param("id", "eq.7"))
        .and(body_json(json!({"raba_id": 99})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let JsonValue::Object(values) = json!({"id": 1, "raba_id": 99}) else {
        unreachable!()
    };
    client_for(&server)
        .update_collection("land_use", &values, "id=eq.7", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_targets_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/my_db_land_use"))
        .and(query_param("raba_id", "eq.1410"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_from_collection("land_use", "raba_id=eq.1410", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_collections_namespaces_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_create_collections"))
        .and(body_json(json!({
            "collections": {
                "my_db_land_use": {
                    "crs": 3794,
                    "properties": {"raba_id": "integer"},
                },
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let def = CollectionDef::new(3794).property("raba_id", "integer");
    client_for(&server)
        .create_collection("land_use", &def, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_if_not_exists_skips_existing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/my_db_land_use"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let def = CollectionDef::new(4326);
    let created = client_for(&server)
        .create_collection_if_not_exists("land_use", &def, None)
        .await
        .unwrap();
    assert!(!created);
    // No create RPC was issued; the only requests were the existence probe.
    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| r.url.path() != "/rpc/geodb_create_collections"));
}

#[tokio::test]
async fn test_drop_properties_refuses_mandatory_columns() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .drop_properties("land_use", &["raba_id", "geometry"], None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MandatoryProperty { .. }));
    // Refused before anything went over the wire.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_move_collection_renames_across_databases() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_rename_collection"))
        .and(body_json(json!({
            "collection": "my_db_land_use",
            "new_name": "other_db_land_use",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .move_collection("land_use", "other_db", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_properties_lists_columns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_get_properties"))
        .and(body_json(json!({"collection": "my_db_land_use"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "src": [
                {"table_name": "my_db_land_use", "column_name": "id", "data_type": "integer"},
                {"table_name": "my_db_land_use", "column_name": "raba_id", "data_type": "integer"},
            ],
        }])))
        .mount(&server)
        .await;

    let properties = client_for(&server)
        .get_properties("land_use", None)
        .await
        .unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(
        properties.rows()[1].get("column_name"),
        Some(&json!("raba_id"))
    );
}

#[tokio::test]
async fn test_list_my_grants() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_list_grants"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "src": [{"collection": "my_db_land_use", "grantee": "someone"}],
        }])))
        .mount(&server)
        .await;

    let grants = client_for(&server).list_my_grants().await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants.rows()[0].get("grantee"), Some(&json!("someone")));
}

#[tokio::test]
async fn test_list_my_grants_empty() {
    let server = MockServer::start().await;
    // The procedure answers a null src when nothing has been granted.
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_list_grants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"src": null}])))
        .mount(&server)
        .await;

    let grants = client_for(&server).list_my_grants().await.unwrap();
    assert!(grants.is_empty());
}

#[tokio::test]
async fn test_get_collection_pg_rejects_ddl_in_select() {
    let server = MockServer::start().await;

    let client = client_for(&server);
    for select in [
        "*; DROP TABLE my_db_land_use",
        "id, delete_me",
        "CREATE FUNCTION f()",
    ] {
        let query = PgQuery::all().select(select);
        let err = client
            .get_collection_pg("land_use", &query, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
    // Refused before anything went over the wire.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_grants_to_public() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_grant_access_to_collection"))
        .and(body_json(json!({
            "collection": "my_db_land_use",
            "usr": "public",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .publish_collection("land_use", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_database_exists_reads_the_registry_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geodb_user_databases"))
        .and(query_param("name", "eq.my_db"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"name": "my_db", "owner": "geodb_user"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geodb_user_databases"))
        .and(query_param("name", "eq.missing_db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.database_exists("my_db").await.unwrap());
    assert!(!client.database_exists("missing_db").await.unwrap());
}

#[tokio::test]
async fn test_get_my_databases_filters_by_owner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("geodb_user")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geodb_user_databases"))
        .and(query_param("owner", "eq.geodb_user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "my_db", "owner": "geodb_user"},
            {"name": "scratch", "owner": "geodb_user"},
        ])))
        .mount(&server)
        .await;

    let databases = client_for(&server).get_my_databases().await.unwrap();
    assert_eq!(databases.len(), 2);
    assert_eq!(databases.rows()[0].get("name"), Some(&json!("my_db")));
}

#[tokio::test]
async fn test_get_my_collections_sends_the_default_database() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_get_my_collections"))
        .and(body_json(json!({"database": "my_db"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "src": [{"owner": "geodb_user", "database": "my_db", "table_name": "land_use"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    // No explicit database: the configured default is resolved and sent.
    let collections = client_for(&server).get_my_collections(None).await.unwrap();
    assert_eq!(collections.len(), 1);
}

#[tokio::test]
async fn test_get_my_usage_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_get_my_usage"))
        .and(body_json(json!({"pretty": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"src": [{"usage": "108 kB"}]})),
        )
        .mount(&server)
        .await;

    let usage = client_for(&server).get_my_usage().await.unwrap();
    assert_eq!(usage, json!({"usage": "108 kB"}));
}

#[tokio::test]
async fn test_set_collection_srid_invalidates_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/geodb_get_collection_srid"))
        .and(query_param("collection", "my_db_land_use"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"src": [{"srid": 4326}]}])),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/geodb_set_collection_srid"))
        .and(body_json(json!({"collection": "my_db_land_use", "srid": 3794})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.get_collection_srid("land_use", None).await.unwrap(),
        Some(4326)
    );
    client
        .set_collection_srid("land_use", 3794, None)
        .await
        .unwrap();
    // The cache entry is gone, so this asks the service again.
    client.get_collection_srid("land_use", None).await.unwrap();
}

#[test]
fn test_unwrap_src_envelopes() {
    assert_eq!(
        unwrap_src(json!([{"src": [{"id": 1}]}])),
        json!([{"id": 1}])
    );
    assert_eq!(unwrap_src(json!({"src": [{"id": 1}]})), json!([{"id": 1}]));
    // Payloads without the envelope pass through untouched.
    assert_eq!(unwrap_src(json!([{"id": 1}, {"id": 2}])), json!([{"id": 1}, {"id": 2}]));
    assert_eq!(unwrap_src(json!("geodb_user")), json!("geodb_user"));
}

#[test]
fn test_insert_options_chunk_size_default() {
    assert_eq!(
        InsertOptions::default().effective_chunk_size(),
        DEFAULT_INSERT_CHUNK_SIZE
    );
    let options = InsertOptions {
        chunk_size: 7,
        ..InsertOptions::default()
    };
    assert_eq!(options.effective_chunk_size(), 7);
}
