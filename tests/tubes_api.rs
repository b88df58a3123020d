mod common;

use std::collections::HashSet;

use axum::http::{header, Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;
use dna_sample_manager::models::tube::TubeStatus;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// 1 indivíduo, 1 amostra, 1 caixa 3x3 e tubos cobrindo os quatro status.
async fn seeded() -> (TestApp, i64, i64) {
    let app = TestApp::spawn().await;
    let individual = app.individual("IND-001", "FAM-1", &["EPI"]).await;
    let sample = app.sample("S-001", individual, "DNA").await;
    let box_id = app.storage_box("Boîte A", 3, 3).await;

    let volumes: [(Option<f64>, Option<f64>); 8] = [
        (Some(30.0), Some(100.0)), // Available
        (Some(24.0), Some(100.0)), // Low
        (Some(9.99), Some(100.0)), // Critical
        (Some(0.0), Some(100.0)),  // Empty
        (None, None),              // Empty
        (Some(80.0), None),        // Available
        (Some(5.0), None),         // Critical
        (Some(20.0), Some(90.0)),  // Low
    ];

    // Os quatro primeiros ficam na caixa: A1, A2, A3, B1
    let slots = [(1, 1), (1, 2), (1, 3), (2, 1)];

    for (i, (current, initial)) in volumes.iter().enumerate() {
        let mut payload = json!({
            "barcode": format!("T-{:03}", 8 - i),
            "sample_id": sample,
            "current_volume": current,
            "initial_volume": initial,
        });
        if let Some((row, col)) = slots.get(i) {
            payload["box_id"] = json!(box_id);
            payload["position_row"] = json!(row);
            payload["position_col"] = json!(col);
        }
        app.tube_id(payload).await;
    }

    (app, sample, box_id)
}

fn ids(page: &Value) -> Vec<i64> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

fn barcodes(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["barcode"].as_str().unwrap().to_string())
        .collect()
}

async fn all_pages(app: &TestApp, query: &str, limit: i64) -> Vec<Value> {
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let (status, body) = app
            .get(&format!("/api/tubes?{query}&page={page}&limit={limit}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        items.extend(body["items"].as_array().unwrap().iter().cloned());
        if page >= body["pages"].as_i64().unwrap() {
            break;
        }
        page += 1;
    }
    items
}

fn tsv_rows(bytes: &[u8]) -> Vec<Vec<String>> {
    assert!(bytes.starts_with(BOM));
    let text = std::str::from_utf8(&bytes[BOM.len()..]).unwrap();
    text.lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn status_filter_agrees_with_computed_status() {
    let (app, _, _) = seeded().await;

    let mut seen = 0;
    for status in TubeStatus::ALL {
        let (code, body) = app
            .get(&format!("/api/tubes?status={}&limit=5000", status.as_str()))
            .await;
        assert_eq!(code, StatusCode::OK);

        for tube in body["items"].as_array().unwrap() {
            assert_eq!(tube["status"], status.as_str(), "{tube}");
            let expected = TubeStatus::classify(
                tube["current_volume"].as_f64(),
                tube["initial_volume"].as_f64(),
            );
            assert_eq!(expected, status);
        }
        assert_eq!(body["total"].as_i64().unwrap(), body["items"].as_array().unwrap().len() as i64);
        seen += body["total"].as_i64().unwrap();
    }

    assert_eq!(seen, 8);

    let (_, critical) = app.get("/api/tubes?status=critical").await;
    assert_eq!(critical["total"], 2);
    let (_, empty) = app.get("/api/tubes?status=Empty").await;
    assert_eq!(empty["total"], 2);
}

#[tokio::test]
async fn listing_is_ordered_by_barcode_and_pages_concatenate() {
    let (app, _, _) = seeded().await;

    let (_, unpaged) = app.get("/api/tubes?limit=5000").await;
    let all = barcodes(&unpaged);
    let mut sorted = all.clone();
    sorted.sort();
    assert_eq!(all, sorted);
    assert_eq!(unpaged["total"], 8);

    let paged = all_pages(&app, "", 3).await;
    let paged: Vec<String> = paged
        .iter()
        .map(|t| t["barcode"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(paged, all);
    assert_eq!(paged.iter().collect::<HashSet<_>>().len(), 8);
}

#[tokio::test]
async fn export_rows_match_listing_for_the_same_filter() {
    let (app, _, box_id) = seeded().await;

    for query in [
        String::new(),
        format!("box={box_id}"),
        "status=Low".to_string(),
        "search=IND-001".to_string(),
        "search=T-00&status=Available".to_string(),
    ] {
        let listed: Vec<String> = all_pages(&app, &query, 2)
            .await
            .iter()
            .map(|t| t["barcode"].as_str().unwrap().to_string())
            .collect();

        let (status, _, bytes) = app
            .raw(Method::GET, &format!("/api/tubes/export?{query}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let rows = tsv_rows(&bytes);
        let exported: Vec<String> = rows[1..].iter().map(|r| r[0].clone()).collect();
        assert_eq!(exported, listed, "filtro: {query}");
    }
}

#[tokio::test]
async fn tsv_export_has_headers_bom_and_non_ascii() {
    let app = TestApp::spawn().await;
    let individual = app.individual("IND-Ø", "FAM-é", &[]).await;
    let sample = app.sample("ÉCH-1", individual, "ARN").await;
    app.tube_id(json!({ "barcode": "TUBE-µ-1", "sample_id": sample, "current_volume": 0.0, "notes": "réservé" }))
        .await;

    let (status, headers, bytes) = app.raw(Method::GET, "/api/tubes/export?format=tsv", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/tab-separated-values"));
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"tubes_export_"));
    assert!(disposition.ends_with(".tsv\""));

    let rows = tsv_rows(&bytes);
    assert_eq!(rows[0][0], "Barcode");
    assert_eq!(rows[0][1], "Code Échantillon");
    assert_eq!(rows[0].len(), 14);

    let row = &rows[1];
    assert_eq!(row[0], "TUBE-µ-1");
    assert_eq!(row[1], "ÉCH-1");
    assert_eq!(row[2], "IND-Ø");
    assert_eq!(row[9], "0");
    assert_eq!(row[12], "Empty");
    assert_eq!(row[13], "réservé");
}

#[tokio::test]
async fn xlsx_export_and_unknown_format() {
    let (app, _, _) = seeded().await;

    let (status, headers, bytes) = app.raw(Method::GET, "/api/tubes/export?format=xlsx", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"PK"));
    assert!(bytes
        .windows(b"xl/worksheets/sheet1.xml".len())
        .any(|w| w == b"xl/worksheets/sheet1.xml"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with(".xlsx\""));

    let (status, body) = app.get("/api/tubes/export?format=pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pdf"));
}

#[tokio::test]
async fn malformed_query_parameters_never_fail() {
    let (app, _, _) = seeded().await;

    for query in [
        "page=abc&limit=xyz",
        "page=-4&limit=0",
        "limit=999999999999999999999",
        "box=not-a-box&status=weird&type=plastic",
        "page=1&page=2",
        "search=%25_%5C",
    ] {
        let (status, body) = app.get(&format!("/api/tubes?{query}")).await;
        assert_eq!(status, StatusCode::OK, "query: {query} -> {body}");
    }

    let (_, body) = app.get("/api/tubes?page=0&limit=0").await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 1);
    assert_eq!(ids(&body).len(), 1);

    let (_, body) = app.get("/api/tubes?limit=100000").await;
    assert_eq!(body["per_page"], 5000);

    // Filtros inválidos são ignorados
    let (_, body) = app.get("/api/tubes?status=weird&box=abc").await;
    assert_eq!(body["total"], 8);

    // Curingas do LIKE são literais
    let (_, body) = app.get("/api/tubes?search=%25").await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn repeated_query_keys_keep_the_other_filters() {
    let (app, _, box_id) = seeded().await;

    let (_, once) = app.get("/api/tubes?status=Empty").await;
    let (status, twice) = app.get("/api/tubes?status=Empty&status=Empty").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(twice["total"], once["total"]);
    assert_eq!(twice["total"], 2);

    // A primeira ocorrência vale
    let (_, body) = app.get("/api/tubes?status=Low&status=Available&limit=1&limit=50").await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["per_page"], 1);

    let (status, headers, bytes) = app
        .raw(Method::GET, &format!("/api/tubes/export?format=xlsx&box={box_id}&box={box_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"PK"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with(".xlsx\""));

    let (_, _, bytes) = app
        .raw(Method::GET, &format!("/api/tubes/export?format=tsv&box={box_id}&box={box_id}&search="), None)
        .await;
    assert_eq!(tsv_rows(&bytes).len() - 1, 4);
}

#[tokio::test]
async fn tube_projection_carries_sample_individual_and_box() {
    let (app, sample, box_id) = seeded().await;

    let (_, body) = app.get(&format!("/api/tubes?box={box_id}")).await;
    assert_eq!(body["total"], 4);

    let first = &body["items"][0];
    assert_eq!(first["sample_id"], sample);
    assert_eq!(first["sample_code"], "S-001");
    assert_eq!(first["individual_code"], "IND-001");
    assert_eq!(first["box_name"], "Boîte A");
    assert_eq!(first["freezer"], "F-80");
    assert!(first["position_display"].as_str().unwrap().starts_with(['A', 'B']));

    let id = first["id"].as_i64().unwrap();
    let (status, single) = app.get(&format!("/api/tubes/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&single, first);
}

#[tokio::test]
async fn slot_rules_are_enforced() {
    let (app, sample, box_id) = seeded().await;

    // A1 já ocupado
    let (status, body) = app
        .tube(json!({ "barcode": "DUP-SLOT", "sample_id": sample, "box_id": box_id, "position_row": 1, "position_col": 1 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Fora da grade 3x3
    let (status, _) = app
        .tube(json!({ "barcode": "OUT", "box_id": box_id, "position_row": 4, "position_col": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Linha sem coluna
    let (status, _) = app
        .tube(json!({ "barcode": "HALF", "box_id": box_id, "position_row": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Posição sem caixa
    let (status, body) = app
        .tube(json!({ "barcode": "LOOSE", "sample_id": sample, "position_row": 3, "position_col": 4 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (_, loose) = app.get("/api/tubes?search=LOOSE").await;
    assert_eq!(loose["total"], 0);

    // Caixa ou amostra inexistente
    let (status, _) = app.tube(json!({ "barcode": "NOBOX", "box_id": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.tube(json!({ "barcode": "NOSAMPLE", "sample_id": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Barcode duplicado
    let (status, _) = app.tube(json!({ "barcode": "T-001" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Livre: C3
    let id = app
        .tube_id(json!({ "barcode": "FREE", "box_id": box_id, "position_row": 3, "position_col": 3 }))
        .await;

    // Mover para o mesmo lugar não conflita consigo mesmo
    let (status, body) = app.put(&format!("/api/tubes/{id}"), json!({ "notes": "ok" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["position_display"], "C3");

    // Mover para A1 conflita
    let (status, _) = app
        .put(&format!("/api/tubes/{id}"), json!({ "position_row": 1, "position_col": 1 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Tirar da caixa limpa a posição exibida
    let (status, body) = app
        .put(
            &format!("/api/tubes/{id}"),
            json!({ "box_id": null, "position_row": null, "position_col": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["box_id"].is_null());
    assert!(body["position_display"].is_null());
}

#[tokio::test]
async fn export_route_is_not_taken_as_an_id() {
    let (app, _, _) = seeded().await;

    let (status, headers, _) = app.raw(Method::GET, "/api/tubes/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/tab-separated-values"));

    let (status, body) = app.get("/api/tubes/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn invalid_json_body_is_a_translated_400() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post("/api/tubes", json!({ "sample_id": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["body"].is_array());

    let (status, body) = app.post("/api/tubes", json!({ "barcode": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["barcode"].is_array());

    let (status, _) = app
        .post("/api/tubes", json!({ "barcode": "NEG", "current_volume": -1.0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
