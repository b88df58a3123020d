mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn stats_status_counts_sum_to_total_tubes() {
    let app = TestApp::spawn().await;
    let a = app.individual("IND-A", "FAM-1", &["EPI", "ASD"]).await;
    let b = app.individual("IND-B", "FAM-1", &["EPI"]).await;
    app.individual("IND-C", "FAM-2", &["TSA", "EPI", "EPI"]).await;
    let sa = app.sample("S-A", a, "DNA").await;
    app.sample("S-B", b, "RNA").await;
    let box_id = app.storage_box("B1", 9, 9).await;

    app.tube_id(json!({ "barcode": "X1", "sample_id": sa, "box_id": box_id, "position_row": 1, "position_col": 1, "current_volume": 50.0 }))
        .await;
    app.tube_id(json!({ "barcode": "X2", "sample_id": sa, "current_volume": 3.0 })).await;
    app.tube_id(json!({ "barcode": "X3", "sample_id": sa })).await;

    let (status, stats) = app.get("/api/stats").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(stats["totals"]["individuals"], 3);
    assert_eq!(stats["totals"]["samples"], 2);
    assert_eq!(stats["totals"]["tubes"], 3);
    assert_eq!(stats["totals"]["boxes"], 1);

    let by_status = &stats["by_status"];
    let sum: i64 = ["Empty", "Critical", "Low", "Available"]
        .iter()
        .map(|k| by_status[*k].as_i64().unwrap())
        .sum();
    assert_eq!(sum, 3);
    assert_eq!(by_status["Available"], 1);
    assert_eq!(by_status["Critical"], 1);
    assert_eq!(by_status["Empty"], 1);

    assert_eq!(stats["by_box"][0]["count"], 1);
    assert_eq!(stats["unboxed_tubes"], 2);

    assert_eq!(stats["top_families"][0]["family_id"], "FAM-1");
    assert_eq!(stats["top_families"][0]["count"], 2);

    // EPI conta uma vez por indivíduo
    assert_eq!(stats["top_projects"][0]["project"], "EPI");
    assert_eq!(stats["top_projects"][0]["count"], 3);
}

#[tokio::test]
async fn individuals_and_sujets_listing() {
    let app = TestApp::spawn().await;
    for i in 1..=7 {
        let family = if i % 2 == 0 { "FAM-EVEN" } else { "FAM-ODD" };
        app.individual(&format!("IND-{i:02}"), family, &["EPI"]).await;
    }

    let (status, list) = app.get("/api/individuals?family=FAM-EVEN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 3);
    assert_eq!(list[0]["individual_code"], "IND-02");
    assert_eq!(list[0]["sex_display"], "M");
    assert_eq!(list[0]["projects"], json!(["EPI"]));

    let (_, page) = app.get("/api/sujets?per_page=3&page=3").await;
    assert_eq!(page["total"], 7);
    assert_eq!(page["pages"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (_, page) = app.get("/api/sujets?per_page=abc&page=-1").await;
    assert_eq!(page["per_page"], 25);
    assert_eq!(page["page"], 1);

    let (_, families) = app.get("/api/families").await;
    assert_eq!(families, json!(["FAM-EVEN", "FAM-ODD"]));
    let (_, projects) = app.get("/api/projects").await;
    assert_eq!(projects, json!(["EPI"]));

    let (status, _) = app
        .post("/api/individuals", json!({ "individual_code": "IND-01" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn sujet_detail_and_sample_creation_from_sujet() {
    let app = TestApp::spawn().await;
    let id = app.individual("IND-1", "FAM-1", &[]).await;
    let box_id = app.storage_box("Rack", 9, 9).await;

    let (status, sample) = app
        .post(&format!("/api/sujets/{id}/samples"), json!({ "sample_code": "S-1", "sample_type": "DNA" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sample["individual_id"], id);

    let sample_id = sample["id"].as_i64().unwrap();
    app.tube_id(json!({ "barcode": "TB-1", "sample_id": sample_id, "box_id": box_id, "position_row": 2, "position_col": 5 }))
        .await;

    let (status, sujet) = app.get(&format!("/api/sujets/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sujet["sample_count"], 1);
    assert_eq!(sujet["tube_count"], 1);
    assert_eq!(sujet["samples"][0]["tubes"][0]["position_display"], "B5");
    assert_eq!(sujet["samples"][0]["tubes"][0]["box_name"], "Rack");

    let (status, _) = app
        .post("/api/sujets/999/samples", json!({ "sample_code": "S-X" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn samples_listing_filters_and_types() {
    let app = TestApp::spawn().await;
    let a = app.individual("IND-A", "F", &[]).await;
    let b = app.individual("IND-B", "F", &[]).await;
    app.sample("S-1", a, "DNA").await;
    app.sample("S-2", a, "RNA").await;
    app.sample("S-3", b, "DNA").await;

    let (_, page) = app.get(&format!("/api/samples?individual={a}")).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["individual_code"], "IND-A");

    let (_, page) = app.get("/api/samples?type=DNA").await;
    assert_eq!(page["total"], 2);

    let (_, page) = app.get("/api/samples?search=IND-B").await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["sample_code"], "S-3");

    let (_, types) = app.get("/api/samples/types").await;
    assert_eq!(types["types"], json!(["DNA", "RNA"]));

    let (status, _) = app
        .post("/api/samples", json!({ "sample_code": "S-9", "individual_id": 999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deletes_are_blocked_while_dependents_exist() {
    let app = TestApp::spawn().await;
    let individual = app.individual("IND-1", "F", &[]).await;
    let sample = app.sample("S-1", individual, "DNA").await;
    let box_id = app.storage_box("B", 9, 9).await;
    let tube = app
        .tube_id(json!({ "barcode": "T-1", "sample_id": sample, "box_id": box_id, "position_row": 1, "position_col": 1, "current_volume": 20.0 }))
        .await;

    let (status, _) = app.delete(&format!("/api/individuals/{individual}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.delete(&format!("/api/samples/{sample}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.delete(&format!("/api/boxes/{box_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/usages", json!({ "tube_id": tube, "volume_taken": 1.0 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.delete(&format!("/api/tubes/{tube}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Sem dependentes a exclusão passa
    let spare = app.tube_id(json!({ "barcode": "T-2" })).await;
    let (status, _) = app.delete(&format!("/api/tubes/{spare}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/tubes/{spare}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let empty_box = app.storage_box("Vide", 9, 9).await;
    let (status, _) = app.delete(&format!("/api/boxes/{empty_box}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.delete("/api/individuals/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn box_grid_cannot_shrink_over_tubes() {
    let app = TestApp::spawn().await;
    let box_id = app.storage_box("B", 9, 9).await;
    app.tube_id(json!({ "barcode": "T-1", "box_id": box_id, "position_row": 5, "position_col": 7 }))
        .await;

    let (status, _) = app
        .put(&format!("/api/boxes/{box_id}"), json!({ "grid_rows": 4 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .put(&format!("/api/boxes/{box_id}"), json!({ "grid_rows": 5, "grid_cols": 7, "freezer": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["freezer"].is_null());

    let (_, detail) = app.get(&format!("/api/boxes/{box_id}")).await;
    assert_eq!(detail["capacity"], 35);
    assert_eq!(detail["tube_count"], 1);
    assert_eq!(detail["tubes"][0]["position_display"], "E7");

    let (_, boxes) = app.get("/api/boxes").await;
    assert_eq!(boxes[0]["tube_count"], 1);
    assert_eq!(boxes[0]["capacity"], 35);

    let (status, _) = app.post("/api/boxes", json!({ "name": "Big", "grid_rows": 27 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn usage_decrements_volume_and_checks_availability() {
    let app = TestApp::spawn().await;
    let tube = app
        .tube_id(json!({ "barcode": "T-1", "initial_volume": 100.0, "current_volume": 40.0 }))
        .await;

    let (status, usage) = app
        .post(
            "/api/usages",
            json!({ "tube_id": tube, "user_name": "Zoé", "volume_taken": 15.5, "purpose": "PCR" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{usage}");
    assert!(usage["date_out"].is_string());

    let (_, view) = app.get(&format!("/api/tubes/{tube}")).await;
    assert_eq!(view["current_volume"], 24.5);
    assert_eq!(view["status"], "Low");

    // Mais do que o disponível: nada muda
    let (status, _) = app
        .post("/api/usages", json!({ "tube_id": tube, "volume_taken": 30.0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, view) = app.get(&format!("/api/tubes/{tube}")).await;
    assert_eq!(view["current_volume"], 24.5);

    let (status, _) = app
        .post("/api/usages", json!({ "tube_id": tube, "volume_taken": 0.0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post("/api/usages", json!({ "tube_id": 999, "volume_taken": 1.0 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Sem volume: só registra
    let (status, _) = app
        .post("/api/usages", json!({ "tube_id": tube, "date_out": "2025-01-02", "notes": "visual" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, history) = app.get(&format!("/api/tubes/{tube}/usages")).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["tube_barcode"], "T-1");
    assert_eq!(history[1]["date_out"], "2025-01-02");

    let (_, all) = app.get(&format!("/api/usages?tube={tube}&limit=1")).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/tubes/999/usages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn usage_history_is_append_only_in_the_database() {
    let app = TestApp::spawn().await;
    let tube = app.tube_id(json!({ "barcode": "T-1", "current_volume": 10.0 })).await;
    app.post("/api/usages", json!({ "tube_id": tube, "volume_taken": 1.0 }))
        .await;

    let update = sqlx::query("UPDATE tube_usage SET volume_taken = 0")
        .execute(&app.pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM tube_usage").execute(&app.pool).await;
    assert!(delete.is_err());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tube_usage")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn pages_and_health_are_served() {
    let app = TestApp::spawn().await;

    for path in ["/", "/tubes", "/boxes", "/sujets", "/samples", "/history"] {
        let (status, headers, body) = app.raw(Method::GET, path, None).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(std::str::from_utf8(&body).unwrap().contains("<html"));
    }

    let (status, _, body) = app.raw(Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let app = TestApp::spawn().await;

    let request = axum::http::Request::builder()
        .uri("/api/boxes/42")
        .header(header::ACCEPT_LANGUAGE, "fr-FR")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Detalhes por campo no mesmo idioma da mensagem principal
    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/api/tubes")
        .header(header::ACCEPT_LANGUAGE, "fr-FR")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(json!({ "barcode": "NEG", "current_volume": -1.0 }).to_string()))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = http_body_util::BodyExt::collect(response.into_body()).await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["details"]["current_volume"][0], "Le volume ne peut pas être négatif.");
}
