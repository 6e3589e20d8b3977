mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{app, body_json, post_json, send};

const HOST: &str = "host-42";

async fn action(app: &axum::Router, slug: &str, client: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut request = post_json(&format!("/rooms/{slug}/script-murder"), &body);
    if let Some(client) = client {
        request
            .headers_mut()
            .insert("x-client-id", client.parse().unwrap());
    }
    let res = send(app, request).await;
    let status = res.status();
    (status, body_json(res).await)
}

#[tokio::test]
async fn host_drives_a_three_chapter_script() {
    let app = app().await;

    let mut create = post_json(
        "/rooms",
        &json!({"scriptRoom": {"scriptId": "manor", "totalChapters": 3}}),
    );
    create
        .headers_mut()
        .insert("x-client-id", HOST.parse().unwrap());
    let room = body_json(send(&app, create).await).await;
    let slug = room["room"]["slug"].as_str().unwrap().to_owned();
    assert_eq!(room["room"]["hostId"], HOST);

    let joined = body_json(
        send(
            &app,
            post_json(&format!("/rooms/{slug}/join"), &json!({"displayName": "Poirot"})),
        )
        .await,
    )
    .await;
    let player_id = joined["player"]["id"].as_str().unwrap().to_owned();

    let (status, body) = action(&app, &slug, Some("intruder"), json!({"action": "advance"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "host_only");

    let (status, body) = action(&app, &slug, Some(HOST), json!({"action": "advance"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["state"]["phase"], "play");
    assert_eq!(body["state"]["chapterIndex"], 1);

    let (status, body) = action(
        &app,
        &slug,
        None,
        json!({"action": "vote", "playerId": player_id, "option": "gardener"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["votes"][&player_id], "gardener");

    let (_, body) = action(&app, &slug, Some(HOST), json!({"action": "advance"})).await;
    assert_eq!(body["state"]["chapterIndex"], 2);
    assert_eq!(body["state"]["votes"], json!({}));

    let (_, body) = action(&app, &slug, Some(HOST), json!({"action": "advance"})).await;
    assert_eq!(body["state"]["phase"], "ended");
    assert_eq!(body["state"]["stats"]["chaptersCompleted"], 3);
    assert_eq!(body["state"]["stats"]["voteRounds"], 1);
    assert_eq!(body["state"]["stats"]["punishmentCount"], 0);

    let (status, body) = action(&app, &slug, None, json!({"action": "punishment_done"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "game_ended");
}

#[tokio::test]
async fn malformed_actions_are_rejected() {
    let app = app().await;
    let room = body_json(send(&app, post_json("/rooms", &json!({}))).await).await;
    let slug = room["room"]["slug"].as_str().unwrap().to_owned();

    let (status, body) = action(&app, &slug, None, json!({"action": "rewind"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_action");

    let (status, body) = action(&app, &slug, None, json!({"action": "vote", "option": "a"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "missing_player_or_option");

    let (status, body) = action(
        &app,
        &slug,
        None,
        json!({"action": "vote", "playerId": "ghost", "option": "a"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_player");
}

#[tokio::test]
async fn public_host_id_in_the_body_does_not_grant_authority() {
    let app = app().await;
    let room = body_json(send(&app, post_json("/rooms", &json!({}))).await).await;
    let slug = room["room"]["slug"].as_str().unwrap().to_owned();

    let joined = body_json(
        send(
            &app,
            post_json(&format!("/rooms/{slug}/join"), &json!({"displayName": "Marple"})),
        )
        .await,
    )
    .await;
    let first_id = joined["player"]["id"].as_str().unwrap().to_owned();

    let details = body_json(send(&app, common::get(&format!("/rooms/{slug}"))).await).await;
    let host_id = details["room"]["hostId"].as_str().unwrap().to_owned();
    assert_eq!(host_id, first_id);

    let (status, body) = action(
        &app,
        &slug,
        None,
        json!({"action": "advance", "playerId": host_id}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "host_only");

    let (status, body) = action(&app, &slug, Some(&host_id), json!({"action": "advance"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["chapterIndex"], 1);
}

#[tokio::test]
async fn unparsable_action_body_uses_the_error_shape() {
    let app = app().await;
    let room = body_json(send(&app, post_json("/rooms", &json!({}))).await).await;
    let slug = room["room"]["slug"].as_str().unwrap().to_owned();

    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri(format!("/rooms/{slug}/script-murder"))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let res = send(&app, request).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["kind"], "invalid_input");
    assert!(body["message"].is_string());
    assert_eq!(body["retryable"], false);
}
