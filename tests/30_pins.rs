mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{titles, TestServer};

#[tokio::test]
async fn create_pin_normalizes_tags() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let board = ada.board("Reading", &[]).await?;

    let (status, body) = ada
        .post(
            "/api/pins",
            json!({
                "boardId": board,
                "type": "repo",
                "contentUrl": " https://github.com/tokio-rs/axum ",
                "title": " Axum ",
                "tags": "Rust, Web ,, HTTP",
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let pin = &body["data"];
    assert_eq!(pin["type"], "repo");
    assert_eq!(pin["title"], "Axum");
    assert_eq!(pin["contentUrl"], "https://github.com/tokio-rs/axum");
    assert_eq!(pin["tags"], json!(["rust", "web", "http"]));
    assert_eq!(pin["boardId"], board.as_str());
    assert_eq!(pin["board"]["title"], "Reading");
    assert_eq!(pin["creator"]["id"], ada.user_id.as_str());
    Ok(())
}

#[tokio::test]
async fn duplicate_tags_are_kept_on_read_back() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let board = ada.board("Frontend", &[]).await?;
    let pin = ada.link_pin(&board, "React docs", json!(["JS", " react ", "JS"])).await?;

    let (status, body) = ada.get(&format!("/api/pins/{}", pin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tags"], json!(["js", "react", "js"]));
    Ok(())
}

#[tokio::test]
async fn create_pin_rejects_bad_input() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let board = ada.board("b", &[]).await?;

    let (status, body) = ada
        .post("/api/pins", json!({ "boardId": board, "type": "video" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["type", "contentUrl", "title"] {
        assert!(body["field_errors"].get(field).is_some(), "missing {}", field);
    }
    Ok(())
}

#[tokio::test]
async fn board_listing_filters_by_exact_tag() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let board = ada.board("b", &[]).await?;
    ada.link_pin(&board, "rust", json!(["rust"])).await?;
    ada.link_pin(&board, "rustacean", json!(["rustacean"])).await?;
    ada.link_pin(&board, "both", json!(["Rust", "web"])).await?;

    let (status, body) = ada.get(&format!("/api/pins/board/{}?tag=RUST", board)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["both", "rust"]);

    let (_, body) = ada.get(&format!("/api/pins/board/{}", board)).await?;
    assert_eq!(titles(&body), vec!["both", "rustacean", "rust"]);
    Ok(())
}

#[tokio::test]
async fn search_covers_accessible_boards_only() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let bob = server.register("bob").await?;
    let mine = ada.board("mine", &[]).await?;
    let shared = bob.board("shared", &[&ada]).await?;
    let private = bob.board("private", &[]).await?;
    ada.link_pin(&mine, "own", json!(["ml"])).await?;
    bob.link_pin(&shared, "shared", json!(["ml"])).await?;
    bob.link_pin(&private, "hidden", json!(["ml"])).await?;

    let (status, body) = ada.get("/api/pins?tag=ml").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["shared", "own"]);

    let (_, body) = ada.get("/api/pins?type=pdf").await?;
    assert!(titles(&body).is_empty());

    let (status, _) = ada.get("/api/pins?type=video").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn only_members_reach_board_pins() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let eve = server.register("eve").await?;
    let board = ada.board("private", &[]).await?;
    let pin = ada.link_pin(&board, "secret", json!([])).await?;

    let (status, _) = eve.get(&format!("/api/pins/board/{}", board)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = eve.get(&format!("/api/pins/{}", pin)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = eve
        .post(
            "/api/pins",
            json!({ "boardId": board, "type": "link", "contentUrl": "https://x", "title": "sneaky" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ada.get(&format!("/api/pins/board/{}", "not-an-id")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn only_the_creator_edits_a_pin() -> Result<()> {
    let server = TestServer::start().await?;
    let ada = server.register("ada").await?;
    let bob = server.register("bob").await?;
    let board = ada.board("shared", &[&bob]).await?;
    let pin = bob.link_pin(&board, "bob's", json!(["a"])).await?;
    let path = format!("/api/pins/{}", pin);

    // The board owner is not the creator
    let (status, _) = ada.put(&path, json!({ "title": "mine" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ada.delete(&path).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = bob.put(&path, json!({ "tags": ["B", "c"], "type": "youtube" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tags"], json!(["b", "c"]));
    assert_eq!(body["data"]["type"], "youtube");
    assert_eq!(body["data"]["title"], "bob's");

    let (status, body) = bob.put(&path, json!({ "title": "  " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("title").is_some());

    let (status, _) = bob.delete(&path).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = bob.get(&path).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
