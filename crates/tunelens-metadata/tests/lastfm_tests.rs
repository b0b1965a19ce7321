//! Integration tests for the Last.fm API client

use serde_json::json;
use tunelens_metadata::lastfm::{ImageSize, LastFmClient, LastFmError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn album_body() -> serde_json::Value {
    json!({
        "album": {
            "name": "In Rainbows",
            "artist": "Radiohead",
            "image": [
                { "#text": "https://lastfm.example/34s.png", "size": "small" },
                { "#text": "https://lastfm.example/64s.png", "size": "medium" },
                { "#text": "https://lastfm.example/174s.png", "size": "large" },
                { "#text": "https://lastfm.example/300x300.png", "size": "extralarge" },
                { "#text": "", "size": "mega" }
            ]
        }
    })
}

#[tokio::test]
async fn test_fetch_album_info_sends_expected_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("method", "album.getinfo"))
        .and(query_param("artist", "Radiohead"))
        .and(query_param("album", "In Rainbows"))
        .and(query_param("api_key", "test_api_key"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(album_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = LastFmClient::new("test_api_key".to_string(), Some(server.uri()));
    let info = client
        .fetch_album_info("Radiohead", "In Rainbows")
        .await
        .unwrap();

    assert_eq!(info.name, "In Rainbows");
    assert_eq!(info.artist, "Radiohead");
    // The empty mega entry is dropped.
    assert_eq!(info.images.len(), 4);
}

#[tokio::test]
async fn test_fetch_album_info_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(album_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = LastFmClient::new_with_limits_and_base_url(
        "test_api_key".to_string(),
        5,
        Some(server.uri()),
    );

    client
        .fetch_album_info("Radiohead", "In Rainbows")
        .await
        .unwrap();
    client
        .fetch_album_info("Radiohead", "In Rainbows")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fetch_album_image_picks_size_and_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(album_body()))
        .mount(&server)
        .await;

    let client = LastFmClient::new("test_api_key".to_string(), Some(server.uri()));

    let large = client
        .fetch_album_image("Radiohead", "In Rainbows", ImageSize::Large)
        .await
        .unwrap();
    assert_eq!(large.as_deref(), Some("https://lastfm.example/174s.png"));

    let mega = client
        .fetch_album_image("Radiohead", "In Rainbows", ImageSize::Mega)
        .await
        .unwrap();
    assert_eq!(mega.as_deref(), Some("https://lastfm.example/300x300.png"));
}

#[tokio::test]
async fn test_album_without_images_yields_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "album": { "name": "Demo", "artist": "Nobody", "image": [] }
        })))
        .mount(&server)
        .await;

    let client = LastFmClient::new("test_api_key".to_string(), Some(server.uri()));
    let image = client
        .fetch_album_image("Nobody", "Demo", ImageSize::ExtraLarge)
        .await
        .unwrap();

    assert!(image.is_none());
}

#[tokio::test]
async fn test_api_error_payload_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 6,
            "message": "Album not found"
        })))
        .mount(&server)
        .await;

    let client = LastFmClient::new("test_api_key".to_string(), Some(server.uri()));
    let err = client
        .fetch_album_info("Nobody", "Missing")
        .await
        .unwrap_err();

    match err {
        LastFmError::Api { code, message } => {
            assert_eq!(code, 6);
            assert_eq!(message, "Album not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_failure_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = LastFmClient::new("test_api_key".to_string(), Some(server.uri()));
    let err = client
        .fetch_album_info("Radiohead", "In Rainbows")
        .await
        .unwrap_err();

    assert!(matches!(err, LastFmError::HttpStatus { .. }));
}
