use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tunelens_domain::TimeDimension;
use tunelens_sources::{
    CatalogClient, CatalogError, DataSource, HttpCatalogClient, LiveDataSource, SourceError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(server: &MockServer) -> Arc<HttpCatalogClient> {
    Arc::new(
        HttpCatalogClient::builder()
            .base_url(server.uri())
            .access_token(Some("test-token".to_string()))
            .cache_ttl(Duration::from_secs(60))
            .build()
            .unwrap(),
    )
}

fn tracks_page() -> serde_json::Value {
    json!({
        "items": [
            {
                "id": "4iV5W9uYEdYUVa79Axb7Rh",
                "name": "Teardrop",
                "artists": [{ "id": "6FXMGgJwohJLUSr5nVlf9X", "name": "Massive Attack" }],
                "album": {
                    "id": "49MNmJhZQewjt06rpwp6QR",
                    "name": "Mezzanine",
                    "images": [{ "url": "https://i.test/mezzanine.jpg", "width": 640, "height": 640 }]
                },
                "duration_ms": 330773,
                "popularity": 74
            },
            {
                "id": "2nTsKOXIVGDf2iPeVQO2Gm",
                "name": "Roads",
                "artists": [{ "id": "6liAMWkVf5LH7YR9yfFy1Y", "name": "Portishead" }],
                "album": { "name": "Dummy", "images": [] },
                "duration_ms": 305560,
                "popularity": null
            },
            { "name": "no id, dropped" }
        ],
        "limit": 10,
        "total": 3
    })
}

#[tokio::test]
async fn test_top_tracks_query_and_normalization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/top/tracks"))
        .and(query_param("limit", "10"))
        .and(query_param("time_range", "short_term"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tracks_page()))
        .expect(1)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));
    let tracks = source
        .top_tracks(10, Some(TimeDimension::Month))
        .await
        .unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].name, "Teardrop");
    assert_eq!(tracks[0].album.cover_url(), Some("https://i.test/mezzanine.jpg"));
    assert_eq!(tracks[1].popularity, None);
    assert!(!tracks[1].album.has_artwork());
}

#[tokio::test]
async fn test_missing_range_sends_medium_term() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/top/artists"))
        .and(query_param("time_range", "medium_term"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "a1",
                "name": "Björk",
                "genres": ["art pop", "electronica"],
                "popularity": 71,
                "followers": { "total": 3900000 }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));
    let artists = source.top_artists(5, None).await.unwrap();

    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].genres, vec!["art pop", "electronica"]);
    assert_eq!(artists[0].followers, Some(3_900_000));
}

#[tokio::test]
async fn test_responses_are_cached_until_cleared() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tracks_page()))
        .expect(2)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));

    let first = source.top_tracks(10, Some(TimeDimension::Year)).await.unwrap();
    let second = source.top_tracks(10, Some(TimeDimension::Year)).await.unwrap();
    assert_eq!(first, second);

    source.clear_cache();
    source.top_tracks(10, Some(TimeDimension::Year)).await.unwrap();
}

#[tokio::test]
async fn test_recently_played_normalization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/player/recently-played"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "track": { "id": "t1", "name": "Roads", "duration_ms": 305560 },
                    "played_at": "2024-06-30T10:15:00.123Z"
                },
                {
                    "track": { "id": "t2", "name": "Glory Box", "duration_ms": 306000 },
                    "played_at": "yesterday-ish"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));
    let plays = source.recently_played(120).await.unwrap();

    assert_eq!(plays.len(), 2);
    assert!(plays[0].played_at.is_some());
    // Unparseable timestamps become absent.
    assert!(plays[1].played_at.is_none());
}

#[tokio::test]
async fn test_zero_limit_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tracks_page()))
        .expect(0)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));
    assert!(source.top_tracks(0, None).await.unwrap().is_empty());
    assert!(source.top_artists(0, None).await.unwrap().is_empty());
    assert!(source.recently_played(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_and_genres_are_placeholders() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));
    let stats = source.stats().await.unwrap();

    assert!(!stats.has_data);
    assert_eq!(stats.total_tracks, 0);
    assert!(source.genre_analysis().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_and_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/top/tracks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "status": 401, "message": "The access token expired" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/top/artists"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));

    let err = source.top_tracks(10, None).await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::Catalog(CatalogError::Unauthorized)
    ));

    let err = source.top_artists(10, None).await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::Catalog(CatalogError::RateLimited {
            retry_after_secs: Some(7)
        })
    ));
}

#[tokio::test]
async fn test_failed_responses_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/top/tracks"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tracks_page()))
        .expect(1)
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));

    let err = source.top_tracks(10, None).await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::Catalog(CatalogError::ApiError { status: 502, .. })
    ));
    assert_eq!(source.top_tracks(10, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = catalog(&server).current_user().await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_malformed_item_does_not_fail_the_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/player/recently-played"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "track": { "id": "t1", "name": "Roads", "duration_ms": 305560 },
                    "played_at": "2024-06-30T10:15:00Z"
                },
                {
                    "track": { "id": "t2", "name": "Glory Box", "duration_ms": 306000.5 },
                    "played_at": 1717245000000.5
                },
                42
            ]
        })))
        .mount(&server)
        .await;

    let source = LiveDataSource::new(catalog(&server));
    let plays = source.recently_played(10).await.unwrap();

    assert_eq!(plays.len(), 2);
    assert!(plays[0].played_at.is_some());
    assert_eq!(plays[1].track.duration_ms, 306_000);
    assert!(plays[1].played_at.is_none());
}
