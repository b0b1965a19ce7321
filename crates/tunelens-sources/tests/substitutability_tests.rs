//! The same consumer code runs against both data sources.

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::sync::Arc;
use tunelens_domain::TimeDimension;
use tunelens_sources::{
    Dashboard, DataSource, FixtureDataSource, HttpCatalogClient, LiveDataSource,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Consumer logic with no knowledge of which source it is given.
async fn headline(source: &dyn DataSource) -> (usize, usize, usize) {
    let tracks = source.top_tracks(3, Some(TimeDimension::Month)).await.unwrap();
    let artists = source.top_artists(3, Some(TimeDimension::Month)).await.unwrap();
    let plays = source.recently_played(3).await.unwrap();
    source.clear_cache();
    (tracks.len(), artists.len(), plays.len())
}

async fn live_source() -> (MockServer, Arc<dyn DataSource>) {
    let server = MockServer::start().await;
    let now = Utc::now();
    let ago = |hours: i64| (now - ChronoDuration::hours(hours)).to_rfc3339();

    let track = |id: &str, name: &str, artist: &str, popularity: u8| {
        json!({
            "id": id,
            "name": name,
            "artists": [{ "id": artist, "name": artist.to_uppercase() }],
            "album": { "name": format!("{name} LP"), "images": [] },
            "duration_ms": 240000,
            "popularity": popularity
        })
    };

    Mock::given(method("GET"))
        .and(path("/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                track("t1", "One", "a1", 80),
                track("t2", "Two", "a2", 60),
                track("t3", "Three", "a1", 40),
                track("t4", "Four", "a3", 20)
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/top/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "a1", "name": "A1", "genres": ["shoegaze", "dream pop"], "popularity": 70 },
                { "id": "a2", "name": "A2", "genres": ["shoegaze"], "popularity": 50 },
                { "id": "a3", "name": "A3", "genres": [], "popularity": 30 }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/player/recently-played"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "track": track("t1", "One", "a1", 80), "played_at": ago(1) },
                { "track": track("t1", "One", "a1", 80), "played_at": ago(5) },
                { "track": track("t2", "Two", "a2", 60), "played_at": ago(30) },
                { "track": track("t4", "Four", "a3", 20), "played_at": ago(24 * 90) }
            ]
        })))
        .mount(&server)
        .await;

    let catalog = HttpCatalogClient::builder()
        .base_url(server.uri())
        .access_token(Some("token".to_string()))
        .build()
        .unwrap();
    (server, Arc::new(LiveDataSource::new(Arc::new(catalog))))
}

#[tokio::test]
async fn test_same_consumer_against_both_sources() {
    let (_server, live) = live_source().await;
    let fixture: Arc<dyn DataSource> = Arc::new(FixtureDataSource::bundled().unwrap());

    for source in [&live, &fixture] {
        let (tracks, artists, plays) = headline(source.as_ref()).await;
        assert_eq!((tracks, artists, plays), (3, 3, 3), "source {}", source.name());
    }
}

#[tokio::test]
async fn test_dashboard_derives_real_numbers_from_live_source() {
    let (_server, live) = live_source().await;

    // The live source itself only offers placeholders.
    assert!(!live.stats().await.unwrap().has_data);

    let snapshot = Dashboard::new(live)
        .snapshot(TimeDimension::Month, 2)
        .await
        .unwrap();

    assert_eq!(snapshot.source, "live");
    assert!(snapshot.stats.has_data);
    assert_eq!(snapshot.stats.total_tracks, 4);
    assert_eq!(snapshot.stats.total_artists, 3);
    assert_eq!(snapshot.stats.top_genre.as_deref(), Some("shoegaze"));
    // Stats count every fetched play; the 90-day-old one is not recent.
    assert_eq!(snapshot.stats.total_plays, 4);
    assert_eq!(snapshot.stats.recent_tracks_count, 3);
    // The month window drops it from the play lists.
    assert_eq!(snapshot.recent_plays.len(), 2);
    assert_eq!(snapshot.top_tracks.len(), 2);
    assert_eq!(snapshot.top_artists.len(), 2);
    assert_eq!(snapshot.most_played_tracks[0].item.id.as_str(), "t1");
    assert_eq!(snapshot.most_played_tracks[0].plays, 2);
    assert_eq!(snapshot.genres[0].name, "shoegaze");
    assert_eq!(snapshot.genres[0].count, 2);
}

#[tokio::test]
async fn test_dashboard_against_fixture_source() {
    let source = FixtureDataSource::bundled().unwrap();
    let anchor = source.anchor();
    let snapshot = Dashboard::new(Arc::new(source))
        .snapshot_at(TimeDimension::Week, 5, anchor)
        .await
        .unwrap();

    assert_eq!(snapshot.source, "fixture");
    assert_eq!(snapshot.window.end, anchor);
    assert_eq!(snapshot.top_tracks.len(), 5);
    assert_eq!(snapshot.stats.total_tracks, 6);
    assert_eq!(snapshot.most_played_tracks[0].item.id.as_str(), "t15");
    assert_eq!(snapshot.most_played_tracks[0].plays, 3);
    assert!(snapshot.quality.is_clean());
    assert!(serde_json::to_string(&snapshot).is_ok());
}

#[tokio::test]
async fn test_recent_count_is_independent_of_dimension() {
    let source = Arc::new(FixtureDataSource::bundled().unwrap());
    let anchor = source.anchor();
    let dashboard = Dashboard::new(source);

    for dimension in TimeDimension::ALL {
        let snapshot = dashboard.snapshot_at(dimension, 5, anchor).await.unwrap();
        assert_eq!(snapshot.stats.recent_tracks_count, 22, "{dimension}");
        assert_eq!(snapshot.stats.total_plays, 30, "{dimension}");
    }

    let week = dashboard
        .snapshot_at(TimeDimension::Week, 50, anchor)
        .await
        .unwrap();
    assert!(week.recent_plays.len() < 22);
}
