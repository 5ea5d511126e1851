use geo::polygon;
use gridsweep::{
    BoundaryProvider, FetchError, GeoJsonBoundary, LatLng, MultiPolygon, Rectangle,
    SearchRequestTemplate, SweepBuilder, SweepConfig,
};
use gridsweep_integration_tests::{FakePlacesServer, FakeServerConfig, scatter};
use std::collections::HashSet;
use std::time::Duration;

fn unit_square() -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0),
    ]])
}

fn template() -> SearchRequestTemplate {
    SearchRequestTemplate::new("restaurant", "places.id,places.location")
}

/// 200 places spread over the whole square plus a dense downtown of 400.
fn city() -> Vec<gridsweep_integration_tests::FakePlace> {
    let mut places = scatter("spread", 200, (0.0, 1.0), (0.0, 1.0));
    places.extend(scatter("downtown", 400, (0.10, 0.15), (0.60, 0.65)));
    places
}

fn config(server: &FakePlacesServer) -> SweepConfig {
    SweepConfig::default()
        .with_endpoint(server.endpoint())
        .with_top_divisions(2)
        .with_sub_divisions(3)
        .with_concurrency(4)
        .with_request_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_sweep_finds_every_place() -> anyhow::Result<()> {
    tracing_subscriber::fmt::try_init().ok();
    let places = city();
    let server = FakePlacesServer::start(FakeServerConfig::new(places.clone()).api_key("k")).await?;

    let sweeper = SweepBuilder::new()
        .config(config(&server))
        .api_key("k")
        .build()?;
    let outcome = sweeper.run(&unit_square(), &template()).await;

    assert!(outcome.is_complete(), "{}", outcome.summary());
    assert_eq!(outcome.records.len(), places.len());

    let found: HashSet<String> = outcome
        .records
        .iter()
        .filter_map(|r| r.as_value()["id"].as_str().map(str::to_string))
        .collect();
    let expected: HashSet<String> = places.iter().map(|p| p.id.clone()).collect();
    assert_eq!(found, expected);

    // The downtown cell had to be split repeatedly; the rest did not.
    assert!(outcome.max_depth >= 2);
    assert!(outcome.requests_issued > 4);
    assert!(server.pages_served() as u64 >= outcome.requests_issued);

    let requests = server.requests();
    assert!(requests.iter().all(|r| r.body.text_query == "restaurant"));
    assert!(requests.iter().all(|r| {
        r.field_mask.as_deref() == Some("places.id,places.location,nextPageToken")
    }));

    Ok(())
}

#[tokio::test]
async fn test_failed_region_is_contained() -> anyhow::Result<()> {
    let places = scatter("spread", 100, (0.0, 1.0), (0.0, 1.0));
    let broken = Rectangle::new(LatLng::new(0.0, 0.0), LatLng::new(0.5, 0.5))?;
    let server = FakePlacesServer::start(
        FakeServerConfig::new(places.clone()).fail_when(move |r| *r == broken),
    )
    .await?;

    let sweeper = SweepBuilder::new()
        .config(config(&server))
        .bearer_token("token")
        .build()?;
    let outcome = sweeper.run(&unit_square(), &template()).await;

    assert_eq!(outcome.failed_branches(), 1);
    assert_eq!(outcome.failures[0].rectangle, broken);
    assert_eq!(outcome.failures[0].error, FetchError::Status { status: 500 });
    assert_eq!(outcome.requests_issued, 4);

    let outside_broken = places
        .iter()
        .filter(|p| p.latitude >= 0.5 || p.longitude >= 0.5)
        .count();
    assert_eq!(outcome.records.len(), outside_broken);

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_failure() -> anyhow::Result<()> {
    let places = scatter("spread", 100, (0.0, 1.0), (0.0, 1.0));
    let garbled = Rectangle::new(LatLng::new(0.5, 0.5), LatLng::new(1.0, 1.0))?;
    let server = FakePlacesServer::start(
        FakeServerConfig::new(places.clone()).garble_when(move |r| *r == garbled),
    )
    .await?;

    let sweeper = SweepBuilder::new().config(config(&server)).build()?;
    let outcome = sweeper.run(&unit_square(), &template()).await;

    assert_eq!(outcome.requests_issued, 4);
    assert_eq!(outcome.leaves, 3);
    assert_eq!(outcome.failed_branches(), 1);
    assert_eq!(outcome.failures[0].rectangle, garbled);
    assert!(matches!(outcome.failures[0].error, FetchError::Decode(_)));

    let outside_garbled = places
        .iter()
        .filter(|p| p.latitude < 0.5 || p.longitude < 0.5)
        .count();
    assert_eq!(outcome.records.len(), outside_garbled);

    Ok(())
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_failure() -> anyhow::Result<()> {
    // Reserve a port, then close it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let config = SweepConfig::default()
        .with_endpoint(format!("http://{}/v1/search", addr))
        .with_top_divisions(2)
        .with_request_timeout(Duration::from_secs(5));
    let sweeper = SweepBuilder::new().config(config).build()?;
    let outcome = sweeper.run(&unit_square(), &template()).await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.requests_issued, 4);
    assert_eq!(outcome.leaves, 0);
    assert_eq!(outcome.failed_branches(), 4);
    assert!(
        outcome
            .failures
            .iter()
            .all(|f| matches!(f.error, FetchError::Transport(_)))
    );

    Ok(())
}

#[tokio::test]
async fn test_wrong_credentials_fail_every_region() -> anyhow::Result<()> {
    let server =
        FakePlacesServer::start(FakeServerConfig::new(city()).api_key("right")).await?;

    let sweeper = SweepBuilder::new()
        .config(config(&server))
        .api_key("wrong")
        .build()?;
    let outcome = sweeper.run(&unit_square(), &template()).await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.requests_issued, 4);
    assert_eq!(outcome.failed_branches(), 4);
    assert!(
        outcome
            .failures
            .iter()
            .all(|f| f.error == FetchError::Status { status: 403 })
    );

    Ok(())
}

#[tokio::test]
async fn test_timeout_is_per_request() -> anyhow::Result<()> {
    let server = FakePlacesServer::start(
        FakeServerConfig::new(city()).delay(Duration::from_millis(500)),
    )
    .await?;

    let sweeper = SweepBuilder::new()
        .config(config(&server).with_request_timeout(Duration::from_millis(50)))
        .build()?;
    let outcome = sweeper.run(&unit_square(), &template()).await;

    assert_eq!(outcome.requests_issued, 4);
    assert_eq!(outcome.failed_branches(), 4);
    assert!(outcome.failures.iter().all(|f| f.error == FetchError::Timeout));

    Ok(())
}

#[tokio::test]
async fn test_sweep_from_geojson_feature() -> anyhow::Result<()> {
    let places = scatter("spread", 150, (0.0, 1.0), (0.0, 1.0));
    let server = FakePlacesServer::start(FakeServerConfig::new(places.clone())).await?;

    let boundary = GeoJsonBoundary::parse(
        r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "Square"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            }]
        }"#,
    )?
    .with_feature_name("Square");

    let sweeper = SweepBuilder::new().config(config(&server)).build()?;
    let outcome = sweeper.run(&boundary.boundary()?, &template()).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.records.len(), places.len());

    Ok(())
}
