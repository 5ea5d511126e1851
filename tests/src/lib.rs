//! In-process stand-in for the text search endpoint.
//!
//! The server holds a fixed set of places and answers rectangle queries the
//! way the real endpoint does: at most `cap` results per query, served in
//! pages of `page_size` with offset cursors. Rectangles are half-open
//! (`low <= p < high`) so a place belongs to exactly one leaf of a tiling.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use gridsweep::transport::http::{API_KEY_HEADER, FIELD_MASK_HEADER};
use gridsweep::{PageResponse, Rectangle, SearchTextRequest};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SEARCH_PATH: &str = "/v1/search";

#[derive(Debug, Clone, PartialEq)]
pub struct FakePlace {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

type FailWhen = Box<dyn Fn(&Rectangle) -> bool + Send + Sync>;

pub struct FakeServerConfig {
    pub places: Vec<FakePlace>,
    pub cap: usize,
    pub page_size: usize,
    /// Reject requests without this `X-Goog-Api-Key`.
    pub api_key: Option<String>,
    /// Answer HTTP 500 for matching rectangles.
    pub fail_when: Option<FailWhen>,
    /// Answer HTTP 200 with a body that is not JSON for matching rectangles.
    pub garble_when: Option<FailWhen>,
    /// Delay every response.
    pub delay: Option<Duration>,
}

impl FakeServerConfig {
    pub fn new(places: Vec<FakePlace>) -> Self {
        Self {
            places,
            cap: 60,
            page_size: 20,
            api_key: None,
            fail_when: None,
            garble_when: None,
            delay: None,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn fail_when(mut self, predicate: impl Fn(&Rectangle) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn garble_when(
        mut self,
        predicate: impl Fn(&Rectangle) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.garble_when = Some(Box::new(predicate));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub body: SearchTextRequest,
    pub field_mask: Option<String>,
}

struct ServerState {
    config: FakeServerConfig,
    pages: AtomicUsize,
    seen: Mutex<Vec<SeenRequest>>,
}

pub struct FakePlacesServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl FakePlacesServer {
    /// Bind to an ephemeral local port and serve in the background.
    pub async fn start(config: FakeServerConfig) -> anyhow::Result<Self> {
        let state = Arc::new(ServerState {
            config,
            pages: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(SEARCH_PATH, post(search))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.addr, SEARCH_PATH)
    }

    pub fn pages_served(&self) -> usize {
        self.state.pages.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state
            .seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

async fn search(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<SearchTextRequest>,
) -> Result<Response, StatusCode> {
    let config = &state.config;
    let field_mask = headers
        .get(FIELD_MASK_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if let Ok(mut seen) = state.seen.lock() {
        seen.push(SeenRequest {
            body: body.clone(),
            field_mask: field_mask.clone(),
        });
    }

    if let Some(delay) = config.delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(expected) = &config.api_key {
        let given = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            return Err(StatusCode::FORBIDDEN);
        }
    }

    if field_mask.is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let rect = body.rectangle();
    if config.fail_when.as_ref().is_some_and(|fail| fail(rect)) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    if config.garble_when.as_ref().is_some_and(|garble| garble(rect)) {
        return Ok("not json".into_response());
    }

    let offset: usize = match &body.page_token {
        None => 0,
        Some(token) => token.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
    };

    let (sw, ne) = (rect.southwest(), rect.northeast());
    let matching: Vec<&FakePlace> = config
        .places
        .iter()
        .filter(|p| {
            (sw.latitude..ne.latitude).contains(&p.latitude)
                && (sw.longitude..ne.longitude).contains(&p.longitude)
        })
        .take(config.cap)
        .collect();

    let end = (offset + config.page_size).min(matching.len());
    let places = matching
        .get(offset..end)
        .unwrap_or_default()
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "location": {"latitude": p.latitude, "longitude": p.longitude},
            })
            .into()
        })
        .collect();

    state.pages.fetch_add(1, Ordering::SeqCst);
    Ok(Json(PageResponse {
        places,
        next_page_token: (end < matching.len()).then(|| end.to_string()),
    })
    .into_response())
}

/// `count` places spread evenly over `[lat0, lat1) × [lon0, lon1)` using a
/// low-discrepancy sequence, so no two share a coordinate.
pub fn scatter(prefix: &str, count: usize, lat: (f64, f64), lon: (f64, f64)) -> Vec<FakePlace> {
    const PHI: f64 = 0.618_033_988_749_895;
    const SQRT2_FRAC: f64 = 0.414_213_562_373_095;

    (0..count)
        .map(|i| {
            let u = ((i as f64 + 0.5) * PHI).fract();
            let v = ((i as f64 + 0.5) * SQRT2_FRAC).fract();
            FakePlace {
                id: format!("{}-{}", prefix, i),
                latitude: lat.0 + u * (lat.1 - lat.0),
                longitude: lon.0 + v * (lon.1 - lon.0),
            }
        })
        .collect()
}
