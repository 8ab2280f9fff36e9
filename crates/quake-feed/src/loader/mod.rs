// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Data loading for the earthquake and plate boundary feeds.
//!
//! Both documents are requested concurrently and joined: the load succeeds
//! only when both arrive and parse. There is no retry and no timeout beyond
//! what the HTTP client does by default.

use geojson::FeatureCollection;
use log::{error, info};
use thiserror::Error;

/// USGS summary feed of all earthquakes in the past week.
pub const DEFAULT_EARTHQUAKES_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";

/// PB2002 tectonic plate boundaries.
pub const DEFAULT_PLATES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

/// Errors that can occur while fetching a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} is not a GeoJSON FeatureCollection: {source}")]
    Parse { url: String, source: geojson::Error },
}

impl FetchError {
    /// URL of the feed that failed.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }
}

/// Locations of the two feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrls {
    pub earthquakes: String,
    pub plates: String,
}

impl Default for FeedUrls {
    fn default() -> Self {
        Self {
            earthquakes: DEFAULT_EARTHQUAKES_URL.to_string(),
            plates: DEFAULT_PLATES_URL.to_string(),
        }
    }
}

/// Both raw feature collections, as fetched.
#[derive(Debug, Clone)]
pub struct FeedData {
    pub earthquakes: FeatureCollection,
    pub plates: FeatureCollection,
}

/// Parse a document that is already in memory.
pub fn parse_collection(url: &str, body: &str) -> Result<FeatureCollection, FetchError> {
    body.parse::<FeatureCollection>()
        .map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
}

/// Fetch one GeoJSON FeatureCollection.
pub async fn fetch_collection(
    client: &reqwest::Client,
    url: &str,
) -> Result<FeatureCollection, FetchError> {
    info!("Fetching {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.text().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    let collection = parse_collection(url, &body)?;
    info!("Fetched {} features from {}", collection.features.len(), url);
    Ok(collection)
}

/// Fetch both feeds concurrently; fail if either fails.
pub async fn load_feeds(client: &reqwest::Client, urls: &FeedUrls) -> Result<FeedData, FetchError> {
    let result = tokio::try_join!(
        fetch_collection(client, &urls.earthquakes),
        fetch_collection(client, &urls.plates),
    );

    match result {
        Ok((earthquakes, plates)) => Ok(FeedData {
            earthquakes,
            plates,
        }),
        Err(e) => {
            error!("Feed load failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const QUAKES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"mag":4.2,"place":"Test Quake","time":1700000000000},
         "geometry":{"type":"Point","coordinates":[-119.5,37.1,8.2]}}]}"#;

    const PLATES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"Name":"AF-AN"},
         "geometry":{"type":"LineString","coordinates":[[-0.4,-54.8],[-0.1,-54.5]]}}]}"#;

    /// Serve a single canned HTTP response and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}/feed.geojson")
    }

    #[tokio::test]
    async fn test_fetch_collection() {
        let url = serve_once("200 OK", QUAKES).await;
        let collection = fetch_collection(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(collection.features.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let url = serve_once("404 Not Found", "{}").await;
        let err = fetch_collection(&reqwest::Client::new(), &url).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
        assert_eq!(err.url(), url);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let url = serve_once("200 OK", "<html>not json</html>").await;
        let err = fetch_collection(&reqwest::Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/feed.geojson");
        let err = fetch_collection(&reqwest::Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }

    #[tokio::test]
    async fn test_load_feeds_waits_for_both() {
        let urls = FeedUrls {
            earthquakes: serve_once("200 OK", QUAKES).await,
            plates: serve_once("200 OK", PLATES).await,
        };
        let data = load_feeds(&reqwest::Client::new(), &urls).await.unwrap();
        assert_eq!(data.earthquakes.features.len(), 1);
        assert_eq!(data.plates.features.len(), 1);
    }

    #[tokio::test]
    async fn test_load_feeds_fails_if_either_fails() {
        let urls = FeedUrls {
            earthquakes: serve_once("200 OK", QUAKES).await,
            plates: serve_once("500 Internal Server Error", "").await,
        };
        let err = load_feeds(&reqwest::Client::new(), &urls).await.unwrap_err();
        assert_eq!(err.url(), urls.plates);
    }

    #[test]
    fn test_parse_collection_rejects_single_feature() {
        let single = r#"{"type":"Feature","properties":{},"geometry":null}"#;
        assert!(matches!(
            parse_collection("mem://single", single),
            Err(FetchError::Parse { .. })
        ));
    }
}
