//! # Serving Endpoint
//!
//! Route handlers of the on-device HTTP listener, expressed as pure
//! functions of the [`ResultCache`] so any listener can dispatch to them.
//! Handlers only read the cache; they never wait for a new image.
//!
//! | Route    | Response                                           |
//! |----------|----------------------------------------------------|
//! | `/`      | HTML page embedding `/image`                       |
//! | `/image` | Latest processed image (`image/jpeg`) or 404       |
//! | `/stats` | Pipeline counters as JSON                          |

use std::net::IpAddr;

use bytes::Bytes;

use crate::cache::ResultCache;
use crate::stats::StatsSnapshot;

pub const INDEX_ROUTE: &str = "/";
pub const IMAGE_ROUTE: &str = "/image";
pub const STATS_ROUTE: &str = "/stats";

const HTML: &str = "text/html; charset=utf-8";
const JPEG: &str = "image/jpeg";
const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";

/// Status, content type and body of a route response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl RouteResponse {
    fn new(status: u16, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }
}

/// Fixed page that shows the latest image and reloads it periodically
pub fn index(local_addr: Option<IpAddr>) -> RouteResponse {
    let address = local_addr
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "not connected".into());

    let page = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ESP32-CAM Inference</title>
<style>body{{font-family:sans-serif;text-align:center;background:#111;color:#eee}}img{{max-width:100%}}</style>
</head>
<body>
<h1>ESP32-CAM Inference</h1>
<p>Device address: {address}</p>
<img id="result" src="{IMAGE_ROUTE}" alt="No processed image yet">
<script>
setInterval(function () {{
  document.getElementById("result").src = "{IMAGE_ROUTE}?t=" + Date.now();
}}, 2000);
</script>
</body>
</html>
"#
    );
    RouteResponse::new(200, HTML, page)
}

/// The cached image verbatim, or 404 until the first successful cycle
pub fn image(cache: &ResultCache) -> RouteResponse {
    match cache.read() {
        Some(image) => RouteResponse::new(200, JPEG, image.bytes),
        None => not_found(),
    }
}

/// Counters as a JSON document
pub fn stats(snapshot: &StatsSnapshot) -> RouteResponse {
    match serde_json::to_vec(snapshot) {
        Ok(body) => RouteResponse::new(200, JSON, body),
        Err(e) => RouteResponse::new(500, TEXT, e.to_string()),
    }
}

pub fn not_found() -> RouteResponse {
    RouteResponse::new(404, TEXT, "not found")
}
