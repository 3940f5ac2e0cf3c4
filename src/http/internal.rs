//! Locally served responses.
//!
//! None of these make an outbound call, so they cannot fail on the network.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use crate::routing::InternalPage;

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Facts about the running process shown by `/health`.
#[derive(Debug, Clone, Copy)]
pub struct HealthInfo {
    pub port: u16,
    pub has_token: bool,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    timestamp: String,
    env: HealthEnv,
}

#[derive(Serialize)]
struct HealthEnv {
    port: u16,
    #[serde(rename = "hasToken")]
    has_token: bool,
}

/// Render an internal page.
pub fn serve(page: InternalPage, info: HealthInfo, headers: &HeaderMap) -> Response {
    match page {
        InternalPage::Health => health(info).into_response(),
        InternalPage::PrerenderTest => prerender_test(headers).into_response(),
        InternalPage::Manifest => manifest().into_response(),
    }
}

fn health(info: HealthInfo) -> Json<HealthBody> {
    Json(HealthBody {
        status: "OK",
        timestamp: timestamp(),
        env: HealthEnv {
            port: info.port,
            has_token: info.has_token,
        },
    })
}

fn prerender_test(headers: &HeaderMap) -> Html<String> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Not provided");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Prerender Test Page - RiffCrusher</title>
  <meta name="description" content="Test page for Prerender verification - RiffCrusher integration working">
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
</head>
<body>
  <h1>Prerender Integration Working</h1>
  <p>This page confirms Prerender.io integration is functional for RiffCrusher.</p>
  <p>Timestamp: {}</p>
  <p>User-Agent: {}</p>
</body>
</html>
"#,
        timestamp(),
        escape_html(user_agent)
    ))
}

fn manifest() -> Json<serde_json::Value> {
    Json(json!({
        "short_name": "RiffCrusher",
        "name": "RiffCrusher - Guitar Tab Management",
        "icons": [
            { "src": "favicon.ico", "sizes": "64x64 32x32 24x24 16x16", "type": "image/x-icon" }
        ],
        "start_url": ".",
        "display": "standalone",
        "theme_color": "#000000",
        "background_color": "#ffffff"
    }))
}

/// Page answered to the prerender provider's installation check on `/`.
pub fn verification_page() -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>RiffCrusher - Guitar Tab Management</title>
  <meta name="description" content="Professional guitar tab management and sharing platform for musicians">
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta property="og:title" content="RiffCrusher - Guitar Tab Management">
  <meta property="og:description" content="Professional guitar tab management and sharing platform for musicians">
  <meta property="og:type" content="website">
</head>
<body>
  <div id="root">
    <h1>RiffCrusher</h1>
    <p>Professional guitar tab management and sharing platform for musicians.</p>
    <p>Prerender integration active - timestamp: {}</p>
    <nav>
      <a href="/tabs">Browse Tabs</a>
      <a href="/learn">Learn Guitar</a>
      <a href="/community">Community</a>
    </nav>
  </div>
</body>
</html>
"#,
        timestamp()
    );
    (StatusCode::OK, Html(html)).into_response()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
