//! Geoapify address autocomplete client.
//!
//! `GET {base_url}/v1/geocode/autocomplete?text=...&limit=...&format=geojson`
//! returns a `GeoJSON` `FeatureCollection` of ranked candidates.
//!
//! See <https://apidocs.geoapify.com/docs/geocoding/address-autocomplete/>

use safe_campus_zone_models::Coordinate;
use serde_json::Value;

use crate::{GeocodeError, GeocodedPlace};

/// Fetches autocomplete candidates for a free-text query.
///
/// Blank queries return an empty list without a request.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn autocomplete(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    text: &str,
    limit: u32,
    near: Option<Coordinate>,
) -> Result<Vec<GeocodedPlace>, GeocodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let url = format!("{}/v1/geocode/autocomplete", base_url.trim_end_matches('/'));
    let params = query_params(text, limit, api_key, near);

    log::debug!("Geoapify autocomplete: {text}");
    let resp = client.get(&url).query(&params).send().await?;

    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GeocodeError::Status {
            status: status.as_u16(),
            body: body_preview(&body),
        });
    }

    let body: Value = resp.json().await?;
    parse_response(&body)
}

/// Maximum length of a response body kept in [`GeocodeError::Status`].
const BODY_PREVIEW_LEN: usize = 300;

fn body_preview(text: &str) -> String {
    let mut end = text.len().min(BODY_PREVIEW_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Query parameters for an autocomplete request. A `near` point becomes a
/// `bias=proximity:lon,lat` parameter.
fn query_params(
    text: &str,
    limit: u32,
    api_key: &str,
    near: Option<Coordinate>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("text", text.to_string()),
        ("limit", limit.to_string()),
        ("format", "geojson".to_string()),
        ("apiKey", api_key.to_string()),
    ];
    if let Some(point) = near {
        params.push((
            "bias",
            format!("proximity:{},{}", point.longitude, point.latitude),
        ));
    }
    params
}

/// Parses an autocomplete `FeatureCollection`, preserving rank order.
///
/// Features without usable coordinates are skipped.
fn parse_response(body: &Value) -> Result<Vec<GeocodedPlace>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Geoapify response missing 'features' array".to_string(),
        })?;

    Ok(features.iter().filter_map(parse_feature).collect())
}

fn parse_feature(feature: &Value) -> Option<GeocodedPlace> {
    let properties = feature.get("properties")?;

    let (latitude, longitude) = match (
        properties.get("lat").and_then(Value::as_f64),
        properties.get("lon").and_then(Value::as_f64),
    ) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            let coords = feature
                .pointer("/geometry/coordinates")
                .and_then(Value::as_array)?;
            (coords.get(1)?.as_f64()?, coords.first()?.as_f64()?)
        }
    };

    let formatted = properties
        .get("formatted")
        .and_then(Value::as_str)
        .or_else(|| properties.get("name").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    Some(GeocodedPlace {
        formatted,
        latitude,
        longitude,
        confidence: properties
            .pointer("/rank/confidence")
            .and_then(Value::as_f64),
        result_type: properties
            .get("result_type")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    #[test]
    fn parses_ranked_candidates() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {
                        "formatted": "Main Library, 1408 West Gregory Drive, Urbana, IL 61801",
                        "lat": 40.1047,
                        "lon": -88.2289,
                        "result_type": "amenity",
                        "rank": { "confidence": 0.95 }
                    },
                    "geometry": { "type": "Point", "coordinates": [-88.2289, 40.1047] }
                },
                {
                    "type": "Feature",
                    "properties": { "formatted": "Main Street, Urbana, IL" },
                    "geometry": { "type": "Point", "coordinates": [-88.21, 40.11] }
                }
            ]
        });

        let places = parse_response(&body).unwrap();
        assert_eq!(places.len(), 2);
        assert!(places[0].formatted.starts_with("Main Library"));
        assert_eq!(places[0].confidence, Some(0.95));
        assert_eq!(places[0].result_type.as_deref(), Some("amenity"));
        assert!((places[1].latitude - 40.11).abs() < 1e-9);
        assert!((places[1].longitude - -88.21).abs() < 1e-9);
    }

    #[test]
    fn skips_features_without_coordinates() {
        let body = serde_json::json!({
            "features": [{ "properties": { "formatted": "Nowhere" } }]
        });
        assert!(parse_response(&body).unwrap().is_empty());
    }

    #[test]
    fn missing_features_is_error() {
        let body = serde_json::json!({ "statusCode": 401, "message": "Invalid apiKey" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn query_params_without_bias() {
        let params = query_params("main library", 5, "key", None);
        assert_eq!(
            params,
            vec![
                ("text", "main library".to_string()),
                ("limit", "5".to_string()),
                ("format", "geojson".to_string()),
                ("apiKey", "key".to_string()),
            ]
        );
    }

    #[test]
    fn near_adds_proximity_bias_in_lon_lat_order() {
        let params = query_params("library", 3, "key", Some(Coordinate::new(40.1, -88.2)));
        assert_eq!(
            params.last(),
            Some(&("bias", "proximity:-88.2,40.1".to_string()))
        );
    }

    /// Accepts one connection, answers it with `status` and `body`, and
    /// yields the raw request text.
    async fn respond_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let (base_url, server) = respond_once("429 Too Many Requests", "{}").await;
        let client = reqwest::Client::new();

        let result = autocomplete(&client, &base_url, "key", "library", 5, None).await;
        assert!(matches!(result, Err(GeocodeError::RateLimited)));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /v1/geocode/autocomplete?"));
        assert!(request.contains("apiKey=key"));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let (base_url, server) =
            respond_once("500 Internal Server Error", r#"{"message":"upstream down"}"#).await;
        let client = reqwest::Client::new();

        let result = autocomplete(&client, &base_url, "key", "library", 5, None).await;
        match result {
            Err(GeocodeError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("upstream down"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn success_parses_candidates() {
        let body = serde_json::json!({
            "features": [{
                "properties": { "formatted": "Union", "lat": 40.1092, "lon": -88.2272 }
            }]
        })
        .to_string();
        let (base_url, server) = respond_once("200 OK", &body).await;
        let client = reqwest::Client::new();

        let places = autocomplete(
            &client,
            &base_url,
            "key",
            "union",
            1,
            Some(Coordinate::new(40.1, -88.2)),
        )
        .await
        .unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].formatted, "Union");

        let request = server.await.unwrap();
        assert!(request.contains("bias=proximity%3A-88.2%2C40.1"));
    }

    #[tokio::test]
    async fn blank_query_skips_request() {
        let client = reqwest::Client::new();
        let places = autocomplete(&client, "http://127.0.0.1:9", "key", "   ", 5, None)
            .await
            .unwrap();
        assert!(places.is_empty());
    }
}
