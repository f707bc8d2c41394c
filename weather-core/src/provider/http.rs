//! Request/decode plumbing shared by every provider.

use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::WeatherError;

/// `base_url` with `segments` appended as percent-encoded path segments.
pub(crate) fn endpoint<I>(provider: &str, base_url: &str, segments: I) -> Result<Url, WeatherError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let invalid = || WeatherError::InvalidUrl {
        provider: provider.to_string(),
        url: base_url.to_string(),
    };

    let mut url = Url::parse(base_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Send `request` and decode a successful body as `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T, WeatherError> {
    let res = request.send().await.map_err(|source| WeatherError::Transport {
        provider: provider.to_string(),
        source,
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| WeatherError::Transport {
        provider: provider.to_string(),
        source,
    })?;

    decode_body(provider, status, &body)
}

/// Turn a raw response into `T`, rejecting non-success statuses and bodies
/// that do not match the expected shape.
pub(crate) fn decode_body<T: DeserializeOwned>(
    provider: &str,
    status: StatusCode,
    body: &str,
) -> Result<T, WeatherError> {
    if !status.is_success() {
        return Err(WeatherError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: truncate_body(body),
        });
    }

    serde_json::from_str(body).map_err(|source| WeatherError::Decode {
        provider: provider.to_string(),
        source,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// One-shot HTTP server for exercising providers end to end.
#[cfg(test)]
pub(crate) mod stub {
    use reqwest::Client;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Client that talks to the stub directly, ignoring proxy settings.
    pub(crate) fn client() -> Client {
        Client::builder().no_proxy().build().expect("client builds")
    }

    /// Answer a single request with `status` and `body`.
    ///
    /// Returns the base URL to point a provider at and a handle resolving to
    /// the request line that was received.
    pub(crate) async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let base_url = format!("http://{}", listener.local_addr().expect("stub address"));

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");

            let mut request: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write response");
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (base_url, handle)
    }
}
