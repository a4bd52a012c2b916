use reqwest::header::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{Level, event, instrument};

const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

impl Client {
    pub fn with_headers(headers: HeaderMap) -> anyhow::Result<Self> {
        Ok(Client {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()?,
        })
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn get<U, T>(&self, url: U) -> anyhow::Result<T>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
        T: DeserializeOwned,
    {
        self.get_with_query(url, &[] as &[(&str, &str)]).await
    }

    /// GET with URL-encoded query parameters
    #[instrument(level = "trace", skip(self, query))]
    pub async fn get_with_query<U, Q, T>(&self, url: U, query: &Q) -> anyhow::Result<T>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.get(url).query(query).send().await?;
        let response = ensure_success(response).await?;
        let text = response.text().await?;
        event!(Level::TRACE, response = text);

        Ok(serde_json::from_str::<T>(&text)?)
    }

    #[instrument(level = "trace", skip(self, request))]
    pub async fn post<U, S, T>(&self, url: U, request: &S) -> anyhow::Result<T>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
        S: Serialize + Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(url).json(request).send().await?;
        let response = ensure_success(response).await?;
        let text = response.text().await?;
        event!(Level::TRACE, response = text);

        Ok(serde_json::from_str::<T>(&text)?)
    }

    /// Upload raw bytes using the two-step resumable upload protocol.
    ///
    /// The first request registers the upload with `metadata` and returns a
    /// session URL in the `x-goog-upload-url` header; the second sends the
    /// bytes and finalizes the upload in one go.
    #[instrument(level = "trace", skip(self, metadata, bytes), fields(size = bytes.len()))]
    pub async fn upload_resumable<U, S, T>(
        &self,
        url: U,
        metadata: &S,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> anyhow::Result<T>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
        S: Serialize + Sized,
        T: DeserializeOwned,
    {
        let start = self
            .client
            .post(url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(metadata)
            .send()
            .await?;
        let start = ensure_success(start).await?;
        let upload_url = session_url(start.headers())?;

        let response = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let text = response.text().await?;
        event!(Level::TRACE, response = text);

        Ok(serde_json::from_str::<T>(&text)?)
    }
}

async fn ensure_success(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(anyhow::anyhow!(
        "Request failed with status {}: {}",
        status,
        error_body
    ))
}

fn session_url(headers: &HeaderMap) -> anyhow::Result<String> {
    let value = headers
        .get(UPLOAD_URL_HEADER)
        .ok_or_else(|| anyhow::anyhow!("Upload start response is missing {}", UPLOAD_URL_HEADER))?;
    Ok(value.to_str()?.to_string())
}
