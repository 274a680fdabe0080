use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use reqwest::Url;
use tracing::debug;
use tracing::warn;

use super::DeleteOptions;
use super::GetOptions;
use super::KeysApi;
use super::PrevExist;
use super::Response;
use super::SetOptions;
use super::StoreResult;
use super::WaitOptions;
use crate::utils::path::normalize_endpoint;
use crate::utils::path::normalize_key;
use crate::ApiError;
use crate::StoreConfig;
use crate::StoreError;

const INDEX_HEADER: &str = "X-Etcd-Index";
const KEYS_PREFIX: &str = "/v2/keys";

/// [`KeysApi`] over the store's HTTP/JSON keys protocol.
///
/// Every request starts at a random endpoint and fails over to the next one
/// on connection errors. Error documents returned by a reachable member are
/// final for that request.
pub struct HttpKeysApi {
    http: reqwest::Client,
    endpoints: ArcSwap<Vec<String>>,
    request_timeout: Duration,
}

impl HttpKeysApi {
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|source| StoreError::Transport {
                endpoint: "<client>".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            endpoints: ArcSwap::from_pointee(normalize_endpoints(&config.endpoints)),
            request_timeout: config.request_timeout(),
        })
    }

    /// Replaces the member list; requests already in flight keep the old list.
    pub fn update_endpoints(
        &self,
        endpoints: Vec<String>,
    ) {
        let endpoints = normalize_endpoints(&endpoints);
        debug!(?endpoints, "store endpoints updated");
        self.endpoints.store(Arc::new(endpoints));
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.load().as_ref().clone()
    }

    async fn execute(
        &self,
        method: Method,
        key: &str,
        params: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> StoreResult<Response> {
        let endpoints = self.endpoints.load_full();
        if endpoints.is_empty() {
            return Err(StoreError::NoEndpoints);
        }

        let start = rand::thread_rng().gen_range(0..endpoints.len());
        let mut last_error = StoreError::NoEndpoints;

        for offset in 0..endpoints.len() {
            let endpoint = &endpoints[(start + offset) % endpoints.len()];
            let url = request_url(endpoint, key, params)?;

            let mut request = self.http.request(method.clone(), url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            match request.send().await {
                Ok(response) => return decode_response(endpoint, response).await,
                Err(e) if e.is_timeout() => {
                    warn!(%endpoint, key, "store request timed out");
                    last_error = StoreError::Timeout(timeout.unwrap_or(self.request_timeout));
                }
                Err(e) => {
                    warn!(%endpoint, key, error = %e, "store endpoint unreachable, trying next");
                    last_error = StoreError::Transport {
                        endpoint: endpoint.clone(),
                        source: e,
                    };
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl KeysApi for HttpKeysApi {
    async fn get(
        &self,
        key: &str,
        opts: GetOptions,
    ) -> StoreResult<Response> {
        let mut params = Vec::new();
        if opts.recursive {
            params.push(("recursive", "true".to_string()));
        }
        if opts.sorted {
            params.push(("sorted", "true".to_string()));
        }
        self.execute(Method::GET, key, &params, Some(self.request_timeout)).await
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: SetOptions,
    ) -> StoreResult<Response> {
        let mut params = Vec::new();
        if opts.dir {
            params.push(("dir", "true".to_string()));
        } else if !opts.refresh {
            params.push(("value", value.to_string()));
        }
        if let Some(ttl) = opts.ttl {
            params.push(("ttl", ttl.as_secs().to_string()));
        }
        if opts.refresh {
            params.push(("refresh", "true".to_string()));
        }
        match opts.prev_exist {
            PrevExist::Ignore => {}
            PrevExist::MustExist => params.push(("prevExist", "true".to_string())),
            PrevExist::MustNotExist => params.push(("prevExist", "false".to_string())),
        }
        self.execute(Method::PUT, key, &params, Some(self.request_timeout)).await
    }

    async fn delete(
        &self,
        key: &str,
        opts: DeleteOptions,
    ) -> StoreResult<Response> {
        let mut params = Vec::new();
        if opts.recursive {
            params.push(("recursive", "true".to_string()));
        }
        if opts.dir {
            params.push(("dir", "true".to_string()));
        }
        self.execute(Method::DELETE, key, &params, Some(self.request_timeout)).await
    }

    async fn wait(
        &self,
        key: &str,
        opts: WaitOptions,
    ) -> StoreResult<Response> {
        let mut params = vec![("wait", "true".to_string())];
        if opts.recursive {
            params.push(("recursive", "true".to_string()));
        }
        if opts.after_index > 0 {
            params.push(("waitIndex", (opts.after_index + 1).to_string()));
        }
        self.execute(Method::GET, key, &params, None).await
    }
}

fn normalize_endpoints(endpoints: &[String]) -> Vec<String> {
    endpoints.iter().map(|e| normalize_endpoint(e)).collect()
}

pub(crate) fn request_url(
    endpoint: &str,
    key: &str,
    params: &[(&str, String)],
) -> StoreResult<Url> {
    let raw = format!("{endpoint}{KEYS_PREFIX}{}", normalize_key(key));
    let mut url = Url::parse(&raw).map_err(|e| StoreError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

async fn decode_response(
    endpoint: &str,
    response: reqwest::Response,
) -> StoreResult<Response> {
    let status = response.status();
    let index = response
        .headers()
        .get(INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or_default();

    let body = response.bytes().await.map_err(|source| StoreError::Transport {
        endpoint: endpoint.to_string(),
        source,
    })?;

    decode_body(endpoint, status.as_u16(), index, &body)
}

pub(crate) fn decode_body(
    endpoint: &str,
    status: u16,
    index: u64,
    body: &[u8],
) -> StoreResult<Response> {
    if (200..300).contains(&status) {
        let mut response: Response =
            serde_json::from_slice(body).map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        response.index = index;
        return Ok(response);
    }

    match serde_json::from_slice::<ApiError>(body) {
        Ok(api_error) => Err(StoreError::Api(api_error)),
        Err(_) => Err(StoreError::Status {
            endpoint: endpoint.to_string(),
            status,
        }),
    }
}
