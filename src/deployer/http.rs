// ABOUTME: Deployer backed by a deployment gateway over HTTP/1.1.
// ABOUTME: POSTs JSON to /deploy, /call and /send using a hyper client connection.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

use super::{Arg, Artifact, Deployed, Deployer, DeployerError, TxReceipt};
use crate::types::Address;

/// Client for a gateway that holds the signing keys and node connection.
///
/// Wire format:
/// - `POST /deploy` `{contract, args, libraries}` → `{address, transactionHash, gasUsed}`
/// - `POST /call` `{address, method, args}` → `{value}`
/// - `POST /send` `{address, method, args}` → `{transactionHash, gasUsed}`
///
/// Non-2xx responses carry `{"error": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpDeployer {
    host: String,
    port: u16,
    authority: String,
    base_path: String,
}

#[derive(Serialize)]
struct MethodRequest<'a> {
    address: &'a Address,
    method: &'a str,
    args: &'a [Arg],
}

#[derive(Deserialize)]
struct CallResponse {
    value: Arg,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpDeployer {
    /// Create a client for `endpoint` (`http://host[:port][/base]`).
    pub fn new(endpoint: &str) -> Result<Self, DeployerError> {
        let uri: hyper::Uri = endpoint
            .parse()
            .map_err(|e| DeployerError::InvalidRequest(format!("invalid gateway URL: {e}")))?;

        if uri.scheme_str() != Some("http") {
            return Err(DeployerError::InvalidRequest(format!(
                "unsupported gateway scheme in {endpoint} (expected http)"
            )));
        }

        let host = uri
            .host()
            .ok_or_else(|| DeployerError::InvalidRequest(format!("missing host in {endpoint}")))?
            .to_string();
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            authority: format!("{host}:{port}"),
            host,
            port,
            base_path: uri.path().trim_end_matches('/').to_string(),
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
        rejected: fn(String) -> DeployerError,
    ) -> Result<R, DeployerError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|e| DeployerError::InvalidRequest(format!("failed to encode request: {e}")))?;

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                DeployerError::Transport(format!("failed to connect to {}: {}", self.authority, e))
            })?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| DeployerError::Transport(format!("HTTP handshake failed: {e}")))?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("gateway connection error: {}", e);
            }
        });

        let uri = format!("{}{}", self.base_path, path);
        let req = hyper::Request::builder()
            .method("POST")
            .uri(&uri)
            .header("Host", &self.authority)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| DeployerError::InvalidRequest(format!("failed to build request: {e}")))?;

        tracing::debug!("POST {} on gateway {}", uri, self.authority);
        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| DeployerError::Transport(format!("request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| DeployerError::Transport(format!("failed to read response: {e}")))?
            .to_bytes();

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(rejected(format!("{status}: {message}")));
        }

        serde_json::from_slice(&body).map_err(|e| {
            DeployerError::UnexpectedResponse(format!("{uri}: {e}"))
        })
    }
}

#[async_trait]
impl Deployer for HttpDeployer {
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployed, DeployerError> {
        self.post("/deploy", artifact, DeployerError::DeploymentFailed)
            .await
    }

    async fn call(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<Arg, DeployerError> {
        let request = MethodRequest {
            address,
            method,
            args,
        };
        let response: CallResponse = self
            .post("/call", &request, DeployerError::CallFailed)
            .await?;
        Ok(response.value)
    }

    async fn send(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<TxReceipt, DeployerError> {
        let request = MethodRequest {
            address,
            method,
            args,
        };
        self.post("/send", &request, DeployerError::TransactionFailed)
            .await
    }
}
