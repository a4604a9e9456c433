//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, opening hub sockets,
//! and asserting on the frames the gateway sends back.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use collab_common::{AppConfig, HubConfig, InMemoryRevocationList, JwtService};
use collab_core::Identity;
use collab_gateway::events::GatewayEventType;
use collab_gateway::protocol::{GatewayMessage, OpCode};
use collab_gateway::{create_app, serve, GatewayState};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::fixtures::{TEST_AUDIENCE, TEST_ISSUER, TEST_SECRET};

/// How long a test waits for an expected frame
pub const FRAME_WAIT: Duration = Duration::from_secs(3);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    /// Mints tokens the server accepts
    pub jwt: JwtService,
    /// Revocation list consulted by the server
    pub revocations: Arc<InMemoryRevocationList>,
    hub: HubConfig,
    shutdown: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()?).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let jwt = JwtService::from_config(&config.jwt);
        let revocations = Arc::new(InMemoryRevocationList::new());
        let hub = config.hub.clone();

        let state = GatewayState::new(
            config.clone(),
            Arc::new(JwtService::from_config(&config.jwt)),
            revocations.clone(),
        );
        let app = create_app(state);

        // Port 0 lets the OS pick a free port
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            serve(listener, app, shutdown).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            jwt,
            revocations,
            hub,
            shutdown: Some(shutdown_tx),
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the document hub endpoint
    pub fn hub_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.hub.document_path())
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Issue a token for an identity
    pub fn token_for(&self, identity: &Identity) -> Result<String> {
        Ok(self.jwt.issue_token(identity)?)
    }

    /// Issue a token that expired at the given instant
    pub fn token_until(&self, identity: &Identity, expires_at: DateTime<Utc>) -> Result<String> {
        Ok(self.jwt.issue_token_until(identity, expires_at)?)
    }

    /// Open a hub connection authenticated through the Authorization header
    pub async fn connect(&self, identity: &Identity) -> Result<WsClient> {
        let token = self.token_for(identity)?;
        WsClient::connect_bearer(&self.hub_url(), &token).await
    }

    /// Open a hub connection authenticated through the `access_token` query
    pub async fn connect_with_query(&self, identity: &Identity) -> Result<WsClient> {
        let token = self.token_for(identity)?;
        WsClient::connect_query(&self.hub_url(), &token).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Create a test configuration
pub fn test_config() -> Result<AppConfig> {
    test_config_with(&[])
}

/// Create a test configuration with extra variables layered on top
pub fn test_config_with(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = [
        ("GATEWAY_PORT", "0"),
        ("JWT_SECRET", TEST_SECRET),
        ("JWT_ISSUER", TEST_ISSUER),
        ("JWT_AUDIENCE", TEST_AUDIENCE),
        ("HEARTBEAT_INTERVAL_MS", "1000"),
        ("HEARTBEAT_TIMEOUT_MS", "5000"),
    ]
    .iter()
    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
    .collect();

    for (k, v) in overrides {
        vars.insert((*k).to_string(), (*v).to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned())
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Status of a refused WebSocket handshake
pub async fn handshake_status(request_url: &str, bearer: Option<&str>) -> Result<u16> {
    let mut request = request_url.into_client_request()?;
    if let Some(token) = bearer {
        request
            .headers_mut()
            .insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
    }

    match connect_async(request).await {
        Ok(_) => bail!("handshake unexpectedly succeeded"),
        Err(WsError::Http(response)) => Ok(response.status().as_u16()),
        Err(e) => Err(e.into()),
    }
}

/// A dispatched event as seen by a client
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub event: String,
    pub sequence: u64,
    pub data: Value,
}

/// A connected hub client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Connection id announced in Hello
    pub connection_id: String,
    /// Heartbeat interval announced in Hello
    pub heartbeat_interval: u64,
}

impl WsClient {
    /// Connect with a bearer header and consume the Hello frame
    pub async fn connect_bearer(url: &str, token: &str) -> Result<Self> {
        let mut request = url.into_client_request()?;
        request
            .headers_mut()
            .insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
        Self::open(request).await
    }

    /// Connect with an `access_token` query parameter and consume the Hello frame
    pub async fn connect_query(url: &str, token: &str) -> Result<Self> {
        let request = format!("{url}?access_token={token}").into_client_request()?;
        Self::open(request).await
    }

    async fn open(
        request: tokio_tungstenite::tungstenite::handshake::client::Request,
    ) -> Result<Self> {
        let (stream, _) = connect_async(request).await?;
        let mut client = Self {
            stream,
            connection_id: String::new(),
            heartbeat_interval: 0,
        };

        let hello = client.next_message().await?;
        if hello.op != OpCode::Hello {
            bail!("expected Hello as the first frame, got {}", hello.op);
        }
        let data = hello.d.unwrap_or_default();
        client.connection_id = data["connection_id"]
            .as_str()
            .context("Hello without connection_id")?
            .to_string();
        client.heartbeat_interval = data["heartbeat_interval"].as_u64().unwrap_or_default();

        Ok(client)
    }

    /// Send a client op with a payload
    pub async fn send_op(&mut self, op: OpCode, d: Value) -> Result<()> {
        let message = GatewayMessage {
            op,
            t: None,
            s: None,
            d: Some(d),
        };
        self.send_raw(&message.to_json()?).await
    }

    /// Send a raw text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    pub async fn join(&mut self, document_id: &str) -> Result<()> {
        self.send_op(OpCode::JoinRoom, json!({ "document_id": document_id }))
            .await
    }

    pub async fn leave(&mut self, document_id: &str) -> Result<()> {
        self.send_op(OpCode::LeaveRoom, json!({ "document_id": document_id }))
            .await
    }

    pub async fn push_content(
        &mut self,
        document_id: &str,
        content: &str,
        cursor_position: i64,
    ) -> Result<()> {
        self.send_op(
            OpCode::PushContentChange,
            json!({
                "document_id": document_id,
                "content": content,
                "cursor_position": cursor_position,
            }),
        )
        .await
    }

    pub async fn push_cursor(&mut self, document_id: &str, position: i64) -> Result<()> {
        self.send_op(
            OpCode::PushCursorPosition,
            json!({ "document_id": document_id, "position": position }),
        )
        .await
    }

    pub async fn heartbeat(&mut self, seq: Option<u64>) -> Result<()> {
        self.send_op(OpCode::Heartbeat, json!(seq)).await
    }

    /// Next gateway message, failing on close or timeout
    pub async fn next_message(&mut self) -> Result<GatewayMessage> {
        loop {
            let frame = tokio::time::timeout(FRAME_WAIT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?;

            match frame {
                Some(Ok(Message::Text(text))) => return Ok(GatewayMessage::from_json(&text)?),
                Some(Ok(Message::Close(frame))) => bail!("connection closed: {frame:?}"),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => bail!("connection ended"),
            }
        }
    }

    /// Next dispatch, skipping heartbeat acks
    pub async fn next_dispatch(&mut self) -> Result<Dispatch> {
        loop {
            let message = self.next_message().await?;
            if message.op != OpCode::Dispatch {
                continue;
            }
            return Ok(Dispatch {
                event: message.t.context("dispatch without event type")?,
                sequence: message.s.context("dispatch without sequence")?,
                data: message.d.unwrap_or_default(),
            });
        }
    }

    /// Next dispatch, which must be of the given type
    pub async fn expect_event(&mut self, event: GatewayEventType) -> Result<Value> {
        let dispatch = self.next_dispatch().await?;
        if dispatch.event != event.as_str() {
            bail!(
                "expected {}, got {} with {}",
                event.as_str(),
                dispatch.event,
                dispatch.data
            );
        }
        Ok(dispatch.data)
    }

    /// Assert that no dispatch arrives within `wait`
    pub async fn expect_quiet(&mut self, wait: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let frame = match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => return Ok(()),
                Ok(frame) => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    let message = GatewayMessage::from_json(&text)?;
                    if message.op == OpCode::Dispatch {
                        bail!("unexpected dispatch: {message}");
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => bail!("connection ended"),
            }
        }
    }

    /// Wait for the server to close the socket and return the close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        loop {
            let frame = tokio::time::timeout(FRAME_WAIT * 3, self.stream.next())
                .await
                .context("timed out waiting for close")?;

            match frame {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Close the socket politely
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
