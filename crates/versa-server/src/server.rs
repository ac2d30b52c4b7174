//! HTTP server implementation

use crate::error::ApiError;
use crate::pipeline::{request_id, VersionedService};
use crate::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

pub(crate) struct Server {
    service: VersionedService,
}

impl Server {
    pub fn new(service: VersionedService) -> Self {
        Self { service }
    }

    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!(
            addr = %addr,
            latest = %self.service.bundle().latest(),
            "Versa server listening"
        );

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let service = self.service.clone();

            tokio::spawn(async move {
                let handler = service_fn(move |req: hyper::Request<Incoming>| {
                    let service = service.clone();
                    async move { Ok::<_, Infallible>(handle_request(service, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, handler).await {
                    error!(remote = %remote_addr, "Connection error: {}", err);
                }
            });
        }
    }
}

async fn handle_request(service: VersionedService, req: hyper::Request<Incoming>) -> Response {
    let (parts, body) = req.into_parts();
    let collected = match service.body_limit() {
        Some(limit) => Limited::new(body, limit).collect().await,
        None => body.collect().await.map_err(Into::into),
    };

    let bytes = match collected {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let err = match service.body_limit() {
                Some(limit) if err.is::<LengthLimitError>() => ApiError::payload_too_large(limit),
                _ => ApiError::bad_request("Failed to read request body").with_internal(err.to_string()),
            };
            return err.with_request_id(request_id(&parts.headers)).into_response();
        }
    };

    service.call(http::Request::from_parts(parts, bytes)).await
}
