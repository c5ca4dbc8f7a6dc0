use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::motive::{MotiveMaker, PreparedMotive};
use crate::render::PageTemplate;
use crate::tasks::prefetch::PrefetchQueue;

/// Where page requests get their motive from.
pub enum MotiveSource {
    /// Pop from the prefetch queue filled by the background producer.
    Prefetched {
        queue: PrefetchQueue,
        wait: Option<Duration>,
    },
    /// Search on the request path.
    Direct(Arc<MotiveMaker>),
}

impl MotiveSource {
    /// # Errors
    /// Whatever the queue or the search reports; nothing is swallowed.
    pub async fn next(&self) -> Result<PreparedMotive, Error> {
        match self {
            Self::Prefetched { queue, wait } => queue.pop_within(*wait).await,
            Self::Direct(maker) => maker.make().await,
        }
    }
}

#[derive(Clone)]
struct AppState {
    source: Arc<MotiveSource>,
    template: Arc<PageTemplate>,
}

pub fn router(source: MotiveSource, template: PageTemplate) -> Router {
    let state = AppState {
        source: Arc::new(source),
        template: Arc::new(template),
    };
    Router::new()
        .route("/", get(motive_page))
        .route("/favicon.ico", get(not_found))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub fn spawn(app: Router, listener: TcpListener, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = listener.local_addr().ok();
        tracing::info!(?addr, "motive server listening");
        if let Err(err) = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await
        {
            tracing::error!(error = %err, "motive server failed");
        }
    })
}

/// Bind `addr` and serve until `cancel` fires.
pub async fn serve(app: Router, addr: SocketAddr, cancel: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind motive server on {addr}"))?;
    spawn(app, listener, cancel)
        .await
        .context("motive server task failed")
}

async fn motive_page(State(state): State<AppState>) -> Response {
    match state.source.next().await {
        Ok(motive) => {
            tracing::debug!(theme = %motive.theme.title, url = %motive.image.url, "serving motive");
            Html(state.template.render(&motive)).into_response()
        }
        Err(err) => {
            let status = status_for(&err);
            tracing::error!(error = %err, %status, "failed to produce motive");
            (status, Html(error_page(status))).into_response()
        }
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn healthz() -> &'static str {
    "ok"
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        e if e.is_transport() => StatusCode::BAD_GATEWAY,
        Error::NoResults { .. }
        | Error::NoUsableImage { .. }
        | Error::PrefetchClosed
        | Error::PrefetchTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_page(status: StatusCode) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{code}</title></head>\
<body><h2>No motive right now</h2><p>{code}: try again in a moment.</p></body></html>",
        code = status
    )
}
