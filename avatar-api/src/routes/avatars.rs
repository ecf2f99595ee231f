use std::{
    io,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use futures::Stream;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::{
        authorization::authorize_write,
        models::{Artifact, AvatarId, AvatarRequest, UploadOutcome},
        negotiation::accepts_alt_format,
        AvatarError,
    },
    routes::ApiError,
};

const UPLOAD_FIELD: &str = "filedata";
// Room for multipart framing on top of the payload limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/:id", get(serve_avatar).post(upload_avatar))
        .route_layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

#[derive(Debug, Deserialize)]
struct AvatarQuery {
    s: Option<String>,
    t: Option<String>,
}

impl AvatarQuery {
    fn into_request(self, id: AvatarId, headers: &HeaderMap) -> AvatarRequest {
        AvatarRequest {
            id,
            requested_size: self.s.and_then(|s| s.trim().parse::<i64>().ok()),
            type_override: self.t,
            accepts_alt_format: headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(accepts_alt_format)
                .unwrap_or(false),
        }
    }
}

/// Streams an artifact's bytes while holding a handle to it, so the file
/// outlives a cache eviction that happens mid-send.
struct ArtifactStream {
    inner: ReaderStream<tokio::fs::File>,
    _artifact: Arc<Artifact>,
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[instrument(name = "GET /:id", skip(app_state, headers))]
async fn serve_avatar(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AvatarQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = AvatarId::try_from(id).map_err(AvatarError::from)?;
    let request = query.into_request(id, &headers);

    let served = app_state.avatar_service.get_avatar(&request).await?;

    let file = tokio::fs::File::open(served.artifact.path())
        .await
        .map_err(|e| ApiError::internal(format!("failed to open artifact: {e}")))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("failed to stat artifact: {e}")))?
        .len();

    let stream = ArtifactStream {
        inner: ReaderStream::new(file),
        _artifact: served.artifact,
    };

    let mut response = Response::new(Body::from_stream(stream));
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&served.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response_headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&format!(
            "public, max-age={}",
            app_state.cache_max_age.as_secs()
        ))
        .map_err(|e| ApiError::internal(e.to_string()))?,
    );

    Ok(response)
}

#[instrument(name = "POST /:id", skip(app_state, multipart))]
async fn upload_avatar(
    State(app_state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Path(id): Path<String>,
    multipart: Option<Multipart>,
) -> Result<(StatusCode, &'static str), ApiError> {
    // Reject before looking at the id or buffering the body.
    authorize_write(remote.ip()).map_err(AvatarError::from)?;
    let id = AvatarId::try_from(id).map_err(AvatarError::from)?;

    let image = match multipart {
        Some(mut multipart) => extract_upload(&mut multipart).await?,
        None => None,
    };

    let outcome = app_state
        .avatar_service
        .upload_avatar(&id, image, remote.ip())
        .await?;

    Ok(match outcome {
        UploadOutcome::Stored => (StatusCode::OK, "File uploaded!"),
        UploadOutcome::NoFile => (StatusCode::OK, "No files were uploaded."),
    })
}

async fn extract_upload(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        return Ok(Some(bytes.to_vec()));
    }

    Ok(None)
}
