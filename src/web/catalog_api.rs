use std::convert::Infallible;
use std::sync::Arc;

use warp::reply::{self, Reply, Response};

use crate::catalog::CatalogSource;
use crate::error::{self, HttpError};
use crate::voting::Catalog;
use super::AppState;

pub async fn list_songs(state: AppState) -> Result<Response, Infallible> {
    Ok(match fetch(&state.catalog).await {
        Ok(catalog) => reply::json(&catalog).into_response(),
        Err(err) => err.into_response(),
    })
}

/// Runs a catalog fetch off the async workers, since sources may block on I/O.
pub async fn fetch(source: &Arc<dyn CatalogSource>) -> Result<Catalog, HttpError> {
    let source = Arc::clone(source);
    let catalog = tokio::task::spawn_blocking(move || source.fetch())
        .await
        .map_err(|err| error::background_task_failed("fetch catalog", err))??;
    Ok(catalog)
}
