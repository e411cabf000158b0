use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{PoolSource, TasteProfile},
    services::{RankOptions, RecommendationOutcome},
};

use super::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct RecommendationParams {
    /// Comma-separated pool sources; omitted means the default set
    pub sources: Option<String>,
    /// Price ceiling in whole currency units
    pub max_price: Option<u64>,
    pub limit: Option<usize>,
}

fn parse_sources(params: &RecommendationParams) -> AppResult<Vec<PoolSource>> {
    let Some(raw) = params.sources.as_deref() else {
        return Ok(PoolSource::DEFAULT.to_vec());
    };

    let sources: Vec<PoolSource> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(AppError::InvalidInput))
        .collect::<AppResult<_>>()?;

    if sources.is_empty() {
        return Err(AppError::InvalidInput(
            "sources must name at least one pool source".to_string(),
        ));
    }
    Ok(sources)
}

/// Returns the user's taste profile, building it on first request.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(steam_id): Path<String>,
) -> AppResult<Json<TasteProfile>> {
    let profile = state.recommender.get_or_build_profile(&steam_id).await?;
    Ok(Json(profile))
}

/// Rebuilds the user's taste profile from scratch, superseding any cached
/// snapshot.
pub async fn refresh_profile(
    State(state): State<AppState>,
    Path(steam_id): Path<String>,
) -> AppResult<Json<TasteProfile>> {
    let profile = state.recommender.refresh_profile(&steam_id).await?;
    Ok(Json(profile))
}

/// Returns ranked recommendations for the user. A library with no usable
/// signal yields a `no_signal` payload, not an error.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(steam_id): Path<String>,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<RecommendationOutcome>> {
    let sources = parse_sources(&params)?;
    let options = RankOptions {
        max_price: params.max_price,
        limit: params.limit,
    };

    let outcome = state
        .recommender
        .recommend(&steam_id, &sources, &options)
        .await?;
    Ok(Json(outcome))
}
