//! The direct-request HTTP surface.
//!
//! Authentication is an upstream concern: the server trusts the
//! `X-User-Id` header placed by the gateway in front of it.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use baba_core::ai::RecipeAi;
use baba_core::orchestrator::{PipelineConfig, run_pipeline};
use baba_core::plan::assemble::{self, PlanDraft};
use baba_core::request::{self, PlanRequest, RequestError};
use baba_db::models::{MealPlan, PlanSource, PlanType, TimeSlot, Variety};
use baba_db::queries::{plans as plan_db, preferences as pref_db, recipes as recipe_db};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ai: Arc<dyn RecipeAi>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// The shared caller contract, camelCase on the wire. Every field is
/// optional so partial bodies work; parse failures on enum strings are 400s.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlanBody {
    pub meal_plan_prompt: String,
    pub ingredients_on_hand: Option<String>,
    pub calorie_target: Option<i32>,
    pub dietary_preferences: Vec<String>,
    pub preferred_cooking_oil: Option<String>,
    #[serde(rename = "type")]
    pub plan_type: Option<String>,
    pub include_shopping_list: bool,
    pub variety: Option<String>,
    pub slots: Vec<String>,
    pub reuse_last_week: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    pub plan_id: Uuid,
    pub plain_text_plan: String,
    pub linked_plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub plain_text_plan: String,
    pub linked_plan: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/meal-plans", post(create_meal_plan))
        .route("/api/meal-plans/{id}", get(get_meal_plan))
        .route("/api/recipes/{id}", get(get_recipe))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, ai: Arc<dyn RecipeAi>, bind: &str, port: u16) -> Result<()> {
    let app = build_router(AppState { pool, ai });
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("baba serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("baba serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\
<html><head><title>baba</title></head><body>\
<h1>baba</h1>\
<p>POST /api/meal-plans | GET /api/meal-plans/{id} | GET /api/recipes/{id}</p>\
</body></html>",
    )
}

async fn create_meal_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MealPlanBody>,
) -> Result<axum::response::Response, AppError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("missing X-User-Id header"))?;

    let mut request = PlanRequest::new(user_id, PlanSource::Api);
    request.meal_plan_prompt = body.meal_plan_prompt;
    request.ingredients_on_hand = body.ingredients_on_hand;
    request.calorie_target = body.calorie_target;
    request.dietary_preferences = body.dietary_preferences;
    request.preferred_cooking_oil = body.preferred_cooking_oil;
    request.include_shopping_list = body.include_shopping_list;
    request.reuse_last_week = body.reuse_last_week;

    if let Some(ref plan_type) = body.plan_type {
        request.plan_type = plan_type
            .parse::<PlanType>()
            .map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    if let Some(ref variety) = body.variety {
        request.variety = variety
            .parse::<Variety>()
            .map_err(|e| AppError::bad_request(e.to_string()))?;
    }
    request.slots = body
        .slots
        .iter()
        .map(|s| s.parse::<TimeSlot>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    // Merge stored defaults once, at the boundary.
    if let Some(stored) = pref_db::get_preferences(&state.pool, &request.user_id)
        .await
        .map_err(AppError::internal)?
    {
        request::apply_stored_defaults(&mut request, &stored);
    }

    let output = run_pipeline(
        &state.pool,
        state.ai.as_ref(),
        None,
        &request,
        &PipelineConfig::default(),
    )
    .await
    .map_err(|e| {
        // Invalid input is the caller's fault; everything else is ours.
        if e.downcast_ref::<RequestError>().is_some() {
            AppError::bad_request(format!("{e:#}"))
        } else {
            AppError::internal(e)
        }
    })?;

    Ok(Json(MealPlanResponse {
        plan_id: output.plan_id,
        plain_text_plan: output.plain_text_plan,
        linked_plan: output.linked_plan,
        shopping_list: output.shopping_list,
    })
    .into_response())
}

async fn get_meal_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let plan = plan_db::get_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;

    let draft = PlanDraft::from_plan(&plan);
    let plain_text_plan = assemble::render_plain(&draft);
    let linked_plan = assemble::render_linked(&draft);

    Ok(Json(PlanDetailResponse {
        plan,
        plain_text_plan,
        linked_plan,
    })
    .into_response())
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let recipe = recipe_db::get_recipe(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("recipe {id} not found")))?;

    Ok(Json(recipe).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
