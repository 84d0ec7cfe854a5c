use std::collections::HashSet;

use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::db::repository;
use crate::error::AppError;
use crate::models::Flowchart;
use crate::services::{
    CatalogCourses, FlowchartGenerator, GenerationRequest, GenerationResult, build_course_cache,
};
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 80;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateFlowchartRequest {
    name: String,
    start_year: String,
    program_ids: Vec<String>,
    owner_id: String,
    #[serde(default, rename = "removeGECourses")]
    remove_ge_courses: bool,
    #[serde(default)]
    generate_course_cache: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerQueryParams {
    owner_id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/flowcharts", get(list_flowcharts))
        .route("/flowcharts/generate", post(generate_flowchart))
        .route("/flowcharts/course-cache", get(owner_course_cache))
        .route("/flowcharts/{id}", get(get_flowchart))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn generate_flowchart(
    State(state): State<AppState>,
    Json(req): Json<GenerateFlowchartRequest>,
) -> Result<Json<GenerationResult>, AppError> {
    validate_generate_request(&req)?;

    let generator = FlowchartGenerator::new(state.catalog.clone());
    let request = GenerationRequest {
        name: req.name.trim().to_string(),
        start_year: req.start_year.clone(),
        program_ids: req.program_ids.clone(),
        remove_ge_courses: req.remove_ge_courses,
        generate_course_cache: req.generate_course_cache,
    };
    let mut result = generator.generate(request, &req.owner_id).await?;
    result.generated_flowchart =
        repository::insert_flowchart(&state.db, result.generated_flowchart).await?;
    Ok(Json(result))
}

async fn list_flowcharts(
    State(state): State<AppState>,
    Query(params): Query<OwnerQueryParams>,
) -> Result<Json<Vec<Flowchart>>, AppError> {
    let flowcharts = repository::fetch_flowcharts_by_owner(&state.db, &params.owner_id).await?;
    Ok(Json(flowcharts))
}

async fn get_flowchart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Flowchart>, AppError> {
    let flowchart = repository::find_flowchart_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(flowchart))
}

async fn owner_course_cache(
    State(state): State<AppState>,
    Query(params): Query<OwnerQueryParams>,
) -> Result<Json<Vec<CatalogCourses>>, AppError> {
    let flowcharts = repository::fetch_flowcharts_by_owner(&state.db, &params.owner_id).await?;
    let cache = build_course_cache(&flowcharts, state.catalog.as_ref()).await?;
    Ok(Json(cache.into_catalog_buckets()))
}

fn validate_generate_request(req: &GenerateFlowchartRequest) -> Result<(), AppError> {
    // Validate the name as it will be stored, ignoring surrounding whitespace.
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("name", "name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::invalid_input(
            "name",
            format!("name must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    if req.start_year.len() != 4 || !req.start_year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::invalid_input(
            "startYear",
            "startYear must be a 4-digit year",
        ));
    }
    if req.program_ids.is_empty() {
        return Err(AppError::invalid_input(
            "programIds",
            "at least one program id is required",
        ));
    }
    let mut seen = HashSet::new();
    for id in &req.program_ids {
        if !seen.insert(id.as_str()) {
            return Err(AppError::invalid_input(
                "programIds",
                format!("duplicate program id: {}", id),
            ));
        }
    }
    if req.owner_id.trim().is_empty() {
        return Err(AppError::invalid_input("ownerId", "ownerId must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> GenerateFlowchartRequest {
        GenerateFlowchartRequest {
            name: "test".to_string(),
            start_year: "2020".to_string(),
            program_ids: vec!["p-1".to_string()],
            owner_id: "owner-1".to_string(),
            remove_ge_courses: false,
            generate_course_cache: false,
        }
    }

    fn rejected_field(req: &GenerateFlowchartRequest) -> String {
        match validate_generate_request(req).unwrap_err() {
            AppError::InvalidInput { field, .. } => field,
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn accepts_a_valid_request() {
        assert!(validate_generate_request(&valid_request()).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let mut req = valid_request();
        req.name = "   ".to_string();
        assert_eq!(rejected_field(&req), "name");
    }

    #[test]
    fn rejects_overlong_name() {
        let mut req = valid_request();
        req.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(rejected_field(&req), "name");
    }

    #[test]
    fn name_length_limit_ignores_surrounding_whitespace() {
        // Padding around a maximum-length name is trimmed before storage,
        // so it must not count against the limit either.
        let mut req = valid_request();
        req.name = format!("  {}  ", "x".repeat(MAX_NAME_LENGTH));
        assert!(validate_generate_request(&req).is_ok());
    }

    #[test]
    fn rejects_malformed_start_year() {
        for year in ["20", "20201", "20x0", ""] {
            let mut req = valid_request();
            req.start_year = year.to_string();
            assert_eq!(rejected_field(&req), "startYear");
        }
    }

    #[test]
    fn rejects_empty_program_list() {
        let mut req = valid_request();
        req.program_ids.clear();
        assert_eq!(rejected_field(&req), "programIds");
    }

    #[test]
    fn rejects_duplicate_program_ids() {
        let mut req = valid_request();
        req.program_ids = vec!["p-1".to_string(), "p-1".to_string()];
        assert_eq!(rejected_field(&req), "programIds");
    }

    #[test]
    fn rejects_blank_owner() {
        let mut req = valid_request();
        req.owner_id = String::new();
        assert_eq!(rejected_field(&req), "ownerId");
    }
}
