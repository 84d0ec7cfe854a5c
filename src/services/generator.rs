use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::catalog::CatalogProvider;
use crate::error::AppError;
use crate::models::Flowchart;
use crate::services::assembler::{AssembleOptions, assemble_flowchart};
use crate::services::cache::{CatalogCourses, build_course_cache};
use crate::services::merge::merge_term_templates;

/// Already-validated generation input, as supplied by the request boundary.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub name: String,
    pub start_year: String,
    pub program_ids: Vec<String>,
    pub remove_ge_courses: bool,
    pub generate_course_cache: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub generated_flowchart: Flowchart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_cache: Option<Vec<CatalogCourses>>,
}

/// Drives the generation flow end to end: resolve programs, fetch their
/// template term plans, merge, assemble, and optionally build the course
/// cache for the fresh flowchart.
pub struct FlowchartGenerator {
    catalog: Arc<dyn CatalogProvider>,
}

impl FlowchartGenerator {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { catalog }
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
        owner_id: &str,
    ) -> Result<GenerationResult, AppError> {
        info!(
            "Generating flowchart {:?} for {} program(s)",
            request.name,
            request.program_ids.len()
        );

        let programs = self.catalog.get_programs_by_ids(&request.program_ids).await?;
        if programs.len() != request.program_ids.len() {
            let known: HashSet<&str> = programs.iter().map(|p| p.id.as_str()).collect();
            let missing: Vec<&str> = request
                .program_ids
                .iter()
                .map(|id| id.as_str())
                .filter(|id| !known.contains(id))
                .collect();
            return Err(AppError::invalid_input(
                "programIds",
                format!("unknown program ids: {}", missing.join(", ")),
            ));
        }

        let mut templates = Vec::with_capacity(programs.len());
        for program in &programs {
            let terms = self
                .catalog
                .get_template_terms(&program.id)
                .await?
                .ok_or_else(|| {
                    AppError::invalid_input(
                        "programIds",
                        format!("program {} has no template flowchart", program.id),
                    )
                })?;
            templates.push(terms);
        }

        let merged = merge_term_templates(&templates);
        let flowchart = assemble_flowchart(
            &programs,
            merged,
            &request.start_year,
            &request.name,
            owner_id,
            AssembleOptions {
                remove_ge_courses: request.remove_ge_courses,
            },
        )?;

        let course_cache = if request.generate_course_cache {
            let cache =
                build_course_cache(std::slice::from_ref(&flowchart), self.catalog.as_ref())
                    .await?;
            Some(cache.into_catalog_buckets())
        } else {
            None
        };

        info!(
            "Generated flowchart {} with {} terms, {} units total",
            flowchart.id,
            flowchart.term_data.len(),
            flowchart.unit_total
        );

        Ok(GenerationResult {
            generated_flowchart: flowchart,
            course_cache,
        })
    }
}
