use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CatalogProvider;
use crate::error::AppError;
use crate::models::{Course, CourseKey, Flowchart};

/// Deduplicated index of every course referenced by a set of flowcharts,
/// keyed by `(catalog, courseId)`. Built fresh per request; the ordered map
/// keeps serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseCache {
    entries: BTreeMap<CourseKey, Course>,
}

impl CourseCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, catalog: &str, id: &str) -> Option<&Course> {
        self.entries.get(&CourseKey::new(catalog, id))
    }

    /// Projects the flat mapping into the transport shape: one bucket per
    /// catalog year, courses ordered by id within each bucket.
    pub fn into_catalog_buckets(self) -> Vec<CatalogCourses> {
        let mut buckets: Vec<CatalogCourses> = Vec::new();
        for (key, course) in self.entries {
            match buckets.last_mut() {
                Some(bucket) if bucket.catalog == key.catalog => bucket.courses.push(course),
                _ => buckets.push(CatalogCourses {
                    catalog: key.catalog,
                    courses: vec![course],
                }),
            }
        }
        buckets
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCourses {
    pub catalog: String,
    pub courses: Vec<Course>,
}

/// Accumulates course cache entries across repeated `add_flowchart` calls.
/// Feeding the same total set of flowcharts through one builder or through
/// several one-shot builds yields the same mapping.
#[derive(Default)]
pub struct CourseCacheBuilder {
    entries: BTreeMap<CourseKey, Course>,
}

impl CourseCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_flowchart(
        &mut self,
        flowchart: &Flowchart,
        provider: &dyn CatalogProvider,
    ) -> Result<(), AppError> {
        let catalogs = flowchart_catalogs(flowchart, provider).await?;

        for term in &flowchart.term_data {
            for slot in &term.courses {
                // Placeholders never resolve against the catalog.
                let Some(course_id) = slot.course_id() else {
                    continue;
                };
                let index = slot.program_id_index();
                let catalog = catalogs.get(index).ok_or_else(|| {
                    AppError::InvalidReference(format!(
                        "slot {} in flowchart {} references program index {} but the flowchart lists {} programs",
                        course_id,
                        flowchart.id,
                        index,
                        catalogs.len()
                    ))
                })?;

                let key = CourseKey::new(catalog, course_id);
                if self.entries.contains_key(&key) {
                    continue;
                }
                match provider.get_course(catalog, course_id).await? {
                    Some(course) => {
                        self.entries.insert(key, course);
                    }
                    None => {
                        // Stale template data; the cache just omits it.
                        debug!(
                            "course ({}, {}) not found in catalog, skipping",
                            catalog, course_id
                        );
                    }
                }
            }
        }

        Ok(())
    }

    pub fn finish(self) -> CourseCache {
        CourseCache {
            entries: self.entries,
        }
    }
}

/// Builds the course cache for a batch of flowcharts in one call.
pub async fn build_course_cache(
    flowcharts: &[Flowchart],
    provider: &dyn CatalogProvider,
) -> Result<CourseCache, AppError> {
    let mut builder = CourseCacheBuilder::new();
    for flowchart in flowcharts {
        builder.add_flowchart(flowchart, provider).await?;
    }
    Ok(builder.finish())
}

/// Resolves a flowchart's program list to the catalog year each slot index
/// points at. A stored flowchart referencing a program the provider does not
/// know is corrupt data, not user error.
async fn flowchart_catalogs(
    flowchart: &Flowchart,
    provider: &dyn CatalogProvider,
) -> Result<Vec<String>, AppError> {
    let programs = provider.get_programs_by_ids(&flowchart.program_id).await?;
    let by_id: HashMap<&str, &str> = programs
        .iter()
        .map(|p| (p.id.as_str(), p.catalog.as_str()))
        .collect();

    let mut catalogs = Vec::with_capacity(flowchart.program_id.len());
    for id in &flowchart.program_id {
        let catalog = by_id.get(id.as_str()).ok_or_else(|| {
            AppError::InvalidReference(format!(
                "flowchart {} references unknown program {}",
                flowchart.id, id
            ))
        })?;
        catalogs.push(catalog.to_string());
    }
    Ok(catalogs)
}
