use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicTerms {
    pub term_fall: bool,
    pub term_winter: bool,
    pub term_spring: bool,
    pub term_summer: bool,
}

/// Catalog entry for a single course. The same course code can carry
/// different metadata across catalog years, so identity is always the
/// compound (catalog, id) pair, never the code alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub catalog: String,
    pub id: String,
    pub display_name: String,
    pub units: String,
    pub desc: String,
    pub addl: String,
    pub gwr_course: bool,
    pub uscp_course: bool,
    pub dynamic_terms: Option<DynamicTerms>,
}

impl Course {
    pub fn key(&self) -> CourseKey {
        CourseKey {
            catalog: self.catalog.clone(),
            id: self.id.clone(),
        }
    }
}

/// Compound lookup key for catalog courses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseKey {
    pub catalog: String,
    pub id: String,
}

impl CourseKey {
    pub fn new(catalog: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            id: id.into(),
        }
    }
}
