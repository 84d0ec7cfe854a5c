use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, CourseKey, Program, Term};

/// Read access to the catalog data backing flowchart generation: degree
/// programs, their curriculum sheet templates, and the course listings
/// for each catalog year.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Looks up several programs at once. The result preserves the order
    /// of `ids`; unknown ids are simply absent.
    async fn get_programs_by_ids(&self, ids: &[String]) -> Result<Vec<Program>, AppError>;

    async fn get_program(&self, id: &str) -> Result<Option<Program>, AppError>;

    async fn get_course(&self, catalog: &str, id: &str) -> Result<Option<Course>, AppError>;

    /// Fetches the term layout of a program's template flowchart, or
    /// `None` when the program has no template on file.
    async fn get_template_terms(&self, program_id: &str) -> Result<Option<Vec<Term>>, AppError>;
}

pub struct SqliteCatalogProvider {
    db: SqlitePool,
}

impl SqliteCatalogProvider {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogProvider for SqliteCatalogProvider {
    async fn get_programs_by_ids(&self, ids: &[String]) -> Result<Vec<Program>, AppError> {
        Ok(repository::fetch_programs_by_ids(&self.db, ids).await?)
    }

    async fn get_program(&self, id: &str) -> Result<Option<Program>, AppError> {
        Ok(repository::find_program_by_id(&self.db, id).await?)
    }

    async fn get_course(&self, catalog: &str, id: &str) -> Result<Option<Course>, AppError> {
        repository::find_course(&self.db, catalog, id).await
    }

    async fn get_template_terms(&self, program_id: &str) -> Result<Option<Vec<Term>>, AppError> {
        repository::find_template_terms(&self.db, program_id).await
    }
}

/// Catalog held entirely in memory. Used by tests, and handy for running
/// the server against a fixture dataset without a database.
#[derive(Default)]
pub struct InMemoryCatalog {
    programs: HashMap<String, Program>,
    courses: HashMap<CourseKey, Course>,
    templates: HashMap<String, Vec<Term>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_program(&mut self, program: Program) {
        self.programs.insert(program.id.clone(), program);
    }

    pub fn add_course(&mut self, course: Course) {
        self.courses.insert(course.key(), course);
    }

    pub fn add_template(&mut self, program_id: &str, terms: Vec<Term>) {
        self.templates.insert(program_id.to_string(), terms);
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn get_programs_by_ids(&self, ids: &[String]) -> Result<Vec<Program>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.programs.get(id).cloned())
            .collect())
    }

    async fn get_program(&self, id: &str) -> Result<Option<Program>, AppError> {
        Ok(self.programs.get(id).cloned())
    }

    async fn get_course(&self, catalog: &str, id: &str) -> Result<Option<Course>, AppError> {
        let key = CourseKey::new(catalog, id);
        Ok(self.courses.get(&key).cloned())
    }

    async fn get_template_terms(&self, program_id: &str) -> Result<Option<Vec<Term>>, AppError> {
        Ok(self.templates.get(program_id).cloned())
    }
}
