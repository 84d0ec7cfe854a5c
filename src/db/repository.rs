use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppError;
use crate::models::{Course, DynamicTerms, Flowchart, Program, Term};

#[derive(FromRow)]
struct CourseRow {
    catalog: String,
    id: String,
    display_name: String,
    units: String,
    desc: String,
    addl: String,
    gwr_course: bool,
    uscp_course: bool,
    dynamic_terms: Option<String>,
}

impl CourseRow {
    fn into_course(self) -> Result<Course, AppError> {
        let dynamic_terms: Option<DynamicTerms> = match self.dynamic_terms {
            Some(raw) => serde_json::from_str(&raw)?,
            None => None,
        };
        Ok(Course {
            catalog: self.catalog,
            id: self.id,
            display_name: self.display_name,
            units: self.units,
            desc: self.desc,
            addl: self.addl,
            gwr_course: self.gwr_course,
            uscp_course: self.uscp_course,
            dynamic_terms,
        })
    }
}

#[derive(FromRow)]
struct FlowchartRow {
    id: String,
    owner_id: String,
    name: String,
    program_ids: String,
    start_year: String,
    term_data: String,
    unit_total: String,
    notes: String,
    version: i32,
    published_id: Option<String>,
    imported_id: Option<String>,
    hash: String,
    last_updated_utc: String,
}

impl FlowchartRow {
    fn into_flowchart(self) -> Result<Flowchart, AppError> {
        Ok(Flowchart {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            program_id: serde_json::from_str(&self.program_ids)?,
            start_year: self.start_year,
            term_data: serde_json::from_str(&self.term_data)?,
            unit_total: self.unit_total,
            notes: self.notes,
            version: self.version,
            published_id: self.published_id,
            imported_id: self.imported_id,
            hash: self.hash,
            last_updated_utc: self.last_updated_utc,
        })
    }
}

pub async fn find_program_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<Program>, sqlx::Error> {
    sqlx::query_as::<_, Program>(
        "SELECT id, catalog, major_name, conc_name, code, data_link FROM programs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Fetches the given programs, returning them in the order the ids were
/// supplied. Ids that match no row are simply absent from the result.
pub async fn fetch_programs_by_ids(
    db: &SqlitePool,
    ids: &[String],
) -> Result<Vec<Program>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, catalog, major_name, conc_name, code, data_link FROM programs WHERE id IN ({})",
        placeholders
    );
    let mut query = sqlx::query_as::<_, Program>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let fetched: std::collections::HashMap<String, Program> = query
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    // One result per requested position, repeated ids included, so callers
    // see the same shape the in-memory provider returns.
    Ok(ids.iter().filter_map(|id| fetched.get(id).cloned()).collect())
}

pub async fn find_course(
    db: &SqlitePool,
    catalog: &str,
    id: &str,
) -> Result<Option<Course>, AppError> {
    let row = sqlx::query_as::<_, CourseRow>(
        r#"SELECT catalog, id, display_name, units, "desc", addl, gwr_course, uscp_course, dynamic_terms
           FROM courses WHERE catalog = ? AND id = ?"#,
    )
    .bind(catalog)
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(CourseRow::into_course).transpose()
}

pub async fn find_template_terms(
    db: &SqlitePool,
    program_id: &str,
) -> Result<Option<Vec<Term>>, AppError> {
    let raw: Option<String> = sqlx::query_scalar(
        "SELECT term_data FROM template_flowcharts WHERE program_id = ?",
    )
    .bind(program_id)
    .fetch_optional(db)
    .await?;

    raw.map(|data| serde_json::from_str(&data).map_err(AppError::from))
        .transpose()
}

/// Persists an assembled flowchart, assigning the storage-owned fields:
/// the content hash and the last-updated timestamp.
pub async fn insert_flowchart(db: &SqlitePool, mut fc: Flowchart) -> Result<Flowchart, AppError> {
    fc.hash = content_hash(&fc)?;
    fc.last_updated_utc = Utc::now().to_rfc3339();

    let program_ids = serde_json::to_string(&fc.program_id)?;
    let term_data = serde_json::to_string(&fc.term_data)?;

    sqlx::query(
        r#"
        INSERT INTO flowcharts
            (id, owner_id, name, program_ids, start_year, term_data,
            unit_total, notes, version, published_id, imported_id, hash, last_updated_utc)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&fc.id)
    .bind(&fc.owner_id)
    .bind(&fc.name)
    .bind(&program_ids)
    .bind(&fc.start_year)
    .bind(&term_data)
    .bind(&fc.unit_total)
    .bind(&fc.notes)
    .bind(fc.version)
    .bind(&fc.published_id)
    .bind(&fc.imported_id)
    .bind(&fc.hash)
    .bind(&fc.last_updated_utc)
    .execute(db)
    .await?;

    Ok(fc)
}

pub async fn find_flowchart_by_id(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<Flowchart>, AppError> {
    let row = sqlx::query_as::<_, FlowchartRow>(
        r#"
        SELECT id, owner_id, name, program_ids, start_year, term_data,
               unit_total, notes, version, published_id, imported_id, hash, last_updated_utc
        FROM flowcharts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(FlowchartRow::into_flowchart).transpose()
}

pub async fn fetch_flowcharts_by_owner(
    db: &SqlitePool,
    owner_id: &str,
) -> Result<Vec<Flowchart>, AppError> {
    let rows = sqlx::query_as::<_, FlowchartRow>(
        r#"
        SELECT id, owner_id, name, program_ids, start_year, term_data,
               unit_total, notes, version, published_id, imported_id, hash, last_updated_utc
        FROM flowcharts
        WHERE owner_id = ?
        ORDER BY last_updated_utc DESC, id
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;

    rows.into_iter().map(FlowchartRow::into_flowchart).collect()
}

fn content_hash(fc: &Flowchart) -> Result<String, serde_json::Error> {
    let content = serde_json::to_vec(&(
        &fc.owner_id,
        &fc.name,
        &fc.program_id,
        &fc.start_year,
        &fc.term_data,
        &fc.unit_total,
        &fc.notes,
        fc.version,
    ))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseSlot, FLOWCHART_SCHEMA_VERSION, TermSlot};
    use uuid::Uuid;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    async fn insert_program(pool: &SqlitePool, id: &str, catalog: &str, major: &str) {
        sqlx::query(
            "INSERT INTO programs (id, catalog, major_name, conc_name, code, data_link) VALUES (?, ?, ?, '', ?, ?)",
        )
        .bind(id)
        .bind(catalog)
        .bind(major)
        .bind(format!("{}.{}", catalog, major))
        .bind("https://example.edu/roadmap.pdf")
        .execute(pool)
        .await
        .expect("Failed to insert program");
    }

    fn sample_flowchart(owner: &str) -> Flowchart {
        Flowchart {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            name: "test".to_string(),
            program_id: vec!["p-1".to_string()],
            start_year: "2020".to_string(),
            term_data: vec![Term {
                t_index: 1,
                t_units: "4".to_string(),
                courses: vec![TermSlot::Course(CourseSlot {
                    id: "MATH141".to_string(),
                    color: "#FEFD9A".to_string(),
                    program_id_index: None,
                })],
            }],
            unit_total: "4".to_string(),
            notes: String::new(),
            version: FLOWCHART_SCHEMA_VERSION,
            published_id: None,
            imported_id: None,
            hash: String::new(),
            last_updated_utc: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_flowchart() {
        let pool = setup_test_db().await;

        let saved = insert_flowchart(&pool, sample_flowchart("owner-1"))
            .await
            .expect("Failed to insert flowchart");
        assert!(!saved.hash.is_empty());
        assert!(!saved.last_updated_utc.is_empty());

        let fetched = fetch_flowcharts_by_owner(&pool, "owner-1")
            .await
            .expect("Failed to fetch flowcharts");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0], saved);
    }

    #[tokio::test]
    async fn test_content_hash_is_stable() {
        let fc = sample_flowchart("owner-1");
        let mut again = fc.clone();
        again.id = Uuid::new_v4().to_string();
        again.last_updated_utc = "2030-01-01T00:00:00+00:00".to_string();

        // Storage-owned fields do not participate in the hash.
        assert_eq!(content_hash(&fc).unwrap(), content_hash(&again).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_programs_preserves_request_order() {
        let pool = setup_test_db().await;
        insert_program(&pool, "p-a", "2015-2017", "Aerospace Engineering").await;
        insert_program(&pool, "p-b", "2015-2017", "Mathematics").await;

        let programs = fetch_programs_by_ids(
            &pool,
            &["p-b".to_string(), "p-a".to_string(), "p-missing".to_string()],
        )
        .await
        .expect("Failed to fetch programs");

        let ids: Vec<&str> = programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-b", "p-a"]);
    }

    #[tokio::test]
    async fn test_fetch_programs_resolves_repeated_ids_per_position() {
        let pool = setup_test_db().await;
        insert_program(&pool, "p-a", "2015-2017", "Aerospace Engineering").await;

        let programs = fetch_programs_by_ids(&pool, &["p-a".to_string(), "p-a".to_string()])
            .await
            .expect("Failed to fetch programs");

        let ids: Vec<&str> = programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p-a", "p-a"]);
    }

    #[tokio::test]
    async fn test_find_course_decodes_dynamic_terms() {
        let pool = setup_test_db().await;
        sqlx::query(
            r#"INSERT INTO courses (catalog, id, display_name, units, "desc", addl, gwr_course, uscp_course, dynamic_terms)
               VALUES ('2015-2017', 'AERO121', 'Aerospace Fundamentals', '2', 'Intro.', '', 0, 0, ?)"#,
        )
        .bind(r#"{"termFall":true,"termWinter":false,"termSpring":true,"termSummer":false}"#)
        .execute(&pool)
        .await
        .expect("Failed to insert course");

        let course = find_course(&pool, "2015-2017", "AERO121")
            .await
            .expect("Failed to query course")
            .expect("Course not found");
        assert_eq!(course.display_name, "Aerospace Fundamentals");
        let dynamic = course.dynamic_terms.expect("dynamicTerms missing");
        assert!(dynamic.term_fall);
        assert!(!dynamic.term_winter);

        let missing = find_course(&pool, "2019-2020", "AERO121")
            .await
            .expect("Failed to query course");
        assert!(missing.is_none());
    }
}
