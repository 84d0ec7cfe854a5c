use std::env;

use dotenvy::dotenv;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

fn is_dry_run() -> bool {
    !env::args().any(|a| a == "--apply")
}

#[derive(Debug, Deserialize)]
struct CatalogFeed {
    programs: Vec<ProgramRecord>,
    courses: Vec<CourseRecord>,
    templates: Vec<TemplateRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramRecord {
    id: String,
    catalog: String,
    major_name: String,
    #[serde(default)]
    conc_name: String,
    code: String,
    data_link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseRecord {
    catalog: String,
    id: String,
    display_name: String,
    units: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    addl: String,
    #[serde(default)]
    gwr_course: bool,
    #[serde(default)]
    uscp_course: bool,
    dynamic_terms: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRecord {
    program_id: String,
    term_data: Value,
    #[serde(default)]
    unit_total: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let feed_url = env::var("CATALOG_FEED_URL")?;
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://flowplan.db".to_string());

    let client = Client::new();
    let feed: CatalogFeed = client
        .get(&feed_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    println!(
        "Fetched feed: {} programs, {} courses, {} templates",
        feed.programs.len(),
        feed.courses.len(),
        feed.templates.len()
    );

    if is_dry_run() {
        for program in &feed.programs {
            println!(
                "[DRY RUN] Would upsert program {} ({}, {})",
                program.id, program.catalog, program.major_name
            );
        }
        println!(
            "[DRY RUN] Would upsert {} courses and {} templates. Re-run with --apply to write to {}",
            feed.courses.len(),
            feed.templates.len(),
            database_url
        );
        return Ok(());
    }

    let pool = SqlitePool::connect(&database_url).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    for program in &feed.programs {
        upsert_program(&pool, program).await?;
    }
    println!("Programs upserted: {}", feed.programs.len());

    for course in &feed.courses {
        upsert_course(&pool, course).await?;
    }
    println!("Courses upserted: {}", feed.courses.len());

    let mut templates_upserted = 0;
    for template in &feed.templates {
        if !template.term_data.is_array() {
            println!(
                "Skipping template for program {}: term data is not an array",
                template.program_id
            );
            continue;
        }
        upsert_template(&pool, template).await?;
        templates_upserted += 1;
    }
    println!(
        "Templates upserted: {} / {}",
        templates_upserted,
        feed.templates.len()
    );

    Ok(())
}

async fn upsert_program(pool: &SqlitePool, program: &ProgramRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO programs (id, catalog, major_name, conc_name, code, data_link)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            catalog = excluded.catalog,
            major_name = excluded.major_name,
            conc_name = excluded.conc_name,
            code = excluded.code,
            data_link = excluded.data_link
        "#,
    )
    .bind(&program.id)
    .bind(&program.catalog)
    .bind(&program.major_name)
    .bind(&program.conc_name)
    .bind(&program.code)
    .bind(&program.data_link)
    .execute(pool)
    .await?;
    Ok(())
}

async fn upsert_course(pool: &SqlitePool, course: &CourseRecord) -> Result<(), sqlx::Error> {
    let dynamic_terms = course.dynamic_terms.as_ref().map(|v| v.to_string());
    sqlx::query(
        r#"
        INSERT INTO courses (catalog, id, display_name, units, "desc", addl, gwr_course, uscp_course, dynamic_terms)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(catalog, id) DO UPDATE SET
            display_name = excluded.display_name,
            units = excluded.units,
            "desc" = excluded."desc",
            addl = excluded.addl,
            gwr_course = excluded.gwr_course,
            uscp_course = excluded.uscp_course,
            dynamic_terms = excluded.dynamic_terms
        "#,
    )
    .bind(&course.catalog)
    .bind(&course.id)
    .bind(&course.display_name)
    .bind(&course.units)
    .bind(&course.desc)
    .bind(&course.addl)
    .bind(course.gwr_course)
    .bind(course.uscp_course)
    .bind(dynamic_terms)
    .execute(pool)
    .await?;
    Ok(())
}

async fn upsert_template(pool: &SqlitePool, template: &TemplateRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO template_flowcharts (program_id, term_data, unit_total)
        VALUES (?, ?, ?)
        ON CONFLICT(program_id) DO UPDATE SET
            term_data = excluded.term_data,
            unit_total = excluded.unit_total
        "#,
    )
    .bind(&template.program_id)
    .bind(template.term_data.to_string())
    .bind(&template.unit_total)
    .execute(pool)
    .await?;
    Ok(())
}
