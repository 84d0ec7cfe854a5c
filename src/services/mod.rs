pub mod assembler;
pub mod cache;
pub mod generator;
pub mod merge;

pub use assembler::{AssembleOptions, assemble_flowchart};
pub use cache::{CatalogCourses, CourseCache, CourseCacheBuilder, build_course_cache};
pub use generator::{FlowchartGenerator, GenerationRequest, GenerationResult};
pub use merge::merge_term_templates;
