pub mod course;
pub mod flowchart;
pub mod program;
pub mod units;

pub use course::{Course, CourseKey, DynamicTerms};
pub use flowchart::{
    CourseSlot, CustomSlot, FLOWCHART_SCHEMA_VERSION, Flowchart, Term, TermSlot,
};
pub use program::Program;
pub use units::UnitRange;
