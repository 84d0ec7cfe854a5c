use std::collections::HashSet;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{FLOWCHART_SCHEMA_VERSION, Flowchart, Program, Term, TermSlot, UnitRange};

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    /// Drop every GE placeholder slot and deduct its units from the term.
    pub remove_ge_courses: bool,
}

/// Wraps a merged term sequence into a complete flowchart document.
///
/// `programs` must be the resolved programs in the same order the merge ran
/// over, since slot tags refer to positions in that list. The list is
/// re-checked for duplicates and emptiness even though the request boundary
/// already validates it; internal batch callers reach this code too.
pub fn assemble_flowchart(
    programs: &[Program],
    mut term_data: Vec<Term>,
    start_year: &str,
    name: &str,
    owner_id: &str,
    options: AssembleOptions,
) -> Result<Flowchart, AppError> {
    if programs.is_empty() {
        return Err(AppError::invalid_input(
            "programIds",
            "program list resolved to zero programs",
        ));
    }
    let mut seen = HashSet::new();
    for program in programs {
        if !seen.insert(program.id.as_str()) {
            return Err(AppError::invalid_input(
                "programIds",
                format!("duplicate program id: {}", program.id),
            ));
        }
    }

    let mut unit_total = UnitRange::default();
    for term in &mut term_data {
        let mut units = UnitRange::parse_or_zero(&term.t_units);
        if options.remove_ge_courses {
            units = remove_ge_placeholders(term, units);
        }
        if term.t_index != -1 {
            unit_total += units;
        }
    }

    Ok(Flowchart {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        program_id: programs.iter().map(|p| p.id.clone()).collect(),
        start_year: start_year.to_string(),
        term_data,
        unit_total: unit_total.to_string(),
        notes: generation_notes(programs),
        version: FLOWCHART_SCHEMA_VERSION,
        published_id: None,
        imported_id: None,
        // Assigned when the flowchart is persisted.
        hash: String::new(),
        last_updated_utc: String::new(),
    })
}

/// Drops every GE placeholder from the term and returns the remaining units,
/// which also drive the flowchart total so the two can never disagree.
fn remove_ge_placeholders(term: &mut Term, mut units: UnitRange) -> UnitRange {
    let mut removed_any = false;
    term.courses.retain(|slot| match slot {
        TermSlot::Custom(custom) if custom.custom_id == "GE" => {
            units = units.saturating_sub(UnitRange::parse_or_zero(&custom.custom_units));
            removed_any = true;
            false
        }
        _ => true,
    });
    // Terms without a GE slot keep their unit string byte-for-byte.
    if removed_any {
        term.t_units = units.to_string();
    }
    units
}

fn generation_notes(programs: &[Program]) -> String {
    let mut notes =
        String::from("This flowchart was generated from the following curriculum sheets:\n");
    for (position, program) in programs.iter().enumerate() {
        notes.push_str(&format!("{}. {}", position + 1, program.major_name));
        if !program.conc_name.is_empty() {
            notes.push_str(&format!(" ({})", program.conc_name));
        }
        notes.push_str(&format!(
            " [{}]: {}\n",
            program.catalog, program.data_link
        ));
    }
    notes.push_str(
        "\nThis is not an official document. Consult your academic advisor \
         before making decisions based on this flowchart.",
    );
    notes
}
