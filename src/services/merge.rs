use std::collections::BTreeMap;

use crate::models::{Term, TermSlot, UnitRange};

/// Merges per-program term plan templates into one unified term sequence.
///
/// Templates are given in the caller's program order, and that position is
/// what slot `programIdIndex` tags refer to. Terms are aligned by their
/// `tIndex` value rather than by position, so a template that skips a term
/// (summer quarters, usually) simply contributes nothing to it. Slots from
/// the first template pass through untouched, which keeps single-program
/// output byte-identical to its template; slots from every later template
/// are tagged with that template's index.
pub fn merge_term_templates(templates: &[Vec<Term>]) -> Vec<Term> {
    let mut merged: BTreeMap<i32, MergedTerm> = BTreeMap::new();

    for (program_index, template) in templates.iter().enumerate() {
        for term in template {
            let entry = merged.entry(term.t_index).or_default();
            entry.units += UnitRange::parse_or_zero(&term.t_units);
            for slot in &term.courses {
                let mut slot = slot.clone();
                if program_index > 0 {
                    slot.set_program_id_index(program_index);
                }
                entry.courses.push(slot);
            }
        }
    }

    merged
        .into_iter()
        .map(|(t_index, term)| Term {
            t_index,
            t_units: term.units.to_string(),
            courses: term.courses,
        })
        .collect()
}

#[derive(Default)]
struct MergedTerm {
    units: UnitRange,
    courses: Vec<TermSlot>,
}
