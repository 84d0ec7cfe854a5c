use serde::{Deserialize, Serialize};

/// Version written into newly assembled flowcharts; bumped whenever the
/// persisted document shape changes.
pub const FLOWCHART_SCHEMA_VERSION: i32 = 7;

/// One entry in a term: either a concrete catalog course or a placeholder
/// for a requirement with no single resolvable course (GE, free elective,
/// GWR). On the wire the two are told apart by `id` being a course code
/// versus a literal `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TermSlot {
    Course(CourseSlot),
    Custom(CustomSlot),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSlot {
    pub id: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomSlot {
    #[serde(with = "null_id")]
    pub id: (),
    pub custom_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_display_name: Option<String>,
    pub custom_desc: String,
    pub custom_units: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id_index: Option<usize>,
}

impl TermSlot {
    /// Which entry of the owning flowchart's program list this slot came
    /// from; slots from the first program carry no tag.
    pub fn program_id_index(&self) -> usize {
        match self {
            TermSlot::Course(slot) => slot.program_id_index.unwrap_or(0),
            TermSlot::Custom(slot) => slot.program_id_index.unwrap_or(0),
        }
    }

    pub fn set_program_id_index(&mut self, index: usize) {
        match self {
            TermSlot::Course(slot) => slot.program_id_index = Some(index),
            TermSlot::Custom(slot) => slot.program_id_index = Some(index),
        }
    }

    pub fn course_id(&self) -> Option<&str> {
        match self {
            TermSlot::Course(slot) => Some(&slot.id),
            TermSlot::Custom(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TermSlot::Custom(_))
    }
}

/// Serializes the placeholder discriminator as a literal JSON `null` and
/// refuses anything else on the way in.
mod null_id {
    use serde::de::{Deserializer, Error, IgnoredAny};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S: Serializer>(_: &(), serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_none()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(), D::Error> {
        match Option::<IgnoredAny>::deserialize(deserializer)? {
            None => Ok(()),
            Some(_) => Err(Error::custom("placeholder slot id must be null")),
        }
    }
}

/// A single academic term. `tIndex` ordinals may have gaps (summers are
/// usually skipped); `tIndex == -1` is the year-zero placeholder term with
/// no courses and zero units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub t_index: i32,
    pub t_units: String,
    pub courses: Vec<TermSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flowchart {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub program_id: Vec<String>,
    pub start_year: String,
    pub term_data: Vec<Term>,
    pub unit_total: String,
    pub notes: String,
    pub version: i32,
    pub published_id: Option<String>,
    pub imported_id: Option<String>,
    pub hash: String,
    #[serde(rename = "lastUpdatedUTC")]
    pub last_updated_utc: String,
}
