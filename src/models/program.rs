use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub catalog: String,
    pub major_name: String,
    pub conc_name: String,
    pub code: String,
    pub data_link: String,
}
