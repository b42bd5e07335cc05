use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credor espelhado do Sienge (`sienge_credores`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credor {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub creditor_id: i64,
    pub nome: String,
    #[serde(default)]
    pub nome_fantasia: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    /// "F" (pessoa física) ou "J" (pessoa jurídica)
    #[serde(default)]
    pub tipo: Option<String>,
}
