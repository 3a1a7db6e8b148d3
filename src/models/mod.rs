use serde::{Deserialize, Deserializer, Serialize};

/// Row ids are uuid strings or bigint numbers depending on the table schema.
fn id_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(d)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// A named grouping of tubes (`lists` table).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TubeList {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,

    /// Only used for default ordering.
    #[serde(default)]
    pub created_at: String,
}

/// An inventory item (`tubes` table).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Tube {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(deserialize_with = "id_from_any")]
    pub list_id: String,
    pub name: String,

    /// Spanish-language name, used by order mails for Spanish lists.
    #[serde(default)]
    pub esp: Option<String>,

    #[serde(default)]
    pub usage: Option<String>,

    pub quantity: i64,

    /// Threshold below which the tube is reordered. Absent means never.
    #[serde(default)]
    pub stock_mini: Option<i64>,
}

/// Insert payload for a tube. Optional fields serialize as `null`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NewTube {
    pub list_id: String,
    pub name: String,
    pub esp: Option<String>,
    pub usage: Option<String>,
    pub quantity: i64,
    pub stock_mini: Option<i64>,
}

/// Update payload for a tube (every editable column is sent).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TubeUpdate {
    pub name: String,
    pub esp: Option<String>,
    pub usage: Option<String>,
    pub quantity: i64,
    pub stock_mini: Option<i64>,
}

impl NewTube {
    pub fn from_update(list_id: &str, u: TubeUpdate) -> Self {
        Self {
            list_id: list_id.to_string(),
            name: u.name,
            esp: u.esp,
            usage: u.usage,
            quantity: u.quantity,
            stock_mini: u.stock_mini,
        }
    }
}
