use crate::models::{Tube, TubeUpdate};

/// Editable columns of a tube row.
///
/// The string form doubles as the CSS class of the cell/input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr, strum::EnumIter)]
pub(crate) enum TubeField {
    #[strum(serialize = "tube-name")]
    Name,
    #[strum(serialize = "tube-esp")]
    Esp,
    #[strum(serialize = "tube-quantity")]
    Quantity,
    #[strum(serialize = "tube-usage")]
    Usage,
    #[strum(serialize = "stock_mini")]
    StockMini,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DraftError {
    EmptyName,
    InvalidQuantity(String),
    InvalidStockMini(String),
}

impl std::fmt::Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftError::EmptyName => write!(f, "Le nom est obligatoire"),
            DraftError::InvalidQuantity(v) => write!(f, "Quantité invalide : {v}"),
            DraftError::InvalidStockMini(v) => write!(f, "Stock mini invalide : {v}"),
        }
    }
}

/// Raw form values of a tube being edited or added, exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TubeDraft {
    pub name: String,
    pub esp: String,
    pub usage: String,
    pub quantity: String,
    pub stock_mini: String,
}

impl TubeDraft {
    pub fn from_tube(t: &Tube) -> Self {
        Self {
            name: t.name.clone(),
            esp: t.esp.clone().unwrap_or_default(),
            usage: t.usage.clone().unwrap_or_default(),
            quantity: t.quantity.to_string(),
            stock_mini: t.stock_mini.map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    /// Initial values of the add form.
    pub fn blank() -> Self {
        Self {
            quantity: "1".to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: TubeField) -> &str {
        match field {
            TubeField::Name => &self.name,
            TubeField::Esp => &self.esp,
            TubeField::Quantity => &self.quantity,
            TubeField::Usage => &self.usage,
            TubeField::StockMini => &self.stock_mini,
        }
    }

    pub fn set(&mut self, field: TubeField, value: String) {
        match field {
            TubeField::Name => self.name = value,
            TubeField::Esp => self.esp = value,
            TubeField::Quantity => self.quantity = value,
            TubeField::Usage => self.usage = value,
            TubeField::StockMini => self.stock_mini = value,
        }
    }

    /// Validate into an update payload.
    ///
    /// Rules:
    /// - name is required (after trim)
    /// - quantity must be a non-negative integer
    /// - stock_mini is optional; when present it must be a non-negative integer
    /// - blank esp/usage are sent as absent
    pub fn validate(&self) -> Result<TubeUpdate, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::EmptyName);
        }

        let quantity = parse_non_negative(&self.quantity)
            .ok_or_else(|| DraftError::InvalidQuantity(self.quantity.clone()))?;

        let stock_mini = if self.stock_mini.trim().is_empty() {
            None
        } else {
            Some(
                parse_non_negative(&self.stock_mini)
                    .ok_or_else(|| DraftError::InvalidStockMini(self.stock_mini.clone()))?,
            )
        };

        Ok(TubeUpdate {
            name: name.to_string(),
            esp: non_blank(&self.esp),
            usage: non_blank(&self.usage),
            quantity,
            stock_mini,
        })
    }
}

fn parse_non_negative(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok().filter(|v| *v >= 0)
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
