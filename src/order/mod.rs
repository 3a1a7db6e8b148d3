use crate::models::Tube;

/// Lists whose name contains this marker (case-insensitive) are ordered
/// from the Spanish supplier, so lines use the `esp` name.
pub(crate) const SPANISH_LIST_MARKER: &str = "just espagne";

/// First line of every order mail body.
pub(crate) const DELIVERY_HEADER: &str = "Livraison à Mme Winckel: carrer San Bartolomeu 77 - 5e izquierda - 03560 El Campello - Provincia de Alicante\":";

pub(crate) const NOTHING_TO_ORDER: &str = "Aucun tube à commander dans cette liste.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OrderLine {
    pub quantity: i64,
    pub shortfall: i64,
    pub name: String,
}

impl OrderLine {
    pub fn render(&self) -> String {
        format!("({})     {}  {}", self.quantity, self.shortfall, self.name)
    }
}

pub(crate) fn uses_spanish_names(list_name: &str) -> bool {
    list_name.to_lowercase().contains(SPANISH_LIST_MARKER)
}

/// Tubes strictly below their minimum stock, in the given order.
pub(crate) fn order_lines(list_name: &str, tubes: &[Tube]) -> Vec<OrderLine> {
    let spanish = uses_spanish_names(list_name);

    tubes
        .iter()
        .filter_map(|t| {
            let mini = t.stock_mini?;
            if t.quantity >= mini {
                return None;
            }

            let name = if spanish {
                t.esp
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(t.name.as_str())
            } else {
                t.name.as_str()
            };

            Some(OrderLine {
                quantity: t.quantity,
                shortfall: mini.saturating_sub(t.quantity),
                name: name.to_string(),
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OrderMail {
    pub subject: String,
    pub body: String,
}

impl OrderMail {
    /// Returns `None` when nothing is below minimum stock.
    pub fn compose(list_name: &str, tubes: &[Tube]) -> Option<Self> {
        let lines = order_lines(list_name, tubes);
        if lines.is_empty() {
            return None;
        }

        let body = format!(
            "{DELIVERY_HEADER}\n\n{}",
            lines
                .iter()
                .map(OrderLine::render)
                .collect::<Vec<_>>()
                .join("\n")
        );

        Some(Self {
            subject: format!("Commande {list_name}"),
            body,
        })
    }

    /// `mailto:` locator with no recipient; the user picks one in the mail client.
    pub fn mailto_url(&self) -> String {
        format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}
