use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display;

/// A billable clinic service. Prices are kept in kopecks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub price_minor: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: u32,
    pub price_minor: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Service {
    pub fn new(input: ServiceInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            duration_minutes: input.duration_minutes,
            price_minor: input.price_minor,
            is_active: input.is_active,
        }
    }

    pub fn apply(&mut self, input: ServiceInput) {
        *self = Self { id: self.id, ..Self::new(input) };
    }

    /// "1500.00 ₽"
    pub fn display_price(&self) -> String {
        let sign = if self.price_minor < 0 { "-" } else { "" };
        let abs = self.price_minor.unsigned_abs();
        format!("{sign}{}.{:02} ₽", abs / 100, abs % 100)
    }

    pub fn duration_formatted(&self) -> String {
        format!("{} min", self.duration_minutes)
    }

    pub fn full_info(&self) -> String {
        format!(
            "{} - {} ({})",
            self.name,
            self.display_price(),
            self.duration_formatted()
        )
    }

    pub fn summary(&self) -> ServiceSummary {
        ServiceSummary {
            display_price: self.display_price(),
            duration_formatted: self.duration_formatted(),
            full_info: self.full_info(),
            display_status: display::active_label(self.is_active),
            service: self.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    #[serde(flatten)]
    pub service: Service,
    pub display_price: String,
    pub duration_formatted: String,
    pub full_info: String,
    pub display_status: &'static str,
}
