use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::utils::format::format_currency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    #[serde(default)]
    pub visitor_id: Option<i64>,
    #[serde(default)]
    pub funnel_id: Option<i64>,
    #[serde(default)]
    pub step_id: Option<i64>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    /// pending, paid, failed, cancelled
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub customer_data: serde_json::Value,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn amount_display(&self) -> String {
        format_currency(self.amount, self.currency.as_deref().unwrap_or("BRL"))
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_data.get("email").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueStats {
    pub total_revenue: f64,
    pub total_transactions: u64,
    pub average_ticket: f64,
    pub currency: Option<String>,
}

impl RevenueStats {
    pub fn revenue_display(&self) -> String {
        format_currency(self.total_revenue, self.currency.as_deref().unwrap_or("BRL"))
    }

    pub fn average_ticket_display(&self) -> String {
        format_currency(self.average_ticket, self.currency.as_deref().unwrap_or("BRL"))
    }
}

/// `GET /payments/{funnelId}/stats`. Accepts either a flat revenue summary
/// or the analytics envelope with a nested `revenue_stats`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentStats {
    #[serde(flatten)]
    pub flat: RevenueStats,
    #[serde(default)]
    pub revenue_stats: Option<RevenueStats>,
    #[serde(default)]
    pub daily_revenue: serde_json::Value,
    #[serde(default)]
    pub payment_methods_stats: serde_json::Value,
}

impl PaymentStats {
    pub fn summary(&self) -> &RevenueStats {
        self.revenue_stats.as_ref().unwrap_or(&self.flat)
    }
}
