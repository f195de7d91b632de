use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::utils::format::format_currency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub id: i64,
    pub funnel_id: i64,
    #[serde(default)]
    pub step_id: Option<i64>,
    pub product_name: String,
    #[serde(default)]
    pub product_price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_methods: Vec<String>,
    #[serde(default)]
    pub fields_config: serde_json::Value,
    #[serde(default)]
    pub design_config: serde_json::Value,
    #[serde(default)]
    pub upsell_config: serde_json::Value,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CheckoutConfig {
    pub fn price_display(&self) -> String {
        format_currency(self.product_price, self.currency.as_deref().unwrap_or("BRL"))
    }

    pub fn payment_methods_display(&self) -> String {
        if self.payment_methods.is_empty() {
            "-".to_string()
        } else {
            self.payment_methods.join(", ")
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutConfigInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsell_config: Option<serde_json::Value>,
}

/// `GET /checkout/{funnelId}/preview`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutPreview {
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<CheckoutConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkout_config() {
        let json = r##"{"id": 1, "funnel_id": 42, "step_id": 3, "product_name": "Ebook",
            "product_price": 1234.5, "currency": "BRL", "payment_methods": ["pix", "credit_card"],
            "fields_config": {}, "design_config": {"primary": "#00f"}, "upsell_config": {},
            "created_at": "2024-01-01T00:00:00", "updated_at": "2024-01-02T00:00:00"}"##;
        let cfg: CheckoutConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.design_config["primary"], "#00f");
        assert_eq!(cfg.price_display(), "R$ 1.234,50");
        assert_eq!(cfg.payment_methods_display(), "pix, credit_card");
    }

    #[test]
    fn test_parse_preview_envelope() {
        let json = r#"{"msg": "Checkout preview data", "data": {"id": 1, "funnel_id": 2, "product_name": "Curso"}}"#;
        let preview: CheckoutPreview = serde_json::from_str(json).unwrap();
        assert_eq!(preview.message.as_deref(), Some("Checkout preview data"));
        let data = preview.data.unwrap();
        assert_eq!(data.product_price, 0.0);
        assert_eq!(data.payment_methods_display(), "-");
    }
}
