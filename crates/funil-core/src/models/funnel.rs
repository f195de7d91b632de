use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::utils::format::format_percentage;

/// A sales funnel as listed by `GET /funnels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funnel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub total_visitors: u64,
    #[serde(default)]
    pub total_conversions: u64,
    #[serde(default)]
    pub steps_count: u64,
    #[serde(default)]
    pub active_steps_count: u64,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Funnel {
    /// Conversions per hundred visitors; 0 when there were no visitors.
    pub fn conversion_rate(&self) -> f64 {
        if self.total_visitors == 0 {
            0.0
        } else {
            self.total_conversions as f64 / self.total_visitors as f64 * 100.0
        }
    }

    pub fn conversion_rate_display(&self) -> String {
        if self.total_visitors == 0 {
            "0%".to_string()
        } else {
            format!("{}%", format_percentage(self.conversion_rate()))
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Ativo"
        } else {
            "Pausado"
        }
    }

    pub fn description_display(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => "Sem descrição",
        }
    }
}

/// `GET /funnels/{id}` returns the funnel with its ordered steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelDetail {
    #[serde(flatten)]
    pub funnel: Funnel,
    #[serde(default)]
    pub steps: Vec<FunnelStep>,
}

/// Body for funnel create/update. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunnelInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloneFunnelRequest {
    pub new_name: String,
    pub new_slug: String,
}

impl CloneFunnelRequest {
    /// Name and slug for a copy of `funnel`, suffixed so the slug stays unique.
    pub fn copy_of(funnel: &Funnel, suffix: &str) -> Self {
        let base_slug = funnel
            .slug
            .clone()
            .unwrap_or_else(|| funnel.name.to_lowercase().replace(' ', "-"));
        Self {
            new_name: format!("{} (cópia)", funnel.name),
            new_slug: format!("{}-{}", base_slug, suffix),
        }
    }
}

/// One page of a funnel (capture, vsl, checkout, upsell, thankyou).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    pub id: i64,
    pub funnel_id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub step_type: String,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StepInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderStepsRequest<'a> {
    pub step_ids: &'a [i64],
}
