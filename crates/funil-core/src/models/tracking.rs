use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// An ad-platform pixel attached to a funnel (or to one of its steps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPixel {
    pub id: i64,
    pub funnel_id: i64,
    /// `None` applies the pixel to the whole funnel
    #[serde(default)]
    pub step_id: Option<i64>,
    pub pixel_type: String,
    pub pixel_id: String,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TrackingPixel {
    pub fn platform_label(&self) -> String {
        match self.pixel_type.to_lowercase().as_str() {
            "facebook" => "Facebook".to_string(),
            "google" => "Google".to_string(),
            "tiktok" => "TikTok".to_string(),
            "custom" => "Custom".to_string(),
            _ => self.pixel_type.clone(),
        }
    }

    pub fn scope_display(&self) -> String {
        match self.step_id {
            Some(step) => format!("Etapa {}", step),
            None => "Funil inteiro".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PixelInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pixel() {
        let json = r#"{"id": 3, "funnel_id": 42, "step_id": null, "pixel_type": "tiktok",
            "pixel_id": "C123", "event_name": "Purchase", "is_active": true,
            "created_at": "2024-06-01T12:00:00"}"#;
        let pixel: TrackingPixel = serde_json::from_str(json).unwrap();
        assert_eq!(pixel.platform_label(), "TikTok");
        assert_eq!(pixel.scope_display(), "Funil inteiro");
    }

    #[test]
    fn test_unknown_platform_is_shown_verbatim() {
        let json = r#"{"id": 4, "funnel_id": 1, "step_id": 9, "pixel_type": "kwai", "pixel_id": "k"}"#;
        let pixel: TrackingPixel = serde_json::from_str(json).unwrap();
        assert_eq!(pixel.platform_label(), "kwai");
        assert_eq!(pixel.scope_display(), "Etapa 9");
        assert!(!pixel.is_active);
    }
}
