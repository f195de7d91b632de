use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payment::RevenueStats;
use super::timestamp;
use crate::utils::format::format_duration;

/// A visitor currently moving through a funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub funnel_id: Option<i64>,
    #[serde(default)]
    pub current_step_id: Option<i64>,
    #[serde(default)]
    pub current_step_name: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub first_visit: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_online: bool,
    /// Seconds between first visit and last activity
    #[serde(default)]
    pub time_on_site: u64,
    #[serde(default)]
    pub events_count: u64,
}

impl Visitor {
    pub fn time_on_site_display(&self) -> String {
        format_duration(self.time_on_site)
    }

    pub fn step_display(&self) -> &str {
        self.current_step_name.as_deref().unwrap_or("-")
    }

    /// "source / medium / campaign" with unset parts skipped
    pub fn utm_display(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.utm_source, &self.utm_medium, &self.utm_campaign]
            .iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorEvent {
    pub id: i64,
    pub visitor_id: i64,
    pub event_type: String,
    #[serde(default)]
    pub step_id: Option<i64>,
    #[serde(default)]
    pub step_name: Option<String>,
    #[serde(default)]
    pub event_data: serde_json::Value,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate numbers for the dashboard cards. Every field is optional on
/// the wire and reads as zero when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    #[serde(alias = "total_visitors")]
    pub visitors: u64,
    #[serde(alias = "total_conversions")]
    pub conversions: u64,
    #[serde(alias = "conversionRate")]
    pub conversion_rate: f64,
    pub revenue: f64,
    pub online_visitors_count: u64,
    pub online_visitors: Vec<Visitor>,
    pub total_funnels: u64,
    pub revenue_stats: Option<RevenueStats>,
}

impl DashboardStats {
    /// Flat `revenue` when reported, otherwise the nested revenue summary
    pub fn revenue_total(&self) -> f64 {
        if self.revenue > 0.0 {
            self.revenue
        } else {
            self.revenue_stats
                .as_ref()
                .map(|r| r.total_revenue)
                .unwrap_or(0.0)
        }
    }

    /// Reported rate, or one derived from the counters when the server omits it
    pub fn conversion_rate_or_derived(&self) -> f64 {
        if self.conversion_rate > 0.0 || self.visitors == 0 {
            self.conversion_rate
        } else {
            self.conversions as f64 / self.visitors as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dashboard_stats_frontend_shape() {
        let json = r#"{"visitors": 1234, "conversions": 89, "conversionRate": 7.2, "revenue": 12450.0}"#;
        let stats: DashboardStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.visitors, 1234);
        assert_eq!(stats.conversion_rate, 7.2);
        assert_eq!(stats.revenue_total(), 12450.0);
    }

    #[test]
    fn test_parse_dashboard_stats_backend_shape() {
        let json = r#"{"total_funnels": 2, "total_visitors": 200, "online_visitors_count": 3,
            "online_visitors": [], "conversion_data": [],
            "revenue_stats": {"total_revenue": 99.9, "total_transactions": 1, "average_ticket": 99.9, "currency": "BRL"}}"#;
        let stats: DashboardStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.visitors, 200);
        assert_eq!(stats.online_visitors_count, 3);
        assert!(stats.online_visitors.is_empty());
        assert_eq!(stats.revenue_total(), 99.9);
        assert_eq!(stats.conversion_rate_or_derived(), 0.0);
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let stats: DashboardStats = serde_json::from_str("{}").unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_visitor_display_helpers() {
        let json = r#"{"id": 5, "ip_address": "192.168.1.100", "current_step_name": "VSL",
            "utm_source": "facebook", "utm_campaign": "black-friday",
            "first_visit": "2024-01-01T10:00:00", "last_activity": "2024-01-01T10:05:07",
            "is_online": true, "time_on_site": 307, "events_count": 4}"#;
        let v: Visitor = serde_json::from_str(json).unwrap();
        assert_eq!(v.time_on_site_display(), "5m 7s");
        assert_eq!(v.step_display(), "VSL");
        assert_eq!(v.utm_display().as_deref(), Some("facebook / black-friday"));
    }
}
