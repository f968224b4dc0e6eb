use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use thiserror::Error;

use crate::core::config::AppSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route named {0}")]
    Unknown(String),
    #[error("route {route} needs parameter {param}")]
    MissingParam { route: String, param: String },
}

const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("leads.board", "/api/leads/board"),
    ("leads.status.update", "/leads/{id}/status"),
    ("opportunities.board", "/api/opportunities/board"),
    ("opportunities.stage.update", "/opportunities/{id}/stage"),
    ("project-tasks.board", "/api/project-tasks/board?project={project}"),
    ("project-tasks.status.update", "/project-tasks/{id}/status"),
    ("items.board", "/api/items/board"),
    ("items.status.update", "/items/{id}/status"),
    ("events", "/api/events"),
];

/// Formatting and routing helpers handed to components through context
/// instead of living on `window`.
#[derive(Debug, Clone)]
pub struct AppServices {
    settings: Arc<AppSettings>,
    routes: Arc<HashMap<String, String>>,
}

impl AppServices {
    pub fn new(settings: AppSettings) -> Self {
        let mut routes: HashMap<String, String> = DEFAULT_ROUTES
            .iter()
            .map(|(name, template)| (name.to_string(), template.to_string()))
            .collect();
        routes.extend(settings.routes.clone());
        Self {
            settings: Arc::new(settings),
            routes: Arc::new(routes),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Expands a named route, substituting `{param}` placeholders.
    pub fn route(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let template = self
            .routes
            .get(name)
            .ok_or_else(|| RouteError::Unknown(name.to_string()))?;

        let mut path = template.clone();
        for (key, value) in params {
            path = path.replace(&format!("{{{key}}}"), value);
        }

        if let Some(start) = path.find('{') {
            let param = path[start + 1..]
                .split('}')
                .next()
                .unwrap_or_default()
                .to_string();
            return Err(RouteError::MissingParam {
                route: name.to_string(),
                param,
            });
        }
        Ok(path)
    }

    /// Absolute URL for a path produced by [`route`](Self::route).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    pub fn format_date_time(&self, at: &DateTime<Utc>) -> String {
        let offset = FixedOffset::east_opt(self.settings.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        let local = at.with_timezone(&offset);
        let mut out = String::new();
        if write!(out, "{}", local.format(&self.settings.date_time_format)).is_err() {
            out = local.format("%Y-%m-%d %H:%M").to_string();
        }
        out
    }

    pub fn format_date(&self, date: &NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.settings.date_format)).is_err() {
            out = date.format("%Y-%m-%d").to_string();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn services(settings: AppSettings) -> AppServices {
        AppServices::new(settings)
    }

    #[test]
    fn expands_default_routes() {
        let svc = services(AppSettings::default());
        assert_eq!(svc.route("leads.status.update", &[("id", "42")]).unwrap(), "/leads/42/status");
        assert_eq!(
            svc.route("project-tasks.board", &[("project", "7")]).unwrap(),
            "/api/project-tasks/board?project=7"
        );
    }

    #[test]
    fn reports_unknown_routes_and_missing_params() {
        let svc = services(AppSettings::default());
        assert_eq!(svc.route("leads.destroy", &[]), Err(RouteError::Unknown("leads.destroy".into())));
        assert_eq!(
            svc.route("items.status.update", &[]),
            Err(RouteError::MissingParam {
                route: "items.status.update".into(),
                param: "id".into()
            })
        );
    }

    #[test]
    fn page_routes_override_defaults() {
        let mut settings = AppSettings::default();
        settings.api_base = "https://crm.example.test/".into();
        settings
            .routes
            .insert("leads.status.update".into(), "/crm/leads/{id}/move".into());
        let svc = services(settings);
        let path = svc.route("leads.status.update", &[("id", "3")]).unwrap();
        assert_eq!(svc.url(&path), "https://crm.example.test/crm/leads/3/move");
    }

    #[test]
    fn formats_dates_with_offset() {
        let mut settings = AppSettings::default();
        settings.utc_offset_minutes = 120;
        settings.date_time_format = "%d/%m/%Y %H:%M".into();
        let svc = services(settings);
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 22, 30, 0).unwrap();
        assert_eq!(svc.format_date_time(&at), "10/03/2024 00:30");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(svc.format_date(&date), "2024-03-09");
    }
}
