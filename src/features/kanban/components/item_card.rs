use crm_kanban_core::{BoardEntity, BoardItem, GenericItem, Lead, Opportunity, ProjectTask};
use leptos::prelude::*;
use serde::de::DeserializeOwned;

use crate::core::services::AppServices;

/// A record the board can fetch and draw as a card.
pub trait CardEntity: BoardEntity + DeserializeOwned + Send + Sync {
    fn title(&self) -> String;

    fn subtitle(&self) -> Option<String> {
        None
    }

    /// Secondary lines under the title, already formatted.
    fn meta(&self, services: &AppServices) -> Vec<String>;
}

impl CardEntity for Lead {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn subtitle(&self) -> Option<String> {
        self.company.clone()
    }

    fn meta(&self, services: &AppServices) -> Vec<String> {
        let mut lines: Vec<String> = [&self.email, &self.phone].into_iter().flatten().cloned().collect();
        if let Some(at) = &self.created_at {
            lines.push(format!("Created {}", services.format_date_time(at)));
        }
        lines
    }
}

impl CardEntity for Opportunity {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn subtitle(&self) -> Option<String> {
        match (&self.company, &self.contact_name) {
            (Some(company), Some(contact)) => Some(format!("{company} · {contact}")),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        }
    }

    fn meta(&self, services: &AppServices) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(amount) = self.amount {
            lines.push(format_amount(amount));
        }
        if let Some(date) = &self.expected_close_date {
            lines.push(format!("Closes {}", services.format_date(date)));
        }
        lines
    }
}

impl CardEntity for ProjectTask {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn subtitle(&self) -> Option<String> {
        self.description.clone()
    }

    fn meta(&self, services: &AppServices) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(assignee) = &self.assignee {
            lines.push(assignee.clone());
        }
        if let Some(date) = &self.due_date {
            lines.push(format!("Due {}", services.format_date(date)));
        }
        lines
    }
}

impl CardEntity for GenericItem {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn subtitle(&self) -> Option<String> {
        self.description.clone()
    }

    fn meta(&self, _services: &AppServices) -> Vec<String> {
        Vec::new()
    }
}

/// `12500.5` -> `12,500.50`
fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

#[component]
pub fn ItemCard<T: CardEntity>(item: T) -> impl IntoView {
    let services = expect_context::<AppServices>();
    let meta = item.meta(&services);
    let accent = item
        .status()
        .map(|status| format!("border-left-color: {}", status.color))
        .unwrap_or_default();

    view! {
        <div class="item-card-content" style=accent>
            <h4>{item.title()}</h4>
            {item.subtitle().map(|text| view! { <p class="item-subtitle">{text}</p> })}
            <ul class="item-meta">
                {meta.into_iter().map(|line| view! { <li>{line}</li> }).collect_view()}
            </ul>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use crm_kanban_core::ColumnId;

    use super::*;
    use crate::core::config::AppSettings;

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(950.0), "950.00");
        assert_eq!(format_amount(12500.5), "12,500.50");
        assert_eq!(format_amount(-1234567.0), "-1,234,567.00");
    }

    #[test]
    fn lead_card_lines() {
        let lead = Lead {
            id: 1,
            name: "Dana Whitfield".into(),
            email: Some("dana@northwind.test".into()),
            phone: None,
            company: Some("Northwind".into()),
            lead_status_id: ColumnId::from(1),
            lead_status: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 2, 9, 15, 0).unwrap()),
        };
        let services = AppServices::new(AppSettings::default());
        assert_eq!(lead.subtitle().as_deref(), Some("Northwind"));
        assert_eq!(
            lead.meta(&services),
            vec!["dana@northwind.test".to_string(), "Created 2024-05-02 09:15".to_string()]
        );
    }

    #[test]
    fn opportunity_card_lines() {
        let opportunity = Opportunity {
            id: 3,
            title: "Fleet renewal".into(),
            company: Some("Globex".into()),
            contact_name: None,
            amount: Some(48000.0),
            expected_close_date: NaiveDate::from_ymd_opt(2024, 9, 30),
            opportunity_stage_id: ColumnId::from(2),
            stage: None,
        };
        let services = AppServices::new(AppSettings::default());
        assert_eq!(opportunity.subtitle().as_deref(), Some("Globex"));
        assert_eq!(
            opportunity.meta(&services),
            vec!["48,000.00".to_string(), "Closes 2024-09-30".to_string()]
        );
    }
}
