use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use crm_kanban_core::{BoardConfig, BoardSnapshot, StatusUpdate, StatusUpdater, UpdateAck, UpdateError};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::app_services::{AppServices, RouteError};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("board request returned {0}")]
    Status(u16),
}

/// Fetches the board snapshot for `config`'s entity.
pub async fn load_snapshot<T: DeserializeOwned>(
    client: &reqwest::Client,
    services: &AppServices,
    config: &BoardConfig<T>,
    project: Option<u64>,
) -> Result<BoardSnapshot<T>, LoadError> {
    let project = project.map(|p| p.to_string());
    let params: Vec<(&str, &str)> = project.iter().map(|p| ("project", p.as_str())).collect();
    let url = services.url(&services.route(config.board_route, &params)?);

    let response = client.get(&url).header(ACCEPT, "application/json").send().await?;
    if !response.status().is_success() {
        return Err(LoadError::Status(response.status().as_u16()));
    }
    Ok(response.json::<BoardSnapshot<T>>().await?)
}

/// Request ids this tab has sent recently, so change events caused by our
/// own moves can be told apart from other users' edits.
#[derive(Debug, Clone, Default)]
pub struct IssuedRequests(Rc<RefCell<VecDeque<String>>>);

impl IssuedRequests {
    const CAPACITY: usize = 32;

    pub fn record(&self, id: String) {
        let mut ids = self.0.borrow_mut();
        if ids.len() == Self::CAPACITY {
            ids.pop_front();
        }
        ids.push_back(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.borrow().iter().any(|known| known == id)
    }
}

/// Sends status changes to the entity's update endpoint with `PUT`.
pub struct HttpStatusUpdater<T> {
    client: reqwest::Client,
    services: AppServices,
    config: BoardConfig<T>,
    issued: IssuedRequests,
}

impl<T> HttpStatusUpdater<T> {
    pub fn new(
        client: reqwest::Client,
        services: AppServices,
        config: BoardConfig<T>,
        issued: IssuedRequests,
    ) -> Self {
        Self {
            client,
            services,
            config,
            issued,
        }
    }
}

#[async_trait(?Send)]
impl<T: DeserializeOwned> StatusUpdater<T> for HttpStatusUpdater<T> {
    async fn update_status(&self, update: &StatusUpdate) -> Result<UpdateAck<T>, UpdateError> {
        let id = update.item_id.to_string();
        let path = self
            .services
            .route(self.config.update_route, &[("id", id.as_str())])
            .map_err(|e| UpdateError::Transport(e.to_string()))?;
        let url = self.services.url(&path);

        let mut body = Map::new();
        body.insert(
            self.config.status_field.to_string(),
            Value::String(update.destination.to_string()),
        );

        let request_id = Uuid::new_v4().to_string();
        self.issued.record(request_id.clone());
        log::debug!("{}: PUT {} ({})", update.op, url, request_id);

        let response = self
            .client
            .put(&url)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, request_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpdateError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| UpdateError::Transport(e.to_string()))?;
        parse_update_response(status, &text, self.config.response_key)
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Interprets a status-update response body.
///
/// 2xx bodies may carry a `message` and the record under `response_key`;
/// an empty body is a bare success. 422 carries field-keyed errors.
pub fn parse_update_response<T: DeserializeOwned>(
    status: u16,
    body: &str,
    response_key: &str,
) -> Result<UpdateAck<T>, UpdateError> {
    if (200..300).contains(&status) {
        if body.trim().is_empty() {
            return Ok(UpdateAck::empty());
        }
        let mut value: Value =
            serde_json::from_str(body).map_err(|e| UpdateError::Decode(e.to_string()))?;
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let item = match value.get_mut(response_key).map(Value::take) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                serde_json::from_value::<T>(raw).map_err(|e| UpdateError::Decode(e.to_string()))?,
            ),
        };
        return Ok(UpdateAck { message, item });
    }

    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if status == 422 {
        Err(UpdateError::Validation {
            message: parsed.message,
            errors: parsed.errors,
        })
    } else {
        Err(UpdateError::Server {
            status,
            message: parsed.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use crm_kanban_core::{ColumnId, Lead, GENERIC_FAILURE};

    use super::*;

    #[test]
    fn success_with_record() {
        let ack: UpdateAck<Lead> = parse_update_response(
            200,
            r#"{"message": "Lead status updated.", "lead": {"id": 5, "name": "Ana", "lead_status_id": 2}}"#,
            "lead",
        )
        .unwrap();
        assert_eq!(ack.message.as_deref(), Some("Lead status updated."));
        let lead = ack.item.unwrap();
        assert_eq!(lead.id, 5);
        assert_eq!(lead.lead_status_id, ColumnId::from(2));
    }

    #[test]
    fn empty_success_body() {
        let ack: UpdateAck<Lead> = parse_update_response(204, "", "lead").unwrap();
        assert_eq!(ack, UpdateAck::empty());
        let ack: UpdateAck<Lead> = parse_update_response(200, r#"{"success": true}"#, "lead").unwrap();
        assert!(ack.item.is_none());
    }

    #[test]
    fn malformed_record_is_a_decode_error() {
        let err = parse_update_response::<Lead>(200, r#"{"lead": {"id": "x"}}"#, "lead").unwrap_err();
        assert!(matches!(err, UpdateError::Decode(_)));
    }

    #[test]
    fn validation_errors_are_keyed_by_field() {
        let err = parse_update_response::<Lead>(
            422,
            r#"{"message": "The given data was invalid.", "errors": {"lead_status_id": ["The selected status is invalid."]}}"#,
            "lead",
        )
        .unwrap_err();
        assert_eq!(err.user_message(), "The selected status is invalid.");
    }

    #[test]
    fn html_error_pages_fall_back_to_generic_message() {
        let err = parse_update_response::<Lead>(502, "<html>Bad Gateway</html>", "lead").unwrap_err();
        assert_eq!(
            err,
            UpdateError::Server {
                status: 502,
                message: String::new()
            }
        );
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn issued_requests_are_bounded() {
        let issued = IssuedRequests::default();
        for n in 0..40 {
            issued.record(format!("req-{n}"));
        }
        assert!(!issued.contains("req-0"));
        assert!(issued.contains("req-39"));
    }
}
