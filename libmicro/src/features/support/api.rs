//! `supportApi` cache client
//!
//! Every endpoint reports its outcome into the `tickets` slice: results
//! through the slice's own actions, failures as a slice error. Tickets
//! created under the main app carry the signed-in user as reporter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::tickets::{self, Ticket, TicketStatus};
use crate::bridge::MainAppAccessor;
use crate::cache::{
    ApiClient, ApiDefinition, EndpointDefinition, MutationResult, QueryResult, RequestSpec,
};
use crate::error::Result;
use crate::store::{Action, Store};

pub const SUPPORT_API: &str = "supportApi";

/// Body of a create request; the server assigns id, status and timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: String,
    pub description: String,
}

fn error(message: &str) -> Vec<Action> {
    vec![tickets::set_error(Some(message.to_string()))]
}

/// Create request body, with the main app user's email as `reporter` when
/// there is one
fn create_ticket_body(args: &Value, accessor: &dyn MainAppAccessor) -> Value {
    let mut body = args.clone();
    if let (Some(user), Some(fields)) = (accessor.main_user(), body.as_object_mut()) {
        fields.insert("reporter".to_string(), Value::String(user.email));
    }
    body
}

/// The `supportApi` definition
///
/// # Arguments
///
/// * `base_url` - Prefix of every ticket request, e.g. `/api/support`
/// * `accessor` - The host's view of the main app, read when a ticket is
///   created
pub fn api_definition(base_url: &str, accessor: Arc<dyn MainAppAccessor>) -> ApiDefinition {
    ApiDefinition::new(SUPPORT_API, base_url)
        .tag_types(&["Ticket"])
        .endpoint(
            EndpointDefinition::query("getTickets", |_| RequestSpec::get("tickets"))
                .provides(&["Ticket"])
                .on_fulfilled(|_, data| match serde_json::from_value::<Vec<Ticket>>(data.clone()) {
                    Ok(items) => vec![tickets::set_tickets(items)],
                    Err(e) => {
                        warn!("Tickets payload does not decode: {}", e);
                        error("Failed to fetch tickets")
                    }
                })
                .on_rejected(|_, _| error("Failed to fetch tickets")),
        )
        .endpoint(
            EndpointDefinition::mutation("createTicket", move |args| {
                RequestSpec::post("tickets", create_ticket_body(args, accessor.as_ref()))
            })
            .requires(&["title"])
            .invalidates(&["Ticket"])
                .on_fulfilled(|_, data| match serde_json::from_value::<Ticket>(data.clone()) {
                    Ok(ticket) => vec![tickets::add_ticket(ticket)],
                    Err(e) => {
                        warn!("Created ticket payload does not decode: {}", e);
                        error("Failed to create ticket")
                    }
                })
                .on_rejected(|_, _| error("Failed to create ticket")),
        )
        .endpoint(
            EndpointDefinition::mutation("updateTicketStatus", |args| {
                let id = args["id"].as_str().unwrap_or_default();
                let body = json!({ "status": args["status"] });
                RequestSpec::patch(format!("tickets/{}/status", id), body)
            })
            .requires(&["id", "status"])
            .invalidates(&["Ticket"])
            .on_fulfilled(|args, _| {
                // The slice is updated from the request, not the response
                match serde_json::from_value::<tickets::TicketStatusUpdate>(args.clone()) {
                    Ok(update) => vec![tickets::update_ticket_status(update.id, update.status)],
                    Err(_) => error("Failed to update ticket status"),
                }
            })
            .on_rejected(|_, _| error("Failed to update ticket status")),
        )
}

/// Typed hooks over the `supportApi` client
#[derive(Debug, Clone)]
pub struct SupportApi {
    client: ApiClient,
}

impl SupportApi {
    pub fn new(store: &Store) -> Option<Self> {
        store.api(SUPPORT_API).map(|client| Self { client })
    }

    pub async fn get_tickets(&self) -> Result<QueryResult> {
        self.client.query("getTickets", Value::Null).await
    }

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<MutationResult> {
        self.client.mutate("createTicket", json!(ticket)).await
    }

    pub async fn update_ticket_status(
        &self,
        id: &str,
        status: TicketStatus,
    ) -> Result<MutationResult> {
        self.client
            .mutate("updateTicketStatus", json!({ "id": id, "status": status }))
            .await
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::DetachedAccessor;
    use crate::cache::Method;

    fn detached() -> Arc<dyn MainAppAccessor> {
        Arc::new(DetachedAccessor)
    }

    #[test]
    fn test_update_status_request() {
        let api = api_definition("/api/support", detached());
        assert!(api.validate().is_ok());

        let request = api
            .find("updateTicketStatus")
            .unwrap()
            .request(&json!({ "id": "1", "status": "closed" }));
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.path, "tickets/1/status");
        assert_eq!(request.body, Some(json!({ "status": "closed" })));
    }

    #[test]
    fn test_completion_hooks() {
        let api = api_definition("/api/support", detached());

        let get = api.find("getTickets").unwrap();
        assert_eq!(
            get.rejected_actions(&Value::Null, "Network error: offline"),
            vec![tickets::set_error(Some("Failed to fetch tickets".to_string()))]
        );
        assert_eq!(
            get.fulfilled_actions(&Value::Null, &json!([])),
            vec![tickets::set_tickets(vec![])]
        );

        let update = api.find("updateTicketStatus").unwrap();
        assert_eq!(
            update.fulfilled_actions(&json!({ "id": "1", "status": "closed" }), &json!({})),
            vec![tickets::update_ticket_status("1", TicketStatus::Closed)]
        );

        let create = api.find("createTicket").unwrap();
        assert_eq!(
            create.rejected_actions(&json!({}), "boom"),
            vec![tickets::set_error(Some("Failed to create ticket".to_string()))]
        );
    }

    #[test]
    fn test_create_request_without_main_app() {
        let api = api_definition("/api/support", detached());
        let args = json!({ "title": "Help", "description": "Please" });

        let request = api.find("createTicket").unwrap().request(&args);
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body, Some(args));
    }

    #[test]
    fn test_status_update_needs_an_id() {
        let api = api_definition("/api/support", detached());
        let update = api.find("updateTicketStatus").unwrap();

        assert!(update.check_args(&json!({ "status": "closed" })).is_err());
        assert!(update.check_args(&json!({ "id": "1", "status": "closed" })).is_ok());
    }
}
