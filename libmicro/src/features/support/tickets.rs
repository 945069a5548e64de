//! Tickets slice

use serde::{Deserialize, Serialize};

use crate::store::{Action, Slice, StateTree};

pub const TICKETS_KEY: &str = "tickets";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    Closed,
    InProgress,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Closed => write!(f, "closed"),
            TicketStatus::InProgress => write!(f, "in-progress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketStatusUpdate {
    pub id: String,
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketsState {
    pub items: Vec<Ticket>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum TicketsAction {
    SetTickets(Vec<Ticket>),
    AddTicket(Ticket),
    UpdateTicketStatus(TicketStatusUpdate),
    SetLoading(bool),
    SetError(Option<String>),
}

impl TicketsAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TicketsAction::SetTickets(_) => "tickets/setTickets",
            TicketsAction::AddTicket(_) => "tickets/addTicket",
            TicketsAction::UpdateTicketStatus(_) => "tickets/updateTicketStatus",
            TicketsAction::SetLoading(_) => "tickets/setLoading",
            TicketsAction::SetError(_) => "tickets/setError",
        }
    }
}

pub struct TicketsSlice;

impl Slice for TicketsSlice {
    type State = TicketsState;

    fn reduce(&self, mut state: TicketsState, action: &Action) -> TicketsState {
        let Action::Tickets(action) = action else {
            return state;
        };

        match action {
            TicketsAction::SetTickets(items) => state.items = items.clone(),
            TicketsAction::AddTicket(ticket) => state.items.push(ticket.clone()),
            TicketsAction::UpdateTicketStatus(update) => {
                // Unknown ids are ignored
                if let Some(ticket) = state.items.iter_mut().find(|t| t.id == update.id) {
                    ticket.status = update.status;
                }
            }
            TicketsAction::SetLoading(loading) => state.loading = *loading,
            TicketsAction::SetError(error) => state.error = error.clone(),
        }

        state
    }
}

pub fn set_tickets(tickets: Vec<Ticket>) -> Action {
    TicketsAction::SetTickets(tickets).into()
}

pub fn add_ticket(ticket: Ticket) -> Action {
    TicketsAction::AddTicket(ticket).into()
}

pub fn update_ticket_status(id: impl Into<String>, status: TicketStatus) -> Action {
    TicketsAction::UpdateTicketStatus(TicketStatusUpdate { id: id.into(), status }).into()
}

pub fn set_loading(loading: bool) -> Action {
    TicketsAction::SetLoading(loading).into()
}

pub fn set_error(error: Option<String>) -> Action {
    TicketsAction::SetError(error).into()
}

pub fn select_tickets_state(tree: &StateTree) -> TicketsState {
    tree.get::<TicketsState>(TICKETS_KEY).cloned().unwrap_or_default()
}

pub fn select_tickets(tree: &StateTree) -> Vec<Ticket> {
    tree.get::<TicketsState>(TICKETS_KEY)
        .map(|s| s.items.clone())
        .unwrap_or_default()
}

pub fn select_tickets_error(tree: &StateTree) -> Option<String> {
    tree.get::<TicketsState>(TICKETS_KEY).and_then(|s| s.error.clone())
}
