//! `paymentsApi` cache client

use serde_json::Value;

use crate::cache::{
    ApiClient, ApiDefinition, EndpointDefinition, MutationResult, QueryResult, RequestSpec,
};
use crate::error::Result;
use crate::store::Store;

pub const PAYMENTS_API: &str = "paymentsApi";

pub fn api_definition(base_url: &str) -> ApiDefinition {
    ApiDefinition::new(PAYMENTS_API, base_url)
        .tag_types(&["Transaction", "PaymentMethod"])
        .endpoint(
            EndpointDefinition::query("getTransactions", |_| RequestSpec::get("transactions"))
                .provides(&["Transaction"]),
        )
        .endpoint(
            EndpointDefinition::mutation("addTransaction", |args| {
                RequestSpec::post("transactions", args.clone())
            })
            .invalidates(&["Transaction"]),
        )
        .endpoint(
            EndpointDefinition::query("getPaymentMethods", |_| RequestSpec::get("payment-methods"))
                .provides(&["PaymentMethod"]),
        )
}

/// Typed hooks over the `paymentsApi` client
#[derive(Debug, Clone)]
pub struct PaymentsApi {
    client: ApiClient,
}

impl PaymentsApi {
    pub fn new(store: &Store) -> Option<Self> {
        store.api(PAYMENTS_API).map(|client| Self { client })
    }

    pub async fn get_transactions(&self) -> Result<QueryResult> {
        self.client.query("getTransactions", Value::Null).await
    }

    /// Fields left out of `transaction` are filled in by the server
    pub async fn add_transaction(&self, transaction: Value) -> Result<MutationResult> {
        self.client.mutate("addTransaction", transaction).await
    }

    pub async fn get_payment_methods(&self) -> Result<QueryResult> {
        self.client.query("getPaymentMethods", Value::Null).await
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
