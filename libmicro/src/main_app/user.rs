//! Signed-in user slice and the main app's cache client

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cache::{
    ApiClient, ApiDefinition, EndpointDefinition, MutationResult, QueryResult, RequestSpec,
};
use crate::error::Result;
use crate::store::{Action, Slice, StateTree, Store};

pub const USER_KEY: &str = "user";
pub const MAIN_API: &str = "mainApi";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub language: String,
    pub notifications: bool,
}

/// Partial preferences update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum UserAction {
    SetUser(Option<User>),
    SetLoading(bool),
    SetError(Option<String>),
}

impl UserAction {
    pub fn kind(&self) -> &'static str {
        match self {
            UserAction::SetUser(_) => "user/setUser",
            UserAction::SetLoading(_) => "user/setLoading",
            UserAction::SetError(_) => "user/setError",
        }
    }
}

pub struct UserSlice;

impl Slice for UserSlice {
    type State = UserState;

    fn reduce(&self, state: UserState, action: &Action) -> UserState {
        let Action::User(action) = action else {
            return state;
        };

        match action {
            UserAction::SetUser(user) => UserState {
                user: user.clone(),
                ..state
            },
            UserAction::SetLoading(loading) => UserState {
                loading: *loading,
                ..state
            },
            UserAction::SetError(error) => UserState {
                error: error.clone(),
                ..state
            },
        }
    }
}

pub fn set_user(user: Option<User>) -> Action {
    UserAction::SetUser(user).into()
}

pub fn set_loading(loading: bool) -> Action {
    UserAction::SetLoading(loading).into()
}

pub fn set_error(error: Option<String>) -> Action {
    UserAction::SetError(error).into()
}

pub fn select_user(tree: &StateTree) -> Option<User> {
    tree.get::<UserState>(USER_KEY).and_then(|state| state.user.clone())
}

/// `mainApi`: the signed-in user and their preferences
pub fn api_definition(base_url: &str) -> ApiDefinition {
    ApiDefinition::new(MAIN_API, base_url)
        .tag_types(&["User", "Preferences"])
        .endpoint(
            EndpointDefinition::query("getCurrentUser", |_| RequestSpec::get("user/me"))
                .provides(&["User"])
                .on_fulfilled(|_, data| match serde_json::from_value::<User>(data.clone()) {
                    Ok(user) => vec![set_user(Some(user))],
                    Err(e) => {
                        tracing::warn!("Current user payload does not decode: {}", e);
                        Vec::new()
                    }
                }),
        )
        .endpoint(
            EndpointDefinition::mutation("updateUserPreferences", |args| {
                RequestSpec::patch("user/preferences", args.clone())
            })
            .invalidates(&["User", "Preferences"]),
        )
}

/// Typed hooks over the `mainApi` client
#[derive(Debug, Clone)]
pub struct MainApi {
    client: ApiClient,
}

impl MainApi {
    pub fn new(store: &Store) -> Option<Self> {
        store.api(MAIN_API).map(|client| Self { client })
    }

    pub async fn get_current_user(&self) -> Result<QueryResult> {
        self.client.query("getCurrentUser", Value::Null).await
    }

    pub async fn update_user_preferences(
        &self,
        patch: &PreferencesPatch,
    ) -> Result<MutationResult> {
        self.client.mutate("updateUserPreferences", json!(patch)).await
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            preferences: Preferences {
                language: "en".to_string(),
                notifications: true,
            },
        }
    }

    #[test]
    fn test_reducer() {
        let state = UserSlice.reduce(UserState::default(), &set_user(Some(user())));
        assert_eq!(state.user, Some(user()));

        let state = UserSlice.reduce(state, &set_loading(true));
        let state = UserSlice.reduce(state, &set_error(Some("expired".to_string())));
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("expired"));
        assert_eq!(state.user, Some(user()));

        let state = UserSlice.reduce(state, &set_user(None));
        assert!(state.user.is_none());
    }

    #[test]
    fn test_user_json_shape() {
        let json = serde_json::to_value(user()).unwrap();
        assert_eq!(json["preferences"]["notifications"], true);

        let patch = PreferencesPatch {
            language: Some("fr".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(patch).unwrap(), json!({ "language": "fr" }));
    }

    #[test]
    fn test_current_user_hook_sets_user() {
        let api = api_definition("/api");
        assert!(api.validate().is_ok());

        let endpoint = api.find("getCurrentUser").unwrap();
        let payload = serde_json::to_value(user()).unwrap();
        let actions = endpoint.fulfilled_actions(&Value::Null, &payload);
        assert_eq!(actions, vec![set_user(Some(user()))]);

        assert!(endpoint.fulfilled_actions(&Value::Null, &json!({ "id": 1 })).is_empty());
    }
}
