//! Cross-app accessor
//!
//! Feature modules never reach into the main app's store directly. They
//! are handed a [`MainAppAccessor`] at composition time: under the root
//! store it reads the mounted store, under a standalone store it is
//! detached and every read returns `None`.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::cache::{ApiAction, Tag};
use crate::main_app::user::{self, User, MAIN_API};
use crate::store::{Store, WeakStore};

/// Tag kinds of the main app's cache client that micro apps may invalidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainTag {
    User,
    Preferences,
}

impl MainTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainTag::User => "User",
            MainTag::Preferences => "Preferences",
        }
    }
}

impl From<MainTag> for Tag {
    fn from(tag: MainTag) -> Self {
        Tag::new(tag.as_str())
    }
}

impl std::str::FromStr for MainTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(MainTag::User),
            "Preferences" => Ok(MainTag::Preferences),
            other => Err(format!("Unknown main app tag: {}", other)),
        }
    }
}

pub trait MainAppAccessor: Send + Sync {
    /// The signed-in user of the main app, if there is a main app
    fn main_user(&self) -> Option<User>;

    /// Invalidate main app cache tags; returns immediately
    fn invalidate_main_tags(&self, tags: &[MainTag]);
}

/// Accessor for modules running inside the root store
///
/// Created before the store exists and mounted once the store is built.
/// Until then, and after the store is dropped, it behaves like
/// [`DetachedAccessor`].
#[derive(Default)]
pub struct RootAccessor {
    store: OnceLock<WeakStore>,
}

impl RootAccessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns false if a store was already mounted
    pub fn mount(&self, store: &Store) -> bool {
        self.store.set(store.downgrade()).is_ok()
    }

    pub fn is_mounted(&self) -> bool {
        self.store.get().is_some()
    }

    fn store(&self) -> Option<Store> {
        self.store.get().and_then(WeakStore::upgrade)
    }
}

impl MainAppAccessor for RootAccessor {
    fn main_user(&self) -> Option<User> {
        let store = self.store()?;
        store.select(user::select_user)
    }

    fn invalidate_main_tags(&self, tags: &[MainTag]) {
        let Some(store) = self.store() else {
            debug!("Main app store not mounted; ignoring tag invalidation");
            return;
        };
        if tags.is_empty() {
            return;
        }

        debug!(tags = ?tags, "Invalidating main app tags");
        store.dispatch(
            ApiAction::TagsInvalidated {
                api: MAIN_API.to_string(),
                tags: tags.iter().copied().map(Tag::from).collect(),
            }
            .into(),
        );
    }
}

impl std::fmt::Debug for RootAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootAccessor").field("mounted", &self.is_mounted()).finish()
    }
}

/// Accessor for standalone stores, where there is no main app
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedAccessor;

impl MainAppAccessor for DetachedAccessor {
    fn main_user(&self) -> Option<User> {
        None
    }

    fn invalidate_main_tags(&self, _tags: &[MainTag]) {}
}
