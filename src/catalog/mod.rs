//! # Action Catalog
//!
//! Maps the abstract input labels of a test suite to request templates for
//! the SUT. The table is fixed; the only mutation after startup is
//! [`ActionRegistry::update`], which the state updater uses to push values
//! observed in responses into every template that depends on them.

pub mod template;

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::http::method::HttpMethod;
use template::{FieldTemplate, PathTemplate, Slot, TemplateValue};

/// Search terms the discovery action draws from, one per run.
pub const SEED_SEARCH_TERMS: [&str; 20] = [
    "Michael Jackson",
    "Taylor Swift",
    "Drake",
    "Adele",
    "Beyoncé",
    "Ed Sheeran",
    "The Weeknd",
    "Billie Eilish",
    "Lady Gaga",
    "Eminem",
    "Rockstar",
    "Blinding Lights",
    "Shape of You",
    "Rolling in the Deep",
    "Bad Guy",
    "Uptown Funk",
    "Shallow",
    "God's Plan",
    "Someone Like You",
    "Bohemian Rhapsody",
];

/// Abstract actions the SUT supports, keyed by their suite input label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Action {
    UsePlayer,
    FetchOwnPlaylists,
    GetMyProfile,
    CreatePlaylist,
    ManagePlaylistData,
    AddTracksToPlaylist,
    FetchPlaylist,
    RemoveTracksFromPlaylist,
    StartPlaying,
    Search,
    StopPlaying,
    ChangeVolume,
    SeekToPosition,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::UsePlayer,
        Action::FetchOwnPlaylists,
        Action::GetMyProfile,
        Action::CreatePlaylist,
        Action::ManagePlaylistData,
        Action::AddTracksToPlaylist,
        Action::FetchPlaylist,
        Action::RemoveTracksFromPlaylist,
        Action::StartPlaying,
        Action::Search,
        Action::StopPlaying,
        Action::ChangeVolume,
        Action::SeekToPosition,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::UsePlayer => "USE_PLAYER_I",
            Action::FetchOwnPlaylists => "FETCH_OWN_PLAYLISTS_I",
            Action::GetMyProfile => "GET_MY_PROFILE_I",
            Action::CreatePlaylist => "CREATE_PLAYLIST_I",
            Action::ManagePlaylistData => "MANAGE_PLAYLIST_DATA_I",
            Action::AddTracksToPlaylist => "ADD_NEW_TRACK_TO_PLAYLIST_I",
            Action::FetchPlaylist => "FETCH_PLAYLIST_I",
            Action::RemoveTracksFromPlaylist => "REMOVE_TRACK_FROM_PLAYLIST_I",
            Action::StartPlaying => "START_PLAYING_I",
            Action::Search => "SEARCH_PERFORM_I",
            Action::StopPlaying => "STOP_PLAYING_I",
            Action::ChangeVolume => "CHANGE_VOLUME_I",
            Action::SeekToPosition => "SEEK_TO_POSITION_I",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.label() == label)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Request template for one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    pub method: HttpMethod,
    pub path: PathTemplate,
    pub query: FieldTemplate,
    pub body: Option<FieldTemplate>,
    pub requires_body_validation: bool,
    /// Values pushed in by [`ActionRegistry::update`]; these win over the
    /// execution context when the request is bound.
    pub bound: BTreeMap<Slot, Value>,
}

impl ActionSpec {
    pub fn new(method: HttpMethod, path: PathTemplate) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
            requires_body_validation: true,
            bound: BTreeMap::new(),
        }
    }

    pub fn with_query(mut self, query: FieldTemplate) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: FieldTemplate) -> Self {
        self.body = Some(body);
        self
    }

    pub fn without_body_validation(mut self) -> Self {
        self.requires_body_validation = false;
        self
    }

    /// Whether any part of the template (path, query or body) uses `slot`.
    pub fn references(&self, slot: Slot) -> bool {
        let in_fields = |fields: &FieldTemplate| {
            fields
                .iter()
                .any(|(_, value)| value.slot() == Some(slot))
        };

        self.path.slots().any(|s| s == slot)
            || in_fields(&self.query)
            || self.body.as_ref().is_some_and(in_fields)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no route for label `{label}`")]
pub struct RouteNotFound {
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    specs: BTreeMap<Action, ActionSpec>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped for the playlist/player SUT.
    pub fn default_catalog(search_term: &str) -> Self {
        use HttpMethod::{Delete, Get, Post, Put};

        let tracks_path = || PathTemplate::with_slot("/playlist/", Slot::CollectionId, "/tracks");

        let mut registry = Self::new();
        registry.register(
            Action::UsePlayer,
            ActionSpec::new(Get, PathTemplate::literal("/player/current")),
        );
        registry.register(
            Action::FetchOwnPlaylists,
            ActionSpec::new(Get, PathTemplate::literal("/playlists")),
        );
        registry.register(
            Action::GetMyProfile,
            ActionSpec::new(Get, PathTemplate::literal("/profile")),
        );
        registry.register(
            Action::CreatePlaylist,
            ActionSpec::new(Post, PathTemplate::literal("/playlist")).with_body(vec![
                ("name".into(), TemplateValue::text("MBT_Test_Playlist")),
                ("description".into(), TemplateValue::text("Default_Test_Description")),
                ("public".into(), TemplateValue::Literal(json!(false))),
            ]),
        );
        registry.register(
            Action::ManagePlaylistData,
            ActionSpec::new(Put, PathTemplate::with_slot("/playlist/", Slot::CollectionId, ""))
                .with_body(vec![
                    ("name".into(), TemplateValue::text("MBT_Test_Playlist_Modified")),
                    ("description".into(), TemplateValue::text("New_Test_Description")),
                ]),
        );
        registry.register(
            Action::AddTracksToPlaylist,
            ActionSpec::new(Post, tracks_path())
                .with_body(vec![("trackUris".into(), TemplateValue::Slot(Slot::DiscoveredItems))]),
        );
        registry.register(Action::FetchPlaylist, ActionSpec::new(Get, tracks_path()));
        registry.register(
            Action::RemoveTracksFromPlaylist,
            ActionSpec::new(Delete, tracks_path()).with_body(vec![(
                "trackUris".into(),
                TemplateValue::Slot(Slot::FirstDiscoveredItem),
            )]),
        );
        registry.register(
            Action::StartPlaying,
            ActionSpec::new(Post, PathTemplate::literal("/player/start"))
                .with_body(vec![("uris".into(), TemplateValue::Slot(Slot::DiscoveredItems))]),
        );
        registry.register(
            Action::Search,
            ActionSpec::new(Get, PathTemplate::literal("/search")).with_query(vec![
                ("query".into(), TemplateValue::text(search_term)),
                ("types".into(), TemplateValue::text("track")),
            ]),
        );
        registry.register(
            Action::StopPlaying,
            ActionSpec::new(Post, PathTemplate::literal("/player/pause")),
        );
        registry.register(
            Action::ChangeVolume,
            ActionSpec::new(Post, PathTemplate::literal("/player/volume"))
                .with_body(vec![("volumePercent".into(), TemplateValue::Literal(json!(50)))]),
        );
        registry.register(
            Action::SeekToPosition,
            ActionSpec::new(Post, PathTemplate::literal("/player/seek"))
                .with_body(vec![("positionMs".into(), TemplateValue::Literal(json!(1000)))]),
        );
        registry
    }

    /// Picks the run's search term from [`SEED_SEARCH_TERMS`].
    pub fn pick_search_term<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
        SEED_SEARCH_TERMS.choose(rng).copied().unwrap_or(SEED_SEARCH_TERMS[0])
    }

    pub fn register(&mut self, action: Action, spec: ActionSpec) {
        self.specs.insert(action, spec);
    }

    pub fn lookup(&self, label: &str) -> Result<(Action, &ActionSpec), RouteNotFound> {
        Action::from_label(label)
            .and_then(|action| self.specs.get(&action).map(|spec| (action, spec)))
            .ok_or_else(|| RouteNotFound {
                label: label.to_string(),
            })
    }

    pub fn get(&self, action: Action) -> Option<&ActionSpec> {
        self.specs.get(&action)
    }

    /// Binds `value` to `slot` in every registered spec that references it.
    /// Returns the actions that were touched.
    pub fn update(&mut self, slot: Slot, value: Value) -> Vec<Action> {
        let mut touched = Vec::new();
        for (action, spec) in self.specs.iter_mut() {
            if spec.references(slot) {
                spec.bound.insert(slot, value.clone());
                touched.push(*action);
            }
        }
        touched
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
