//! # Response Oracles
//!
//! Each expected-outcome label owns a fixed set of assertions over the
//! parsed JSON body. Labels are a closed enum; a label read from a suite
//! file that does not name one of them fails closed.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;

/// Expected outcomes, keyed by their suite output label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeLabel {
    PlayerState,
    OwnPlaylists,
    MyProfile,
    PlaylistCreated,
    PlaylistUpdated,
    TracksAdded,
    PlaylistFetched,
    TracksRemoved,
    PlaybackStarted,
    SearchResults,
    PlaybackPaused,
    VolumeChanged,
    Seeked,
}

impl OutcomeLabel {
    pub const ALL: [OutcomeLabel; 13] = [
        OutcomeLabel::PlayerState,
        OutcomeLabel::OwnPlaylists,
        OutcomeLabel::MyProfile,
        OutcomeLabel::PlaylistCreated,
        OutcomeLabel::PlaylistUpdated,
        OutcomeLabel::TracksAdded,
        OutcomeLabel::PlaylistFetched,
        OutcomeLabel::TracksRemoved,
        OutcomeLabel::PlaybackStarted,
        OutcomeLabel::SearchResults,
        OutcomeLabel::PlaybackPaused,
        OutcomeLabel::VolumeChanged,
        OutcomeLabel::Seeked,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OutcomeLabel::PlayerState => "USE_PLAYER_O",
            OutcomeLabel::OwnPlaylists => "FETCH_OWN_PLAYLISTS_O",
            OutcomeLabel::MyProfile => "GET_MY_PROFILE_O",
            OutcomeLabel::PlaylistCreated => "CREATE_PLAYLIST_O",
            OutcomeLabel::PlaylistUpdated => "MANAGE_PLAYLIST_DATA_O",
            OutcomeLabel::TracksAdded => "ADD_NEW_TRACK_TO_PLAYLIST_O",
            OutcomeLabel::PlaylistFetched => "FETCH_PLAYLIST_O",
            OutcomeLabel::TracksRemoved => "REMOVE_TRACK_FROM_PLAYLIST_O",
            OutcomeLabel::PlaybackStarted => "START_PLAYING_O",
            OutcomeLabel::SearchResults => "SEARCH_PERFORM_O",
            OutcomeLabel::PlaybackPaused => "STOP_PLAYING_O",
            OutcomeLabel::VolumeChanged => "CHANGE_VOLUME_O",
            OutcomeLabel::Seeked => "SEEK_TO_POSITION_O",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|outcome| outcome.label() == label)
    }

    /// The contract a response body must satisfy for this outcome.
    pub fn assertions(self) -> Vec<Assertion> {
        use Check::{EachHas, Equals, Exists, IsObject};

        match self {
            OutcomeLabel::PlayerState => vec![Assertion::new("device", IsObject)],
            OutcomeLabel::OwnPlaylists => vec![
                Assertion::new("message", Equals("Owned Playlists fetched successfully")),
                Assertion::new("playlists", Exists),
            ],
            OutcomeLabel::MyProfile => vec![
                Assertion::new("country", Exists),
                Assertion::new("display_name", Exists),
                Assertion::new("email", Exists),
                Assertion::new("uri", Exists),
            ],
            OutcomeLabel::PlaylistCreated => vec![
                Assertion::new("message", Equals("Playlist created")),
                Assertion::new("playlist", Exists),
            ],
            OutcomeLabel::PlaylistUpdated => {
                vec![Assertion::new("message", Equals("Playlist details updated successfully"))]
            }
            OutcomeLabel::TracksAdded => {
                vec![Assertion::new("message", Equals("Tracks added to playlist"))]
            }
            OutcomeLabel::PlaylistFetched => vec![
                Assertion::new("playlistId", Exists),
                Assertion::new(
                    "tracks",
                    EachHas(&["trackName", "artists", "album", "durationMs"]),
                ),
            ],
            OutcomeLabel::TracksRemoved => {
                vec![Assertion::new("message", Equals("Tracks removed from playlist"))]
            }
            OutcomeLabel::PlaybackStarted => {
                vec![Assertion::new("message", Equals("Playback started or resumed"))]
            }
            OutcomeLabel::SearchResults => vec![Assertion::new("tracks.items", Exists)],
            OutcomeLabel::PlaybackPaused => {
                vec![Assertion::new("message", Equals("Playback paused"))]
            }
            OutcomeLabel::VolumeChanged => vec![Assertion::new("message", Equals("Volume changed"))],
            OutcomeLabel::Seeked => vec![Assertion::new("message", Equals("Seeked to position"))],
        }
    }
}

impl Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What an assertion requires of the field it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Exists,
    IsObject,
    Equals(&'static str),
    /// Field is a list and every element carries all the named keys.
    /// An empty list passes.
    EachHas(&'static [&'static str]),
}

/// A single check against a dotted field path in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assertion {
    pub path: &'static str,
    pub check: Check,
}

impl Assertion {
    pub const fn new(path: &'static str, check: Check) -> Self {
        Self { path, check }
    }

    /// `None` on success, otherwise a short reason.
    pub fn evaluate(&self, body: &Value) -> Option<String> {
        let Some(actual) = lookup(body, self.path) else {
            return Some(format!("`{}` is missing", self.path));
        };

        match self.check {
            Check::Exists => None,
            Check::IsObject => {
                (!actual.is_object()).then(|| format!("`{}` is not an object", self.path))
            }
            Check::Equals(expected) => match actual.as_str() {
                Some(text) if text == expected => None,
                _ => Some(format!("`{}` expected \"{expected}\", got {actual}", self.path)),
            },
            Check::EachHas(keys) => {
                let Some(items) = actual.as_array() else {
                    return Some(format!("`{}` is not a list", self.path));
                };
                items.iter().enumerate().find_map(|(index, item)| {
                    keys.iter()
                        .find(|key| item.get(**key).is_none())
                        .map(|key| format!("`{}[{index}]` is missing `{key}`", self.path))
                })
            }
        }
    }
}

fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(body, |value, key| value.get(key))
}

/// Result of running an outcome's oracle over a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    /// Parsed, but failed at least one assertion. Carries the reasons and
    /// the pretty-printed body.
    Mismatch { reasons: Vec<String>, body: String },
    /// Not JSON; the oracle was never consulted.
    Malformed,
}

/// Runs the oracle for `output_label` over a raw response body.
pub fn validate(output_label: &str, raw_body: &str) -> Verdict {
    let Ok(body) = serde_json::from_str::<Value>(raw_body) else {
        return Verdict::Malformed;
    };

    let reasons = match OutcomeLabel::from_label(output_label) {
        Some(outcome) => outcome
            .assertions()
            .iter()
            .filter_map(|assertion| assertion.evaluate(&body))
            .collect(),
        None => vec![format!("no oracle defined for outcome label `{output_label}`")],
    };

    if reasons.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Mismatch {
            reasons,
            body: render_body(&body),
        }
    }
}

/// Pretty JSON when the text parses, `None` otherwise.
pub fn pretty_body(raw_body: &str) -> Option<String> {
    serde_json::from_str::<Value>(raw_body)
        .ok()
        .map(|body| render_body(&body))
}

fn render_body(body: &Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}
