use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{DEFAULT_SESSION_TITLE, SESSION_ID_PREFIX, TITLE_ELLIPSIS, TITLE_MAX_CHARS};

/// Identifier of a chat session, `chat_<unix-millis>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("{}{}", SESSION_ID_PREFIX, millis))
    }

    /// Creation time encoded in the id, if it follows the `chat_<millis>` shape
    pub fn millis(&self) -> Option<i64> {
        self.0.strip_prefix(SESSION_ID_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (bool, Option<i64>, &str) {
        let millis = self.millis();
        (millis.is_none(), millis, &self.0)
    }
}

// Time-derived ids order by their numeric suffix so `chat_9` < `chat_10`;
// anything else sorts after them by raw string.
impl Ord for SessionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for SessionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// An image attached to a part, either carried inline or referenced by URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Inline(Vec<u8>),
    Url(String),
}

impl ImageRef {
    /// Decode a standard base64 payload into an inline image
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded.trim()).map(ImageRef::Inline)
    }

    /// Short human-readable description for text-only surfaces
    pub fn describe(&self) -> String {
        match self {
            ImageRef::Inline(bytes) => format!("[image: {} bytes]", bytes.len()),
            ImageRef::Url(url) => format!("[image: {}]", url),
        }
    }
}

/// A fragment of a turn: text plus an optional image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPart", into = "RawPart")]
pub struct Part {
    pub text: String,
    pub image: Option<ImageRef>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: ImageRef) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
        }
    }
}

// Stored/wire shape of a part: `{"text": .., "image_base64": ..}` or `{"text": .., "image_url": ..}`
#[derive(Serialize, Deserialize)]
struct RawPart {
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl TryFrom<RawPart> for Part {
    type Error = String;

    fn try_from(raw: RawPart) -> Result<Self, Self::Error> {
        let image = match (raw.image_base64, raw.image_url) {
            (Some(encoded), _) if !encoded.is_empty() => Some(
                ImageRef::from_base64(&encoded)
                    .map_err(|e| format!("invalid image_base64: {}", e))?,
            ),
            (_, Some(url)) if !url.is_empty() => Some(ImageRef::Url(url)),
            _ => None,
        };
        Ok(Part {
            text: raw.text,
            image,
        })
    }
}

impl From<Part> for RawPart {
    fn from(part: Part) -> Self {
        let (image_base64, image_url) = match part.image {
            Some(ImageRef::Inline(bytes)) => (Some(STANDARD.encode(bytes)), None),
            Some(ImageRef::Url(url)) => (None, Some(url)),
            None => (None, None),
        };
        RawPart {
            text: part.text,
            image_base64,
            image_url,
        }
    }
}

/// One exchange unit authored by the user or the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn model(text: impl Into<String>, image: Option<ImageRef>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part {
                text: text.into(),
                image,
            }],
        }
    }

    /// Text of the first part, the one every turn is guaranteed to have
    pub fn text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or("")
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.parts.iter().find_map(|p| p.image.as_ref())
    }

    /// At least one part, and empty text only alongside an image
    pub fn is_well_formed(&self) -> bool {
        !self.parts.is_empty()
            && (self.image().is_some() || self.parts.iter().any(|p| !p.text.is_empty()))
    }
}

/// One persisted conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub title: String,
    pub history: Vec<Turn>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            title: DEFAULT_SESSION_TITLE.to_string(),
            history: Vec::new(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_user_turn(&self) -> bool {
        self.history.iter().any(|t| t.role == Role::User)
    }
}

/// Title for a session derived from its first user message
pub fn derive_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}{}", head, TITLE_ELLIPSIS)
    } else {
        text.to_string()
    }
}

/// Entry of the session history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
}

/// All sessions, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCollection {
    sessions: BTreeMap<SessionId, Session>,
}

impl SessionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn insert(&mut self, id: SessionId, session: Session) {
        self.sessions.insert(id, session);
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Greatest id, i.e. the most recently created session
    pub fn newest_id(&self) -> Option<&SessionId> {
        self.sessions.keys().next_back()
    }

    /// Sessions newest first
    pub fn iter_descending(&self) -> impl Iterator<Item = (&SessionId, &Session)> {
        self.sessions.iter().rev()
    }

    /// Pick a fresh id for a session created at `now_millis`.
    ///
    /// Ids never go backwards relative to the stored ones, even when several
    /// sessions are created within the same millisecond or the clock steps
    /// back. A stored id at `i64::MAX` has no successor and is skipped.
    pub fn allocate_id(&self, now_millis: i64) -> SessionId {
        let next = self
            .sessions
            .keys()
            .filter_map(|id| id.millis()?.checked_add(1))
            .max();
        let millis = match next {
            Some(next) if next > now_millis => next,
            _ => now_millis,
        };
        SessionId::from_millis(millis)
    }

    /// A loaded collection is usable only if every turn has at least one part
    /// and carries either some text or an image
    pub fn is_well_formed(&self) -> bool {
        self.sessions
            .values()
            .flat_map(|s| s.history.iter())
            .all(Turn::is_well_formed)
    }
}
