use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::view::ChatView;
use crate::constants::{CLEAR_ALL_PROMPT, ERROR_REPLY_PREFIX, GREETING_TEXT};
use crate::generation::{GenerationClient, GenerationError, ResponsePayload};
use crate::session::{
    derive_title, list_sessions_descending, Part, Role, Session, SessionCollection, SessionId,
    SessionStore, SessionSummary, Turn,
};

/// Whether a session is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Active(SessionId),
}

/// A submission waiting for the model's answer
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Session the answer belongs to, even if the user switches away meanwhile
    pub session_id: SessionId,
    /// Full history sent with the request
    pub history: Vec<Turn>,
}

/// Owns the sessions and the active selection, and runs the submit cycle
pub struct ConversationController<V: ChatView> {
    store: SessionStore,
    client: Arc<dyn GenerationClient>,
    view: V,
    collection: SessionCollection,
    state: ControllerState,
    in_flight: Option<SessionId>,
    dark_mode: bool,
    /// Source of creation timestamps for new ids
    clock: fn() -> i64,
    /// Millis of the last id handed out; survives `clear_all` so cleared ids are never reissued
    last_issued: Option<i64>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl<V: ChatView> ConversationController<V> {
    /// Load stored sessions and activate the newest one, or start a fresh session
    pub fn open(store: SessionStore, client: Arc<dyn GenerationClient>, view: V) -> Self {
        Self::open_with_clock(store, client, view, now_millis)
    }

    /// Like [`ConversationController::open`], taking new-session timestamps from `clock`
    pub fn open_with_clock(
        store: SessionStore,
        client: Arc<dyn GenerationClient>,
        view: V,
        clock: fn() -> i64,
    ) -> Self {
        let collection = store.load();
        let dark_mode = store.load_dark_mode();

        let mut controller = Self {
            store,
            client,
            view,
            collection,
            state: ControllerState::Idle,
            in_flight: None,
            dark_mode,
            clock,
            last_issued: None,
        };
        controller.view.set_dark_mode(dark_mode);

        match controller.collection.newest_id().cloned() {
            Some(id) => {
                controller.select_session(&id);
            }
            None => {
                controller.new_session();
            }
        }

        controller
    }

    /// Start a new empty session and make it active
    pub fn new_session(&mut self) -> SessionId {
        let now = (self.clock)();
        let not_before = match self.last_issued.and_then(|m| m.checked_add(1)) {
            Some(floor) => now.max(floor),
            None => now,
        };
        let id = self.collection.allocate_id(not_before);
        self.last_issued = id.millis();
        self.collection.insert(id.clone(), Session::new());
        self.state = ControllerState::Active(id.clone());
        info!("Started session {}", id);

        self.view.clear_messages();
        self.view.render_turn(Role::Model, &Part::text(GREETING_TEXT));
        self.refresh_history();
        self.persist();

        id
    }

    /// Make `id` the active session and replay its history.
    ///
    /// Returns `false` and changes nothing if no such session exists.
    pub fn select_session(&mut self, id: &SessionId) -> bool {
        let Some(session) = self.collection.get(id) else {
            debug!("Ignoring selection of unknown session {}", id);
            return false;
        };

        self.state = ControllerState::Active(id.clone());
        self.view.clear_messages();
        if session.history.is_empty() {
            self.view.render_turn(Role::Model, &Part::text(GREETING_TEXT));
        }
        for turn in &session.history {
            for part in &turn.parts {
                self.view.render_turn(turn.role, part);
            }
        }
        if self.in_flight.as_ref() == Some(id) {
            self.view.show_typing();
        }
        self.refresh_history();

        true
    }

    /// Move the selection through the history list; positive `offset` goes
    /// towards older sessions
    pub fn select_relative(&mut self, offset: isize) -> bool {
        let sessions = list_sessions_descending(&self.collection);
        let Some(current) = self
            .active_id()
            .and_then(|id| sessions.iter().position(|s| &s.id == id))
        else {
            return false;
        };

        let target = current as isize + offset;
        if target < 0 || target as usize >= sessions.len() || target as usize == current {
            return false;
        }
        let id = sessions[target as usize].id.clone();
        self.select_session(&id)
    }

    /// First half of a submission: record the user turn and build the request.
    ///
    /// Returns `None` without touching anything when the text is blank, no
    /// session is active, or another request is still outstanding.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingRequest> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        if let Some(waiting) = &self.in_flight {
            debug!("Submission refused while session {} awaits a reply", waiting);
            return None;
        }
        let ControllerState::Active(id) = &self.state else {
            return None;
        };
        let id = id.clone();
        let session = self.collection.get_mut(&id)?;

        let first_user_turn = !session.has_user_turn();
        let turn = Turn::user(message);
        session.history.push(turn.clone());
        if first_user_turn {
            session.title = derive_title(message);
        }
        let history = session.history.clone();

        for part in &turn.parts {
            self.view.render_turn(Role::User, part);
        }
        if first_user_turn {
            self.refresh_history();
        }
        self.view.clear_input();
        self.view.show_typing();
        self.in_flight = Some(id.clone());
        self.persist();

        Some(PendingRequest {
            session_id: id,
            history,
        })
    }

    /// Second half of a submission: append the model's answer, or a visible
    /// error turn, to the session that asked.
    ///
    /// Returns `false` if that session no longer exists.
    pub fn complete_submit(
        &mut self,
        pending: PendingRequest,
        result: Result<ResponsePayload, GenerationError>,
    ) -> bool {
        if self.in_flight.as_ref() == Some(&pending.session_id) {
            self.in_flight = None;
        }
        self.view.hide_typing();

        let turn = match result {
            Ok(payload) => {
                let (text, image) = payload.into_parts();
                Turn::model(text, image)
            }
            Err(e) => {
                warn!("Generation failed for session {}: {}", pending.session_id, e);
                Turn::model(format!("{}{}", ERROR_REPLY_PREFIX, e), None)
            }
        };

        let Some(session) = self.collection.get_mut(&pending.session_id) else {
            warn!(
                "Dropping reply for session {} which no longer exists",
                pending.session_id
            );
            return false;
        };
        session.history.push(turn.clone());

        if self.active_id() == Some(&pending.session_id) {
            for part in &turn.parts {
                self.view.render_turn(Role::Model, part);
            }
        }
        self.persist();

        true
    }

    /// Submit a message and wait for the answer.
    ///
    /// Returns `false` if the submission was refused; failures of the request
    /// itself end up as an error turn, never as an error here.
    pub async fn submit(&mut self, text: &str) -> bool {
        let Some(pending) = self.begin_submit(text) else {
            return false;
        };
        let result = self.client.generate(&pending.history).await;
        self.complete_submit(pending, result)
    }

    /// Delete every session after `confirm` agrees, then start a fresh one.
    ///
    /// `confirm` receives the question to ask the user.
    pub fn clear_all<F>(&mut self, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CLEAR_ALL_PROMPT) {
            return false;
        }

        if let Err(e) = self.store.clear() {
            warn!("Failed to erase stored chats: {}", e);
        }
        self.collection.clear();
        self.state = ControllerState::Idle;
        info!("Cleared all chat history");

        self.new_session();
        true
    }

    /// Flip and persist the dark mode preference
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        if let Err(e) = self.store.save_dark_mode(self.dark_mode) {
            warn!("Failed to save dark mode preference: {}", e);
        }
        self.view.set_dark_mode(self.dark_mode);
        self.dark_mode
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        match &self.state {
            ControllerState::Active(id) => Some(id),
            ControllerState::Idle => None,
        }
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_id().and_then(|id| self.collection.get(id))
    }

    pub fn collection(&self) -> &SessionCollection {
        &self.collection
    }

    /// Session list, newest first
    pub fn sessions(&self) -> Vec<SessionSummary> {
        list_sessions_descending(&self.collection)
    }

    /// Whether a request is outstanding
    pub fn is_waiting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Handle for running a request outside the controller
    pub fn client(&self) -> Arc<dyn GenerationClient> {
        Arc::clone(&self.client)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    fn refresh_history(&mut self) {
        let sessions = list_sessions_descending(&self.collection);
        let active = match &self.state {
            ControllerState::Active(id) => Some(id),
            ControllerState::Idle => None,
        };
        self.view.render_history(&sessions, active);
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.collection) {
            warn!("Failed to persist chats: {}", e);
        }
    }
}
