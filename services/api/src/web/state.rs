//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user narration registry.

use crate::config::Config;
use crate::web::token::TokenSigner;
use agrivision_core::advisory::AdvisoryClient;
use agrivision_core::ports::{
    ChatService, DiagnosisService, TextToSpeechService, UserStore, WeatherService,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Providers without credentials are `None`; their endpoints report that instead
/// of failing at startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<Config>,
    pub tokens: TokenSigner,
    pub classifier: Arc<dyn DiagnosisService>,
    pub advisory: Option<AdvisoryClient>,
    pub chat: Option<Arc<dyn ChatService>>,
    pub weather: Option<Arc<dyn WeatherService>>,
    pub tts: Option<Arc<dyn TextToSpeechService>>,
    pub narrations: Arc<NarrationRegistry>,
}

//=========================================================================================
// NarrationRegistry (One Narration In Flight Per User)
//=========================================================================================

/// Tracks the narration each user is currently waiting on.
#[derive(Default)]
pub struct NarrationRegistry {
    active: Mutex<HashMap<Uuid, (u64, CancellationToken)>>,
    next_id: AtomicU64,
}

/// Handle for one registered narration. Dropping it releases the user's slot
/// unless a newer narration has already taken it.
pub struct NarrationTicket {
    registry: Arc<NarrationRegistry>,
    user_id: Uuid,
    id: u64,
    pub token: CancellationToken,
}

impl Drop for NarrationTicket {
    fn drop(&mut self) {
        self.registry.release(self.user_id, self.id);
    }
}

impl NarrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new narration for `user_id`, cancelling the one it replaces.
    pub fn begin(self: &Arc<Self>, user_id: Uuid) -> NarrationTicket {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user_id, (id, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }
        NarrationTicket {
            registry: Arc::clone(self),
            user_id,
            id,
            token,
        }
    }

    fn release(&self, user_id: Uuid, id: u64) {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if matches!(active.get(&user_id), Some((current, _)) if *current == id) {
            active.remove(&user_id);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
