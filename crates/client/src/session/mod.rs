//! Session manager.
//!
//! Owns the signed-in identity and its bearer token, which is persisted under
//! [`keys::TOKEN`](crate::store::keys::TOKEN).
//!
//! # Lifecycle
//!
//! ```text
//! Anonymous --login/register ok--> Authenticated
//! Authenticated --logout/expire--> Anonymous
//! stored token --bootstrap--> Authenticated | Anonymous (session expired)
//! ```
//!
//! Login, registration and bootstrap share one in-flight guard: starting a
//! second one while another is outstanding fails with [`SessionError::Busy`]
//! and changes nothing.
//!
//! Logout and expiry take no guard. They bump a sign-out generation instead,
//! and an operation that started under an older generation discards its
//! result, so a session is never installed after the user signed out.

mod model;

pub use model::Session;

use std::sync::Arc;

use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use storefront_core::{Email, EmailError, UserProfile};

use crate::api::{ApiError, AuthResponse, Credentials, Registration, StorefrontApi};
use crate::guard::InFlight;
use crate::notify::{Notification, Notifier};
use crate::store::{SharedStore, keys};

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Another login, registration or bootstrap is in progress.
    #[error("a session operation is already in progress")]
    Busy,

    /// Email rejected before contacting the backend.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The user signed out while the request was in flight; its result was
    /// discarded.
    #[error("signed out while the request was in flight")]
    SignedOut,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    /// A token was persisted but bootstrap has not resolved it yet.
    pending_bootstrap: bool,
    /// Bumped by every sign-out.
    generation: u64,
}

/// Authenticated-identity state manager.
pub struct SessionManager<A> {
    api: Arc<A>,
    store: SharedStore,
    notifier: Notifier,
    state: Mutex<SessionState>,
    in_flight: InFlight,
}

impl<A> std::fmt::Debug for SessionManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.lock())
            .field("in_flight", &self.in_flight.is_busy())
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi> SessionManager<A> {
    /// Create a manager. A persisted token puts it in the loading state until
    /// [`bootstrap`](Self::bootstrap) resolves it.
    #[must_use]
    pub fn new(api: Arc<A>, store: SharedStore, notifier: Notifier) -> Self {
        let pending_bootstrap = read_token(&store).is_some();
        Self {
            api,
            store,
            notifier,
            state: Mutex::new(SessionState {
                pending_bootstrap,
                ..SessionState::default()
            }),
            in_flight: InFlight::new(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Rehydrate the session from the persisted token.
    ///
    /// Without a token the manager settles to anonymous. With one, the
    /// profile is fetched; if that fails for any reason the token is
    /// discarded and a session-expired notification is published.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if another session operation is in
    /// progress. A failed profile fetch is not an error; it yields `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<Option<Session>, SessionError> {
        let _ticket = self.in_flight.try_begin().ok_or(SessionError::Busy)?;

        let generation = self.generation();
        let Some(token) = read_token(&self.store) else {
            let mut state = self.state.lock();
            state.session = None;
            state.pending_bootstrap = false;
            return Ok(None);
        };

        match self.api.fetch_profile(&token).await {
            Ok(profile) => {
                let session = Session {
                    profile: profile.user,
                    is_admin: profile.is_admin,
                    token,
                };
                if !self.install(generation, &session, false) {
                    debug!("Signed out during bootstrap, discarding restored session");
                    return Ok(None);
                }
                info!(name = %session.name(), is_admin = session.is_admin, "Session restored");
                Ok(Some(session))
            }
            Err(_) if self.generation() != generation => {
                debug!("Signed out during bootstrap, ignoring profile failure");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Stored session rejected, signing out");
                self.expire();
                Ok(None)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On failure the session and persisted token are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if another session operation is in
    /// progress, `SessionError::InvalidEmail` if `email` is malformed,
    /// `SessionError::Api` if the backend refuses the credentials, or
    /// `SessionError::SignedOut` if a logout happened while waiting.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: SecretString) -> Result<Session, SessionError> {
        let _ticket = self.in_flight.try_begin().ok_or(SessionError::Busy)?;
        let generation = self.generation();

        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(e) => return Err(self.reject(Notification::login_failed(), e.into())),
        };
        let credentials = Credentials { email, password };

        match self.api.login(&credentials).await {
            Ok(auth) => {
                let session = self.establish(generation, auth)?;
                info!(name = %session.name(), is_admin = session.is_admin, "Login successful");
                self.notifier
                    .publish(Notification::login_succeeded(session.name()));
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(self.reject(Notification::login_failed(), e.into()))
            }
        }
    }

    /// Create an account and sign in with it.
    ///
    /// The session is populated from the registration response; no profile
    /// fetch follows.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if another session operation is in
    /// progress, `SessionError::InvalidEmail` if `email` is malformed,
    /// `SessionError::Api` if the backend refuses the registration, or
    /// `SessionError::SignedOut` if a logout happened while waiting.
    #[instrument(skip(self, password, phone, address))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: SecretString,
        phone: &str,
        address: &str,
    ) -> Result<Session, SessionError> {
        let _ticket = self.in_flight.try_begin().ok_or(SessionError::Busy)?;
        let generation = self.generation();

        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(e) => return Err(self.reject(Notification::registration_failed(), e.into())),
        };
        let registration = Registration {
            name: name.to_string(),
            email,
            password,
            phone: phone.to_string(),
            address: address.to_string(),
        };

        match self.api.register(&registration).await {
            Ok(auth) => {
                let session = self.establish(generation, auth)?;
                info!(name = %session.name(), "Registration successful");
                self.notifier
                    .publish(Notification::registration_succeeded(session.name()));
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                Err(self.reject(Notification::registration_failed(), e.into()))
            }
        }
    }

    /// Sign out. Never fails and makes no remote call.
    pub fn logout(&self) {
        self.sign_out();
        info!("Logged out");
        self.notifier.publish(Notification::logged_out());
    }

    /// Force a sign-out after the backend rejected the session.
    ///
    /// Clears the token and session like [`logout`](Self::logout) but
    /// publishes a session-expired notification instead.
    pub fn expire(&self) {
        self.sign_out();
        info!("Session expired");
        self.notifier.publish(Notification::session_expired());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    /// Profile of the signed-in customer.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.state.lock().session.as_ref().map(|s| s.profile.clone())
    }

    /// Whether a session is installed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Whether the signed-in customer has admin rights.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state
            .lock()
            .session
            .as_ref()
            .is_some_and(|s| s.is_admin)
    }

    /// Whether a session operation is outstanding, or a persisted token is
    /// waiting for [`bootstrap`](Self::bootstrap).
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_busy() || self.state.lock().pending_bootstrap
    }

    /// Bearer token of the current session.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.state.lock().session.as_ref().map(|s| s.token.clone())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Persist the token, then install the session, unless a sign-out
    /// happened since `generation` was read.
    fn establish(&self, generation: u64, auth: AuthResponse) -> Result<Session, SessionError> {
        let session = Session {
            profile: auth.user,
            is_admin: auth.is_admin,
            token: auth.token,
        };
        if self.install(generation, &session, true) {
            Ok(session)
        } else {
            info!("Signed out while signing in, discarding new session");
            Err(SessionError::SignedOut)
        }
    }

    /// Install `session` if no sign-out happened since `generation` was read.
    ///
    /// The check, the token write and the install happen under the state
    /// lock, as does [`sign_out`](Self::sign_out), so the two cannot
    /// interleave.
    fn install(&self, generation: u64, session: &Session, persist: bool) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        if persist {
            write_token(&self.store, &session.token);
        }
        state.session = Some(session.clone());
        state.pending_bootstrap = false;
        true
    }

    fn sign_out(&self) {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        if let Err(e) = self.store.remove(keys::TOKEN) {
            warn!(error = %e, key = keys::TOKEN, "Failed to remove persisted token");
        }
        state.session = None;
        state.pending_bootstrap = false;
    }

    fn reject(&self, notification: Notification, error: SessionError) -> SessionError {
        self.notifier.publish(notification);
        error
    }
}

fn read_token(store: &SharedStore) -> Option<SecretString> {
    match store.get(keys::TOKEN) {
        Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
        Err(e) => {
            warn!(error = %e, key = keys::TOKEN, "Failed to read persisted token");
            None
        }
    }
}

fn write_token(store: &SharedStore, token: &SecretString) {
    if let Err(e) = store.set(keys::TOKEN, token.expose_secret()) {
        warn!(error = %e, key = keys::TOKEN, "Failed to persist token");
    }
}
