//! In-process fakes for exercising onboarding flows without a live provider.
//!
//! [`FakeGateway`] is a scriptable [`IdentityGateway`]: failures can be
//! injected per operation, and reload/send calls can be held open to test
//! interleavings against the controller's single-flight guards.
//! [`MemoryProfileStore`] is a [`ProfileStore`] over a hash map with a write
//! counter for idempotence assertions.
//!
//! Both are public so downstream users can drive their own integration
//! tests through them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use thiserror::Error;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::{
    error::ProviderError,
    gateway::{Identity, IdentityGateway, IdentityListener, IdentitySubscription},
    profile::{ProfileRecord, ProfileStore},
};

/// Scriptable in-memory identity provider.
#[derive(Clone, Default)]
pub struct FakeGateway {
    inner: Arc<GatewayInner>,
}

#[derive(Default)]
struct GatewayInner {
    /// Registered accounts keyed by normalized email.
    accounts: Mutex<HashMap<String, Account>>,
    /// Identity currently signed in, if any.
    current: Mutex<Option<Identity>>,
    /// Provider-side confirmation flag reported by `reload`.
    confirmed: AtomicBool,
    listeners: Mutex<HashMap<u64, IdentityListener>>,
    next_listener_id: AtomicU64,
    reload_calls: AtomicU32,
    send_calls: AtomicU32,
    sign_out_calls: AtomicU32,
    fail_next_register: Mutex<Option<String>>,
    fail_next_authenticate: Mutex<Option<String>>,
    fail_next_send: Mutex<Option<String>>,
    fail_next_reload: Mutex<Option<String>>,
    fail_next_sign_out: Mutex<Option<String>>,
    reload_gate: Mutex<Option<Arc<Semaphore>>>,
    send_gate: Mutex<Option<Arc<Semaphore>>>,
}

struct Account {
    identity: Identity,
    password: Option<String>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an already signed-in identity without going through `register`.
    pub fn seed_identity(&self, identity: Identity) {
        self.inner.accounts.lock().unwrap().insert(
            identity.email.clone(),
            Account {
                identity: identity.clone(),
                password: None,
            },
        );
        *self.inner.current.lock().unwrap() = Some(identity);
    }

    /// Flip the provider-side confirmation flag observed by `reload`.
    pub fn set_confirmed(&self, confirmed: bool) {
        self.inner.confirmed.store(confirmed, Ordering::SeqCst);
    }

    /// Identity the fake currently considers signed in.
    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.current.lock().unwrap().clone()
    }

    pub fn reload_calls(&self) -> u32 {
        self.inner.reload_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> u32 {
        self.inner.send_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> u32 {
        self.inner.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Fail the next `register` call with the given provider code.
    pub fn fail_next_register(&self, code: &str) {
        *self.inner.fail_next_register.lock().unwrap() = Some(code.to_string());
    }

    /// Fail the next `authenticate` call with the given provider code.
    pub fn fail_next_authenticate(&self, code: &str) {
        *self.inner.fail_next_authenticate.lock().unwrap() = Some(code.to_string());
    }

    /// Fail the next `request_verification_email` call.
    pub fn fail_next_send(&self, code: &str) {
        *self.inner.fail_next_send.lock().unwrap() = Some(code.to_string());
    }

    /// Fail the next `reload` call.
    pub fn fail_next_reload(&self, code: &str) {
        *self.inner.fail_next_reload.lock().unwrap() = Some(code.to_string());
    }

    /// Fail the next `sign_out` call (the local cache still clears).
    pub fn fail_next_sign_out(&self, code: &str) {
        *self.inner.fail_next_sign_out.lock().unwrap() = Some(code.to_string());
    }

    /// Block `reload` calls until [`FakeGateway::release_reloads`].
    pub fn hold_reloads(&self) {
        *self.inner.reload_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_reloads(&self) {
        if let Some(gate) = self.inner.reload_gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Block `request_verification_email` calls until
    /// [`FakeGateway::release_sends`].
    pub fn hold_sends(&self) {
        *self.inner.send_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_sends(&self) {
        if let Some(gate) = self.inner.send_gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    fn notify(&self, identity: Option<&Identity>) {
        let listeners = self.inner.listeners.lock().unwrap();
        for listener in listeners.values() {
            listener(identity);
        }
    }

    fn take_failure(slot: &Mutex<Option<String>>) -> Option<ProviderError> {
        slot.lock()
            .unwrap()
            .take()
            .map(|code| ProviderError::new(code, "simulated provider failure"))
    }

    async fn gate(slot: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = slot.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
    }
}

impl IdentityGateway for FakeGateway {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, ProviderError> {
        if let Some(err) = Self::take_failure(&self.inner.fail_next_register) {
            return Err(err);
        }

        let mut accounts = self.inner.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(ProviderError::new(
                "auth/email-already-in-use",
                "email already registered",
            ));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            email_confirmed: false,
            display_name: display_name.map(str::to_owned),
        };
        accounts.insert(
            email.to_string(),
            Account {
                identity: identity.clone(),
                password: Some(password.to_string()),
            },
        );
        drop(accounts);

        // Registration sends the first verification email provider-side.
        self.inner.send_calls.fetch_add(1, Ordering::SeqCst);
        *self.inner.current.lock().unwrap() = Some(identity.clone());
        self.notify(Some(&identity));
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        if let Some(err) = Self::take_failure(&self.inner.fail_next_authenticate) {
            return Err(err);
        }

        let accounts = self.inner.accounts.lock().unwrap();
        let Some(account) = accounts.get(email) else {
            return Err(ProviderError::new("auth/user-not-found", "no such account"));
        };
        if account
            .password
            .as_deref()
            .is_some_and(|stored| stored != password)
        {
            return Err(ProviderError::new(
                "auth/wrong-password",
                "credential mismatch",
            ));
        }

        let identity = Identity {
            email_confirmed: self.inner.confirmed.load(Ordering::SeqCst),
            ..account.identity.clone()
        };
        drop(accounts);

        *self.inner.current.lock().unwrap() = Some(identity.clone());
        self.notify(Some(&identity));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.inner.sign_out_calls.fetch_add(1, Ordering::SeqCst);

        // Local cache clears regardless of the remote outcome.
        *self.inner.current.lock().unwrap() = None;
        self.notify(None);

        match Self::take_failure(&self.inner.fail_next_sign_out) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn request_verification_email(&self, _identity: &Identity) -> Result<(), ProviderError> {
        Self::gate(&self.inner.send_gate).await;

        if let Some(err) = Self::take_failure(&self.inner.fail_next_send) {
            return Err(err);
        }
        if self.inner.current.lock().unwrap().is_none() {
            return Err(ProviderError::new(
                "auth/no-current-user",
                "nobody signed in",
            ));
        }

        self.inner.send_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self, identity: &Identity) -> Result<Identity, ProviderError> {
        self.inner.reload_calls.fetch_add(1, Ordering::SeqCst);
        Self::gate(&self.inner.reload_gate).await;

        if let Some(err) = Self::take_failure(&self.inner.fail_next_reload) {
            return Err(err);
        }

        Ok(Identity {
            email_confirmed: self.inner.confirmed.load(Ordering::SeqCst),
            ..identity.clone()
        })
    }

    fn subscribe(&self, listener: IdentityListener) -> IdentitySubscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.lock().unwrap().insert(id, listener);

        let weak: Weak<GatewayInner> = Arc::downgrade(&self.inner);
        IdentitySubscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().unwrap().remove(&id);
            }
        })
    }
}

/// Error type for [`MemoryProfileStore`].
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("profile store unavailable")]
    Unavailable,
}

/// [`ProfileStore`] backed by a hash map, with a write counter for
/// idempotence assertions.
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    records: RwLock<HashMap<Uuid, ProfileRecord>>,
    writes: AtomicU32,
    fail_next_put: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes accepted so far.
    pub fn write_count(&self) -> u32 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make the next `put` fail.
    pub fn fail_next_put(&self) {
        self.inner.fail_next_put.store(true, Ordering::SeqCst);
    }
}

impl ProfileStore for MemoryProfileStore {
    type Error = MemoryStoreError;

    async fn get(&self, id: Uuid) -> Result<Option<ProfileRecord>, Self::Error> {
        Ok(self.inner.records.read().unwrap().get(&id).cloned())
    }

    async fn put(&self, id: Uuid, record: &ProfileRecord, merge: bool) -> Result<(), Self::Error> {
        if self.inner.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(MemoryStoreError::Unavailable);
        }

        let mut records = self.inner.records.write().unwrap();
        let stored = match records.get(&id) {
            Some(existing) if merge => {
                // Incoming wins field-by-field; free-form fields are unioned.
                let mut merged = record.clone();
                for (key, value) in &existing.fields {
                    merged
                        .fields
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                merged
            }
            _ => record.clone(),
        };
        records.insert(id, stored);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
