//! Session credential plumbing.
//!
//! The sync layer consumes a capability-scoped credential as an opaque
//! validity signal: present means fetching may proceed, absent suspends it.
//! Acquiring the credential (sign-in flows, token refresh) happens elsewhere
//! in the host app; the [`SessionHandle`] is only the attachment point used
//! to relay the current credential to controllers.

use tokio::sync::watch;

/// Opaque session token.
///
/// The sync layer never inspects the contents; only presence and identity
/// matter to it. The transport presents the raw token to the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  /// Raw token, for the transport layer.
  pub fn token(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Debug for Credential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    // Never print the token.
    f.write_str("Credential(..)")
  }
}

/// Current-credential holder, observed reactively by controllers.
#[derive(Debug)]
pub struct SessionHandle {
  tx: watch::Sender<Option<Credential>>,
}

impl SessionHandle {
  /// Create a signed-out session.
  pub fn new() -> Self {
    let (tx, _) = watch::channel(None);
    Self { tx }
  }

  /// Publish a new credential; watchers react to the identity change.
  pub fn sign_in(&self, credential: Credential) {
    self.tx.send_replace(Some(credential));
  }

  /// Drop the credential; all scheduled fetching becomes a no-op.
  pub fn sign_out(&self) {
    self.tx.send_replace(None);
  }

  /// The current credential, if signed in.
  pub fn credential(&self) -> Option<Credential> {
    self.tx.borrow().clone()
  }

  /// Subscribe to credential changes.
  pub fn watch(&self) -> watch::Receiver<Option<Credential>> {
    self.tx.subscribe()
  }
}

impl Default for SessionHandle {
  fn default() -> Self {
    Self::new()
  }
}
