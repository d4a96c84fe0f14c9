//! Round-robin identity rotation

use std::sync::{Mutex, PoisonError};

use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::types::{Identity, TokenPair};

/// An identity after a successful login.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub identity: Identity,
    pub tokens: TokenPair,
    pub session: Session,
}

/// Hands out authenticated identities in strict round-robin order.
///
/// Every call to [`next`](Self::next) advances one shared cursor, wrapping
/// to 0 after the last identity. The cursor sits behind a mutex so
/// concurrent callers each get their own slot.
#[derive(Debug)]
pub struct IdentityRotator {
    members: Vec<AuthenticatedIdentity>,
    cursor: Mutex<usize>,
}

impl IdentityRotator {
    /// # Errors
    /// [`ClientError::NoIdentities`] when `members` is empty.
    pub fn new(members: Vec<AuthenticatedIdentity>) -> Result<Self> {
        if members.is_empty() {
            return Err(ClientError::NoIdentities);
        }
        Ok(Self {
            members,
            cursor: Mutex::new(0),
        })
    }

    /// Advance the cursor and return the identity it now points at.
    ///
    /// The `j`-th call returns member `j mod N`.
    pub fn next(&self) -> &AuthenticatedIdentity {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        *cursor = (*cursor + 1) % self.members.len();
        &self.members[*cursor]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`; kept for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[AuthenticatedIdentity] {
        &self.members
    }
}
