// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;

use crate::error::{FinanceError, FinanceResult};
use crate::models::UserId;

/// Whoever authenticated the user. The core only asks who is signed in.
pub trait IdentityGateway {
    fn current_user_id(&self) -> Option<UserId>;
}

/// In-process session holding the signed-in user, if any.
#[derive(Debug, Default)]
pub struct Session {
    user: Cell<Option<UserId>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: UserId) -> Self {
        Session {
            user: Cell::new(Some(user_id)),
        }
    }

    pub fn sign_in(&self, user_id: UserId) {
        tracing::debug!(%user_id, "session started");
        self.user.set(Some(user_id));
    }

    pub fn sign_out(&self) {
        if let Some(user_id) = self.user.take() {
            tracing::debug!(%user_id, "session ended");
        }
    }
}

impl IdentityGateway for Session {
    fn current_user_id(&self) -> Option<UserId> {
        self.user.get()
    }
}

pub fn require_user(identity: &dyn IdentityGateway) -> FinanceResult<UserId> {
    identity
        .current_user_id()
        .ok_or(FinanceError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn sign_out_clears_the_user() {
        let id = Uuid::new_v4();
        let session = Session::signed_in(id);
        assert_eq!(require_user(&session).unwrap(), id);
        session.sign_out();
        assert!(matches!(
            require_user(&session),
            Err(FinanceError::Unauthenticated)
        ));
    }
}
