//! Ownership and role checks.

use std::collections::HashSet;

use tracing::info;
use vecurve_core::{Address, ZERO_ADDRESS};

use crate::context::ExecutionContext;
use crate::error::{StateError, StateResult};
use crate::events::Event;

/// Role name.
pub type Role = &'static str;

/// May create locks on behalf of other accounts.
pub const LOCK_CREATOR: Role = "LOCK_CREATOR";

/// Two-step ownership plus owner-granted roles.
#[derive(Clone, Debug)]
pub struct AccessControl {
    owner: Address,
    pending_owner: Option<Address>,
    roles: HashSet<(Role, Address)>,
    events: Vec<Event>,
}

impl AccessControl {
    /// Create with `owner` as the initial owner.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            pending_owner: None,
            roles: HashSet::new(),
            events: Vec::new(),
        }
    }

    /// Current owner (zero after renouncing).
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Account that may accept ownership, if a handoff is in progress.
    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    /// Whether `account` is the owner.
    pub fn is_owner(&self, account: &Address) -> bool {
        *account != ZERO_ADDRESS && *account == self.owner
    }

    /// Fail unless the caller is the owner.
    pub fn ensure_owner(&self, ctx: &ExecutionContext) -> StateResult<()> {
        if self.is_owner(&ctx.caller) {
            Ok(())
        } else {
            Err(StateError::NotOwner { caller: ctx.caller })
        }
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles.contains(&(role, *account))
    }

    /// Fail unless the caller holds `role`.
    pub fn ensure_role(&self, ctx: &ExecutionContext, role: Role) -> StateResult<()> {
        if self.has_role(role, &ctx.caller) {
            Ok(())
        } else {
            Err(StateError::MissingRole {
                role,
                caller: ctx.caller,
            })
        }
    }

    /// Start handing ownership to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        ctx: &ExecutionContext,
        new_owner: Address,
    ) -> StateResult<()> {
        self.ensure_owner(ctx)?;
        if new_owner == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        self.pending_owner = Some(new_owner);
        info!(pending = ?&new_owner[..4], "Ownership transfer started");
        self.events.push(Event::OwnershipTransferStarted {
            previous: self.owner,
            new: new_owner,
        });
        Ok(())
    }

    /// Complete a handoff. Only the pending owner may call.
    pub fn accept_ownership(&mut self, ctx: &ExecutionContext) -> StateResult<()> {
        if self.pending_owner != Some(ctx.caller) {
            return Err(StateError::NotPendingOwner { caller: ctx.caller });
        }
        let previous = self.owner;
        self.owner = ctx.caller;
        self.pending_owner = None;
        info!(owner = ?&ctx.caller[..4], "Ownership transferred");
        self.events.push(Event::OwnershipTransferred {
            previous,
            new: ctx.caller,
        });
        Ok(())
    }

    /// Give up ownership. Owner-only operations become unreachable.
    pub fn renounce_ownership(&mut self, ctx: &ExecutionContext) -> StateResult<()> {
        self.ensure_owner(ctx)?;
        let previous = self.owner;
        self.owner = ZERO_ADDRESS;
        self.pending_owner = None;
        info!("Ownership renounced");
        self.events.push(Event::OwnershipTransferred {
            previous,
            new: ZERO_ADDRESS,
        });
        Ok(())
    }

    /// Grant `role` to `account`. Owner only.
    pub fn grant_role(
        &mut self,
        ctx: &ExecutionContext,
        role: Role,
        account: Address,
    ) -> StateResult<()> {
        self.ensure_owner(ctx)?;
        if account == ZERO_ADDRESS {
            return Err(StateError::ZeroAddress);
        }
        self.roles.insert((role, account));
        Ok(())
    }

    /// Revoke `role` from `account`. Owner only.
    pub fn revoke_role(
        &mut self,
        ctx: &ExecutionContext,
        role: Role,
        account: Address,
    ) -> StateResult<()> {
        self.ensure_owner(ctx)?;
        self.roles.remove(&(role, account));
        Ok(())
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = [1u8; 20];
    const NEXT: Address = [2u8; 20];

    fn ctx(caller: Address) -> ExecutionContext {
        ExecutionContext::new(caller, 1_700_000_000, 1)
    }

    #[test]
    fn test_two_step_transfer() {
        let mut access = AccessControl::new(OWNER);
        access.transfer_ownership(&ctx(OWNER), NEXT).unwrap();
        assert_eq!(access.owner(), OWNER);
        assert_eq!(access.pending_owner(), Some(NEXT));

        assert_eq!(
            access.accept_ownership(&ctx([3u8; 20])),
            Err(StateError::NotPendingOwner { caller: [3u8; 20] })
        );
        access.accept_ownership(&ctx(NEXT)).unwrap();
        assert!(access.is_owner(&NEXT));
        assert!(!access.is_owner(&OWNER));
        assert_eq!(access.pending_owner(), None);

        let events = access.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Event::OwnershipTransferred { new, .. } if new == NEXT));
    }

    #[test]
    fn test_only_owner_transfers() {
        let mut access = AccessControl::new(OWNER);
        assert_eq!(
            access.transfer_ownership(&ctx(NEXT), NEXT),
            Err(StateError::NotOwner { caller: NEXT })
        );
        assert_eq!(
            access.transfer_ownership(&ctx(OWNER), ZERO_ADDRESS),
            Err(StateError::ZeroAddress)
        );
    }

    #[test]
    fn test_renounce() {
        let mut access = AccessControl::new(OWNER);
        access.renounce_ownership(&ctx(OWNER)).unwrap();
        assert_eq!(access.owner(), ZERO_ADDRESS);
        assert!(!access.is_owner(&ZERO_ADDRESS));
        assert!(access.ensure_owner(&ctx(ZERO_ADDRESS)).is_err());
    }

    #[test]
    fn test_roles() {
        let mut access = AccessControl::new(OWNER);
        assert!(access.ensure_role(&ctx(NEXT), LOCK_CREATOR).is_err());
        access.grant_role(&ctx(OWNER), LOCK_CREATOR, NEXT).unwrap();
        assert!(access.has_role(LOCK_CREATOR, &NEXT));
        assert!(access.ensure_role(&ctx(NEXT), LOCK_CREATOR).is_ok());
        access.revoke_role(&ctx(OWNER), LOCK_CREATOR, NEXT).unwrap();
        assert!(!access.has_role(LOCK_CREATOR, &NEXT));
        assert!(access.grant_role(&ctx(NEXT), LOCK_CREATOR, NEXT).is_err());
    }
}
