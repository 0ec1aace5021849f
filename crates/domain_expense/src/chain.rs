//! Approver chain lookup

use core_kernel::UserId;
use crate::policy::{ApprovalPolicy, PolicyApprover};

/// Where a level falls in a company's approver chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    /// An approver is configured at the level
    Assigned(UserId),
    /// The level is inside the chain but nobody is configured at it
    Vacant,
    /// The level is past the deepest configured level (or there is no policy)
    Exhausted,
}

/// Pure lookup of approvers by level
pub struct ApprovalChainResolver;

impl ApprovalChainResolver {
    /// Returns the approver entry at `level`
    ///
    /// When several entries share a level, the one defined first in the
    /// policy wins.
    pub fn approver_at(policy: &ApprovalPolicy, level: u32) -> Option<&PolicyApprover> {
        policy.approvers().iter().find(|a| a.level == level)
    }

    /// Returns the identity of the approver at `level`, if any
    pub fn resolve(policy: &ApprovalPolicy, level: u32) -> Option<UserId> {
        Self::approver_at(policy, level).map(|a| a.user_id)
    }

    /// Classifies `level` against the chain
    pub fn position(policy: Option<&ApprovalPolicy>, level: u32) -> ChainPosition {
        let Some(policy) = policy else {
            return ChainPosition::Exhausted;
        };
        match Self::resolve(policy, level) {
            Some(user_id) => ChainPosition::Assigned(user_id),
            None if policy.highest_level().is_some_and(|max| level <= max) => ChainPosition::Vacant,
            None => ChainPosition::Exhausted,
        }
    }
}
