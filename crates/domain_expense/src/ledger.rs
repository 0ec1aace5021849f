//! Claim audit ledger
//!
//! Every action taken on a claim is appended to its ledger. Entries are never
//! edited or removed, and append order (not wall-clock time) is the order
//! used for decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::UserId;

/// Display name used on entries written by the engine itself
pub const SYSTEM_AUTHOR: &str = "System";

/// Action recorded by an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Submitted,
    Approved,
    Rejected,
}

/// A single, immutable entry in a claim's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Who acted (for system entries, the approver whose action triggered it)
    pub approver_id: UserId,
    /// Display name at the time of the action
    pub approver_name: String,
    pub action: AuditAction,
    pub comment: String,
    pub recorded_at: DateTime<Utc>,
    /// Written by the engine rather than a person
    #[serde(default)]
    pub system: bool,
}

impl AuditEntry {
    fn new(
        approver_id: UserId,
        approver_name: impl Into<String>,
        action: AuditAction,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            approver_id,
            approver_name: approver_name.into(),
            action,
            comment: comment.into(),
            recorded_at: Utc::now(),
            system: false,
        }
    }

    /// Entry written when the claimant submits the claim
    pub fn submitted(claimant_id: UserId, claimant_name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(claimant_id, claimant_name, AuditAction::Submitted, comment)
    }

    /// Entry for an approver's approval
    pub fn approved(approver_id: UserId, approver_name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(approver_id, approver_name, AuditAction::Approved, comment)
    }

    /// Entry for an approver's rejection
    pub fn rejected(approver_id: UserId, approver_name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(approver_id, approver_name, AuditAction::Rejected, comment)
    }

    /// Synthetic entry recording why the engine finalized the claim
    pub fn system_approval(triggered_by: UserId, reason: impl Into<String>) -> Self {
        Self {
            system: true,
            ..Self::new(triggered_by, SYSTEM_AUTHOR, AuditAction::Approved, reason)
        }
    }

    /// Returns true for an approval given by a person
    pub fn is_personal_approval(&self) -> bool {
        self.action == AuditAction::Approved && !self.system
    }
}

/// Append-only sequence of audit entries bound to one claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLedger {
    entries: Vec<AuditEntry>,
}

impl AuditLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the end of the ledger
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    /// All entries in append order
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently appended entry
    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    /// All entries written by a given approver, in append order
    pub fn by_approver(&self, approver_id: UserId) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(move |e| e.approver_id == approver_id && !e.system)
    }

    /// Approvals given by people, excluding engine-written entries
    pub fn approvals(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| e.is_personal_approval())
    }

    /// Number of personal approvals recorded so far
    pub fn approval_count(&self) -> usize {
        self.approvals().count()
    }
}

impl<'a> IntoIterator for &'a AuditLedger {
    type Item = &'a AuditEntry;
    type IntoIter = std::slice::Iter<'a, AuditEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let claimant = UserId::new();
        let manager = UserId::new();
        let mut ledger = AuditLedger::new();
        ledger.append(AuditEntry::submitted(claimant, "Ana", "Expense submitted for approval"));
        ledger.append(AuditEntry::approved(manager, "Raj", "ok"));

        let actions: Vec<_> = ledger.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Submitted, AuditAction::Approved]);
        assert_eq!(ledger.latest().unwrap().approver_id, manager);
    }

    #[test]
    fn test_system_entries_are_not_counted_as_approvals() {
        let manager = UserId::new();
        let mut ledger = AuditLedger::new();
        ledger.append(AuditEntry::approved(manager, "Raj", "Approved"));
        ledger.append(AuditEntry::system_approval(manager, "Auto-approved: CFO approved"));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.approval_count(), 1);
        assert_eq!(ledger.by_approver(manager).count(), 1);
        assert_eq!(ledger.latest().unwrap().approver_name, SYSTEM_AUTHOR);
    }

    #[test]
    fn test_ledger_serializes_as_plain_list() {
        let mut ledger = AuditLedger::new();
        ledger.append(AuditEntry::rejected(UserId::new(), "Raj", "Rejected"));
        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_array());
        let back: AuditLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }
}
