//! Database privilege membership as a set of (owner, member) grants.

use std::collections::BTreeSet;

use cpanel_api::{Gateway, ResourceKind};

use crate::error::{GatewayResultExt, ReconcileError};
use crate::identity::Identity;

/// One privilege relation: `member` holds all privileges on `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grant {
    pub owner: String,
    pub member: String,
}

impl Grant {
    pub fn new(owner: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            member: member.into(),
        }
    }
}

/// A member listed more than once for the same owner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate member `{member}` for `{owner}`")]
pub struct DuplicateMember {
    pub owner: String,
    pub member: String,
}

/// A set of grants. Ordered so that remote calls run in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet(BTreeSet<Grant>);

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a desired set, rejecting members listed twice.
    ///
    /// Member names are compared exactly, without case folding or trimming.
    pub fn from_members<I, S>(owner: &str, members: I) -> Result<Self, DuplicateMember>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for member in members {
            let grant = Grant::new(owner, member);
            if set.contains(&grant) {
                return Err(DuplicateMember {
                    owner: grant.owner,
                    member: grant.member,
                });
            }
            set.insert(grant);
        }
        Ok(Self(set))
    }

    /// Builds a set from remote members. Repeats collapse silently.
    pub fn observed<I, S>(owner: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(members.into_iter().map(|m| Grant::new(owner, m)).collect())
    }

    pub fn insert(&mut self, grant: Grant) -> bool {
        self.0.insert(grant)
    }

    pub fn contains(&self, grant: &Grant) -> bool {
        self.0.contains(grant)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.0.iter()
    }

    /// Member names in set order.
    pub fn members(&self) -> Vec<String> {
        self.0.iter().map(|g| g.member.clone()).collect()
    }

    /// Applies a diff: `(self ∪ to_grant) \ to_revoke`.
    #[must_use]
    pub fn apply(&self, diff: &MembershipDiff) -> Self {
        let mut next = self.0.clone();
        next.extend(diff.to_grant.0.iter().cloned());
        for grant in diff.to_revoke.iter() {
            next.remove(grant);
        }
        Self(next)
    }
}

impl FromIterator<Grant> for MembershipSet {
    fn from_iter<T: IntoIterator<Item = Grant>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Grants to add and grants to remove to move from one set to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_grant: MembershipSet,
    pub to_revoke: MembershipSet,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.to_grant.is_empty() && self.to_revoke.is_empty()
    }
}

/// Computes `desired \ observed` and `observed \ desired`.
pub fn diff(desired: &MembershipSet, observed: &MembershipSet) -> MembershipDiff {
    MembershipDiff {
        to_grant: desired.0.difference(&observed.0).cloned().collect(),
        to_revoke: observed.0.difference(&desired.0).cloned().collect(),
    }
}

/// Moves the remote membership of `owner` from `observed` to `desired`.
///
/// Every desired member must already exist as a user; otherwise nothing is
/// changed. Grants run before revokes and the first failure aborts the rest.
pub async fn reconcile_membership(
    gateway: &dyn Gateway,
    owner: &str,
    desired: &MembershipSet,
    observed: &MembershipSet,
) -> Result<MembershipDiff, ReconcileError> {
    let kind = ResourceKind::Database;
    let identity = Identity::natural(owner);

    let delta = diff(desired, observed);
    if delta.is_empty() {
        return Ok(delta);
    }

    if !desired.is_empty() {
        let users = gateway
            .list_all(ResourceKind::User)
            .await
            .for_resource(kind, &identity)?;
        let existing: BTreeSet<&str> = users.iter().map(|u| u.field("name")).collect();
        let missing: Vec<&str> = desired
            .iter()
            .map(|g| g.member.as_str())
            .filter(|m| !existing.contains(m))
            .collect();
        if !missing.is_empty() {
            return Err(ReconcileError::validation(
                kind,
                &identity,
                format!(
                    "user does not exist: {}. Create a postgresql_user resource first",
                    missing.join(", ")
                ),
            ));
        }
    }

    for grant in delta.to_grant.iter() {
        gateway
            .grant(&grant.owner, &grant.member)
            .await
            .for_resource(kind, &identity)?;
        tracing::info!(database = %grant.owner, user = %grant.member, "Granted privileges");
    }
    for grant in delta.to_revoke.iter() {
        gateway
            .revoke(&grant.owner, &grant.member)
            .await
            .for_resource(kind, &identity)?;
        tracing::info!(database = %grant.owner, user = %grant.member, "Revoked privileges");
    }

    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(members: &[&str]) -> MembershipSet {
        MembershipSet::observed("db", members.iter().copied())
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let err = MembershipSet::from_members("db", ["alice", "bob", "alice"]).unwrap_err();
        assert_eq!(err.member, "alice");
        assert_eq!(err.to_string(), "duplicate member `alice` for `db`");
    }

    #[test]
    fn members_compare_exactly() {
        let members = MembershipSet::from_members("db", ["alice", "Alice"]).unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn diff_splits_grants_and_revokes() {
        let delta = diff(&set(&["alice", "carol"]), &set(&["alice", "bob"]));
        assert_eq!(delta.to_grant.members(), ["carol"]);
        assert_eq!(delta.to_revoke.members(), ["bob"]);
        assert!(!delta.is_empty());
    }

    #[test]
    fn equal_sets_have_empty_diff() {
        assert!(diff(&set(&["alice"]), &set(&["alice"])).is_empty());
    }

    #[test]
    fn diff_against_empty_set_is_all_grants_or_all_revokes() {
        let members = set(&["alice", "bob"]);

        let delta = diff(&members, &MembershipSet::new());
        assert_eq!(delta.to_grant, members);
        assert!(delta.to_revoke.is_empty());

        let delta = diff(&MembershipSet::new(), &members);
        assert!(delta.to_grant.is_empty());
        assert_eq!(delta.to_revoke, members);
    }

    fn members() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-e]{1,2}", 0..8)
    }

    proptest! {
        #[test]
        fn applying_diff_reaches_desired(desired in members(), observed in members()) {
            let desired = MembershipSet::observed("db", desired);
            let observed = MembershipSet::observed("db", observed);
            let delta = diff(&desired, &observed);

            prop_assert_eq!(observed.apply(&delta), desired.clone());
            for grant in delta.to_grant.iter() {
                prop_assert!(!delta.to_revoke.contains(grant));
            }
            prop_assert!(diff(&desired, &desired).is_empty());
        }
    }
}
