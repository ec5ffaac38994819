/// Role hierarchy and tier arithmetic
///
/// Roles are tiers on a totally ordered integer scale: a higher level means
/// more privilege. Membership is additive, so a user holding a role at level
/// `L` belongs to every tier whose level is `<= L`.
///
/// Ranges here are expressed on *levels*, never on list positions. Changing
/// a user's role is a [`TierDiff`] between two levels:
///
/// ```text
/// levels:   1 read_only   2 user_no_api   3 user   4 analyst   5 admin
///
/// user(3) -> admin(5):  add    {analyst, admin}         (3 < level <= 5)
/// admin(5) -> user(3):  remove {analyst, admin}         (3 < level <= 5)
/// (none)  -> user(3):   add    {read_only, user_no_api, user}
/// ```
///
/// # Example
///
/// ```
/// use rolestore_shared::rbac::roles::{RoleHierarchy, TierDiff};
///
/// let hierarchy = RoleHierarchy::from_pairs([("analyst", 1), ("admin", 2)]).unwrap();
/// assert_eq!(hierarchy.at_or_below("admin").unwrap(), vec!["analyst", "admin"]);
///
/// let diff = TierDiff::between(&hierarchy, Some(2), 1);
/// assert!(diff.add.is_empty());
/// assert_eq!(diff.remove, vec!["admin".to_string()]);
/// ```

use serde::{Deserialize, Serialize};

use super::RbacError;
use crate::store::resolve_range;

/// Highest default tier
pub const ROLE_ADMIN: &str = "admin";

/// Tier required for analyst-only views
pub const ROLE_ANALYST: &str = "analyst";

/// A named tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name, as used in `user_role:<name>`
    pub name: String,

    /// Position on the privilege scale (higher is more privileged)
    pub level: i64,
}

impl Role {
    pub fn new(name: impl Into<String>, level: i64) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

/// Ordered set of roles, ascending by level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHierarchy {
    roles: Vec<Role>,
}

impl RoleHierarchy {
    /// Builds a hierarchy, rejecting two roles on the same level
    ///
    /// A name given twice keeps its last level.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, RbacError> {
        let mut hierarchy = Self::default();
        for role in roles {
            hierarchy.insert(role)?;
        }
        Ok(hierarchy)
    }

    /// Convenience constructor from `(name, level)` pairs
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Result<Self, RbacError> {
        Self::new(pairs.into_iter().map(|(name, level)| Role::new(name, level)))
    }

    /// Builds a hierarchy from sorted-set members and scores
    ///
    /// Scores are truncated to integers. Input is trusted to come from a
    /// sorted set, so it is only re-sorted, not validated.
    pub fn from_scored(members: Vec<(String, f64)>) -> Self {
        let mut roles: Vec<Role> = members
            .into_iter()
            .map(|(name, score)| Role::new(name, score as i64))
            .collect();
        roles.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
        Self { roles }
    }

    /// Default tiers seeded on first run
    ///
    /// `read_only(1) < user_no_api(2) < user(3) < analyst(4) < admin(5)`
    pub fn default_tiers() -> Self {
        Self {
            roles: vec![
                Role::new("read_only", 1),
                Role::new("user_no_api", 2),
                Role::new("user", 3),
                Role::new(ROLE_ANALYST, 4),
                Role::new(ROLE_ADMIN, 5),
            ],
        }
    }

    /// Adds a role or moves an existing one to a new level
    pub fn insert(&mut self, role: Role) -> Result<(), RbacError> {
        if let Some(existing) = self
            .roles
            .iter()
            .find(|r| r.level == role.level && r.name != role.name)
        {
            return Err(RbacError::DuplicateLevel {
                level: role.level,
                existing: existing.name.clone(),
            });
        }

        self.roles.retain(|r| r.name != role.name);
        let at = self.roles.partition_point(|r| r.level < role.level);
        self.roles.insert(at, role);
        Ok(())
    }

    /// Roles, ascending by level
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Role names, ascending by level
    pub fn names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    /// Level of a role, if known
    pub fn level(&self, name: &str) -> Option<i64> {
        self.roles.iter().find(|r| r.name == name).map(|r| r.level)
    }

    /// Most privileged role
    pub fn highest(&self) -> Option<&Role> {
        self.roles.last()
    }

    /// Least privileged role
    pub fn lowest(&self) -> Option<&Role> {
        self.roles.first()
    }

    /// Names from `name`'s level up to the top, ascending
    pub fn at_or_above(&self, name: &str) -> Option<Vec<&str>> {
        let level = self.level(name)?;
        Some(self.names_where(|l| l >= level))
    }

    /// Names from the bottom up to `name`'s level, ascending
    ///
    /// This is the membership set of a user holding `name`.
    pub fn at_or_below(&self, name: &str) -> Option<Vec<&str>> {
        let level = self.level(name)?;
        Some(self.names_where(|l| l <= level))
    }

    /// Inclusive positional slice, with Redis `ZRANGE` index rules
    pub fn range(&self, low: isize, high: isize) -> Vec<&str> {
        match resolve_range(self.roles.len(), low, high) {
            Some((lo, hi)) => self.roles[lo..=hi].iter().map(|r| r.name.as_str()).collect(),
            None => Vec::new(),
        }
    }

    fn names_where(&self, keep: impl Fn(i64) -> bool) -> Vec<&str> {
        self.roles
            .iter()
            .filter(|r| keep(r.level))
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Membership changes needed to move a user between two levels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierDiff {
    /// Tiers to add the user to
    pub add: Vec<String>,

    /// Tiers to remove the user from
    pub remove: Vec<String>,
}

impl TierDiff {
    /// Computes the diff from `current` (None if the user holds no role) to `requested`
    ///
    /// - promotion adds tiers with `current < level <= requested`
    /// - demotion removes tiers with `requested < level <= current`
    /// - no current role adds every tier with `level <= requested`
    pub fn between(hierarchy: &RoleHierarchy, current: Option<i64>, requested: i64) -> Self {
        let collect = |keep: &dyn Fn(i64) -> bool| -> Vec<String> {
            hierarchy
                .names_where(keep)
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        match current {
            None => Self {
                add: collect(&|l: i64| l <= requested),
                remove: Vec::new(),
            },
            Some(current) if requested > current => Self {
                add: collect(&|l: i64| current < l && l <= requested),
                remove: Vec::new(),
            },
            Some(current) => Self {
                add: Vec::new(),
                remove: collect(&|l: i64| requested < l && l <= current),
            },
        }
    }

    /// Rebuilds membership from scratch: add every tier up to `requested`, remove the rest
    ///
    /// Used when the current level cannot be trusted, e.g. the stored role
    /// label no longer exists in the hierarchy.
    pub fn reset(hierarchy: &RoleHierarchy, requested: i64) -> Self {
        let (add, remove): (Vec<&Role>, Vec<&Role>) =
            hierarchy.roles().iter().partition(|r| r.level <= requested);
        Self {
            add: add.into_iter().map(|r| r.name.clone()).collect(),
            remove: remove.into_iter().map(|r| r.name.clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}
