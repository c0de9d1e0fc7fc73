//! Organization, membership and role types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A member's role within one organization.
///
/// # Example
///
/// ```rust
/// use ledgergate::organizations::OrgRole;
///
/// let role: OrgRole = "admin".parse().unwrap();
/// assert!(role.has_at_least(&OrgRole::Member));
/// assert!(!role.has_at_least(&OrgRole::Owner));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgRole {
    Owner,
    Admin,
    #[default]
    Member,
}

impl OrgRole {
    pub const ALL: [OrgRole; 3] = [OrgRole::Owner, OrgRole::Admin, OrgRole::Member];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }

    /// Higher means more authority.
    #[must_use]
    pub fn hierarchy_level(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Member => 1,
        }
    }

    #[must_use]
    pub fn has_at_least(&self, other: &Self) -> bool {
        self.hierarchy_level() >= other.hierarchy_level()
    }

    /// Every role at or above `self` in the hierarchy.
    #[must_use]
    pub fn and_above(self) -> RoleSet {
        RoleSet::at_least(self)
    }

    fn bit(self) -> u8 {
        match self {
            Self::Owner => 0b001,
            Self::Admin => 0b010,
            Self::Member => 0b100,
        }
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role: '{}' (expected: OWNER, ADMIN, or MEMBER)",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for OrgRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(Self::Owner),
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of roles a route accepts. Membership in the set is what the
/// role gate checks; hierarchy only helps build sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(roles: &[OrgRole]) -> Self {
        roles.iter().copied().collect()
    }

    pub fn owner_only() -> Self {
        Self::of(&[OrgRole::Owner])
    }

    pub fn owner_or_admin() -> Self {
        Self::of(&[OrgRole::Owner, OrgRole::Admin])
    }

    pub fn any() -> Self {
        Self::of(&OrgRole::ALL)
    }

    pub fn at_least(minimum: OrgRole) -> Self {
        OrgRole::ALL
            .into_iter()
            .filter(|role| role.has_at_least(&minimum))
            .collect()
    }

    #[must_use]
    pub fn with(self, role: OrgRole) -> Self {
        Self(self.0 | role.bit())
    }

    pub fn contains(&self, role: OrgRole) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Roles in the set, highest first.
    pub fn iter(&self) -> impl Iterator<Item = OrgRole> + '_ {
        OrgRole::ALL.into_iter().filter(|role| self.contains(*role))
    }
}

impl FromIterator<OrgRole> for RoleSet {
    fn from_iter<I: IntoIterator<Item = OrgRole>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|role| role.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

/// A tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A user's role in one organization. At most one exists per
/// `(organization_id, user_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub organization_id: Uuid,
    pub user_id: String,
    pub role: OrgRole,
}

impl Membership {
    pub fn new(organization_id: Uuid, user_id: impl Into<String>, role: OrgRole) -> Self {
        Self {
            organization_id,
            user_id: user_id.into(),
            role,
        }
    }
}
