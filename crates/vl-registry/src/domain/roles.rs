//! # Roles and Authorization Gate
//!
//! Static table deciding which role may invoke which operation. The table
//! looks only at `(Role, Operation)`, never at entity state; ownership is
//! checked separately by the service.
//!
//! | Operation | Allowed roles |
//! |-----------|---------------|
//! | `create` | garage |
//! | `register`, `confirm`, `revoke`, `delete`, `deleteUser` | dot |
//! | `readRegistrationProposals`, `getRevocationProposals`, `getCarsToConfirm` | dot |
//! | `insureProposal`, `revocationProposal`, `updateBalance` | user |
//! | `insuranceAccept`, `getInsurer` | insurer |
//! | `transfer`, `sell`, `createSellingOffer`, `acceptOffer` | user, garage |
//! | `readCar`, `getHistory`, `createUser`, `readUser` | any |
//! | `read` | verifier (in-process only) |

use crate::domain::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role declared by a caller.
///
/// `Verifier` is the trusted context used by verification tooling. It cannot
/// be parsed from a role string, so it never reaches the invocation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Garage,
    Dot,
    User,
    Insurer,
    Verifier,
}

impl Role {
    /// Roles that may be named by an external caller.
    pub const INVOCABLE: [Role; 4] = [Role::Garage, Role::Dot, Role::User, Role::Insurer];

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Garage => "garage",
            Role::Dot => "dot",
            Role::User => "user",
            Role::Insurer => "insurer",
            Role::Verifier => "verifier",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Role::Garage => 1 << 0,
            Role::Dot => 1 << 1,
            Role::User => 1 << 2,
            Role::Insurer => 1 << 3,
            Role::Verifier => 1 << 4,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::INVOCABLE
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RegistryError::validation(format!("unknown role '{}'", s)))
    }
}

/// Set of roles, used as the right-hand side of the authorization table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Every role, the in-process verifier included.
    pub const ANY: RoleSet =
        RoleSet::of(&[Role::Garage, Role::Dot, Role::User, Role::Insurer, Role::Verifier]);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }
}

/// Every operation on the invocation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Create,
    Read,
    ReadCar,
    GetHistory,
    Register,
    Confirm,
    Revoke,
    Delete,
    ReadRegistrationProposals,
    GetRevocationProposals,
    GetCarsToConfirm,
    InsureProposal,
    InsuranceAccept,
    GetInsurer,
    RevocationProposal,
    Transfer,
    Sell,
    CreateSellingOffer,
    AcceptOffer,
    CreateUser,
    ReadUser,
    UpdateBalance,
    DeleteUser,
}

/// Accepted argument counts (excluding username and role).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Arity { min: n, max: n }
    }

    pub fn accepts(self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} to {}", self.min, self.max)
        }
    }
}

impl Operation {
    pub const ALL: [Operation; 23] = [
        Operation::Create,
        Operation::Read,
        Operation::ReadCar,
        Operation::GetHistory,
        Operation::Register,
        Operation::Confirm,
        Operation::Revoke,
        Operation::Delete,
        Operation::ReadRegistrationProposals,
        Operation::GetRevocationProposals,
        Operation::GetCarsToConfirm,
        Operation::InsureProposal,
        Operation::InsuranceAccept,
        Operation::GetInsurer,
        Operation::RevocationProposal,
        Operation::Transfer,
        Operation::Sell,
        Operation::CreateSellingOffer,
        Operation::AcceptOffer,
        Operation::CreateUser,
        Operation::ReadUser,
        Operation::UpdateBalance,
        Operation::DeleteUser,
    ];

    /// Function name on the invocation surface.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::ReadCar => "readCar",
            Operation::GetHistory => "getHistory",
            Operation::Register => "register",
            Operation::Confirm => "confirm",
            Operation::Revoke => "revoke",
            Operation::Delete => "delete",
            Operation::ReadRegistrationProposals => "readRegistrationProposals",
            Operation::GetRevocationProposals => "getRevocationProposals",
            Operation::GetCarsToConfirm => "getCarsToConfirm",
            Operation::InsureProposal => "insureProposal",
            Operation::InsuranceAccept => "insuranceAccept",
            Operation::GetInsurer => "getInsurer",
            Operation::RevocationProposal => "revocationProposal",
            Operation::Transfer => "transfer",
            Operation::Sell => "sell",
            Operation::CreateSellingOffer => "createSellingOffer",
            Operation::AcceptOffer => "acceptOffer",
            Operation::CreateUser => "createUser",
            Operation::ReadUser => "readUser",
            Operation::UpdateBalance => "updateBalance",
            Operation::DeleteUser => "deleteUser",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Operation::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Human-readable phrase used in denial messages.
    pub const fn description(self) -> &'static str {
        match self {
            Operation::Create => "create cars",
            Operation::Read => "do unrestricted queries on the ledger",
            Operation::ReadCar => "read cars",
            Operation::GetHistory => "read car history",
            Operation::Register => "register cars",
            Operation::Confirm => "confirm cars",
            Operation::Revoke => "revoke cars",
            Operation::Delete => "delete cars",
            Operation::ReadRegistrationProposals => "read registration proposals",
            Operation::GetRevocationProposals => "query revocation proposals",
            Operation::GetCarsToConfirm => "list cars awaiting confirmation",
            Operation::InsureProposal => "create an insurance proposal",
            Operation::InsuranceAccept => "accept insurance proposals",
            Operation::GetInsurer => "read insurers",
            Operation::RevocationProposal => "create a revocation proposal",
            Operation::Transfer => "transfer cars",
            Operation::Sell => "sell cars",
            Operation::CreateSellingOffer => "create selling offers",
            Operation::AcceptOffer => "accept selling offers",
            Operation::CreateUser => "create users",
            Operation::ReadUser => "read users",
            Operation::UpdateBalance => "update the balance of a user",
            Operation::DeleteUser => "delete users",
        }
    }

    /// Roles permitted to invoke this operation.
    ///
    /// Exhaustive on purpose: a new operation does not compile until it is
    /// given an entry here.
    pub const fn allowed_roles(self) -> RoleSet {
        match self {
            Operation::Create => RoleSet::of(&[Role::Garage]),
            Operation::Read => RoleSet::of(&[Role::Verifier]),
            Operation::Register
            | Operation::Confirm
            | Operation::Revoke
            | Operation::Delete
            | Operation::ReadRegistrationProposals
            | Operation::GetRevocationProposals
            | Operation::GetCarsToConfirm
            | Operation::DeleteUser => RoleSet::of(&[Role::Dot]),
            Operation::InsureProposal
            | Operation::RevocationProposal
            | Operation::UpdateBalance => RoleSet::of(&[Role::User]),
            Operation::InsuranceAccept | Operation::GetInsurer => RoleSet::of(&[Role::Insurer]),
            Operation::Transfer
            | Operation::Sell
            | Operation::CreateSellingOffer
            | Operation::AcceptOffer => RoleSet::of(&[Role::User, Role::Garage]),
            Operation::ReadCar
            | Operation::GetHistory
            | Operation::CreateUser
            | Operation::ReadUser => RoleSet::ANY,
        }
    }

    /// Argument counts accepted after username and role.
    pub const fn arity(self) -> Arity {
        match self {
            Operation::Create => Arity { min: 1, max: 2 },
            Operation::ReadRegistrationProposals
            | Operation::GetRevocationProposals
            | Operation::GetCarsToConfirm
            | Operation::ReadUser => Arity::exactly(0),
            Operation::Read
            | Operation::ReadCar
            | Operation::GetHistory
            | Operation::Register
            | Operation::Revoke
            | Operation::Delete
            | Operation::GetInsurer
            | Operation::RevocationProposal
            | Operation::AcceptOffer
            | Operation::CreateUser
            | Operation::UpdateBalance => Arity::exactly(1),
            Operation::Confirm
            | Operation::InsureProposal
            | Operation::Transfer
            | Operation::DeleteUser => Arity::exactly(2),
            Operation::InsuranceAccept | Operation::Sell | Operation::CreateSellingOffer => {
                Arity::exactly(3)
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Authorization gate: allow or deny `role` for `operation`.
pub fn authorize(role: Role, operation: Operation) -> Result<(), RegistryError> {
    if operation.allowed_roles().contains(role) {
        Ok(())
    } else {
        Err(RegistryError::AuthorizationDenied { role, operation })
    }
}

/// Identity of the party invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn garage(username: impl Into<String>) -> Self {
        Self::new(username, Role::Garage)
    }

    pub fn dot(username: impl Into<String>) -> Self {
        Self::new(username, Role::Dot)
    }

    pub fn user(username: impl Into<String>) -> Self {
        Self::new(username, Role::User)
    }

    pub fn insurer(username: impl Into<String>) -> Self {
        Self::new(username, Role::Insurer)
    }

    /// Trusted in-process context for verification tooling.
    pub fn verifier() -> Self {
        Self::new("verifier", Role::Verifier)
    }
}
