use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ProductId);
id_newtype!(WarehouseId);
id_newtype!(SupplierId);
id_newtype!(InventoryId);
id_newtype!(HistoryId);
id_newtype!(AlertId);

/// Account role as understood by the route guard.
///
/// Parsing is case-insensitive and every value is stored in its canonical
/// upper-case form, so equality between two `Role`s is the one role check
/// used across the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Manager,
    Employee,
    /// A role string the client does not know about, upper-cased.
    Other(String),
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Employee];

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else if trimmed.eq_ignore_ascii_case("manager") {
            Self::Manager
        } else if trimmed.eq_ignore_ascii_case("employee") {
            Self::Employee
        } else {
            Self::Other(trimmed.to_ascii_uppercase())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Employee => "EMPLOYEE",
            Self::Other(raw) => raw,
        }
    }

    /// Lower-case form used in route paths (`/admin`, `/manager`, ...).
    pub fn slug(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    pub fn matches(&self, raw: &str) -> bool {
        *self == Self::parse(raw)
    }
}

/// Compares two raw role strings the way the guard does.
pub fn roles_match(left: &str, right: &str) -> bool {
    Role::parse(left) == Role::parse(right)
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockAdjustmentType {
    Add,
    Remove,
    #[default]
    #[serde(other)]
    Unknown,
}

impl StockAdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockDirection {
    In,
    Out,
}

impl StockDirection {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::In => "stock-in",
            Self::Out => "stock-out",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::In => "Stock-In recorded successfully!",
            Self::Out => "Stock-Out recorded successfully!",
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
