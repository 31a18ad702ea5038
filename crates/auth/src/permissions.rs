use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "sales.write"). The wildcard `"*"`
/// grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const ALL: Permission = Permission::from_static("*");

pub const SALES_READ: Permission = Permission::from_static("sales.read");
pub const SALES_WRITE: Permission = Permission::from_static("sales.write");
pub const STATISTICS_READ: Permission = Permission::from_static("statistics.read");

pub const ARTICLES_READ: Permission = Permission::from_static("articles.read");
pub const ARTICLES_WRITE: Permission = Permission::from_static("articles.write");
pub const STOCK_REASSORT: Permission = Permission::from_static("stock.reassort");
pub const STOCK_REPAIR: Permission = Permission::from_static("stock.repair");

pub const ADHERENTS_READ: Permission = Permission::from_static("adherents.read");
pub const ADHERENTS_WRITE: Permission = Permission::from_static("adherents.write");
pub const ADHERENTS_DELETE: Permission = Permission::from_static("adherents.delete");
pub const ADHERENTS_EXPORT: Permission = Permission::from_static("adherents.export");
