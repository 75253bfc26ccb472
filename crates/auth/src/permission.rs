//! Permission identity: resource types, actions and codename derivation.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use storekeep_core::PermissionId;

/// The business entity a permission governs (e.g. `Employee`, `Product`).
///
/// Modeled as an open newtype so ad-hoc resource types remain possible, with
/// constants for the entities this system ships with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(Cow<'static, str>);

impl ResourceType {
    pub const CATEGORY: ResourceType = ResourceType(Cow::Borrowed("Category"));
    pub const PRODUCT: ResourceType = ResourceType(Cow::Borrowed("Product"));
    pub const STORE_PRODUCT: ResourceType = ResourceType(Cow::Borrowed("StoreProduct"));
    pub const CUSTOMER_CARD: ResourceType = ResourceType(Cow::Borrowed("CustomerCard"));
    pub const CHECK: ResourceType = ResourceType(Cow::Borrowed("Check"));
    pub const EMPLOYEE: ResourceType = ResourceType(Cow::Borrowed("Employee"));

    /// Every resource type governed by the shipped role tables.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::CATEGORY,
        ResourceType::PRODUCT,
        ResourceType::STORE_PRODUCT,
        ResourceType::CUSTOMER_CARD,
        ResourceType::CHECK,
        ResourceType::EMPLOYEE,
    ];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical codename for an action on this resource type.
    ///
    /// The resource type is lower-cased uniformly: `employee.can_view` for
    /// basic actions, `employee.view_self` for ad-hoc names.
    pub fn codename(&self, action: &Action) -> String {
        let prefix = self.0.to_lowercase();
        match action {
            Action::Basic(basic) => format!("{prefix}.can_{}", basic.as_str()),
            Action::Named(name) => format!("{prefix}.{name}"),
        }
    }
}

impl core::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the four basic actions every resource type gets a permission for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicAction {
    View,
    Create,
    Update,
    Delete,
}

impl BasicAction {
    pub const ALL: [BasicAction; 4] = [
        BasicAction::View,
        BasicAction::Create,
        BasicAction::Update,
        BasicAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BasicAction::View => "view",
            BasicAction::Create => "create",
            BasicAction::Update => "update",
            BasicAction::Delete => "delete",
        }
    }
}

/// A required capability: either a basic action or an ad-hoc named one.
///
/// Ad-hoc names are caller-supplied (e.g. `view_self`, `print_to_pdf`);
/// callers keep them distinct per resource type by convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Basic(BasicAction),
    Named(Cow<'static, str>),
}

impl Action {
    pub const fn named(name: &'static str) -> Self {
        Action::Named(Cow::Borrowed(name))
    }
}

impl From<BasicAction> for Action {
    fn from(value: BasicAction) -> Self {
        Action::Basic(value)
    }
}

/// A durable permission record: immutable (resource type, codename) tuple
/// plus its storage-assigned id.
///
/// At most one record exists per (resource type, codename) pair; the catalog
/// treats duplicate creation as "return existing".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub resource_type: String,
    pub codename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_basic_codenames() {
        let employee = ResourceType::EMPLOYEE;
        assert_eq!(
            employee.codename(&Action::Basic(BasicAction::View)),
            "employee.can_view"
        );
        assert_eq!(
            ResourceType::STORE_PRODUCT.codename(&Action::Basic(BasicAction::Delete)),
            "storeproduct.can_delete"
        );
    }

    #[test]
    fn derives_ad_hoc_codenames() {
        let employee = ResourceType::EMPLOYEE;
        assert_eq!(employee.codename(&Action::named("view_self")), "employee.view_self");
        assert_eq!(
            ResourceType::CHECK.codename(&Action::named("print_to_pdf")),
            "check.print_to_pdf"
        );
    }
}
