//! Organizations and per-member permissions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::owner::{Owner, OwnerKind, OwnerRef};
use crate::{check_len, OrganizationId, PermissionId, TemplateId, ValidationError};

/// A named group of users that owns petitions and templates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub default_template_id: Option<TemplateId>,
}

impl Organization {
    /// Check a prospective organization name.
    pub fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        check_len("name", name, 200)
    }
}

impl Owner for Organization {
    fn kind(&self) -> OwnerKind {
        OwnerKind::Org
    }

    fn fullname(&self) -> String {
        self.name.clone()
    }

    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::Organization(self.id)
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One gate checked by the authorization layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    AddMembers,
    RemoveMembers,
    CreatePetitions,
    ModifyPetitions,
    DeletePetitions,
    CreateTemplates,
    ModifyTemplates,
    DeleteTemplates,
    ViewSignatures,
    ModifySignatures,
    DeleteSignatures,
    ModifyPermissions,
}

impl Capability {
    pub const ALL: [Self; 12] = [
        Self::AddMembers,
        Self::RemoveMembers,
        Self::CreatePetitions,
        Self::ModifyPetitions,
        Self::DeletePetitions,
        Self::CreateTemplates,
        Self::ModifyTemplates,
        Self::DeleteTemplates,
        Self::ViewSignatures,
        Self::ModifySignatures,
        Self::DeleteSignatures,
        Self::ModifyPermissions,
    ];

    /// Column name in the `permissions` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::AddMembers => "can_add_members",
            Self::RemoveMembers => "can_remove_members",
            Self::CreatePetitions => "can_create_petitions",
            Self::ModifyPetitions => "can_modify_petitions",
            Self::DeletePetitions => "can_delete_petitions",
            Self::CreateTemplates => "can_create_templates",
            Self::ModifyTemplates => "can_modify_templates",
            Self::DeleteTemplates => "can_delete_templates",
            Self::ViewSignatures => "can_view_signatures",
            Self::ModifySignatures => "can_modify_signatures",
            Self::DeleteSignatures => "can_delete_signatures",
            Self::ModifyPermissions => "can_modify_permissions",
        }
    }
}

/// Capabilities a member holds inside one organization.
///
/// Flags are independent: none implies another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Permission {
    pub id: PermissionId,
    pub organization_id: OrganizationId,
    pub can_add_members: bool,
    pub can_remove_members: bool,
    pub can_create_petitions: bool,
    pub can_modify_petitions: bool,
    pub can_delete_petitions: bool,
    pub can_create_templates: bool,
    pub can_modify_templates: bool,
    pub can_delete_templates: bool,
    pub can_view_signatures: bool,
    pub can_modify_signatures: bool,
    pub can_delete_signatures: bool,
    pub can_modify_permissions: bool,
}

impl Permission {
    /// All-false permission set for a new member of `organization_id`.
    pub fn none(id: PermissionId, organization_id: OrganizationId) -> Self {
        Self {
            id,
            organization_id,
            ..Self::default()
        }
    }

    fn flag_mut(&mut self, capability: Capability) -> &mut bool {
        match capability {
            Capability::AddMembers => &mut self.can_add_members,
            Capability::RemoveMembers => &mut self.can_remove_members,
            Capability::CreatePetitions => &mut self.can_create_petitions,
            Capability::ModifyPetitions => &mut self.can_modify_petitions,
            Capability::DeletePetitions => &mut self.can_delete_petitions,
            Capability::CreateTemplates => &mut self.can_create_templates,
            Capability::ModifyTemplates => &mut self.can_modify_templates,
            Capability::DeleteTemplates => &mut self.can_delete_templates,
            Capability::ViewSignatures => &mut self.can_view_signatures,
            Capability::ModifySignatures => &mut self.can_modify_signatures,
            Capability::DeleteSignatures => &mut self.can_delete_signatures,
            Capability::ModifyPermissions => &mut self.can_modify_permissions,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::AddMembers => self.can_add_members,
            Capability::RemoveMembers => self.can_remove_members,
            Capability::CreatePetitions => self.can_create_petitions,
            Capability::ModifyPetitions => self.can_modify_petitions,
            Capability::DeletePetitions => self.can_delete_petitions,
            Capability::CreateTemplates => self.can_create_templates,
            Capability::ModifyTemplates => self.can_modify_templates,
            Capability::DeleteTemplates => self.can_delete_templates,
            Capability::ViewSignatures => self.can_view_signatures,
            Capability::ModifySignatures => self.can_modify_signatures,
            Capability::DeleteSignatures => self.can_delete_signatures,
            Capability::ModifyPermissions => self.can_modify_permissions,
        }
    }

    pub fn grant(&mut self, capability: Capability) {
        *self.flag_mut(capability) = true;
    }

    pub fn revoke(&mut self, capability: Capability) {
        *self.flag_mut(capability) = false;
    }

    /// Capabilities currently granted.
    pub fn granted(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.allows(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_permission_is_all_false() {
        let p = Permission::none(1, 2);
        assert!(Capability::ALL.iter().all(|c| !p.allows(*c)));
        assert!(p.granted().is_empty());
    }

    #[test]
    fn test_flags_are_independent() {
        for capability in Capability::ALL {
            let mut p = Permission::none(1, 2);
            p.grant(capability);
            assert_eq!(p.granted(), vec![capability]);
            p.revoke(capability);
            assert!(p.granted().is_empty());
        }
    }

    #[test]
    fn test_columns_unique() {
        let mut columns: Vec<_> = Capability::ALL.iter().map(|c| c.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), Capability::ALL.len());
    }

    #[test]
    fn test_organization_owner() {
        let org = Organization {
            id: 5,
            name: "Green Party".into(),
            default_template_id: None,
        };
        assert_eq!(org.kind(), OwnerKind::Org);
        assert_eq!(org.fullname(), "Green Party");
        assert_eq!(org.owner_ref(), OwnerRef::Organization(5));
        assert_eq!(org.to_string(), "Green Party");
    }

    #[test]
    fn test_validate_name() {
        assert!(Organization::validate_name("RAP").is_ok());
        assert_eq!(
            Organization::validate_name(" "),
            Err(ValidationError::Required("name"))
        );
        assert!(Organization::validate_name(&"o".repeat(201)).is_err());
    }
}
