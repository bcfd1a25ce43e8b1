//! User designations, roles and the QC permission matrix

use serde::{Deserialize, Serialize};

/// Department a user logs in under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Designation {
    Admin,
    Warehouse,
    #[serde(rename = "QC")]
    Qc,
    Production,
    #[serde(rename = "QA")]
    Qa,
}

impl std::fmt::Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Designation::Admin => write!(f, "Admin"),
            Designation::Warehouse => write!(f, "Warehouse"),
            Designation::Qc => write!(f, "QC"),
            Designation::Production => write!(f, "Production"),
            Designation::Qa => write!(f, "QA"),
        }
    }
}

/// Resources that can be accessed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Qc,
    Production,
    Warehouse,
    Qa,
    User,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Qc => "qc",
            Resource::Production => "production",
            Resource::Warehouse => "warehouse",
            Resource::Qa => "qa",
            Resource::User => "user",
        }
    }
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Add,
    Edit,
    Approve,
    Delete,
    Manage,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Edit => "edit",
            Action::Approve => "approve",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

/// A permission granting actions on a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub actions: Vec<Action>,
}

impl Permission {
    fn new(resource: Resource, actions: &[Action]) -> Self {
        Self {
            resource,
            actions: actions.to_vec(),
        }
    }

    /// Flatten into `resource:action` keys
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.actions
            .iter()
            .map(move |action| format!("{}:{}", self.resource.as_str(), action.as_str()))
    }
}

/// Job roles and their position in the approval hierarchy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "QC Officer")]
    QcOfficer,
    #[serde(rename = "Junior Officer")]
    JuniorOfficer,
    #[serde(rename = "Senior Officer")]
    SeniorOfficer,
    #[serde(rename = "Executive")]
    Executive,
    #[serde(rename = "Senior Executive")]
    SeniorExecutive,
    #[serde(rename = "Assistant Manager")]
    AssistantManager,
    #[serde(rename = "HOD")]
    Hod,
    #[serde(rename = "Production Officer")]
    ProductionOfficer,
    #[serde(rename = "Production Manager")]
    ProductionManager,
    #[serde(rename = "Warehouse Officer")]
    WarehouseOfficer,
    #[serde(rename = "Warehouse Manager")]
    WarehouseManager,
    #[serde(rename = "QA Officer")]
    QaOfficer,
    #[serde(rename = "QA Manager")]
    QaManager,
}

impl Role {
    pub const ALL: [Role; 13] = [
        Role::QcOfficer,
        Role::JuniorOfficer,
        Role::SeniorOfficer,
        Role::Executive,
        Role::SeniorExecutive,
        Role::AssistantManager,
        Role::Hod,
        Role::ProductionOfficer,
        Role::ProductionManager,
        Role::WarehouseOfficer,
        Role::WarehouseManager,
        Role::QaOfficer,
        Role::QaManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::QcOfficer => "QC Officer",
            Role::JuniorOfficer => "Junior Officer",
            Role::SeniorOfficer => "Senior Officer",
            Role::Executive => "Executive",
            Role::SeniorExecutive => "Senior Executive",
            Role::AssistantManager => "Assistant Manager",
            Role::Hod => "HOD",
            Role::ProductionOfficer => "Production Officer",
            Role::ProductionManager => "Production Manager",
            Role::WarehouseOfficer => "Warehouse Officer",
            Role::WarehouseManager => "Warehouse Manager",
            Role::QaOfficer => "QA Officer",
            Role::QaManager => "QA Manager",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    /// Permissions granted to this role
    pub fn permissions(&self) -> Vec<Permission> {
        use Action::*;

        let qc = |actions: &[Action]| vec![Permission::new(Resource::Qc, actions)];
        match self {
            Role::QcOfficer => qc(&[View, Add]),
            Role::JuniorOfficer => qc(&[View]),
            Role::SeniorOfficer => qc(&[View, Add, Approve]),
            Role::Executive => qc(&[View, Add, Edit]),
            Role::SeniorExecutive => qc(&[View, Add, Edit, Approve]),
            Role::AssistantManager => qc(&[View, Add, Edit, Approve, Delete]),
            Role::Hod => vec![
                Permission::new(Resource::Qc, &[View, Add, Edit, Approve, Delete]),
                Permission::new(Resource::User, &[Manage]),
            ],
            Role::ProductionOfficer => vec![Permission::new(Resource::Production, &[View, Add])],
            Role::ProductionManager => {
                vec![Permission::new(Resource::Production, &[View, Add, Approve])]
            }
            Role::WarehouseOfficer => vec![Permission::new(Resource::Warehouse, &[View, Add])],
            Role::WarehouseManager => {
                vec![Permission::new(Resource::Warehouse, &[View, Add, Approve])]
            }
            Role::QaOfficer => vec![Permission::new(Resource::Qa, &[View, Add])],
            Role::QaManager => vec![Permission::new(Resource::Qa, &[View, Add, Approve])],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every permission on every resource, held by the Admin designation
pub fn admin_permissions() -> Vec<Permission> {
    use Action::*;

    [
        Resource::Qc,
        Resource::Production,
        Resource::Warehouse,
        Resource::Qa,
        Resource::User,
    ]
    .into_iter()
    .map(|resource| Permission::new(resource, &[View, Add, Edit, Approve, Delete, Manage]))
    .collect()
}

/// Resolve the flattened `resource:action` keys for a designation and role
pub fn permission_keys(designation: Designation, role: Option<Role>) -> Vec<String> {
    let permissions = match (designation, role) {
        (Designation::Admin, _) => admin_permissions(),
        (_, Some(role)) => role.permissions(),
        (_, None) => Vec::new(),
    };

    permissions.iter().flat_map(|p| p.keys()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn junior_officer_can_only_view() {
        let keys = permission_keys(Designation::Qc, Some(Role::JuniorOfficer));
        assert_eq!(keys, vec!["qc:view".to_string()]);
    }

    #[test]
    fn hod_manages_users() {
        let keys = permission_keys(Designation::Qc, Some(Role::Hod));
        assert!(keys.contains(&"qc:delete".to_string()));
        assert!(keys.contains(&"user:manage".to_string()));
    }

    #[test]
    fn admin_holds_everything_without_role() {
        let keys = permission_keys(Designation::Admin, None);
        assert!(keys.contains(&"qc:approve".to_string()));
        assert!(keys.contains(&"warehouse:delete".to_string()));
    }

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("Intern"), None);
    }
}
