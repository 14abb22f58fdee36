use std::fmt::{Display, Formatter};
use std::str::FromStr;

use evidentia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Stable permission codes the workflow and administration guards rely on.
pub mod codes {
    /// Read evidence items and their files.
    pub const EVIDENCES_READ: &str = "EVIDENCES.READ";
    /// Assign contributors to evidence items of a department.
    pub const EVIDENCES_ASSIGN: &str = "EVIDENCES.ASSIGN";
    /// Upload files to evidence items the principal is assigned to.
    pub const EVIDENCES_UPLOAD: &str = "EVIDENCES.UPLOAD";
    /// Approve or reject submitted evidence files.
    pub const EVIDENCES_APPROVE: &str = "EVIDENCES.APPROVE";
    /// Manage principals, groups and overrides.
    pub const USERS_MANAGE: &str = "USERS.MANAGE";
    /// Full system administration, crosses department boundaries.
    pub const SYSTEM_MANAGE: &str = "SYSTEM.MANAGE";
}

/// Functional area a permission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionModule {
    /// Self-evaluation reports.
    Reports,
    /// Expert evaluations.
    Evaluations,
    /// Principal administration.
    Users,
    /// Accreditation standards.
    Standards,
    /// Standard criteria.
    Criteria,
    /// Study programs.
    Programs,
    /// Organisations.
    Organizations,
    /// Academic years.
    AcademicYears,
    /// Evidence items and uploaded files.
    Evidences,
    /// System administration.
    System,
    /// Application settings.
    Settings,
}

impl PermissionModule {
    /// Returns a stable storage value for this module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::Evaluations => "evaluations",
            Self::Users => "users",
            Self::Standards => "standards",
            Self::Criteria => "criteria",
            Self::Programs => "programs",
            Self::Organizations => "organizations",
            Self::AcademicYears => "academic_years",
            Self::Evidences => "evidences",
            Self::System => "system",
            Self::Settings => "settings",
        }
    }
}

impl FromStr for PermissionModule {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reports" => Ok(Self::Reports),
            "evaluations" => Ok(Self::Evaluations),
            "users" => Ok(Self::Users),
            "standards" => Ok(Self::Standards),
            "criteria" => Ok(Self::Criteria),
            "programs" => Ok(Self::Programs),
            "organizations" => Ok(Self::Organizations),
            "academic_years" => Ok(Self::AcademicYears),
            "evidences" => Ok(Self::Evidences),
            "system" => Ok(Self::System),
            "settings" => Ok(Self::Settings),
            _ => Err(AppError::validation(
                "module",
                format!("unknown permission module '{value}'"),
            )),
        }
    }
}

/// Verb-like dimension of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Create new records.
    Create,
    /// Read records.
    Read,
    /// Update records.
    Update,
    /// Delete records.
    Delete,
    /// Approve submitted work.
    Approve,
    /// Reject submitted work.
    Reject,
    /// Assign contributors.
    Assign,
    /// Upload content.
    Upload,
    /// Export data.
    Export,
    /// Import data.
    Import,
    /// Manage the whole module.
    Manage,
}

impl PermissionAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Assign => "assign",
            Self::Upload => "upload",
            Self::Export => "export",
            Self::Import => "import",
            Self::Manage => "manage",
        }
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "assign" => Ok(Self::Assign),
            "upload" => Ok(Self::Upload),
            "export" => Ok(Self::Export),
            "import" => Ok(Self::Import),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::validation(
                "action",
                format!("unknown permission action '{value}'"),
            )),
        }
    }
}

/// Sensitivity classification used when bundling default groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Everyday read-style capability.
    Basic,
    /// Content authoring.
    Intermediate,
    /// Structural or approval capability.
    Advanced,
    /// Destructive or system-wide capability.
    Critical,
}

/// Case-normalized unique permission code, e.g. `REPORTS.CREATE`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Creates a code, trimming and upper-casing the input.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let normalized = value.as_ref().trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(AppError::validation(
                "code",
                "permission code must not be empty",
            ));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(AppError::validation(
                "code",
                format!("permission code '{normalized}' must not contain whitespace"),
            ));
        }

        Ok(Self(normalized))
    }

    /// Derives the canonical `MODULE.ACTION` code.
    #[must_use]
    pub fn from_parts(module: PermissionModule, action: PermissionAction) -> Self {
        Self(format!("{}.{}", module.as_str(), action.as_str()).to_ascii_uppercase())
    }

    /// Returns the normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether `candidate` names this code after normalization.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.eq_ignore_ascii_case(candidate.trim())
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionCode> for String {
    fn from(value: PermissionCode) -> Self {
        value.0
    }
}

/// An atomic capability known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    code: PermissionCode,
    name: String,
    module: PermissionModule,
    action: PermissionAction,
    level: PermissionLevel,
    active: bool,
}

impl Permission {
    /// Creates an active permission with the derived `MODULE.ACTION` code.
    #[must_use]
    pub fn new(
        module: PermissionModule,
        action: PermissionAction,
        name: impl Into<String>,
        level: PermissionLevel,
    ) -> Self {
        Self {
            code: PermissionCode::from_parts(module, action),
            name: name.into(),
            module,
            action,
            level,
            active: true,
        }
    }

    /// Creates an active permission with an explicit code.
    #[must_use]
    pub fn with_code(
        code: PermissionCode,
        module: PermissionModule,
        action: PermissionAction,
        name: impl Into<String>,
        level: PermissionLevel,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            module,
            action,
            level,
            active: true,
        }
    }

    /// Returns the unique code.
    #[must_use]
    pub fn code(&self) -> &PermissionCode {
        &self.code
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the module dimension.
    #[must_use]
    pub fn module(&self) -> PermissionModule {
        self.module
    }

    /// Returns the action dimension.
    #[must_use]
    pub fn action(&self) -> PermissionAction {
        self.action
    }

    /// Returns the sensitivity level.
    #[must_use]
    pub fn level(&self) -> PermissionLevel {
        self.level
    }

    /// Returns whether the permission contributes to resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activates or retires the permission. The code never changes.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}
