use std::str::FromStr;

use evidentia_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|error| AppError::validation($field, error.to_string()))
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a permission group.
    GroupId,
    "group_id"
);

uuid_identifier!(
    /// Unique identifier for an evidence item.
    EvidenceId,
    "evidence_id"
);

uuid_identifier!(
    /// Unique identifier for one uploaded evidence file.
    FileId,
    "file_id"
);

uuid_identifier!(
    /// Unique identifier for an organisational department.
    DepartmentId,
    "department_id"
);

#[cfg(test)]
mod tests {
    use super::{EvidenceId, FileId};

    #[test]
    fn identifiers_parse_their_display_form() {
        let evidence_id = EvidenceId::new();
        assert_eq!(
            evidence_id.to_string().parse::<EvidenceId>().ok(),
            Some(evidence_id)
        );
    }

    #[test]
    fn malformed_identifier_names_its_field() {
        let error = "not-a-uuid".parse::<FileId>().err();
        assert!(error.is_some_and(|error| error.to_string().contains("file_id")));
    }
}
