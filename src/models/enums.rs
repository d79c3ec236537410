use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Admin => "admin",
    Receptionist => "receptionist",
});

str_enum!(Gender {
    Male => "M",
    Female => "F",
});

str_enum!(DayOfWeek {
    Monday => "Monday",
    Tuesday => "Tuesday",
    Wednesday => "Wednesday",
    Thursday => "Thursday",
    Friday => "Friday",
    Saturday => "Saturday",
    Sunday => "Sunday",
});

str_enum!(AppointmentStatus {
    Scheduled => "Scheduled",
    Completed => "Completed",
    Canceled => "Canceled",
});

impl Default for Role {
    fn default() -> Self {
        Self::Patient
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}

impl Role {
    /// Profile table backing this role, if the role carries one.
    pub fn profile_kind(&self) -> Option<ProfileKind> {
        match self {
            Self::Doctor => Some(ProfileKind::Doctor),
            Self::Patient => Some(ProfileKind::Patient),
            Self::Receptionist => Some(ProfileKind::Receptionist),
            Self::Admin => None,
        }
    }
}

impl DayOfWeek {
    /// Position in the week, Monday = 0.
    pub fn ordinal(&self) -> usize {
        Self::ALL.iter().position(|d| d == self).unwrap_or(0)
    }
}

/// Role-specific profile record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Doctor,
    Patient,
    Receptionist,
}

impl ProfileKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor_profiles",
            Self::Patient => "patient_profiles",
            Self::Receptionist => "receptionist_profiles",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trip() {
        for (variant, s) in [
            (Role::Patient, "patient"),
            (Role::Doctor, "doctor"),
            (Role::Admin, "admin"),
            (Role::Receptionist, "receptionist"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Role::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn appointment_status_uses_capitalized_labels() {
        assert_eq!(AppointmentStatus::default().as_str(), "Scheduled");
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Canceled).unwrap(),
            "\"Canceled\""
        );
        assert!(AppointmentStatus::from_str("scheduled").is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Receptionist).unwrap(), "\"receptionist\"");
        let role: Role = serde_json::from_str("\"doctor\"").unwrap();
        assert_eq!(role, Role::Doctor);
    }

    #[test]
    fn days_follow_declared_order() {
        assert_eq!(DayOfWeek::Monday.ordinal(), 0);
        assert_eq!(DayOfWeek::Sunday.ordinal(), 6);
        assert!(DayOfWeek::Tuesday.ordinal() < DayOfWeek::Wednesday.ordinal());
    }

    #[test]
    fn admin_has_no_profile() {
        assert_eq!(Role::Admin.profile_kind(), None);
        assert_eq!(Role::Doctor.profile_kind(), Some(ProfileKind::Doctor));
        assert_eq!(ProfileKind::Receptionist.table(), "receptionist_profiles");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Role::from_str("nurse").is_err());
        assert!(DayOfWeek::from_str("monday").is_err());
        assert!(Gender::from_str("").is_err());
    }
}
