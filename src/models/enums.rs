use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

impl AppointmentStatus {
    /// Statuses that occupy a doctor's slot.
    pub const ACTIVE: [AppointmentStatus; 2] = [Self::Scheduled, Self::Confirmed];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No show",
        }
    }

    /// Whether `self -> next` is an allowed lifecycle move.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Scheduled, Confirmed | Completed | Cancelled | NoShow)
                | (Confirmed, Completed | Cancelled | NoShow)
        )
    }
}

str_enum!(UserRole {
    Admin => "admin",
    Doctor => "doctor",
    Receptionist => "receptionist",
});

impl UserRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Doctor => "Doctor",
            Self::Receptionist => "Receptionist",
        }
    }

    /// Role hierarchy: admin covers everything, doctor covers the
    /// receptionist desk, receptionist covers only itself.
    pub fn grants(&self, required: UserRole) -> bool {
        match self {
            Self::Admin => true,
            Self::Doctor => matches!(required, Self::Doctor | Self::Receptionist),
            Self::Receptionist => required == Self::Receptionist,
        }
    }
}
