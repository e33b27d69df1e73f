use serde::Serialize;
use utoipa::ToSchema;

/// Rows of the `role` table; ids are seeded by the initial migration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator = 1,
    Direction = 2,
    Subdirection = 3,
    Staff = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Administrator),
            2 => Some(Role::Direction),
            3 => Some(Role::Subdirection),
            4 => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Direction, Subdirection and Administrators review requests and
    /// register medical leaves.
    pub fn is_office(self) -> bool {
        matches!(self, Role::Administrator | Role::Direction | Role::Subdirection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in [Role::Administrator, Role::Direction, Role::Subdirection, Role::Staff] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn staff_is_not_an_office() {
        assert!(Role::Direction.is_office());
        assert!(!Role::Staff.is_office());
    }
}
