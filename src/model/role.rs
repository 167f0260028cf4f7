use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Teacher = 2,
    Staff = 3,
    Student = 4,
    System = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Teacher),
            3 => Some(Role::Staff),
            4 => Some(Role::Student),
            5 => Some(Role::System),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Roles that check in every workday and receive attendance reminders
    pub fn takes_attendance(self) -> bool {
        matches!(self, Role::Teacher | Role::Staff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for role in [Role::Admin, Role::Teacher, Role::Staff, Role::Student, Role::System] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn only_teachers_and_staff_take_attendance() {
        assert!(Role::Teacher.takes_attendance());
        assert!(Role::Staff.takes_attendance());
        assert!(!Role::Admin.takes_attendance());
        assert!(!Role::Student.takes_attendance());
    }
}
