use serde::Serialize;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum Role {
    Admin = 1,
    Supervisor = 2,
    Handler = 3,
    Intern = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Supervisor),
            3 => Some(Role::Handler),
            4 => Some(Role::Intern),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Supervisor => "Supervisor",
            Role::Handler => "Handler",
            Role::Intern => "Intern",
        }
    }

    /// Roles that manage interns: approve, scan, export.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor | Role::Handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in [Role::Admin, Role::Supervisor, Role::Handler, Role::Intern] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn interns_are_not_staff() {
        assert!(Role::Handler.is_staff());
        assert!(!Role::Intern.is_staff());
    }
}
