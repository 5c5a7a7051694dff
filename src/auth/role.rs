use serde::{Deserialize, Serialize};

/// Account role, fixed when the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Staff,
    Customer,
}

impl Role {
    /// Role a username maps to: the literal `owner` is the administrative
    /// account, any name containing `staff` belongs to the staff namespace,
    /// everything else is a customer.
    pub fn resolve(username: &str) -> Role {
        if username == "owner" {
            Role::Owner
        } else if username.contains("staff") {
            Role::Staff
        } else {
            Role::Customer
        }
    }

    /// Route a logged-in user of this role lands on.
    pub fn landing(self) -> &'static str {
        match self {
            Role::Owner => "/owner",
            Role::Staff => "/staff",
            Role::Customer => "/customer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_the_exact_literal() {
        assert_eq!(Role::resolve("owner"), Role::Owner);
        assert_eq!(Role::resolve("Owner"), Role::Customer);
        assert_eq!(Role::resolve("owner2"), Role::Customer);
    }

    #[test]
    fn staff_matches_anywhere_in_the_name() {
        assert_eq!(Role::resolve("staff_jane"), Role::Staff);
        assert_eq!(Role::resolve("jane_staff"), Role::Staff);
        assert_eq!(Role::resolve("mystaffer"), Role::Staff);
    }

    #[test]
    fn staff_substring_beats_owner_prefix() {
        // not the literal "owner", contains "staff"
        assert_eq!(Role::resolve("ownerstaff"), Role::Staff);
    }

    #[test]
    fn everything_else_is_a_customer() {
        assert_eq!(Role::resolve("bob"), Role::Customer);
        assert_eq!(Role::resolve(""), Role::Customer);
        assert_eq!(Role::resolve("STAFF"), Role::Customer);
    }

    #[test]
    fn landing_routes() {
        assert_eq!(Role::Owner.landing(), "/owner");
        assert_eq!(Role::Staff.landing(), "/staff");
        assert_eq!(Role::Customer.landing(), "/customer");
    }
}
