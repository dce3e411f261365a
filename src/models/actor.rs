use super::CancelActor;

/// The caller identity, resolved by the upstream auth layer and trusted here.
/// Authorization decisions on top of it belong to the lifecycle manager.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Stylist,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "stylist" => Some(Role::Stylist),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn cancel_actor(&self) -> CancelActor {
        match self.role {
            Role::Customer => CancelActor::Customer,
            Role::Stylist => CancelActor::Stylist,
            Role::Admin => CancelActor::Admin,
        }
    }
}
