//! The pre-authenticated identity attached to every transition request.

use crate::model::{CustomerId, DriverId, RestaurantId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Restaurant,
    Driver,
    Admin,
    /// The matching engine itself.
    Dispatcher,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Customer => "customer",
            Role::Restaurant => "restaurant",
            Role::Driver => "driver",
            Role::Admin => "admin",
            Role::Dispatcher => "dispatcher",
        };
        f.write_str(name)
    }
}

/// `id` is interpreted by role: a customer, restaurant or driver id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub role: Role,
    pub id: u32,
}

impl Caller {
    pub fn customer(id: CustomerId) -> Self {
        Self {
            role: Role::Customer,
            id: id.0,
        }
    }

    pub fn restaurant(id: RestaurantId) -> Self {
        Self {
            role: Role::Restaurant,
            id: id.0,
        }
    }

    pub fn driver(id: DriverId) -> Self {
        Self {
            role: Role::Driver,
            id: id.0,
        }
    }

    pub fn admin(id: u32) -> Self {
        Self {
            role: Role::Admin,
            id,
        }
    }

    pub fn dispatcher() -> Self {
        Self {
            role: Role::Dispatcher,
            id: 0,
        }
    }
}

impl Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}
