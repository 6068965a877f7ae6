//! Arena pickups that grant a special weapon.

use serde::{Deserialize, Serialize};

use crate::ids::PickupId;
use crate::ship::SpecialWeapon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupType {
    Laser,
    Bomb,
    Nova,
}

impl PickupType {
    pub fn grants(self) -> SpecialWeapon {
        match self {
            PickupType::Laser => SpecialWeapon::Laser,
            PickupType::Bomb => SpecialWeapon::Bomb,
            PickupType::Nova => SpecialWeapon::Nova,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: PickupId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PickupType,
    /// Number of uses granted on collection.
    pub value: u32,
}
