use std::fmt;

use serde::{Deserialize, Serialize};

/// Capacity tier a shipment is booked against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VehicleType {
    #[serde(rename = "MOTORCYCLE")]
    Motorcycle,
    #[serde(rename = "DAMAS")]
    Damas,
    #[serde(rename = "LABO")]
    Labo,
    #[serde(rename = "TRUCK_1TON")]
    Truck1Ton,
    #[serde(rename = "TRUCK_1TON_WING")]
    Truck1TonWing,
    #[serde(rename = "TRUCK_2_5TON")]
    Truck25Ton,
}

impl VehicleType {
    pub const ALL: [VehicleType; 6] = [
        VehicleType::Motorcycle,
        VehicleType::Damas,
        VehicleType::Labo,
        VehicleType::Truck1Ton,
        VehicleType::Truck1TonWing,
        VehicleType::Truck25Ton,
    ];

    /// Published base fare in currency units, if the class has one.
    pub fn base_fare(self) -> Option<u64> {
        match self {
            VehicleType::Motorcycle => Some(8_000),
            VehicleType::Damas => Some(25_000),
            VehicleType::Labo => Some(35_000),
            VehicleType::Truck1Ton => Some(50_000),
            VehicleType::Truck1TonWing => Some(65_000),
            VehicleType::Truck25Ton => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Motorcycle => "MOTORCYCLE",
            VehicleType::Damas => "DAMAS",
            VehicleType::Labo => "LABO",
            VehicleType::Truck1Ton => "TRUCK_1TON",
            VehicleType::Truck1TonWing => "TRUCK_1TON_WING",
            VehicleType::Truck25Ton => "TRUCK_2_5TON",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
