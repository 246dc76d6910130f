//! 資料快照

use serde::{Deserialize, Serialize};

use crate::ammo::AmmoHolding;
use crate::vehicle::Vehicle;

/// 車輛表與彈藥表在同一時間點的一致讀取
///
/// 計算引擎只讀取快照，不會修改其中任何資料。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetSnapshot {
    /// 車輛表
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,

    /// 彈藥表
    #[serde(default)]
    pub ammo: Vec<AmmoHolding>,
}

impl FleetSnapshot {
    pub fn new(vehicles: Vec<Vehicle>, ammo: Vec<AmmoHolding>) -> Self {
        Self { vehicles, ammo }
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.ammo.is_empty()
    }
}
