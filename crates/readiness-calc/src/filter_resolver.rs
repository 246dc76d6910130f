//! 篩選解析

use readiness_core::{AmmoHolding, FilterSpec, FleetSnapshot, Vehicle, VehicleId};
use std::collections::HashSet;

/// 篩選後的車輛與彈藥（借用快照資料，不複製）
#[derive(Debug, Clone, Default)]
pub struct FilteredFleet<'a> {
    /// 符合條件的車輛
    pub vehicles: Vec<&'a Vehicle>,
    /// 車號出現在 `vehicles` 中的彈藥列
    pub ammo: Vec<&'a AmmoHolding>,
}

impl<'a> FilteredFleet<'a> {
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

/// 篩選解析器
pub struct FilterResolver;

impl FilterResolver {
    /// 依篩選條件縮小快照
    pub fn resolve<'a>(snapshot: &'a FleetSnapshot, filter: &FilterSpec) -> FilteredFleet<'a> {
        Self::resolve_tables(&snapshot.vehicles, &snapshot.ammo, filter)
    }

    /// 先篩選車輛表，再以車號對應出彈藥列
    pub fn resolve_tables<'a>(
        vehicles: &'a [Vehicle],
        ammo: &'a [AmmoHolding],
        filter: &FilterSpec,
    ) -> FilteredFleet<'a> {
        let filtered_vehicles: Vec<&Vehicle> =
            vehicles.iter().filter(|v| filter.matches(v)).collect();

        // 沒有車輛符合時，彈藥列自然為空；空白車號不參與對應
        let ids: HashSet<&VehicleId> = filtered_vehicles
            .iter()
            .map(|v| &v.id)
            .filter(|id| !id.is_empty())
            .collect();
        let filtered_ammo: Vec<&AmmoHolding> = ammo
            .iter()
            .filter(|holding| ids.contains(&holding.vehicle_id))
            .collect();

        tracing::debug!(
            "篩選結果: 車輛 {}/{} 輛，彈藥列 {}/{} 筆",
            filtered_vehicles.len(),
            vehicles.len(),
            filtered_ammo.len(),
            ammo.len()
        );

        FilteredFleet {
            vehicles: filtered_vehicles,
            ammo: filtered_ammo,
        }
    }
}
