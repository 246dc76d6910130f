//! 篩選條件模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ammo::AmmoType;
use crate::vehicle::{Vehicle, VehicleId};

/// 介面上代表「不篩選」的選項文字
pub const WILDCARD_LABEL: &str = "All";

/// 單一篩選值
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FilterValue {
    /// 不篩選
    #[default]
    Wildcard,
    /// 精確比對
    Value(String),
}

impl FilterValue {
    /// 指定值
    pub fn value(value: &str) -> Self {
        FilterValue::Value(value.trim().to_string())
    }

    /// 解析介面選項（"All" 或空白視為不篩選）
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == WILDCARD_LABEL {
            FilterValue::Wildcard
        } else {
            FilterValue::Value(trimmed.to_string())
        }
    }

    /// 檢查欄位是否符合
    pub fn matches(&self, field: &str) -> bool {
        match self {
            FilterValue::Wildcard => true,
            FilterValue::Value(expected) => expected == field,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, FilterValue::Wildcard)
    }
}

impl From<Option<&str>> for FilterValue {
    fn from(value: Option<&str>) -> Self {
        value.map(FilterValue::value).unwrap_or_default()
    }
}

/// 車輛篩選條件（連隊／駐地／車號／車型）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub unit: FilterValue,
    #[serde(default)]
    pub location: FilterValue,
    #[serde(default)]
    pub vehicle_id: FilterValue,
    #[serde(default)]
    pub vehicle_type: FilterValue,
}

impl FilterSpec {
    /// 不篩選任何條件
    pub fn all() -> Self {
        Self::default()
    }

    /// 建構器模式：設置連隊
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = FilterValue::parse(unit);
        self
    }

    /// 建構器模式：設置駐地
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = FilterValue::parse(location);
        self
    }

    /// 建構器模式：設置車號（會先正規化）
    pub fn with_vehicle_id(mut self, vehicle_id: &str) -> Self {
        self.vehicle_id = match FilterValue::parse(vehicle_id) {
            FilterValue::Wildcard => FilterValue::Wildcard,
            FilterValue::Value(raw) => FilterValue::Value(VehicleId::new(&raw).to_string()),
        };
        self
    }

    /// 建構器模式：設置車型
    pub fn with_vehicle_type(mut self, vehicle_type: &str) -> Self {
        self.vehicle_type = FilterValue::parse(vehicle_type);
        self
    }

    /// 檢查車輛是否符合所有條件
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.unit.matches(&vehicle.unit)
            && self.location.matches(&vehicle.location)
            && self.matches_vehicle_id(&vehicle.id)
            && self.vehicle_type.matches(&vehicle.vehicle_type)
    }

    /// 所有條件皆為不篩選
    pub fn is_unfiltered(&self) -> bool {
        self.unit.is_wildcard()
            && self.location.is_wildcard()
            && self.vehicle_id.is_wildcard()
            && self.vehicle_type.is_wildcard()
    }

    // 反序列化得到的車號未經正規化，比對前再正規化一次
    fn matches_vehicle_id(&self, id: &VehicleId) -> bool {
        match &self.vehicle_id {
            FilterValue::Wildcard => true,
            FilterValue::Value(expected) => VehicleId::new(expected) == *id,
        }
    }
}

/// 顯示的彈藥範圍
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ammo_type")]
pub enum AmmoScope {
    /// 全部彈藥
    #[default]
    All,
    /// 單一彈藥種類
    Single(AmmoType),
    /// 只顯示組合彈藥
    Bundle,
}

impl AmmoScope {
    pub fn single(ammo_type: &str) -> Self {
        AmmoScope::Single(AmmoType::new(ammo_type))
    }
}

/// 篩選選項清單（排序、去重、排除空白）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterOptions {
    pub units: Vec<String>,
    pub locations: Vec<String>,
    pub vehicle_ids: Vec<String>,
    pub vehicle_types: Vec<String>,
}

impl FilterOptions {
    /// 從車輛表收集篩選選項
    pub fn from_registry(vehicles: &[Vehicle]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
            values
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        }

        Self {
            units: distinct(vehicles.iter().map(|v| v.unit.as_str())),
            locations: distinct(vehicles.iter().map(|v| v.location.as_str())),
            vehicle_ids: distinct(vehicles.iter().map(|v| v.id.as_str())),
            vehicle_types: distinct(vehicles.iter().map(|v| v.vehicle_type.as_str())),
        }
    }
}
