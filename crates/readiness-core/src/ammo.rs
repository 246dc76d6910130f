//! 彈藥模型

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::vehicle::VehicleId;

/// 彈藥種類（名稱由標準配置決定，新增種類不需修改程式）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmmoType(String);

impl AmmoType {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AmmoType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for AmmoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 彈藥數量欄位
///
/// 數值轉換規則（在匯入邊界套用）：
/// - 數字或數字字串 → `Count`
/// - 空字串、`null` → `Blank`，計算時視為 0
/// - 無法解析的內容 → `Malformed`，計算時視為 0，並記錄在診斷資訊中
/// - 絕對值超過 [`Quantity::MAX_ABS`] 的數值 → `Malformed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    /// 有效數量
    Count(Decimal),
    /// 空白
    Blank,
    /// 無法解析的原始內容
    Malformed(String),
}

impl Quantity {
    /// 單一欄位可接受的最大絕對值（10^15），確保整批加總不會溢位
    pub const MAX_ABS: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

    /// 解析原始文字
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Quantity::Blank;
        }

        match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
            Ok(value) if value.abs() <= Self::MAX_ABS => Quantity::Count(value),
            _ => Quantity::Malformed(trimmed.to_string()),
        }
    }

    /// 由數值建立（超出範圍時為 `Malformed`）
    pub fn count(value: Decimal) -> Self {
        if value.abs() <= Self::MAX_ABS {
            Quantity::Count(value)
        } else {
            Quantity::Malformed(value.to_string())
        }
    }

    /// 由 JSON 值轉換
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Quantity::Blank,
            serde_json::Value::Number(number) => Self::parse(&number.to_string()),
            serde_json::Value::String(text) => Self::parse(text),
            other => Quantity::Malformed(other.to_string()),
        }
    }

    /// 計算用數值（空白與錯誤內容皆為 0）
    pub fn value(&self) -> Decimal {
        match self {
            Quantity::Count(value) => *value,
            Quantity::Blank | Quantity::Malformed(_) => Decimal::ZERO,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Quantity::Malformed(_))
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self::count(value)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quantity::Count(value) => Serialize::serialize(value, serializer),
            Quantity::Blank => serializer.serialize_none(),
            Quantity::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Quantity::from_json(&value))
    }
}

/// 單車彈藥存量（彈藥表的一列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoHolding {
    /// 車輛識別碼（不強制對應車輛表）
    pub vehicle_id: VehicleId,

    /// 彈藥表本身記載的連隊（可能為空）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// 彈藥表本身記載的駐地（可能為空）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// 各彈藥種類的存量
    #[serde(default)]
    pub quantities: BTreeMap<AmmoType, Quantity>,
}

impl AmmoHolding {
    /// 創建新的彈藥存量記錄
    pub fn new(vehicle_id: impl Into<VehicleId>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            unit: None,
            location: None,
            quantities: BTreeMap::new(),
        }
    }

    /// 建構器模式：設置數量
    pub fn with_quantity(mut self, ammo_type: &str, quantity: impl Into<Decimal>) -> Self {
        self.quantities
            .insert(AmmoType::new(ammo_type), Quantity::count(quantity.into()));
        self
    }

    /// 建構器模式：以原始文字設置數量
    pub fn with_raw_quantity(mut self, ammo_type: &str, raw: &str) -> Self {
        self.quantities
            .insert(AmmoType::new(ammo_type), Quantity::parse(raw));
        self
    }

    /// 建構器模式：設置連隊
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// 建構器模式：設置駐地
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// 取得存量（缺少欄位視為 0）
    pub fn current(&self, ammo_type: &AmmoType) -> Decimal {
        self.quantities
            .get(ammo_type)
            .map(Quantity::value)
            .unwrap_or(Decimal::ZERO)
    }

    /// 取得原始數量欄位
    pub fn quantity(&self, ammo_type: &AmmoType) -> Option<&Quantity> {
        self.quantities.get(ammo_type)
    }
}
