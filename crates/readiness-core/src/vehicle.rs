//! 車輛模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 車輛識別碼
///
/// 來源資料可能把識別碼存成文字或浮點數（例如 `"123.0"`），
/// 建立時一律正規化，確保車輛表與彈藥表能以相同鍵值對應。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawVehicleId", into = "String")]
pub struct VehicleId(String);

impl VehicleId {
    /// 由原始輸入建立識別碼（自動正規化）
    pub fn new(raw: &str) -> Self {
        Self(canonicalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 空白識別碼（缺少必要欄位）
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 正規化規則：
/// - 僅由數字與小數點組成且可解析為數值時，取整數部分（`"42.0"` → `"42"`，`"007"` → `"7"`）
/// - 其他內容只去除前後空白，原樣保留
fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let numeric_looking = trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.');

    if numeric_looking {
        if let Ok(value) = Decimal::from_str(trimmed) {
            return value.trunc().normalize().to_string();
        }
    }

    trimmed.to_string()
}

impl From<&str> for VehicleId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for VehicleId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<VehicleId> for String {
    fn from(id: VehicleId) -> Self {
        id.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON 中的識別碼可能是字串或數字
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVehicleId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawVehicleId> for VehicleId {
    fn from(raw: RawVehicleId) -> Self {
        match raw {
            RawVehicleId::Text(text) => Self::new(&text),
            RawVehicleId::Number(number) => Self::new(&number.to_string()),
        }
    }
}

/// 車輛妥善狀態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationalStatus {
    /// 妥善
    Working,
    /// 不妥善
    NotWorking,
    /// 其他狀態（保修中、待料等），保留原始文字
    Other(String),
}

impl OperationalStatus {
    /// 解析狀態文字（忽略大小寫與前後空白）
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "working" => OperationalStatus::Working,
            "not working" => OperationalStatus::NotWorking,
            _ => OperationalStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperationalStatus::Working => "Working",
            OperationalStatus::NotWorking => "Not Working",
            OperationalStatus::Other(text) => text,
        }
    }

    pub fn is_working(&self) -> bool {
        *self == OperationalStatus::Working
    }
}

impl From<String> for OperationalStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<OperationalStatus> for String {
    fn from(status: OperationalStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Default for OperationalStatus {
    fn default() -> Self {
        OperationalStatus::Other(String::new())
    }
}

/// 車輛登錄資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// 車輛識別碼
    pub id: VehicleId,

    /// 所屬連隊
    #[serde(default)]
    pub unit: String,

    /// 駐地
    #[serde(default)]
    pub location: String,

    /// 車型
    #[serde(default)]
    pub vehicle_type: String,

    /// 妥善狀態
    #[serde(default)]
    pub status: OperationalStatus,
}

impl Vehicle {
    /// 創建新的車輛記錄（預設為妥善）
    pub fn new(id: impl Into<VehicleId>, unit: &str, location: &str) -> Self {
        Self {
            id: id.into(),
            unit: unit.to_string(),
            location: location.to_string(),
            vehicle_type: String::new(),
            status: OperationalStatus::Working,
        }
    }

    /// 建構器模式：設置車型
    pub fn with_vehicle_type(mut self, vehicle_type: &str) -> Self {
        self.vehicle_type = vehicle_type.to_string();
        self
    }

    /// 建構器模式：設置妥善狀態
    pub fn with_status(mut self, status: OperationalStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("123.0", "123")]
    #[case("42", "42")]
    #[case(" 42.0 ", "42")]
    #[case("007", "7")]
    #[case("12.7", "12")]
    #[case("0.0", "0")]
    #[case("Z-12", "Z-12")]
    #[case("1.2.3", "1.2.3")]
    #[case("", "")]
    fn test_canonical_vehicle_id(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(VehicleId::new(raw).as_str(), expected);
    }

    #[test]
    fn test_float_and_text_ids_match() {
        assert_eq!(VehicleId::new("42.0"), VehicleId::new("42"));
    }

    #[test]
    fn test_vehicle_id_from_json_number() {
        let id: VehicleId = serde_json::from_str("42.0").unwrap();
        assert_eq!(id.as_str(), "42");

        let id: VehicleId = serde_json::from_str("\"42.0\"").unwrap();
        assert_eq!(id.as_str(), "42");

        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[rstest]
    #[case("Working", OperationalStatus::Working)]
    #[case(" working ", OperationalStatus::Working)]
    #[case("NOT WORKING", OperationalStatus::NotWorking)]
    #[case("In Repair", OperationalStatus::Other("In Repair".to_string()))]
    fn test_parse_status(#[case] raw: &str, #[case] expected: OperationalStatus) {
        assert_eq!(OperationalStatus::parse(raw), expected);
    }

    #[test]
    fn test_vehicle_builder() {
        let vehicle = Vehicle::new("7.0", "A", "North")
            .with_vehicle_type("Merkava")
            .with_status(OperationalStatus::NotWorking);

        assert_eq!(vehicle.id.as_str(), "7");
        assert_eq!(vehicle.vehicle_type, "Merkava");
        assert!(!vehicle.status.is_working());
    }
}
