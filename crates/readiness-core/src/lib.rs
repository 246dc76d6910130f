//! # Readiness Core
//!
//! 車輛戰備與彈藥存量的核心資料模型與類型定義

pub mod ammo;
pub mod filter;
pub mod ingest;
pub mod snapshot;
pub mod standards;
pub mod vehicle;

// Re-export 主要類型
pub use ammo::{AmmoHolding, AmmoType, Quantity};
pub use filter::{AmmoScope, FilterOptions, FilterSpec, FilterValue};
pub use snapshot::FleetSnapshot;
pub use standards::{StandardsConfig, StandardsTable, DEFAULT_BUNDLE_NAME};
pub use vehicle::{OperationalStatus, Vehicle, VehicleId};

/// 找不到對應車輛時使用的連隊／位置標記
pub const UNKNOWN: &str = "unknown";

/// 戰備計算錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("標準配置錯誤: {0}")]
    Configuration(String),

    #[error("資料匯入錯誤: {0}")]
    Ingest(String),

    #[error("JSON 解析錯誤: {0}")]
    Json(#[from] serde_json::Error),

    #[error("其他錯誤: {0}")]
    Other(String),
}

impl From<csv::Error> for ReadinessError {
    fn from(err: csv::Error) -> Self {
        ReadinessError::Ingest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReadinessError>;

/// 空白欄位一律視為未知
pub fn label_or_unknown(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN
    } else {
        trimmed
    }
}
