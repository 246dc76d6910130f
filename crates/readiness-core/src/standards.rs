//! 彈藥標準配置

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::ammo::AmmoType;
use crate::{ReadinessError, Result};

/// 預設組合彈藥名稱
pub const DEFAULT_BUNDLE_NAME: &str = "Calanit+Halul+Hatzav";

fn default_bundle_name() -> String {
    DEFAULT_BUNDLE_NAME.to_string()
}

/// 彈藥標準配置（未驗證的原始設定，可由 JSON 載入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardsConfig {
    /// 獨立彈藥的每車標準
    pub standards: BTreeMap<AmmoType, i64>,

    /// 組合彈藥名稱
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,

    /// 組合彈藥成員（共用同一個合併標準）
    #[serde(default)]
    pub bundle_members: Vec<AmmoType>,

    /// 組合彈藥的每車合併標準（不是成員標準的總和）
    #[serde(default)]
    pub bundle_standard: i64,

    /// 顯示用縮放倍數（例如 5.56 以千發為單位）
    #[serde(default)]
    pub display_scales: BTreeMap<AmmoType, u32>,
}

impl StandardsConfig {
    /// 創建空白配置
    pub fn new() -> Self {
        Self {
            standards: BTreeMap::new(),
            bundle_name: default_bundle_name(),
            bundle_members: Vec::new(),
            bundle_standard: 0,
            display_scales: BTreeMap::new(),
        }
    }

    /// 營級預設標準
    pub fn battalion_default() -> Self {
        Self::new()
            .with_standard("hetz", 3)
            .with_standard("barzel", 10)
            .with_standard("regular_556", 990)
            .with_standard("mag", 30)
            .with_standard("nafetiz60", 21)
            .with_standard("teura60", 9)
            .with_standard("meducut", 12)
            .with_bundle(DEFAULT_BUNDLE_NAME, &["calanit", "halul", "hatzav"], 27)
            .with_display_scale("regular_556", 1000)
    }

    /// 從 JSON 文件載入
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 建構器模式：設置獨立彈藥標準
    pub fn with_standard(mut self, ammo_type: &str, standard: i64) -> Self {
        self.standards.insert(AmmoType::new(ammo_type), standard);
        self
    }

    /// 建構器模式：設置組合彈藥
    pub fn with_bundle(mut self, name: &str, members: &[&str], standard: i64) -> Self {
        self.bundle_name = name.to_string();
        self.bundle_members = members.iter().map(|m| AmmoType::new(m)).collect();
        self.bundle_standard = standard;
        self
    }

    /// 建構器模式：設置顯示縮放倍數
    pub fn with_display_scale(mut self, ammo_type: &str, divisor: u32) -> Self {
        self.display_scales.insert(AmmoType::new(ammo_type), divisor);
        self
    }

    /// 驗證配置
    pub fn validate(&self) -> Result<()> {
        if self.standards.is_empty() {
            return Err(ReadinessError::Configuration(
                "至少需要一種獨立彈藥標準".to_string(),
            ));
        }

        for (ammo_type, standard) in &self.standards {
            if ammo_type.as_str().is_empty() {
                return Err(ReadinessError::Configuration(
                    "彈藥種類名稱不可為空".to_string(),
                ));
            }
            if *standard < 0 || *standard > i64::from(u32::MAX) {
                return Err(ReadinessError::Configuration(format!(
                    "彈藥 {} 的標準無效: {}",
                    ammo_type, standard
                )));
            }
        }

        if self.bundle_name.trim().is_empty() {
            return Err(ReadinessError::Configuration(
                "組合彈藥名稱不可為空".to_string(),
            ));
        }

        let members: BTreeSet<&AmmoType> = self.bundle_members.iter().collect();
        if members.len() < 2 || members.len() != self.bundle_members.len() {
            return Err(ReadinessError::Configuration(format!(
                "組合彈藥 {} 需要至少兩個不重複的成員",
                self.bundle_name
            )));
        }

        if let Some(overlap) = self
            .bundle_members
            .iter()
            .find(|m| self.standards.contains_key(*m))
        {
            return Err(ReadinessError::Configuration(format!(
                "彈藥 {} 不可同時為獨立彈藥與組合成員",
                overlap
            )));
        }

        if self.bundle_standard < 0 || self.bundle_standard > i64::from(u32::MAX) {
            return Err(ReadinessError::Configuration(format!(
                "組合彈藥 {} 的標準無效: {}",
                self.bundle_name, self.bundle_standard
            )));
        }

        if let Some((ammo_type, _)) = self.display_scales.iter().find(|(_, d)| **d == 0) {
            return Err(ReadinessError::Configuration(format!(
                "彈藥 {} 的顯示縮放倍數必須大於 0",
                ammo_type
            )));
        }

        Ok(())
    }
}

impl Default for StandardsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 已驗證的標準表（注入計算器使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardsTable {
    standards: BTreeMap<AmmoType, u32>,
    bundle_name: String,
    bundle_members: Vec<AmmoType>,
    bundle_standard: u32,
    display_scales: BTreeMap<AmmoType, u32>,
}

impl StandardsTable {
    /// 驗證配置並建立標準表（配置錯誤時立即失敗）
    pub fn new(config: StandardsConfig) -> Result<Self> {
        config.validate()?;

        let standards = config
            .standards
            .into_iter()
            .map(|(ammo_type, standard)| {
                u32::try_from(standard)
                    .map(|s| (ammo_type, s))
                    .map_err(|e| ReadinessError::Configuration(e.to_string()))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let bundle_standard = u32::try_from(config.bundle_standard)
            .map_err(|e| ReadinessError::Configuration(e.to_string()))?;

        Ok(Self {
            standards,
            bundle_name: config.bundle_name,
            bundle_members: config.bundle_members,
            bundle_standard,
            display_scales: config.display_scales,
        })
    }

    /// 營級預設標準表
    pub fn battalion_default() -> Self {
        let config = StandardsConfig::battalion_default();
        Self {
            standards: config
                .standards
                .into_iter()
                .map(|(t, s)| (t, s as u32))
                .collect(),
            bundle_name: config.bundle_name,
            bundle_members: config.bundle_members,
            bundle_standard: config.bundle_standard as u32,
            display_scales: config.display_scales,
        }
    }

    /// 確認必要的彈藥種類都有標準
    pub fn require_types(&self, required: &[AmmoType]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|t| !self.standards.contains_key(*t) && !self.is_bundled(t))
            .map(AmmoType::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReadinessError::Configuration(format!(
                "缺少彈藥標準: {}",
                missing.join(", ")
            )))
        }
    }

    /// 獨立彈藥的每車標準（組合成員回傳 None）
    pub fn standard_for(&self, ammo_type: &AmmoType) -> Option<u32> {
        self.standards.get(ammo_type).copied()
    }

    /// 是否為組合彈藥成員
    pub fn is_bundled(&self, ammo_type: &AmmoType) -> bool {
        self.bundle_members.contains(ammo_type)
    }

    pub fn bundle_members(&self) -> &[AmmoType] {
        &self.bundle_members
    }

    pub fn bundle_standard(&self) -> u32 {
        self.bundle_standard
    }

    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// 所有獨立彈藥種類（依名稱排序）
    pub fn independent_types(&self) -> impl Iterator<Item = &AmmoType> {
        self.standards.keys()
    }

    /// 獨立彈藥與組合成員（依名稱排序）
    pub fn all_types(&self) -> Vec<&AmmoType> {
        let mut types: Vec<&AmmoType> = self
            .standards
            .keys()
            .chain(self.bundle_members.iter())
            .collect();
        types.sort();
        types
    }

    /// 顯示縮放倍數（未設定時為 1）
    pub fn display_scale(&self, ammo_type: &AmmoType) -> u32 {
        self.display_scales.get(ammo_type).copied().unwrap_or(1)
    }
}
