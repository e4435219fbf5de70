//! 推算配置模型

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CSR, TOSHIBA};
use crate::{FleetError, Result};

/// 預設推算月數
pub const DEFAULT_HORIZON: u32 = 18;

/// 推算月數上限
pub const MAX_HORIZON: u32 = 60;

/// 月平均里程上限（預設）
pub const MAX_MONTHLY_DISTANCE: i64 = 1_000_000;

fn default_max_monthly_distance() -> Decimal {
    Decimal::from(MAX_MONTHLY_DISTANCE)
}

/// 單一車隊的推算參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSettings {
    /// 月平均里程
    pub average_monthly_distance: Decimal,

    /// 日平均里程（用於估算下次介入日期）
    pub average_daily_distance: Decimal,

    /// 緊急度排名預設筆數
    pub ranking_size: usize,
}

impl FleetSettings {
    /// 創建新的車隊參數
    pub fn new(average_monthly_distance: Decimal, average_daily_distance: Decimal) -> Self {
        Self {
            average_monthly_distance,
            average_daily_distance,
            ranking_size: 24,
        }
    }

    /// 建構器模式：設置排名筆數
    pub fn with_ranking_size(mut self, size: usize) -> Self {
        self.ranking_size = size;
        self
    }
}

/// 推算配置（各車隊平均里程與推算月數）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// 預設推算月數
    pub default_horizon: u32,

    /// 推算月數上限
    pub max_horizon: u32,

    /// 月平均里程上限（請求覆寫值不得超過）
    #[serde(default = "default_max_monthly_distance")]
    pub max_monthly_distance: Decimal,

    /// 車隊類型 → 參數
    pub fleets: BTreeMap<String, FleetSettings>,
}

/// 單次請求驗證後的參數
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    pub fleet_type: String,
    pub horizon: u32,
    pub average_monthly_distance: Decimal,
    pub ranking_size: usize,
}

impl ProjectionConfig {
    /// 創建空配置（無車隊）
    pub fn new() -> Self {
        Self {
            default_horizon: DEFAULT_HORIZON,
            max_horizon: MAX_HORIZON,
            max_monthly_distance: default_max_monthly_distance(),
            fleets: BTreeMap::new(),
        }
    }

    /// 標準配置：CSR 每月約 12,000 km，Toshiba 每月約 8,000 km
    pub fn standard() -> Self {
        Self::new()
            .with_fleet(
                CSR.to_string(),
                FleetSettings::new(Decimal::from(12_000), Decimal::from(392))
                    .with_ranking_size(24),
            )
            .with_fleet(
                TOSHIBA.to_string(),
                FleetSettings::new(Decimal::from(8_000), Decimal::from(260))
                    .with_ranking_size(12),
            )
    }

    /// 從 JSON 文件載入配置
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FleetError::Config(e.to_string()))?;

        if config.default_horizon == 0 || config.default_horizon > config.max_horizon {
            return Err(FleetError::Config(format!(
                "預設推算月數 {} 超出範圍 1..={}",
                config.default_horizon, config.max_horizon
            )));
        }

        Ok(config)
    }

    /// 建構器模式：加入車隊參數
    pub fn with_fleet(mut self, fleet_type: String, settings: FleetSettings) -> Self {
        self.fleets.insert(fleet_type, settings);
        self
    }

    /// 建構器模式：設置預設推算月數
    pub fn with_default_horizon(mut self, horizon: u32) -> Self {
        self.default_horizon = horizon;
        self
    }

    /// 建構器模式：設置推算月數上限
    pub fn with_max_horizon(mut self, max: u32) -> Self {
        self.max_horizon = max;
        self
    }

    /// 建構器模式：設置月平均里程上限
    pub fn with_max_monthly_distance(mut self, max: Decimal) -> Self {
        self.max_monthly_distance = max;
        self
    }

    /// 查詢車隊參數
    pub fn fleet(&self, fleet_type: &str) -> Result<&FleetSettings> {
        self.fleets
            .get(fleet_type)
            .ok_or_else(|| FleetError::UnknownFleetType(fleet_type.to_string()))
    }

    /// 合併請求覆寫值並驗證
    ///
    /// 任何一項不合法即整個請求失敗，不做任何計算。
    pub fn resolve(
        &self,
        fleet_type: &str,
        horizon: Option<u32>,
        rate: Option<Decimal>,
    ) -> Result<ProjectionParams> {
        let settings = self.fleet(fleet_type)?;

        let horizon = horizon.unwrap_or(self.default_horizon);
        if horizon == 0 || horizon > self.max_horizon {
            return Err(FleetError::InvalidHorizon(horizon));
        }

        let rate = rate.unwrap_or(settings.average_monthly_distance);
        if rate <= Decimal::ZERO || rate > self.max_monthly_distance {
            return Err(FleetError::InvalidRate(rate));
        }

        Ok(ProjectionParams {
            fleet_type: fleet_type.to_string(),
            horizon,
            average_monthly_distance: rate,
            ranking_size: settings.ranking_size,
        })
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::standard()
    }
}
