//! 推算結果模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarInterval;
use crate::catalog::Cycle;

/// 有效基準的來源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceOrigin {
    /// 該週期自己的介入紀錄
    Recorded,
    /// 繼承較高層級週期的介入（`from` 為實際發生介入的週期）
    Inherited { from: String },
    /// 投入運營日期（里程為零）
    Commissioning,
    /// 最高層級週期從未記錄且無投入運營日期：里程以零計，
    /// 日期取該車組最早的一筆週期紀錄
    Untracked,
}

/// 套用層級覆蓋後的有效基準
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveReference {
    /// 週期代碼
    pub cycle_code: String,

    /// 基準日期
    pub event_date: NaiveDate,

    /// 基準里程
    pub distance: Decimal,

    /// 來源
    pub origin: ReferenceOrigin,
}

impl EffectiveReference {
    /// 實際發生介入的週期代碼（投入運營時為 None）
    pub fn source_cycle(&self) -> Option<&str> {
        match &self.origin {
            ReferenceOrigin::Recorded => Some(self.cycle_code.as_str()),
            ReferenceOrigin::Inherited { from } => Some(from.as_str()),
            ReferenceOrigin::Commissioning | ReferenceOrigin::Untracked => None,
        }
    }

    /// 是否繼承自較高層級週期
    pub fn is_inherited(&self) -> bool {
        matches!(self.origin, ReferenceOrigin::Inherited { .. })
    }
}

/// 單月數值來源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionSource {
    /// 純推算
    Projected,
    /// 本月內有實際介入（基準日期落在第 0 個月）
    Reference,
    /// 模擬介入歸零的月份（`by` 為標記所在週期）
    SimulatedReset { by: String },
    /// 模擬介入後重新累計的月份
    SimulatedProjection { by: String },
}

impl ProjectionSource {
    /// 是否來自模擬介入
    pub fn is_simulated(&self) -> bool {
        matches!(
            self,
            Self::SimulatedReset { .. } | Self::SimulatedProjection { .. }
        )
    }
}

/// 單月推算
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthProjection {
    /// 月份索引（0 = 今天所在月份）
    pub month_index: u32,

    /// 月初日期
    pub month_start: NaiveDate,

    /// 月份標籤，例如 `Feb-26`
    pub calendar_label: String,

    /// 自基準以來的累計里程（月底）
    pub accumulated_since_reference: Decimal,

    /// 是否已達里程門檻
    pub is_due: bool,

    /// 數值來源
    pub source: ProjectionSource,
}

/// 資料品質標記
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    /// 目前里程小於基準里程，已歸零處理
    NegativeAccumulation { shortfall: Decimal },
}

/// 單一週期的推算列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleProjection {
    /// 週期代碼
    pub cycle_code: String,

    /// 週期名稱
    pub cycle_label: String,

    /// 週期層級
    pub rank: u32,

    /// 里程門檻
    pub distance_threshold: Decimal,

    /// 時間門檻
    pub time_threshold: Option<CalendarInterval>,

    /// 依時間門檻推算的到期日（由呼叫方自行比對）
    pub calendar_due_date: Option<NaiveDate>,

    /// 有效基準
    pub effective_reference: EffectiveReference,

    /// 逐月推算（依月份索引遞增）
    pub months: Vec<MonthProjection>,

    /// 資料品質標記
    pub data_quality: Option<DataQuality>,
}

impl CycleProjection {
    /// 以週期定義與有效基準建立空的推算列
    pub fn new(cycle: &Cycle, effective_reference: EffectiveReference) -> Self {
        Self {
            cycle_code: cycle.code.clone(),
            cycle_label: cycle.label.clone(),
            rank: cycle.rank,
            distance_threshold: cycle.distance_threshold,
            time_threshold: cycle.time_threshold,
            calendar_due_date: cycle.calendar_due_date(effective_reference.event_date),
            effective_reference,
            months: Vec::new(),
            data_quality: None,
        }
    }

    /// 第一個到期月份
    pub fn first_due_month(&self) -> Option<&MonthProjection> {
        self.months.iter().find(|m| m.is_due)
    }

    /// 取得指定月份
    pub fn month(&self, month_index: u32) -> Option<&MonthProjection> {
        self.months.get(month_index as usize)
    }
}
