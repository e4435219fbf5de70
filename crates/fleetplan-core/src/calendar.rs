//! 月份日曆工具
//!
//! 推算以自然月為時間桶：第 0 個月是「今天」所在的月份，其後逐月遞增。

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{FleetError, Result};

/// 日曆間隔（週期的時間門檻）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarInterval {
    /// 固定天數（例如半月檢）
    Days(u32),
    /// 自然月數（例如年檢 = 12）
    Months(u32),
}

impl CalendarInterval {
    /// 從基準日期往後推算間隔
    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Days(days) => date.checked_add_days(Days::new(u64::from(days))),
            Self::Months(months) => date.checked_add_months(Months::new(months)),
        }
    }
}

/// 該日期所在月份的第一天
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// 該日期所在月份的天數
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = month_start(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        // 只有日期上限所在的十二月會溢出
        None => 31,
    }
}

/// 從錨點日期到月底的剩餘天數（含錨點當天）
pub fn remaining_days_in_month(date: NaiveDate) -> u32 {
    days_in_month(date) - date.day() + 1
}

/// 第 `offset` 個推算月的月初日期
pub fn month_start_at(anchor: NaiveDate, offset: u32) -> Result<NaiveDate> {
    month_start(anchor)
        .checked_add_months(Months::new(offset))
        .ok_or_else(|| FleetError::InvalidDate(format!("{anchor} + {offset} 個月溢出")))
}

/// 月份短標籤，例如 `Feb-26`
pub fn month_label(date: NaiveDate) -> String {
    format!("{}-{:02}", date.format("%b"), date.year().rem_euclid(100))
}

/// 推算網格的欄位標題
pub fn month_headers(anchor: NaiveDate, months: u32) -> Result<Vec<String>> {
    (0..months)
        .map(|offset| month_start_at(anchor, offset).map(month_label))
        .collect()
}
