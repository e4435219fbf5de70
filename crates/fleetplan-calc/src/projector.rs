//! 逐月里程推算
//!
//! 第 0 個月只累計今天到月底的比例里程，之後每月加上完整的月平均里程。

use chrono::NaiveDate;
use fleetplan_core::calendar::{
    days_in_month, month_label, month_start, month_start_at, remaining_days_in_month,
};
use fleetplan_core::{
    Cycle, CycleProjection, DataQuality, EffectiveReference, FleetError, MonthProjection,
    ProjectionSource, Result,
};
use rust_decimal::Decimal;

/// 月份推算器
pub struct MonthProjector;

impl MonthProjector {
    /// 推算單一 `(車組, 週期)` 的 `horizon` 個月
    ///
    /// 目前里程小於基準里程時歸零並標記資料品質，不視為失敗。
    /// 里程累計超出 `Decimal` 範圍時回傳 `DistanceOverflow`。
    pub fn project(
        unit_id: &str,
        current_distance: Decimal,
        cycle: &Cycle,
        effective: EffectiveReference,
        rate: Decimal,
        horizon: u32,
        today: NaiveDate,
    ) -> Result<CycleProjection> {
        if horizon == 0 {
            return Err(FleetError::InvalidHorizon(horizon));
        }
        if rate <= Decimal::ZERO {
            return Err(FleetError::InvalidRate(rate));
        }

        let overflow = || FleetError::DistanceOverflow {
            unit_id: unit_id.to_string(),
            cycle_code: cycle.code.clone(),
        };

        let raw = current_distance
            .checked_sub(effective.distance)
            .ok_or_else(overflow)?;
        let (starting, data_quality) = if raw < Decimal::ZERO {
            tracing::warn!(
                "車組 {} 週期 {}: 目前里程 {} 小於基準里程 {}，以 0 計算",
                unit_id,
                cycle.code,
                current_distance,
                effective.distance
            );
            (
                Decimal::ZERO,
                Some(DataQuality::NegativeAccumulation { shortfall: -raw }),
            )
        } else {
            (raw, None)
        };

        let first_source = if month_start(effective.event_date) == month_start(today) {
            ProjectionSource::Reference
        } else {
            ProjectionSource::Projected
        };

        let mut row = CycleProjection::new(cycle, effective);
        row.data_quality = data_quality;
        row.months = Vec::with_capacity(horizon as usize);

        let mut accumulated = Self::prorated_increment(rate, today)
            .and_then(|increment| starting.checked_add(increment))
            .ok_or_else(overflow)?;

        for month_index in 0..horizon {
            if month_index > 0 {
                accumulated = accumulated.checked_add(rate).ok_or_else(overflow)?;
            }

            let start = month_start_at(today, month_index)?;
            let source = if month_index == 0 {
                first_source.clone()
            } else {
                ProjectionSource::Projected
            };

            row.months.push(MonthProjection {
                month_index,
                month_start: start,
                calendar_label: month_label(start),
                accumulated_since_reference: accumulated,
                is_due: cycle.is_distance_due(accumulated),
                source,
            });
        }

        tracing::debug!(
            "車組 {} 週期 {}: 第 0 月 {:?}，首次到期 {:?}",
            unit_id,
            cycle.code,
            row.months.first().map(|m| m.accumulated_since_reference),
            row.first_due_month().map(|m| m.month_index)
        );

        Ok(row)
    }

    /// 第 0 個月的比例里程：剩餘天數（含今天）/ 當月天數 × 月平均里程
    ///
    /// 溢出時回傳 None。
    pub fn prorated_increment(rate: Decimal, today: NaiveDate) -> Option<Decimal> {
        rate.checked_mul(Decimal::from(remaining_days_in_month(today)))?
            .checked_div(Decimal::from(days_in_month(today)))
    }
}
