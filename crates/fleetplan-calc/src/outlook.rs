//! 下次介入預估

use chrono::{Days, NaiveDate};
use fleetplan_core::{Cycle, EffectiveReference, FleetError, Result, UnitReference};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hierarchy::HierarchyResolver;

/// 最接近門檻的週期與預估日期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextIntervention {
    pub cycle_code: String,
    pub cycle_label: String,
    pub distance_threshold: Decimal,

    /// 自有效基準以來的里程
    pub distance_since_reference: Decimal,

    /// 距離門檻的剩餘里程（不小於 0）
    pub remaining_distance: Decimal,

    /// 以日平均里程估算的日期
    pub estimated_date: NaiveDate,

    pub effective_reference: EffectiveReference,
}

/// 估算車組的下次介入
///
/// 所有週期（含輕度週期）中取剩餘里程最少者，同值時取層級較高者；
/// 預估日期為 `today + ceil(剩餘里程 / 日平均里程)` 天。
/// 里程門檻為零的週期不參與比較。
pub fn next_intervention(
    unit: &UnitReference,
    cycles: &[Cycle],
    daily_rate: Decimal,
    today: NaiveDate,
) -> Result<Option<NextIntervention>> {
    if daily_rate <= Decimal::ZERO {
        return Err(FleetError::InvalidRate(daily_rate));
    }

    let resolved = HierarchyResolver::resolve(unit, cycles)?;

    let mut best: Option<(&Cycle, EffectiveReference, Decimal, Decimal)> = None;
    for effective in resolved {
        let Some(cycle) = cycles.iter().find(|c| c.code == effective.cycle_code) else {
            continue;
        };
        if cycle.distance_threshold <= Decimal::ZERO {
            continue;
        }

        let overflow = || FleetError::DistanceOverflow {
            unit_id: unit.unit_id.clone(),
            cycle_code: cycle.code.clone(),
        };
        let since = unit
            .current_distance
            .checked_sub(effective.distance)
            .ok_or_else(overflow)?
            .max(Decimal::ZERO);
        let remaining = cycle
            .distance_threshold
            .checked_sub(since)
            .ok_or_else(overflow)?
            .max(Decimal::ZERO);

        // 依層級降序走訪，嚴格較小才取代
        let closer = match &best {
            Some((_, _, _, best_remaining)) => remaining < *best_remaining,
            None => true,
        };
        if closer {
            best = Some((cycle, effective, since, remaining));
        }
    }

    let Some((cycle, effective_reference, since, remaining)) = best else {
        return Ok(None);
    };

    let days = remaining
        .checked_div(daily_rate)
        .and_then(|days| days.ceil().to_u64())
        .ok_or_else(|| {
            FleetError::InvalidDate(format!("無法換算天數: {remaining} / {daily_rate}"))
        })?;
    let estimated_date = today
        .checked_add_days(Days::new(days))
        .ok_or_else(|| FleetError::InvalidDate(format!("{today} + {days} 天溢出")))?;

    tracing::debug!(
        "車組 {} 下次介入: {} 剩餘 {}，預估 {}",
        unit.unit_id,
        cycle.code,
        remaining,
        estimated_date
    );

    Ok(Some(NextIntervention {
        cycle_code: cycle.code.clone(),
        cycle_label: cycle.label.clone(),
        distance_threshold: cycle.distance_threshold,
        distance_since_reference: since,
        remaining_distance: remaining,
        estimated_date,
        effective_reference,
    }))
}
