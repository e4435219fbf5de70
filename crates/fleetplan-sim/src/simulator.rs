//! 模擬介入與層級連動重算

use fleetplan_core::{
    Cycle, CycleCatalog, CycleProjection, FleetError, MonthProjection, ProjectionSource, Result,
};
use rust_decimal::Decimal;

use crate::markers::{SimulatedIntervention, SimulationSet};

/// 介入模擬器
///
/// 純函數：不保存任何狀態，標記集合由呼叫方傳入與接收。
pub struct InterventionSimulator<'a> {
    fleet_type: String,
    cycles: &'a [Cycle],
}

/// 某個月份生效的歸零點
#[derive(Debug, Clone, Copy)]
struct Reset<'m> {
    month_index: u32,
    rank: u32,
    by: &'m str,
}

impl<'a> InterventionSimulator<'a> {
    /// 為指定車隊建立模擬器
    pub fn new(catalog: &'a CycleCatalog, fleet_type: &str) -> Result<Self> {
        Ok(Self {
            fleet_type: fleet_type.to_string(),
            cycles: catalog.cycles_for(fleet_type)?,
        })
    }

    /// 車隊類型
    pub fn fleet_type(&self) -> &str {
        &self.fleet_type
    }

    /// 切換模擬介入標記
    ///
    /// - 完全相同的標記已存在：移除（復原）
    /// - 否則：取代同一 `(車組, 週期)` 的舊標記
    ///
    /// 回傳更新後的完整集合，不修改傳入的集合。
    pub fn toggle(
        &self,
        set: &SimulationSet,
        unit_id: &str,
        cycle_code: &str,
        month_index: u32,
    ) -> Result<SimulationSet> {
        if self.rank_of(cycle_code).is_none() {
            return Err(FleetError::ToggleOnUnknownCycle {
                fleet_type: self.fleet_type.clone(),
                cycle_code: cycle_code.to_string(),
            });
        }

        let marker = SimulatedIntervention::new(
            unit_id.to_string(),
            cycle_code.to_string(),
            month_index,
        );

        let mut next = set.clone();
        if next.contains(&marker) {
            tracing::debug!("移除模擬介入: {} {} 第 {} 月", unit_id, cycle_code, month_index);
            next.remove(&marker);
        } else {
            tracing::debug!("設定模擬介入: {} {} 第 {} 月", unit_id, cycle_code, month_index);
            next.replace(marker);
        }

        Ok(next)
    }

    /// 套用模擬介入，重算車組的推算列
    ///
    /// 標記在週期 `c` 第 `m` 月時，`c` 本身與所有層級低於 `c` 的週期
    /// 在第 `m` 月歸零，之後以月平均里程重新累計；層級高於 `c` 的週期不受影響。
    /// 同一列受多個標記影響時，最晚的標記從它的月份起生效
    /// （同月份時層級較高者優先）。
    ///
    /// `rows` 應為未套用模擬的純推算結果；相同輸入重複呼叫結果相同。
    pub fn apply(
        &self,
        unit_id: &str,
        rows: &[CycleProjection],
        set: &SimulationSet,
        rate: Decimal,
    ) -> Vec<CycleProjection> {
        let markers = set.markers_for(unit_id);
        if markers.is_empty() {
            return rows.to_vec();
        }

        let resets: Vec<Reset> = markers
            .into_iter()
            .filter_map(|marker| match self.rank_of(&marker.cycle_code) {
                Some(rank) => Some(Reset {
                    month_index: marker.month_index,
                    rank,
                    by: marker.cycle_code.as_str(),
                }),
                None => {
                    tracing::warn!(
                        "車組 {} 的模擬標記 {} 不在車隊 {} 的週期目錄中，已忽略",
                        unit_id,
                        marker.cycle_code,
                        self.fleet_type
                    );
                    None
                }
            })
            .collect();

        rows.iter()
            .map(|row| Self::apply_row(row, &resets, rate))
            .collect()
    }

    fn apply_row(row: &CycleProjection, resets: &[Reset], rate: Decimal) -> CycleProjection {
        // 只有自己或較高層級的標記會影響這一列
        let relevant: Vec<&Reset> = resets.iter().filter(|r| r.rank >= row.rank).collect();

        let mut result = row.clone();
        if relevant.is_empty() {
            return result;
        }

        result.months = row
            .months
            .iter()
            .map(|month| match Self::governing_reset(&relevant, month.month_index) {
                Some(reset) => Self::reset_month(month, reset, rate, row.distance_threshold),
                None => month.clone(),
            })
            .collect();

        result
    }

    /// 在該月份已生效且最晚的歸零點
    fn governing_reset<'r, 'm>(
        relevant: &[&'r Reset<'m>],
        month_index: u32,
    ) -> Option<&'r Reset<'m>> {
        relevant
            .iter()
            .copied()
            .filter(|r| r.month_index <= month_index)
            .max_by(|a, b| {
                a.month_index
                    .cmp(&b.month_index)
                    .then(a.rank.cmp(&b.rank))
            })
    }

    fn reset_month(
        month: &MonthProjection,
        reset: &Reset,
        rate: Decimal,
        threshold: Decimal,
    ) -> MonthProjection {
        let elapsed = month.month_index - reset.month_index;
        // 超出 Decimal 範圍時停在上限
        let accumulated = rate.saturating_mul(Decimal::from(elapsed));
        let source = if elapsed == 0 {
            ProjectionSource::SimulatedReset {
                by: reset.by.to_string(),
            }
        } else {
            ProjectionSource::SimulatedProjection {
                by: reset.by.to_string(),
            }
        };

        MonthProjection {
            accumulated_since_reference: accumulated,
            is_due: accumulated >= threshold,
            source,
            ..month.clone()
        }
    }

    fn rank_of(&self, cycle_code: &str) -> Option<u32> {
        self.cycles
            .iter()
            .find(|c| c.code == cycle_code)
            .map(|c| c.rank)
    }
}
