//! 緊急度排名
//!
//! 以層級最高的重保養週期為錨點，依「自有效基準以來的里程」由大到小排序。

use chrono::NaiveDate;
use fleetplan_core::{
    CycleCatalog, FleetError, ProjectionConfig, ReferenceOrigin, Result, UnitReference,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hierarchy::HierarchyResolver;
use crate::{GridWarning, UnitFailure};

/// 排名項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 名次（從 1 開始）
    pub rank_position: usize,

    /// 車組ID
    pub unit_id: String,

    /// 自錨點週期有效基準以來的里程（不小於 0）
    pub distance_since_reference: Decimal,

    /// 錨點週期的基準日期
    pub reference_date: NaiveDate,

    /// 錨點週期代碼
    pub reference_cycle_code: String,

    /// 基準來源
    pub reference_origin: ReferenceOrigin,
}

/// 車隊排名結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyRanking {
    pub fleet_type: String,
    pub anchor_cycle_code: String,
    pub entries: Vec<RankingEntry>,
    pub failures: Vec<UnitFailure>,
    pub warnings: Vec<GridWarning>,
}

/// 緊急度排名器
pub struct UrgencyRanker<'a> {
    catalog: &'a CycleCatalog,
    config: &'a ProjectionConfig,
}

impl<'a> UrgencyRanker<'a> {
    pub fn new(catalog: &'a CycleCatalog, config: &'a ProjectionConfig) -> Self {
        Self { catalog, config }
    }

    /// 排名車隊
    ///
    /// `count` 為 None 時使用車隊配置的排名筆數。
    /// 同里程時依車組ID遞增排序，結果可重現。
    pub fn rank(
        &self,
        fleet_type: &str,
        units: &[UnitReference],
        count: Option<usize>,
    ) -> Result<UrgencyRanking> {
        let cycles = self.catalog.cycles_for(fleet_type)?;
        let anchor = self.catalog.anchor_cycle_for(fleet_type)?;
        let count = match count {
            Some(count) => count,
            None => self.config.fleet(fleet_type)?.ranking_size,
        };

        tracing::info!(
            "開始排名車隊 {}：車組 {} 個，錨點週期 {}，取前 {} 名",
            fleet_type,
            units.len(),
            anchor.code,
            count
        );

        let mut candidates = Vec::with_capacity(units.len());
        let mut failures = Vec::new();
        let mut warnings = Vec::new();

        for unit in units {
            if unit.fleet_type != fleet_type {
                failures.push(UnitFailure::new(
                    unit.unit_id.clone(),
                    FleetError::UnknownFleetType(unit.fleet_type.clone()),
                ));
                continue;
            }

            let resolved = HierarchyResolver::resolve_cycle(unit, cycles, &anchor.code)
                .and_then(|effective| {
                    effective.ok_or_else(|| {
                        FleetError::InvalidCatalog(format!("錨點週期 {} 不在目錄中", anchor.code))
                    })
                })
                .and_then(|effective| {
                    unit.current_distance
                        .checked_sub(effective.distance)
                        .map(|raw| (effective, raw))
                        .ok_or_else(|| FleetError::DistanceOverflow {
                            unit_id: unit.unit_id.clone(),
                            cycle_code: anchor.code.clone(),
                        })
                });
            let (effective, raw) = match resolved {
                Ok(resolved) => resolved,
                Err(error) => {
                    tracing::warn!("車組 {} 無法排名: {}", unit.unit_id, error);
                    failures.push(UnitFailure::new(unit.unit_id.clone(), error));
                    continue;
                }
            };

            let distance_since_reference = if raw < Decimal::ZERO {
                let error = FleetError::NegativeAccumulation {
                    unit_id: unit.unit_id.clone(),
                    cycle_code: anchor.code.clone(),
                    current: unit.current_distance,
                    reference: effective.distance,
                };
                tracing::warn!("{}", error);
                warnings.push(GridWarning::warning(
                    unit.unit_id.clone(),
                    Some(anchor.code.clone()),
                    format!("{error}，以 0 排名"),
                ));
                Decimal::ZERO
            } else {
                raw
            };

            candidates.push(RankingEntry {
                rank_position: 0,
                unit_id: unit.unit_id.clone(),
                distance_since_reference,
                reference_date: effective.event_date,
                reference_cycle_code: anchor.code.clone(),
                reference_origin: effective.origin,
            });
        }

        candidates.sort_by(|a, b| {
            b.distance_since_reference
                .cmp(&a.distance_since_reference)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        candidates.truncate(count);

        for (position, entry) in candidates.iter_mut().enumerate() {
            entry.rank_position = position + 1;
        }

        tracing::debug!("車隊 {} 排名 {} 筆", fleet_type, candidates.len());

        Ok(UrgencyRanking {
            fleet_type: fleet_type.to_string(),
            anchor_cycle_code: anchor.code.clone(),
            entries: candidates,
            failures,
            warnings,
        })
    }
}
