//! 層級基準解析
//!
//! 較高層級週期的介入同時涵蓋所有較低層級週期：
//! 依層級降序處理，每個週期的有效基準取「自己的紀錄」與
//! 「上一層的有效基準」中日期較晚者（同日時上一層優先）。
//!
//! 層級最頂端沒有紀錄的週期以投入運營日期（里程 0）為基準；
//! 若也沒有投入運營日期，改以里程 0、該車組最早一筆週期紀錄的日期為基準
//! （`Untracked`），此基準不會蓋過任何實際紀錄。
//! 只有車組在所有週期都沒有紀錄且無投入運營日期時才失敗。

use fleetplan_core::{
    Cycle, CycleReference, EffectiveReference, FleetError, ReferenceOrigin, Result, UnitReference,
};
use rust_decimal::Decimal;

/// 層級基準解析器
pub struct HierarchyResolver;

impl HierarchyResolver {
    /// 解析車組在每個週期的有效基準
    ///
    /// 回傳順序為層級由高到低，與傳入週期是否排序無關。
    pub fn resolve(unit: &UnitReference, cycles: &[Cycle]) -> Result<Vec<EffectiveReference>> {
        let mut ordered: Vec<&Cycle> = cycles.iter().collect();
        ordered.sort_by(|a, b| b.rank.cmp(&a.rank));

        let mut resolved: Vec<EffectiveReference> = Vec::with_capacity(ordered.len());

        for cycle in ordered {
            let own = unit.reference_for(&cycle.code);
            let carried = resolved.last();

            let effective = match (own, carried) {
                (Some(own), Some(higher))
                    if higher.origin != ReferenceOrigin::Untracked
                        && higher.event_date >= own.event_date =>
                {
                    Self::inherit(cycle, higher)
                }
                (Some(own), _) => Self::recorded(cycle, own),
                (None, Some(higher)) => Self::inherit(cycle, higher),
                (None, None) => {
                    let (baseline, origin) = Self::baseline(unit, cycles)?;
                    EffectiveReference {
                        cycle_code: cycle.code.clone(),
                        event_date: baseline.event_date,
                        distance: baseline.distance,
                        origin,
                    }
                }
            };

            tracing::debug!(
                "車組 {} 週期 {} 有效基準: {} @ {} ({:?})",
                unit.unit_id,
                cycle.code,
                effective.distance,
                effective.event_date,
                effective.origin
            );

            resolved.push(effective);
        }

        Ok(resolved)
    }

    /// 解析單一週期的有效基準（仍需走完較高層級）
    pub fn resolve_cycle(
        unit: &UnitReference,
        cycles: &[Cycle],
        cycle_code: &str,
    ) -> Result<Option<EffectiveReference>> {
        Ok(Self::resolve(unit, cycles)?
            .into_iter()
            .find(|r| r.cycle_code == cycle_code))
    }

    /// 頂端沒有紀錄時的隱含基準
    fn baseline(
        unit: &UnitReference,
        cycles: &[Cycle],
    ) -> Result<(CycleReference, ReferenceOrigin)> {
        if let Some(commissioning) = unit.commissioning_reference() {
            return Ok((commissioning, ReferenceOrigin::Commissioning));
        }

        cycles
            .iter()
            .filter_map(|cycle| unit.reference_for(&cycle.code))
            .map(|reference| reference.event_date)
            .min()
            .map(|earliest| {
                tracing::warn!(
                    "車組 {} 無投入運營日期，未記錄的頂層週期以 {} 里程 0 為基準",
                    unit.unit_id,
                    earliest
                );
                (
                    CycleReference::new(earliest, Decimal::ZERO),
                    ReferenceOrigin::Untracked,
                )
            })
            .ok_or_else(|| FleetError::MissingBaseline {
                unit_id: unit.unit_id.clone(),
            })
    }

    fn recorded(cycle: &Cycle, own: &CycleReference) -> EffectiveReference {
        EffectiveReference {
            cycle_code: cycle.code.clone(),
            event_date: own.event_date,
            distance: own.distance,
            origin: ReferenceOrigin::Recorded,
        }
    }

    fn inherit(cycle: &Cycle, higher: &EffectiveReference) -> EffectiveReference {
        let origin = match &higher.origin {
            ReferenceOrigin::Recorded => ReferenceOrigin::Inherited {
                from: higher.cycle_code.clone(),
            },
            other => other.clone(),
        };

        EffectiveReference {
            cycle_code: cycle.code.clone(),
            event_date: higher.event_date,
            distance: higher.distance,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fleetplan_core::catalog::{CSR, TOSHIBA};
    use fleetplan_core::CycleCatalog;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reference(y: i32, m: u32, d: u32, distance: i64) -> CycleReference {
        CycleReference::new(date(y, m, d), Decimal::from(distance))
    }

    #[fixture]
    fn catalog() -> CycleCatalog {
        CycleCatalog::standard()
    }

    fn by_code<'r>(resolved: &'r [EffectiveReference], code: &str) -> &'r EffectiveReference {
        resolved.iter().find(|r| r.cycle_code == code).unwrap()
    }

    fn resolve(unit: &UnitReference, catalog: &CycleCatalog) -> Result<Vec<EffectiveReference>> {
        HierarchyResolver::resolve(unit, catalog.cycles_for(&unit.fleet_type).unwrap())
    }

    fn csr_unit(id: &str, current: i64) -> UnitReference {
        UnitReference::new(id.to_string(), CSR.to_string(), Decimal::from(current))
    }

    fn toshiba_unit(id: &str, current: i64) -> UnitReference {
        UnitReference::new(id.to_string(), TOSHIBA.to_string(), Decimal::from(current))
    }

    #[rstest]
    fn test_top_intervention_resets_every_lower_cycle(catalog: CycleCatalog) {
        let unit = csr_unit("M01", 1_490_000)
            .with_reference("DA".to_string(), reference(2025, 3, 10, 1_200_000))
            .with_reference("PE".to_string(), reference(2022, 1, 5, 800_000))
            .with_reference("AN".to_string(), reference(2024, 12, 1, 1_150_000));

        let resolved = resolve(&unit, &catalog).unwrap();

        assert_eq!(resolved.len(), 6);
        assert_eq!(resolved[0].origin, ReferenceOrigin::Recorded);
        let from_da = ReferenceOrigin::Inherited {
            from: "DA".to_string(),
        };
        for lower in &resolved[1..] {
            assert_eq!(lower.event_date, date(2025, 3, 10));
            assert_eq!(lower.distance, Decimal::from(1_200_000));
            assert_eq!(lower.origin, from_da);
        }
    }

    #[rstest]
    fn test_mid_tier_resets_only_below(catalog: CycleCatalog) {
        let unit = csr_unit("M02", 900_000)
            .with_reference("DA".to_string(), reference(2020, 6, 1, 0))
            .with_reference("PE".to_string(), reference(2021, 1, 1, 100_000))
            .with_reference("BA".to_string(), reference(2025, 2, 1, 850_000))
            .with_reference("IQ".to_string(), reference(2025, 5, 20, 880_000));

        let resolved = resolve(&unit, &catalog).unwrap();

        assert_eq!(by_code(&resolved, "DA").distance, Decimal::ZERO);
        assert_eq!(by_code(&resolved, "PE").distance, Decimal::from(100_000));
        assert_eq!(by_code(&resolved, "BA").origin, ReferenceOrigin::Recorded);

        let an = by_code(&resolved, "AN");
        assert_eq!(an.distance, Decimal::from(850_000));
        assert_eq!(an.source_cycle(), Some("BA"));
        assert_eq!(by_code(&resolved, "IB").source_cycle(), Some("BA"));

        // 自己的紀錄比上層新
        let iq = by_code(&resolved, "IQ");
        assert_eq!(iq.origin, ReferenceOrigin::Recorded);
        assert_eq!(iq.distance, Decimal::from(880_000));
    }

    #[rstest]
    fn test_same_day_prefers_higher_rank(catalog: CycleCatalog) {
        let unit = toshiba_unit("T01", 500_000)
            .with_reference("RG".to_string(), reference(2025, 4, 1, 480_000))
            .with_reference("RB".to_string(), reference(2025, 4, 1, 479_500));

        let resolved = resolve(&unit, &catalog).unwrap();

        let rb = by_code(&resolved, "RB");
        assert_eq!(rb.distance, Decimal::from(480_000));
        assert!(rb.is_inherited());
    }

    #[rstest]
    fn test_inherited_origin_names_actual_event(catalog: CycleCatalog) {
        let unit = csr_unit("M03", 400_000)
            .with_reference("PE".to_string(), reference(2025, 1, 15, 390_000))
            .with_commissioning_date(date(2018, 1, 1));

        let resolved = resolve(&unit, &catalog).unwrap();

        assert_eq!(by_code(&resolved, "DA").origin, ReferenceOrigin::Commissioning);
        // BA 繼承自 PE，AN 經由 BA 傳遞仍指向 PE
        assert_eq!(by_code(&resolved, "AN").source_cycle(), Some("PE"));
    }

    #[rstest]
    fn test_commissioning_default(catalog: CycleCatalog) {
        let unit = toshiba_unit("T02", 12_000).with_commissioning_date(date(2025, 11, 3));

        let resolved = resolve(&unit, &catalog).unwrap();

        for effective in &resolved {
            assert_eq!(effective.event_date, date(2025, 11, 3));
            assert_eq!(effective.distance, Decimal::ZERO);
            assert_eq!(effective.origin, ReferenceOrigin::Commissioning);
            assert_eq!(effective.source_cycle(), None);
        }
    }

    #[rstest]
    fn test_missing_baseline_without_any_record(catalog: CycleCatalog) {
        let unit = toshiba_unit("T03", 12_000);

        assert_eq!(
            resolve(&unit, &catalog).unwrap_err(),
            FleetError::MissingBaseline {
                unit_id: "T03".to_string()
            }
        );
    }

    #[rstest]
    fn test_lower_record_only_resolves_untracked_top(catalog: CycleCatalog) {
        let unit = toshiba_unit("T05", 62_000)
            .with_reference("RB".to_string(), reference(2025, 8, 1, 50_000));

        let resolved = resolve(&unit, &catalog).unwrap();

        let rg = by_code(&resolved, "RG");
        assert_eq!(rg.origin, ReferenceOrigin::Untracked);
        assert_eq!(rg.distance, Decimal::ZERO);
        assert_eq!(rg.event_date, date(2025, 8, 1));
        assert_eq!(rg.source_cycle(), None);

        // 同日的隱含基準不得蓋過實際紀錄
        let rb = by_code(&resolved, "RB");
        assert_eq!(rb.origin, ReferenceOrigin::Recorded);
        assert_eq!(rb.distance, Decimal::from(50_000));
        assert_eq!(by_code(&resolved, "MEN").source_cycle(), Some("RB"));
    }

    #[rstest]
    fn test_untracked_uses_earliest_record(catalog: CycleCatalog) {
        let unit = toshiba_unit("T06", 80_000)
            .with_reference("MEN".to_string(), reference(2024, 2, 1, 20_000))
            .with_reference("RB".to_string(), reference(2025, 8, 1, 50_000));

        let resolved = resolve(&unit, &catalog).unwrap();

        assert_eq!(by_code(&resolved, "RG").event_date, date(2024, 2, 1));
        // MEN 的紀錄早於 RB，改為繼承 RB
        assert_eq!(by_code(&resolved, "MEN").source_cycle(), Some("RB"));
    }

    #[rstest]
    fn test_resolve_cycle(catalog: CycleCatalog) {
        let unit = toshiba_unit("T04", 5_490_502)
            .with_reference("RG".to_string(), reference(2025, 9, 1, 5_468_568));
        let cycles = catalog.cycles_for(TOSHIBA).unwrap();

        let rb = HierarchyResolver::resolve_cycle(&unit, cycles, "RB").unwrap().unwrap();
        assert_eq!(rb.distance, Decimal::from(5_468_568));

        let none = HierarchyResolver::resolve_cycle(&unit, cycles, "DA").unwrap();
        assert!(none.is_none());
    }

    proptest! {
        #[test]
        fn prop_effective_dates_never_decrease_down_the_hierarchy(
            offsets in prop::collection::vec(prop::option::of(0u32..3_000), 6)
        ) {
            let catalog = CycleCatalog::standard();
            let cycles = catalog.cycles_for(CSR).unwrap();
            let base = date(2015, 1, 1);

            let mut unit = csr_unit("P01", 2_000_000).with_commissioning_date(base);
            for (cycle, offset) in cycles.iter().zip(&offsets) {
                if let Some(days) = offset {
                    let when = base + chrono::Days::new(u64::from(*days));
                    unit = unit.with_reference(
                        cycle.code.clone(),
                        CycleReference::new(when, Decimal::from(*days) * Decimal::from(300)),
                    );
                }
            }

            let resolved = HierarchyResolver::resolve(&unit, cycles).unwrap();
            for pair in resolved.windows(2) {
                prop_assert!(pair[1].event_date >= pair[0].event_date);
                if pair[1].event_date == pair[0].event_date {
                    prop_assert_eq!(pair[1].distance, pair[0].distance);
                }
            }
        }
    }
}
