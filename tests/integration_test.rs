//! 集成測試

use chrono::NaiveDate;
use fleetplan::core::catalog::{CSR, TOSHIBA};
use fleetplan::{
    Cycle, CycleCatalog, CycleReference, FleetError, GridCalculator, InMemoryReferenceProvider,
    ProjectionConfig, ProjectionRequest, ProjectionSource, ReferenceOrigin, SimulationSet,
    UnitReference,
};
use rstest::{fixture, rstest};
use rust_decimal::Decimal;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[fixture]
fn calculator() -> GridCalculator {
    GridCalculator::standard()
}

#[rstest]
fn test_csr_fleet_scenario(calculator: GridCalculator) {
    // 場景：DA 門檻 1,500,000，基準 1,200,000，目前 1,490,000，月平均 12,000
    // 今天 6/16，六月剩 15/30 天
    let unit = UnitReference::new("M01".to_string(), CSR.to_string(), Decimal::from(1_490_000))
        .with_reference(
            "DA".to_string(),
            CycleReference::new(date(2021, 3, 1), Decimal::from(1_200_000)),
        );
    let request = ProjectionRequest::new(CSR.to_string(), date(2026, 6, 16));

    let grid = calculator.project_fleet(&request, &[unit]).unwrap();

    assert_eq!(grid.horizon, 18);
    assert_eq!(grid.month_headers.len(), 18);
    assert_eq!(grid.month_headers[0], "Jun-26");

    let da = grid.units[0].row("DA").unwrap();
    assert_eq!(da.distance_threshold, Decimal::from(1_500_000));
    assert_eq!(da.months[0].accumulated_since_reference, Decimal::from(296_000));
    assert_eq!(da.months[1].accumulated_since_reference, Decimal::from(308_000));
    assert!(!da.months[0].is_due);
    assert!(!da.months[1].is_due);

    // 四個重保養週期，層級由高到低
    let codes: Vec<&str> = grid.units[0]
        .rows
        .iter()
        .map(|r| r.cycle_code.as_str())
        .collect();
    assert_eq!(codes, vec!["DA", "PE", "BA", "AN"]);

    // AN 門檻 187,500：第 0 個月已到期，之後一直到期
    let an = grid.units[0].row("AN").unwrap();
    assert!(an.months.iter().all(|m| m.is_due));
}

#[rstest]
fn test_toshiba_fleet_scenario(calculator: GridCalculator) {
    let unit = UnitReference::new("T09".to_string(), TOSHIBA.to_string(), Decimal::from(5_490_502))
        .with_reference(
            "RG".to_string(),
            CycleReference::new(date(2025, 12, 4), Decimal::from(5_468_568)),
        )
        .with_reference(
            "RB".to_string(),
            CycleReference::new(date(2023, 2, 20), Decimal::from(4_900_000)),
        );

    let ranking = calculator.ranker().rank(TOSHIBA, &[unit.clone()], None).unwrap();
    assert_eq!(ranking.entries[0].distance_since_reference, Decimal::from(21_934));
    assert_eq!(ranking.entries[0].reference_cycle_code, "RG");

    // 今天是月初，第 0 個月加上完整月平均里程
    let today = date(2026, 3, 1);
    let request = ProjectionRequest::new(TOSHIBA.to_string(), today).with_horizon(6);
    let grid = calculator.project_fleet(&request, &[unit.clone()]).unwrap();

    let rg = grid.units[0].row("RG").unwrap();
    let rb = grid.units[0].row("RB").unwrap();
    assert_eq!(
        rb.effective_reference.origin,
        ReferenceOrigin::Inherited {
            from: "RG".to_string()
        }
    );
    assert_eq!(
        rb.months[0].accumulated_since_reference,
        Decimal::from(21_934 + 8_000)
    );
    assert_eq!(rb.months, rg.months);

    // RB 自己的標記生效後才與 RG 分開
    let set = calculator
        .simulator(TOSHIBA)
        .unwrap()
        .toggle(&SimulationSet::new(), "T09", "RB", 2)
        .unwrap();
    let simulated = calculator
        .project_fleet(&request.clone().with_simulations(set), &[unit])
        .unwrap();
    let rb = simulated.units[0].row("RB").unwrap();
    let rg = simulated.units[0].row("RG").unwrap();
    assert_eq!(rb.months[1].accumulated_since_reference, Decimal::from(37_934));
    assert_eq!(rb.months[2].accumulated_since_reference, Decimal::ZERO);
    assert_eq!(rg.months[2].accumulated_since_reference, Decimal::from(45_934));
}

#[rstest]
fn test_toggle_cascade_scenario(calculator: GridCalculator) {
    let unit = UnitReference::new("M05".to_string(), CSR.to_string(), Decimal::from(820_000))
        .with_commissioning_date(date(2019, 5, 1))
        .with_reference(
            "PE".to_string(),
            CycleReference::new(date(2022, 8, 1), Decimal::from(400_000)),
        );
    let today = date(2026, 9, 1);
    let simulator = calculator.simulator(CSR).unwrap();

    let baseline_request = ProjectionRequest::new(CSR.to_string(), today).with_horizon(8);
    let baseline = calculator.project_unit(&baseline_request, &unit).unwrap();

    let set = simulator.toggle(&SimulationSet::new(), "M05", "PE", 3).unwrap();
    let request = baseline_request.clone().with_simulations(set.clone());
    let simulated = calculator.project_unit(&request, &unit).unwrap();

    for code in ["PE", "BA", "AN"] {
        let row = simulated.row(code).unwrap();
        assert_eq!(row.months[3].accumulated_since_reference, Decimal::ZERO);
        assert_eq!(
            row.months[3].source,
            ProjectionSource::SimulatedReset {
                by: "PE".to_string()
            }
        );
        for i in 4..8 {
            assert_eq!(
                row.months[i].accumulated_since_reference,
                Decimal::from(12_000 * (i as i64 - 3))
            );
        }
        assert_eq!(row.months[..3], baseline.row(code).unwrap().months[..3]);
    }

    // DA 不受影響
    assert_eq!(simulated.row("DA"), baseline.row("DA"));

    // 再切換一次即復原
    let undone = simulator.toggle(&set, "M05", "PE", 3).unwrap();
    assert!(undone.is_empty());
    let restored = calculator
        .project_unit(&baseline_request.with_simulations(undone), &unit)
        .unwrap();
    assert_eq!(restored, baseline);
}

#[rstest]
fn test_unknown_cycle_toggle_leaves_set_unchanged(calculator: GridCalculator) {
    let simulator = calculator.simulator(TOSHIBA).unwrap();
    let set = simulator.toggle(&SimulationSet::new(), "T01", "RB", 1).unwrap();

    let result = simulator.toggle(&set, "T01", "DA", 1);

    assert_eq!(
        result.unwrap_err(),
        FleetError::ToggleOnUnknownCycle {
            fleet_type: TOSHIBA.to_string(),
            cycle_code: "DA".to_string()
        }
    );
    assert_eq!(set.len(), 1);
}

#[rstest]
fn test_ranking_stability(calculator: GridCalculator) {
    let provider = (1..=40).fold(InMemoryReferenceProvider::new(), |provider, i| {
        let current = Decimal::from(900_000 + (i % 7) * 10_000);
        provider.with_unit(
            UnitReference::new(format!("M{i:02}"), CSR.to_string(), current)
                .with_commissioning_date(date(2018, 1, 1)),
        )
    });
    let units = fleetplan::UnitReferenceProvider::units_for(&provider, CSR).unwrap();

    let first = calculator.ranker().rank(CSR, &units, None).unwrap();
    let mut reversed = units.clone();
    reversed.reverse();
    let second = calculator.ranker().rank(CSR, &reversed, None).unwrap();

    assert_eq!(first.entries.len(), 24);
    assert_eq!(first, second);
    for pair in first.entries.windows(2) {
        assert!(
            pair[0].distance_since_reference > pair[1].distance_since_reference
                || (pair[0].distance_since_reference == pair[1].distance_since_reference
                    && pair[0].unit_id < pair[1].unit_id)
        );
    }
}

#[test]
fn test_custom_catalog_and_config() {
    let catalog = CycleCatalog::new()
        .with_fleet(
            "Talgo".to_string(),
            vec![
                Cycle::new("R1".to_string(), Decimal::from(50_000), 1).heavy(),
                Cycle::new("R2".to_string(), Decimal::from(200_000), 2).heavy(),
            ],
        )
        .unwrap();
    let config = ProjectionConfig::from_json(
        r#"{
            "default_horizon": 4,
            "max_horizon": 24,
            "fleets": {
                "Talgo": {
                    "average_monthly_distance": "15000",
                    "average_daily_distance": "500",
                    "ranking_size": 5
                }
            }
        }"#,
    )
    .unwrap();
    let calculator = GridCalculator::new(catalog, config);

    let unit = UnitReference::new("X1".to_string(), "Talgo".to_string(), Decimal::from(40_000))
        .with_commissioning_date(date(2026, 1, 1));
    let request = ProjectionRequest::new("Talgo".to_string(), date(2026, 2, 1));
    let grid = calculator.project_fleet(&request, &[unit]).unwrap();

    assert_eq!(grid.horizon, 4);
    let r1 = grid.units[0].row("R1").unwrap();
    assert_eq!(r1.first_due_month().map(|m| m.month_index), Some(0));
    assert_eq!(grid.units[0].rows[0].cycle_code, "R2");

    let over_cap = request.with_horizon(25);
    assert_eq!(
        calculator.project_fleet(&over_cap, &[]).unwrap_err(),
        FleetError::InvalidHorizon(25)
    );
}

#[test]
fn test_grid_serializes_for_export() {
    let calculator = GridCalculator::standard();
    let unit = UnitReference::new("T01".to_string(), TOSHIBA.to_string(), Decimal::from(100_000))
        .with_commissioning_date(date(2024, 1, 1));
    let request = ProjectionRequest::new(TOSHIBA.to_string(), date(2026, 1, 1)).with_horizon(2);

    let grid = calculator.project_fleet(&request, &[unit]).unwrap();
    let json = serde_json::to_value(&grid).unwrap();

    assert_eq!(json["fleet_type"], "Toshiba");
    assert_eq!(json["units"][0]["rows"][0]["cycle_code"], "RG");
    assert_eq!(json["units"][0]["rows"][0]["months"][1]["calendar_label"], "Feb-26");
}

#[rstest]
fn test_unit_with_only_lower_record(calculator: GridCalculator) {
    let unit = UnitReference::new("T12".to_string(), TOSHIBA.to_string(), Decimal::from(310_000))
        .with_reference(
            "RB".to_string(),
            CycleReference::new(date(2024, 5, 2), Decimal::from(10_000)),
        );
    let request = ProjectionRequest::new(TOSHIBA.to_string(), date(2026, 5, 1)).with_horizon(2);

    let grid = calculator.project_fleet(&request, &[unit.clone()]).unwrap();
    assert!(grid.failures.is_empty());
    let rb = grid.units[0].row("RB").unwrap();
    assert_eq!(rb.effective_reference.origin, ReferenceOrigin::Recorded);
    assert!(rb.months[0].is_due);

    let ranking = calculator.ranker().rank(TOSHIBA, &[unit], None).unwrap();
    assert!(ranking.failures.is_empty());
    assert_eq!(ranking.entries[0].reference_origin, ReferenceOrigin::Untracked);
    assert_eq!(ranking.entries[0].reference_date, date(2024, 5, 2));
    assert_eq!(ranking.entries[0].distance_since_reference, Decimal::from(310_000));
}
