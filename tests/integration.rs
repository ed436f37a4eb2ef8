//! End-to-end tests for the HR compliance engine.
//!
//! The suite drives the public facade with the sample configuration:
//! - Attendance check-in, lateness, geofence and the elapsed-day sweep
//! - Two-step leave approval and month-boundary clipping
//! - Payroll computation, finalization and corrections
//! - The monthly batch run
//! - Error cases

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc, Weekday};
use rust_decimal::Decimal;

use hr_engine::HrEngine;
use hr_engine::calculation::standard_working_days;
use hr_engine::clock::FixedClock;
use hr_engine::config::ConfigLoader;
use hr_engine::directory::InMemoryEmployeeDirectory;
use hr_engine::error::{EngineError, ErrorKind};
use hr_engine::jobs::{run_attendance_sweep, run_monthly_payroll};
use hr_engine::models::{
    AttendanceFlag, Contract, ContractKind, ContractStatus, Employee, GeoPoint, LeaveCategory, LeaveStatus,
    PayPeriod, PayrollAdjustments, Punctuality,
};
use uuid::Uuid;

// =============================================================================
// Test Helpers
// =============================================================================

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn local(d: NaiveDate, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(7 * 3600)
        .unwrap()
        .with_ymd_and_hms(d.year(), d.month(), d.day(), h, min, 0)
        .unwrap()
}

fn employee(id: i64, base: &str, allowance: &str, dependents: u32) -> Employee {
    Employee {
        id,
        full_name: format!("Employee {}", id),
        dependents,
        contracts: vec![Contract {
            id: Uuid::new_v4(),
            kind: ContractKind::Indefinite,
            base_salary: decimal(base),
            allowance: decimal(allowance),
            start_date: date(2024, 1, 1),
            end_date: None,
            status: ContractStatus::Active,
        }],
    }
}

/// 2024-12-02 09:00 at the workplace.
fn run_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 2, 2, 0, 0).unwrap()
}

fn create_test_engine() -> (HrEngine, Arc<FixedClock>) {
    let config = ConfigLoader::load("./config/sample").expect("Failed to load config");
    let directory = InMemoryEmployeeDirectory::new();
    directory.upsert(employee(1, "15000000", "1000000", 0));
    directory.upsert(employee(2, "30000000", "0", 2));
    directory.upsert(employee(3, "8000000", "500000", 0));

    let clock = Arc::new(FixedClock::new(run_date()));
    let engine =
        HrEngine::new(config.into_shared(), Arc::new(directory), clock.clone()).expect("Failed to build engine");
    (engine, clock)
}

/// Moves the clock to `timestamp` and returns it, as if the ping arrived live.
fn live(clock: &FixedClock, timestamp: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    clock.set(timestamp.with_timezone(&Utc));
    timestamp
}

fn anchor(engine: &HrEngine) -> GeoPoint {
    engine.config().workplace().anchor
}

/// Full 08:00-17:00 days on the first `count` Mon-Sat dates of November 2024,
/// then the clock returns to the December run date.
fn attend_november(engine: &HrEngine, clock: &FixedClock, employee_id: i64, count: usize) {
    let dates = (1..=30)
        .map(|d| date(2024, 11, d))
        .filter(|d| d.weekday() != Weekday::Sun)
        .take(count);
    for d in dates {
        engine
            .attendance()
            .record_check_in(employee_id, live(clock, local(d, 8, 0)), anchor(engine), None)
            .unwrap();
        engine
            .attendance()
            .record_check_out(employee_id, live(clock, local(d, 17, 0)), anchor(engine))
            .unwrap();
    }
    clock.set(run_date());
}

// =============================================================================
// SECTION 1: Configuration
// =============================================================================

#[test]
fn test_sample_calendar_standard_days() {
    let (engine, _) = create_test_engine();
    let calendar = engine.config().calendar();

    assert_eq!(standard_working_days(calendar, &PayPeriod::new(2024, 7).unwrap()), 27);
    // Two public holidays in early September.
    assert_eq!(standard_working_days(calendar, &PayPeriod::new(2024, 9).unwrap()), 23);
    assert_eq!(standard_working_days(calendar, &PayPeriod::new(2024, 11).unwrap()), 26);
    // Configured override.
    assert_eq!(standard_working_days(calendar, &PayPeriod::new(2025, 1).unwrap()), 22);
}

#[test]
fn test_missing_config_directory() {
    match ConfigLoader::load("./config/does-not-exist") {
        Err(e) => {
            assert!(matches!(e, EngineError::ConfigNotFound { .. }));
            assert_eq!(e.kind(), ErrorKind::Configuration);
        }
        Ok(_) => panic!("Expected ConfigNotFound"),
    }
}

// =============================================================================
// SECTION 2: Attendance
// =============================================================================

#[test]
fn test_late_check_in_requires_reason_then_completes() {
    let (engine, clock) = create_test_engine();
    let day = date(2024, 11, 4);

    let record = engine
        .attendance()
        .record_check_in(1, live(&clock, local(day, 8, 20)), anchor(&engine), None)
        .unwrap();
    assert_eq!(record.punctuality, Punctuality::LateReasonRequired { minutes_late: 20 });
    assert!(record.has_flag(AttendanceFlag::IncompleteLateReason));

    let record = engine.attendance().supply_late_reason(1, day, "Flat tyre").unwrap();
    assert!(!record.has_flag(AttendanceFlag::IncompleteLateReason));
    assert_eq!(record.late_reason.as_deref(), Some("Flat tyre"));
}

#[test]
fn test_grace_window_boundaries() {
    let (engine, clock) = create_test_engine();
    let day = date(2024, 11, 5);

    let on_time = engine
        .attendance()
        .record_check_in(1, live(&clock, local(day, 8, 10)), anchor(&engine), None)
        .unwrap();
    assert_eq!(on_time.punctuality, Punctuality::OnTime);

    let late = engine
        .attendance()
        .record_check_in(2, live(&clock, local(day, 8, 15)), anchor(&engine), None)
        .unwrap();
    assert_eq!(late.punctuality, Punctuality::Late { minutes_late: 15 });
}

#[test]
fn test_check_in_outside_geofence_is_flagged() {
    let (engine, clock) = create_test_engine();
    let far_away = GeoPoint::new(10.7769, 106.7009);

    let record = engine
        .attendance()
        .record_check_in(1, live(&clock, local(date(2024, 11, 6), 7, 55)), far_away, None)
        .unwrap();
    assert!(record.has_flag(AttendanceFlag::OutsideGeofence));
    assert!(record.check_in.distance_m > 200.0);
}

#[test]
fn test_concurrent_check_ins_single_winner() {
    let (engine, clock) = create_test_engine();
    let barrier = Arc::new(Barrier::new(8));
    let day = date(2024, 11, 7);
    live(&clock, local(day, 8, 0));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let at = anchor(&engine);
                engine.attendance().record_check_in(3, local(day, 7, 50 + i), at, None)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(EngineError::DuplicateCheckIn { .. })))
            .count(),
        7
    );
}

#[test]
fn test_sweep_closes_open_days() {
    let (engine, clock) = create_test_engine();
    let day = date(2024, 11, 29);
    engine
        .attendance()
        .record_check_in(1, live(&clock, local(day, 8, 0)), anchor(&engine), None)
        .unwrap();
    assert_eq!(run_attendance_sweep(&engine), 0);

    clock.set(run_date());
    assert_eq!(run_attendance_sweep(&engine), 1);
    let record = engine.attendance().record(1, day).unwrap();
    assert!(record.closed);
    assert!(record.has_flag(AttendanceFlag::MissingCheckOut));

    assert!(matches!(
        engine.attendance().record_check_out(1, local(day, 17, 0), anchor(&engine)),
        Err(EngineError::AttendanceClosed { .. })
    ));
}

#[test]
fn test_elapsed_and_future_pings_are_rejected() {
    let (engine, clock) = create_test_engine();
    let today = date(2024, 12, 2);
    engine
        .attendance()
        .record_check_in(1, local(today, 8, 55), anchor(&engine), None)
        .unwrap();

    // Backdated, no sweep has run.
    let err = engine
        .attendance()
        .record_check_in(2, local(date(2024, 11, 28), 8, 0), anchor(&engine), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::AttendanceClosed { .. }));
    assert_eq!(err.kind(), ErrorKind::State);

    // Later today, before it happens.
    let err = engine
        .attendance()
        .record_check_out(1, local(today, 17, 0), anchor(&engine))
        .unwrap_err();
    assert!(matches!(err, EngineError::FutureTimestamp { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Once the clock gets there the check-out is accepted.
    let record = engine
        .attendance()
        .record_check_out(1, live(&clock, local(today, 17, 0)), anchor(&engine))
        .unwrap();
    assert!(record.check_out.is_some());

    // The next morning the day is closed even though no sweep has run.
    clock.set(Utc.with_ymd_and_hms(2024, 12, 3, 1, 0, 0).unwrap());
    assert!(matches!(
        engine.attendance().record_check_out(1, local(today, 17, 30), anchor(&engine)),
        Err(EngineError::AttendanceClosed { .. })
    ));
}

#[test]
fn test_invalid_coordinates_are_rejected() {
    let (engine, _) = create_test_engine();
    let err = engine
        .attendance()
        .record_check_in(1, local(date(2024, 12, 2), 8, 0), GeoPoint::new(190.8, 106.7), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidLocation { .. }));
    assert!(engine.attendance().record(1, date(2024, 12, 2)).is_none());
}

// =============================================================================
// SECTION 3: Leave
// =============================================================================

#[test]
fn test_leave_full_approval_then_reject_is_illegal() {
    let (engine, _) = create_test_engine();
    let leave = engine.leave();

    let request = leave
        .submit(1, LeaveCategory::Annual, date(2024, 11, 11), date(2024, 11, 12), "Wedding")
        .unwrap();
    assert_eq!(request.status(), LeaveStatus::Pending);

    let request = leave.approve_by_manager(request.id, request.version, 50, Some("Fine")).unwrap();
    let request = leave.approve_by_accounting(request.id, request.version, 60, None).unwrap();
    assert_eq!(request.status(), LeaveStatus::FullyApproved);
    assert_eq!(request.manager_sign_off().unwrap().approver_id, 50);
    assert_eq!(request.accounting_sign_off().unwrap().approver_id, 60);

    let err = leave.reject(request.id, request.version, 50, "Changed my mind").unwrap_err();
    assert!(matches!(err, EngineError::IllegalTransition { .. }));
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn test_leave_reject_requires_reason() {
    let (engine, _) = create_test_engine();
    let leave = engine.leave();
    let request = leave
        .submit(1, LeaveCategory::Sick, date(2024, 11, 13), date(2024, 11, 13), "Fever")
        .unwrap();

    assert!(matches!(
        leave.reject(request.id, 0, 50, ""),
        Err(EngineError::MissingReason { .. })
    ));
    let rejected = leave.reject(request.id, 0, 50, "Submit a certificate").unwrap();
    assert_eq!(rejected.status(), LeaveStatus::Rejected);
}

#[test]
fn test_leave_spanning_month_boundary_is_clipped() {
    let (engine, _) = create_test_engine();
    let leave = engine.leave();

    let request = leave
        .submit(2, LeaveCategory::Annual, date(2024, 7, 29), date(2024, 8, 2), "Holiday")
        .unwrap();
    assert_eq!(request.day_count, 5);
    let request = leave.approve_by_manager(request.id, 0, 50, None).unwrap();
    leave.approve_by_accounting(request.id, request.version, 60, None).unwrap();

    assert_eq!(leave.approved_leave_days(2, date(2024, 7, 1), date(2024, 7, 31)), 3);
    assert_eq!(leave.approved_leave_days(2, date(2024, 8, 1), date(2024, 8, 31)), 2);
}

// =============================================================================
// SECTION 4: Payroll
// =============================================================================

#[test]
fn test_payroll_scenario_24_of_26_days() {
    let (engine, clock) = create_test_engine();
    attend_november(&engine, &clock, 1, 24);

    let record = engine
        .payroll()
        .compute_payroll(1, 2024, 11, &PayrollAdjustments::default())
        .unwrap();

    assert_eq!(record.amounts.gross_pay, decimal("14846154"));
    assert_eq!(record.amounts.net_pay, decimal("13172942"));
    assert_eq!(
        record.amounts.net_pay,
        record.amounts.gross_pay - record.amounts.total_deductions
    );
    assert!(record.audit_trace.warnings.is_empty());

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["amounts"]["gross_pay"], "14846154");
    assert_eq!(json["status"], "draft");
    assert_eq!(json["period"]["year"], 2024);
    assert_eq!(json["period"]["month"], 11);
    assert_eq!(json["inputs"]["worked_days"], "24");
}

#[test]
fn test_payroll_with_dependent_allowances() {
    let (engine, clock) = create_test_engine();

    // 30,000,000 × 10.5% insurance leaves 26,850,000; allowances total 19,800,000.
    let dates = (1..=30).map(|d| date(2024, 11, d)).filter(|d| d.weekday() != Weekday::Sun);
    for d in dates {
        let attendance = engine.attendance();
        attendance.record_check_in(2, live(&clock, local(d, 8, 0)), anchor(&engine), None).unwrap();
        attendance.record_check_out(2, live(&clock, local(d, 17, 30)), anchor(&engine)).unwrap();
    }

    let record = engine
        .payroll()
        .compute_payroll(2, 2024, 11, &PayrollAdjustments::default())
        .unwrap();
    assert_eq!(record.amounts.gross_pay, decimal("30000000"));
    assert_eq!(record.amounts.statutory_deductions, decimal("3150000"));
    assert_eq!(record.amounts.taxable_income, decimal("7050000"));
    // 5,000,000 × 5% + 2,050,000 × 10%
    assert_eq!(record.amounts.income_tax, decimal("455000"));
    assert_eq!(record.amounts.net_pay, decimal("26395000"));
}

#[test]
fn test_open_attendance_is_excluded_with_warning() {
    let (engine, clock) = create_test_engine();
    attend_november(&engine, &clock, 3, 10);
    engine
        .attendance()
        .record_check_in(3, live(&clock, local(date(2024, 11, 13), 8, 0)), anchor(&engine), None)
        .unwrap();
    clock.set(run_date());

    let record = engine
        .payroll()
        .compute_payroll(3, 2024, 11, &PayrollAdjustments::default())
        .unwrap();
    assert_eq!(record.inputs.attended_days, Decimal::from(10));
    assert!(
        record
            .audit_trace
            .warnings
            .iter()
            .any(|w| w.code == "missing_check_out")
    );
}

#[test]
fn test_finalize_then_correction() {
    let (engine, clock) = create_test_engine();
    attend_november(&engine, &clock, 1, 24);
    let payroll = engine.payroll();
    let none = PayrollAdjustments::default();

    let draft = payroll.compute_payroll(1, 2024, 11, &none).unwrap();
    let finalized = payroll.finalize_payroll(draft.id).unwrap();
    assert!(finalized.finalized_at.is_some());

    let err = payroll.compute_payroll(1, 2024, 11, &none).unwrap_err();
    assert!(matches!(err, EngineError::PayrollFinalized { .. }));

    let overtime = PayrollAdjustments {
        overtime_hours: decimal("8"),
        ..Default::default()
    };
    let corrected = payroll
        .recompute_payroll(1, 2024, 11, &overtime, 77, "Overtime approved late")
        .unwrap();
    assert_eq!(corrected.version, 2);
    assert!(corrected.amounts.gross_pay > finalized.amounts.gross_pay);

    let history = payroll.payroll_history(1, 2024, 11).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], finalized);
    assert_eq!(payroll.current_payroll(1, 2024, 11).unwrap().id, corrected.id);
}

#[test]
fn test_unknown_employee_and_missing_table() {
    let (engine, _) = create_test_engine();
    let none = PayrollAdjustments::default();

    assert!(matches!(
        engine.payroll().compute_payroll(404, 2024, 11, &none),
        Err(EngineError::EmployeeNotFound { .. })
    ));

    let err = engine.payroll().compute_payroll(1, 2024, 1, &none).unwrap_err();
    assert!(matches!(err, EngineError::ConfigurationMissing { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_oversized_adjustments_are_rejected() {
    let (engine, clock) = create_test_engine();
    attend_november(&engine, &clock, 1, 24);

    let overtime = PayrollAdjustments {
        overtime_hours: decimal("1000000000000000000000000"),
        ..Default::default()
    };
    let err = engine.payroll().compute_payroll(1, 2024, 11, &overtime).unwrap_err();
    assert!(matches!(err, EngineError::InvalidAdjustment { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let bonus = PayrollAdjustments {
        bonus: Decimal::MAX,
        ..Default::default()
    };
    assert!(matches!(
        engine.payroll().compute_payroll(1, 2024, 11, &bonus),
        Err(EngineError::InvalidAdjustment { .. })
    ));
    assert!(engine.payroll().payroll_history(1, 2024, 11).unwrap().is_empty());
}

// =============================================================================
// SECTION 5: Batch run
// =============================================================================

#[tokio::test]
async fn test_monthly_batch_run() {
    let (engine, clock) = create_test_engine();
    attend_november(&engine, &clock, 1, 24);
    attend_november(&engine, &clock, 3, 26);

    let report = run_monthly_payroll(engine.clone(), vec![1, 2, 3, 404], 2024, 11, HashMap::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].employee_id, 404);
    assert_eq!(report.succeeded[0].amounts.gross_pay, decimal("14846154"));

    let current = engine.payroll().current_payroll(3, 2024, 11).unwrap();
    assert_eq!(current.inputs.worked_days, Decimal::from(26));
}
