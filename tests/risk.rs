//! Risk scorer tests built around concrete attempt/payment histories.

mod common;

use common::*;
use credgate::risk::{self, AMOUNT_ANOMALY_POINTS, IP_FAN_OUT_POINTS, VELOCITY_POINTS};

#[test]
fn test_clean_history_scores_zero() {
    let conn = setup_test_db();
    let breakdown = risk::score(&conn, "user-clean", Some("10.0.0.1"), 1000).unwrap();
    assert_eq!(breakdown.score, 0);
}

#[test]
fn test_velocity_signal_fires_above_three_failed() {
    let conn = setup_test_db();
    let ts = now();

    // 4 failed attempts within the trailing hour
    for i in 0..4 {
        insert_attempt_at(&conn, "user-a", Some("10.0.0.1"), "failed", ts - 60 * i);
    }

    let breakdown = risk::score(&conn, "user-a", Some("10.0.0.1"), 1000).unwrap();
    assert_eq!(breakdown.velocity, VELOCITY_POINTS);
    assert_eq!(breakdown.score, 30);
}

#[test]
fn test_velocity_ignores_old_and_non_failed_attempts() {
    let conn = setup_test_db();
    let ts = now();

    // 3 recent failures: at the threshold, not above it
    for i in 0..3 {
        insert_attempt_at(&conn, "user-b", Some("10.0.0.1"), "failed", ts - 60 * i);
    }
    // A fourth failure outside the window
    insert_attempt_at(&conn, "user-b", Some("10.0.0.1"), "failed", ts - 3700);
    // Successes never count toward velocity
    insert_attempt_at(&conn, "user-b", Some("10.0.0.1"), "success", ts - 30);

    let breakdown = risk::score(&conn, "user-b", Some("10.0.0.1"), 1000).unwrap();
    assert_eq!(breakdown.velocity, 0);
}

#[test]
fn test_ip_fan_out_signal() {
    let conn = setup_test_db();
    let ts = now();

    // 6 distinct IPs in the trailing day
    for i in 0..6 {
        let ip = format!("10.0.0.{}", i);
        insert_attempt_at(&conn, "user-c", Some(&ip), "success", ts - 600 * i);
    }

    // Current request reuses a seen IP: 6 distinct, still above 5
    let breakdown = risk::score(&conn, "user-c", Some("10.0.0.1"), 1000).unwrap();
    assert_eq!(breakdown.ip_fan_out, IP_FAN_OUT_POINTS);
}

#[test]
fn test_ip_fan_out_counts_current_unseen_ip() {
    let conn = setup_test_db();
    let ts = now();

    // 5 distinct historical IPs: at the threshold
    for i in 0..5 {
        let ip = format!("10.0.0.{}", i);
        insert_attempt_at(&conn, "user-d", Some(&ip), "success", ts - 600 * i);
    }

    // A 6th, previously unseen IP on the current request tips it over
    let breakdown = risk::score(&conn, "user-d", Some("192.0.2.9"), 1000).unwrap();
    assert_eq!(breakdown.ip_fan_out, IP_FAN_OUT_POINTS);

    // Reusing a known IP stays at 5 distinct
    let breakdown = risk::score(&conn, "user-d", Some("10.0.0.0"), 1000).unwrap();
    assert_eq!(breakdown.ip_fan_out, 0);
}

#[test]
fn test_amount_anomaly_against_paid_mean() {
    let conn = setup_test_db();
    let plan = create_test_plan(&conn, "Pack", 3000, 100);

    // Mean paid amount: 3000
    insert_paid_payment(&conn, "user-e", &plan.id, 2000);
    insert_paid_payment(&conn, "user-e", &plan.id, 4000);

    // 10000 > 3 * 3000
    let breakdown = risk::score(&conn, "user-e", None, 10000).unwrap();
    assert_eq!(breakdown.amount_anomaly, AMOUNT_ANOMALY_POINTS);

    // 9000 is exactly 3x the mean, not above it
    let breakdown = risk::score(&conn, "user-e", None, 9000).unwrap();
    assert_eq!(breakdown.amount_anomaly, 0);
}

#[test]
fn test_amount_anomaly_skipped_without_paid_history() {
    let conn = setup_test_db();

    // Huge first purchase, but no paid history to compare against
    let breakdown = risk::score(&conn, "user-f", None, 1_000_000).unwrap();
    assert_eq!(breakdown.amount_anomaly, 0);
    assert_eq!(breakdown.score, 0);
}

#[test]
fn test_all_signals_sum() {
    let conn = setup_test_db();
    let ts = now();
    let plan = create_test_plan(&conn, "Pack", 3000, 100);

    for i in 0..4 {
        insert_attempt_at(&conn, "user-g", Some("10.0.0.1"), "failed", ts - 60 * i);
    }
    for i in 0..6 {
        let ip = format!("172.16.0.{}", i);
        insert_attempt_at(&conn, "user-g", Some(&ip), "success", ts - 600 * (i + 1));
    }
    insert_paid_payment(&conn, "user-g", &plan.id, 3000);

    let breakdown = risk::score(&conn, "user-g", Some("10.0.0.1"), 10000).unwrap();
    assert_eq!(breakdown.velocity, VELOCITY_POINTS);
    assert_eq!(breakdown.amount_anomaly, AMOUNT_ANOMALY_POINTS);
    assert_eq!(breakdown.ip_fan_out, IP_FAN_OUT_POINTS);
    assert_eq!(breakdown.score, 75);
}

#[test]
fn test_signals_are_per_user() {
    let conn = setup_test_db();
    let ts = now();

    for i in 0..10 {
        insert_attempt_at(&conn, "user-noisy", Some("10.0.0.1"), "failed", ts - 60 * i);
    }

    let breakdown = risk::score(&conn, "user-quiet", Some("10.0.0.1"), 1000).unwrap();
    assert_eq!(breakdown.score, 0);
}
