//! Stress tests for sublink
//!
//! Run with: cargo test --release stress -- --ignored

use std::time::Instant;

use sublink::{decode, encode, FieldValue, MessageDescriptor};

fn telemetry() -> MessageDescriptor {
    MessageDescriptor::builder("Telemetry")
        .uint("vehicle_id", 0, 255)
        .int("temperature_c", -40, 85)
        .float("depth_m", -5.0, 500.0, 2)
        .uint("battery_pct", 0, 100)
        .boolean("leak_detected")
        .build()
        .unwrap()
}

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_roundtrip() {
    let desc = telemetry();
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let values = vec![
            FieldValue::UInt((i % 256) as u64),
            FieldValue::SInt((i % 126) as i64 - 40),
            FieldValue::Float((i % 505) as f64 - 5.0),
            FieldValue::UInt((i % 101) as u64),
            FieldValue::Bool(i % 3 == 0),
        ];
        let body = encode(&desc, &values).unwrap();
        let decoded = decode(&desc, &body).unwrap();
        assert_eq!(decoded.len(), values.len());
    }

    let elapsed = start.elapsed();
    let rate = iterations as f64 / elapsed.as_secs_f64();

    println!("Round-tripped {} messages in {:?}", iterations, elapsed);
    println!("Rate: {:.0} messages/second", rate);

    assert!(
        rate > 50_000.0,
        "Should round-trip at least 50k msg/s, got {:.0}",
        rate
    );
}

#[test]
#[ignore]
fn stress_test_exhaustive_small_domain() {
    // Every legal value of a small schema round-trips exactly.
    let desc = MessageDescriptor::builder("Small")
        .uint("a", 3, 18)
        .int("b", -9, 9)
        .boolean("c")
        .build()
        .unwrap();

    for a in 3..=18u64 {
        for b in -9..=9i64 {
            for c in [false, true] {
                let values = vec![
                    FieldValue::UInt(a),
                    FieldValue::SInt(b),
                    FieldValue::Bool(c),
                ];
                let body = encode(&desc, &values).unwrap();
                assert_eq!(decode(&desc, &body).unwrap(), values);
            }
        }
    }
}
