// ============================================================================
// Basic Usage Example
// ============================================================================

use qformat::prelude::*;
use std::sync::Arc;

fn main() {
    println!("=== qformat Example ===\n");

    // Derive an 8-bit family with both checks on, logging diagnostics
    let config = FamilyConfig::new([
        WordFormat::new(WordWidth::W8, true),
        WordFormat::new(WordWidth::W8, false),
    ])
    .with_range_checks(true)
    .with_overflow_checks(true);

    let family = FormatFamily::build(&config, Arc::new(LoggingDiagnostics)).unwrap();
    println!("Derived {} formats\n", family.len());

    // Walk the family
    println!("Formats:");
    for format in family.formats() {
        let range = format.range();
        println!(
            "  {:8} range [{}, {}] epsilon {}",
            format.name(),
            range.min_double,
            range.max_double,
            range.epsilon
        );
    }

    // Scalar arithmetic through one contract
    println!("\n=== qs3_4 arithmetic ===");
    let qs3_4 = family.by_name("qs3_4").unwrap().spec();
    let c = family.contract(qs3_4).unwrap();

    let a = c.from_double(1.5).unwrap();
    let b = c.from_double(2.25).unwrap();
    println!("  {} + {} = {}", a, b, c.add(a, b).unwrap());
    println!("  {} * {} = {}", a, b, c.mul(a, b).unwrap());

    let v = FixValue::from_raw(-3, qs3_4);
    println!(
        "  whole({}) = {}, frac({}) = {}",
        v,
        c.whole(v).unwrap(),
        v,
        c.frac(v).unwrap()
    );

    // Mixed-format promotion
    println!("\n=== Promotion ===");
    let qs7_0 = family.by_name("qs7_0").unwrap().spec();
    let coarse = family.contract(qs7_0).unwrap().from_int(5).unwrap();
    let fine = c.from_double(0.5).unwrap();
    let sum = family.promote(OperatorKind::Add, coarse, fine).unwrap();
    println!("  {} + {} = {}", coarse, fine, sum);

    for rule in family.rules_for(qs7_0).iter().take(4) {
        println!(
            "  rule: {} {} {} -> {}",
            rule.lhs.name(),
            rule.operator,
            rule.rhs.name(),
            rule.result.name()
        );
    }

    // Vectors and complex numbers over a family scalar
    println!("\n=== Aggregates ===");
    let v3 = VectorType::new(c.clone(), 3).unwrap();
    let x = v3.from_doubles(&[1.0, 0.0, 0.0]).unwrap();
    let y = v3.from_doubles(&[0.0, 1.0, 0.0]).unwrap();
    let z = v3.cross(&x, &y).unwrap();
    println!("  {} cross: {:?}", v3.name(), v3.to_doubles(&z).unwrap());

    let cx = ComplexType::new(c);
    let i = cx.from_ints(0, 1).unwrap();
    let squared = cx.mul(i, i).unwrap();
    println!("  {}: i * i = {:?}", cx.name(), cx.to_doubles(squared).unwrap());

    // Hand descriptors to an (external) emitter
    println!("\n=== Emission surface ===");
    let descriptors = family.descriptors();
    println!(
        "  {} descriptors, {} rules on {}",
        descriptors.len(),
        descriptors[0].rules.len(),
        descriptors[0].format.name()
    );
}
