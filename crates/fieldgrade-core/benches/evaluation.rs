use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fieldgrade_core::assertions::AssertionEngine;
use fieldgrade_core::grading::{grade_submission, Submission};
use fieldgrade_core::rules::{Rule, RuleEvaluator, RuleType};

fn evaluator() -> RuleEvaluator {
    let mut ev = RuleEvaluator::new();
    ev.add_rule("callsign", Rule::new("Callsign", RuleType::Required, 10))
        .unwrap();
    ev.add_rule(
        "date",
        Rule::new("Date", RuleType::DateTimeNot, 5).with_placeholder("UNKNOWN"),
    )
    .unwrap();
    ev.add_rule(
        "subject",
        Rule::new("Subject", RuleType::Contains, 2).with_placeholder("ICS-213"),
    )
    .unwrap();
    ev.add_rule("comments", Rule::new("Comments", RuleType::Optional, 1))
        .unwrap();
    ev
}

fn bench_rule_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_evaluation");

    let passing = Submission::new("pass")
        .with_field("callsign", "K1ABC")
        .with_field("date", "2024-06-22 18:00")
        .with_field("subject", "Weekly ICS-213 check-in");
    let failing = Submission::new("fail")
        .with_field("date", "UNKNOWN")
        .with_field("subject", "hello");

    group.bench_function("all_pass", |b| {
        let mut ev = evaluator();
        b.iter(|| grade_submission(&mut ev, black_box(&passing)).unwrap())
    });

    group.bench_function("all_fail", |b| {
        let mut ev = evaluator();
        b.iter(|| grade_submission(&mut ev, black_box(&failing)).unwrap())
    });

    group.finish();
}

fn bench_default_compare(c: &mut Criterion) {
    let mut engine = AssertionEngine::new();
    engine.add_entry("name", "Name", "O'Brien-1");
    engine.add_entry(
        "band",
        "Band",
        vec!["2m".to_string(), "70cm".to_string(), "6m".to_string()],
    );

    c.bench_function("assertion_default_compare", |b| {
        b.iter(|| {
            engine.reset();
            engine.test_value("name", black_box(Some("OBrien1"))).unwrap();
            engine
                .test_set_of_strings("band", black_box(Some("6 M")))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_rule_evaluation, bench_default_compare);
criterion_main!(benches);
