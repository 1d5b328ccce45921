//! Statement generation through the public API

use chrono::{TimeZone, Utc};
use regex::Regex;
use seriesql::query::Function;
use seriesql::{
    CalcArg, Fill, Interval, Measurement, MemoryClient, PredicateValue, QueryError, Relation,
    TimeUnit,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn dummy() -> Arc<Measurement> {
    Arc::new(
        Measurement::builder("dummy")
            .tags(["dummy_id", "host"])
            .values(["user_id"])
            .build(),
    )
}

fn rel() -> Relation {
    dummy().all()
}

fn sql(rel: Relation) -> String {
    rel.to_sql().unwrap()
}

// ============================================
// Select / from
// ============================================

#[test]
fn test_fresh_relation() {
    assert_eq!(sql(rel()), "select * from \"dummy\"");
}

#[test]
fn test_select_fields() {
    assert_eq!(
        sql(rel().select(["user_id", "dummy_id"])),
        "select user_id,dummy_id from \"dummy\""
    );
    assert_eq!(
        sql(rel().select(["count(user_id)"])),
        "select count(user_id) from \"dummy\""
    );
}

// ============================================
// Where
// ============================================

#[test]
fn test_filter_pairs() {
    let now = Utc::now();
    let rel = rel().filters([
        ("user_id", PredicateValue::from(1)),
        ("dummy", PredicateValue::from("q")),
        ("timer", PredicateValue::from(now)),
    ]);
    assert_eq!(
        sql(rel),
        format!(
            "select * from \"dummy\" where (user_id=1) and (dummy='q') and (timer={}s)",
            now.timestamp()
        )
    );
}

#[test]
fn test_filter_raw() {
    assert_eq!(
        sql(rel().filter_raw("time > now() - 1d")),
        "select * from \"dummy\" where (time > now() - 1d)"
    );
}

#[test]
fn test_filter_shapes() {
    let re = Regex::new("^du.*").unwrap();
    assert_eq!(
        sql(rel().filter("user_id", 1).filter("dummy", re)),
        "select * from \"dummy\" where (user_id=1) and (dummy=~/^du.*/)"
    );
    assert_eq!(
        sql(rel().filter("user_id", 1..4)),
        "select * from \"dummy\" where (user_id>1 and user_id<4)"
    );
    assert_eq!(
        sql(rel().filter("user_id", vec![1, 2, 3])),
        "select * from \"dummy\" where (user_id=1 or user_id=2 or user_id=3)"
    );
}

#[test]
fn test_negated_filters() {
    assert_eq!(
        sql(rel().not().filter("user_id", 1).not().filter("dummy", "a")),
        "select * from \"dummy\" where (user_id<>1) and (dummy<>'a')"
    );
    assert_eq!(
        sql(rel().not().filters([
            ("user_id", PredicateValue::from(1)),
            ("dummy", PredicateValue::from(Regex::new("^du.*").unwrap())),
        ])),
        "select * from \"dummy\" where (user_id<>1) and (dummy!~/^du.*/)"
    );
    assert_eq!(
        sql(rel().not().filter("user_id", 1..=4)),
        "select * from \"dummy\" where (user_id<1 and user_id>4)"
    );
    assert_eq!(
        sql(rel().not().filter("user_id", [1, 2, 3])),
        "select * from \"dummy\" where (user_id<>1 and user_id<>2 and user_id<>3)"
    );
}

#[test]
fn test_scenario_negated_pattern() {
    let rel = rel()
        .filter("user_id", 1)
        .not()
        .filter("dummy", Regex::new("^du.*").unwrap());
    assert_eq!(
        sql(rel),
        "select * from \"dummy\" where (user_id=1) and (dummy!~/^du.*/)"
    );
}

#[test]
fn test_invalid_filters_surface_on_render() {
    let err = rel().filter("user_id", Vec::<i64>::new()).to_sql().unwrap_err();
    assert!(matches!(err, QueryError::InvalidPredicateValue { .. }));

    assert!(rel().filter("load", f64::NAN).to_sql().is_err());
    assert!(rel().filter_raw("  ").to_sql().is_err());
    assert!(rel().filter("", 1).to_delete_sql().is_err());
}

// ============================================
// Merge
// ============================================

#[test]
fn test_merge_series() {
    assert_eq!(
        sql(rel().merge("dubby")),
        "select * from \"dummy\" merge \"dubby\""
    );
    assert_eq!(
        sql(rel().merge(Regex::new("^du[1-6]+$").unwrap())),
        "select * from \"dummy\" merge /^du[1-6]+$/"
    );
    assert_eq!(
        sql(rel().merge(vec!["a", "b"])),
        "select * from \"dummy\" merge \"a\" merge \"b\""
    );
}

#[test]
fn test_merge_relations_multi_values() {
    let mut r1 = rel()
        .filter("id", vec![1, 2])
        .filter("dummy", "qwe")
        .time(TimeUnit::Hour);
    let r2 = Relation::new(dummy()).not().filter("user_id", 0).group(["user_id"]);
    r1.merge_from(&r2);

    assert_eq!(
        sql(r1),
        "select * from \"dummy\" where (id=1 or id=2) and (dummy='qwe') and (user_id<>0) group by time(1h),user_id"
    );
}

#[test]
fn test_merge_relations_single_values() {
    let r1 = rel().time_with_fill(TimeUnit::Hour, 0).limit(10);
    let r2 = Relation::new(dummy()).merge("doomy").limit(5);

    assert_eq!(
        sql(r1.merged(&r2)),
        "select * from \"dummy\" merge \"doomy\" group by time(1h) fill(0) limit 5"
    );
    assert_eq!(sql(r1), "select * from \"dummy\" group by time(1h) fill(0) limit 10");
}

// ============================================
// Time windows
// ============================================

#[test]
fn test_past() {
    assert_eq!(
        sql(rel().past(TimeUnit::Hour)),
        "select * from \"dummy\" where (time > now() - 1h)"
    );
    assert_eq!(
        sql(rel().past(Interval::symbol("s"))),
        "select * from \"dummy\" where (time > now() - 1s)"
    );
    assert_eq!(
        sql(rel().past("3d")),
        "select * from \"dummy\" where (time > now() - 3d)"
    );
    assert_eq!(
        sql(rel().past(Duration::from_secs(86_400))),
        "select * from \"dummy\" where (time > now() - 86400s)"
    );
}

#[test]
fn test_since() {
    let instant = Utc.with_ymd_and_hms(2014, 12, 31, 0, 0, 0).unwrap();
    assert_eq!(
        sql(rel().since(instant)),
        "select * from \"dummy\" where (time > 1419984000s)"
    );
}

#[test]
fn test_window_follows_conditions() {
    assert_eq!(
        sql(rel().past(TimeUnit::Day).filter("user_id", 1)),
        "select * from \"dummy\" where (user_id=1) and (time > now() - 1d)"
    );
}

// ============================================
// Group / fill / limit
// ============================================

#[test]
fn test_group_terms() {
    assert_eq!(
        sql(rel().group(["user_id", "time(1m) fill(0)"])),
        "select * from \"dummy\" group by user_id,time(1m) fill(0)"
    );
}

#[test]
fn test_group_by_time_units() {
    let cases = [
        (TimeUnit::Hour, "1h"),
        (TimeUnit::Minute, "1m"),
        (TimeUnit::Second, "1s"),
        (TimeUnit::Millisecond, "1u"),
        (TimeUnit::Day, "1d"),
        (TimeUnit::Week, "1w"),
        (TimeUnit::Month, "30d"),
    ];

    for (unit, literal) in cases {
        assert_eq!(
            sql(rel().time(unit)),
            format!("select * from \"dummy\" group by time({})", literal)
        );
    }

    assert_eq!(
        sql(rel().time(Interval::symbol("ms"))),
        "select * from \"dummy\" group by time(1u)"
    );
}

#[test]
fn test_group_by_time_with_fill() {
    assert_eq!(
        sql(rel().time_with_fill(TimeUnit::Month, 0)),
        "select * from \"dummy\" group by time(30d) fill(0)"
    );
    assert_eq!(
        sql(rel().time("4d")),
        "select * from \"dummy\" group by time(4d)"
    );
    assert_eq!(
        sql(rel().time_with_fill("4d", Fill::Null)),
        "select * from \"dummy\" group by time(4d) fill(null)"
    );
    assert_eq!(
        sql(rel().time_with_fill("4d", 0).group(["dummy_id"])),
        "select * from \"dummy\" group by time(4d),dummy_id fill(0)"
    );
}

#[test]
fn test_limit_and_offset() {
    assert_eq!(sql(rel().limit(100)), "select * from \"dummy\" limit 100");
    assert_eq!(
        sql(rel().limit(10).offset(20)),
        "select * from \"dummy\" limit 10 offset 20"
    );
}

// ============================================
// Calculations
// ============================================

#[test]
fn test_one_arg_calculations() {
    let functions = [
        "count", "min", "max", "mean", "mode", "median", "distinct", "derivative", "stddev",
        "sum", "first", "last", "difference", "histogram",
    ];

    for name in functions {
        let rel = rel()
            .filter("user_id", 1)
            .calc(name, vec![CalcArg::from("column_name")]);
        assert_eq!(
            sql(rel),
            format!("select {}(column_name) from \"dummy\" where (user_id=1)", name)
        );
    }
}

#[test]
fn test_two_arg_calculations() {
    for name in ["percentile", "histogram", "top", "bottom"] {
        let rel = rel()
            .filter("user_id", 1)
            .calc(name, vec!["column_name".into(), 10.into()]);
        assert_eq!(
            sql(rel),
            format!("select {}(column_name,10) from \"dummy\" where (user_id=1)", name)
        );
    }
}

#[test]
fn test_scenario_calc_then_filter() {
    let rel = rel()
        .calc(Function::Percentile, vec!["column_name".into(), 10.into()])
        .filter("user_id", 1);
    assert_eq!(
        sql(rel),
        "select percentile(column_name,10) from \"dummy\" where (user_id=1)"
    );
}

// ============================================
// Scopes and terminal calls
// ============================================

#[test]
fn test_default_scope_seeds_relations() {
    let scoped = Arc::new(
        Measurement::builder("visits")
            .values(["user_id"])
            .default_scope(|rel| rel.past(TimeUnit::Week))
            .build(),
    );

    assert_eq!(
        sql(scoped.all().filter("user_id", 1)),
        "select * from \"visits\" where (user_id=1) and (time > now() - 1w)"
    );
    assert_eq!(sql(scoped.unscoped()), "select * from \"visits\"");
}

#[tokio::test]
async fn test_load_sends_rendered_statement() {
    let client = MemoryClient::new().with_response(json!({ "points": [{ "user_id": 1 }] }));
    let points = rel().filter("user_id", 1).load(&client).await.unwrap();

    assert_eq!(points, vec![json!({ "user_id": 1 })]);
    assert_eq!(
        client.queries(),
        vec!["select * from \"dummy\" where (user_id=1)".to_string()]
    );
}

#[tokio::test]
async fn test_write_through_relation() {
    let client = MemoryClient::new();
    let point = rel()
        .write([("dummy_id", json!(3)), ("user_id", json!(7))], &client)
        .await
        .unwrap()
        .unwrap();

    assert!(point.is_persisted());
    let writes = client.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "dummy");
    assert_eq!(writes[0].1.tags.get("dummy_id"), Some(&json!(3)));
    assert_eq!(writes[0].1.values.get("user_id"), Some(&json!(7)));
}
