use labgrade::{
    cases::{Module, Modules, doctest_case, function_case},
    check_assert,
    harness::{ExecutionContext, test},
    suite::{Grade, Suite},
};
use serde_json::json;

fn modules() -> Modules {
    Modules::new().register(
        Module::new("math_utils")
            .with_function("add", |_console, args| {
                let a = args.first().and_then(|v| v.as_i64()).unwrap_or_default();
                let b = args.get(1).and_then(|v| v.as_i64()).unwrap_or_default();
                Ok(json!(a + b))
            })
            .with_function("sub", |_console, _args| Ok(json!(0))),
    )
}

fn suite() -> Suite {
    let modules = modules();
    Suite::new()
        .case(
            "add",
            2.0,
            function_case(&modules, "math_utils", "add", [2, 3], 5).show_stdout(false),
        )
        .case(
            "sub",
            3.0,
            function_case(&modules, "math_utils", "sub", [5, 3], 2).show_stdout(false),
        )
        .case(
            "doctest",
            4.0,
            doctest_case(
                &modules,
                Module::default(),
                "math_utils",
                ">>> add(1, 1)\n2\n>>> sub(2, 2)\n0\n>>> sub(3, 1)\n2\n>>> add(0, 0)\n0\n",
                4.0,
            )
            .show_stdout(false),
        )
        .case(
            "greeting",
            1.0,
            test(|ctx: &mut ExecutionContext| {
                let name = ctx.input("Name? ")?;
                check_assert!(name == "Ada", "Expected Ada, got {name}");
                Ok(())
            })
            .with_input("Ada\n")
            .show_stdout(false),
        )
}

#[test]
fn suite_scales_cases_by_points() {
    let suite = suite();
    assert_eq!(suite.len(), 4);
    assert_eq!(suite.total(), 10.0);

    let report = suite.run();
    let grades: Vec<(String, f64, f64)> = report
        .results()
        .iter()
        .map(|r| (r.requirement().to_string(), r.grade(), r.out_of()))
        .collect();

    assert_eq!(
        grades,
        vec![
            ("add".to_string(), 2.0, 2.0),
            ("sub".to_string(), 0.0, 3.0),
            ("doctest".to_string(), 3.0, 4.0),
            ("greeting".to_string(), 1.0, 1.0),
        ]
    );
    assert_eq!(report.total(), Grade::new(6.0, 10.0));
    assert_eq!(report.results()[1].reason(), "sub(5, 3) should return 2.");
}

#[test]
fn partial_scores_are_clamped_to_the_points() {
    let report = Suite::new()
        .case("over", 1.0, test(|_ctx| Ok(5.0)).show_stdout(false))
        .case("under", 1.0, test(|_ctx| Ok(-2.0)).show_stdout(false))
        .run();

    assert_eq!(report.results()[0].grade(), 1.0);
    assert_eq!(report.results()[1].grade(), 0.0);
}

#[test]
fn negative_or_nan_points_earn_nothing() {
    let report = Suite::new()
        .case("penalty", -1.0, test(|_ctx| Ok(0.5)).show_stdout(false))
        .case("unset", f64::NAN, test(|_ctx| Ok(0.5)).show_stdout(false))
        .run();

    assert_eq!(report.results()[0].grade(), 0.0);
    assert_eq!(report.results()[1].grade(), 0.0);
}

#[test]
fn reports_render_as_table_and_json() {
    let report = suite().run();

    let table = report.table();
    assert!(table.contains("Grading Overview"));
    assert!(table.contains("Total: 6.00/10.00"));
    assert!(table.contains("Requirement"));

    let json: serde_json::Value =
        serde_json::from_str(&report.to_json().expect("serialize report")).expect("parse json");
    assert_eq!(json["results"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["results"][0]["requirement"], "add");
    assert_eq!(json["results"][0]["grade"]["grade"], 2.0);
    assert_eq!(json["results"][2]["outcome"]["score"], 3.0);

    assert!(report.summary().contains("3/4 checks passed"));
}
