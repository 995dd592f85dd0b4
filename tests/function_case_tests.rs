use anyhow::{anyhow, ensure};
use labgrade::{
    cases::{FunctionCase, Module, Modules, authorship_case, function_case, values_equal},
    config::HarnessConfig,
    constants::{INPUT_NOT_ALLOWED, PASSED},
};
use serde_json::{Value, json};
use uuid::Uuid;

fn arg(args: &[Value], idx: usize) -> anyhow::Result<i64> {
    args.get(idx)
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("argument {idx} should be an integer"))
}

fn math_utils(add: fn(i64, i64) -> i64) -> Modules {
    Modules::new().register(Module::new("math_utils").with_function(
        "add",
        move |_console, args| Ok(json!(add(arg(args, 0)?, arg(args, 1)?))),
    ))
}

#[test]
fn correct_function_passes() {
    let modules = math_utils(|a, b| a + b);
    let outcome = function_case(&modules, "math_utils", "add", [2, 3], 5)
        .show_stdout(false)
        .run();

    assert!(outcome.passed());
    assert_eq!(outcome.feedback(), PASSED);
}

#[test]
fn float_results_equal_integer_expectations() {
    let modules = Modules::new().register(Module::new("math_utils").with_function(
        "add",
        |_console, args| {
            let a = args.first().and_then(Value::as_f64).unwrap_or_default();
            let b = args.get(1).and_then(Value::as_f64).unwrap_or_default();
            Ok(json!(a + b))
        },
    ));

    let outcome = function_case(&modules, "math_utils", "add", [2, 3], 5)
        .show_stdout(false)
        .run();
    assert!(outcome.passed(), "{}", outcome.feedback());

    let outcome = function_case(&modules, "math_utils", "add", [2, 3], json!([5]))
        .show_stdout(false)
        .run();
    assert!(!outcome.passed());
}

#[test]
fn numeric_equality_reaches_into_collections() {
    assert!(values_equal(&json!([1, {"a": 2.0}]), &json!([1.0, {"a": 2}])));
    assert!(!values_equal(&json!([1, 2]), &json!([1, 2.5])));
    assert!(!values_equal(&json!(true), &json!(1)));
    assert!(!values_equal(&json!({"a": 1}), &json!({"b": 1})));
}

#[test]
fn wrong_result_names_the_call() {
    let modules = math_utils(|a, b| a + b - 1);
    let outcome = function_case(&modules, "math_utils", "add", [2, 3], 5)
        .show_stdout(false)
        .run();

    assert!(!outcome.passed());
    assert_eq!(outcome.feedback(), "add(2, 3) should return 5.");
}

#[test]
fn missing_function_is_reported() {
    let modules = Modules::new().register(Module::new("math_utils"));
    let outcome = function_case(&modules, "math_utils", "add", [2, 3], 5)
        .show_stdout(false)
        .run();

    assert!(!outcome.passed());
    assert_eq!(outcome.feedback(), "Missing function add");
}

#[test]
fn missing_module_is_a_runtime_error() {
    let outcome = function_case(&Modules::new(), "math_utils", "add", [2, 3], 5)
        .show_stdout(false)
        .with_config(HarnessConfig::default().with_backtrace(false))
        .run();

    assert!(!outcome.passed());
    assert!(outcome.feedback().starts_with("Error running your code:\n\n"));
    assert!(outcome.feedback().contains("No module named 'math_utils'"));
}

#[test]
fn student_errors_are_runtime_errors() {
    let modules = Modules::new().register(Module::new("stats").with_function(
        "mean",
        |_console, args| {
            let values = args
                .first()
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("expected a list"))?;
            ensure!(!values.is_empty(), "mean of an empty list");
            Ok(json!(values.iter().filter_map(Value::as_f64).sum::<f64>() / values.len() as f64))
        },
    ));

    let outcome = FunctionCase::builder()
        .module("stats")
        .function("mean")
        .args([json!([])])
        .expected(0.0)
        .build()
        .into_test(&modules)
        .show_stdout(false)
        .run();

    assert!(!outcome.passed());
    assert!(outcome.feedback().contains("mean of an empty list"));
}

#[test]
fn signature_renders_arguments() {
    let case = FunctionCase::builder()
        .module("strings")
        .function("shout")
        .args(["hi"])
        .expected("HI!")
        .build();
    assert_eq!(case.signature(), "shout(\"hi\")");

    let case = FunctionCase::builder()
        .module("lists")
        .function("total")
        .args([json!([1, 2]), json!({"a": 1})])
        .expected(3)
        .build();
    assert_eq!(case.signature(), "total([1, 2], {\"a\": 1})");
}

#[test]
fn functions_asking_for_input_fail_with_guidance() {
    let modules = Modules::new().register(Module::new("greet").with_function(
        "hello",
        |console, _args| {
            let name = console.input("Name? ").unwrap_or_else(|_| "stranger".to_string());
            Ok(json!(format!("Hello, {name}")))
        },
    ));

    let outcome = function_case(&modules, "greet", "hello", Vec::<Value>::new(), "Hello, Ada")
        .show_stdout(false)
        .run();
    assert_eq!(outcome.feedback(), INPUT_NOT_ALLOWED);

    let outcome = function_case(&modules, "greet", "hello", Vec::<Value>::new(), "Hello, Ada")
        .with_input("Ada\n")
        .show_stdout(false)
        .run();
    assert!(outcome.passed(), "{}", outcome.feedback());
    assert_eq!(outcome.captured_stdout(), "Name? ");
}

#[test]
fn authorship_headers_are_checked_in_order() {
    let root = std::env::temp_dir().join(format!("labgrade-authors-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&root).expect("create temp dir");

    let good = root.join("good.py");
    std::fs::write(&good, "\"\"\"Lab 3.2: sums.\n\nAuthor: al12\n\"\"\"\n").expect("write good");
    let missing = root.join("missing.py");
    std::fs::write(&missing, "import os\n").expect("write missing");
    let template = root.join("template.py");
    std::fs::write(&template, "\"\"\"Describe the module here.\n\nAuthor: YOUR-NAME (yn123)\n\"\"\"\n")
        .expect("write template");
    let description = root.join("description.py");
    std::fs::write(&description, "\"\"\"Lab X.X\n\nAuthor: al12\n\"\"\"\n").expect("write description");

    let outcome = authorship_case([&good]).show_stdout(false).run();
    assert!(outcome.passed());
    assert_eq!(outcome.feedback(), PASSED);

    let outcome = authorship_case([&good, &missing]).show_stdout(false).run();
    assert!(!outcome.passed());
    assert_eq!(
        outcome.feedback(),
        format!("{} documentation should include author (see the template).", missing.display())
    );

    let outcome = authorship_case([&template]).show_stdout(false).run();
    assert_eq!(
        outcome.feedback(),
        format!(
            "{}: Please replace the template names and usernames with your own.",
            template.display()
        )
    );

    let outcome = authorship_case([&description]).show_stdout(false).run();
    assert_eq!(
        outcome.feedback(),
        format!("{}: Please replace the template documentation with your own.", description.display())
    );

    let outcome = authorship_case([root.join("nope.py")]).show_stdout(false).run();
    assert!(
        outcome
            .feedback()
            .starts_with("Unknown error reading documentation. Ask the course staff for help.")
    );

    std::fs::remove_dir_all(&root).ok();
}
