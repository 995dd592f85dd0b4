use anyhow::{anyhow, bail};
use labgrade::{
    cases::{DoctestCase, Module, Modules, doctest_case},
    constants::{INPUT_NOT_ALLOWED, PASSED},
};
use serde_json::{Value, json};

const SESSION: &str = r#"
    Examples for the arithmetic lab.

    >>> add(2, 3)
    5
    >>> double(21)
    42
    >>> divide(7, 2)
    3.5
    >>> divide(1, 0)
    Error: division by zero
"#;

fn number(args: &[Value], idx: usize) -> anyhow::Result<f64> {
    args.get(idx)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("argument {idx} should be a number"))
}

fn arithmetic(double_is_broken: bool) -> Module {
    Module::new("arithmetic")
        .with_function("add", |_console, args| {
            Ok(json!(number(args, 0)? as i64 + number(args, 1)? as i64))
        })
        .with_function("double", move |_console, args| {
            let x = number(args, 0)? as i64;
            Ok(json!(if double_is_broken { x * 3 } else { x * 2 }))
        })
        .with_function("divide", |_console, args| {
            let (a, b) = (number(args, 0)?, number(args, 1)?);
            if b == 0.0 {
                bail!("division by zero");
            }
            Ok(json!(a / b))
        })
}

#[test]
fn all_examples_passing_earns_full_points() {
    let modules = Modules::new().register(arithmetic(false));
    let outcome = doctest_case(&modules, Module::default(), "arithmetic", SESSION, 4.0)
        .show_stdout(false)
        .run();

    assert!(outcome.passed());
    assert_eq!(outcome.score(), Some(4.0));
    assert_eq!(outcome.feedback(), PASSED);
}

#[test]
fn one_failing_example_of_four_earns_three_quarters() {
    let modules = Modules::new().register(arithmetic(true));
    let outcome = doctest_case(&modules, Module::default(), "arithmetic", SESSION, 4.0)
        .show_stdout(false)
        .run();

    assert!(outcome.passed());
    assert_eq!(outcome.score(), Some(3.0));
    assert!(outcome.feedback().contains("Failed example:\n    double(21)\n"));
    assert!(outcome.feedback().contains("Expected:\n    42\n"));
    assert!(outcome.feedback().contains("Got:\n    63\n"));
    assert!(outcome.feedback().contains("1 of 4 examples failed."));
}

#[test]
fn globals_are_visible_but_the_module_wins() {
    let globals = Module::new("helpers")
        .with_function("square", |_console, args| {
            Ok(json!(number(args, 0)? as i64 * number(args, 0)? as i64))
        })
        .with_function("add", |_console, _args| Ok(json!("helper add")));
    let modules = Modules::new().register(arithmetic(false));

    let session = ">>> square(4)\n16\n>>> add(1, 1)\n2\n";
    let outcome = DoctestCase::builder()
        .module("arithmetic")
        .session(session)
        .points(2.0)
        .globals(globals)
        .build()
        .into_test(&modules)
        .show_stdout(false)
        .run();

    assert_eq!(outcome.score(), Some(2.0), "{}", outcome.feedback());
}

#[test]
fn booleans_are_not_numbers() {
    let modules = Modules::new().register(
        Module::new("logic").with_function("is_even", |_console, args| {
            Ok(json!(args.first().and_then(Value::as_i64).is_some_and(|n| n % 2 == 0)))
        }),
    );

    let outcome = doctest_case(
        &modules,
        Module::default(),
        "logic",
        ">>> is_even(4)\n1\n>>> is_even(3)\nfalse\n",
        1.0,
    )
    .show_stdout(false)
    .run();

    assert_eq!(outcome.score(), Some(0.5));
}

#[test]
fn ellipsis_and_text_expectations() {
    let modules = Modules::new().register(
        Module::new("text")
            .with_function("describe", |_console, args| {
                Ok(json!(format!("a list of {} items", args.len())))
            })
            .with_function("range", |_console, args| {
                let n = args.first().and_then(Value::as_u64).unwrap_or(0);
                Ok(json!((0..n).collect::<Vec<_>>()))
            }),
    );

    let session = "
>>> describe(1, 2, 3)
\"a list of ...\"
>>> range(5)
[0, 1, ..., 4]
";
    let outcome = doctest_case(&modules, Module::default(), "text", session, 1.0)
        .show_stdout(false)
        .run();

    assert_eq!(outcome.score(), Some(1.0), "{}", outcome.feedback());
}

#[test]
fn sessions_without_examples_fail() {
    let modules = Modules::new().register(arithmetic(false));
    let outcome = doctest_case(&modules, Module::default(), "arithmetic", "No examples.", 1.0)
        .show_stdout(false)
        .run();

    assert!(!outcome.passed());
    assert_eq!(outcome.score(), None);
    assert!(outcome.feedback().starts_with("No examples were found"));
}

#[test]
fn unknown_functions_fail_only_their_example() {
    let modules = Modules::new().register(arithmetic(false));
    let outcome = doctest_case(
        &modules,
        Module::default(),
        "arithmetic",
        ">>> add(1, 1)\n2\n>>> subtract(2, 1)\n1\n",
        1.0,
    )
    .show_stdout(false)
    .run();

    assert_eq!(outcome.score(), Some(0.5));
    assert!(
        outcome
            .feedback()
            .contains("Exception raised:\n    function `subtract` is not defined\n")
    );
}

#[test]
fn panicking_examples_are_caught() {
    let modules = Modules::new().register(Module::new("lists").with_function(
        "first",
        |_console, args| {
            let items = args.first().and_then(Value::as_array).cloned().unwrap_or_default();
            Ok(items[0].clone())
        },
    ));

    let outcome = doctest_case(
        &modules,
        Module::default(),
        "lists",
        ">>> first([7, 8])\n7\n>>> first([])\nError: index out of bounds\n",
        2.0,
    )
    .show_stdout(false)
    .run();

    assert_eq!(outcome.score(), Some(2.0), "{}", outcome.feedback());
}

#[test]
fn examples_asking_for_input_fail_the_case() {
    let modules = Modules::new().register(Module::new("io").with_function(
        "ask",
        |console, _args| Ok(json!(console.input("? ").unwrap_or_default())),
    ));

    let outcome = doctest_case(&modules, Module::default(), "io", ">>> ask()\n\"\"\n", 1.0)
        .show_stdout(false)
        .run();

    assert!(!outcome.passed());
    assert_eq!(outcome.feedback(), INPUT_NOT_ALLOWED);
}

#[test]
fn missing_module_is_a_runtime_error() {
    let outcome = doctest_case(&Modules::new(), Module::default(), "arithmetic", SESSION, 1.0)
        .show_stdout(false)
        .run();

    assert!(outcome.feedback().contains("No module named 'arithmetic'"));
}
