use pretty_assertions::assert_eq;
use tinylisp::{Environment, LispError, Value, evaluator, parser};

/// Helper function to parse, evaluate and render an expression
fn eval_string(input: &str, env: &mut Environment) -> Result<String, LispError> {
    let expr = parser::parse(input)?;
    evaluator::eval(&expr, env).map(|value| value.to_string())
}

/// Helper function to parse and evaluate with fresh environment
fn eval_fresh(input: &str) -> Result<String, LispError> {
    let mut env = evaluator::create_global_env();
    eval_string(input, &mut env)
}

#[test]
fn test_literal_round_trip() {
    assert_eq!(eval_fresh("42").unwrap(), "42");
    assert_eq!(eval_fresh("-7").unwrap(), "-7");
    assert_eq!(eval_fresh("t").unwrap(), "T");
    assert_eq!(eval_fresh("nil").unwrap(), "NIL");
    assert_eq!(eval_fresh("()").unwrap(), "NIL");
    assert_eq!(eval_fresh("(quote (1 (t nil) ()))").unwrap(), "(1 (T NIL) NIL)");
    assert_eq!(eval_fresh("(QUOTE (a B c))").unwrap(), "(A B C)");
    assert_eq!(
        eval_fresh("(quote (Foo bar))").unwrap(),
        eval_fresh("(quote (FOO BAR))").unwrap()
    );
}

#[test]
fn test_quote() {
    assert_eq!(eval_fresh("(quote (1 2 3))").unwrap(), "(1 2 3)");
    assert_eq!(eval_fresh("(quote hello)").unwrap(), "HELLO");
    assert_eq!(eval_fresh("(quote (+ 1 2))").unwrap(), "(+ 1 2)");
    assert_eq!(eval_fresh("(quote (quote x))").unwrap(), "(QUOTE X)");
}

#[test]
fn test_nested_arithmetic() {
    assert_eq!(eval_fresh("(+ (* 2 3) (- 8 2))").unwrap(), "12");
    assert_eq!(eval_fresh("(* (+ 1 2) (- 5 2))").unwrap(), "9");
    assert_eq!(eval_fresh("(abs (- 3 10))").unwrap(), "7");
}

#[test]
fn test_comparisons_and_logic() {
    assert_eq!(eval_fresh("(< 3 5)").unwrap(), "T");
    assert_eq!(eval_fresh("(>= 3 5)").unwrap(), "NIL");
    assert_eq!(eval_fresh("(/= 1 2)").unwrap(), "T");
    assert_eq!(eval_fresh("(and (> 5 3) (< 2 4))").unwrap(), "T");
    assert_eq!(eval_fresh("(or (= 1 2) (= 2 3))").unwrap(), "NIL");
    assert_eq!(eval_fresh("(not nil)").unwrap(), "T");
    assert_eq!(eval_fresh("(not 0)").unwrap(), "NIL");
    assert_eq!(eval_fresh("(equal (list 1 2) (quote (1 2)))").unwrap(), "T");
}

#[test]
fn test_list_operations() {
    assert_eq!(eval_fresh("(list 1 2 3)").unwrap(), "(1 2 3)");
    assert_eq!(eval_fresh("(list)").unwrap(), "NIL");
    assert_eq!(eval_fresh("(car (list 1 2 3))").unwrap(), "1");
    assert_eq!(eval_fresh("(cdr (list 1 2 3))").unwrap(), "(2 3)");
    assert_eq!(eval_fresh("(cdr (list 1))").unwrap(), "NIL");
    assert_eq!(eval_fresh("(cons 0 (list 1 2))").unwrap(), "(0 1 2)");
    assert_eq!(eval_fresh("(cons 0 nil)").unwrap(), "(0)");
    assert_eq!(eval_fresh("(append (list 1) (list 2 3))").unwrap(), "(1 2 3)");
    assert_eq!(eval_fresh("(last (list 1 2 3))").unwrap(), "(3)");
    assert_eq!(eval_fresh("(null (cdr (list 1)))").unwrap(), "T");
    assert_eq!(eval_fresh("(atom (quote a))").unwrap(), "T");
    assert_eq!(eval_fresh("(atom (list 1))").unwrap(), "NIL");
}

#[test]
fn test_if_nil_semantics() {
    assert_eq!(eval_fresh("(if nil 1 2)").unwrap(), "2");
    assert_eq!(eval_fresh("(if 0 1 2)").unwrap(), "1");
    assert_eq!(eval_fresh("(if (list) 1 2)").unwrap(), "2");
}

#[test]
fn test_defun_and_call() {
    let mut env = evaluator::create_global_env();
    assert_eq!(eval_string("(defun add (x y) (+ x y))", &mut env).unwrap(), "ADD");
    assert_eq!(eval_string("(add 2 3)", &mut env).unwrap(), "5");
    assert_eq!(eval_string("add", &mut env).unwrap(), "#<FUNCTION ADD>");
    assert_eq!(eval_string("car", &mut env).unwrap(), "#<BUILTIN CAR>");
}

#[test]
fn test_call_time_snapshot_and_isolation() {
    let mut env = evaluator::create_global_env();

    // Defined before x exists, observes the value set afterwards
    eval_string("(defun get-x () x)", &mut env).unwrap();
    eval_string("(setq x 5)", &mut env).unwrap();
    assert_eq!(eval_string("(get-x)", &mut env).unwrap(), "5");

    // setq inside a call is invisible at the top level
    eval_string("(defun set-x (v) (setq x v))", &mut env).unwrap();
    assert_eq!(eval_string("(set-x 10)", &mut env).unwrap(), "10");
    assert_eq!(eval_string("x", &mut env).unwrap(), "5");
    assert_eq!(eval_string("(get-x)", &mut env).unwrap(), "5");
}

#[test]
fn test_recursive_functions() {
    let mut env = evaluator::create_global_env();
    eval_string(
        "(defun fact (n) (if (= n 0) 1 (* n (fact (- n 1)))))",
        &mut env,
    )
    .unwrap();
    assert_eq!(eval_string("(fact 0)", &mut env).unwrap(), "1");
    assert_eq!(eval_string("(fact 6)", &mut env).unwrap(), "720");

    eval_string(
        "(defun len (l) (if (null l) 0 (+ 1 (len (cdr l)))))",
        &mut env,
    )
    .unwrap();
    assert_eq!(eval_string("(len (quote (a b c d)))", &mut env).unwrap(), "4");

    eval_string(
        "(defun rev (l acc) (if (null l) acc (rev (cdr l) (cons (car l) acc))))",
        &mut env,
    )
    .unwrap();
    assert_eq!(eval_string("(rev (list 1 2 3) nil)", &mut env).unwrap(), "(3 2 1)");
}

#[test]
fn test_higher_order_functions() {
    let mut env = evaluator::create_global_env();
    eval_string("(defun twice (f x) (f (f x)))", &mut env).unwrap();
    eval_string("(defun inc (x) (+ x 1))", &mut env).unwrap();
    assert_eq!(eval_string("(twice inc 5)", &mut env).unwrap(), "7");
    assert_eq!(eval_string("(twice abs -5)", &mut env).unwrap(), "5");
    eval_string(
        "(defun mapcar1 (f l) (if (null l) nil (cons (f (car l)) (mapcar1 f (cdr l)))))",
        &mut env,
    )
    .unwrap();
    assert_eq!(eval_string("(mapcar1 inc (list 1 2 3))", &mut env).unwrap(), "(2 3 4)");
}

#[test]
fn test_structural_errors() {
    assert_eq!(eval_fresh("(1 2"), Err(LispError::UnbalancedOpen));
    assert_eq!(eval_fresh("1)"), Err(LispError::UnbalancedClose));
    assert_eq!(
        eval_fresh("1 2"),
        Err(LispError::MultipleTopLevelForms { found: 2 })
    );
    assert_eq!(
        eval_fresh("(1) (2)"),
        Err(LispError::MultipleTopLevelForms { found: 2 })
    );
    assert_eq!(
        eval_fresh(""),
        Err(LispError::MultipleTopLevelForms { found: 0 })
    );
    // One form by the counting rule, rejected only when evaluated
    assert_eq!(
        eval_fresh("(1 2)"),
        Err(LispError::NotCallable("1".to_string()))
    );
}

#[test]
fn test_unicode_whitespace_separates_tokens() {
    assert_eq!(eval_fresh("(+ 1\u{a0}2)").unwrap(), "3");
    assert_eq!(eval_fresh("(list\x0b1\x0c2)").unwrap(), "(1 2)");
    assert_eq!(
        eval_fresh("1\x0c2"),
        Err(LispError::MultipleTopLevelForms { found: 2 })
    );
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let input = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
    let err = eval_fresh(&input).unwrap_err();
    assert_eq!(
        err,
        LispError::TooDeep {
            limit: parser::MAX_DEPTH
        }
    );
    assert!(err.is_syntax_error());
}

#[test]
fn test_error_messages() {
    assert_eq!(
        eval_fresh("(foo)").unwrap_err().to_string(),
        "cannot find symbol FOO"
    );
    assert_eq!(
        eval_fresh("(setq 1 2)").unwrap_err().to_string(),
        "1 is not a symbol"
    );
    assert_eq!(
        eval_fresh("(defun f x x)").unwrap_err().to_string(),
        "X is not a list"
    );
    assert_eq!(
        eval_fresh("(if t 1)").unwrap_err().to_string(),
        "IF expected 3 arguments, got 2"
    );
    assert_eq!(eval_fresh("(1 2").unwrap_err().to_string(), "unpaired \"(\"");
}

#[test]
fn test_errors_do_not_reset_environment() {
    let mut env = evaluator::create_global_env();
    eval_string("(setq kept 1)", &mut env).unwrap();
    assert!(eval_string("(car nil)", &mut env).is_err());
    assert!(eval_string("(kept", &mut env).is_err());
    assert_eq!(eval_string("kept", &mut env).unwrap(), "1");
}

#[test]
fn test_case_insensitive_symbols() {
    let mut env = evaluator::create_global_env();
    eval_string("(SETQ Counter 3)", &mut env).unwrap();
    assert_eq!(eval_string("counter", &mut env).unwrap(), "3");
    assert_eq!(env.get("counter"), Some(Value::Integer(3)));
}
