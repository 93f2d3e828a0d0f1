use tinylisp::evaluator;

fn main() {
    println!("=== tinylisp demo ===\n");

    let mut env = evaluator::create_global_env();

    // Each line runs against the same root environment, in order
    let session = [
        ("(+ 1 2)", "Addition"),
        ("(quote (1 2 3))", "Quoted list"),
        ("(if 0 (quote yes) (quote no))", "Zero is true"),
        ("(if () (quote yes) (quote no))", "The empty list is nil"),
        ("(defun fact (n) (if (<= n 1) 1 (* n (fact (- n 1)))))", "Recursive definition"),
        ("(fact 10)", "Recursive call"),
        ("(defun show () x)", "Reads a global defined later"),
        ("(setq x 5)", "Global binding"),
        ("(show)", "Sees the binding made after definition"),
        ("(defun bump () (setq x 99))", "Assigns inside a call"),
        ("(bump)", "Call result"),
        ("x", "Top-level x is unchanged"),
        ("(car nil)", "Errors leave the session usable"),
        ("(cons 0 (list 1 2))", "After an error"),
    ];

    for (source, description) in session {
        println!("--- {} ---", description);
        println!("> {}", source);
        match evaluator::eval_str(source, &mut env) {
            Ok(result) => println!("{}", result),
            Err(e) => println!("Error: {}", e),
        }
        println!();
    }

    println!("=== Demo Complete ===");
}
