//! End-to-end behavioral coverage driven through [`lisby_lib::eval_str`] and
//! [`lisby_lib::compile_str`], exercising arithmetic, binding, control flow,
//! closures, continuations, quotation, and macros together rather than unit
//! by unit.

use lisby_lib::{compile_str, eval_str, Program, Value, Vm};

fn run_all(src: &str) -> Vec<Value> {
    let program = compile_str(src).expect("compiles");
    let mut vm = Vm::new(program);
    vm.run(0).expect("runs");
    vm.stack().to_vec()
}

fn last(src: &str) -> Value {
    eval_str(src).unwrap_or_else(|err| panic!("eval `{src}` failed: {err}"))
}

#[test]
fn arith() {
    assert_eq!(last("(+ 10 (* 2 (/ 9 3)))"), Value::Int(16));
}

#[test]
fn floor_mod() {
    assert_eq!(last("(% 20 5)"), Value::Int(0));
    assert_eq!(last("(% -5 10)"), Value::Int(5));
}

#[test]
fn bitwise() {
    assert_eq!(last("(| 170 85)"), Value::Int(255));
    assert_eq!(last("(^ 255 128)"), Value::Int(127));
    assert_eq!(last("(& 255 7)"), Value::Int(7));
    assert_eq!(last("(~ 170)"), Value::Int(!170i64));
}

#[test]
fn conditionals() {
    let cases = [
        ("(if (< 1 10) #t #f)", true),
        ("(if (> 1 10) #t #f)", false),
        ("(if (= 1 10) #t #f)", false),
        ("(if (= 10 10) #t #f)", true),
        ("(if (<= 10 10) #t #f)", true),
        ("(if (>= 10 10) #t #f)", true),
        ("(if (not #f) #t #f)", true),
        ("(if (not #t) #t #f)", false),
    ];
    for (src, want) in cases {
        let got = last(src);
        assert_eq!(got, if want { Value::True } else { Value::False }, "{src}");
    }
}

#[test]
fn let_binding() {
    assert_eq!(last("(let ((x 123) (y 2)) (+ 1 (* x y)))"), Value::Int(247));
}

#[test]
fn let_scoping_does_not_leak_shadowed_binding() {
    let stack = run_all(
        r#"
(define res 0)
(define res2 0)
(let ((x 123))
    (let ((x 321))
        (set! res2 x))
    (set! res x))
res
res2
"#,
    );
    assert_eq!(stack[stack.len() - 2], Value::Int(123));
    assert_eq!(stack[stack.len() - 1], Value::Int(321));
}

#[test]
fn unbound_symbol_is_a_runtime_error() {
    assert!(eval_str("x").is_err());
    assert!(eval_str("(define x 123) y").is_err());
}

#[test]
fn lambda_application() {
    assert_eq!(last("((lambda (x y) (* 3 (+ x y))) 1 2)"), Value::Int(9));
}

#[test]
fn lambda_nested_capture() {
    assert_eq!(last("((lambda (y) ((lambda (x) (+ x y)) 2)) 3)"), Value::Int(5));
}

#[test]
fn lambda_define_shorthand() {
    let stack = run_all(
        r#"
(define (plusser x y) (+ x y))
(define (multer a b) (* a b))
(plusser 1 (multer 2 3))
"#,
    );
    assert_eq!(stack.last(), Some(&Value::Int(7)));
}

#[test]
fn lambda_passing() {
    let stack = run_all(
        r#"
(define (oner fun y) 321 789 (fun 10 y))
(oner (lambda (a b) (+ a b)) 20)
"#,
    );
    assert_eq!(stack.last(), Some(&Value::Int(30)));
}

#[test]
fn or_short_circuits_to_first_truthy() {
    assert_eq!(last("(or #f #f)"), Value::False);
    assert_eq!(last("(or #t #f)"), Value::True);
    assert_eq!(last("(or #t #t)"), Value::True);
    assert_eq!(last("(or #f #t)"), Value::True);
}

#[test]
fn and_short_circuits_to_first_falsy() {
    assert_eq!(last("(and #f #f)"), Value::False);
    assert_eq!(last("(and #t #f)"), Value::False);
    assert_eq!(last("(and #t #t)"), Value::True);
    assert_eq!(last("(and #f #t)"), Value::False);
}

#[test]
fn begin_evaluates_in_order_and_returns_last() {
    assert_eq!(last("(begin 1 2 3 4 5 6 7 8 9 10)"), Value::Int(10));
}

#[test]
fn set_mutates_an_existing_binding() {
    let stack = run_all(
        r#"
(define testi 123)
(set! testi 321)
testi
"#,
    );
    assert_eq!(stack.last(), Some(&Value::Int(321)));
}

#[test]
fn closures_capture_independent_state() {
    let stack = run_all(
        r#"
(define counter 0)
(define (gen-adder start)
    (lambda () (set! start (+ start 1))
    (set! counter (+ 1 counter))
    start))
(define a (gen-adder 10))
(define b (gen-adder 20))
(define eka (a))
(define toka (b))
(define kolmas (a))
(define neljas (b))
eka
toka
kolmas
neljas
counter
"#,
    );
    let tail = &stack[stack.len() - 5..];
    assert_eq!(tail, &[Value::Int(11), Value::Int(21), Value::Int(12), Value::Int(22), Value::Int(4)]);
}

#[test]
fn naive_recursive_factorial() {
    assert_eq!(
        last(
            r#"
(define (fact n)
    (if (= n 0)
        1
        (* n (fact (- n 1)))))
(fact 10)
"#
        ),
        Value::Int(3628800)
    );
}

#[test]
fn naive_recursive_fibonacci() {
    assert_eq!(
        last(
            r#"
(define (-fibo x sum)
        (if (= x 0)
            0
            (if (= x 1)
                1
                (+
                    (-fibo (- x 1) (+ sum x))
                    (-fibo (- x 2) (+ sum x))))))
(define (fibo x) (-fibo x 0))
(fibo 10)
"#
        ),
        Value::Int(55)
    );
}

#[test]
fn list_builtin_collects_heterogeneous_values() {
    let got = last(r#"(list 123 "viisi" 123.456)"#);
    assert_eq!(got, Value::List(vec![Value::Int(123), Value::String("viisi".into()), Value::Float(123.456)]));
}

#[test]
fn concat_list_joins_in_order() {
    let got = last(
        r#"
(define one (list 1 2))
(define two (list 3 4))
(:: one two (list 5 6))
"#,
    );
    assert_eq!(got, Value::List((1..=6).map(Value::Int).collect()));
}

#[test]
fn head_and_tail() {
    assert_eq!(last("(head (list 1 2 3))"), Value::Int(1));
    assert_eq!(last("(tail (list 1 2 3))"), Value::List(vec![Value::Int(2), Value::Int(3)]));
}

#[test]
fn map_via_recursive_macro_free_function() {
    let got = last(
        r#"
(define (mapr with what)
    (if (= what '())
        '()
        (:: (list (with (head what))) (mapr with (tail what)))))
(mapr
    (lambda (x) (* 2 x))
    '(1 2 3 4))
"#,
    );
    assert_eq!(got, Value::List(vec![Value::Int(2), Value::Int(4), Value::Int(6), Value::Int(8)]));
}

#[test]
fn quoted_symbol_is_a_bare_symbol_value() {
    assert_eq!(last("'x"), Value::Symbol("x".into()));
}

#[test]
fn nested_quoting_tracks_degree_per_element() {
    let got = last("''(1 '2 ''x)");
    let Value::Quoted(inner, degree) = got else { panic!("expected Quoted, got {got:?}") };
    assert_eq!(degree, 1);
    let Value::List(items) = *inner else { panic!("expected inner list") };
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], Value::Int(1));
    assert_eq!(items[1], Value::Quoted(Box::new(Value::Int(2)), 1));
    assert_eq!(items[2], Value::Quoted(Box::new(Value::Symbol("x".into())), 2));
}

#[test]
fn tail_does_not_mutate_the_original_list_binding() {
    let stack = run_all(
        r#"
(define one (list 1 2 3))
(define two (tail one))
one
two
"#,
    );
    assert_eq!(stack[stack.len() - 2], Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    assert_eq!(stack[stack.len() - 1], Value::List(vec![Value::Int(2), Value::Int(3)]));
}

#[test]
fn call_cc_escapes_with_a_value() {
    assert_eq!(last("(+ 10 (call/cc (lambda (k) (k 1) 2)))"), Value::Int(11));
}

#[test]
fn call_cc_used_as_an_early_return() {
    let stack = run_all(
        r#"
(define (inv v)
    (call/cc (lambda (return)
        (display "doing things")
        (if (= v 0.0) (return 0) #f)
        (display "otherwise doing other things")
        (/ 1 v))))
(inv 2.0)
(inv 0.0)
"#,
    );
    assert_eq!(stack[stack.len() - 2], Value::Float(0.5));
    assert_eq!(stack[stack.len() - 1], Value::Int(0));
}

#[test]
fn quasiquote_without_unquote_wraps_as_quasiquoted() {
    let got = last("```,1");
    let Value::Quasiquoted(inner, _) = got else { panic!("expected Quasiquoted, got {got:?}") };
    assert!(matches!(*inner, Value::Int(1)));
}

#[test]
fn quasiquote_splices_unquoted_expressions() {
    let got = last("`(1 ,(+ 1 2))");
    assert_eq!(got, Value::List(vec![Value::Int(1), Value::Int(3)]));
}

#[test]
fn quote_cannot_contain_unquote() {
    assert!(compile_str("'(1 ,2)").is_err());
}

#[test]
fn defmacro_substitutes_unevaluated_argument_nodes() {
    let stack = run_all(
        r#"
(defmacro (multiplier a b) (* a b))
(multiplier 5 6)
(+ (multiplier 10 7) 5)
(multiplier 2 (multiplier 3 4))
"#,
    );
    let tail = &stack[stack.len() - 3..];
    assert_eq!(tail, &[Value::Int(30), Value::Int(75), Value::Int(24)]);
}

#[test]
fn defmacro_can_build_a_loop() {
    let got = last(
        r#"
(define counter 1)
(defmacro (looperer init cond on-each action)
    (let (init (loop
        (lambda ()
            (if cond
                (begin on-each action (loop))
                #t))))
        (loop)))
(looperer
    (-i 0)
    (< -i 10)
    (set! -i (+ -i 1))
    (set! counter (* counter 2)))
counter
"#,
    );
    assert_eq!(got, Value::Int(1024));
}

#[test]
fn builtins_reify_as_values_when_referenced_unapplied() {
    let stack = run_all(
        r#"
(define (bin-op fun a b) (fun a b))
(+ 5 7)
(bin-op + 2 3)
"#,
    );
    assert_eq!(stack[stack.len() - 2], Value::Int(12));
    assert_eq!(stack[stack.len() - 1], Value::Int(5));
}

#[test]
fn serialization_round_trip_preserves_behavior() {
    let program = compile_str(
        r#"
(define (fact n)
    (if (= n 0) 1 (* n (fact (- n 1)))))
(fact 6)
"#,
    )
    .expect("compiles");
    let bytes = program.to_bytes();
    let restored = Program::from_bytes(&bytes).expect("round-trips");
    let mut vm = Vm::new(restored);
    vm.run(0).expect("runs");
    assert_eq!(vm.stack().last(), Some(&Value::Int(720)));
}
