// End-to-end tests: source text in, output and exit value out

use synctty::interpreter::{Execution, ExecutionConfig, RuntimeError, StepKind};
use synctty::memory::value::word_to_int;
use synctty::program::{LoadError, Program};

struct Outcome {
    stdout: String,
    stderr: String,
    result: Result<i32, RuntimeError>,
    operations: u64,
}

fn run_program(source: &str) -> Outcome {
    let program = Program::load(source).expect("program should load");
    let mut execution = Execution::new(&program, ExecutionConfig { seed: Some(7) });
    let result = execution.run_to_end().map(word_to_int);
    Outcome {
        stdout: execution.take_stdout(),
        stderr: execution.take_stderr(),
        result,
        operations: execution.elementary_operations(),
    }
}

#[test]
fn test_global_is_visible_in_main() {
    let out = run_program("GLOBALS x = 5 ENDGLOBALS FUNCTION main() PRINT(INT, x) END");
    assert_eq!(out.stdout, "5");
    assert_eq!(out.result, Ok(0));
}

#[test]
fn test_double_free() {
    let out = run_program("FUNCTION main() p = MALLOC(1) FREE(p) FREE(p) END");
    assert!(matches!(
        out.result,
        Err(RuntimeError::FreeOfUnallocatedPointer { .. })
    ));
}

#[test]
fn test_break_before_print() {
    let source = "FUNCTION main() FOR(i;0;5) IF(i == 3) BREAK ENDIF PRINT(INT,i) ENDFOR END";
    let out = run_program(source);
    assert_eq!(out.stdout, "012");

    // every guard and increment costs at least one operation
    let program = Program::load(source).expect("program should load");
    let mut execution = Execution::new(&program, ExecutionConfig::default());
    let mut last = 0;
    let mut increases = 0;
    while let Ok(Some(_)) = execution.advance() {
        let now = execution.elementary_operations();
        assert!(now >= last);
        if now > last {
            increases += 1;
        }
        last = now;
    }
    assert!(increases > 10);
}

#[test]
fn test_recursive_factorial() {
    let out = run_program(
        "FUNCTION fact(n)
            IF(n <= 1) RETURN 1 ENDIF
            RETURN n * fact(n - 1)
        END
        FUNCTION main() RETURN fact(5) END",
    );
    assert_eq!(out.result, Ok(120));
}

#[test]
fn test_return_inside_loop_leaves_function() {
    let out = run_program(
        "FUNCTION find(limit)
            FOR(i; 0; limit)
                WHILE(TRUE)
                    IF(i == 2) RETURN i * 10 ENDIF
                    BREAK
                ENDWHILE
            ENDFOR
            RETURN -1
        END
        FUNCTION main() PRINT(INT, find(5)) RETURN find(1) END",
    );
    assert_eq!(out.stdout, "20");
    assert_eq!(out.result, Ok(-1));
}

#[test]
fn test_break_in_while_under_if_leaves_outer_loop_running() {
    let out = run_program(
        "FUNCTION main()
            FOR(i; 0; 3)
                n = 0
                WHILE(TRUE)
                    n = n + 1
                    IF(n > i) BREAK ENDIF
                ENDWHILE
                PRINT(INT, n)
            ENDFOR
        END",
    );
    assert_eq!(out.stdout, "123");
}

#[test]
fn test_break_outside_loop_is_rejected() {
    let err = Program::load("FUNCTION main() BREAK END").unwrap_err();
    assert!(matches!(err, LoadError::Syntax(_)));
}

#[test]
fn test_function_without_return_yields_zero() {
    let out = run_program("FUNCTION f() x = 1 END FUNCTION main() RETURN f() + 4 END");
    assert_eq!(out.result, Ok(4));
}

#[test]
fn test_locals_are_per_call() {
    let out = run_program(
        "FUNCTION set(v) x = v RETURN x END
        FUNCTION main() x = 1 y = set(9) RETURN x * 100 + y END",
    );
    assert_eq!(out.result, Ok(109));
}

#[test]
fn test_globals_are_shared() {
    let out = run_program(
        "GLOBALS counter = 0 ENDGLOBALS
        FUNCTION bump() counter = counter + 1 END
        FUNCTION main() bump() bump() bump() RETURN counter END",
    );
    assert_eq!(out.result, Ok(3));
}

#[test]
fn test_integer_arithmetic_floors() {
    let out = run_program(
        "FUNCTION main() PRINT(INT, -7 / 2, STRING, \" \", INT, -7 % 2, STRING, \" \", INT, 7 % -2) END",
    );
    assert_eq!(out.stdout, "-4 1 -1");
}

#[test]
fn test_integer_overflow_wraps() {
    let out = run_program("FUNCTION main() RETURN 2147483647 + 1 END");
    assert_eq!(out.result, Ok(i32::MIN));
}

#[test]
fn test_float_arithmetic() {
    let out = run_program("FUNCTION main() PRINT(FLOAT, 1.5 *. 2.0 +. 0.25) END");
    assert_eq!(out.stdout, "3.25");
}

#[test]
fn test_short_circuit_skips_right_side() {
    let out = run_program("FUNCTION main() IF(FALSE AND 1 / 0 == 0) PRINT(\"no\") ELSE PRINT(\"ok\") ENDIF END");
    assert_eq!(out.stdout, "ok");
    assert_eq!(out.result, Ok(0));
}

#[test]
fn test_pointers_to_locals() {
    let out = run_program(
        "FUNCTION inc(p) $p = $p + 1 END
        FUNCTION main() x = 41 inc(&x) RETURN x END",
    );
    assert_eq!(out.result, Ok(42));
}

#[test]
fn test_linked_structures() {
    let out = run_program(
        "STRUCT node value next ENDSTRUCT
        FUNCTION main()
            head = NULL
            FOR(i; 0; 4)
                n = MALLOC_STRUCT(node)
                n->value = i
                n->next = head
                head = n
            ENDFOR
            total = 0
            WHILE(head != NULL)
                total = total * 10 + head->value
                head = head->next
            ENDWHILE
            RETURN total
        END",
    );
    assert_eq!(out.result, Ok(3210));
}

#[test]
fn test_error_keeps_earlier_output() {
    let out = run_program("FUNCTION main() PRINT(\"before\") PRINTERR(\"warn\") x = 1 / 0 PRINT(\"after\") END");
    assert_eq!(out.stdout, "before");
    assert_eq!(out.stderr, "warn");
    assert!(matches!(out.result, Err(RuntimeError::MathDomain { .. })));
}

#[test]
fn test_division_by_zero_reports_divisor() {
    let out = run_program("FUNCTION main() x = 7 / 0 END");
    assert_eq!(
        out.result.unwrap_err().to_string(),
        "Line 1, Char 23 : Operation is undefined for value 0.00."
    );
}

#[test]
fn test_recursion_runs_into_heap() {
    // the block leaves only a few hundred words above the stack
    let out = run_program(
        "FUNCTION f(n) RETURN f(n + 1) END
        FUNCTION main() big = MALLOC(16777000) RETURN f(0) END",
    );
    match out.result {
        Err(RuntimeError::MemoryExceeded { variable, .. }) => assert_eq!(variable, "n"),
        other => panic!("expected MemoryExceeded, got {other:?}"),
    }
}

#[test]
fn test_malloc_returns_null_instead_of_crossing_stack() {
    let out = run_program(
        "FUNCTION main()
            big = MALLOC(16777000)
            b = MALLOC(300)
            c = MALLOC(100)
            PRINT(BOOL, b == NULL, BOOL, c == NULL)
        END",
    );
    assert_eq!(out.stdout, "TrueFalse");
    assert_eq!(out.result, Ok(0));
}

#[test]
fn test_error_messages_carry_location() {
    let out = run_program("FUNCTION main()\n  x = y\nEND");
    let err = out.result.unwrap_err();
    assert!(matches!(err, RuntimeError::UndeclaredVariable { .. }));
    assert_eq!(err.location().line, 2);
    assert!(err.to_string().starts_with("Line 2, Char"));
}

#[test]
fn test_wrong_argument_count() {
    let out = run_program("FUNCTION f(a, b) RETURN a END FUNCTION main() RETURN f(1) END");
    assert!(matches!(
        out.result,
        Err(RuntimeError::IncorrectArgumentCount { .. })
    ));
}

#[test]
fn test_null_dereference() {
    let out = run_program("FUNCTION main() p = NULL RETURN $p END");
    assert!(matches!(out.result, Err(RuntimeError::MemoryAccess { .. })));
}

#[test]
fn test_step_counts_are_stable() {
    let first = run_program("FUNCTION main() FOR(i; 0; 10) x = i * i ENDFOR END");
    let second = run_program("FUNCTION main() FOR(i; 0; 10) x = i * i ENDFOR END");
    // init + guard, then per iteration: (*, =) + increment (2) + guard
    assert_eq!(first.operations, 2 + 10 * 5);
    assert_eq!(first.operations, second.operations);
}

#[test]
fn test_read_waits_for_input() {
    let program = Program::load("FUNCTION main() RETURN READ() END").expect("program should load");
    let mut execution = Execution::new(&program, ExecutionConfig::default());

    let step = execution.advance().expect("no error").expect("a step");
    assert_eq!(step.kind, StepKind::AwaitingInput);

    execution.input_mut().push_str("00000000000000000000000000000111");
    assert_eq!(execution.run_to_end().map(word_to_int), Ok(7));
}

#[test]
fn test_iterator_ends_after_error() {
    let program = Program::load("FUNCTION main() x = $NULL END").expect("program should load");
    let execution = Execution::new(&program, ExecutionConfig::default());
    let steps: Vec<_> = execution.collect();
    assert!(matches!(steps.last(), Some(Err(RuntimeError::MemoryAccess { .. }))));
    assert_eq!(steps.iter().filter(|step| step.is_err()).count(), 1);
}
