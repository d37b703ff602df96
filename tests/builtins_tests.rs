// The built-in library as seen from SYN-C programs

use synctty::interpreter::{Execution, ExecutionConfig, RuntimeError};
use synctty::memory::value::word_to_int;
use synctty::program::Program;

fn run_program(source: &str) -> (String, String, Result<i32, RuntimeError>) {
    let program = Program::load(source).expect("program should load");
    let mut execution = Execution::new(&program, ExecutionConfig { seed: Some(7) });
    let result = execution.run_to_end().map(word_to_int);
    (execution.take_stdout(), execution.take_stderr(), result)
}

fn stdout_of(body: &str) -> String {
    let (stdout, _, result) = run_program(&format!("FUNCTION main() {body} END"));
    assert!(result.is_ok(), "unexpected error: {result:?}");
    stdout
}

fn error_of(body: &str) -> RuntimeError {
    let (_, _, result) = run_program(&format!("FUNCTION main() {body} END"));
    result.expect_err("program should fail")
}

#[test]
fn test_integer_abs() {
    assert_eq!(stdout_of("PRINT(INT, IABS(-5), INT, IABS(5))"), "55");
    assert_eq!(
        stdout_of("PRINT(INT, IABS(-2147483647 - 1))"),
        i32::MIN.to_string()
    );
}

#[test]
fn test_float_library() {
    assert_eq!(stdout_of("PRINT(FLOAT, SQRT(16.0))"), "4.0");
    assert_eq!(stdout_of("PRINT(FLOAT, FABS(-2.5))"), "2.5");
    assert_eq!(stdout_of("PRINT(FLOAT, POW(2.0, 10.0))"), "1024.0");
    assert_eq!(stdout_of("PRINT(FLOAT, FLOOR(-1.5), STRING, \" \", FLOAT, CEIL(-1.5))"), "-2.0 -1.0");
    assert_eq!(stdout_of("PRINT(FLOAT, ROUND(2.5), STRING, \" \", FLOAT, ROUND(3.5))"), "2.0 4.0");
}

#[test]
fn test_float_domain_errors() {
    assert!(matches!(error_of("x = LN(0.0)"), RuntimeError::MathDomain { .. }));
    assert!(matches!(error_of("x = SQRT(-1.0)"), RuntimeError::MathDomain { .. }));
    assert!(matches!(error_of("x = 1.0 /. 0.0"), RuntimeError::MathDomain { .. }));
}

#[test]
fn test_conversions() {
    assert_eq!(stdout_of("PRINT(FLOAT, I2F(3))"), "3.0");
    assert_eq!(stdout_of("PRINT(INT, F2I(3.9), STRING, \" \", INT, F2I(-3.9))"), "3 -3");
    assert!(matches!(error_of("x = F2I(3000000000.0)"), RuntimeError::FloatToInt { .. }));
    assert_eq!(stdout_of("PRINT(BOOL, V2B(0), BOOL, V2B(7))"), "FalseTrue");
}

#[test]
fn test_number_to_string() {
    assert_eq!(stdout_of("s = MALLOC(8) I2S(12345, s, 3) PRINT(s)"), "123");
    assert_eq!(stdout_of("s = MALLOC(8) I2S(12345, s, 20) PRINT(s)"), "12345");
    assert_eq!(stdout_of("s = MALLOC(8) I2S(12345, s, -2) PRINT(s)"), "123");
    assert_eq!(stdout_of("s = MALLOC(8) F2S(2.5, s, 10) PRINT(s)"), "2.5");
}

#[test]
fn test_string_to_number() {
    assert_eq!(stdout_of("PRINT(INT, S2I(\" 42 \") + 1)"), "43");
    assert_eq!(stdout_of("PRINT(FLOAT, S2F(\"1.25\"))"), "1.25");
    assert!(matches!(error_of("x = S2I(\"4x\")"), RuntimeError::StringToInt { .. }));
    assert!(matches!(error_of("x = S2F(\"abc\")"), RuntimeError::StringToFloat { .. }));
}

#[test]
fn test_print_formats_by_tag() {
    assert_eq!(stdout_of("PRINT(CHAR, 'a', INT, 3, \"x\", BOOL, TRUE)"), "a3xTrue");
    // a tag applies to one value only
    assert_eq!(stdout_of("PRINT(INT, 1, \"-\")"), "1-");
}

#[test]
fn test_print_tag_errors() {
    assert!(matches!(
        error_of("PRINT(INT, FLOAT, 1)"),
        RuntimeError::InvalidTypeParameter { .. }
    ));
    assert!(matches!(
        error_of("PRINT(BOOL, 3)"),
        RuntimeError::InvalidBooleanEncoding { .. }
    ));
}

#[test]
fn test_print_is_progressive() {
    let (stdout, _, result) = run_program("FUNCTION main() PRINT(INT, 1, BOOL, 2) END");
    assert_eq!(stdout, "1");
    assert!(result.is_err());
}

#[test]
fn test_printerr_goes_to_stderr() {
    let (stdout, stderr, _) = run_program("FUNCTION main() PRINT(\"a\") PRINTERR(INT, 5) FLUSH() FLUSHERR() END");
    assert_eq!(stdout, "a");
    assert_eq!(stderr, "5");
}

#[test]
fn test_malloc_and_free() {
    assert_eq!(stdout_of("a = MALLOC(3) PRINT(INT, a[0] + a[1] + a[2]) FREE(a)"), "0");
    assert!(matches!(error_of("a = MALLOC(0)"), RuntimeError::MallocInvalidSize { .. }));
    assert!(matches!(error_of("a = MALLOC(-1)"), RuntimeError::MallocInvalidSize { .. }));
    assert!(matches!(
        error_of("a = MALLOC(2) FREE(a + 1)"),
        RuntimeError::FreeOfUnallocatedPointer { .. }
    ));
}

#[test]
fn test_freed_space_is_reused() {
    assert_eq!(
        stdout_of("a = MALLOC(2) FREE(a) b = MALLOC(2) PRINT(BOOL, a == b)"),
        "True"
    );
}

#[test]
fn test_malloc_struct() {
    let (_, _, result) = run_program(
        "STRUCT pair left right ENDSTRUCT
        FUNCTION main() p = MALLOC_STRUCT(pair) p->right = 4 RETURN p->left + p->right END",
    );
    assert_eq!(result, Ok(4));

    let (_, _, result) = run_program("FUNCTION main() p = MALLOC_STRUCT(nothing) END");
    assert!(matches!(result, Err(RuntimeError::UndeclaredStructure { .. })));
}

#[test]
fn test_rand_is_seeded() {
    assert_eq!(
        stdout_of("SRAND(4) a = RAND() SRAND(4) b = RAND() PRINT(BOOL, a == b)"),
        "True"
    );
    assert_eq!(
        stdout_of("r = RAND() PRINT(BOOL, r >=. 0.0 AND r <. 1.0)"),
        "True"
    );
}

#[test]
fn test_elementary_operations_counter() {
    let (_, _, result) = run_program("FUNCTION main() x = 1 RETURN ELEMENTARY_OPERATIONS(INT) END");
    assert_eq!(result, Ok(1));
    assert_eq!(
        stdout_of("x = 1 PRINT(FLOAT, ELEMENTARY_OPERATIONS(FLOAT))"),
        "1.0"
    );
}

#[test]
fn test_read_without_input_fails() {
    assert!(matches!(error_of("x = READ()"), RuntimeError::NoInputAvailable { .. }));
}
