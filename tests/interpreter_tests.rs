mod common;

use common::{eval_output, interpreter, interpreter_with};
use seforth::{
    ErrorCode, ForthInterpreter, RuntimeConfig,
    lang::hashing::Hash,
    runtime::interpreter::{ExecPosition, ExecutionControl, InterpreterStack, WordManagement},
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn print_numbers() {
    assert_eq!(eval_output("1 1 + ."), "2 ");
    assert_eq!(eval_output("-7 ."), "-7 ");
    assert_eq!(eval_output("255 hex . decimal"), "ff ");
    assert_eq!(eval_output("-1 u."), "18446744073709551615 ");
}

#[test]
fn definitions_run_when_called() {
    assert_eq!(eval_output(": square dup * ; 5 square ."), "25 ");
}

#[test]
fn print_characters_and_strings() {
    assert_eq!(eval_output("65 emit space 66 emit cr"), "A B\n");
    assert_eq!(eval_output(".\" hello world\" cr"), "hello world\n");
    assert_eq!(eval_output(": greet .\" hi\" ; greet greet"), "hihi");
    assert_eq!(eval_output("s\" typed\" type"), "typed");
    assert_eq!(eval_output("3 spaces"), "   ");
    assert_eq!(eval_output("1 2 3 .s"), "<3> 1 2 3 ");
}

#[test]
fn print_at_compile_time() {
    assert_eq!(eval_output(": f .( while compiling) 1 ;"), "while compiling");
}

#[test]
fn abort_with_message_resets_without_a_fault() {
    let (mut interp, output) = interpreter();

    interp.feed_str(": check abort\" failed\" ; 1 2 check 3 ");

    assert_eq!(output.text(), "failed\n");
    assert_eq!(interp.state().stack(), &[3]);
    assert!(interp.take_error().is_none());
}

#[test]
fn abort_clears_the_stacks() {
    let (mut interp, _) = interpreter();

    interp.feed_str("1 2 abort 3 ");

    assert_eq!(interp.state().stack(), &[3]);
    assert!(interp.is_running());
}

#[test]
fn stack_overflow_is_a_fault() {
    let (mut interp, _) = interpreter_with(RuntimeConfig::default().with_data_stack_size(4));

    interp.feed_str("1 2 3 4 5 ");

    let error = interp.take_error().unwrap();
    assert_eq!(error.code(), ErrorCode::StackBound);
    assert!(interp.state().stack().is_empty());
    assert_eq!(interp.state().position(), ExecPosition::Idle);

    // The interpreter carries on after a fault.
    interp.feed_str("7 ");
    assert_eq!(interp.state().stack(), &[7]);
}

#[test]
fn runaway_definitions_overflow_into_a_fault() {
    let (mut interp, _) = interpreter();

    interp.feed_str(": fill begin 1 again ; fill ");

    let error = interp.take_error().unwrap();
    assert_eq!(error.code(), ErrorCode::StackBound);
    assert!(interp.state().stack().is_empty());
    assert_eq!(interp.state().call_depth(), 0);
    assert_eq!(interp.state().position(), ExecPosition::Idle);

    interp.feed_str("2 3 + ");
    assert_eq!(interp.state().stack(), &[5]);
}

#[test]
fn names_need_not_be_utf8() {
    let (mut interp, _) = interpreter();

    interp.feed_bytes(b": caf\xe9 42 ; caf\xe9 ");

    assert!(interp.take_diagnostic().is_none());
    assert_eq!(interp.state().stack(), &[42]);
}

#[test]
fn macros_replay_the_bytes_they_were_given() {
    let (mut interp, output) = interpreter();

    interp.feed_bytes(b":macro m .\" \xe9\" ; m ");

    assert_eq!(output.bytes(), vec![0xe9]);
}

#[test]
fn built_in_names_do_not_collide() {
    let (interp, _) = interpreter();
    let names = [
        "dup", "drop", "swap", "over", "rot", "pick", "roll", "depth", "+", "-", "*", "/", "mod",
        "/mod", "*/", "=", "<>", "<", ">", "and", "or", "xor", "invert", "lshift", "rshift", ".",
        "emit", "type", "execute", "if", "else", "then", "begin", "until", "do", "loop", "i", "j",
        ":", ";", "(", "\\", "s\"", ".\"", "nip", "tuck", "min", "max",
    ];

    for name in names {
        let entry = interp.state().dictionary().find_name(name).unwrap();
        assert_eq!(entry.name.as_deref(), Some(name));
    }
}

#[test]
fn parser_reset_recovers_from_malformed_input() {
    let (mut interp, _) = interpreter();

    interp.feed_str(": f [ ; ");
    assert_eq!(interp.take_diagnostic().unwrap().code(), ErrorCode::Impossible);
    assert!(!interp.parser().is_balanced());

    interp.reset_parser();
    interp.feed_str(": g 5 ; g ");

    assert!(interp.parser().is_balanced());
    assert_eq!(interp.state().stack(), &[5]);
}

#[test]
fn faults_inside_words_unwind_every_frame() {
    let (mut interp, _) = interpreter();

    interp.feed_str(": inner 1 0 / ; : outer 5 0 do inner loop ; 9 outer ");

    assert_eq!(interp.take_error().unwrap().code(), ErrorCode::Arithmetic);
    assert!(interp.state().stack().is_empty());
    assert_eq!(interp.state().call_depth(), 0);
    assert_eq!(interp.state().loop_depth(), 0);
    assert_eq!(interp.state().fault_count(), 1);
}

#[test]
fn unknown_words_leave_the_stack_alone() {
    let (mut interp, _) = interpreter();

    interp.feed_str("1 2 bogus ");

    let diagnostic = interp.take_diagnostic().unwrap();
    assert_eq!(diagnostic.code(), ErrorCode::NotFound);
    assert_eq!(diagnostic.word(), Some("bogus"));
    assert_eq!(interp.state().stack(), &[1, 2]);
    assert!(interp.take_error().is_none());
}

#[test]
fn hooks_are_balanced_after_every_construct() {
    let (mut interp, _) = interpreter();

    interp.feed_str(": f ( x -- y ) \\ comment\n s\" a\" 2drop .\" b\" ; ");
    assert!(interp.parser().is_balanced());
    assert_eq!(interp.parser().hook_depth(), 0);

    interp.feed_str(":macro m 1 ( one ) ; ' f ");
    assert!(interp.parser().is_balanced());

    interp.feed_str(": g ");
    assert!(!interp.parser().is_balanced());
    assert!(interp.parser().is_compiling());

    interp.feed_str("; ");
    assert!(interp.parser().is_balanced());
}

#[test]
fn numbers_are_read_in_the_current_base() {
    let (mut interp, _) = interpreter();

    interp.feed_str("hex : f 10 ; decimal f 10 ");

    assert_eq!(interp.state().stack(), &[16, 10]);
}

#[test]
fn words_shadow_numbers() {
    let (mut interp, _) = interpreter();

    interp.feed_str("hex ");
    interp.feed_str("0 constant add ");
    interp.feed_str("add ");

    assert_eq!(interp.state().stack(), &[0]);
}

#[test]
fn aliases_resolve_transitively() {
    let (mut interp, _) = interpreter();

    interp.feed_str("defer a defer b ' b is a : c 9 ; ' c is b a ");

    assert_eq!(interp.state().stack(), &[9]);
}

#[test]
fn alias_cycles_are_caught() {
    let (mut interp, _) = interpreter();

    interp.feed_str("defer a defer b ' b is a ' a is b a ");

    assert_eq!(interp.take_error().unwrap().code(), ErrorCode::InvalidCall);
}

#[test]
fn anonymous_words_get_special_hashes() {
    let (mut interp, _) = interpreter();

    interp.feed_str(":noname 1 ; ");

    let cell = interp.state_mut().pop().unwrap();
    let hash = Hash::from_cell(cell).unwrap();

    assert!(hash.is_special());
    assert!(interp.state().dictionary().find(hash).is_some());
}

#[test]
fn words_can_be_found_after_they_are_defined() {
    let (mut interp, output) = interpreter();

    assert!(interp.state().dictionary().find_name("triple").is_none());

    interp.feed_str(": triple 3 * ; words ");

    assert!(interp.state().dictionary().find_name("triple").is_some());
    assert!(interp.state().dictionary().find_name("TRIPLE").is_some());
    assert!(output.text().contains("triple"));
}

#[test]
fn instances_are_independent() {
    let (mut first, _) = interpreter();
    let (mut second, _) = interpreter();

    first.feed_str(": only-here 1 ; only-here ");
    second.feed_str("only-here ");

    assert_eq!(first.state().stack(), &[1]);
    assert!(second.state().stack().is_empty());
    assert_eq!(
        second.take_diagnostic().unwrap().code(),
        ErrorCode::NotFound
    );
}

#[test]
fn bye_stops_feeding() {
    let (mut interp, _) = interpreter();

    interp.feed_str("1 bye 2 ");

    assert!(!interp.is_running());
    assert_eq!(interp.state().stack(), &[1]);

    // Single bytes are always processed.
    for byte in b"4 " {
        interp.feed_char(*byte);
    }
    assert_eq!(interp.state().stack(), &[1, 4]);

    interp.restart();
    interp.feed_str("3 ");
    assert_eq!(interp.state().stack(), &[1, 4, 3]);
}

#[test]
fn exit_at_the_top_level_stops_the_interpreter() {
    let (mut interp, _) = interpreter();

    interp.feed_str("exit 5 ");

    assert!(!interp.is_running());
    assert!(interp.state().stack().is_empty());
}

#[test]
fn case_sensitive_names() {
    let (mut interp, _) =
        interpreter_with(RuntimeConfig::default().with_case_insensitive(false));

    interp.feed_str(": Foo 1 ; Foo foo ");

    assert_eq!(interp.state().stack(), &[1]);
    assert_eq!(
        interp.take_diagnostic().unwrap().code(),
        ErrorCode::NotFound
    );
}

#[test]
fn prelude_can_be_left_out() {
    let (mut interp, _) = interpreter_with(RuntimeConfig::default().with_prelude(false));

    interp.feed_str("1 2 nip ");

    assert_eq!(
        interp.take_diagnostic().unwrap().code(),
        ErrorCode::NotFound
    );
    assert_eq!(interp.state().stack(), &[1, 2]);
}

#[test]
fn invalid_configurations_are_rejected() {
    let config = RuntimeConfig::default().with_data_stack_size(0);

    let error = ForthInterpreter::with_config(config).err().unwrap();

    assert_eq!(error.code(), ErrorCode::ConfigError);
}

#[test]
fn host_arguments_and_exit_code() {
    let (mut interp, output) = interpreter();

    interp
        .feed_arguments(vec!["alpha".to_string(), "beta".to_string()])
        .unwrap();
    interp.feed_str("argc . 1 arg type 3 exit-code! ");

    assert_eq!(output.text(), "2 beta");
    assert_eq!(interp.exit_code(), 3);
}

#[test]
fn reading_arguments_adds_no_entries() {
    let (mut interp, output) = interpreter();

    interp.feed_arguments(vec!["alpha".to_string()]).unwrap();
    interp.feed_str(": f 100 0 do 0 arg 2drop loop ; ");

    let entries = interp.state().dictionary().len();
    interp.feed_str("f f 0 arg type ");

    assert!(interp.take_error().is_none());
    assert_eq!(interp.state().dictionary().len(), entries);
    assert_eq!(output.text(), "alpha");
}

#[test]
fn missing_arguments_are_a_fault() {
    let (mut interp, _) = interpreter();

    interp.feed_str("0 arg ");

    assert_eq!(interp.take_error().unwrap().code(), ErrorCode::InvalidCall);
}

fn source_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();

    file
}

#[test]
fn feed_file_skips_a_shebang_line() {
    let (mut interp, output) = interpreter();
    let file = source_file("#!/usr/bin/env seforth\n1 2 + .\n");

    interp.feed_file(file.path()).unwrap();

    assert_eq!(output.text(), "3 ");
}

#[test]
fn feed_file_completes_the_last_token() {
    let (mut interp, output) = interpreter();
    let file = source_file(": seven 7 ; seven .");

    interp.feed_file(file.path()).unwrap();

    assert_eq!(output.text(), "7 ");
}

#[test]
fn feed_file_stops_at_the_first_fault() {
    let (mut interp, output) = interpreter();
    let file = source_file("1 . 1 0 /\n5 .\n");

    let error = interp.feed_file(file.path()).unwrap_err();

    assert_eq!(error.code(), ErrorCode::Arithmetic);
    assert_eq!(output.text(), "1 ");
}

#[test]
fn feed_file_stops_at_bye() {
    let (mut interp, output) = interpreter();
    let file = source_file("1 . bye 2 .\n");

    interp.feed_file(file.path()).unwrap();

    assert_eq!(output.text(), "1 ");
    assert!(!interp.is_running());
}

#[test]
fn feed_file_reports_missing_files() {
    let (mut interp, _) = interpreter();
    let directory = tempfile::tempdir().unwrap();

    let error = interp
        .feed_file(directory.path().join("missing.fs"))
        .unwrap_err();

    assert_eq!(error.code(), ErrorCode::InvalidFile);
}
