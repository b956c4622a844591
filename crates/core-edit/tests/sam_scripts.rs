//! Whole-script runs through the public API.

use core_edit::{Sam, SamError};
use core_state::{ElogWarning, Text};
use pretty_assertions::assert_eq;

const SRC: &str = "func a() {\n\treturn 1\n}\n\nfunc b() {\n\treturn 2\n}\n";

fn run(script: &str) -> Text {
    let mut t = Text::new(SRC);
    Sam::new().run(&mut t, script).unwrap();
    t
}

#[test]
fn rename_everywhere() {
    let t = run(",x/func/c/fn/");
    assert_eq!(
        t.string(),
        "fn a() {\n\treturn 1\n}\n\nfn b() {\n\treturn 2\n}\n"
    );
}

#[test]
fn empty_first_body() {
    let t = run("/^func/+,/^}/-d");
    assert_eq!(
        t.string(),
        "func a() {\n}\n\nfunc b() {\n\treturn 2\n}\n"
    );
}

#[test]
fn expand_tabs_on_every_line() {
    let t = run(r"1,$s/\t/    /g");
    assert!(!t.string().contains('\t'));
    assert!(t.string().contains("    return 1"));
}

#[test]
fn nested_loops_edit_only_matching_lines() {
    let t = run(",x/.*\\n/g/return/s/[0-9]/N/");
    assert_eq!(
        t.string(),
        "func a() {\n\treturn N\n}\n\nfunc b() {\n\treturn N\n}\n"
    );
}

#[test]
fn whole_script_undoes_at_once() {
    let mut t = Text::new(SRC);
    Sam::new()
        .run(&mut t, ",x/return/c/yield/\n$a/\\/\\/ end\\n/")
        .unwrap();
    assert!(t.string().ends_with("}\n// end\n"));
    assert!(t.string().contains("yield 2"));
    t.undo();
    assert_eq!(t.string(), SRC);
}

#[test]
fn successive_commands_keep_source_addresses() {
    // The second command addresses line 5 of the original text even though
    // the first one adds a line above it.
    let mut t = Text::new(SRC);
    let report = Sam::new().run(&mut t, "1i/\\/\\/ header\\n/\n5c/\\/\\/ b\\n/").unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(
        t.string(),
        "// header\nfunc a() {\n\treturn 1\n}\n\n// b\n\treturn 2\n}\n"
    );
}

#[test]
fn out_of_order_script_reports_warning() {
    let mut t = Text::new(SRC);
    let report = Sam::new().run(&mut t, "5d\n3d\n1d").unwrap();
    assert_eq!(
        report.warnings,
        vec![ElogWarning::OutOfSequence, ElogWarning::ResultProbablyWrong]
    );
}

#[test]
fn failed_script_leaves_text() {
    let mut t = Text::new(SRC);
    let err = Sam::new().run(&mut t, ",x/return/d\n/missing/d").unwrap_err();
    assert!(matches!(err, SamError::NoMatch(_)));
    assert_eq!(t.string(), SRC);
    assert!(!t.dirty());
}
