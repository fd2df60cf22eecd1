//! Unit tests for the token-scan state machine and its edge cases.

use std::collections::BTreeMap;

use rstest::rstest;
use serial_test::serial;

use crate::builtin::Helper;
use crate::error::CliError;
use crate::registry::ParserRegistry;
use crate::value::Json;

use super::{FieldDecl, FlagRecord, FlagSet};

#[derive(Default)]
struct ArgT {
    short: bool,
    short2: bool,
    both: String,
    required: i8,
    dft: u8,
    un_name: u16,
}

impl FlagRecord for ArgT {
    fn fields(&mut self) -> Vec<FieldDecl<'_>> {
        vec![
            FieldDecl::value("short", &mut self.short)
                .named("s")
                .usage("short flag"),
            FieldDecl::value("short2", &mut self.short2)
                .named("2")
                .usage("another short flag"),
            FieldDecl::value("both", &mut self.both)
                .named("S,long")
                .usage("short and long flags"),
            FieldDecl::value("required", &mut self.required)
                .named("*required")
                .usage("required flag"),
            FieldDecl::value("dft", &mut self.dft)
                .named("dft,default")
                .default_value("102")
                .usage("default value"),
            FieldDecl::value("un_name", &mut self.un_name).usage("unnamed field"),
        ]
    }
}

fn bind(args: &[&str]) -> Result<(ArgT, FlagSet), CliError> {
    let mut record = ArgT::default();
    let registry = ParserRegistry::new();
    let outcome = FlagSet::bind(&mut record, args.iter().copied(), &registry)?;
    Ok((record, outcome))
}

#[test]
fn defaults_apply_before_any_token() {
    let (record, _) = bind(&["--required=0"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.dft, 102);
    assert_eq!(record.required, 0);
}

#[test]
fn explicit_tokens_override_defaults() {
    let (record, _) =
        bind(&["--required=0", "--dft", "55"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.dft, 55);

    let (by_alias, _) =
        bind(&["--required=0", "--default", "55"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(by_alias.dft, 55);
}

#[test]
fn missing_required_fields_report_in_declaration_order() {
    let err = bind(&[]);
    match err {
        Err(CliError::MissingRequired { names }) => {
            assert_eq!(names, vec!["--required"]);
        }
        other => panic!("expected MissingRequired, got {other:?}"),
    }
}

#[test]
fn every_missing_required_field_gets_its_own_line() {
    #[derive(Default)]
    struct ThreeRequired {
        alpha: String,
        beta: u8,
        gamma: bool,
    }

    impl FlagRecord for ThreeRequired {
        fn fields(&mut self) -> Vec<FieldDecl<'_>> {
            vec![
                FieldDecl::value("alpha", &mut self.alpha).named("*a,alpha"),
                FieldDecl::value("beta", &mut self.beta).named("*b,beta"),
                FieldDecl::value("gamma", &mut self.gamma).named("*g"),
            ]
        }
    }

    let mut record = ThreeRequired::default();
    let registry = ParserRegistry::new();
    match FlagSet::bind(&mut record, ["-b", "3"], &registry) {
        Err(err @ CliError::MissingRequired { .. }) => {
            assert_eq!(
                err.to_string(),
                "required argument `--alpha` missing\nrequired argument `-g` missing"
            );
        }
        other => panic!("expected MissingRequired, got {other:?}"),
    }
}

#[rstest]
#[case(&["--required=0", "-Q"], "-Q")]
#[case(&["--required=0", "--KdjiiejdfwkHJH"], "--KdjiiejdfwkHJH")]
fn unknown_flags_are_undefined(#[case] args: &[&str], #[case] want: &str) {
    match bind(args) {
        Err(CliError::UndefinedFlag { name }) => assert_eq!(name, want),
        other => panic!("expected UndefinedFlag, got {other:?}"),
    }
}

#[test]
fn fold_group_sets_every_boolean() {
    let (record, _) = bind(&["--required=0", "-s2"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert!(record.short);
    assert!(record.short2);
}

#[test]
fn fold_group_rejects_non_boolean_members() {
    match bind(&["--required=0", "-sS"]) {
        Err(CliError::NonBooleanFold { name }) => assert_eq!(name, "-S"),
        other => panic!("expected NonBooleanFold, got {other:?}"),
    }
}

#[test]
fn siamese_short_flag_binds_the_remainder_as_value() {
    let (record, _) = bind(&["--required=0", "-Sfoo"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.both, "foo");
}

#[rstest]
#[case::alone(&["--required=0", "-s"], &[])]
#[case::word(&["--required=0", "-s", "not-a-bool"], &["not-a-bool"])]
#[case::zero(&["--required=0", "-s", "0"], &["0"])]
#[case::truthy(&["--required=0", "-s", "true"], &["true"])]
fn bare_boolean_flags_assert_true_and_leave_the_next_token(
    #[case] args: &[&str],
    #[case] free: &[&str],
) {
    let (record, outcome) = bind(args).unwrap_or_else(|e| panic!("bind: {e}"));
    assert!(record.short);
    assert_eq!(outcome.free_args(), free);
}

#[rstest]
#[case("-s=true", true)]
#[case("-s=yes", true)]
#[case("-s=1", true)]
#[case("-s=0", false)]
#[case("-s=no", false)]
#[case("-s=none", false)]
#[case("-s=false", false)]
fn attached_boolean_values_use_the_token_table(#[case] token: &str, #[case] want: bool) {
    let (record, _) = bind(&["--required=0", token]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.short, want);
}

#[test]
fn attached_boolean_values_reject_unrecognised_tokens() {
    let err = bind(&["--required=0", "-s=not-a-bool"]);
    assert!(matches!(err, Err(CliError::InvalidValue { .. })));
}

#[test]
fn synthesised_long_name_binds_the_unannotated_field() {
    let (record, _) =
        bind(&["--required=0", "--un_name", "64"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.un_name, 64);
}

#[test]
fn attached_value_wins_and_the_next_token_stays_free() {
    let (record, outcome) =
        bind(&["--required=0", "--dft=5", "7"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.dft, 5);
    assert_eq!(outcome.free_args(), ["7"]);
}

#[test]
fn a_token_with_two_attached_values_is_rejected() {
    match bind(&["--required=0=1"]) {
        Err(CliError::TooManyValues { name, count }) => {
            assert_eq!(name, "--required");
            assert_eq!(count, 2);
        }
        other => panic!("expected TooManyValues, got {other:?}"),
    }
}

#[test]
fn everything_after_the_terminator_is_a_free_argument() {
    let (record, outcome) =
        bind(&["--required=0", "--", "-s", "--dft=1"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert!(!record.short);
    assert_eq!(record.dft, 102);
    assert_eq!(outcome.free_args(), ["-s", "--dft=1"]);
}

#[test]
fn non_flag_tokens_collect_as_free_arguments() {
    let (_, outcome) =
        bind(&["--required=0", "abc", "xyz"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(outcome.free_args(), ["abc", "xyz"]);
}

#[test]
fn form_values_hold_final_representations() {
    let (_, outcome) =
        bind(&["--required=0", "--dft", "55", "-s"]).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(outcome.values().get("--required"), Some("0"));
    assert_eq!(outcome.values().get("--dft"), Some("55"));
    assert_eq!(outcome.values().get("-s"), Some("true"));
}

#[test]
fn coercion_failures_aggregate_with_missing_required() {
    let err = bind(&["--dft", "999"]);
    match err {
        Err(CliError::Bind(failures)) => {
            let text = failures.to_string();
            assert_eq!(
                text,
                "argument `--dft` invalid: value overflow\nrequired argument `--required` missing"
            );
        }
        other => panic!("expected Bind, got {other:?}"),
    }
}

#[test]
fn duplicate_names_are_a_construction_error() {
    #[derive(Default)]
    struct Clash {
        a: bool,
        b: bool,
    }

    impl FlagRecord for Clash {
        fn fields(&mut self) -> Vec<FieldDecl<'_>> {
            vec![
                FieldDecl::value("a", &mut self.a).named("a"),
                FieldDecl::value("b", &mut self.b).named("a"),
            ]
        }
    }

    let mut record = Clash::default();
    let registry = ParserRegistry::new();
    let empty: [&str; 0] = [];
    match FlagSet::bind(&mut record, empty, &registry) {
        Err(CliError::DuplicateFlag { name }) => assert_eq!(name, "-a"),
        other => panic!("expected DuplicateFlag, got {other:?}"),
    }
}

#[derive(Default)]
struct Outer {
    helper: Helper,
    level: u8,
}

impl FlagRecord for Outer {
    fn fields(&mut self) -> Vec<FieldDecl<'_>> {
        vec![
            FieldDecl::embed(&mut self.helper),
            FieldDecl::value("level", &mut self.level)
                .named("*l,level")
                .usage("level"),
        ]
    }

    fn wants_help(&self) -> bool {
        self.helper.wants_help()
    }
}

#[test]
fn embedded_records_flatten_into_the_binding() {
    let mut record = Outer::default();
    let registry = ParserRegistry::new();
    FlagSet::bind(&mut record, ["-h", "-l", "3"], &registry)
        .unwrap_or_else(|e| panic!("bind: {e}"));
    assert!(record.helper.help);
    assert_eq!(record.level, 3);
}

#[test]
fn help_flag_suppresses_required_validation() {
    let mut record = Outer::default();
    let registry = ParserRegistry::new();
    let outcome = FlagSet::bind(&mut record, ["-h"], &registry)
        .unwrap_or_else(|e| panic!("bind: {e}"));
    assert!(outcome.validation_suppressed());
    assert!(record.helper.help);
}

#[test]
fn embedded_name_collisions_are_detected() {
    #[derive(Default)]
    struct TwoHelpers {
        first: Helper,
        second: Helper,
    }

    impl FlagRecord for TwoHelpers {
        fn fields(&mut self) -> Vec<FieldDecl<'_>> {
            vec![
                FieldDecl::embed(&mut self.first),
                FieldDecl::embed(&mut self.second),
            ]
        }
    }

    let mut record = TwoHelpers::default();
    let registry = ParserRegistry::new();
    let empty: [&str; 0] = [];
    match FlagSet::bind(&mut record, empty, &registry) {
        Err(CliError::DuplicateFlag { name }) => assert_eq!(name, "-h"),
        other => panic!("expected DuplicateFlag, got {other:?}"),
    }
}

#[test]
fn excluded_fields_never_bind() {
    #[derive(Default)]
    struct WithSkip {
        kept: bool,
        skipped: bool,
    }

    impl FlagRecord for WithSkip {
        fn fields(&mut self) -> Vec<FieldDecl<'_>> {
            vec![
                FieldDecl::value("kept", &mut self.kept).named("k"),
                FieldDecl::value("skipped", &mut self.skipped).named("-"),
            ]
        }
    }

    let mut record = WithSkip::default();
    let registry = ParserRegistry::new();
    let err = FlagSet::bind(&mut record, ["--skipped"], &registry);
    assert!(matches!(err, Err(CliError::UndefinedFlag { .. })));
}

#[test]
fn slices_and_maps_accumulate_across_occurrences() {
    #[derive(Default)]
    struct Collect {
        tags: Vec<String>,
        env: BTreeMap<String, String>,
    }

    impl FlagRecord for Collect {
        fn fields(&mut self) -> Vec<FieldDecl<'_>> {
            vec![
                FieldDecl::value("tags", &mut self.tags).named("t,tag"),
                FieldDecl::value("env", &mut self.env).named("e,env"),
            ]
        }
    }

    let mut record = Collect::default();
    let registry = ParserRegistry::new();
    FlagSet::bind(
        &mut record,
        ["-t", "a", "--tag", "b", "-e", "K=1", "-e", "K=2", "-e", "FLAG"],
        &registry,
    )
    .unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(record.tags, vec!["a", "b"]);
    assert_eq!(record.env.get("K").map(String::as_str), Some("2"));
    assert_eq!(record.env.get("FLAG").map(String::as_str), Some(""));
}

#[derive(Default)]
struct EnvDefault {
    value: String,
}

impl FlagRecord for EnvDefault {
    fn fields(&mut self) -> Vec<FieldDecl<'_>> {
        vec![
            FieldDecl::value("value", &mut self.value)
                .named("default-env")
                .default_value("$CLIBIND_BIND_ENV"),
        ]
    }
}

#[test]
#[serial]
fn environment_defaults_round_trip() {
    // SAFETY: serialised test, no concurrent env access.
    unsafe { std::env::remove_var("CLIBIND_BIND_ENV") };
    let registry = ParserRegistry::new();
    let empty: [&str; 0] = [];

    let mut unset = EnvDefault::default();
    FlagSet::bind(&mut unset, empty, &registry).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(unset.value, "");

    // SAFETY: serialised test, no concurrent env access.
    unsafe { std::env::set_var("CLIBIND_BIND_ENV", "foo") };
    let mut set = EnvDefault::default();
    FlagSet::bind(&mut set, empty, &registry).unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(set.value, "foo");
    unsafe { std::env::remove_var("CLIBIND_BIND_ENV") };
}

#[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Cfg {
    a: String,
    b: i32,
}

#[derive(Default)]
struct ParserArgs {
    cfg: Json<Cfg>,
    from_file: Json<Cfg>,
}

impl FlagRecord for ParserArgs {
    fn fields(&mut self) -> Vec<FieldDecl<'_>> {
        vec![
            FieldDecl::value("cfg", &mut self.cfg).named("cfg").parser("json"),
            FieldDecl::value("from_file", &mut self.from_file)
                .named("cfg-file")
                .parser("jsonfile"),
        ]
    }
}

#[test]
fn registered_parsers_transform_flag_values() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|e| panic!("tempfile: {e}"));
    write!(file, r#"{{"a": "world", "b": 3}}"#).unwrap_or_else(|e| panic!("write: {e}"));
    let path = file.path().display().to_string();

    let mut record = ParserArgs::default();
    let registry = ParserRegistry::new();
    FlagSet::bind(
        &mut record,
        ["--cfg", r#"{"a": "hello", "b": 2}"#, "--cfg-file", &path],
        &registry,
    )
    .unwrap_or_else(|e| panic!("bind: {e}"));
    assert_eq!(*record.cfg, Cfg { a: "hello".into(), b: 2 });
    assert_eq!(*record.from_file, Cfg { a: "world".into(), b: 3 });
}

#[test]
fn unknown_parser_references_are_a_construction_error() {
    #[derive(Default)]
    struct BadRef {
        cfg: String,
    }

    impl FlagRecord for BadRef {
        fn fields(&mut self) -> Vec<FieldDecl<'_>> {
            vec![FieldDecl::value("cfg", &mut self.cfg).named("cfg").parser("nope")]
        }
    }

    let mut record = BadRef::default();
    let registry = ParserRegistry::new();
    let empty: [&str; 0] = [];
    match FlagSet::bind(&mut record, empty, &registry) {
        Err(CliError::UnknownParser { name }) => assert_eq!(name, "nope"),
        other => panic!("expected UnknownParser, got {other:?}"),
    }
}

#[test]
fn malformed_json_surfaces_on_the_owning_flag() {
    let mut record = ParserArgs::default();
    let registry = ParserRegistry::new();
    let err = FlagSet::bind(&mut record, ["--cfg", "{nope"], &registry);
    match err {
        Err(CliError::InvalidValue { name, .. }) => assert_eq!(name, "--cfg"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}
