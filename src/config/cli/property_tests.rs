//! Property-based tests for CLI argument parsing

use super::*;
use proptest::prelude::*;

fn lineage_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,20}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_show_command_parses(lineage in lineage_strategy(), version in 1u32..10_000) {
        let cli = parse_args(["registro", "show", &lineage, &version.to_string()]).unwrap();
        match cli.command {
            Command::Show(args) => {
                prop_assert_eq!(args.lineage, lineage);
                prop_assert_eq!(args.version, version);
            }
            _ => prop_assert!(false, "Expected Show command"),
        }
    }

    #[test]
    fn prop_key_value_splits_on_first_equals(
        key in "[a-z_]{1,12}",
        value in "[a-zA-Z0-9=./:]{0,20}",
    ) {
        let (k, v) = parse_key_value(&format!("{key}={value}")).unwrap();
        prop_assert_eq!(k, key);
        prop_assert_eq!(v, value);
    }

    #[test]
    fn prop_stage_case_insensitive(
        stage in prop::sample::select(vec!["none", "NONE", "staging", "Staging", "PRODUCTION", "archived"])
    ) {
        prop_assert!(parse_stage(stage).is_ok());
    }

    #[test]
    fn prop_output_format_case_insensitive(
        format in prop::sample::select(vec!["table", "TABLE", "json", "JSON", "Json", "yaml", "YAML"])
    ) {
        prop_assert!(format.parse::<OutputFormat>().is_ok());
    }

    #[test]
    fn prop_verbose_quiet_flags(lineage in lineage_strategy()) {
        let cli_v = parse_args(["registro", "-v", "history", &lineage]).unwrap();
        let cli_q = parse_args(["registro", "-q", "history", &lineage]).unwrap();

        prop_assert!(cli_v.verbose && !cli_v.quiet);
        prop_assert!(!cli_q.verbose && cli_q.quiet);
    }
}
