use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_ops_show_parses() {
    let cli = Cli::try_parse_from(["qo", "ops", "show", "lookup-join"]).unwrap();
    match cli.command {
        Commands::Ops(OpsArgs {
            action: Some(OpsAction::Show { name }),
            ..
        }) => assert_eq!(name, "lookup-join"),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["qo", "eval", "plan.yml", "-o", "json", "--verbose"]).unwrap();
    assert!(cli.global.verbose);
    let Commands::Eval(args) = cli.command else {
        panic!("expected eval");
    };
    assert_eq!(args.output, Some(EvalOutput::Json));
    assert_eq!(args.plan, "plan.yml");
}
