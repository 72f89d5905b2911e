use super::Args;
use clap::{CommandFactory, Parser};

#[test]
fn command_definition_is_consistent() {
    Args::command().debug_assert();
}

#[test]
fn defaults_cover_login_logout_and_registration() {
    let args = Args::try_parse_from(["frontend", "--identity-secret", "s3cret"]).expect("args");
    assert_eq!(
        args.exempt_paths,
        vec!["/Account/Login", "/Account/Logout", "/Welcome"]
    );
    assert_eq!(args.request_timeout().as_secs(), 10);
    args.validate().expect("valid");
}

#[test]
fn exempt_paths_can_be_replaced() {
    let args = Args::try_parse_from([
        "frontend",
        "--identity-secret",
        "s3cret",
        "--exempt-path",
        "/Login",
        "--exempt-path",
        "/About,/Privacy",
    ])
    .expect("args");
    assert_eq!(args.exempt_paths, vec!["/Login", "/About", "/Privacy"]);
}

#[test]
fn rejects_unusable_values() {
    let args = Args::try_parse_from([
        "frontend",
        "--identity-secret",
        " ",
        "--identity-ttl-seconds",
        "60",
    ])
    .expect("args");
    assert!(args.validate().is_err());

    let args = Args::try_parse_from([
        "frontend",
        "--identity-secret",
        "s3cret",
        "--request-timeout-seconds",
        "0",
    ])
    .expect("args");
    assert!(args.validate().is_err());
}
