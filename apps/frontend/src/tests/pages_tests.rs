use super::*;

#[test]
fn redirect_targets_must_be_local() {
    assert_eq!(local_path(Some("/MyAgenda")), "/MyAgenda");
    assert_eq!(local_path(Some("/Session/4")), "/Session/4");
    assert_eq!(local_path(Some("//evil.example")), "/");
    assert_eq!(local_path(Some("/\\evil.example")), "/");
    assert_eq!(local_path(Some("https://evil.example")), "/");
    assert_eq!(local_path(None), "/");
}

#[test]
fn redirect_targets_reject_control_characters_and_whitespace() {
    assert_eq!(local_path(Some("/\t/evil.example")), "/");
    assert_eq!(local_path(Some("/ok\nevil")), "/");
    assert_eq!(local_path(Some("/ok\r\nSet-Cookie: x=1")), "/");
    assert_eq!(local_path(Some("/My Agenda")), "/");
    assert_eq!(local_path(Some("/Search?term=rust")), "/Search?term=rust");
}

#[test]
fn canonical_route_ignores_case_and_trailing_slash() {
    assert_eq!(canonical_route("/welcome").as_deref(), Some("/Welcome"));
    assert_eq!(canonical_route("/Welcome/").as_deref(), Some("/Welcome"));
    assert_eq!(
        canonical_route("/ACCOUNT/LOGIN").as_deref(),
        Some("/Account/Login")
    );
    assert_eq!(canonical_route("/speaker/12").as_deref(), Some("/Speaker/12"));
    assert_eq!(canonical_route("/speaker/"), None);
    assert_eq!(canonical_route("/speaker/1/2"), None);
    assert_eq!(canonical_route("/unknown"), None);
}
