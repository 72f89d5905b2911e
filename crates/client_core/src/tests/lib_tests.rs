use super::*;
use crate::fake_api::FakeApi;
use shared::domain::SessionId;

#[tokio::test]
async fn sign_up_then_manage_agenda() {
    let api = FakeApi::with_sessions([1, 2, 3]);
    let gate = SignupGate::default();

    let decision = gate.check(&api, Some("grace"), "/").await.expect("gate");
    let GateDecision::RedirectToRegistration(target) = decision else {
        panic!("unregistered caller must be sent to registration");
    };
    assert_eq!(
        gate.check(&api, Some("grace"), &target).await.expect("gate"),
        GateDecision::Allow
    );

    register(
        &api,
        "grace",
        &RegistrationForm {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email_address: "grace@example.com".into(),
        },
    )
    .await
    .expect("register");
    assert_eq!(
        gate.check(&api, Some("grace"), "/").await.expect("gate"),
        GateDecision::Allow
    );
    assert!(read_agenda(&api, "grace").await.expect("agenda").is_empty());

    add_session(&api, "grace", SessionId(3)).await.expect("add");
    add_session(&api, "grace", SessionId(1)).await.expect("add");
    let agenda = read_agenda(&api, "grace").await.expect("agenda");
    let ids: Vec<_> = agenda.iter().map(|s| s.session_id).collect();
    assert_eq!(ids, vec![SessionId(1), SessionId(3)]);

    let attendee = api
        .get_attendee("grace")
        .await
        .expect("lookup")
        .expect("registered");
    let registered = registered_ids(&attendee);
    assert!(membership(SessionId(1), &registered).is_registered());
    assert!(!membership(SessionId(2), &registered).is_registered());
}
