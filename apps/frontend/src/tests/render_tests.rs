use super::*;
use client_core::group_by_slot;

fn session(id: i64, title: &str) -> SessionResponse {
    SessionResponse {
        session_id: SessionId(id),
        title: title.into(),
        abstract_text: String::new(),
        starts_at: None,
        ends_at: None,
        track: None,
        speakers: Vec::new(),
    }
}

#[test]
fn untrusted_text_is_escaped() {
    let html = page(
        "<script>",
        Some("<b>mallory</b>"),
        &session_detail(&session(1, "<img src=x onerror=alert(1)>"), None),
    );
    assert!(!html.contains("<script>"));
    assert!(!html.contains("<b>mallory</b>"));
    assert!(!html.contains("<img src=x"));
    assert!(html.contains("&lt;img src=x"));
}

#[test]
fn button_reflects_membership() {
    let add = agenda_button(SessionId(4), AgendaMembership::NotRegistered, "/");
    assert!(add.contains(r#"action="/agenda/add""#));
    assert!(add.contains(r#"name="session_id" value="4""#));

    let remove = agenda_button(SessionId(4), AgendaMembership::Registered, "/Session/4");
    assert!(remove.contains(r#"action="/agenda/remove""#));
    assert!(remove.contains(r#"value="/Session/4""#));
}

#[test]
fn anonymous_schedule_has_no_buttons() {
    let days = group_by_slot(vec![session(1, "Ownership")]);
    let html = schedule(&days, None);
    assert!(html.contains("Unscheduled"));
    assert!(!html.contains("/agenda/"));

    let registered: HashSet<SessionId> = [SessionId(1)].into_iter().collect();
    let html = schedule(&days, Some(&registered));
    assert!(html.contains(r#"action="/agenda/remove""#));
}

#[test]
fn welcome_form_shows_field_errors_next_to_fields() {
    let errors = vec![FieldError {
        field: AttendeeField::EmailAddress,
        message: "email address is not valid".into(),
    }];
    let form = RegistrationForm {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email_address: "ada\"@".into(),
    };
    let html = welcome_form("ada", &form, &errors, None);
    assert!(html.contains("email address is not valid"));
    assert!(html.contains(r#"value="Ada""#));
    assert!(html.contains("ada&quot;@"));
}
