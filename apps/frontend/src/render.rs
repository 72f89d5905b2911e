//! HTML fragments. Every caller-supplied or back-end string goes through
//! [`text`] or [`attr`] before it is interpolated.

use std::{borrow::Cow, collections::HashSet, fmt::Write as _};

use chrono::{DateTime, Utc};
use client_core::{membership, RegistrationForm, ScheduleDay};
use html_escape::{encode_double_quoted_attribute, encode_safe};
use shared::{
    domain::{AgendaMembership, SessionId},
    protocol::{SearchResult, SessionResponse, SessionSummary, SpeakerResponse},
    validation::{AttendeeField, FieldError},
};

pub fn text(value: &str) -> Cow<'_, str> {
    encode_safe(value)
}

pub fn attr(value: &str) -> Cow<'_, str> {
    encode_double_quoted_attribute(value)
}

pub fn page(title: &str, user_name: Option<&str>, body: &str) -> String {
    let account = match user_name {
        Some(name) => format!(
            r#"<span class="user">{}</span> <a href="/MyAgenda">My agenda</a>
<form class="inline" method="post" action="/Account/Logout"><button type="submit">Log out</button></form>"#,
            text(name)
        ),
        None => r#"<a href="/Account/Login">Log in</a>"#.to_string(),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Conference Planner</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 0 auto; max-width: 60rem; padding: 0 1rem; }}
nav {{ display: flex; gap: 1rem; align-items: center; padding: 1rem 0; border-bottom: 1px solid #ddd; }}
nav .account {{ margin-left: auto; display: flex; gap: 0.5rem; align-items: center; }}
form.inline {{ display: inline; }}
.slot {{ margin: 1rem 0; }}
.session {{ border: 1px solid #ddd; border-radius: 4px; padding: 0.5rem 1rem; margin: 0.5rem 0; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<nav><a href="/">Agenda</a><a href="/Speakers">Speakers</a><a href="/Search">Search</a><span class="account">{account}</span></nav>
<main>
{body}
</main>
</body>
</html>"#,
        title = text(title),
    )
}

fn day_label(at: &DateTime<Utc>) -> String {
    at.format("%A, %B %-d").to_string()
}

fn time_label(at: &DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}

fn when(starts_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> String {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) => format!(
            "{} {}–{} UTC",
            day_label(&start),
            time_label(&start),
            time_label(&end)
        ),
        (Some(start), None) => format!("{} {} UTC", day_label(&start), time_label(&start)),
        _ => "Not scheduled yet".to_string(),
    }
}

/// Add or Remove button for one session, posting back to `return_to`.
pub fn agenda_button(session_id: SessionId, state: AgendaMembership, return_to: &str) -> String {
    let (action, label) = if state.is_registered() {
        ("/agenda/remove", "Remove from my agenda")
    } else {
        ("/agenda/add", "Add to my agenda")
    };
    format!(
        r#"<form class="inline" method="post" action="{action}"><input type="hidden" name="session_id" value="{session_id}"><input type="hidden" name="return_to" value="{}"><button type="submit">{label}</button></form>"#,
        attr(return_to)
    )
}

fn session_card(
    session: &SessionResponse,
    registered: Option<&HashSet<SessionId>>,
    return_to: &str,
) -> String {
    let speakers = session
        .speakers
        .iter()
        .map(|speaker| {
            format!(
                r#"<a href="/Speaker/{}">{}</a>"#,
                speaker.speaker_id,
                text(&speaker.name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let track = session
        .track
        .as_ref()
        .map(|track| format!(r#" <span class="track">{}</span>"#, text(&track.name)))
        .unwrap_or_default();
    let button = registered
        .map(|ids| agenda_button(session.session_id, membership(session.session_id, ids), return_to))
        .unwrap_or_default();
    format!(
        r#"<div class="session"><h4><a href="/Session/{id}">{title}</a>{track}</h4><p>{speakers}</p>{button}</div>"#,
        id = session.session_id,
        title = text(&session.title),
    )
}

/// Home page body. `registered` is `Some` only for signed-in attendees, who
/// get Add/Remove buttons.
pub fn schedule(days: &[ScheduleDay], registered: Option<&HashSet<SessionId>>) -> String {
    let mut out = String::from("<h1>Agenda</h1>");
    if days.is_empty() {
        out.push_str("<p>No sessions have been published yet.</p>");
        return out;
    }
    for day in days {
        let heading = match day.date {
            Some(date) => date.format("%A, %B %-d").to_string(),
            None => "Unscheduled".to_string(),
        };
        let _ = write!(out, "<section><h2>{}</h2>", text(&heading));
        for slot in &day.slots {
            let _ = write!(
                out,
                r#"<div class="slot"><h3>{} UTC</h3>"#,
                time_label(&slot.starts_at)
            );
            for session in &slot.sessions {
                out.push_str(&session_card(session, registered, "/"));
            }
            out.push_str("</div>");
        }
        for session in &day.unscheduled {
            out.push_str(&session_card(session, registered, "/"));
        }
        out.push_str("</section>");
    }
    out
}

pub fn session_detail(session: &SessionResponse, state: Option<AgendaMembership>) -> String {
    let speakers = session
        .speakers
        .iter()
        .map(|speaker| {
            format!(
                r#"<li><a href="/Speaker/{}">{}</a></li>"#,
                speaker.speaker_id,
                text(&speaker.name)
            )
        })
        .collect::<String>();
    let track = session
        .track
        .as_ref()
        .map(|track| format!("<p>Track: {}</p>", text(&track.name)))
        .unwrap_or_default();
    let return_to = format!("/Session/{}", session.session_id);
    let button = state
        .map(|state| agenda_button(session.session_id, state, &return_to))
        .unwrap_or_default();
    format!(
        "<h1>{title}</h1><p>{when}</p>{track}<p>{abstract_text}</p><h2>Speakers</h2><ul>{speakers}</ul>{button}",
        title = text(&session.title),
        when = text(&when(session.starts_at, session.ends_at)),
        abstract_text = text(&session.abstract_text),
    )
}

fn summary_list(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "<p>No sessions.</p>".to_string();
    }
    let items = sessions
        .iter()
        .map(|session| {
            format!(
                r#"<li><a href="/Session/{}">{}</a> <small>{}</small></li>"#,
                session.session_id,
                text(&session.title),
                text(&when(session.starts_at, None))
            )
        })
        .collect::<String>();
    format!("<ul>{items}</ul>")
}

pub fn speaker_list(speakers: &[SpeakerResponse]) -> String {
    if speakers.is_empty() {
        return "<h1>Speakers</h1><p>No speakers yet.</p>".to_string();
    }
    let items = speakers
        .iter()
        .map(|speaker| {
            format!(
                r#"<li><a href="/Speaker/{}">{}</a></li>"#,
                speaker.speaker_id,
                text(&speaker.name)
            )
        })
        .collect::<String>();
    format!("<h1>Speakers</h1><ul>{items}</ul>")
}

pub fn speaker_detail(speaker: &SpeakerResponse) -> String {
    let web_site = speaker
        .web_site
        .as_deref()
        .map(|url| format!(r#"<p><a href="{}" rel="nofollow">{}</a></p>"#, attr(url), text(url)))
        .unwrap_or_default();
    format!(
        "<h1>{name}</h1><p>{bio}</p>{web_site}<h2>Sessions</h2>{sessions}",
        name = text(&speaker.name),
        bio = text(&speaker.bio),
        sessions = summary_list(&speaker.sessions),
    )
}

pub fn search(term: &str, results: Option<&[SearchResult]>) -> String {
    let mut out = format!(
        r#"<h1>Search</h1><form method="get" action="/Search"><input type="search" name="term" value="{}" maxlength="100"><button type="submit">Search</button></form>"#,
        attr(term)
    );
    let Some(results) = results else {
        return out;
    };
    if results.is_empty() {
        let _ = write!(out, "<p>No results for &quot;{}&quot;.</p>", text(term));
        return out;
    }
    out.push_str("<ul>");
    for result in results {
        let _ = match result {
            SearchResult::Session(session) => write!(
                out,
                r#"<li>Session: <a href="/Session/{}">{}</a></li>"#,
                session.session_id,
                text(&session.title)
            ),
            SearchResult::Speaker(speaker) => write!(
                out,
                r#"<li>Speaker: <a href="/Speaker/{}">{}</a></li>"#,
                speaker.speaker_id,
                text(&speaker.name)
            ),
        };
    }
    out.push_str("</ul>");
    out
}

pub fn my_agenda(sessions: &[SessionResponse]) -> String {
    if sessions.is_empty() {
        return r#"<h1>My agenda</h1><p>You have not added any sessions yet. Browse the <a href="/">agenda</a>.</p>"#
            .to_string();
    }
    let items = sessions
        .iter()
        .map(|session| {
            format!(
                r#"<div class="session"><h4><a href="/Session/{id}">{title}</a></h4><p>{when}</p>{button}</div>"#,
                id = session.session_id,
                title = text(&session.title),
                when = text(&when(session.starts_at, session.ends_at)),
                button = agenda_button(session.session_id, AgendaMembership::Registered, "/MyAgenda"),
            )
        })
        .collect::<String>();
    format!("<h1>My agenda</h1>{items}")
}

fn field_errors(errors: &[FieldError], field: AttendeeField) -> String {
    errors
        .iter()
        .filter(|error| error.field == field)
        .map(|error| format!(r#"<span class="error">{}</span>"#, text(&error.message)))
        .collect()
}

pub fn welcome_form(
    user_name: &str,
    form: &RegistrationForm,
    errors: &[FieldError],
    notice: Option<&str>,
) -> String {
    let notice = notice
        .map(|notice| format!(r#"<p class="error">{}</p>"#, text(notice)))
        .unwrap_or_default();
    format!(
        r#"<h1>Welcome, {user}</h1>
<p>Tell us a little about yourself to finish signing up.</p>
{notice}{user_error}
<form method="post" action="/Welcome">
<p><label>First name <input name="first_name" value="{first}" maxlength="200"></label>{first_error}</p>
<p><label>Last name <input name="last_name" value="{last}" maxlength="200"></label>{last_error}</p>
<p><label>Email address <input type="email" name="email_address" value="{email}" maxlength="256"></label>{email_error}</p>
<p><button type="submit">Register</button></p>
</form>"#,
        user = text(user_name),
        user_error = field_errors(errors, AttendeeField::UserName),
        first = attr(&form.first_name),
        first_error = field_errors(errors, AttendeeField::FirstName),
        last = attr(&form.last_name),
        last_error = field_errors(errors, AttendeeField::LastName),
        email = attr(&form.email_address),
        email_error = field_errors(errors, AttendeeField::EmailAddress),
    )
}

pub fn login_form(error: Option<&str>) -> String {
    let error = error
        .map(|error| format!(r#"<p class="error">{}</p>"#, text(error)))
        .unwrap_or_default();
    format!(
        r#"<h1>Log in</h1>{error}
<form method="post" action="/Account/Login">
<p><label>User name <input name="user_name" maxlength="200" autofocus></label></p>
<p><button type="submit">Log in</button></p>
</form>"#
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
