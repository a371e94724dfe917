mod support;

use std::rc::Rc;
use std::time::Duration;

use jobwatch_engine::{DriverError, DriverErrorKind, Navigation, USER_AGENTS};
use pretty_assertions::assert_eq;
use support::{card, open_session, page, shared, FakeWeb, RecordingPacer, SITE_URL};

fn listing() -> FakeWeb {
    FakeWeb::with_site(vec![page(&[card(1, "DevOps Engineer", "cloud", None)])])
}

#[test]
fn clear_navigation_is_paced_on_both_sides() {
    support::init_logging();
    let web = shared(listing());
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    assert_eq!(session.navigate(SITE_URL).unwrap(), Navigation::Clear);

    let pauses = pacer.pauses.borrow().clone();
    assert_eq!(pauses.len(), 2);
    assert!(pauses[0] >= Duration::from_secs(1) && pauses[0] <= Duration::from_secs(3));
    assert!(pauses[1] >= Duration::from_secs(2) && pauses[1] <= Duration::from_secs(4));
    assert_eq!(web.borrow().navigations, vec![SITE_URL.to_string()]);
    assert!(USER_AGENTS.contains(&session.user_agent()));
}

#[test]
fn access_denied_page_is_blocked() {
    support::init_logging();
    let mut fake = listing();
    fake.blocked_loads = 1;
    let web = shared(fake);
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    assert_eq!(session.navigate(SITE_URL).unwrap(), Navigation::Blocked);
    // No post-navigation pause on a blocked page.
    assert_eq!(pacer.pauses.borrow().len(), 1);
}

#[test]
fn rate_limit_phrase_backs_off_without_blocking() {
    support::init_logging();
    let mut fake = listing();
    fake.sites.insert(
        SITE_URL.to_string(),
        vec![page(&[card(1, "DevOps Engineer", "Rate limit reached, slow down", None)])],
    );
    let web = shared(fake);
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    assert_eq!(session.navigate(SITE_URL).unwrap(), Navigation::Clear);
    let pauses = pacer.pauses.borrow();
    assert!(pauses
        .iter()
        .any(|p| *p >= Duration::from_secs(5) && *p <= Duration::from_secs(10)));
}

#[test]
fn captcha_frame_is_blocked() {
    support::init_logging();
    let mut fake = listing();
    fake.details.insert(
        "https://jobs.example.com/check".to_string(),
        "<html><body><iframe src='https://challenge.example.com/recaptcha'></iframe></body></html>"
            .to_string(),
    );
    let web = shared(fake);
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    session.load("https://jobs.example.com/check").unwrap();
    assert!(session.detect_blocking());
}

#[test]
fn timeouts_are_retried_with_backoff() {
    support::init_logging();
    let mut fake = listing();
    fake.navigation_failures.extend([
        DriverError::new(DriverErrorKind::Timeout, "page load timed out"),
        DriverError::new(DriverErrorKind::Timeout, "page load timed out"),
    ]);
    let web = shared(fake);
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    assert_eq!(session.navigate(SITE_URL).unwrap(), Navigation::Clear);
    assert_eq!(web.borrow().navigations.len(), 3);
    let backoffs: Vec<Duration> = pacer.pauses.borrow()[1..3].to_vec();
    assert_eq!(backoffs, vec![Duration::from_secs(4), Duration::from_secs(4)]);
}

#[test]
fn navigation_gives_up_after_three_attempts() {
    support::init_logging();
    let mut fake = listing();
    fake.navigation_failures
        .extend((0..5).map(|_| DriverError::new(DriverErrorKind::Driver, "connection closed")));
    let web = shared(fake);
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    let err = session.navigate(SITE_URL).unwrap_err();
    assert_eq!(err.kind, DriverErrorKind::Driver);
    assert_eq!(web.borrow().navigations.len(), 3);
}

#[test]
fn script_errors_are_not_retried() {
    support::init_logging();
    let mut fake = listing();
    fake.navigation_failures
        .push_back(DriverError::new(DriverErrorKind::Script, "bad script"));
    let web = shared(fake);
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    assert!(session.navigate(SITE_URL).is_err());
    assert_eq!(web.borrow().navigations.len(), 1);
}

#[test]
fn restart_replaces_the_browser() {
    support::init_logging();
    let web = shared(listing());
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    session.restart().unwrap();
    session.restart().unwrap();

    let fake = web.borrow();
    assert_eq!(fake.launches.len(), 3);
    assert_eq!(fake.quits, 2);
    assert_eq!(session.restarts(), 2);
    assert!(pacer
        .pauses
        .borrow()
        .iter()
        .all(|p| *p >= Duration::from_secs(2) && *p <= Duration::from_secs(5)));
}

#[test]
fn failed_relaunch_recovers_on_next_use() {
    support::init_logging();
    let web = shared(listing());
    let pacer = Rc::new(RecordingPacer::default());
    let mut session = open_session(&web, &pacer);

    web.borrow_mut().failed_launches = 1;
    let err = session.restart().unwrap_err();
    assert_eq!(err.kind, DriverErrorKind::Launch);

    assert_eq!(session.navigate(SITE_URL).unwrap(), Navigation::Clear);
    assert_eq!(web.borrow().launches.len(), 2);
}

#[test]
fn dropping_the_session_quits_the_browser() {
    support::init_logging();
    let web = shared(listing());
    let pacer = Rc::new(RecordingPacer::default());
    let session = open_session(&web, &pacer);
    session.close();
    assert_eq!(web.borrow().quits, 1);

    let session = open_session(&web, &pacer);
    drop(session);
    assert_eq!(web.borrow().quits, 2);
}
