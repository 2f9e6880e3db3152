mod common;

use chrono::NaiveDate;
use common::{
    test_config, BrokenRecognizer, FakePortal, ScriptedRecognizer, INVALID_CAPTCHA_PAGE,
    RESULTS_PAGE,
};
use ecourts_causelist::error::{ErrorKind, NavigationError, SubmissionError, ValidationError};
use ecourts_causelist::orchestrator::{run_in_session, run_lookup_in_session};
use ecourts_causelist::services::{CascadeResolver, FormFiller};
use ecourts_causelist::{
    AppError, CaseLookup, CaseLookupFlow, CaseLookupQuery, CauseListFlow, CauseListQuery,
    QuerySession, RawQuery, SelectionLevel,
};
use tokio_test::{assert_err, assert_ok};

fn query(case_type: &str, target_dates: Option<Vec<&str>>) -> CauseListQuery {
    CauseListQuery::try_from(RawQuery {
        state: "West Bengal".into(),
        district: "Paschim Bardhaman".into(),
        court_complex: "ASANSOL COURT COMPLEX".into(),
        court: "9-Indrani Gupta-CJM".into(),
        case_type: case_type.into(),
        date: Some("21-10-2025".into()),
        target_dates: target_dates.map(|d| d.into_iter().map(String::from).collect()),
    })
    .unwrap()
}

async fn open_session(portal: FakePortal) -> QuerySession<FakePortal> {
    let config = test_config();
    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&[]));
    let mut session = QuerySession::new(portal, 1);
    assert_ok!(flow.open_portal(&mut session).await);
    session
}

// ========== Cascade ==========

#[tokio::test]
async fn resolving_before_predecessor_is_control_not_ready() {
    let config = test_config();
    let resolver = CascadeResolver::new(&config);
    let mut session = open_session(FakePortal::new()).await;

    let err = resolver
        .resolve(&mut session, SelectionLevel::District, "Paschim Bardhaman")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Navigation(NavigationError::ControlNotReady {
            level: SelectionLevel::District,
            ..
        })
    ));
    assert_eq!(session.committed_level(), None);
    assert_eq!(session.driver().selected(SelectionLevel::District), None);
}

#[tokio::test]
async fn absent_value_is_option_not_found_without_commit() {
    let config = test_config();
    let resolver = CascadeResolver::new(&config);
    let mut session = open_session(FakePortal::new()).await;

    assert_ok!(
        resolver
            .resolve(&mut session, SelectionLevel::State, "West Bengal")
            .await
    );
    let err = resolver
        .resolve(&mut session, SelectionLevel::District, "Atlantis")
        .await
        .unwrap_err();

    match err {
        AppError::Navigation(NavigationError::OptionNotFound {
            level,
            requested,
            available,
        }) => {
            assert_eq!(level, SelectionLevel::District);
            assert_eq!(requested, "Atlantis");
            assert_eq!(available, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.committed_level(), Some(SelectionLevel::State));
    assert_eq!(session.driver().selected(SelectionLevel::District), None);
}

#[tokio::test]
async fn match_is_exact_text() {
    let config = test_config();
    let resolver = CascadeResolver::new(&config);
    let mut session = open_session(FakePortal::new()).await;

    let err = resolver
        .resolve(&mut session, SelectionLevel::State, "west bengal")
        .await;
    assert_err!(err);
    assert_eq!(session.committed_level(), None);
}

#[tokio::test]
async fn reselecting_a_level_drops_everything_above_it() {
    let config = test_config();
    let resolver = CascadeResolver::new(&config);
    let mut session = open_session(FakePortal::new()).await;

    for (level, value) in [
        (SelectionLevel::State, "West Bengal"),
        (SelectionLevel::District, "Paschim Bardhaman"),
        (SelectionLevel::CourtComplex, "ASANSOL COURT COMPLEX"),
    ] {
        let selection = resolver.resolve(&mut session, level, value).await.unwrap();
        assert!(selection.is_resolved());
    }
    assert_eq!(session.committed_level(), Some(SelectionLevel::CourtComplex));
    assert!(session.cached_options(SelectionLevel::CourtComplex).is_some());

    resolver
        .resolve(&mut session, SelectionLevel::State, "Maharashtra")
        .await
        .unwrap();

    assert_eq!(session.committed_level(), Some(SelectionLevel::State));
    assert!(session.cached_options(SelectionLevel::District).is_none());
    assert!(session.cached_options(SelectionLevel::CourtComplex).is_none());
}

// ========== Form ==========

#[tokio::test]
async fn malformed_date_never_reaches_the_page() {
    let config = test_config();
    let filler = FormFiller::new(&config);
    let session = open_session(FakePortal::new()).await;

    let err = filler.set_date(&session, "2025-10-21").await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Validation(ValidationError::InvalidDateFormat { .. })
    ));
    assert_eq!(session.driver().value_of(&config.locators.date_input), None);

    let date = filler.set_date(&session, "21-10-2025").await.unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());
    assert_eq!(
        session.driver().value_of(&config.locators.date_input).as_deref(),
        Some("21-10-2025")
    );
}

// ========== Full flow ==========

#[tokio::test]
async fn dump_mode_extracts_every_row() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&["A b-12!"]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let portal = FakePortal::new().with_submit_pages(&[RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow.run(&mut session, &query("civil", None)).await.unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.result.listed());
    assert_eq!(outcome.result.len(), 3);
    let first = &outcome.result.records()[0];
    assert_eq!(first.case_number, "CC/1203/2024");
    assert_eq!(first.party_names, "State Vs Ramesh Kumar");
    assert_eq!(
        outcome.pdf_links,
        ["https://portal.test/ecourtindia_v6/cases/causelist_21102025.pdf"]
    );

    let driver = session.driver();
    let locators = &config.locators;
    assert_eq!(driver.value_of(&locators.captcha_input).as_deref(), Some("Ab12"));
    assert_eq!(driver.value_of(&locators.date_input).as_deref(), Some("21-10-2025"));
    assert_eq!(driver.selected(SelectionLevel::Court).as_deref(), Some("9-Indrani Gupta-CJM"));
    assert_eq!(driver.click_count(&locators.civil_submit), 1);
    assert_eq!(driver.click_count(&locators.captcha_refresh), 0);
    assert_eq!(recognizer.calls(), 1);
}

#[tokio::test]
async fn date_filter_without_matches_is_not_listed() {
    let config = test_config();
    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&["x1"]));
    let portal = FakePortal::new().with_submit_pages(&[RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow
        .run(&mut session, &query("Criminal", Some(vec!["21-10-2025"])))
        .await
        .unwrap();

    assert!(!outcome.result.listed());
    assert!(outcome.result.records().is_empty());
    assert_eq!(session.driver().click_count(&config.locators.criminal_submit), 1);
}

#[tokio::test]
async fn date_filter_keeps_matching_rows() {
    let config = test_config();
    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&["x1"]));
    let portal = FakePortal::new().with_submit_pages(&[RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow
        .run(&mut session, &query("civil", Some(vec!["22-10-2025"])))
        .await
        .unwrap();

    assert!(outcome.result.listed());
    assert_eq!(outcome.result.len(), 1);
    let record = &outcome.result.records()[0];
    assert_eq!(record.case_number, "GR/77/2023");
    assert_eq!(record.matched_date, NaiveDate::from_ymd_opt(2025, 10, 22));
}

#[tokio::test]
async fn success_on_third_attempt_stops_the_loop() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&["aa", "bb", "cc", "dd"]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let portal = FakePortal::new().with_submit_pages(&[
        INVALID_CAPTCHA_PAGE,
        common::FORM_PAGE,
        RESULTS_PAGE,
    ]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow.run(&mut session, &query("civil", None)).await.unwrap();

    assert_eq!(outcome.attempts, 3);
    assert_eq!(recognizer.calls(), 3);
    let driver = session.driver();
    assert_eq!(driver.screenshots(), 3);
    assert_eq!(driver.click_count(&config.locators.captcha_refresh), 2);
    assert_eq!(driver.value_of(&config.locators.captcha_input).as_deref(), Some("cc"));
}

#[tokio::test]
async fn layout_table_is_not_mistaken_for_results() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&["aa", "wrong", "right"]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let portal = FakePortal::new().with_layout_table().with_submit_pages(&[
        common::FORM_PAGE,
        INVALID_CAPTCHA_PAGE,
        RESULTS_PAGE,
    ]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow.run(&mut session, &query("civil", None)).await.unwrap();

    assert_eq!(outcome.attempts, 3);
    assert!(outcome.result.listed());
    assert_eq!(outcome.result.len(), 3);
    assert_eq!(outcome.result.records()[0].case_number, "CC/1203/2024");
    assert_eq!(session.driver().click_count(&config.locators.captcha_refresh), 2);
}

#[tokio::test]
async fn refreshed_captcha_is_captured_only_once_loaded() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&["wrong", "right"]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let portal = FakePortal::new()
        .with_slow_captcha_refresh(4)
        .with_submit_pages(&[INVALID_CAPTCHA_PAGE, RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow.run(&mut session, &query("civil", None)).await.unwrap();

    assert_eq!(outcome.attempts, 2);
    let driver = session.driver();
    assert_eq!(driver.screenshots(), 2);
    assert_eq!(driver.stale_screenshots(), 0);
    assert_eq!(driver.captcha_version(), 2);
}

#[tokio::test]
async fn five_failures_exhaust_the_retries() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&[]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let mut session = QuerySession::new(FakePortal::new(), 1);

    let err = flow.run(&mut session, &query("civil", None)).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Submission(SubmissionError::CaptchaRetriesExhausted { attempts: 5 })
    ));
    assert_eq!(err.kind(), ErrorKind::Exhausted);
    assert_eq!(recognizer.calls(), 5);
    let driver = session.driver();
    assert_eq!(driver.click_count(&config.locators.civil_submit), 5);
    assert_eq!(driver.click_count(&config.locators.captcha_refresh), 4);
}

#[tokio::test]
async fn missing_table_once_then_results() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&["a1", "b2"]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let portal = FakePortal::new().with_submit_pages(&[common::FORM_PAGE, RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);

    let outcome = flow.run(&mut session, &query("civil", None)).await.unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(session.driver().click_count(&config.locators.captcha_refresh), 1);
}

#[tokio::test]
async fn ocr_failure_is_fatal_not_a_retry() {
    let config = test_config();
    let flow = CauseListFlow::new(&config, BrokenRecognizer);
    let portal = FakePortal::new().with_submit_pages(&[RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);

    let err = flow.run(&mut session, &query("civil", None)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert!(!err.is_retryable());
    let driver = session.driver();
    assert_eq!(driver.click_count(&config.locators.civil_submit), 0);
    assert_eq!(driver.click_count(&config.locators.captcha_refresh), 0);
}

#[tokio::test]
async fn unknown_court_fails_before_any_captcha() {
    let config = test_config();
    let recognizer = ScriptedRecognizer::new(&[]);
    let flow = CauseListFlow::new(&config, &recognizer);
    let mut session = QuerySession::new(FakePortal::new(), 1);

    let raw = RawQuery {
        court: "99-Nobody".into(),
        ..RawQuery::from(query("civil", None))
    };
    let bad = CauseListQuery::try_from(raw).unwrap();

    let err = flow.run(&mut session, &bad).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Navigation);
    assert_eq!(recognizer.calls(), 0);
    assert_eq!(session.driver().screenshots(), 0);
}

#[tokio::test]
async fn popup_is_dismissed() {
    let config = test_config();
    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&[]));
    let mut session = QuerySession::new(FakePortal::new().with_popup(), 1);

    flow.open_portal(&mut session).await.unwrap();

    assert!(!session.driver().popup_visible());
    assert!(session.is_portal_open());
}

#[tokio::test]
async fn session_is_closed_on_every_exit_path() {
    let config = test_config();

    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&["ok"]));
    let mut session = QuerySession::new(FakePortal::new().with_submit_pages(&[RESULTS_PAGE]), 1);
    assert_ok!(run_in_session(&flow, &mut session, &query("civil", None)).await);
    assert!(session.driver().is_closed());

    let flow = CauseListFlow::new(&config, BrokenRecognizer);
    let mut session = QuerySession::new(FakePortal::new(), 2);
    assert_err!(run_in_session(&flow, &mut session, &query("civil", None)).await);
    assert!(session.driver().is_closed());
}

// ========== Case lookup ==========

#[tokio::test]
async fn cnr_lookup_filters_listings_by_date() {
    let config = test_config();
    let flow = CaseLookupFlow::new(&config);
    let portal = FakePortal::new().with_submit_pages(&[RESULTS_PAGE]);
    let mut session = QuerySession::new(portal, 1);
    let query = CaseLookupQuery::new(
        CaseLookup::cnr("wbpb01-0012342024").unwrap(),
        &["22-10-2025".to_string()],
    )
    .unwrap();

    let outcome = run_lookup_in_session(&flow, &mut session, &query).await.unwrap();

    assert!(outcome.result.listed());
    assert_eq!(outcome.result.records()[0].case_number, "GR/77/2023");
    assert_eq!(outcome.pdf_links.len(), 1);
    let driver = session.driver();
    assert_eq!(
        driver.value_of(&config.locators.cnr_input).as_deref(),
        Some("WBPB010012342024")
    );
    assert_eq!(driver.click_count(&config.locators.search_button), 1);
    assert_eq!(driver.screenshots(), 0);
    assert!(driver.is_closed());
}

#[tokio::test]
async fn case_number_lookup_without_listing_table_fails() {
    let config = test_config();
    let flow = CaseLookupFlow::new(&config);
    let mut session = QuerySession::new(FakePortal::new().with_layout_table(), 1);
    let query =
        CaseLookupQuery::new(CaseLookup::case_number("CC", "1203", "2024").unwrap(), &[]).unwrap();

    let err = run_lookup_in_session(&flow, &mut session, &query).await.unwrap_err();

    assert!(matches!(err, AppError::Submission(SubmissionError::TableNotFound)));
    let driver = session.driver();
    assert_eq!(driver.value_of(&config.locators.case_number_input).as_deref(), Some("1203"));
    assert_eq!(driver.value_of(&config.locators.case_year_input).as_deref(), Some("2024"));
    assert!(driver.is_closed());
}

// ========== Discovery ==========

#[tokio::test]
async fn lists_options_after_prior_selections() {
    let config = test_config();
    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&[]));
    let mut session = QuerySession::new(FakePortal::new(), 1);

    let states = flow
        .list_available_options(&mut session, SelectionLevel::State, &[])
        .await
        .unwrap();
    assert_eq!(states, ["Maharashtra", "West Bengal"]);

    let prior = vec!["West Bengal".to_string(), "Paschim Bardhaman".to_string()];
    let complexes = flow
        .list_available_options(&mut session, SelectionLevel::CourtComplex, &prior)
        .await
        .unwrap();
    assert_eq!(complexes, ["ASANSOL COURT COMPLEX", "DURGAPUR COURT"]);

    // same prior again: portal is not reloaded
    let again = flow
        .list_available_options(&mut session, SelectionLevel::CourtComplex, &prior)
        .await
        .unwrap();
    assert_eq!(again, complexes);
    assert_eq!(session.driver().navigations(), 1);
}

#[tokio::test]
async fn listing_needs_enough_prior_selections() {
    let config = test_config();
    let flow = CauseListFlow::new(&config, ScriptedRecognizer::new(&[]));
    let mut session = QuerySession::new(FakePortal::new(), 1);

    let err = flow
        .list_available_options(&mut session, SelectionLevel::Court, &["West Bengal".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Navigation(NavigationError::ControlNotReady {
            level: SelectionLevel::Court,
            ..
        })
    ));
    assert_eq!(session.driver().navigations(), 0);
}
