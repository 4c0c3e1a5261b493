// tests/pipeline_e2e.rs
mod common;

use common::*;
use tender_notifier::store::load;
use tender_notifier::{run_once, Match, NotifyOutcome, RawItem};

#[tokio::test]
async fn first_run_records_and_notifies_once() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), vec![source(BAYERN, &["catering", "kantin"])]);
    let ex = StaticExtractor::default().with_page(
        BAYERN,
        vec![
            RawItem::new("Catering Vertrag", "05.05.2025"),
            RawItem::new("Straßenbau B12", "05.05.2025"),
        ],
    );
    let notifier = RecordingNotifier::default();

    let report = run_once(&cfg, &ex, &notifier).await.unwrap();

    let expected = vec![Match::new("Catering Vertrag", "05.05.2025")];
    assert_eq!(report.new_matches, expected);
    assert_eq!(report.notify, NotifyOutcome::Sent);
    assert_eq!(notifier.calls.lock().clone(), vec![expected.clone()]);

    let saved = load(&cfg.state_path).unwrap();
    assert_eq!(saved[BAYERN], expected);
    assert_eq!(report.sources[0].extracted, 2);
    assert_eq!(report.sources[0].matched, 1);
    assert_eq!(report.sources[0].new, 1);
}

#[tokio::test]
async fn second_identical_run_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);
    let ex = StaticExtractor::default().with_page(
        BAYERN,
        vec![
            RawItem::new("Catering Kita", "01.01.2024"),
            RawItem::new("Schulcatering", "02.01.2024"),
        ],
    );

    let first = RecordingNotifier::default();
    run_once(&cfg, &ex, &first).await.unwrap();
    let after_first = std::fs::read_to_string(&cfg.state_path).unwrap();

    let second = RecordingNotifier::default();
    let report = run_once(&cfg, &ex, &second).await.unwrap();

    assert!(report.new_matches.is_empty());
    assert_eq!(report.notify, NotifyOutcome::Skipped);
    assert_eq!(second.call_count(), 0);
    assert_eq!(std::fs::read_to_string(&cfg.state_path).unwrap(), after_first);
}

#[tokio::test]
async fn changed_date_is_flagged_again() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);

    let day1 = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Catering Kita", "01.01.2024")]);
    run_once(&cfg, &day1, &RecordingNotifier::default()).await.unwrap();

    let day2 = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Catering Kita", "08.01.2024")]);
    let notifier = RecordingNotifier::default();
    let report = run_once(&cfg, &day2, &notifier).await.unwrap();

    assert_eq!(report.new_matches, vec![Match::new("Catering Kita", "08.01.2024")]);
    assert_eq!(load(&cfg.state_path).unwrap()[BAYERN].len(), 2);
}

#[tokio::test]
async fn failed_extraction_is_degraded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);
    let ex = StaticExtractor::default(); // every URL fails
    let notifier = RecordingNotifier::default();

    let report = run_once(&cfg, &ex, &notifier).await.unwrap();

    assert_eq!(report.sources[0].extracted, 0);
    assert!(report.sources[0].extract_error.is_some());
    assert_eq!(report.notify, NotifyOutcome::Skipped);
    assert_eq!(notifier.call_count(), 0);
    assert!(load(&cfg.state_path).unwrap().get(BAYERN).is_none());
}

#[tokio::test]
async fn one_failing_source_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(
        dir.path(),
        vec![source(BAYERN, &["catering"]), source(OTHER, &["speise"])],
    );
    let ex = StaticExtractor::default()
        .with_page(OTHER, vec![RawItem::new("Speiseversorgung Klinik", "03.03.2025")]);
    let notifier = RecordingNotifier::default();

    let report = run_once(&cfg, &ex, &notifier).await.unwrap();

    assert_eq!(*ex.calls.lock(), vec![BAYERN.to_string(), OTHER.to_string()]);
    assert_eq!(notifier.call_count(), 1);
    assert_eq!(report.new_matches.len(), 1);
    let saved = load(&cfg.state_path).unwrap();
    assert!(saved.get(BAYERN).is_none());
    assert_eq!(saved[OTHER].len(), 1);
}

#[tokio::test]
async fn all_sources_share_a_single_notification() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(
        dir.path(),
        vec![source(BAYERN, &["hotel"]), source(OTHER, &["essen"])],
    );
    let ex = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Hotelzimmer Messe", "1")])
        .with_page(OTHER, vec![RawItem::new("Mittagessen Schule", "2")]);
    let notifier = RecordingNotifier::default();

    run_once(&cfg, &ex, &notifier).await.unwrap();

    let calls = notifier.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec![
            Match::new("Hotelzimmer Messe", "1"),
            Match::new("Mittagessen Schule", "2"),
        ]
    );
}

#[tokio::test]
async fn notification_failure_still_saves_state() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), vec![source(BAYERN, &["verpflegung"])]);
    let ex = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Verpflegung Bundeswehr", "09.09.2025")]);
    let notifier = RecordingNotifier::failing();

    let report = run_once(&cfg, &ex, &notifier).await.unwrap();

    assert!(matches!(report.notify, NotifyOutcome::Failed(_)));
    assert_eq!(load(&cfg.state_path).unwrap()[BAYERN].len(), 1);
}

#[tokio::test]
async fn corrupt_state_aborts_without_notifying() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);
    std::fs::write(&cfg.state_path, "{ not json").unwrap();
    let ex = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Catering", "1")]);
    let notifier = RecordingNotifier::default();

    let err = run_once(&cfg, &ex, &notifier).await.unwrap_err();

    assert!(matches!(err, tender_notifier::StoreError::Corrupt { .. }));
    assert_eq!(notifier.call_count(), 0);
    assert!(ex.calls.lock().is_empty());
    assert_eq!(std::fs::read_to_string(&cfg.state_path).unwrap(), "{ not json");
}

#[tokio::test]
async fn corrupt_state_can_be_reset() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);
    cfg.reset_on_corrupt = true;
    std::fs::write(&cfg.state_path, "{ not json").unwrap();
    let ex = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Catering", "1")]);
    let notifier = RecordingNotifier::default();

    let report = run_once(&cfg, &ex, &notifier).await.unwrap();

    assert_eq!(report.new_matches.len(), 1);
    assert_eq!(load(&cfg.state_path).unwrap()[BAYERN].len(), 1);
}

#[tokio::test]
async fn dump_path_receives_raw_items() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);
    cfg.dump_path = Some(dir.path().join("extracted.json"));
    let items = vec![
        RawItem::new("Catering", "1"),
        RawItem::new("Tiefbau", "2"),
    ];
    let ex = StaticExtractor::default().with_page(BAYERN, items.clone());

    run_once(&cfg, &ex, &RecordingNotifier::default()).await.unwrap();

    let raw = std::fs::read_to_string(dir.path().join("extracted.json")).unwrap();
    let dumped: std::collections::BTreeMap<String, Vec<RawItem>> =
        serde_json::from_str(&raw).unwrap();
    assert_eq!(dumped[BAYERN], items);
}

#[tokio::test]
async fn non_utf8_state_is_reset_when_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(dir.path(), vec![source(BAYERN, &["catering"])]);
    std::fs::write(&cfg.state_path, [0xff, 0xfe, b'{', b'}']).unwrap();
    let ex = StaticExtractor::default()
        .with_page(BAYERN, vec![RawItem::new("Catering", "1")]);

    let err = run_once(&cfg, &ex, &RecordingNotifier::default())
        .await
        .unwrap_err();
    assert!(matches!(err, tender_notifier::StoreError::Corrupt { .. }));

    cfg.reset_on_corrupt = true;
    let notifier = RecordingNotifier::default();
    let report = run_once(&cfg, &ex, &notifier).await.unwrap();

    assert_eq!(report.new_matches, vec![Match::new("Catering", "1")]);
    assert_eq!(notifier.call_count(), 1);
    assert_eq!(load(&cfg.state_path).unwrap()[BAYERN].len(), 1);
}
