use std::sync::Arc;

use salesdeck::constants::notices::{READ_ONLY, SHARED_LOAD_FAILED};
use salesdeck::{
    InboundLink, LocalState, MemoryStore, Namespace, NoticeLevel, PersistenceStore, ProductRecord,
    RecordOrigin, RecordSet, ShareLimits, UploadFormat, UploadOutcome, UploadStatus, ViewerConfig,
    ViewerSession, export,
};
use url::Url;

const WIDGET_GADGET_CSV: &str =
    "Product Name,Definition (Simple)\nWidget,A widget\nGadget,A gadget\n";

fn set_of(names: &[&str]) -> RecordSet {
    names.iter().map(|name| ProductRecord::named(*name)).collect()
}

fn names(session: &ViewerSession) -> Vec<String> {
    session
        .records()
        .iter()
        .map(|record| record.name.clone())
        .collect()
}

fn selected_name(session: &ViewerSession) -> Option<String> {
    session.selected().map(|record| record.name.clone())
}

fn open(store: &Arc<MemoryStore>, link: InboundLink) -> ViewerSession {
    ViewerSession::bootstrap(ViewerConfig::default(), store.clone(), link)
}

fn token_link(records: &RecordSet, trainee: bool) -> InboundLink {
    let token = export(records, ShareLimits::UNLIMITED).unwrap();
    let mode = if trainee { "?mode=trainee" } else { "" };
    InboundLink::parse(&format!("https://viewer.test/{mode}#data={token}")).unwrap()
}

#[test]
fn trainer_link_opens_in_trainee_view_with_first_product_selected() {
    let trainer_store = Arc::new(MemoryStore::new());
    let mut trainer = open(&trainer_store, InboundLink::default());
    assert_eq!(
        trainer.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited),
        UploadOutcome::Loaded(2)
    );
    let link = trainer
        .share_link(&Url::parse("https://viewer.test").unwrap())
        .unwrap();

    let trainee_store = Arc::new(MemoryStore::new());
    let trainee = open(&trainee_store, InboundLink::parse(&link).unwrap());
    assert!(trainee.is_trainee());
    assert_eq!(trainee.origin(), RecordOrigin::ShareToken);
    assert_eq!(names(&trainee), vec!["Widget", "Gadget"]);
    assert_eq!(selected_name(&trainee).as_deref(), Some("Widget"));
    assert_eq!(trainee.records(), trainer.records());
}

#[test]
fn share_token_replaces_local_state_and_becomes_the_baseline() {
    let store = Arc::new(MemoryStore::new());
    let state = LocalState::new(store.clone());
    state
        .save_record_set(Namespace::Lmp, &set_of(&["Legacy Lamp"]))
        .unwrap();
    state.save_selection(Namespace::Lmp, "Legacy Lamp").unwrap();

    let shared = set_of(&["Widget", "Gadget"]);
    let session = open(&store, token_link(&shared, false));
    assert_eq!(names(&session), vec!["Widget", "Gadget"]);
    assert_eq!(session.status(), UploadStatus::Uploaded);

    let persisted = state.load(Namespace::Lmp).unwrap();
    assert_eq!(persisted.records, Some(shared));
    assert_eq!(persisted.selected_id.as_deref(), Some("Widget"));

    let reopened = open(&store, InboundLink::default());
    assert_eq!(reopened.origin(), RecordOrigin::Local);
    assert_eq!(names(&reopened), vec!["Widget", "Gadget"]);
}

#[test]
fn token_wins_over_legacy_payload() {
    let token = export(&set_of(&["From Token"]), ShareLimits::UNLIMITED).unwrap();
    let legacy = urlencoding::encode(r#"[{"Product Name":"From Query"}]"#).into_owned();
    let link =
        InboundLink::parse(&format!("https://viewer.test/?data={legacy}#data={token}")).unwrap();

    let session = open(&Arc::new(MemoryStore::new()), link);
    assert_eq!(names(&session), vec!["From Token"]);
}

#[test]
fn legacy_payload_loads_when_no_token_is_present() {
    let legacy = urlencoding::encode(r#"[{"Product Name":"From Query"}]"#).into_owned();
    let link = InboundLink::parse(&format!("https://viewer.test/?data={legacy}")).unwrap();

    let session = open(&Arc::new(MemoryStore::new()), link);
    assert_eq!(session.origin(), RecordOrigin::LegacyQuery);
    assert_eq!(names(&session), vec!["From Query"]);
}

#[test]
fn bad_token_reports_error_and_falls_back_to_local_state() {
    let store = Arc::new(MemoryStore::new());
    LocalState::new(store.clone())
        .save_record_set(Namespace::Lmp, &set_of(&["Kept"]))
        .unwrap();

    let garbage = lz_str::compress_to_encoded_uri_component("{{{");
    let legacy = urlencoding::encode(r#"[{"Product Name":"From Query"}]"#).into_owned();
    let link =
        InboundLink::parse(&format!("https://viewer.test/?data={legacy}#data={garbage}")).unwrap();

    let mut session = open(&store, link);
    assert_eq!(session.origin(), RecordOrigin::Local);
    assert_eq!(names(&session), vec!["Kept"]);
    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, SHARED_LOAD_FAILED);
    assert!(session.drain_notices().is_empty());
}

#[test]
fn stale_selection_falls_back_to_first_record() {
    let store = Arc::new(MemoryStore::new());
    let state = LocalState::new(store.clone());
    state
        .save_record_set(Namespace::Lmp, &set_of(&["Alpha", "Beta", "Gamma"]))
        .unwrap();

    state.save_selection(Namespace::Lmp, "Beta").unwrap();
    assert_eq!(
        selected_name(&open(&store, InboundLink::default())).as_deref(),
        Some("Beta")
    );

    state.save_selection(Namespace::Lmp, "Retired").unwrap();
    assert_eq!(
        selected_name(&open(&store, InboundLink::default())).as_deref(),
        Some("Alpha")
    );
}

#[test]
fn empty_set_has_no_selection() {
    let store = Arc::new(MemoryStore::new());
    let session = open(&store, token_link(&RecordSet::default(), false));
    assert!(session.records().is_empty());
    assert!(session.selected().is_none());

    let fresh = open(&Arc::new(MemoryStore::new()), InboundLink::default());
    assert_eq!(fresh.origin(), RecordOrigin::Empty);
    assert_eq!(fresh.status(), UploadStatus::Idle);
    assert!(fresh.selected().is_none());
}

#[test]
fn namespaces_are_isolated() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, InboundLink::default());
    assert_eq!(session.active_namespace(), Namespace::Lmp);
    session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited);
    assert!(session.select("Gadget"));

    session.switch_namespace(Namespace::Bmp);
    assert!(session.records().is_empty());
    session.upload(b"Product Name\nBoiler\n", UploadFormat::Delimited);
    assert_eq!(names(&session), vec!["Boiler"]);

    session.switch_namespace(Namespace::Lmp);
    assert_eq!(names(&session), vec!["Widget", "Gadget"]);
    assert_eq!(selected_name(&session).as_deref(), Some("Gadget"));

    let reopened = open(&store, InboundLink::default());
    assert_eq!(reopened.active_namespace(), Namespace::Lmp);
    assert_eq!(selected_name(&reopened).as_deref(), Some("Gadget"));
}

#[test]
fn active_namespace_is_remembered() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, InboundLink::default());
    session.switch_namespace(Namespace::Bmp);
    session.upload(b"Product Name\nBoiler\n", UploadFormat::Delimited);

    let reopened = open(&store, InboundLink::default());
    assert_eq!(reopened.active_namespace(), Namespace::Bmp);
    assert_eq!(names(&reopened), vec!["Boiler"]);
}

#[test]
fn reset_clears_only_the_active_namespace_and_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, InboundLink::default());
    session.switch_namespace(Namespace::Bmp);
    session.upload(b"Product Name\nBoiler\n", UploadFormat::Delimited);
    session.switch_namespace(Namespace::Lmp);
    session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited);

    assert!(session.reset());
    assert!(session.reset());
    assert!(session.records().is_empty());
    assert!(session.selected().is_none());
    assert_eq!(session.status(), UploadStatus::Idle);
    assert_eq!(store.get(&Namespace::Lmp.records_key()).unwrap(), None);
    assert_eq!(store.get(&Namespace::Lmp.selection_key()).unwrap(), None);

    session.switch_namespace(Namespace::Bmp);
    assert_eq!(names(&session), vec!["Boiler"]);
}

#[test]
fn latest_upload_wins() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, InboundLink::default());
    let first = session.begin_upload();
    let second = session.begin_upload();

    assert_eq!(
        session.complete_upload(second, b"Product Name\nSecond\n", UploadFormat::Delimited),
        UploadOutcome::Loaded(1)
    );
    assert_eq!(
        session.complete_upload(first, b"Product Name\nFirst\n", UploadFormat::Delimited),
        UploadOutcome::Superseded
    );
    assert_eq!(names(&session), vec!["Second"]);
    assert_eq!(
        LocalState::new(store.clone())
            .load(Namespace::Lmp)
            .unwrap()
            .records,
        Some(set_of(&["Second"]))
    );
}

#[test]
fn upload_lands_in_the_namespace_it_was_started_in() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, InboundLink::default());
    session.switch_namespace(Namespace::Bmp);
    session.upload(b"Product Name\nBoiler\n", UploadFormat::Delimited);
    session.switch_namespace(Namespace::Lmp);

    let ticket = session.begin_upload();
    assert_eq!(ticket.namespace(), Namespace::Lmp);
    session.switch_namespace(Namespace::Bmp);
    assert_eq!(
        session.complete_upload(ticket, b"Product Name\nWidget\n", UploadFormat::Delimited),
        UploadOutcome::Loaded(1)
    );

    assert_eq!(session.active_namespace(), Namespace::Bmp);
    assert_eq!(names(&session), vec!["Boiler"]);
    let state = LocalState::new(store.clone());
    assert_eq!(
        state.load(Namespace::Bmp).unwrap().records,
        Some(set_of(&["Boiler"]))
    );
    assert_eq!(
        state.load(Namespace::Lmp).unwrap().records,
        Some(set_of(&["Widget"]))
    );

    session.switch_namespace(Namespace::Lmp);
    assert_eq!(names(&session), vec!["Widget"]);
    assert_eq!(selected_name(&session).as_deref(), Some("Widget"));
}

#[test]
fn importing_an_empty_set_clears_the_stored_selection() {
    let store = Arc::new(MemoryStore::new());
    let state = LocalState::new(store.clone());
    state
        .save_record_set(Namespace::Lmp, &set_of(&["Legacy Lamp"]))
        .unwrap();
    state.save_selection(Namespace::Lmp, "Legacy Lamp").unwrap();

    let session = open(&store, token_link(&RecordSet::default(), false));
    assert!(session.records().is_empty());

    let persisted = state.load(Namespace::Lmp).unwrap();
    assert_eq!(persisted.records, Some(RecordSet::default()));
    assert_eq!(persisted.selected_id, None);
}

#[test]
fn failed_record_write_leaves_stored_selection_alone() {
    // Room for the old baseline and a short selection, not for the new records.
    let store = Arc::new(MemoryStore::with_quota(60));
    let state = LocalState::new(store.clone());
    state.save_record_set(Namespace::Lmp, &set_of(&["Old"])).unwrap();
    state.save_selection(Namespace::Lmp, "Old").unwrap();

    let mut session = open(&store, InboundLink::default());
    assert_eq!(
        session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited),
        UploadOutcome::Loaded(2)
    );
    assert_eq!(selected_name(&session).as_deref(), Some("Widget"));

    let persisted = state.load(Namespace::Lmp).unwrap();
    assert_eq!(persisted.records, Some(set_of(&["Old"])));
    assert_eq!(persisted.selected_id.as_deref(), Some("Old"));
}

#[test]
fn failed_upload_keeps_previous_records() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, InboundLink::default());
    session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited);
    session.drain_notices();

    assert_eq!(
        session.upload(b"Name,Uses\nWidget,Lighting\n", UploadFormat::Delimited),
        UploadOutcome::Rejected
    );
    assert_eq!(session.status(), UploadStatus::Error);
    assert_eq!(names(&session), vec!["Widget", "Gadget"]);
    assert_eq!(session.drain_notices()[0].level, NoticeLevel::Error);
}

#[test]
fn trainee_view_is_read_only() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open(&store, token_link(&set_of(&["Widget"]), true));
    session.drain_notices();

    assert_eq!(
        session.upload(b"Product Name\nOther\n", UploadFormat::Delimited),
        UploadOutcome::Rejected
    );
    assert!(
        session
            .share_link(&Url::parse("https://viewer.test").unwrap())
            .is_none()
    );
    assert!(!session.reset());
    assert_eq!(names(&session), vec!["Widget"]);

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 3);
    assert!(notices.iter().all(|notice| notice.message == READ_ONLY));

    assert!(session.select("Widget"));
}

#[test]
fn storage_quota_failures_keep_the_session_working() {
    let store = Arc::new(MemoryStore::with_quota(24));
    let mut session = open(&store, InboundLink::default());

    assert_eq!(
        session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited),
        UploadOutcome::Loaded(2)
    );
    assert_eq!(names(&session), vec!["Widget", "Gadget"]);
    assert!(session.select("Gadget"));
    assert_eq!(selected_name(&session).as_deref(), Some("Gadget"));
    assert_eq!(store.get(&Namespace::Lmp.records_key()).unwrap(), None);
}

#[test]
fn oversized_share_link_is_refused_with_a_notice() {
    let store = Arc::new(MemoryStore::new());
    let config = ViewerConfig::default().with_limits(ShareLimits::with_max_token_len(8));
    let mut session = ViewerSession::bootstrap(config, store, InboundLink::default());
    session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited);
    session.drain_notices();

    assert!(
        session
            .share_link(&Url::parse("https://viewer.test").unwrap())
            .is_none()
    );
    assert_eq!(session.drain_notices()[0].level, NoticeLevel::Error);
}

#[test]
fn search_matches_name_and_definition() {
    let mut session = open(&Arc::new(MemoryStore::new()), InboundLink::default());
    session.upload(WIDGET_GADGET_CSV.as_bytes(), UploadFormat::Delimited);
    let hits: Vec<_> = session
        .search("GADGET")
        .into_iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(hits, vec!["Gadget"]);
    assert_eq!(session.search("").len(), 2);
}
