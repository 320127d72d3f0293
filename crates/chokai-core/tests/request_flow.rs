//! Resolve the working year, derive grades, then mutate: the order every
//! request follows.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use chokai_core::config::Config;
use chokai_core::grade::GradeBand;
use chokai_core::models::{
    EventId, EventParticipation, Member, MemberId, ParticipationPatch, RsvpStatus,
};
use chokai_core::roster::{attendance_summary, merge_participation, UNKNOWN_CHILD_LABEL};
use chokai_core::store::{FileStore, RecordStore};
use chokai_core::upsert::{record_rsvp, UpsertOutcome};
use chokai_core::{FiscalYear, RequestContext};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn members() -> Vec<Member> {
    vec![
        Member::guardian(MemberId(1), "山田 太郎").with_kana("やまだ たろう"),
        Member::guardian(MemberId(2), "佐藤 花子").with_kana("さとう はなこ"),
        Member::child(MemberId(11), "山田 一郎", MemberId(1), Some(date(2018, 4, 2)))
            .with_kana("やまだ いちろう"),
        Member::child(MemberId(12), "佐藤 健", MemberId(2), Some(date(2019, 4, 1)))
            .with_kana("さとう けん"),
    ]
}

#[test]
fn test_rsvp_flow_against_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().to_path_buf()).unwrap();
    for member in members() {
        store.insert(member, Utc::now()).unwrap();
    }

    let ctx = RequestContext::resolve(
        Some(MemberId(1)),
        None,
        &Config::default(),
        date(2025, 2, 10),
    );
    assert_eq!(ctx.fiscal_year, FiscalYear::new(2024));

    let event = EventId(7);
    let t1 = Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 2, 10, 9, 30, 0).unwrap();

    let mut rsvp = |member: i64, child: i64, status: RsvpStatus, at: DateTime<Utc>| {
        record_rsvp(
            &mut store,
            event,
            MemberId(member),
            Some(MemberId(child)),
            ParticipationPatch::status(status),
            at,
        )
        .unwrap()
    };
    rsvp(1, 11, RsvpStatus::Attending, t1);
    rsvp(2, 12, RsvpStatus::Attending, t1);
    rsvp(1, 99, RsvpStatus::Maybe, t1);
    let changed = rsvp(2, 12, RsvpStatus::Declined, t2);
    assert_eq!(changed.outcome, UpsertOutcome::Updated);

    // a fresh handle sees the same rows
    let store = FileStore::new(dir.path().to_path_buf()).unwrap();
    let participations = store.list::<EventParticipation>().unwrap();
    assert_eq!(participations.len(), 3);

    let members: Vec<Member> = store
        .list::<Member>()
        .unwrap()
        .into_iter()
        .map(|stored| stored.record)
        .collect();
    let roster = merge_participation(&participations, &members, ctx.fiscal_year);

    // FY2024: born 2018-04-02 and born 2019-04-01 share the 年長 cohort
    let bands: Vec<(&str, GradeBand)> = roster
        .iter()
        .map(|e| (e.display_name.as_str(), e.grade.band))
        .collect();
    assert_eq!(
        bands,
        vec![
            ("佐藤 健", GradeBand::Nencho),
            ("山田 一郎", GradeBand::Nencho),
            (UNKNOWN_CHILD_LABEL, GradeBand::Unknown),
        ]
    );

    let summary = attendance_summary(&roster);
    assert_eq!(summary.attending, 1);
    assert_eq!(summary.declined, 1);
    assert_eq!(summary.maybe, 1);
}

#[test]
fn test_switching_year_changes_grades_not_rows() {
    let members = members();
    let child = &members[2];

    let this_year = RequestContext::resolve(None, None, &Config::default(), date(2025, 6, 1));
    let last_year = RequestContext::resolve(
        None,
        Some(this_year.fiscal_year.previous()),
        &Config::default(),
        date(2025, 6, 1),
    );

    let now = chokai_core::grade::resolve_grade(child.birthdate, this_year.fiscal_year);
    let before = chokai_core::grade::resolve_grade(child.birthdate, last_year.fiscal_year);
    assert_eq!(now.band, GradeBand::Grade1);
    assert_eq!(before.band, GradeBand::Nencho);
    assert!(before.order < now.order);
}
