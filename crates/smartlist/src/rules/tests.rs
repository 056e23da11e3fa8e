use chrono::{DateTime, Utc, Weekday};
use rayon::prelude::*;

use super::*;
use crate::config::CalendarConfig;
use crate::fixtures::{at, at_time, ids, item, item_in};
use crate::sort::{SortKey, SortOrder};
use crate::temporal::RelativePeriod;
use crate::types::{CombinationLogic, DownloadStatus, Item, PlayStatus};

fn calendar() -> CalendarConfig {
    CalendarConfig::utc(Weekday::Mon)
}

fn now() -> DateTime<Utc> {
    at(2025, 1, 15)
}

fn rule_set(rules: Vec<Rule>, logic: CombinationLogic) -> RuleSet {
    RuleSet::new("smart", "Smart list", rules, logic)
}

fn run(items: &[Item], set: &RuleSet) -> Vec<String> {
    ids(&evaluate_rule_set(items, set, now(), &calendar()))
}

fn single(rule: Rule, episode: &Item) -> bool {
    compile_rule(&rule, now(), &calendar())
        .expect("valid rule")
        .matches(episode)
}

#[test]
fn scenario_b_unplayed_within_last_seven_days() {
    let mut recent = item("recent", "Recent");
    recent.publish_date = Some(at(2025, 1, 10));
    let mut stale = item("stale", "Stale");
    stale.publish_date = Some(at(2025, 1, 1));
    let items = vec![recent, stale];

    let set = rule_set(
        vec![
            Rule::new(RuleType::PlayStatus, Comparator::Equals, "unplayed"),
            Rule::new(
                RuleType::PublishDate,
                Comparator::IsWithin,
                RelativePeriod::LastDays(7),
            ),
        ],
        CombinationLogic::And,
    );
    assert_eq!(run(&items, &set), ["recent"]);
}

#[test]
fn scenario_c_missing_rating_is_false() {
    let unrated = item("1", "Unrated");
    let rule = Rule::new(RuleType::Rating, Comparator::GreaterThanOrEqual, 4.0);
    assert!(!single(rule.clone(), &unrated));
    assert!(!single(rule.negate(), &unrated));

    let mut rated = item("2", "Rated");
    rated.rating = Some(4);
    let rule = Rule::new(RuleType::Rating, Comparator::GreaterThanOrEqual, 4.0);
    assert!(single(rule, &rated));
}

#[test]
fn missing_optional_fields_never_match() {
    let bare = item("1", "Bare");
    for rule in [
        Rule::new(RuleType::PublishDate, Comparator::IsWithin, RelativePeriod::ThisYear),
        Rule::new(RuleType::PublishDate, Comparator::NotEquals, "2025-01-10"),
        Rule::new(RuleType::Duration, Comparator::LessThan, 600.0),
        Rule::new(RuleType::Duration, Comparator::NotEquals, 600.0),
        Rule::new(RuleType::Rating, Comparator::Equals, 3.0).negate(),
    ] {
        assert!(!single(rule.clone(), &bare), "{rule:?}");
    }
}

#[test]
fn status_rules() {
    let mut episode = item("1", "Episode");
    episode.play_status = PlayStatus::InProgress;
    episode.download_status = DownloadStatus::Downloaded;

    assert!(single(Rule::new(RuleType::PlayStatus, Comparator::Equals, "in_progress"), &episode));
    assert!(single(Rule::new(RuleType::PlayStatus, Comparator::NotEquals, "played"), &episode));
    assert!(single(
        Rule::new(RuleType::DownloadStatus, Comparator::Equals, "Downloaded"),
        &episode
    ));
    assert!(!single(
        Rule::new(RuleType::DownloadStatus, Comparator::Equals, "queued"),
        &episode
    ));
}

#[test]
fn date_rules_against_calendar_days_and_instants() {
    let mut episode = item("1", "Episode");
    episode.publish_date = Some(at_time(2025, 1, 10, 18, 30, 0));

    let on = |comparator, value: &str| {
        single(Rule::new(RuleType::PublishDate, comparator, value), &episode)
    };
    assert!(on(Comparator::Equals, "2025-01-10"));
    assert!(!on(Comparator::NotEquals, "2025-01-10"));
    assert!(on(Comparator::GreaterThan, "2025-01-09"));
    assert!(!on(Comparator::GreaterThan, "2025-01-10"));
    assert!(on(Comparator::GreaterThanOrEqual, "2025-01-10"));
    assert!(on(Comparator::LessThanOrEqual, "2025-01-10"));
    assert!(!on(Comparator::LessThan, "2025-01-10"));
    assert!(on(Comparator::LessThan, "2025/01/11"));

    let instant = at_time(2025, 1, 10, 8, 0, 0);
    assert!(single(Rule::new(RuleType::PublishDate, Comparator::Equals, instant), &episode));
    assert!(single(Rule::new(RuleType::PublishDate, Comparator::GreaterThan, instant), &episode));
    assert!(!single(Rule::new(RuleType::PublishDate, Comparator::LessThan, instant), &episode));
}

#[test]
fn date_between_is_inclusive() {
    let mut episode = item("1", "Episode");
    episode.date_added = at(2025, 1, 10);
    let between = |start, end| {
        Rule::new(
            RuleType::DateAdded,
            Comparator::IsBetween,
            RuleValue::DateRange { start, end },
        )
    };
    assert!(single(between(at(2025, 1, 10), at(2025, 1, 12)), &episode));
    assert!(single(between(at(2025, 1, 8), at(2025, 1, 10)), &episode));
    assert!(!single(between(at(2025, 1, 11), at(2025, 1, 12)), &episode));
}

#[test]
fn calendar_day_equality_respects_offset() {
    let mut episode = item("1", "Episode");
    // 23:30 UTC on the 10th is the 11th at UTC+1.
    episode.publish_date = Some(at_time(2025, 1, 10, 23, 30, 0));
    let rule = Rule::new(RuleType::PublishDate, Comparator::Equals, "2025-01-11");

    let plus_one = CalendarConfig::new(Weekday::Mon, 60).expect("calendar");
    let local = compile_rule(&rule, now(), &plus_one).expect("valid");
    assert!(local.matches(&episode));
    let utc = compile_rule(&rule, now(), &calendar()).expect("valid");
    assert!(!utc.matches(&episode));
}

#[test]
fn numeric_rules() {
    let mut episode = item("1", "Episode");
    episode.duration_secs = Some(1800);
    episode.rating = Some(3);

    let duration = |comparator, value: RuleValue| {
        single(Rule::new(RuleType::Duration, comparator, value), &episode)
    };
    assert!(duration(Comparator::Equals, RuleValue::Number(1800.0)));
    assert!(duration(Comparator::NotEquals, RuleValue::Number(60.0)));
    assert!(duration(Comparator::GreaterThan, RuleValue::Number(600.0)));
    assert!(duration(Comparator::LessThanOrEqual, "1800".into()));
    assert!(duration(
        Comparator::IsBetween,
        RuleValue::NumberRange {
            lo: 1800.0,
            hi: 3600.0
        }
    ));
    assert!(!duration(
        Comparator::IsBetween,
        RuleValue::NumberRange { lo: 0.0, hi: 1799.0 }
    ));
    assert!(single(Rule::new(RuleType::Rating, Comparator::LessThan, 4.0), &episode));
}

#[test]
fn text_rules_ignore_case() {
    let mut episode = item_in("1", "The Weekly Roundup", "Science Hour");
    episode.description = "Interviews with researchers".to_string();

    assert!(single(Rule::new(RuleType::Title, Comparator::Contains, "weekly"), &episode));
    assert!(single(Rule::new(RuleType::Title, Comparator::NotContains, "daily"), &episode));
    assert!(single(
        Rule::new(RuleType::CollectionName, Comparator::Equals, "science hour"),
        &episode
    ));
    assert!(!single(
        Rule::new(RuleType::CollectionName, Comparator::NotEquals, "SCIENCE HOUR"),
        &episode
    ));
    assert!(single(
        Rule::new(RuleType::Description, Comparator::Contains, "RESEARCH"),
        &episode
    ));
}

#[test]
fn flag_rules() {
    let mut episode = item("1", "Episode");
    episode.is_favorited = true;

    assert!(single(Rule::flag(RuleType::IsFavorited, Comparator::IsTrue), &episode));
    assert!(!single(Rule::flag(RuleType::IsFavorited, Comparator::IsFalse), &episode));
    assert!(single(Rule::flag(RuleType::IsBookmarked, Comparator::IsFalse), &episode));
    assert!(single(Rule::new(RuleType::IsFavorited, Comparator::Equals, true), &episode));
    assert!(single(Rule::new(RuleType::IsBookmarked, Comparator::NotEquals, true), &episode));
    assert!(!single(Rule::flag(RuleType::IsFavorited, Comparator::IsTrue).negate(), &episode));
}

#[test]
fn incompatible_rules_are_reported() {
    let cases = [
        Rule::new(RuleType::Rating, Comparator::Contains, "4"),
        Rule::flag(RuleType::PublishDate, Comparator::IsWithin),
        Rule::flag(RuleType::Duration, Comparator::IsBetween),
        Rule::new(RuleType::Title, Comparator::IsTrue, "x"),
        Rule::new(RuleType::Title, Comparator::Contains, "  "),
        Rule::new(RuleType::PlayStatus, Comparator::Equals, "sideways"),
        Rule::new(RuleType::PlayStatus, Comparator::GreaterThan, "played"),
        Rule::new(RuleType::PublishDate, Comparator::Equals, "not a date"),
        Rule::new(RuleType::Rating, Comparator::Equals, "four"),
        Rule::new(RuleType::Rating, Comparator::Equals, f64::NAN),
        Rule::new(RuleType::IsArchived, Comparator::Equals, "yes"),
        Rule::new(RuleType::DateAdded, Comparator::IsWithin, 7.0),
        Rule::new(
            RuleType::Duration,
            Comparator::IsBetween,
            RuleValue::NumberRange { lo: 10.0, hi: 1.0 },
        ),
        Rule::new(
            RuleType::DateAdded,
            Comparator::IsBetween,
            RuleValue::DateRange {
                start: at(2025, 2, 1),
                end: at(2025, 1, 1),
            },
        ),
    ];
    let count = cases.len();
    let set = rule_set(cases.to_vec(), CombinationLogic::And);
    let invalid = set.invalid_rules();
    assert_eq!(invalid.len(), count);
    assert_eq!(
        invalid[0].1,
        InvalidRule::IncompatibleComparator {
            rule_type: RuleType::Rating,
            comparator: Comparator::Contains,
        }
    );
    assert_eq!(invalid[1].1, InvalidRule::MissingBounds(Comparator::IsWithin));
    assert_eq!(invalid[12].1, InvalidRule::ReversedRange);
}

#[test]
fn invalid_rules_are_skipped_not_fatal() {
    let mut short = item("short", "Short");
    short.duration_secs = Some(300);
    let mut long = item("long", "Long");
    long.duration_secs = Some(7200);
    let items = vec![short, long];

    let set = rule_set(
        vec![
            Rule::new(RuleType::Duration, Comparator::LessThan, 600.0),
            Rule::flag(RuleType::PublishDate, Comparator::IsWithin),
        ],
        CombinationLogic::And,
    );
    let matcher = RuleSetMatcher::compile(&set, now(), &calendar());
    assert_eq!(matcher.effective_rule_count(), 1);
    assert_eq!(matcher.skipped_rules().len(), 1);
    assert_eq!(matcher.skipped_rules()[0].0, 1);
    assert_eq!(ids(&matcher.evaluate(&items)), ["short"]);

    // With every rule pruned the set matches everything.
    let pruned = rule_set(
        vec![Rule::new(RuleType::Title, Comparator::GreaterThan, "a")],
        CombinationLogic::Or,
    );
    assert_eq!(run(&items, &pruned), ["short", "long"]);
}

#[test]
fn or_logic_combines_rules() {
    let mut favorite = item("favorite", "Favorite");
    favorite.is_favorited = true;
    let mut downloaded = item("downloaded", "Downloaded");
    downloaded.download_status = DownloadStatus::Downloaded;
    let plain = item("plain", "Plain");
    let items = vec![favorite, downloaded, plain];

    let set = rule_set(
        vec![
            Rule::flag(RuleType::IsFavorited, Comparator::IsTrue),
            Rule::new(RuleType::DownloadStatus, Comparator::Equals, "downloaded"),
        ],
        CombinationLogic::Or,
    );
    assert_eq!(run(&items, &set), ["favorite", "downloaded"]);
}

#[test]
fn exclusion_flags_protect_favorites_and_bookmarks() {
    let mut favorite = item("favorite", "Favorite");
    favorite.play_status = PlayStatus::Played;
    favorite.is_favorited = true;
    let mut bookmarked = item("bookmarked", "Bookmarked");
    bookmarked.play_status = PlayStatus::Played;
    bookmarked.is_bookmarked = true;
    let mut plain = item("plain", "Plain");
    plain.play_status = PlayStatus::Played;
    let items = vec![favorite, bookmarked, plain];

    let played = Rule::new(RuleType::PlayStatus, Comparator::Equals, "played");
    let all = rule_set(vec![played.clone()], CombinationLogic::And);
    assert_eq!(run(&items, &all).len(), 3);

    let except_favorites = rule_set(
        vec![played.clone().excluding_favorites()],
        CombinationLogic::And,
    );
    assert_eq!(run(&items, &except_favorites), ["bookmarked", "plain"]);

    let except_both = rule_set(
        vec![played.excluding_favorites().excluding_bookmarked()],
        CombinationLogic::And,
    );
    assert_eq!(run(&items, &except_both), ["plain"]);
}

#[test]
fn archived_items_excluded_without_archive_rule() {
    let mut archived = item("archived", "Archived");
    archived.is_archived = true;
    let live = item("live", "Live");
    let items = vec![archived, live];

    let sets = [
        rule_set(Vec::new(), CombinationLogic::And),
        rule_set(
            vec![Rule::new(RuleType::Title, Comparator::Contains, "a")],
            CombinationLogic::Or,
        ),
        rule_set(
            vec![Rule::flag(RuleType::IsFavorited, Comparator::IsFalse)],
            CombinationLogic::And,
        ),
        // An invalid archive rule does not lift the exclusion.
        rule_set(
            vec![Rule::new(RuleType::IsArchived, Comparator::Contains, "x")],
            CombinationLogic::And,
        ),
    ];
    for set in &sets {
        let result = evaluate_rule_set(&items, set, now(), &calendar());
        assert!(result.iter().all(|item| !item.is_archived), "{set:?}");
    }

    let explicit = rule_set(
        vec![Rule::flag(RuleType::IsArchived, Comparator::IsTrue)],
        CombinationLogic::And,
    );
    assert_eq!(run(&items, &explicit), ["archived"]);
}

#[test]
fn sort_order_applies_when_set() {
    let mut older = item("older", "B");
    older.publish_date = Some(at(2025, 1, 2));
    let mut newer = item("newer", "A");
    newer.publish_date = Some(at(2025, 1, 9));
    let items = vec![older, newer];

    let unsorted = rule_set(Vec::new(), CombinationLogic::And);
    assert_eq!(run(&items, &unsorted), ["older", "newer"]);

    let sorted = unsorted.with_sort(SortOrder::descending(SortKey::PublishDate));
    assert_eq!(run(&items, &sorted), ["newer", "older"]);
}

fn sample_library() -> Vec<Item> {
    (0..200)
        .map(|index| {
            let mut episode = item(&format!("ep-{index:03}"), &format!("Episode {index}"));
            episode.publish_date = Some(at(2025, 1, 1) + chrono::Duration::hours(index * 3));
            episode.play_status = if index % 3 == 0 {
                PlayStatus::Played
            } else {
                PlayStatus::Unplayed
            };
            episode.is_favorited = index % 7 == 0;
            episode.is_archived = index % 11 == 0;
            episode.rating = (index % 4 != 0).then_some((index % 5) as u8 + 1);
            episode.duration_secs = Some(600 + (index as u64) * 30);
            episode
        })
        .collect()
}

fn sample_set() -> RuleSet {
    rule_set(
        vec![
            Rule::new(RuleType::PlayStatus, Comparator::Equals, "unplayed"),
            Rule::new(
                RuleType::PublishDate,
                Comparator::IsWithin,
                RelativePeriod::LastDays(10),
            ),
            Rule::new(RuleType::Rating, Comparator::GreaterThanOrEqual, 2.0).excluding_favorites(),
        ],
        CombinationLogic::And,
    )
    .with_sort(SortOrder::ascending(SortKey::Duration))
}

#[test]
fn evaluation_is_idempotent() {
    let items = sample_library();
    let set = sample_set();
    let first = run(&items, &set);
    assert!(!first.is_empty());
    for _ in 0..3 {
        assert_eq!(run(&items, &set), first);
    }
}

#[test]
fn parallel_batches_merge_to_sequential_result() {
    let items = sample_library();
    let set = sample_set();
    let matcher = RuleSetMatcher::compile(&set, now(), &calendar());

    let sequential = ids(&matcher.evaluate(&items));
    let mut merged = items
        .par_chunks(17)
        .flat_map_iter(|batch| matcher.evaluate(batch))
        .collect::<Vec<_>>();
    crate::sort::sort_items(&mut merged, SortOrder::ascending(SortKey::Duration));
    assert_eq!(ids(&merged), sequential);
}

#[test]
fn rule_set_round_trips_through_json() {
    let mut set = rule_set(
        vec![
            Rule::new(RuleType::PlayStatus, Comparator::Equals, "unplayed"),
            Rule::new(RuleType::PublishDate, Comparator::IsWithin, RelativePeriod::ThisWeek)
                .negate(),
            Rule::new(
                RuleType::Duration,
                Comparator::IsBetween,
                RuleValue::NumberRange { lo: 60.0, hi: 600.5 },
            )
            .excluding_bookmarked(),
            Rule::new(
                RuleType::DateAdded,
                Comparator::IsBetween,
                RuleValue::DateRange {
                    start: at(2024, 12, 1),
                    end: at(2025, 1, 1),
                },
            ),
            Rule::flag(RuleType::IsArchived, Comparator::IsFalse).excluding_favorites(),
        ],
        CombinationLogic::Or,
    )
    .with_sort(SortOrder::descending(SortKey::Rating));
    set.refresh_interval_secs = 900;
    set.last_evaluated = Some(at_time(2025, 1, 14, 8, 15, 0));

    let json = serde_json::to_string(&set).expect("serialize");
    assert!(json.contains(r#""type":"playStatus""#));
    assert!(json.contains(r#""logic":"OR""#));
    let decoded: RuleSet = serde_json::from_str(&json).expect("decode");
    assert_eq!(decoded, set);
}

#[test]
fn rule_set_defaults_when_decoding() {
    let decoded: RuleSet = serde_json::from_str(
        r#"{"id":"inbox","rules":[{"type":"isFavorited","comparator":"isTrue"}],"logic":"AND"}"#,
    )
    .expect("decode");
    assert_eq!(decoded.logic, CombinationLogic::And);
    assert_eq!(decoded.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
    assert_eq!(decoded.rules[0].value, RuleValue::None);
    assert!(decoded.last_evaluated.is_none());

    let invalid = serde_json::from_str::<RuleSet>(r#"{"id":"x","logic":"XOR"}"#);
    assert!(invalid.is_err());

    let missing_logic = serde_json::from_str::<RuleSet>(r#"{"id":"x","rules":[]}"#);
    assert!(missing_logic.is_err());
}
