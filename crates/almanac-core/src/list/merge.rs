//! Merging fetched pages into the date-grouped view.
//!
//! All functions take the current groups by reference and return new ones.
//! Within a group records are unique by [`RecordKey`] and sorted by schedule
//! date; groups are sorted by date, oldest first.

use std::collections::{BTreeMap, HashSet};

use jiff::civil::Date;
use jiff::tz::TimeZone;
use log::debug;

use crate::models::{DateGroup, GroupOrder, Record, RecordKey};

/// Calendar day a record is listed under, in the session time zone.
pub fn date_key(record: &Record, time_zone: &TimeZone) -> Option<Date> {
    record
        .schedule_date()
        .map(|instant| instant.to_zoned(time_zone.clone()).date())
}

/// Buckets records by calendar day, keeping their relative order.
///
/// Records without any schedule date cannot be placed and are skipped.
pub fn group_by_date(items: &[Record], time_zone: &TimeZone) -> BTreeMap<Date, Vec<Record>> {
    let mut grouped: BTreeMap<Date, Vec<Record>> = BTreeMap::new();
    for record in items {
        match date_key(record, time_zone) {
            Some(date) => grouped.entry(date).or_default().push(record.clone()),
            None => debug!(
                "Skipping {} {} without a schedule date",
                record.item_type(),
                record.id().unwrap_or("<unsaved>")
            ),
        }
    }
    grouped
}

/// Merges `new_items` into `current`.
///
/// When a record is already present in its group the existing copy is kept,
/// which makes merging the same page twice a no-op.
pub fn merge(
    current: &[DateGroup],
    new_items: &[Record],
    time_zone: &TimeZone,
    order: GroupOrder,
) -> Vec<DateGroup> {
    let mut by_date: BTreeMap<Date, Vec<Record>> = current
        .iter()
        .map(|group| (group.date, group.items.clone()))
        .collect();

    for (date, incoming) in group_by_date(new_items, time_zone) {
        let items = by_date.entry(date).or_default();
        items.extend(incoming);
        dedup_by_key(items);
        sort_by_schedule(items, order);
    }

    by_date
        .into_iter()
        .map(|(date, items)| DateGroup { date, items })
        .collect()
}

/// Builds the groups from `new_items` alone, discarding any previous view.
pub fn set_groups(new_items: &[Record], time_zone: &TimeZone, order: GroupOrder) -> Vec<DateGroup> {
    merge(&[], new_items, time_zone, order)
}

/// Replaces any copy of `record` with the given one.
///
/// A saved record may have moved to another day, so every group is searched
/// and groups left empty are dropped.
pub fn upsert_record(
    current: &[DateGroup],
    record: &Record,
    time_zone: &TimeZone,
    order: GroupOrder,
) -> Vec<DateGroup> {
    let remaining = match record.key() {
        Some(key) => remove_record(current, &key),
        None => current.to_vec(),
    };
    merge(&remaining, std::slice::from_ref(record), time_zone, order)
}

/// Drops the record with `key` from every group.
pub fn remove_record(current: &[DateGroup], key: &RecordKey) -> Vec<DateGroup> {
    current
        .iter()
        .filter_map(|group| {
            let items: Vec<Record> = group
                .items
                .iter()
                .filter(|record| record.key().as_ref() != Some(key))
                .cloned()
                .collect();
            (!items.is_empty()).then_some(DateGroup {
                date: group.date,
                items,
            })
        })
        .collect()
}

fn dedup_by_key(items: &mut Vec<Record>) {
    let mut seen: HashSet<RecordKey> = HashSet::new();
    items.retain(|record| match record.key() {
        Some(key) => seen.insert(key),
        None => true,
    });
}

fn sort_by_schedule(items: &mut [Record], order: GroupOrder) {
    match order {
        GroupOrder::Ascending => items.sort_by_key(Record::schedule_date),
        GroupOrder::Descending => {
            items.sort_by(|a, b| b.schedule_date().cmp(&a.schedule_date()));
        }
    }
}
