//! Time-of-day and weekday gates.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Timelike, Weekday};

use crate::store::Subscription;

/// Result of checking a subscription's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleGate {
    Open,
    OutsideWindow,
    WrongWeekday,
}

fn to_minute(t: NaiveTime) -> NaiveTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Whether `now` lies in the inclusive window `start..=end`.
///
/// Compared at minute precision. `start > end` wraps past midnight. A
/// missing bound means no restriction.
pub fn within_window(start: Option<NaiveTime>, end: Option<NaiveTime>, now: NaiveTime) -> bool {
    let (Some(start), Some(end)) = (start, end) else {
        return true;
    };
    let (start, end, now) = (to_minute(start), to_minute(end), to_minute(now));
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

/// Whether `day` is allowed. Days are numbered from Sunday = 0; an empty
/// or absent list allows every day.
pub fn on_weekday(weekdays: Option<&[u8]>, day: Weekday) -> bool {
    match weekdays {
        None | Some([]) => true,
        Some(days) => {
            let day = day.num_days_from_sunday() as u8;
            days.contains(&day)
        }
    }
}

/// Check both gates for `subscription` at local time `now`.
pub fn check<Tz: TimeZone>(subscription: &Subscription, now: &DateTime<Tz>) -> ScheduleGate {
    if !within_window(subscription.start_time, subscription.end_time, now.time()) {
        return ScheduleGate::OutsideWindow;
    }
    if !on_weekday(subscription.weekdays.as_deref(), now.weekday()) {
        return ScheduleGate::WrongWeekday;
    }
    ScheduleGate::Open
}

#[cfg(test)]
mod tests {
    use chrono_tz::Asia::Tokyo;
    use proptest::prelude::*;

    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overnight_window_wraps() {
        let (start, end) = (Some(hm(22, 0)), Some(hm(6, 0)));
        assert!(within_window(start, end, hm(23, 30)));
        assert!(within_window(start, end, hm(5, 0)));
        assert!(!within_window(start, end, hm(12, 0)));
    }

    #[test]
    fn bounds_are_inclusive_at_minute_precision() {
        let (start, end) = (Some(hm(7, 0)), Some(hm(9, 0)));
        assert!(within_window(start, end, hm(7, 0)));
        assert!(within_window(start, end, NaiveTime::from_hms_opt(9, 0, 59).unwrap()));
        assert!(!within_window(start, end, hm(9, 1)));
        assert!(!within_window(start, end, NaiveTime::from_hms_opt(6, 59, 59).unwrap()));
    }

    #[test]
    fn missing_bound_is_unrestricted() {
        assert!(within_window(None, Some(hm(1, 0)), hm(12, 0)));
        assert!(within_window(Some(hm(13, 0)), None, hm(12, 0)));
        assert!(within_window(None, None, hm(0, 0)));
    }

    #[test]
    fn weekday_numbering_starts_on_sunday() {
        let weekend: &[u8] = &[0, 6];
        assert!(on_weekday(Some(weekend), Weekday::Sun));
        assert!(on_weekday(Some(weekend), Weekday::Sat));
        assert!(!on_weekday(Some(weekend), Weekday::Mon));
        assert!(on_weekday(Some(&[][..]), Weekday::Wed));
        assert!(on_weekday(None, Weekday::Wed));
    }

    #[test]
    fn check_uses_local_time() {
        use chrono::Utc;
        use uuid::Uuid;

        use crate::domain::{Direction, StationId};
        use crate::store::{SubscriptionId, UserId};

        let sub = Subscription {
            id: SubscriptionId(Uuid::nil()),
            user_id: UserId(Uuid::nil()),
            station_id: StationId(8),
            direction: Direction::Down,
            trigger_stops: 2,
            start_time: Some(hm(7, 0)),
            end_time: Some(hm(9, 0)),
            weekdays: Some(vec![1, 2, 3, 4, 5]),
            is_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // Monday 2024-04-01 08:00 JST
        let monday = Tokyo.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        assert_eq!(check(&sub, &monday), ScheduleGate::Open);

        // Same instant in UTC is 23:00 Sunday
        let utc = monday.with_timezone(&Utc);
        assert_eq!(check(&sub, &utc), ScheduleGate::OutsideWindow);

        let sunday = Tokyo.with_ymd_and_hms(2024, 3, 31, 8, 0, 0).unwrap();
        assert_eq!(check(&sub, &sunday), ScheduleGate::WrongWeekday);
    }

    proptest! {
        #[test]
        fn window_and_complement_cover_the_day(
            s in 0u32..1440,
            e in 0u32..1440,
            n in 0u32..1440,
        ) {
            prop_assume!(s != e && (e + 1) % 1440 != s);
            let t = |m: u32| hm(m / 60, m % 60);
            // The window and its complement (shifted by a minute) partition the day
            let inside = within_window(Some(t(s)), Some(t(e)), t(n));
            let outside = within_window(Some(t((e + 1) % 1440)), Some(t((s + 1439) % 1440)), t(n));
            prop_assert!(inside != outside);
        }

        #[test]
        fn unrestricted_window_always_open(n in 0u32..1440) {
            prop_assert!(within_window(None, None, hm(n / 60, n % 60)));
        }
    }
}
