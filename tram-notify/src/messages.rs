//! User-facing message text.
//!
//! Multi-line bodies are askama text templates under `templates/`; the
//! station picker is a flex carousel built directly as JSON.

use askama::Template;
use chrono::NaiveTime;
use serde_json::{Value, json};

use crate::bot::{Postback, TRIGGER_CHOICES};
use crate::domain::{Direction, PositionReport, Station};
use crate::line::{Message, QuickReplyItem};
use crate::resolver::{Approach, Distance};
use crate::store::Subscription;
use crate::topology::Topology;

pub const APOLOGY: &str = "エラーが発生しました。しばらくしてから再度お試しください。";
pub const UNKNOWN_ACTION: &str = "不明な操作です。";
pub const UNKNOWN_USER: &str = "ユーザー情報が見つかりません。もう一度友だち追加してください。";
pub const STATION_NOT_FOUND: &str = "電停が見つかりません。";
pub const MISSING_SETTING_ID: &str = "設定IDが指定されていません。";
pub const SETTING_DELETED: &str = "✅ 設定を削除しました。";
pub const SETTING_NOT_FOUND: &str = "設定が見つかりません。";
pub const ALL_ENABLED: &str = "✅ すべての通知を有効にしました。";
pub const ALL_DISABLED: &str = "✅ すべての通知を無効にしました。";
pub const NOTHING_TO_TOGGLE: &str = "通知設定がありません。「設定」から追加してください。";
pub const NOTHING_TO_DELETE: &str = "削除する設定がありません。";
pub const NO_STATIONS: &str =
    "設定された電停がありません。「設定」から通知電停を追加してください。";
pub const FETCH_FAILED: &str = "電車情報の取得に失敗しました。";

/// Stations per carousel page.
const PICKER_PAGE_SIZE: usize = 10;

// LINE allows at most 13 quick reply buttons.
const MAX_QUICK_REPLIES: usize = 13;

// ============================================================================
// Templates
// ============================================================================

#[derive(Template)]
#[template(path = "notification.txt", escape = "none")]
struct NotificationTemplate<'a> {
    station: &'a str,
    direction: &'a str,
    stops: i32,
    minutes: u32,
    line: &'a str,
    vehicle_type: &'a str,
}

#[derive(Template)]
#[template(path = "morning.txt", escape = "none")]
struct MorningTemplate<'a> {
    time: String,
    entries: &'a [StationStatus],
}

#[derive(Template)]
#[template(path = "now.txt", escape = "none")]
struct NowTemplate<'a> {
    entries: &'a [StationStatus],
}

#[derive(Template)]
#[template(path = "settings.txt", escape = "none")]
struct SettingsTemplate {
    entries: Vec<SettingView>,
}

#[derive(Template)]
#[template(path = "welcome.txt", escape = "none")]
struct WelcomeTemplate {
    morning_time: String,
}

#[derive(Template)]
#[template(path = "help.txt", escape = "none")]
struct HelpTemplate;

#[derive(Template)]
#[template(path = "created.txt", escape = "none")]
struct CreatedTemplate<'a> {
    station: &'a str,
    direction: &'a str,
    trigger: u8,
}

fn render(template: &impl Template) -> String {
    template
        .render()
        .map(|text| text.trim_end().to_string())
        .unwrap_or_else(|e| format!("Template error: {}", e))
}

// ============================================================================
// View models
// ============================================================================

/// One tram line in a status listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TramView {
    pub label: &'static str,
    pub stops: i32,
    pub minutes: u32,
    pub line: &'static str,
    pub vehicle_type: &'static str,
}

impl TramView {
    /// Views for the given approaches, labelled "次の電車" then "その次".
    pub fn from_approaches(approaches: &[Approach<'_>]) -> Vec<Self> {
        approaches
            .iter()
            .enumerate()
            .map(|(i, a)| TramView {
                label: if i == 0 { "次の電車" } else { "その次" },
                stops: a.distance.stops_away,
                minutes: a.distance.estimated_minutes,
                line: a.report.line.as_str(),
                vehicle_type: a.report.category.description(),
            })
            .collect()
    }
}

/// Trams approaching one subscribed station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationStatus {
    pub station: String,
    pub direction: String,
    pub trams: Vec<TramView>,
}

struct SettingView {
    status: &'static str,
    station: String,
    direction: String,
    trigger: u8,
    window: String,
}

// ============================================================================
// Builders
// ============================================================================

/// Push sent when a tram reaches a subscription's trigger distance.
pub fn notification(
    topology: &Topology,
    station: &Station,
    report: &PositionReport,
    distance: Distance,
) -> Message {
    let direction = topology.line_direction_label(report.line, report.direction);
    Message::text(render(&NotificationTemplate {
        station: station.name,
        direction: &direction,
        stops: distance.stops_away,
        minutes: distance.estimated_minutes,
        line: report.line.as_str(),
        vehicle_type: report.category.description(),
    }))
}

/// The daily digest for one user.
pub fn morning_digest(time: NaiveTime, entries: &[StationStatus]) -> Message {
    Message::text(render(&MorningTemplate {
        time: time.format("%-H:%M").to_string(),
        entries,
    }))
}

/// Reply to the "now" command.
pub fn now_status(entries: &[StationStatus]) -> Message {
    Message::text(render(&NowTemplate { entries }))
}

/// A user's subscriptions, with buttons to add or delete.
pub fn settings_list(topology: &Topology, subscriptions: &[Subscription]) -> Message {
    let entries = subscriptions
        .iter()
        .map(|s| {
            let station = topology.station(s.station_id);
            SettingView {
                status: if s.is_enabled { "✅" } else { "⏸" },
                station: station
                    .map(|st| st.name.to_string())
                    .unwrap_or_else(|| format!("駅ID:{}", s.station_id)),
                direction: station
                    .map(|st| topology.direction_label(st, s.direction))
                    .unwrap_or_default(),
                trigger: s.trigger_stops,
                window: match (s.start_time, s.end_time) {
                    (Some(start), Some(end)) => {
                        format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
                    }
                    _ => String::new(),
                },
            }
        })
        .collect();
    let text = render(&SettingsTemplate { entries });

    let mut items = vec![QuickReplyItem::postback(
        "新規追加",
        Postback::NewSetting.to_string(),
        "新規追加",
    )];
    items.extend(
        subscriptions
            .iter()
            .enumerate()
            .take(MAX_QUICK_REPLIES - 1)
            .map(|(i, s)| {
                let label = format!("{}を削除", i + 1);
                QuickReplyItem::postback(
                    label.clone(),
                    Postback::DeleteSetting { id: s.id }.to_string(),
                    label,
                )
            }),
    );
    Message::text_with_choices(text, items)
}

/// Greeting for new and unregistered users.
pub fn welcome(morning_time: NaiveTime) -> Message {
    let text = render(&WelcomeTemplate {
        morning_time: morning_time.format("%-H:%M").to_string(),
    });
    Message::text_with_choices(
        text,
        vec![QuickReplyItem::postback(
            "通知設定を始める",
            Postback::NewSetting.to_string(),
            "通知設定を始める",
        )],
    )
}

/// Command list.
pub fn help() -> Message {
    Message::text(render(&HelpTemplate))
}

/// Carousel of station buttons, ten per page.
pub fn station_picker(stations: &[Station]) -> Message {
    let pages: Vec<&[Station]> = stations.chunks(PICKER_PAGE_SIZE).collect();
    let bubbles: Vec<Value> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let mut contents = vec![json!({
                "type": "text",
                "text": format!("電停を選択 ({}/{})", i + 1, pages.len()),
                "weight": "bold",
                "size": "sm",
            })];
            contents.extend(page.iter().map(|station| {
                json!({
                    "type": "button",
                    "action": {
                        "type": "postback",
                        "label": station.name,
                        "data": Postback::SelectStation { station: station.id }.to_string(),
                    },
                    "height": "sm",
                    "style": "secondary",
                })
            }));
            json!({
                "type": "bubble",
                "size": "kilo",
                "body": {
                    "type": "box",
                    "layout": "vertical",
                    "spacing": "sm",
                    "contents": contents,
                },
            })
        })
        .collect();

    Message::flex(
        "通知を受け取りたい電停を選択してください",
        json!({ "type": "carousel", "contents": bubbles }),
    )
}

/// Ask which way the user travels from `station`.
pub fn direction_choice(topology: &Topology, station: &Station) -> Message {
    let items = [Direction::Up, Direction::Down]
        .into_iter()
        .map(|direction| {
            let label = topology.direction_label(station, direction);
            QuickReplyItem::postback(
                label.clone(),
                Postback::SelectDirection {
                    station: station.id,
                    direction,
                }
                .to_string(),
                label,
            )
        })
        .collect();
    Message::text_with_choices(
        format!("📍 {}\n\nどちら方面の電車を通知しますか？", station.name),
        items,
    )
}

/// Ask how many stops ahead to notify.
pub fn trigger_choice(topology: &Topology, station: &Station, direction: Direction) -> Message {
    let items = TRIGGER_CHOICES
        .map(|trigger| {
            let label = format!("{trigger}駅前で通知");
            QuickReplyItem::postback(
                label.clone(),
                Postback::SelectTrigger {
                    station: station.id,
                    direction,
                    trigger,
                }
                .to_string(),
                label,
            )
        })
        .collect();
    Message::text_with_choices(
        format!(
            "📍 {} ({})\n\n何駅前で通知しますか？\n（目安: 1駅=約2分）",
            station.name,
            topology.direction_label(station, direction)
        ),
        items,
    )
}

/// Confirmation after a subscription is created.
pub fn setting_created(
    topology: &Topology,
    station: &Station,
    direction: Direction,
    trigger: u8,
) -> Message {
    let direction = topology.direction_label(station, direction);
    Message::text(render(&CreatedTemplate {
        station: station.name,
        direction: &direction,
        trigger,
    }))
}

pub fn deleted_count(count: usize) -> Message {
    Message::text(format!("✅ {count}件の設定を削除しました。"))
}
