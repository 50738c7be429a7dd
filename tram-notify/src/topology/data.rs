//! Built-in network data for the Kumamoto city tram.
//!
//! Station orders run from each line's own terminus to the shared terminus
//! (健軍町). The segment tables are authored per (line, direction) and are
//! authoritative: the up and down tables for the same line intentionally
//! differ at a few group boundaries, so they must not be derived from each
//! other. Both lines end with groups past 健軍町 that map to no station.

use crate::domain::{Line, Station, StationId};

use super::segments::SegmentGroup;

const A: &[Line] = &[Line::A];
const B: &[Line] = &[Line::B];
const AB: &[Line] = &[Line::A, Line::B];

const fn station(
    id: u16,
    name: &'static str,
    kana: &'static str,
    lines: &'static [Line],
) -> Station {
    Station {
        id: StationId(id),
        name,
        kana,
        lines,
    }
}

pub(super) static STATIONS: [Station; 34] = [
    // Line A only: 田崎橋 → 慶徳校前
    station(1, "田崎橋", "たさきばし", A),
    station(2, "二本木口", "にほんぎぐち", A),
    station(3, "熊本駅前", "くまもとえきまえ", A),
    station(4, "祇園橋", "ぎおんばし", A),
    station(5, "呉服町", "ごふくまち", A),
    station(6, "河原町", "かわらまち", A),
    station(7, "慶徳校前", "けいとくこうまえ", A),
    // Line B only: 上熊本 → 西辛島町
    station(21, "上熊本", "かみくまもと", B),
    station(22, "県立体育館前", "けんりつたいいくかんまえ", B),
    station(23, "本妙寺入口", "ほんみょうじいりぐち", B),
    station(24, "杉塘", "すぎども", B),
    station(25, "段山町", "だにやままち", B),
    station(26, "蔚山町", "うるさんまち", B),
    station(27, "新町", "しんまち", B),
    station(28, "洗馬橋", "せんばばし", B),
    station(29, "西辛島町", "にしからしままち", B),
    // Shared corridor: 辛島町 → 健軍町
    station(8, "辛島町", "からしままち", AB),
    station(9, "花畑町", "はなばたちょう", AB),
    station(10, "熊本城・市役所前", "くまもとじょう・しやくしょまえ", AB),
    station(11, "通町筋", "とおりちょうすじ", AB),
    station(12, "水道町", "すいどうちょう", AB),
    station(13, "九品寺交差点", "くほんじこうさてん", AB),
    station(14, "交通局前", "こうつうきょくまえ", AB),
    station(15, "味噌天神前", "みそてんじんまえ", AB),
    station(16, "新水前寺駅前", "しんすいぜんじえきまえ", AB),
    station(17, "国府", "こくふ", AB),
    station(18, "水前寺公園", "すいぜんじこうえん", AB),
    station(19, "市立体育館前", "しりつたいいくかんまえ", AB),
    station(20, "商業高校前", "しょうぎょうこうこうまえ", AB),
    station(30, "八丁馬場", "はっちょうばば", AB),
    station(31, "神水交差点", "くわみずこうさてん", AB),
    station(32, "健軍校前", "けんぐんこうまえ", AB),
    station(33, "動植物園入口", "どうしょくぶつえんいりぐち", AB),
    station(34, "健軍町", "けんぐんまち", AB),
];

const fn ids<const N: usize>(raw: [u16; N]) -> [StationId; N] {
    let mut out = [StationId(0); N];
    let mut i = 0;
    while i < N {
        out[i] = StationId(raw[i]);
        i += 1;
    }
    out
}

pub(super) static A_ORDER: [StationId; 25] = ids([
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 30, 31, 32, 33, 34,
]);

pub(super) static B_ORDER: [StationId; 27] = ids([
    21, 22, 23, 24, 25, 26, 27, 28, 29, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 30, 31,
    32, 33, 34,
]);

use SegmentGroup as G;

/// Line A, toward 田崎橋 (flag 0).
pub(super) static A_UP: [SegmentGroup; 51] = [
    G::at(&[1]),
    G::between(&[2, 3]),
    G::at(&[4]),
    G::between(&[5, 6, 7]),
    G::at(&[8]),
    G::between(&[9, 10, 11]),
    G::at(&[12]),
    G::between(&[13, 14, 15]),
    G::at(&[16]),
    G::between(&[17, 18, 19]),
    G::at(&[20]),
    G::between(&[21, 22, 23]),
    G::at(&[24]),
    G::between(&[25, 26, 27, 28, 29]),
    G::at(&[30]),
    G::between(&[31, 32, 33]),
    G::at(&[34]),
    G::between(&[35, 36, 37]),
    G::at(&[38]),
    G::between(&[39, 40, 41]),
    G::at(&[42]),
    G::between(&[43, 44]),
    G::at(&[45]),
    G::between(&[46, 47, 48, 49, 50, 51, 52]),
    G::at(&[53]),
    G::between(&[54, 55]),
    G::at(&[56]),
    G::between(&[57, 58, 59, 60, 61, 62]),
    G::at(&[63]),
    G::between(&[64, 65, 66, 67, 68]),
    G::at(&[69]),
    G::between(&[70, 71, 72, 73]),
    G::at(&[74]),
    G::between(&[75, 76, 77, 78, 79]),
    G::at(&[80]),
    G::between(&[81, 82, 83]),
    G::at(&[84]),
    G::between(&[85, 86, 87, 88, 89]),
    G::at(&[90]),
    G::between(&[91, 92, 93, 94]),
    G::at(&[95]),
    G::between(&[96, 97, 98, 99]),
    G::at(&[100]),
    G::between(&[101, 102, 103, 104, 105, 106]),
    G::at(&[107]),
    G::between(&[108, 109, 110]),
    G::at(&[111]),
    G::between(&[112, 113, 114]),
    G::at(&[115]),
    G::between(&[116, 117, 118, 119]),
    G::at(&[120]),
];

/// Line A, toward 健軍町 (flag 1).
///
/// Differs from `A_UP` around 呉服町 (16/17), 水道町–九品寺交差点 (52/53)
/// and 八丁馬場–神水交差点 (99/100).
pub(super) static A_DOWN: [SegmentGroup; 51] = [
    G::at(&[1]),
    G::between(&[2, 3]),
    G::at(&[4]),
    G::between(&[5, 6, 7]),
    G::at(&[8]),
    G::between(&[9, 10, 11]),
    G::at(&[12]),
    G::between(&[13, 14, 15, 16]),
    G::at(&[17]),
    G::between(&[18, 19]),
    G::at(&[20]),
    G::between(&[21, 22, 23]),
    G::at(&[24]),
    G::between(&[25, 26, 27, 28, 29]),
    G::at(&[30]),
    G::between(&[31, 32, 33]),
    G::at(&[34]),
    G::between(&[35, 36, 37]),
    G::at(&[38]),
    G::between(&[39, 40, 41]),
    G::at(&[42]),
    G::between(&[43, 44]),
    G::at(&[45]),
    G::between(&[46, 47, 48, 49, 50, 51]),
    G::at(&[52]),
    G::between(&[53, 54, 55]),
    G::at(&[56]),
    G::between(&[57, 58, 59, 60, 61, 62]),
    G::at(&[63]),
    G::between(&[64, 65, 66, 67, 68]),
    G::at(&[69]),
    G::between(&[70, 71, 72, 73]),
    G::at(&[74]),
    G::between(&[75, 76, 77, 78, 79]),
    G::at(&[80]),
    G::between(&[81, 82, 83]),
    G::at(&[84]),
    G::between(&[85, 86, 87, 88, 89]),
    G::at(&[90]),
    G::between(&[91, 92, 93, 94]),
    G::at(&[95]),
    G::between(&[96, 97, 98]),
    G::at(&[99]),
    G::between(&[100, 101, 102, 103, 104, 105, 106]),
    G::at(&[107]),
    G::between(&[108, 109, 110]),
    G::at(&[111]),
    G::between(&[112, 113, 114]),
    G::at(&[115]),
    G::between(&[116, 117, 118, 119]),
    G::at(&[120]),
];

/// Line B, toward 上熊本 (flag 0).
///
/// B's own codes (201–226) cover 上熊本 to 西辛島町; the shared numbering
/// resumes at 27 on the approach to 辛島町.
pub(super) static B_UP: [SegmentGroup; 55] = [
    G::at(&[201]),
    G::between(&[202, 203]),
    G::at(&[204]),
    G::between(&[205]),
    G::at(&[206]),
    G::between(&[207]),
    G::at(&[208]),
    G::between(&[209, 210, 211]),
    G::at(&[212]),
    G::between(&[213, 214, 215]),
    G::at(&[216]),
    G::between(&[217, 218, 219]),
    G::at(&[220]),
    G::between(&[221, 222]),
    G::at(&[223]),
    G::between(&[224, 225]),
    G::at(&[226]),
    G::between(&[27, 28, 29]),
    G::at(&[30]),
    G::between(&[31, 32, 33]),
    G::at(&[34]),
    G::between(&[35, 36, 37]),
    G::at(&[38]),
    G::between(&[39, 40, 41]),
    G::at(&[42]),
    G::between(&[43, 44]),
    G::at(&[45]),
    G::between(&[46, 47, 48, 49, 50, 51, 52]),
    G::at(&[53]),
    G::between(&[54, 55]),
    G::at(&[56]),
    G::between(&[57, 58, 59, 60, 61, 62]),
    G::at(&[63]),
    G::between(&[64, 65, 66, 67, 68]),
    G::at(&[69]),
    G::between(&[70, 71, 72, 73]),
    G::at(&[74]),
    G::between(&[75, 76, 77, 78, 79]),
    G::at(&[80]),
    G::between(&[81, 82, 83]),
    G::at(&[84]),
    G::between(&[85, 86, 87, 88, 89]),
    G::at(&[90]),
    G::between(&[91, 92, 93, 94]),
    G::at(&[95]),
    G::between(&[96, 97, 98, 99]),
    G::at(&[100]),
    G::between(&[101, 102, 103, 104, 105, 106]),
    G::at(&[107]),
    G::between(&[108, 109, 110]),
    G::at(&[111]),
    G::between(&[112, 113, 114]),
    G::at(&[115]),
    G::between(&[116, 117, 118, 119]),
    G::at(&[120]),
];

/// Line B, toward 健軍町 (flag 1).
pub(super) static B_DOWN: [SegmentGroup; 55] = [
    G::at(&[201]),
    G::between(&[202, 203]),
    G::at(&[204]),
    G::between(&[205]),
    G::at(&[206]),
    G::between(&[207]),
    G::at(&[208]),
    G::between(&[209, 210, 211]),
    G::at(&[212]),
    G::between(&[213, 214, 215]),
    G::at(&[216]),
    G::between(&[217, 218, 219]),
    G::at(&[220]),
    G::between(&[221, 222]),
    G::at(&[223]),
    G::between(&[224, 225]),
    G::at(&[226]),
    G::between(&[27, 28, 29]),
    G::at(&[30]),
    G::between(&[31, 32, 33]),
    G::at(&[34]),
    G::between(&[35, 36, 37]),
    G::at(&[38]),
    G::between(&[39, 40, 41]),
    G::at(&[42]),
    G::between(&[43, 44]),
    G::at(&[45]),
    G::between(&[46, 47, 48, 49, 50, 51]),
    G::at(&[52]),
    G::between(&[53, 54, 55]),
    G::at(&[56]),
    G::between(&[57, 58, 59, 60, 61, 62]),
    G::at(&[63]),
    G::between(&[64, 65, 66, 67, 68]),
    G::at(&[69]),
    G::between(&[70, 71, 72, 73]),
    G::at(&[74]),
    G::between(&[75, 76, 77, 78, 79]),
    G::at(&[80]),
    G::between(&[81, 82, 83]),
    G::at(&[84]),
    G::between(&[85, 86, 87, 88, 89]),
    G::at(&[90]),
    G::between(&[91, 92, 93, 94]),
    G::at(&[95]),
    G::between(&[96, 97, 98]),
    G::at(&[99]),
    G::between(&[100, 101, 102, 103, 104, 105, 106]),
    G::at(&[107]),
    G::between(&[108, 109, 110]),
    G::at(&[111]),
    G::between(&[112, 113, 114]),
    G::at(&[115]),
    G::between(&[116, 117, 118, 119]),
    G::at(&[120]),
];
