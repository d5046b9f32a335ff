//! Weekly study blocks as declared on the user profile.
//!
//! The stored field is untrusted: it is written by clients and may contain
//! anything. Parsing is an explicit filter step -- entries that fail shape
//! validation are dropped and counted, never an error, so one bad element
//! cannot take down its siblings or the calling operation.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_BLOCK_DURATION_MINUTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayKey {
    pub fn as_str(self) -> &'static str {
        match self {
            DayKey::Mon => "mon",
            DayKey::Tue => "tue",
            DayKey::Wed => "wed",
            DayKey::Thu => "thu",
            DayKey::Fri => "fri",
            DayKey::Sat => "sat",
            DayKey::Sun => "sun",
        }
    }

    pub fn parse(value: &str) -> Option<DayKey> {
        match value {
            "mon" => Some(DayKey::Mon),
            "tue" => Some(DayKey::Tue),
            "wed" => Some(DayKey::Wed),
            "thu" => Some(DayKey::Thu),
            "fri" => Some(DayKey::Fri),
            "sat" => Some(DayKey::Sat),
            "sun" => Some(DayKey::Sun),
            _ => None,
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            DayKey::Mon => Weekday::Mon,
            DayKey::Tue => Weekday::Tue,
            DayKey::Wed => Weekday::Wed,
            DayKey::Thu => Weekday::Thu,
            DayKey::Fri => Weekday::Fri,
            DayKey::Sat => Weekday::Sat,
            DayKey::Sun => Weekday::Sun,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> DayKey {
        match weekday {
            Weekday::Mon => DayKey::Mon,
            Weekday::Tue => DayKey::Tue,
            Weekday::Wed => DayKey::Wed,
            Weekday::Thu => DayKey::Thu,
            Weekday::Fri => DayKey::Fri,
            Weekday::Sat => DayKey::Sat,
            Weekday::Sun => DayKey::Sun,
        }
    }
}

/// What kind of study commitment a block or session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Chat,
    Lesson,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Chat => "chat",
            ActivityType::Lesson => "lesson",
        }
    }

    pub fn parse(value: &str) -> Option<ActivityType> {
        match value {
            "chat" => Some(ActivityType::Chat),
            "lesson" => Some(ActivityType::Lesson),
            _ => None,
        }
    }
}

/// One recurring weekly commitment. `time` is 24-hour `HH:MM`, minute
/// quantized to 00/15/30/45.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBlock {
    pub day: DayKey,
    pub time: String,
    #[serde(rename = "type")]
    pub block_type: ActivityType,
    pub duration_minutes: u32,
}

/// Result of defensively parsing the stored `weeklyBlocks` field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBlocks {
    pub blocks: Vec<WeeklyBlock>,
    pub dropped: usize,
}

/// `HH:MM` with hour 00-23 and minute in {00,15,30,45}.
pub fn parse_block_time(time: &str) -> Option<(u32, u32)> {
    let bytes = time.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
        || !bytes[4].is_ascii_digit()
    {
        return None;
    }

    let hour = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
    let minute = u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0');
    if hour > 23 || !matches!(minute, 0 | 15 | 30 | 45) {
        return None;
    }
    Some((hour, minute))
}

pub fn is_valid_block_time(time: &str) -> bool {
    parse_block_time(time).is_some()
}

fn parse_one(item: &Value) -> Option<WeeklyBlock> {
    let obj = item.as_object()?;

    let day = DayKey::parse(obj.get("day")?.as_str()?)?;
    let time = obj.get("time")?.as_str()?;
    if !is_valid_block_time(time) {
        return None;
    }
    let block_type = ActivityType::parse(obj.get("type")?.as_str()?)?;
    let duration_minutes = obj
        .get("durationMinutes")
        .and_then(Value::as_u64)
        .filter(|minutes| *minutes > 0)
        .map(|minutes| minutes as u32)
        .unwrap_or(DEFAULT_BLOCK_DURATION_MINUTES);

    Some(WeeklyBlock {
        day,
        time: time.to_string(),
        block_type,
        duration_minutes,
    })
}

/// Parse the raw stored value into validated blocks, dropping (and counting)
/// every element that fails shape validation. A non-array value yields no
/// blocks.
pub fn parse_weekly_blocks(raw: &Value) -> ParsedBlocks {
    let Some(items) = raw.as_array() else {
        return ParsedBlocks::default();
    };

    let mut parsed = ParsedBlocks::default();
    for item in items {
        match parse_one(item) {
            Some(block) => parsed.blocks.push(block),
            None => parsed.dropped += 1,
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn valid_blocks_parse() {
        let raw = json!([
            { "day": "mon", "time": "18:00", "type": "chat", "durationMinutes": 30 },
            { "day": "sun", "time": "23:45", "type": "lesson" },
        ]);
        let parsed = parse_weekly_blocks(&raw);
        assert_eq!(parsed.dropped, 0);
        assert_eq!(
            parsed.blocks,
            vec![
                WeeklyBlock {
                    day: DayKey::Mon,
                    time: "18:00".to_string(),
                    block_type: ActivityType::Chat,
                    duration_minutes: 30,
                },
                WeeklyBlock {
                    day: DayKey::Sun,
                    time: "23:45".to_string(),
                    block_type: ActivityType::Lesson,
                    duration_minutes: 15,
                },
            ]
        );
    }

    #[test]
    fn malformed_entries_are_dropped_without_affecting_siblings() {
        let raw = json!([
            { "day": "mon", "time": "18:00", "type": "chat" },
            { "day": "someday", "time": "18:00", "type": "chat" },
            { "day": "tue", "type": "chat" },
            { "day": "wed", "time": "18:10", "type": "chat" },
            { "day": "thu", "time": "18:00", "type": "quiz" },
            "not-an-object",
            null,
        ]);
        let parsed = parse_weekly_blocks(&raw);
        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].day, DayKey::Mon);
        assert_eq!(parsed.dropped, 6);
    }

    #[test]
    fn non_array_value_yields_no_blocks() {
        assert_eq!(parse_weekly_blocks(&json!(null)), ParsedBlocks::default());
        assert_eq!(parse_weekly_blocks(&json!("x")), ParsedBlocks::default());
        assert_eq!(parse_weekly_blocks(&json!({})), ParsedBlocks::default());
    }

    #[test]
    fn time_validation_requires_quarter_hours() {
        assert!(is_valid_block_time("00:00"));
        assert!(is_valid_block_time("23:45"));
        assert!(is_valid_block_time("09:30"));
        assert!(!is_valid_block_time("24:00"));
        assert!(!is_valid_block_time("12:07"));
        assert!(!is_valid_block_time("9:15"));
        assert!(!is_valid_block_time("12-15"));
        assert!(!is_valid_block_time(""));
    }

    #[test]
    fn non_positive_duration_falls_back_to_default() {
        let raw = json!([
            { "day": "fri", "time": "07:15", "type": "chat", "durationMinutes": 0 },
            { "day": "sat", "time": "07:15", "type": "chat", "durationMinutes": -5 },
        ]);
        let parsed = parse_weekly_blocks(&raw);
        assert_eq!(parsed.blocks.len(), 2);
        assert!(parsed
            .blocks
            .iter()
            .all(|b| b.duration_minutes == DEFAULT_BLOCK_DURATION_MINUTES));
    }

    #[test]
    fn block_serde_uses_wire_field_names() {
        let block = WeeklyBlock {
            day: DayKey::Tue,
            time: "08:15".to_string(),
            block_type: ActivityType::Lesson,
            duration_minutes: 45,
        };
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(
            value,
            json!({ "day": "tue", "time": "08:15", "type": "lesson", "durationMinutes": 45 })
        );
    }
}
