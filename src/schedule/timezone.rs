//! User time zones reduced to fixed UTC offsets.
//!
//! The supported zones cover the app's audience (Brazil, Paraguay and
//! neighbors). Brazil dropped DST in 2019 and Paraguay in 2024, so a fixed
//! offset is exact for every listed zone; unknown names fall back to the
//! Asunción offset.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::schedule::blocks::DayKey;

/// Wall-clock coordinates of an instant in a user's time zone, reduced to
/// the fields block matching works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    pub day: DayKey,
    /// 24-hour `HH:MM`.
    pub time: String,
    /// `YYYY-MM-DD`.
    pub iso_date: String,
}

const SECS_PER_HOUR: i32 = 3600;

fn west(hours: i32) -> FixedOffset {
    FixedOffset::west_opt(hours * SECS_PER_HOUR).expect("offset in range")
}

/// Resolve a zone name to its UTC offset. Unknown or empty names use the
/// default zone.
pub fn utc_offset_for(zone: &str) -> FixedOffset {
    match zone {
        "America/Noronha" => west(2),
        "America/Asuncion"
        | "America/Sao_Paulo"
        | "America/Bahia"
        | "America/Belem"
        | "America/Fortaleza"
        | "America/Maceio"
        | "America/Recife"
        | "America/Araguaina"
        | "America/Argentina/Buenos_Aires"
        | "America/Montevideo" => west(3),
        "America/Boa_Vista"
        | "America/Campo_Grande"
        | "America/Cuiaba"
        | "America/Manaus"
        | "America/Porto_Velho"
        | "America/La_Paz" => west(4),
        "America/Rio_Branco" | "America/Eirunepe" | "America/Lima" | "America/Bogota" => west(5),
        "UTC" | "Etc/UTC" => west(0),
        _ => west(3),
    }
}

/// Reduce an instant to its local weekday, `HH:MM` and ISO date.
pub fn time_parts(instant: DateTime<Utc>, offset: FixedOffset) -> TimeParts {
    let local = instant.with_timezone(&offset);
    TimeParts {
        day: DayKey::from_weekday(local.weekday()),
        time: format!("{:02}:{:02}", local.hour(), local.minute()),
        iso_date: format!(
            "{:04}-{:02}-{:02}",
            local.year(),
            local.month(),
            local.day()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().expect("timestamp")
    }

    #[test]
    fn asuncion_is_utc_minus_three() {
        let parts = time_parts(utc("2026-03-02T21:00:00Z"), utc_offset_for("America/Asuncion"));
        assert_eq!(parts.day, DayKey::Mon);
        assert_eq!(parts.time, "18:00");
        assert_eq!(parts.iso_date, "2026-03-02");
    }

    #[test]
    fn offset_can_move_the_local_date_backwards() {
        // 01:30 UTC Tuesday is still Monday evening in Manaus (UTC-4).
        let parts = time_parts(utc("2026-03-03T01:30:00Z"), utc_offset_for("America/Manaus"));
        assert_eq!(parts.day, DayKey::Mon);
        assert_eq!(parts.time, "21:30");
        assert_eq!(parts.iso_date, "2026-03-02");
    }

    #[test]
    fn unknown_zone_falls_back_to_default_offset() {
        assert_eq!(
            utc_offset_for("Mars/Olympus_Mons"),
            utc_offset_for("America/Asuncion")
        );
        assert_eq!(utc_offset_for(""), utc_offset_for("America/Asuncion"));
    }

    #[test]
    fn utc_zone_is_zero_offset() {
        let parts = time_parts(utc("2026-03-02T21:05:00Z"), utc_offset_for("UTC"));
        assert_eq!(parts.time, "21:05");
    }
}
