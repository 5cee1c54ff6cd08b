//! 时间工具函数 — 业务时区转换
//!
//! 所有日期→时间戳转换统一在 API handler 层完成，
//! repository 层只接收 `i64` Unix millis。

use chrono::{NaiveDate, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 验证日期不在未来 (业务时区)
pub fn validate_not_future(date: NaiveDate, tz: Tz) -> AppResult<()> {
    let today = chrono::Utc::now().with_timezone(&tz).date_naive();
    if date > today {
        return Err(AppError::validation(format!(
            "Date {} is in the future (today is {})",
            date, today
        )));
    }
    Ok(())
}

/// 日期 + 时分秒 → Unix millis (业务时区)
///
/// 越界的时分秒按 00:00:00 处理。
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let time = NaiveTime::from_hms_opt(hour, min, sec).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}

/// 日期 + cutoff 时间 → Unix millis (业务时区)
///
/// 用于营业日边界计算 (business_day_cutoff)。
pub fn date_cutoff_millis(date: NaiveDate, cutoff: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(cutoff);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 解析 cutoff 时间字符串 (HH:MM)，失败返回 00:00
pub fn parse_cutoff(cutoff: &str) -> NaiveTime {
    NaiveTime::parse_from_str(cutoff, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse business_day_cutoff '{}': {}, falling back to 00:00",
            cutoff,
            e
        );
        NaiveTime::MIN
    })
}

/// 营业日闭区间 [from, to] → 半开毫秒区间 [from@cutoff, (to+1)@cutoff)
pub fn business_range_millis(
    from: NaiveDate,
    to: NaiveDate,
    cutoff: NaiveTime,
    tz: Tz,
) -> AppResult<(i64, i64)> {
    if from > to {
        return Err(AppError::validation(format!(
            "from_date {} is after to_date {}",
            from, to
        )));
    }
    let end_day = to
        .succ_opt()
        .ok_or_else(|| AppError::validation(format!("Date out of range: {}", to)))?;
    Ok((
        date_cutoff_millis(from, cutoff, tz),
        date_cutoff_millis(end_day, cutoff, tz),
    ))
}

/// 计算当前营业日起始日期 (业务时区)
///
/// 当前时间 < cutoff → 还在"昨天"的营业日
/// 当前时间 >= cutoff → 当前营业日 = 今天
pub fn current_business_date(cutoff: NaiveTime, tz: Tz) -> NaiveDate {
    let now = chrono::Utc::now().with_timezone(&tz);
    if now.time() < cutoff {
        (now - chrono::Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    }
}

/// 日历月 → [start, end) Unix millis (业务时区)
///
/// 考勤等按月查询使用；month 为 1-12。
pub fn month_range_millis(year: i32, month: u32, tz: Tz) -> AppResult<(i64, i64)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid year/month: {}-{}", year, month)))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::validation(format!("Invalid year/month: {}-{}", year, month)))?;
    Ok((day_start_millis(start, tz), day_start_millis(end, tz)))
}

/// 业务时区当前的 UTC 偏移 (毫秒)
///
/// 小时分桶在 SQL 侧做 `(created_at + offset) / 1000` 换算。
/// 取查询时刻的偏移，跨 DST 切换的历史数据会整点漂移一小时。
pub fn tz_offset_millis(tz: Tz) -> i64 {
    let now = chrono::Utc::now().with_timezone(&tz);
    i64::from(tz.offset_from_utc_datetime(&now.naive_utc()).fix().local_minus_utc()) * 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cutoff_accepts_hh_mm() {
        assert_eq!(parse_cutoff("02:00"), NaiveTime::from_hms_opt(2, 0, 0).unwrap());
        assert_eq!(parse_cutoff("23:30"), NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        // garbage falls back to midnight
        assert_eq!(parse_cutoff("abc"), NaiveTime::MIN);
    }

    #[test]
    fn month_range_covers_whole_month() {
        let tz = chrono_tz::UTC;
        let (start, end) = month_range_millis(2025, 3, tz).unwrap();
        let days = (end - start) / 86_400_000;
        assert_eq!(days, 31);
        // December rolls into next year
        let (start, end) = month_range_millis(2025, 12, tz).unwrap();
        assert_eq!((end - start) / 86_400_000, 31);
        assert!(start < end);
    }

    #[test]
    fn month_range_rejects_bad_month() {
        assert!(month_range_millis(2025, 13, chrono_tz::UTC).is_err());
    }

    #[test]
    fn day_bounds_are_half_open() {
        let tz = chrono_tz::UTC;
        let d = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(day_end_millis(d, tz) - day_start_millis(d, tz), 86_400_000);
    }

    #[test]
    fn business_range_shifts_by_cutoff() {
        let tz = chrono_tz::UTC;
        let cutoff = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (start, end) = business_range_millis(d, d, cutoff, tz).unwrap();
        // one business day, starting 04:00
        assert_eq!(end - start, 86_400_000);
        assert_eq!(start, day_start_millis(d, tz) + 4 * 3_600_000);
    }

    #[test]
    fn business_range_rejects_inverted_dates() {
        let tz = chrono_tz::UTC;
        let from = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert!(business_range_millis(from, to, NaiveTime::MIN, tz).is_err());
    }

    #[test]
    fn kolkata_offset_is_five_thirty() {
        // IST has no DST, fixed +05:30
        assert_eq!(tz_offset_millis(chrono_tz::Asia::Kolkata), 19_800_000);
    }
}
