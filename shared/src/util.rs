use std::sync::atomic::{AtomicU16, Ordering};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 进程级环形序列，同一毫秒内区分并发调用者
static SEQUENCE: AtomicU16 = AtomicU16::new(0);

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: wrapping atomic sequence (4096 values per ms)
///
/// Replaces the count-rows-and-add-one scheme: issuance never reads the
/// table, so concurrent creators cannot collide on a computed "next" id.
/// Collision requires more than 4096 allocations inside one millisecond.
pub fn snowflake_id() -> i64 {
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let seq = (SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0x0FFF) as i64; // 12 bits
    (ts << 12) | seq
}
