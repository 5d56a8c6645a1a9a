//! Seasonal period inference from sampling granularity.

use common::{DataSequence, Result, TsmmError};
use tracing::debug;

pub const SECOND: i64 = 1;
pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 3600;
pub const DAY: i64 = 86_400;
pub const WEEK: i64 = 604_800;
/// Shortest (29 days) and longest (31 days) month spacing in seconds.
pub const MONTH_MIN: i64 = 2_505_600;
pub const MONTH_MAX: i64 = 2_678_400;

/// Which granularity → period mapping to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodTable {
    /// One cycle up (second → hour, minute → day, hour → week, day → year),
    /// dropping to the next shorter cycle when history holds fewer than two
    /// full cycles.
    Standard,
    /// Coarse cycles only (minute → day, hour → week, day → year), no
    /// fallback. Second granularity and anything unlisted is rejected.
    Long,
}

/// Infer the number of samples per seasonal cycle for `data`.
pub fn infer_period(data: &DataSequence, table: PeriodTable) -> Result<usize> {
    let n = data.len();
    if n <= 2 {
        return Err(TsmmError::InvalidInput(format!(
            "period inference needs more than 2 points, got {}",
            n
        )));
    }
    let granularity = data
        .granularity()
        .ok_or_else(|| TsmmError::InvalidInput("cannot derive granularity".into()))?;

    let period = match table {
        PeriodTable::Standard => standard_period(granularity, n)?,
        PeriodTable::Long => long_period(granularity)?,
    };

    debug!(
        granularity = granularity,
        data_length = n,
        table = ?table,
        period = period,
        "Inferred seasonal period"
    );
    Ok(period)
}

fn standard_period(granularity: i64, n: usize) -> Result<usize> {
    let with_fallback = |period: usize, short: usize| {
        if n < period * 2 {
            short
        } else {
            period
        }
    };

    match granularity {
        SECOND => Ok(with_fallback(3600, 60)),
        MINUTE => Ok(with_fallback(1440, 60)),
        HOUR => Ok(with_fallback(168, 24)),
        DAY => Ok(with_fallback(365, 7)),
        WEEK => Ok(52),
        MONTH_MIN..=MONTH_MAX => Ok(12),
        other => Err(TsmmError::UnsupportedGranularity(other)),
    }
}

fn long_period(granularity: i64) -> Result<usize> {
    match granularity {
        MINUTE => Ok(1440),
        HOUR => Ok(168),
        DAY => Ok(365),
        other => Err(TsmmError::UnsupportedGranularity(other)),
    }
}

/// Phase of the first `observed` point relative to a training window that
/// started at `start_time`, before any normalization: the truncated step
/// count modulo `period`, negative when `observed` precedes the start.
pub fn raw_seasonal_offset(observed: &DataSequence, start_time: i64, period: usize) -> Result<i64> {
    if observed.len() < 2 {
        return Err(TsmmError::InvalidInput(format!(
            "replay needs at least 2 observed points, got {}",
            observed.len()
        )));
    }
    let granularity = observed
        .granularity()
        .filter(|&g| g > 0)
        .ok_or_else(|| TsmmError::InvalidInput("observed timestamps must be increasing".into()))?;

    Ok(step_index(observed[0].time(), start_time, granularity) % period as i64)
}

/// Truncated number of `granularity` steps from `start_time` to `time`.
pub(crate) fn step_index(time: i64, start_time: i64, granularity: i64) -> i64 {
    (time - start_time) / granularity
}
