use std::time::{SystemTime, UNIX_EPOCH};

/// A source of whole seconds since the Unix epoch.
///
/// Identifier generators embed this value in the leading four bytes of every
/// [`ObjectId`](crate::ObjectId). Tests swap in a fixed clock.
///
/// # Example
///
/// ```
/// use oidbulk::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_secs(&self) -> u32 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_secs(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in seconds since 1970-01-01 UTC.
    fn current_secs(&self) -> u32;
}

/// Wall-clock [`TimeSource`] backed by [`SystemTime`].
///
/// A clock set before the Unix epoch reports `0`. Values past 2106 wrap, the
/// same as any 32-bit seconds field.
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_secs(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs() as u32)
    }
}
