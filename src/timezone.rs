//! Resolve the server's configured timezone.

pub use time_tz::Tz;

/// Get the timezone named by `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a canonical timezone.
pub fn get_timezone(canonical_timezone: &str) -> Option<&'static Tz> {
    time_tz::timezones::get_by_name(canonical_timezone)
}
