pub(crate) mod time;
pub(crate) mod timezone;
pub(crate) mod years;

pub(crate) use time::{date_prefix, parse_timestamp, rfc3339_to_unix};
pub(crate) use timezone::Timezone;
pub(crate) use years::parse_years;
