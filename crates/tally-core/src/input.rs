//! Serde helpers for browser input, where an untouched field arrives as `""`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::Error as _};

pub(crate) fn blank_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(de)?;
  Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdInput {
  Int(i64),
  Str(String),
}

/// Accept a JSON number or a (possibly blank) string. Unparseable input is
/// treated as absent so the caller reports the missing field.
pub(crate) fn lenient_id<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<IdInput>::deserialize(de)? {
    Some(IdInput::Int(id)) => Some(id),
    Some(IdInput::Str(s)) => s.trim().parse().ok(),
    None => None,
  })
}

/// `YYYY-MM-DD` or blank.
pub(crate) fn optional_date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  blank_as_none(de)?
    .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(D::Error::custom))
    .transpose()
}
