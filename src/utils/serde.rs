/*!
 * Serde helpers for the Zabbix wire format.
 *
 * The API returns identifiers, clocks and sample values as JSON strings
 * (`"itemid": "23296"`, `"clock": "1351090996"`), but some proxies and older
 * releases emit bare numbers. These helpers accept both so the models do not
 * have to care.
 */

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a value that may be a JSON string or a JSON number into its
/// textual form.
///
/// Numbers are rendered with `serde_json`'s own formatting, so `42` becomes
/// `"42"` and `0.0155` stays `"0.0155"`.
///
/// # Usage with serde
///
/// ```rust
/// use serde::Deserialize;
/// use zabbix_export::utils::serde::deserialize_string_or_number;
///
/// #[derive(Deserialize)]
/// struct Item {
///     #[serde(deserialize_with = "deserialize_string_or_number")]
///     itemid: String,
/// }
///
/// let item: Item = serde_json::from_str(r#"{"itemid": 23296}"#).unwrap();
/// assert_eq!(item.itemid, "23296");
/// ```
pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "Expected string or number, found: {other}"
        ))),
    }
}
