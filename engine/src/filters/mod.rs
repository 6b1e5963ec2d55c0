//! The filter catalog.
//!
//! Each [`Filter`] is a synchronous `(params, data) -> data` transform. The
//! registry wraps every entry in a condition gate (see [`gate`]) except the
//! one documented ungated entry, [`Filter::Weather`].
//!
//! ## Available filters
//!
//! | Filter | Description |
//! |--------|-------------|
//! | `csv` | Parse CSV text into records |
//! | `generate` | Generate a numeric sequence |
//! | `geohash` | Encode a lat/lon pair as a geohash |
//! | `json` | Parse JSON text |
//! | `moment` | Parse and reformat a timestamp |
//! | `mutate` | Merge assignments into the data |
//! | `paginate` | Keep one page of an array |
//! | `script` | Run a Rhai script over the data |
//! | `select` | Keep only listed fields |
//! | `sum` | Sum numbers in an array |
//! | `urldecode` | Percent-decode a string |
//! | `weather` | Derive weather indicators (ungated) |

pub mod gate;
pub mod ops;
pub mod registry;

pub use gate::{gated, ungated, Gating, Implementation, Interceptor, Invoke};
pub use registry::{FilterInfo, FilterRegistry};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::condition::Params;
use crate::error::ExecutionResult;

/// Closed set of catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Csv,
    Generate,
    Geohash,
    Json,
    Moment,
    Mutate,
    Paginate,
    Script,
    Select,
    Sum,
    Urldecode,
    Weather,
}

impl Filter {
    pub const ALL: [Filter; 12] = [
        Filter::Csv,
        Filter::Generate,
        Filter::Geohash,
        Filter::Json,
        Filter::Moment,
        Filter::Mutate,
        Filter::Paginate,
        Filter::Script,
        Filter::Select,
        Filter::Sum,
        Filter::Urldecode,
        Filter::Weather,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Filter::Csv => "csv",
            Filter::Generate => "generate",
            Filter::Geohash => "geohash",
            Filter::Json => "json",
            Filter::Moment => "moment",
            Filter::Mutate => "mutate",
            Filter::Paginate => "paginate",
            Filter::Script => "script",
            Filter::Select => "select",
            Filter::Sum => "sum",
            Filter::Urldecode => "urldecode",
            Filter::Weather => "weather",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Filter::Csv => "Parse CSV text into records",
            Filter::Generate => "Generate a numeric sequence",
            Filter::Geohash => "Encode a lat/lon pair as a geohash",
            Filter::Json => "Parse JSON text",
            Filter::Moment => "Parse and reformat a timestamp",
            Filter::Mutate => "Merge path=value assignments into the data",
            Filter::Paginate => "Keep one page of an array",
            Filter::Script => "Run a Rhai script over the data",
            Filter::Select => "Keep only the listed fields",
            Filter::Sum => "Sum the numbers of an array",
            Filter::Urldecode => "Percent-decode a string",
            Filter::Weather => "Derive feels-like temperature and wind indicators",
        }
    }

    /// Whether the registry gates this entry on `params.if`.
    ///
    /// `weather` is registered raw: it ignores `if` and its errors are
    /// returned without the filter-name wrapper.
    pub fn gating(self) -> Gating {
        match self {
            Filter::Weather => Gating::Ungated,
            _ => Gating::Gated,
        }
    }

    /// Run the filter. `data` is never `null` here when called through a gate.
    pub fn apply(self, params: &Params, data: Value) -> ExecutionResult<Value> {
        match self {
            Filter::Csv => ops::tabular::csv(params, data),
            Filter::Generate => ops::generate::generate(params, data),
            Filter::Geohash => ops::geo::geohash(params, data),
            Filter::Json => ops::text::json(params, data),
            Filter::Moment => ops::time::moment(params, data),
            Filter::Mutate => ops::mutate::mutate(params, data),
            Filter::Paginate => ops::tabular::paginate(params, data),
            Filter::Script => ops::script::script(params, data),
            Filter::Select => ops::tabular::select(params, data),
            Filter::Sum => ops::tabular::sum(params, data),
            Filter::Urldecode => ops::text::urldecode(params, data),
            Filter::Weather => ops::geo::weather(params, data),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("Unknown filter: {}", s))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for filter in Filter::ALL {
            assert_eq!(filter.name().parse::<Filter>().unwrap(), filter);
            assert_eq!(filter.to_string(), filter.name());
        }
        assert!("geoip".parse::<Filter>().is_err());
    }

    #[test]
    fn test_exactly_one_ungated_entry() {
        let ungated: Vec<_> = Filter::ALL
            .into_iter()
            .filter(|f| f.gating() == Gating::Ungated)
            .collect();
        assert_eq!(ungated, vec![Filter::Weather]);
    }

    #[test]
    fn test_serde_names_match() {
        let value = serde_json::to_value(Filter::Urldecode).unwrap();
        assert_eq!(value, serde_json::json!("urldecode"));
    }
}
