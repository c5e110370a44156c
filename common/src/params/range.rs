use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Query string of the fixed-granularity listing endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventRangeQuery {
    /// Reference date in `YYYY-MM-DD` form; the listing covers the
    /// day/week/month/year containing it.
    pub date: Option<String>,
}

/// Query string of the generic listing endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// One of `day`, `week`, `month` or `year`.
    pub granularity: Option<String>,

    /// Reference date in `YYYY-MM-DD` form.
    pub date: Option<String>,
}
