use super::{CarfaxSignal, VehicleRecord};
use serde::{Deserialize, Serialize};

/// Raw query string of `/lookup` and `/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub stock: Option<String>,
    pub options: Option<String>,
    pub carfax_one_owner: Option<String>,
    pub clean_carfax: Option<String>,
}

impl ListingQuery {
    pub fn stock(&self) -> Option<&str> {
        non_empty(self.stock.as_deref())
    }

    pub fn options(&self) -> Option<&str> {
        non_empty(self.options.as_deref())
    }

    /// Validated `/generate` input; `None` when `stock` or `options` is missing.
    pub fn generation_request(&self) -> Option<GenerationRequest> {
        let stock_number = self.stock()?.to_string();
        let options = self.options()?.to_string();
        let carfax = CarfaxSignal::detect(
            &options,
            self.carfax_one_owner.as_deref(),
            self.clean_carfax.as_deref(),
        );

        Some(GenerationRequest {
            stock_number,
            options,
            carfax,
        })
    }
}

/// API Gateway collapses repeated parameters to their last value; do the same.
impl FromIterator<(String, String)> for ListingQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = ListingQuery::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "stock" => &mut query.stock,
                "options" => &mut query.options,
                "carfax_one_owner" => &mut query.carfax_one_owner,
                "clean_carfax" => &mut query.clean_carfax,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub stock_number: String,
    pub options: String,
    pub carfax: Option<CarfaxSignal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub vehicle: VehicleRecord,
    pub description: String,
}
