//! Negotiation price prediction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::DemandLabel;

/// Price proposed to the supplier for a reorder, scaled by demand.
///
/// Strictly increasing in the demand level for any positive base price.
pub fn proposed_price(base_price: Decimal, demand: DemandLabel) -> Decimal {
    let factor = match demand {
        DemandLabel::Low => dec!(0.9),
        DemandLabel::Medium => dec!(1.0),
        DemandLabel::High => dec!(1.2),
    };
    base_price * factor
}
