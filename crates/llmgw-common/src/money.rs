use rust_decimal::Decimal;

/// Fixed-precision monetary amount, fractional cents. Never a binary float:
/// every cost field in the data model (`usage_events`, `models.pricing`,
/// `billing_summaries`) carries this type end to end, including across the
/// wire (serialized as a decimal string by `rust_decimal`'s serde impl).
pub type Cents = Decimal;
