//! Company record model and normalization
//!
//! - `api`: the nested registry response, every sub-object optional
//! - `row`: the flat column layout for both table variants
//! - `normalize`: record → row mapping with coercion and truncation

mod api;
mod normalize;
mod row;

pub use api::{
    flag_text, Address, ApiRecord, CodeDescription, EmailContact, IbgeGeocode, MeiRegime,
    PhoneContact, RegistrationSituation, Scalar, SearchResponse, SimplesRegime, SpecialSituation,
};
pub use normalize::{
    boolean_to_text, normalize_record, number_to_text, truncate_value, IMPORT_DATE_FORMAT,
};
pub use row::{Column, ColumnScope, NormalizedRow, SchemaVariant, LAYOUT};
