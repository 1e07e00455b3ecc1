pub mod coerce;
pub mod filter;
pub mod observation;
pub mod schema;
pub mod source;
pub mod table;
