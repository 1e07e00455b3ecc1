pub mod cot;
pub mod derived;
pub mod io;
pub mod kpi;
pub mod monthly;
pub mod overview;
pub mod polars_ext;
