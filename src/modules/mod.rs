pub mod oclc;
pub mod query;
pub mod springshare;
