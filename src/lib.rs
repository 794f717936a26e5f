//! LPA access
//!
//! Binds attorneys, certificate providers, donors and supporters to Lasting
//! Power of Attorney records, and gives each of them access to the records
//! they are entitled to see.
//!
//! Everything lives in one table keyed by `(PK, SK)` with a reverse-lookup
//! index on `SK`. Invitations are share codes; redeeming one creates the
//! actor's record on the LPA and a sub-index pointer that the dashboard
//! follows back to the LPA.

pub mod actor;
pub mod clients;
pub mod config;
pub mod handlers;
pub mod repository;
pub mod services;
pub mod session;
pub mod storage;
pub mod task;
pub mod utils;
