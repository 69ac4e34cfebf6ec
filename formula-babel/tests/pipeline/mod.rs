//! Pipeline tests
//!
//! Store -> edit, edit -> store and full round trips, run against a table-backed service.

mod end_parse;
mod initial_parse;
mod round_trip;
