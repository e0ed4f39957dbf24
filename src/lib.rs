//! Compare UK general election outcomes under first-past-the-post and
//! D'Hondt proportional representation, and find the coalitions each allows.

pub mod comparison;
pub mod data;
pub mod database;
pub mod elections;
pub mod model;
pub mod session;
