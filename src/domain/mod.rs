//! Domain model: invoices, the consistency rules they must satisfy and the
//! storage port the application layer talks to.

pub mod invoice;
pub mod outcome;
pub mod ports;
pub mod validation;
