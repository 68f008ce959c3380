// Library root for the advisor binary: snapshot loading and the advisory
// pass, exposed so integration tests can drive them without the CLI.

pub mod advice;
pub mod snapshot;
