//! Glue between the command line and the pipeline.

pub(crate) mod console;
pub(crate) mod settings;
