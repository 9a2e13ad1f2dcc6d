// College recommendations: one mounted form, one completion call per accepted submit.
// All completion calls go through llm_client.

pub mod controller;
pub mod handlers;
pub mod parser;
pub mod profile;
pub mod prompt;
pub mod throttle;
pub mod validation;
