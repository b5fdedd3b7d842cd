pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;
