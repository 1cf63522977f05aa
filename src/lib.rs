pub mod agent_engine;
pub mod config;
pub mod device;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;
pub mod tools;

#[cfg(test)]
mod testing;
