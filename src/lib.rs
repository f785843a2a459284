pub mod aggregate;
pub mod api_types;
pub mod budget;
pub mod config;
pub mod entities;
pub mod fetch;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod out_models;
pub mod prompts;
pub mod rank;
pub mod render;
pub mod scoring;
pub mod taxonomy;
