//! Configuration module for Notat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    CoherencePrompts, OrganizePrompts, Prompts, SocialPrompts, TranslatePrompts,
};
pub use settings::{
    ApiSettings, CookieSettings, GeneralSettings, OutputSettings, PipelineSettings,
    PromptSettings, Settings, TranscriptionSettings,
};
