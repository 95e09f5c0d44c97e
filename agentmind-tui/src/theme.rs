//! SynthBrute theme and color utilities.

use crate::notifications::NotificationLevel;
use crate::state::HealthState;
use agentmind_core::{AnalysisResult, FieldType, Sender};
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct SynthBruteTheme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub tertiary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl SynthBruteTheme {
    pub fn synthbrute() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            tertiary: Color::Rgb(255, 255, 0),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 255, 0),
            error: Color::Rgb(255, 0, 0),
            info: Color::Rgb(0, 255, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

pub fn sender_color(sender: Sender, theme: &SynthBruteTheme) -> Color {
    match sender {
        Sender::User => theme.primary,
        Sender::Ai => theme.secondary,
    }
}

pub fn analysis_color(analysis: Option<&AnalysisResult>, theme: &SynthBruteTheme) -> Color {
    match analysis {
        None => theme.text_dim,
        Some(result) if result.is_failure() => theme.error,
        Some(_) => theme.success,
    }
}

pub fn health_color(health: HealthState, theme: &SynthBruteTheme) -> Color {
    match health {
        HealthState::Unknown => theme.text_dim,
        HealthState::Ready => theme.success,
        HealthState::Unavailable => theme.error,
    }
}

pub fn field_type_color(field_type: FieldType, theme: &SynthBruteTheme) -> Color {
    match field_type {
        FieldType::String => theme.primary,
        FieldType::Number | FieldType::Integer => theme.tertiary,
        FieldType::Boolean => theme.success,
        FieldType::Array => theme.secondary,
    }
}

pub fn notification_color(level: NotificationLevel, theme: &SynthBruteTheme) -> Color {
    match level {
        NotificationLevel::Info => theme.info,
        NotificationLevel::Warning => theme.warning,
        NotificationLevel::Error => theme.error,
        NotificationLevel::Success => theme.success,
    }
}
