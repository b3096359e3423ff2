//! Starter notes generated from onboarding answers.
//!
//! [`starter_notes`] only renders; the service writes each note through the
//! normal save path so it is mirrored and indexed like any other note.

pub mod strategy;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{CocoonError, Result};

pub const DASHBOARD: &str = "Dashboard.md";
pub const USER_SUMMARY: &str = "AI_Context/user_summary.md";
pub const RAW_ONBOARDING: &str = "AI_Context/raw_onboarding_data.json";
pub const USER_PROFILE: &str = "Profile/user_profile.md";

const NOT_SET: &str = "Not set";

/// Typed view of the onboarding answers. Unknown keys are ignored here and
/// only survive in the raw payload note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingProfile {
    pub experience_level: Option<String>,
    pub content_goal: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub business_description: Option<String>,
    pub niche: Option<String>,
    pub platforms: Vec<String>,
    pub target_generation: Option<String>,
    pub time_available: Option<String>,
    pub content_types: Vec<String>,
    pub main_challenges: Option<String>,
    pub resources: Option<String>,
    pub monetization_intent: Option<String>,
}

impl OnboardingProfile {
    /// Parse the request body. It must be a JSON object with string answers
    /// and string lists for `platforms` and `contentTypes`.
    pub fn from_payload(raw: &Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(CocoonError::Validation(
                "onboarding payload must be a JSON object".into(),
            ));
        }
        serde_json::from_value(raw.clone())
            .map_err(|e| CocoonError::Validation(format!("onboarding payload: {e}")))
    }
}

/// A rendered note waiting to be saved.
#[derive(Debug, Clone)]
pub struct StarterNote {
    pub path: &'static str,
    pub content: String,
    pub metadata: Option<Map<String, Value>>,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn text(value: &Option<String>) -> &str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => NOT_SET,
    }
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        NOT_SET.to_string()
    } else {
        values.join(", ")
    }
}

/// Share of the twelve tracked answers that are filled in, rounded to a percent.
pub fn completion_percent(data: &OnboardingProfile) -> u32 {
    let text_fields = [
        &data.experience_level,
        &data.content_goal,
        &data.country,
        &data.city,
        &data.business_type,
        &data.niche,
        &data.target_generation,
        &data.time_available,
        &data.main_challenges,
        &data.resources,
    ];
    let filled_count = text_fields.iter().filter(|f| filled(f)).count()
        + usize::from(!data.platforms.is_empty())
        + usize::from(!data.content_types.is_empty());
    (filled_count as f64 / 12.0 * 100.0).round() as u32
}

fn location(data: &OnboardingProfile) -> String {
    match (filled(&data.city), filled(&data.country)) {
        (false, false) => NOT_SET.to_string(),
        _ => [&data.city, &data.country]
            .into_iter()
            .filter(|f| filled(f))
            .map(|f| text(f))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn meta(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn dashboard(user_id: &str, data: &OnboardingProfile, created: &str) -> StarterNote {
    let content = format!(
        "# Dashboard\n\
         \n\
         | Aspect | Value |\n\
         |---|---|\n\
         | Experience | {experience} |\n\
         | Goal | {goal} |\n\
         | Niche | {niche} |\n\
         | Location | {location} |\n\
         | Platforms | {platforms} |\n\
         | Content types | {content_types} |\n\
         \n\
         ## Notes\n\
         \n\
         - [[Profile/user_profile]]\n\
         - [[Content_Strategy/master_strategy]]\n\
         - [[Content_Strategy/content_calendar]]\n\
         - [[Resources_and_Skills/skills_tracker]]\n\
         - [[Goals_and_Metrics/performance_tracker]]\n\
         - [[AI_Context/user_summary]]\n",
        experience = text(&data.experience_level),
        goal = text(&data.content_goal),
        niche = text(&data.niche),
        location = location(data),
        platforms = data.platforms.len(),
        content_types = data.content_types.len(),
    );
    StarterNote {
        path: DASHBOARD,
        content,
        metadata: meta(json!({
            "type": "dashboard",
            "user_id": user_id,
            "created": created,
        })),
    }
}

fn user_summary(data: &OnboardingProfile) -> StarterNote {
    let content = format!(
        "# User summary\n\
         \n\
         - Experience level: {}\n\
         - Content goal: {}\n\
         - Niche: {}\n\
         - Business type: {}\n\
         - Location: {}\n\
         - Platforms: {}\n\
         - Content types: {}\n\
         - Target audience: {}\n\
         - Time available: {}\n\
         - Resources: {}\n\
         - Main challenges: {}\n\
         - Monetization intent: {}\n",
        text(&data.experience_level),
        text(&data.content_goal),
        text(&data.niche),
        text(&data.business_type),
        location(data),
        list(&data.platforms),
        list(&data.content_types),
        text(&data.target_generation),
        text(&data.time_available),
        text(&data.resources),
        text(&data.main_challenges),
        text(&data.monetization_intent),
    );
    StarterNote {
        path: USER_SUMMARY,
        content,
        metadata: None,
    }
}

/// The payload exactly as the client sent it.
fn raw_onboarding(raw: &Value, created: &str) -> Result<StarterNote> {
    Ok(StarterNote {
        path: RAW_ONBOARDING,
        content: serde_json::to_string_pretty(raw)?,
        metadata: meta(json!({
            "type": "ai_context",
            "format": "json",
            "created": created,
        })),
    })
}

fn user_profile(data: &OnboardingProfile, completion: u32, updated: &str) -> StarterNote {
    let content = format!(
        "# Profile\n\
         \n\
         Profile completion: {completion}%\n\
         \n\
         ## Creator\n\
         \n\
         - Experience level: {}\n\
         - Content goal: {}\n\
         - Location: {}\n\
         \n\
         ## Business\n\
         \n\
         - Type: {}\n\
         - Description: {}\n\
         - Niche: {}\n\
         \n\
         ## Content\n\
         \n\
         - Content types: {}\n\
         - Platforms: {}\n\
         - Target audience: {}\n\
         \n\
         ## Constraints\n\
         \n\
         - Time available: {}\n\
         - Monetization intent: {}\n\
         - Resources: {}\n\
         \n\
         ## Challenges\n\
         \n\
         {}\n",
        text(&data.experience_level),
        text(&data.content_goal),
        location(data),
        text(&data.business_type),
        text(&data.business_description),
        text(&data.niche),
        list(&data.content_types),
        list(&data.platforms),
        text(&data.target_generation),
        text(&data.time_available),
        text(&data.monetization_intent),
        text(&data.resources),
        text(&data.main_challenges),
    );
    StarterNote {
        path: USER_PROFILE,
        content,
        metadata: meta(json!({
            "type": "profile",
            "completion": completion,
            "experience_level": data.experience_level,
            "niche": data.niche,
            "last_updated": updated,
        })),
    }
}

/// Render the starter notes for `user_id`. `raw` is the request body `data`
/// was parsed from.
pub fn starter_notes(
    user_id: &str,
    data: &OnboardingProfile,
    raw: &Value,
) -> Result<Vec<StarterNote>> {
    let now = chrono::Utc::now().to_rfc3339();
    let completion = completion_percent(data);
    Ok(vec![
        dashboard(user_id, data, &now),
        user_summary(data),
        raw_onboarding(raw, &now)?,
        user_profile(data, completion, &now),
        strategy::master_strategy(data, &now),
        strategy::skills_tracker(data, &now),
        strategy::performance_tracker(data, &now),
        strategy::content_calendar(data, &now),
    ])
}
