//! Planning notes derived from keyword rules over the onboarding answers.

use super::{list, text, OnboardingProfile, StarterNote, NOT_SET};

pub const MASTER_STRATEGY: &str = "Content_Strategy/master_strategy.md";
pub const SKILLS_TRACKER: &str = "Resources_and_Skills/skills_tracker.md";
pub const PERFORMANCE_TRACKER: &str = "Goals_and_Metrics/performance_tracker.md";
pub const CONTENT_CALENDAR: &str = "Content_Strategy/content_calendar.md";

const PLATFORM_PLAYBOOK: [(&str, &str); 6] = [
    ("YouTube", "Long videos (5-15 min): tutorials, vlogs, in-depth educational content"),
    ("Instagram", "Mixed formats: carousel posts, Reels (30 s), daily Stories"),
    ("TikTok", "Short viral content (15-60 s): trends, challenges, quick tips"),
    ("LinkedIn", "Professional content: articles, reflective posts, expertise sharing"),
    ("Twitter", "Micro-content: educational threads, opinions, real-time engagement"),
    ("Facebook", "Community: long posts, events, discussion groups"),
];

fn lower(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().to_lowercase()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn is_beginner(data: &OnboardingProfile) -> bool {
    lower(&data.experience_level).trim() == "beginner"
}

fn has_platform(data: &OnboardingProfile, name: &str) -> bool {
    data.platforms.iter().any(|p| p.trim().eq_ignore_ascii_case(name))
}

fn has_content_type(data: &OnboardingProfile, name: &str) -> bool {
    data.content_types
        .iter()
        .any(|t| t.trim().eq_ignore_ascii_case(name))
}

fn bullets(items: &[String]) -> String {
    items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
}

fn niche_or(data: &OnboardingProfile, fallback: &str) -> String {
    match text(&data.niche) {
        NOT_SET => fallback.to_string(),
        niche => niche.to_string(),
    }
}

/// How the mission sentence ends, keyed on the stated content goal.
pub fn mission_completion(data: &OnboardingProfile) -> &'static str {
    let goal = lower(&data.content_goal);
    if contains_any(&goal, &["share knowledge", "partager"]) {
        "learn and grow in their field"
    } else if contains_any(&goal, &["entertain", "divertir"]) {
        "be entertained and have a good time"
    } else if contains_any(&goal, &["inspire", "inspirer"]) {
        "get inspired and pursue their dreams"
    } else {
        "reach their goals"
    }
}

pub fn platform_strategy(data: &OnboardingProfile) -> String {
    if data.platforms.is_empty() {
        return "- No platform chosen yet. Pick 1-3 main platforms.".to_string();
    }
    data.platforms
        .iter()
        .filter_map(|p| {
            PLATFORM_PLAYBOOK
                .iter()
                .find(|(name, _)| p.trim().eq_ignore_ascii_case(name))
        })
        .map(|(name, plan)| format!("### {name}\n\n{plan}\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn time_allocation(data: &OnboardingProfile) -> String {
    let time = lower(&data.time_available);
    let lines: &[&str] = if contains_any(&time, &["10h", "10 h"]) {
        &[
            "Content creation: 6h/week (60%)",
            "Planning and research: 2h/week (20%)",
            "Analysis and engagement: 1h/week (10%)",
            "Networking and collaborations: 1h/week (10%)",
        ]
    } else if contains_any(&time, &["5h", "5 h"]) {
        &[
            "Content creation: 3h/week (60%)",
            "Planning and research: 1h/week (20%)",
            "Analysis and engagement: 1h/week (20%)",
        ]
    } else {
        &[
            "Content creation: 60% of your time",
            "Planning and research: 25% of your time",
            "Analysis and optimization: 15% of your time",
        ]
    };
    bullets(&lines.iter().map(|l| l.to_string()).collect::<Vec<_>>())
}

pub fn content_suggestions(data: &OnboardingProfile) -> String {
    let niche = niche_or(data, "your field");
    let mut out = Vec::new();
    if has_content_type(data, "video") {
        out.push(format!("Educational videos on {niche}"));
        out.push("Hands-on tutorials in your specialty".to_string());
    }
    if has_content_type(data, "reels") {
        out.push(format!("Reels/Shorts with quick tips on {niche}"));
        out.push("Behind-the-scenes of your creative process".to_string());
    }
    if has_content_type(data, "posts") {
        out.push("Informative carousel posts".to_string());
        out.push(format!("Infographics on trends in {niche}"));
    }
    if out.is_empty() {
        out = vec![
            format!("Educational content on {niche}"),
            "Tips and tricks".to_string(),
            "Answers to audience questions".to_string(),
        ];
    }
    bullets(&out)
}

pub fn monetization_suggestions(data: &OnboardingProfile) -> String {
    let intent = lower(&data.monetization_intent);
    let niche = niche_or(data, "your field");
    let out = if !contains_any(&intent, &["yes", "oui"]) {
        vec![
            "Focus on growth before monetizing".to_string(),
            "Build audience and engagement first".to_string(),
            "Create value to earn trust".to_string(),
        ]
    } else if is_beginner(data) {
        vec![
            format!("Micro-partnerships with {niche} brands"),
            "Affiliate marketing for products you already use".to_string(),
            "Tips or donations from your community".to_string(),
        ]
    } else {
        vec![
            format!("Online courses on {niche}"),
            "Consulting or coaching in your expertise".to_string(),
            "Your own physical or digital products".to_string(),
            "Premium partnerships with larger brands".to_string(),
        ]
    };
    bullets(&out)
}

pub fn recommended_tools(data: &OnboardingProfile) -> String {
    let visual: &[&str] = if is_beginner(data) {
        &[
            "Canva (free): templates and easy design",
            "InShot (mobile): simple video editing",
        ]
    } else {
        &[
            "Adobe Creative Suite: professional tools",
            "Figma: collaborative design",
            "DaVinci Resolve (free): advanced video editing",
        ]
    };
    let social: &[&str] = &[
        "Buffer/Hootsuite: multi-platform scheduling",
        "Later: Instagram scheduling",
        "TubeBuddy: YouTube optimization",
    ];
    let analytics: &[&str] = &[
        "Google Analytics: web traffic",
        "Sprout Social: social analytics",
        "Notion/Airtable: organization and planning",
    ];
    let section = |title: &str, items: &[&str]| {
        let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        format!("### {title}\n\n{}", bullets(&items))
    };
    [
        section("Visual creation", visual),
        section("Social media management", social),
        section("Analytics and tracking", analytics),
    ]
    .join("\n\n")
}

pub fn learning_plan(data: &OnboardingProfile) -> String {
    let level = lower(&data.experience_level);
    let mut out: Vec<String> = match level.trim() {
        "beginner" => vec![
            "Content creation basics (storytelling, composition)",
            "Understanding your audience (personas, engagement)",
            "Core tools (Canva, mobile apps)",
        ],
        "intermediate" => vec![
            "Advanced engagement (algorithms, timing)",
            "Monetization techniques (affiliates, products)",
            "Automation and AI tools (scheduling, analysis)",
        ],
        _ => vec![
            "Scaling and delegation (team, processes)",
            "Business development (partnerships, diversification)",
            "Advanced analytics (ROI, attribution)",
        ],
    }
    .into_iter()
    .map(String::from)
    .collect();
    if has_platform(data, "YouTube") {
        out.push("YouTube mastery (SEO, thumbnails, retention)".to_string());
    }
    if has_platform(data, "Instagram") {
        out.push("Instagram mastery (Reels, algorithm, hashtags)".to_string());
    }
    bullets(&out)
}

pub fn challenge_solutions(data: &OnboardingProfile) -> String {
    let challenges = lower(&data.main_challenges);
    let mut out = Vec::new();
    if contains_any(&challenges, &["time", "temps"]) {
        out.extend([
            "Batch creation: produce several pieces in one session",
            "Reusable templates: save time on structure",
            "Automation: schedule posts ahead of time",
        ]);
    }
    if contains_any(&challenges, &["idea", "idée", "créativité"]) {
        out.extend([
            "Idea bank: keep a running list of ideas",
            "Competitive watch: take inspiration without copying",
            "Varied input: widen your sources of inspiration",
        ]);
    }
    if contains_any(&challenges, &["engagement", "audience"]) {
        out.extend([
            "Genuine interaction: reply to comments quickly",
            "Valuable content: always give the audience something",
            "Performance review: learn what works",
        ]);
    }
    if out.is_empty() {
        out.extend([
            "Start small: one platform and one content type",
            "Measure and adjust: test, analyze, optimize",
            "Find support: join creator communities",
        ]);
    }
    bullets(&out.into_iter().map(String::from).collect::<Vec<_>>())
}

pub fn metrics_tables(data: &OnboardingProfile) -> String {
    if data.platforms.is_empty() {
        return "No platform chosen yet. Pick your main platforms first.".to_string();
    }
    data.platforms
        .iter()
        .map(|platform| {
            format!(
                "### {platform}\n\
                 \n\
                 | Metric | Target | Current | Progress |\n\
                 |---|---|---|---|\n\
                 | Followers | _____ | _____ | [ ] |\n\
                 | Engagement rate | ____% | ____% | [ ] |\n\
                 | Average views | _____ | _____ | [ ] |\n\
                 | Monthly growth | ____% | ____% | [ ] |\n\
                 | Average reach | _____ | _____ | [ ] |\n"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn calendar_platforms(data: &OnboardingProfile) -> String {
    if data.platforms.is_empty() {
        "To define".to_string()
    } else {
        data.platforms
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(super) fn master_strategy(data: &OnboardingProfile, created: &str) -> StarterNote {
    let content = format!(
        "# Content strategy\n\
         \n\
         ## Mission\n\
         \n\
         I want to {goal} in {niche} to help {audience} {mission}.\n\
         \n\
         - Main niche: {niche_field}\n\
         - Content types: {content_types}\n\
         \n\
         ## Platforms\n\
         \n\
         {platforms}\n\
         \n\
         ## Weekly time\n\
         \n\
         Available: {time}\n\
         \n\
         {allocation}\n\
         \n\
         ## Content ideas\n\
         \n\
         {ideas}\n\
         \n\
         ## Monetization\n\
         \n\
         Current intent: {intent}\n\
         \n\
         {monetization}\n\
         \n\
         Created: {created}\n",
        goal = match text(&data.content_goal) {
            NOT_SET => "create quality content",
            goal => goal,
        },
        niche = niche_or(data, "my specialty"),
        audience = match text(&data.target_generation) {
            NOT_SET => "my audience",
            audience => audience,
        },
        mission = mission_completion(data),
        niche_field = text(&data.niche),
        content_types = list(&data.content_types),
        platforms = platform_strategy(data),
        time = text(&data.time_available),
        allocation = time_allocation(data),
        ideas = content_suggestions(data),
        intent = text(&data.monetization_intent),
        monetization = monetization_suggestions(data),
    );
    StarterNote {
        path: MASTER_STRATEGY,
        content,
        metadata: None,
    }
}

pub(super) fn skills_tracker(data: &OnboardingProfile, updated: &str) -> StarterNote {
    let content = format!(
        "# Resources and skills\n\
         \n\
         ## Equipment\n\
         \n\
         {resources}\n\
         \n\
         ## Tools\n\
         \n\
         {tools}\n\
         \n\
         ## Skills to develop\n\
         \n\
         {learning}\n\
         \n\
         ## Challenges\n\
         \n\
         {challenges}\n\
         \n\
         ## Suggested actions\n\
         \n\
         {solutions}\n\
         \n\
         Last updated: {updated}\n",
        resources = text(&data.resources),
        tools = recommended_tools(data),
        learning = learning_plan(data),
        challenges = text(&data.main_challenges),
        solutions = challenge_solutions(data),
    );
    StarterNote {
        path: SKILLS_TRACKER,
        content,
        metadata: None,
    }
}

pub(super) fn performance_tracker(data: &OnboardingProfile, created: &str) -> StarterNote {
    let content = format!(
        "# Performance tracker\n\
         \n\
         ## Growth targets\n\
         \n\
         - [ ] Followers: reach _____ by _____\n\
         - [ ] Engagement: keep ____% average engagement\n\
         - [ ] Reach: _____ views per week\n\
         \n\
         ## Per platform\n\
         \n\
         {tables}\n\
         \n\
         ## Monetization\n\
         \n\
         Current intent: {intent}\n\
         \n\
         ## Reviews\n\
         \n\
         - Weekly (Mondays): review the week's posts and adjust the next week\n\
         - Monthly (1st): check goals and set next month's targets\n\
         - Quarterly: revisit the whole strategy and the competition\n\
         \n\
         Created: {created}\n",
        tables = metrics_tables(data),
        intent = text(&data.monetization_intent),
    );
    StarterNote {
        path: PERFORMANCE_TRACKER,
        content,
        metadata: None,
    }
}

pub(super) fn content_calendar(data: &OnboardingProfile, created: &str) -> StarterNote {
    let platforms = calendar_platforms(data);
    let time = match text(&data.time_available) {
        NOT_SET => "your available time",
        time => time,
    };
    let content = format!(
        "# Content calendar\n\
         \n\
         ## Typical week for {time}\n\
         \n\
         | Day | Platform | Content | Time | Done |\n\
         |---|---|---|---|---|\n\
         | Monday | {platforms} | Educational | 1h | [ ] |\n\
         | Tuesday | {platforms} | Behind-the-scenes | 30min | [ ] |\n\
         | Wednesday | {platforms} | Entertainment | 45min | [ ] |\n\
         | Thursday | {platforms} | Tips | 1h | [ ] |\n\
         | Friday | {platforms} | Community | 30min | [ ] |\n\
         | Saturday | Rest | Plan next week | 30min | [ ] |\n\
         | Sunday | Rest | Review performance | 30min | [ ] |\n\
         \n\
         ## Post templates\n\
         \n\
         - Educational: hook, promise, deliver, call to action\n\
         - Inspirational: visual, story, lesson, question\n\
         - Behind-the-scenes: setup, process, challenges, results\n\
         \n\
         Created: {created}\n"
    );
    StarterNote {
        path: CONTENT_CALENDAR,
        content,
        metadata: None,
    }
}
