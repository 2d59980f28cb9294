//! Turns ranked, scored candidates into output records and renders the
//! human-readable summary. Nothing here performs I/O.

use crate::scoring::ScoredCandidate;
use crate::{
    format_float, format_number, format_percent, BrandProfile, MatchReport, MatchResult,
};

/// Candidates must already be in rank order; ranks are assigned 1-based.
pub fn assemble(ranked: Vec<ScoredCandidate<'_>>) -> Vec<MatchResult> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| to_result(index + 1, candidate))
        .collect()
}

fn to_result(rank: usize, candidate: ScoredCandidate<'_>) -> MatchResult {
    let profile = candidate.profile;
    let avg_likes_per_video = match (profile.total_likes, profile.video_count) {
        (Some(likes), Some(videos)) if videos > 0 => Some(round_to(likes as f64 / videos as f64, 2)),
        _ => None,
    };
    let likes_per_100_followers = match profile.total_likes {
        Some(likes) if candidate.follower_count > 0 => Some(round_to(
            likes as f64 / candidate.follower_count as f64 * 100.0,
            2,
        )),
        _ => None,
    };

    MatchResult {
        rank,
        candidate_id: profile.id.clone(),
        composite_score: candidate.composite,
        match_score: round_to(candidate.composite * 100.0, 1),
        ai_relevance_score: candidate.ai_relevance,
        similarity_score: candidate.similarity,
        engagement_score: candidate.engagement,
        follower_count: candidate.follower_count,
        engagement_rate: candidate.engagement_rate,
        avg_likes_per_video,
        likes_per_100_followers,
        nickname: profile.nickname.clone(),
        biography: profile.biography.clone(),
        profile_url: profile.resolved_profile_url(),
        ai_rationale: profile.ai_rationale.clone(),
        ai_collaboration_idea: profile.ai_collaboration_idea.clone(),
        ai_cautions: profile.ai_cautions.clone(),
        audience_fit: profile.audience_fit.clone(),
        content_alignment: profile.content_alignment.clone(),
        match_reasons: profile.match_reasons.clone(),
        cautions: candidate.cautions,
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Markdown summary of a run: brand profile first, then one section per
/// ranked candidate.
pub fn render_summary(brand: &BrandProfile, report: &MatchReport) -> String {
    let mut lines = vec![
        "# KOL Matching Results".to_string(),
        String::new(),
        "## Brand Profile".to_string(),
    ];
    if let Some(name) = brand.name.as_deref() {
        lines.push(format!("**Brand:** {}", name));
    }
    lines.push(format!("**Industry:** {}", or_na(brand.industry.as_deref())));
    lines.push(format!(
        "**Target Audience:** {}",
        or_na(brand.target_audience.as_deref())
    ));
    lines.push(format!("**Brand Voice:** {}", or_na(brand.brand_voice.as_deref())));
    lines.push(String::new());

    if !brand.target_keywords.is_empty() {
        lines.push("### Keywords".to_string());
        lines.extend(brand.target_keywords.iter().map(|keyword| format!("- {}", keyword)));
        lines.push(String::new());
    }

    if !brand.key_themes.is_empty() {
        lines.push("### Key Themes".to_string());
        lines.extend(brand.key_themes.iter().map(|theme| format!("- {}", theme)));
        lines.push(String::new());
    }

    let metadata = &report.metadata;
    lines.push("## Run".to_string());
    lines.push(format!(
        "Considered {} of {} candidates ({} skipped); weights AI {} / similarity {} / engagement {}.",
        metadata.candidates_considered,
        metadata.candidates_received,
        metadata.candidates_skipped,
        format_float(metadata.weights.ai_relevance, 2),
        format_float(metadata.weights.similarity, 2),
        format_float(metadata.weights.engagement, 2),
    ));
    for skipped in &metadata.skipped {
        lines.push(format!("- skipped `{}`: {}", skipped.id, skipped.reason.label()));
    }
    lines.push(String::new());

    lines.push("## Top Matching KOLs".to_string());
    lines.push(String::new());

    for result in &report.results {
        let title = result.nickname.as_deref().unwrap_or(&result.candidate_id);
        lines.push(format!("### {}. {}", result.rank, title));
        lines.push(format!(
            "**Profile:** [@{}]({})",
            result.candidate_id, result.profile_url
        ));
        lines.push(format!("**Match Score:** {}/100", format_float(result.match_score, 1)));
        lines.push(format!(
            "**Signals:** AI relevance {} | similarity {} | engagement {}",
            format_float(result.ai_relevance_score, 2),
            format_float(result.similarity_score, 2),
            format_float(result.engagement_score, 2),
        ));
        lines.push(format!(
            "**Followers:** {}",
            format_number(result.follower_count as f64)
        ));
        lines.push(format!(
            "**Engagement Rate:** {}",
            format_percent(result.engagement_rate)
        ));
        if let Some(avg_likes) = result.avg_likes_per_video {
            lines.push(format!(
                "**Engagement Likes Per Video:** {} likes",
                format_float(avg_likes, 2)
            ));
        }
        if let Some(per_100) = result.likes_per_100_followers {
            lines.push(format!(
                "**Engagement Likes Per 100 Followers:** {} likes",
                format_float(per_100, 2)
            ));
        }
        if let Some(bio) = result.biography.as_deref() {
            lines.push(format!("**Bio:** {}", bio));
        }
        if let Some(fit) = non_blank(result.audience_fit.as_deref()) {
            lines.push(format!("**Audience Fit:** {}", fit));
        }
        if let Some(alignment) = non_blank(result.content_alignment.as_deref()) {
            lines.push(format!("**Content Alignment:** {}", alignment));
        }
        lines.push(String::new());

        let reasons: Vec<&String> = result
            .match_reasons
            .iter()
            .filter(|reason| !reason.trim().is_empty())
            .collect();
        if !result.ai_rationale.trim().is_empty() || !reasons.is_empty() {
            lines.push("**Why This KOL Matches:**".to_string());
            if !result.ai_rationale.trim().is_empty() {
                lines.push(result.ai_rationale.clone());
            }
            lines.extend(reasons.iter().map(|reason| format!("- {}", reason)));
            lines.push(String::new());
        }
        if !result.ai_collaboration_idea.trim().is_empty() {
            lines.push("**Potential Collaborations:**".to_string());
            lines.push(result.ai_collaboration_idea.clone());
            lines.push(String::new());
        }

        let cautions: Vec<String> = result
            .ai_cautions
            .iter()
            .cloned()
            .chain(result.cautions.iter().map(|caution| caution.message().to_string()))
            .collect();
        if !cautions.is_empty() {
            lines.push("**Cautions:**".to_string());
            lines.extend(cautions.iter().map(|caution| format!("- {}", caution)));
            lines.push(String::new());
        }

        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

fn or_na(value: Option<&str>) -> &str {
    non_blank(value).unwrap_or("N/A")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
