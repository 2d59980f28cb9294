use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use kol_matcher::config::MatchConfig;
use kol_matcher::report::render_summary;
use kol_matcher::{
    match_candidates, match_candidates_with_config, BrandProfile, CandidateProfile, Caution,
    MatchError, MatchReport, SkipReason,
};

fn brand(text: &str) -> BrandProfile {
    BrandProfile {
        description_text: text.to_string(),
        ..BrandProfile::default()
    }
}

fn candidate(id: &str, text: &str, followers: i64, rate: f64, ai: f64) -> CandidateProfile {
    CandidateProfile {
        id: id.to_string(),
        profile_text: text.to_string(),
        follower_count: Some(followers),
        avg_engagement_rate: Some(rate),
        ai_relevance_score: Some(ai),
        ai_rationale: format!("{} fits the brand tone", id),
        ai_collaboration_idea: "Sponsored routine video".to_string(),
        ai_cautions: vec!["Check previous sponsorships".to_string()],
        ..CandidateProfile::default()
    }
}

fn skincare_brand() -> BrandProfile {
    let mut profile = brand("skincare for oily skin, Bangkok audience");
    profile.target_keywords.insert("serum".to_string());
    profile
}

fn sample_batch() -> Vec<CandidateProfile> {
    vec![
        candidate("glow_bkk", "daily skincare routine for oily skin in Bangkok", 85_000, 0.045, 0.9),
        candidate("serum_addict", "serum reviews and skincare hauls", 240_000, 0.021, 0.7),
        candidate("street_eats", "Bangkok street food tours", 1_200_000, 0.03, 0.2),
        candidate("gym_rat", "leg day, protein, gains", 12_000, 0.09, 0.1),
        candidate("thai_beauty", "รีวิวครีมกันแดด skincare ผิวมัน", 56_000, 0.06, 0.8),
        candidate("twin_a", "travel vlogs", 5_000, 0.05, 0.4),
        candidate("twin_b", "travel vlogs", 5_000, 0.05, 0.4),
        candidate("nano_star", "skincare", 150, 0.35, 0.6),
    ]
}

fn to_json(report: &MatchReport) -> String {
    serde_json::to_string(report).expect("serialize report")
}

#[test]
fn empty_brand_description_is_fatal() {
    let result = match_candidates(&brand("   "), &sample_batch(), 10);
    assert_eq!(result.unwrap_err(), MatchError::EmptyBrandDescription);
}

#[test]
fn empty_candidate_list_returns_empty_ranking() {
    let report = match_candidates(&skincare_brand(), &[], 10).expect("run");

    assert!(report.results.is_empty());
    assert_eq!(report.metadata.candidates_skipped, 0);
    assert_eq!(report.metadata.candidates_considered, 0);
}

#[test]
fn all_scores_are_bounded() {
    let report = match_candidates(&skincare_brand(), &sample_batch(), 100).expect("run");

    assert_eq!(report.results.len(), sample_batch().len());
    for result in &report.results {
        for score in [
            result.composite_score,
            result.similarity_score,
            result.engagement_score,
            result.ai_relevance_score,
        ] {
            assert!((0.0..=1.0).contains(&score), "{} out of range", score);
        }
        assert!((0.0..=100.0).contains(&result.match_score));
    }
}

#[test]
fn ranks_are_one_based_and_sequential() {
    let report = match_candidates(&skincare_brand(), &sample_batch(), 5).expect("run");

    let ranks: Vec<usize> = report.results.iter().map(|result| result.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[test]
fn documented_example_ranks_relevant_candidate_first() {
    let batch = vec![
        candidate("b", "pet grooming tips and cute dogs", 900_000, 0.09, 0.5),
        candidate("a", "skincare tips from Bangkok", 20_000, 0.03, 0.9),
    ];

    let report = match_candidates(&skincare_brand(), &batch, 10).expect("run");

    assert_eq!(report.results[0].candidate_id, "a");
    assert!(report.results[0].similarity_score > report.results[1].similarity_score);
}

#[test]
fn identical_twins_are_ordered_by_id() {
    let report = match_candidates(&skincare_brand(), &sample_batch(), 100).expect("run");

    let position = |id: &str| {
        report
            .results
            .iter()
            .position(|result| result.candidate_id == id)
            .expect("candidate present")
    };
    assert_eq!(position("twin_b"), position("twin_a") + 1);
}

#[test]
fn running_twice_is_byte_identical() {
    let batch = sample_batch();

    let first = to_json(&match_candidates(&skincare_brand(), &batch, 10).expect("first run"));
    let second = to_json(&match_candidates(&skincare_brand(), &batch, 10).expect("second run"));

    assert_eq!(first, second);
}

#[test]
fn permuting_input_does_not_change_output() {
    let mut batch = sample_batch();
    batch.push(candidate("broken", "skincare", -5, 0.02, 0.9));
    let baseline = to_json(&match_candidates(&skincare_brand(), &batch, 10).expect("baseline"));

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        batch.shuffle(&mut rng);
        let shuffled = to_json(&match_candidates(&skincare_brand(), &batch, 10).expect("shuffled"));
        assert_eq!(baseline, shuffled);
    }
}

#[test]
fn truncation_returns_prefix_of_full_ranking() {
    let batch = sample_batch();
    let full = match_candidates(&skincare_brand(), &batch, batch.len()).expect("full run");

    for k in 0..=batch.len() + 2 {
        let partial = match_candidates(&skincare_brand(), &batch, k).expect("partial run");
        assert_eq!(partial.results.len(), k.min(batch.len()));
        for (left, right) in partial.results.iter().zip(full.results.iter()) {
            assert_eq!(left.candidate_id, right.candidate_id);
            assert_eq!(left.composite_score, right.composite_score);
        }
        assert_eq!(partial.metadata.requested_count, k);
        assert_eq!(partial.metadata.returned_count, partial.results.len());
    }
}

#[test]
fn negative_followers_are_skipped() {
    let mut batch = sample_batch();
    batch.push(candidate("negative", "skincare Bangkok", -10, 0.05, 1.0));

    let report = match_candidates(&skincare_brand(), &batch, 100).expect("run");

    assert_eq!(report.metadata.candidates_skipped, 1);
    assert_eq!(report.metadata.candidates_received, batch.len());
    assert_eq!(report.metadata.candidates_considered, batch.len() - 1);
    assert_eq!(
        report.metadata.skipped[0].reason,
        SkipReason::NegativeMetric("follower_count".to_string())
    );
    assert!(report.results.iter().all(|result| result.candidate_id != "negative"));
}

#[test]
fn invalid_records_are_skipped_with_reasons() {
    let batch = vec![
        candidate("", "skincare", 100, 0.01, 0.5),
        candidate("neg_rate", "skincare", 100, -0.2, 0.5),
        CandidateProfile {
            id: "empty".to_string(),
            ai_relevance_score: Some(0.9),
            ..CandidateProfile::default()
        },
        candidate("ok", "skincare", 100, 0.01, 0.5),
        candidate("ok", "duplicate record", 100, 0.01, 0.9),
    ];

    let report = match_candidates(&skincare_brand(), &batch, 10).expect("run");

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].candidate_id, "ok");
    assert!((report.results[0].ai_relevance_score - 0.5).abs() < 1e-12);

    let reasons: Vec<SkipReason> = report
        .metadata
        .skipped
        .iter()
        .map(|skipped| skipped.reason.clone())
        .collect();
    assert_eq!(report.metadata.candidates_skipped, 4);
    assert!(reasons.contains(&SkipReason::MissingId));
    assert!(reasons.contains(&SkipReason::NegativeMetric("avg_engagement_rate".to_string())));
    assert!(reasons.contains(&SkipReason::NoUsableData));
    assert!(reasons.contains(&SkipReason::DuplicateId));
}

#[test]
fn missing_ai_relevance_is_zero_with_caution() {
    let mut record = candidate("no_ai", "skincare Bangkok", 5_000, 0.04, 0.0);
    record.ai_relevance_score = None;

    let report = match_candidates(&skincare_brand(), &[record], 10).expect("run");
    let result = &report.results[0];

    assert_eq!(result.ai_relevance_score, 0.0);
    assert!(result.cautions.contains(&Caution::MissingAiRelevance));
}

#[test]
fn empty_text_scores_zero_similarity_with_caution() {
    let record = candidate("quiet", "", 5_000, 0.04, 0.6);

    let report = match_candidates(&skincare_brand(), &[record], 10).expect("run");
    let result = &report.results[0];

    assert_eq!(result.similarity_score, 0.0);
    assert!(result.cautions.contains(&Caution::InsufficientContent));
    assert_eq!(report.metadata.candidates_skipped, 0);
}

#[test]
fn missing_metrics_are_zeroed_with_cautions() {
    let record = CandidateProfile {
        id: "text_only".to_string(),
        profile_text: "skincare for oily skin".to_string(),
        ai_relevance_score: Some(0.5),
        ..CandidateProfile::default()
    };

    let report = match_candidates(&skincare_brand(), &[record], 10).expect("run");
    let result = &report.results[0];

    assert_eq!(result.engagement_score, 0.0);
    assert_eq!(result.follower_count, 0);
    assert!(result.cautions.contains(&Caution::MissingFollowerCount));
    assert!(result.cautions.contains(&Caution::MissingEngagementRate));
}

#[test]
fn engagement_rate_is_derived_from_likes_when_absent() {
    let record = CandidateProfile {
        id: "likes_only".to_string(),
        profile_text: "skincare".to_string(),
        follower_count: Some(10_000),
        total_likes: Some(40_000),
        video_count: Some(100),
        ai_relevance_score: Some(0.5),
        ..CandidateProfile::default()
    };

    let report = match_candidates(&skincare_brand(), &[record], 10).expect("run");
    let result = &report.results[0];

    assert!((result.engagement_rate - 0.04).abs() < 1e-12);
    assert!(result.engagement_score > 0.0);
    assert_eq!(result.avg_likes_per_video, Some(400.0));
    assert_eq!(result.likes_per_100_followers, Some(400.0));
    assert!(result.cautions.contains(&Caution::DerivedEngagementRate));
}

#[test]
fn thai_content_contributes_to_similarity() {
    let brand = brand("ครีมกันแดดสำหรับผิวมัน");
    let batch = vec![
        candidate("football", "football highlights", 10_000, 0.05, 0.5),
        candidate("sunscreen", "รีวิวครีมกันแดด", 10_000, 0.05, 0.5),
    ];

    let report = match_candidates(&brand, &batch, 10).expect("run");

    assert_eq!(report.results[0].candidate_id, "sunscreen");
    assert!(report.results[0].similarity_score > 0.0);
    assert_eq!(report.results[1].similarity_score, 0.0);
}

#[test]
fn pass_through_fields_are_preserved() {
    let mut record = candidate("glow_bkk", "skincare Bangkok", 85_000, 0.045, 0.9);
    record.nickname = Some("Glow BKK".to_string());

    let report = match_candidates(&skincare_brand(), &[record.clone()], 10).expect("run");
    let result = &report.results[0];

    assert_eq!(result.ai_rationale, record.ai_rationale);
    assert_eq!(result.ai_collaboration_idea, record.ai_collaboration_idea);
    assert_eq!(result.ai_cautions, record.ai_cautions);
    assert_eq!(result.nickname.as_deref(), Some("Glow BKK"));
    assert_eq!(result.profile_url, "https://www.tiktok.com/@glow_bkk");
}

#[test]
fn metadata_records_weights_and_stable_fingerprint() {
    let report = match_candidates(&skincare_brand(), &sample_batch(), 3).expect("run");
    let config = MatchConfig::default();

    assert_eq!(report.metadata.weights, config.weights);
    assert_eq!(report.metadata.input_fingerprint.len(), 32);
    assert!(report.metadata.vocabulary_size > 0);

    let other = match_candidates(&brand("street food"), &sample_batch(), 3).expect("run");
    assert_ne!(report.metadata.input_fingerprint, other.metadata.input_fingerprint);
}

#[test]
fn invalid_config_is_rejected_before_scoring() {
    let mut config = MatchConfig::default();
    config.weights.similarity = 0.9;

    let result = match_candidates_with_config(&skincare_brand(), &sample_batch(), 10, &config);

    assert!(matches!(result, Err(MatchError::InvalidWeights { .. })));
}

#[test]
fn summary_lists_ranked_candidates_and_cautions() {
    let mut batch = sample_batch();
    batch[0].ai_relevance_score = None;
    let brand = skincare_brand();
    let report = match_candidates(&brand, &batch, 3).expect("run");

    let summary = render_summary(&brand, &report);

    assert!(summary.starts_with("# KOL Matching Results"));
    assert!(summary.contains("### 1. "));
    assert!(summary.contains("### 3. "));
    assert!(!summary.contains("### 4. "));
    assert!(summary.contains("- serum"));
    assert!(summary.contains("Check previous sponsorships"));
}

#[test]
fn scraper_shaped_record_is_scored_on_its_video_texts() {
    let record: CandidateProfile = serde_json::from_str(
        r#"{
            "username": "glow",
            "nickname": "Glow",
            "biography": "",
            "videos": 20,
            "followers": 1200,
            "likes": "",
            "video_texts": "skincare sunscreen oily skin bangkok"
        }"#,
    )
    .expect("parse scraper record");

    assert_eq!(record.profile_text, "skincare sunscreen oily skin bangkok");
    assert_eq!(record.follower_count, Some(1200));
    assert_eq!(record.total_likes, None);

    let report = match_candidates(&brand("skincare sunscreen oily skin bangkok"), &[record], 5)
        .expect("run");
    let result = &report.results[0];

    assert!(result.similarity_score > 0.0);
    assert!(!result.cautions.contains(&Caution::InsufficientContent));
    assert!(result.cautions.contains(&Caution::MissingEngagementRate));
}

#[test]
fn unreadable_counts_become_missing_metrics() {
    let record: CandidateProfile = serde_json::from_str(
        r#"{ "username": "odd", "followers": "4,500", "likes": 1.2e3, "videos": null }"#,
    )
    .expect("parse record");

    assert_eq!(record.follower_count, Some(4_500));
    assert_eq!(record.total_likes, Some(1_200));
    assert_eq!(record.video_count, None);

    let garbled: CandidateProfile =
        serde_json::from_str(r#"{ "username": "odd", "followers": "n/a", "likes": [1] }"#)
            .expect("parse record");
    assert_eq!(garbled.follower_count, None);
    assert_eq!(garbled.total_likes, None);
}

#[test]
fn key_themes_contribute_to_similarity() {
    let plain = brand("skincare");
    let mut themed = plain.clone();
    themed.key_themes = vec!["sunscreen".to_string()];
    let batch = vec![candidate("sun_guard", "sunscreen haul", 20_000, 0.04, 0.5)];

    let without = match_candidates(&plain, &batch, 5).expect("run");
    let with = match_candidates(&themed, &batch, 5).expect("run");

    assert_eq!(without.results[0].similarity_score, 0.0);
    assert!(with.results[0].similarity_score > 0.0);
    assert_ne!(
        without.metadata.input_fingerprint,
        with.metadata.input_fingerprint
    );
}

#[test]
fn brand_key_themes_parse_from_analysis_output() {
    let parsed: BrandProfile = serde_json::from_str(
        r#"{ "description": "x", "key_themes": ["sunscreen", "oily skin"] }"#,
    )
    .expect("parse brand");

    assert_eq!(parsed.key_themes, vec!["sunscreen", "oily skin"]);
}

#[test]
fn assessment_fields_pass_through_and_render() {
    let mut brand = skincare_brand();
    brand.key_themes = vec!["sun protection".to_string()];
    let mut lead = candidate("glow_bkk", "daily skincare routine for oily skin", 85_000, 0.045, 0.9);
    lead.audience_fit = Some("Young Bangkok professionals".to_string());
    lead.content_alignment = Some("Routine videos match the product".to_string());
    lead.match_reasons = vec![
        "Talks about oily skin weekly".to_string(),
        "Audience is in Bangkok".to_string(),
    ];
    lead.total_likes = Some(5_000);
    lead.video_count = Some(10);

    let report = match_candidates(&brand, &[lead], 5).expect("run");
    let result = &report.results[0];

    assert_eq!(result.audience_fit.as_deref(), Some("Young Bangkok professionals"));
    assert_eq!(
        result.content_alignment.as_deref(),
        Some("Routine videos match the product")
    );
    assert_eq!(result.match_reasons.len(), 2);
    assert_eq!(result.likes_per_100_followers, Some(5.88));

    let summary = render_summary(&brand, &report);

    assert!(summary.contains("### Key Themes\n- sun protection"));
    assert!(summary.contains("**Audience Fit:** Young Bangkok professionals"));
    assert!(summary.contains("**Content Alignment:** Routine videos match the product"));
    assert!(summary.contains("**Why This KOL Matches:**\nglow_bkk fits the brand tone\n- Talks about oily skin weekly\n- Audience is in Bangkok"));
    assert!(summary.contains("**Engagement Likes Per 100 Followers:** 5.88 likes"));
}
