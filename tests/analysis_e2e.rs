//! End-to-end integration tests for single-page analysis.
//!
//! Every external party (target site, PageSpeed, Gemini) is a local mockito
//! server, so these run offline.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use site_analyzer::{
    domain::models::{overall_score, BusinessType, CategoryStatus},
    error::AppError,
    service::{
        telemetry::{AnalysisType, PerformanceAdapter},
        SiteAnalyzer,
    },
    test_utils::{
        assertions,
        fixtures::test_config,
        mocks::{self, FailingProbe, PanickingGenerativeProvider, Reply, RoutedGenerativeProvider},
    },
    EngineConfig,
};

const EMPTY_PAGE: &str = "<html><head></head><body></body></html>";

const COMPLETE_ADVICE: &str = r#"{"overallAdvice": "Great trattoria page.", "priorityActions": ["Add reviews"], "industrySpecificTips": ["Post the daily menu"], "expectedResults": "More bookings."}"#;

async fn serve_page(server: &mut Server, path: &str, html: &str) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// PageSpeed off; the unmocked HEAD gets mockito's 501, so telemetry lands on the heuristic tier.
fn offline_config(server: &Server) -> EngineConfig {
    EngineConfig {
        pagespeed_enabled: false,
        ..test_config(&server.url())
    }
}

#[tokio::test]
async fn test_http_error_status_is_fatal() {
    let mut server = Server::new_async().await;
    let _page = server.mock("GET", "/missing").with_status(404).create_async().await;

    let analyzer = SiteAnalyzer::from_config(&offline_config(&server)).unwrap();
    let err = analyzer
        .analyze(&format!("{}/missing", server.url()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::HttpStatus { status: 404, .. }), "{err}");
    assert!(err.is_fetch_error());
}

#[tokio::test]
async fn test_unreachable_and_invalid_urls_are_fatal() {
    let server = Server::new_async().await;
    let analyzer = SiteAnalyzer::from_config(&offline_config(&server)).unwrap();

    let err = analyzer.analyze("http://127.0.0.1:1/").await.unwrap_err();
    assert!(matches!(err, AppError::Fetch { .. }), "{err}");

    let err = analyzer.analyze("not a url").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidUrl(_)), "{err}");
}

#[tokio::test]
async fn test_all_telemetry_tiers_failing_uses_heuristic() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;
    let pagespeed = server
        .mock("GET", "/pagespeedonline/v5/runPagespeed")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let analyzer = SiteAnalyzer::from_config(&test_config(&server.url())).unwrap();
    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    pagespeed.assert_async().await;
    assert_eq!(result.telemetry_source, AnalysisType::Heuristic);
    // the page declares a mobile viewport
    assert_eq!(assertions::category(&result, "speed").score, 70);
    assert_eq!(assertions::category(&result, "mobile").score, 70);
    assert_eq!(result.categories.len(), 7);
}

#[tokio::test]
async fn test_field_data_overrides_lab_score() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;
    let _pagespeed = server
        .mock("GET", "/pagespeedonline/v5/runPagespeed")
        .match_query(Matcher::UrlEncoded("strategy".into(), "mobile".into()))
        .with_status(200)
        .with_body(mocks::pagespeed_json(0.4, Some("FAST")))
        .create_async()
        .await;

    let analyzer = SiteAnalyzer::from_config(&test_config(&server.url())).unwrap();
    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    assert_eq!(result.telemetry_source, AnalysisType::Full);
    let speed = assertions::category(&result, "speed");
    assert_eq!((speed.score, speed.status), (95, CategoryStatus::Good));

    // mobile comes from the lab accessibility score, never from field data
    let mobile = assertions::category(&result, "mobile");
    assert_eq!(mobile.score, 88);
}

#[tokio::test]
async fn test_empty_page_scores() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/", EMPTY_PAGE).await;

    let analyzer = SiteAnalyzer::from_config(&offline_config(&server)).unwrap();
    let result = analyzer.analyze(&format!("{}/", server.url())).await.unwrap();

    let scores: Vec<(&str, u8)> = result
        .categories
        .iter()
        .map(|c| (c.id.as_str(), c.score))
        .collect();
    assert_eq!(
        scores,
        vec![
            ("title", 0),
            ("description", 0),
            ("images", 80),
            ("headings", 30),
            ("content", 25),
            ("speed", 50),
            ("mobile", 50),
        ]
    );
    assert_eq!(result.overall_score, 34);
    assert_eq!(result.overall_score, overall_score(&result.categories));
    assert!(assertions::statuses_consistent(&result.categories));
    assert_eq!(result.business_type, BusinessType::Other);
    assert!(result.site_type.is_none());
}

#[tokio::test]
async fn test_analysis_is_deterministic() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;

    let analyzer = SiteAnalyzer::from_config(&offline_config(&server)).unwrap();
    let url = format!("{}/menu", server.url());
    let first = analyzer.analyze(&url).await.unwrap();
    let second = analyzer.analyze(&url).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_fallbacks_fill_every_field_without_generative_provider() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;

    let analyzer = SiteAnalyzer::from_config(&offline_config(&server)).unwrap();
    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    assert_eq!(result.business_type, BusinessType::Restaurant);

    let advice = result.ai_advice.expect("template advice");
    assert!(advice.overall_advice.contains("Luigi's Trattoria"));
    assert!(!advice.priority_actions.is_empty() && advice.priority_actions.len() <= 4);
    assert_eq!(advice.industry_specific_tips.len(), 3);
    assert!(!advice.expected_results.is_empty());

    let keywords = result.keyword_suggestions.expect("template keywords");
    assert!(!keywords.is_empty() && keywords.len() <= 5);
    assert_eq!(keywords[0], "restaurant near me");

    let json = serde_json::to_value(&advice).unwrap();
    for field in ["overallAdvice", "priorityActions", "industrySpecificTips", "expectedResults"] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
}

#[tokio::test]
async fn test_generative_provider_answers_both_requests() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;

    let advice_text = "```json\n{\"overallAdvice\": \"Great trattoria page.\", \"priorityActions\": [\"Add reviews\"], \
                       \"industrySpecificTips\": [\"Post the daily menu\"], \"expectedResults\": \"More bookings.\"}\n```";
    let advice_mock = server
        .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::Regex("overallAdvice".into()))
        .with_status(200)
        .with_body(mocks::gemini_body(advice_text))
        .create_async()
        .await;
    let keyword_mock = server
        .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::Regex("keyword researcher".into()))
        .with_status(200)
        .with_body(mocks::gemini_body("[\"fresh pasta portland\", \"italian restaurant portland\"]"))
        .create_async()
        .await;

    let config = EngineConfig {
        gemini_api_key: Some("test-key".into()),
        ..offline_config(&server)
    };
    let analyzer = SiteAnalyzer::from_config(&config).unwrap();
    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    advice_mock.assert_async().await;
    keyword_mock.assert_async().await;
    assert_eq!(result.ai_advice.unwrap().overall_advice, "Great trattoria page.");
    assert_eq!(
        result.keyword_suggestions.unwrap(),
        vec!["fresh pasta portland", "italian restaurant portland"]
    );
}

#[tokio::test]
async fn test_partial_generative_response_falls_back() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;
    let _gemini = server
        .mock("POST", Matcher::Regex(":generateContent$".into()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(mocks::gemini_body("{\"overallAdvice\": \"only this\"}"))
        .create_async()
        .await;

    let config = EngineConfig {
        gemini_api_key: Some("test-key".into()),
        ..offline_config(&server)
    };
    let analyzer = SiteAnalyzer::from_config(&config).unwrap();
    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    let advice = result.ai_advice.unwrap();
    assert_ne!(advice.overall_advice, "only this");
    assert_eq!(advice.industry_specific_tips.len(), 3);
    assert_eq!(result.keyword_suggestions.unwrap()[0], "restaurant near me");
}

fn offline_performance() -> PerformanceAdapter {
    PerformanceAdapter::new(None, Arc::new(FailingProbe), Duration::from_secs(1), Duration::from_secs(1))
}

#[tokio::test]
async fn test_panicking_generative_provider_falls_back_to_templates() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;

    let config = offline_config(&server);
    let analyzer =
        SiteAnalyzer::with_parts(&config, offline_performance(), Some(Arc::new(PanickingGenerativeProvider))).unwrap();

    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();
    assert_eq!(result.categories.len(), 7);

    let advice = result.ai_advice.expect("template advice");
    assert!(advice.overall_advice.contains("Luigi's Trattoria"));
    assert_eq!(advice.industry_specific_tips.len(), 3);
    let keywords = result.keyword_suggestions.expect("template keywords");
    assert_eq!(keywords[0], "restaurant near me");
}

#[tokio::test]
async fn test_advice_timeout_keeps_provider_keywords() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;

    let config = EngineConfig {
        generative_timeout: Duration::from_millis(200),
        ..offline_config(&server)
    };
    let provider = RoutedGenerativeProvider::new(
        Reply::Slow(Duration::from_secs(5), COMPLETE_ADVICE.to_string()),
        Reply::text("[\"fresh pasta portland\", \"italian restaurant portland\"]"),
    );
    let analyzer = SiteAnalyzer::with_parts(&config, offline_performance(), Some(Arc::new(provider))).unwrap();

    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    assert_eq!(
        result.keyword_suggestions.unwrap(),
        vec!["fresh pasta portland", "italian restaurant portland"]
    );
    let advice = result.ai_advice.expect("template advice");
    assert_ne!(advice.overall_advice, "Great trattoria page.");
    assert!(advice.overall_advice.contains("Luigi's Trattoria"));
    assert_eq!(advice.industry_specific_tips.len(), 3);
}

#[tokio::test]
async fn test_malformed_keywords_keep_provider_advice() {
    let mut server = Server::new_async().await;
    let _page = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;

    let provider = RoutedGenerativeProvider::new(
        Reply::text(COMPLETE_ADVICE),
        Reply::text("{\"keywords\": [\"fresh pasta\"]}"),
    );
    let analyzer =
        SiteAnalyzer::with_parts(&offline_config(&server), offline_performance(), Some(Arc::new(provider))).unwrap();

    let result = analyzer.analyze(&format!("{}/menu", server.url())).await.unwrap();

    let advice = result.ai_advice.unwrap();
    assert_eq!(advice.overall_advice, "Great trattoria page.");
    assert_eq!(advice.priority_actions, vec!["Add reviews"]);
    let keywords = result.keyword_suggestions.unwrap();
    assert_eq!(keywords[0], "restaurant near me");
    assert!(!keywords.contains(&"fresh pasta".to_string()));
}

#[tokio::test]
async fn test_concurrent_analyses_share_one_analyzer() {
    let mut server = Server::new_async().await;
    let _menu = serve_page(&mut server, "/menu", &mocks::well_formed_page()).await;
    let _empty = serve_page(&mut server, "/empty", EMPTY_PAGE).await;

    let analyzer = Arc::new(SiteAnalyzer::from_config(&offline_config(&server)).unwrap());
    let tasks: Vec<_> = ["/menu", "/empty", "/menu"]
        .into_iter()
        .map(|path| {
            let analyzer = Arc::clone(&analyzer);
            let url = format!("{}{}", server.url(), path);
            tokio::spawn(async move { analyzer.analyze(&url).await })
        })
        .collect();

    let mut scores = Vec::new();
    for task in tasks {
        scores.push(task.await.unwrap().unwrap().overall_score);
    }
    assert_eq!(scores[0], scores[2]);
    assert_ne!(scores[0], scores[1]);
}
