use crate::e2e::helpers;

use helpers::assertions::{assert_monotonic_timepoints, assert_synthesis_response, timepoints};
use helpers::fake_tts::{MarkupBehavior, TextBehavior, HQ_VOICE, STANDARD_VOICE};
use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use speakcanto_backend::domain::tts::{ChunkLimits, SplitBudget, SynthesisSettings};
use speakcanto_backend::infrastructure::repositories::TtsBackendError;
use test_context::test_context;

const SYNTHESIZE: &str = "/api/tts/synthesize";

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_with_full_alignment(ctx: &TestContext) {
    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "你好。世界。", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_synthesis_response(body, "你好。世界。");

    assert_eq!(body["sync_mode"], "full");
    assert_eq!(body["alignment_supported"], true);
    assert_eq!(body["voice_mode"], "standard");
    assert!(body.get("hq_total_calls").is_none());
    assert_eq!(timepoints(body).len(), 6);
    assert_eq!(body["tokens"][0]["jyutping"], "nei5");
    assert_eq!(body["tokens"][2]["jyutping"], "");

    let seconds = assert_monotonic_timepoints(body);
    assert_eq!(body["duration_seconds"].as_f64(), seconds.last().copied());
    assert_eq!(ctx.fake.markup_call_count(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_synthesized_audio(ctx: &TestContext) {
    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "廣東話", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    let audio_url = response.body.as_ref().unwrap()["audio_url"].as_str().unwrap().to_string();

    let audio = ctx.client.get(&audio_url).await.unwrap();

    audio
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg");
    assert_eq!(audio.body_bytes, b"MP3".to_vec());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_audio(ctx: &TestContext) {
    let response = ctx.client.get("/api/tts/audio/does-not-exist").await.unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fall_back_to_reduced_alignment(ctx: &TestContext) {
    ctx.fake.set_markup(MarkupBehavior::DropNonCjkMarks);

    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "我哋用English。", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_synthesis_response(body, "我哋用English。");
    assert_eq!(body["sync_mode"], "reduced");
    assert_eq!(body["alignment_supported"], true);
    assert_eq!(timepoints(body).len(), 3);
    assert_eq!(ctx.fake.markup_call_count(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fail_when_reduced_alignment_is_still_degraded(ctx: &TestContext) {
    ctx.fake.set_markup(MarkupBehavior::SentinelOnly);

    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "你好世界", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("timepoints remained degraded in reduced mode");
    assert_eq!(ctx.fake.markup_call_count(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_timepoints_monotonic_across_chunks(ctx: &TestContext) {
    let text = "你好abc世界。".repeat(500);

    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": text, "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert!(ctx.fake.markup_call_count() > 1);
    for markup in ctx.fake.markup_calls.lock().iter() {
        assert!(markup.len() <= ChunkLimits::MARKUP.hard_max_bytes);
    }

    let seconds = assert_monotonic_timepoints(body);
    assert_eq!(seconds.len(), 4000); // every non-whitespace character
    assert_eq!(body["duration_seconds"].as_f64(), seconds.last().copied());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_non_numeric_speaking_rate(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            SYNTHESIZE,
            &json!({"text": "你好", "voice_name": STANDARD_VOICE, "speaking_rate": "fast"}),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("speaking_rate must be numeric")
        .assert_header_exists("x-request-id");
    assert_eq!(ctx.fake.markup_call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clamp_speaking_rate(ctx: &TestContext) {
    for rate in [json!(5), json!("0.1")] {
        let response = ctx
            .client
            .post(
                SYNTHESIZE,
                &json!({"text": "你好", "voice_name": STANDARD_VOICE, "speaking_rate": rate}),
            )
            .await
            .unwrap();

        response.assert_status(StatusCode::OK);
    }

    assert_eq!(*ctx.fake.speaking_rates.lock(), vec![2.0, 0.5]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_text(ctx: &TestContext) {
    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "  \r\n ", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("text is required");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unsupported_voice(ctx: &TestContext) {
    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "你好", "voice_name": "Zhiyu"}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Unsupported voice_name");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unknown_voice_mode(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            SYNTHESIZE,
            &json!({"text": "你好", "voice_name": STANDARD_VOICE, "voice_mode": "ultra"}),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Unknown voice_mode");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_provider_failure_as_bad_gateway(ctx: &TestContext) {
    ctx.fake.set_markup(MarkupBehavior::Fail(TtsBackendError::Provider(
        "503 Service Unavailable".to_string(),
    )));

    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "你好", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("TTS synthesis failed");
    assert_eq!(ctx.fake.markup_call_count(), 1);
}

#[tokio::test]
async fn it_should_reject_input_over_max_length() {
    let ctx = TestContext::with_settings(SynthesisSettings {
        max_input_chars: 10,
        ..SynthesisSettings::default()
    })
    .await;

    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "你".repeat(11), "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .assert_error_message("Input exceeds max length (10).");
}

#[tokio::test]
async fn it_should_reject_input_that_cannot_be_chunked() {
    let ctx = TestContext::with_settings(SynthesisSettings {
        markup_limits: ChunkLimits {
            target_max_bytes: 30,
            hard_max_bytes: 40,
        },
        ..SynthesisSettings::default()
    })
    .await;

    let response = ctx
        .client
        .post(SYNTHESIZE, &json!({"text": "你", "voice_name": STANDARD_VOICE}))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .assert_error_message("Input cannot be chunked within SSML limits.");
    assert_eq!(ctx.fake.markup_call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_high_quality_without_alignment(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            SYNTHESIZE,
            &json!({"text": "廣東話", "voice_name": HQ_VOICE, "voice_mode": "high_quality"}),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_synthesis_response(body, "廣東話");
    assert_eq!(body["sync_mode"], "none");
    assert_eq!(body["alignment_supported"], false);
    assert_eq!(body["voice_mode"], "high_quality");
    assert_eq!(body["duration_seconds"].as_f64(), Some(0.0));
    assert!(timepoints(body).is_empty());
    assert_eq!(body["hq_total_calls"], 1);
    assert_eq!(body["hq_split_retries"], 0);
    assert_eq!(ctx.fake.markup_call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_split_high_quality_text_rejected_as_too_long(ctx: &TestContext) {
    ctx.fake.set_text(TextBehavior::TooLongAbove(20));
    let text = "據".repeat(60);

    let response = ctx
        .client
        .post(
            SYNTHESIZE,
            &json!({"text": text, "voice_name": HQ_VOICE, "voice_mode": "high_quality"}),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["hq_total_calls"], 7);
    assert_eq!(body["hq_split_retries"], 3);

    let voiced: String = ctx
        .fake
        .text_calls
        .lock()
        .iter()
        .filter(|t| t.chars().count() <= 20)
        .cloned()
        .collect();
    assert_eq!(voiced, text);
}

#[tokio::test]
async fn it_should_stop_when_high_quality_call_budget_is_spent() {
    let ctx = TestContext::with_settings(SynthesisSettings {
        split_budget: SplitBudget {
            max_split_depth: 8,
            max_tts_calls: 3,
        },
        ..SynthesisSettings::default()
    })
    .await;
    ctx.fake.set_text(TextBehavior::TooLongAbove(5));

    let response = ctx
        .client
        .post(
            SYNTHESIZE,
            &json!({
                "text": "據".repeat(60),
                "voice_name": HQ_VOICE,
                "voice_mode": "high_quality"
            }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_message("call budget exhausted");
    assert_eq!(ctx.fake.text_call_count(), 3);
}

#[tokio::test]
async fn it_should_stop_when_high_quality_split_depth_is_spent() {
    let ctx = TestContext::with_settings(SynthesisSettings {
        split_budget: SplitBudget {
            max_split_depth: 1,
            max_tts_calls: 128,
        },
        ..SynthesisSettings::default()
    })
    .await;
    ctx.fake.set_text(TextBehavior::TooLongAbove(5));

    let response = ctx
        .client
        .post(
            SYNTHESIZE,
            &json!({
                "text": "據".repeat(60),
                "voice_name": HQ_VOICE,
                "voice_mode": "high_quality"
            }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_message("split depth budget exhausted");
    assert_eq!(ctx.fake.text_call_count(), 2);
}
