use crate::e2e::helpers;

use helpers::fake_tts::{HQ_VOICE, STANDARD_VOICE};
use helpers::TestContext;
use hyper::StatusCode;
use speakcanto_backend::domain::tts::VoiceCatalog;
use speakcanto_backend::infrastructure::repositories::TtsBackendError;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_voices_by_tier(ctx: &TestContext) {
    let response = ctx.client.get("/api/tts/voices").await.unwrap();

    response.assert_status(StatusCode::OK);
    let catalog: VoiceCatalog = response.json().unwrap();
    assert_eq!(catalog.standard.len(), 1);
    assert_eq!(catalog.standard[0].id, STANDARD_VOICE);
    assert_eq!(catalog.high_quality.len(), 1);
    assert_eq!(catalog.high_quality[0].id, HQ_VOICE);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_bad_gateway_when_catalog_unavailable(ctx: &TestContext) {
    ctx.fake.fail_catalog(TtsBackendError::Timeout(std::time::Duration::from_secs(20)));

    let response = ctx.client.get("/api/tts/voices").await.unwrap();

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("TTS synthesis failed");
}
