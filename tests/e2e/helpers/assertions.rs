use serde_json::Value;

/// Check the shape of a synthesis response and the invariants every mode
/// shares: audio URL, one token per character, known marker names.
pub fn assert_synthesis_response(response: &Value, expected_text: &str) {
    let audio_url = response
        .get("audio_url")
        .and_then(|v| v.as_str())
        .expect("Missing audio_url");
    assert!(audio_url.starts_with("/api/tts/audio/"), "Unexpected audio_url {}", audio_url);

    let tokens = response.get("tokens").and_then(|v| v.as_array()).expect("Missing tokens");
    let text: String = tokens
        .iter()
        .map(|t| t.get("char").and_then(|c| c.as_str()).expect("token without char"))
        .collect();
    assert_eq!(text, expected_text);
    for (idx, token) in tokens.iter().enumerate() {
        assert_eq!(token.get("token_id").and_then(|v| v.as_u64()), Some(idx as u64));
        assert!(token.get("raw_index").is_some());
        assert!(token.get("jyutping").and_then(|v| v.as_str()).is_some());
    }

    let mark_to_token = response
        .get("mark_to_token")
        .and_then(|v| v.as_object())
        .expect("Missing mark_to_token");
    for point in timepoints(response) {
        let name = point
            .get("mark_name")
            .and_then(|v| v.as_str())
            .expect("timepoint without mark_name");
        assert!(mark_to_token.contains_key(name), "Timepoint {} has no token", name);
    }

    assert!(response.get("duration_seconds").and_then(|v| v.as_f64()).is_some());
    assert!(response.get("sync_mode").and_then(|v| v.as_str()).is_some());
    assert!(response.get("alignment_supported").and_then(|v| v.as_bool()).is_some());
}

pub fn timepoints(response: &Value) -> Vec<Value> {
    response
        .get("timepoints")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Seconds of every timepoint, asserting they never go backwards.
pub fn assert_monotonic_timepoints(response: &Value) -> Vec<f64> {
    let seconds: Vec<f64> = timepoints(response)
        .iter()
        .map(|p| p.get("seconds").and_then(|v| v.as_f64()).expect("timepoint without seconds"))
        .collect();
    assert!(
        seconds.windows(2).all(|w| w[0] <= w[1]),
        "Timepoints are not monotonic: {:?}",
        seconds
    );
    seconds
}
