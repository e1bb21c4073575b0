//! Verify envelope parsing against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector describes a simulated response and the expected parse
//! outcome. Comparing parsed JSON (not raw strings) avoids false negatives
//! from field-ordering differences.

use tgbot_core::api::parse_response;
use tgbot_core::{Error, HttpResponse};

#[test]
fn response_test_vectors() {
    let raw = include_str!("../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let result = parse_response(response);

        if let Some(expected) = case.get("expected_result") {
            let value = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e:?}"));
            assert_eq!(&value, expected, "{name}: result");
            continue;
        }

        let err = result.unwrap_err();
        match case["expected_error"].as_str().unwrap() {
            "Api" => {
                let Error::Api {
                    error_code,
                    retry_after,
                    ..
                } = err
                else {
                    panic!("{name}: expected Api error, got {err:?}");
                };
                if let Some(code) = case.get("expected_error_code") {
                    assert_eq!(error_code, code.as_i64(), "{name}: error_code");
                }
                if let Some(delay) = case.get("expected_retry_after") {
                    assert_eq!(retry_after, delay.as_u64(), "{name}: retry_after");
                }
            }
            "MissingResult" => {
                assert!(matches!(err, Error::MissingResult), "{name}: got {err:?}")
            }
            "Http" => assert!(matches!(err, Error::Http { .. }), "{name}: got {err:?}"),
            "Deserialization" => {
                assert!(matches!(err, Error::Deserialization(_)), "{name}: got {err:?}")
            }
            other => panic!("{name}: unknown expected_error: {other}"),
        }
    }
}
