//! Sigstore bundle verification end to end.

use std::path::PathBuf;

use dsse_verify::pem::{to_pem, CERTIFICATE_LABEL};
use dsse_verify::{
    certificate_public_key_pem, keys, payload::decode_base64, verify_bundle, verify_bundle_offline,
    verify_dsse_signature, RekorClient, RekorConfig, SigstoreBundle, TlogCheck, TlogFailure,
    Verdict,
};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn bundle_json() -> Value {
    serde_json::from_str(&fixture("sigstore_bundle.json")).unwrap()
}

fn bundle_from(json: Value) -> SigstoreBundle {
    SigstoreBundle::from_json(&json.to_string()).unwrap()
}

async fn rekor(response: Value, expected_calls: u64) -> (MockServer, RekorClient) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/log/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(expected_calls)
        .mount(&server)
        .await;
    let client = RekorClient::new(RekorConfig::default().with_url(server.uri())).unwrap();
    (server, client)
}

fn rekor_response() -> Value {
    serde_json::from_str(&fixture("rekor_entry.json")).unwrap()
}

#[tokio::test]
async fn test_bundle_with_matching_log_entry_is_verified() {
    let (_server, client) = rekor(rekor_response(), 1).await;
    let report = verify_bundle(&bundle_from(bundle_json()), &client)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Verified);
    assert!(report.is_verified());
    assert_eq!(report.verification.verified_index, Some(0));
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].entry.log_index, 163873779);
    assert_eq!(report.entries[0].check, TlogCheck::Passed);
    assert!(report.public_key_pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
}

#[tokio::test]
async fn test_bundle_with_mismatched_log_entry_fails() {
    let mut response = rekor_response();
    response["163873779"]["integratedTime"] = Value::from(1737376058_i64);
    let (_server, client) = rekor(response, 1).await;

    let report = verify_bundle(&bundle_from(bundle_json()), &client)
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Failed);
    assert!(report.verification.is_verified());
    assert!(matches!(
        report.entries[0].check,
        TlogCheck::Failed(TlogFailure::TimeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_every_entry_is_checked_after_a_failure() {
    let mut json = bundle_json();
    let first = json["verificationMaterial"]["tlogEntries"][0].clone();
    let mut second = first.clone();
    second["integratedTime"] = Value::from("1");
    json["verificationMaterial"]["tlogEntries"] = Value::Array(vec![second, first]);

    let (_server, client) = rekor(rekor_response(), 2).await;
    let report = verify_bundle(&bundle_from(json), &client).await.unwrap();

    assert_eq!(report.verdict, Verdict::Failed);
    assert_eq!(report.entries.len(), 2);
    assert!(!report.entries[0].check.is_passed());
    assert!(report.entries[1].check.is_passed());
}

#[tokio::test]
async fn test_bundle_without_log_entries_is_unanchored() {
    let mut json = bundle_json();
    json["verificationMaterial"]["tlogEntries"] = Value::Array(Vec::new());
    let (_server, client) = rekor(rekor_response(), 0).await;

    let report = verify_bundle(&bundle_from(json), &client).await.unwrap();
    assert_eq!(report.verdict, Verdict::VerifiedUnanchored);
    assert!(!report.is_verified());
    assert!(report.entries.is_empty());
}

#[tokio::test]
async fn test_bad_signature_skips_log_lookup() {
    let mut json = bundle_json();
    json["dsseEnvelope"]["signatures"][0]["sig"] = Value::from("invalid-signature");
    let (_server, client) = rekor(rekor_response(), 0).await;

    let report = verify_bundle(&bundle_from(json), &client).await.unwrap();
    assert_eq!(report.verdict, Verdict::Failed);
    assert!(report.entries.is_empty());
}

#[test]
fn test_offline_verification_is_unanchored() {
    let report = verify_bundle_offline(&bundle_from(bundle_json())).unwrap();
    assert_eq!(report.verdict, Verdict::VerifiedUnanchored);
}

#[test]
fn test_certificate_chain_bundle_verifies() {
    let mut json = bundle_json();
    let certificate = json["verificationMaterial"]["certificate"].take();
    json["verificationMaterial"] = serde_json::json!({
        "x509CertificateChain": { "certificates": [certificate] },
        "tlogEntries": [],
    });

    let report = verify_bundle_offline(&bundle_from(json)).unwrap();
    assert_eq!(report.verdict, Verdict::VerifiedUnanchored);
}

#[test]
fn test_certificate_public_key_round_trip() {
    let der = decode_base64(&fixture("sigstore_certificate.der.b64")).unwrap();
    let envelope = bundle_from(bundle_json()).dsse_envelope;

    let from_public_key = keys::resolve(&certificate_public_key_pem(&der).unwrap()).unwrap();
    let from_certificate = keys::resolve(&to_pem(CERTIFICATE_LABEL, &der)).unwrap();

    assert_eq!(from_public_key.tag(), "ecdsa-fallback");
    assert_eq!(from_certificate.tag(), "ecdsa-native");
    assert!(verify_dsse_signature(&envelope, &from_public_key).unwrap());
    assert!(verify_dsse_signature(&envelope, &from_certificate).unwrap());
}
