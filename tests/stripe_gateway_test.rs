use event_lens::adapters::StripeCheckout;
use event_lens::config::PaymentConfig;
use event_lens::domain::model::CheckoutRequest;
use event_lens::domain::ports::PaymentGateway;
use event_lens::LensError;
use httpmock::prelude::*;
use serde_json::json;

fn gateway(server: &MockServer) -> StripeCheckout {
    let config = PaymentConfig {
        api_base: server.base_url(),
        secret_key: "sk_test_gateway".to_string(),
        timeout_seconds: 5,
        ..PaymentConfig::default()
    };
    StripeCheckout::new(&config).unwrap()
}

fn request() -> CheckoutRequest {
    CheckoutRequest {
        order_id: "ord_1".to_string(),
        event_id: "evt_1".to_string(),
        quantity: 2,
        unit_amount: 750,
        currency: "eur".to_string(),
        product_name: "Event photo".to_string(),
        success_url: "http://photos.test/checkout/{CHECKOUT_SESSION_ID}".to_string(),
        cancel_url: "http://photos.test/".to_string(),
    }
}

#[tokio::test]
async fn test_create_checkout_posts_form_with_bearer_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/checkout/sessions")
                .header("authorization", "Bearer sk_test_gateway")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_contains("mode=payment")
                .body_contains("client_reference_id=ord_1")
                .body_contains("line_items%5B0%5D%5Bquantity%5D=2")
                .body_contains("line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=750")
                .body_contains("line_items%5B0%5D%5Bprice_data%5D%5Bcurrency%5D=eur");
            then.status(200).json_body(json!({
                "id": "cs_test_abc",
                "object": "checkout.session",
                "url": "https://checkout.stripe.test/pay/cs_test_abc",
                "status": "open",
                "payment_status": "unpaid",
                "amount_total": 1500,
                "currency": "eur"
            }));
        })
        .await;

    let session = gateway(&server).create_checkout(&request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(session.id, "cs_test_abc");
    assert_eq!(
        session.url.as_deref(),
        Some("https://checkout.stripe.test/pay/cs_test_abc")
    );
    assert_eq!(session.amount_total, Some(1500));
    assert!(!session.is_paid());
}

#[tokio::test]
async fn test_provider_error_message_is_kept() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/checkout/sessions");
            then.status(400).json_body(json!({
                "error": {
                    "message": "Invalid currency: zzz",
                    "type": "invalid_request_error"
                }
            }));
        })
        .await;

    let err = gateway(&server).create_checkout(&request()).await.unwrap_err();
    match &err {
        LensError::PaymentError { message } => {
            assert!(message.contains("Invalid currency: zzz"));
            assert!(message.contains("invalid_request_error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status_code(), 502);
    assert_eq!(err.public_message(), "upstream service failure");
}

#[tokio::test]
async fn test_session_without_redirect_url_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/checkout/sessions");
            then.status(200).json_body(json!({
                "id": "cs_test_nourl",
                "payment_status": "unpaid"
            }));
        })
        .await;

    let err = gateway(&server).create_checkout(&request()).await.unwrap_err();
    assert!(matches!(err, LensError::PaymentError { .. }));
}

#[tokio::test]
async fn test_retrieve_checkout() {
    let server = MockServer::start_async().await;
    let paid = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/checkout/sessions/cs_test_paid")
                .header("authorization", "Bearer sk_test_gateway");
            then.status(200).json_body(json!({
                "id": "cs_test_paid",
                "payment_status": "paid",
                "status": "complete"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/checkout/sessions/cs_test_gone");
            then.status(404).json_body(json!({
                "error": { "message": "No such checkout.session", "type": "invalid_request_error" }
            }));
        })
        .await;

    let gateway = gateway(&server);

    let session = gateway.retrieve_checkout("cs_test_paid").await.unwrap();
    paid.assert_async().await;
    assert!(session.is_paid());
    assert_eq!(session.status.as_deref(), Some("complete"));

    let err = gateway.retrieve_checkout("cs_test_gone").await.unwrap_err();
    assert!(matches!(err, LensError::NotFound { .. }));
}
