use async_trait::async_trait;
use bus_reservation_system::{
    models::payment::{PaymentMethod, PaymentStatus, TransferReceipt},
    models::reservation::CommitStep,
    services::reservation_service::ReservationService,
    store::ReservationStore,
    utils::error::AppError,
};
use rust_decimal::Decimal;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod fixtures;
}
use common::fixtures::{booking_time, reservation_request, Harness, MemoryStorage, RecordingMailer};

struct ReservationContext {
    harness: Harness,
    reservation_service: ReservationService,
}

impl ReservationContext {
    fn with(storage: MemoryStorage, mailer: RecordingMailer) -> Self {
        let harness = Harness::new(storage, mailer);
        let reservation_service = ReservationService::new(
            harness.store.clone(),
            harness.storage.clone(),
            harness.mailer.clone(),
        );
        ReservationContext {
            harness,
            reservation_service,
        }
    }
}

#[async_trait]
impl AsyncTestContext for ReservationContext {
    async fn setup() -> Self {
        Self::with(MemoryStorage::default(), RecordingMailer::default())
    }
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_commit_books_seats_and_delivers_invoice(ctx: &mut ReservationContext) {
    let trip_id = ctx.harness.trip_id;
    let confirmation = ctx
        .reservation_service
        .commit_at(reservation_request(trip_id, &[2, 1], "1712345678"), booking_time())
        .await
        .unwrap();

    assert_eq!(confirmation.booking_status, "Confirmed");
    assert_eq!(confirmation.seat_numbers, vec![1, 2]);
    assert_eq!(confirmation.total_amount, Decimal::new(3100, 2));
    assert_eq!(confirmation.confirmation_code.len(), 8);
    assert!(confirmation.soft_failures.is_empty());
    assert!(confirmation.invoice_url.starts_with("https://storage.test/invoices/invoice_"));

    let store = &ctx.harness.store;
    assert_eq!(store.trip_counter(trip_id), Some(38));
    for seat in [1, 2] {
        assert_eq!(
            store.seat(trip_id, seat).unwrap().reservation_id,
            Some(confirmation.reservation_id)
        );
    }

    let payments = store.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].card_last_four.as_deref(), Some("1234"));
    assert!(payments[0].transaction_id.starts_with("TXN-"));
    assert_eq!(payments[0].receipt_url.as_deref(), Some(confirmation.invoice_url.as_str()));

    let sent = ctx.harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "maria.andrade@example.com");
    assert_eq!(sent[0].seat_numbers, "1, 2");
    assert_eq!(sent[0].total_amount, "31.00");
    assert_eq!(sent[0].invoice_url, confirmation.invoice_url);
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_total_is_computed_from_route_price(ctx: &mut ReservationContext) {
    let confirmation = ctx
        .reservation_service
        .commit_at(
            reservation_request(ctx.harness.trip_id, &[5, 6, 7], "1712345678"),
            booking_time(),
        )
        .await
        .unwrap();

    assert_eq!(confirmation.total_amount, Decimal::new(4650, 2));
    let reservation = ctx
        .reservation_service
        .reservation_by_code(&confirmation.confirmation_code)
        .await
        .unwrap();
    assert_eq!(reservation.total_amount, Decimal::new(4650, 2));
    assert_eq!(reservation.payment_status, PaymentStatus::Completed);
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_invalid_input_writes_nothing(ctx: &mut ReservationContext) {
    let mut request = reservation_request(ctx.harness.trip_id, &[3], "12345");
    request.passenger.email = "not-an-email".into();

    let result = ctx.reservation_service.commit_at(request, booking_time()).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));

    let store = &ctx.harness.store;
    assert_eq!(store.call_count("trip"), 0);
    assert_eq!(store.call_count("insert_passenger"), 0);
    assert!(store.reservations().is_empty());
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_expired_card_is_rejected(ctx: &mut ReservationContext) {
    let mut request = reservation_request(ctx.harness.trip_id, &[3], "1712345678");
    if let Some(card) = request.payment.card.as_mut() {
        card.expiry_date = "07/25".into();
    }

    let result = ctx.reservation_service.commit_at(request, booking_time()).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_transfer_payment_has_no_card_suffix(ctx: &mut ReservationContext) {
    let mut request = reservation_request(ctx.harness.trip_id, &[9], "1712345678");
    request.payment.method = PaymentMethod::Transfer;
    request.payment.card = None;
    request.payment.transfer_receipt = Some(TransferReceipt {
        file_name: "receipt.png".into(),
        content_type: "image/png".into(),
        size_bytes: 200_000,
    });

    ctx.reservation_service
        .commit_at(request, booking_time())
        .await
        .unwrap();

    let payments = ctx.harness.store.payments();
    assert_eq!(payments[0].payment_method, PaymentMethod::Transfer);
    assert_eq!(payments[0].card_last_four, None);
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_occupied_seat_conflicts_before_any_write(ctx: &mut ReservationContext) {
    let trip_id = ctx.harness.trip_id;
    ctx.reservation_service
        .commit_at(reservation_request(trip_id, &[4], "1712345678"), booking_time())
        .await
        .unwrap();

    let store = &ctx.harness.store;
    let passengers_before = store.call_count("insert_passenger");
    let upserts_before = store.call_count("find_passenger");

    let result = ctx
        .reservation_service
        .commit_at(reservation_request(trip_id, &[4, 5], "0923456781"), booking_time())
        .await;

    match result {
        Err(AppError::Conflict(message)) => assert!(message.contains('4')),
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(store.call_count("find_passenger"), upserts_before);
    assert_eq!(store.call_count("insert_passenger"), passengers_before);
    assert_eq!(store.reservations().len(), 1);
    assert!(store.seat(trip_id, 5).is_none());
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_counter_below_request_conflicts(ctx: &mut ReservationContext) {
    let trip_id = ctx.harness.trip_id;
    ctx.harness.store.set_trip_counter(trip_id, 1);

    let result = ctx
        .reservation_service
        .commit_at(reservation_request(trip_id, &[1, 2], "1712345678"), booking_time())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(ctx.harness.store.reservations().is_empty());
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_seat_beyond_capacity_is_rejected(ctx: &mut ReservationContext) {
    let result = ctx
        .reservation_service
        .commit_at(
            reservation_request(ctx.harness.trip_id, &[41], "1712345678"),
            booking_time(),
        )
        .await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_unknown_trip_is_not_found(ctx: &mut ReservationContext) {
    let result = ctx
        .reservation_service
        .commit_at(reservation_request(9999, &[1], "1712345678"), booking_time())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_returning_passenger_with_same_contact_is_not_updated(ctx: &mut ReservationContext) {
    let trip_id = ctx.harness.trip_id;
    let first = ctx
        .reservation_service
        .commit_at(reservation_request(trip_id, &[10], "1712345678"), booking_time())
        .await
        .unwrap();
    let second = ctx
        .reservation_service
        .commit_at(reservation_request(trip_id, &[11], "1712345678"), booking_time())
        .await
        .unwrap();

    let store = &ctx.harness.store;
    assert_eq!(first.passenger_id, second.passenger_id);
    assert_eq!(store.passengers().len(), 1);
    assert_eq!(store.call_count("update_passenger_contact"), 0);
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_returning_passenger_keeps_name_and_email(ctx: &mut ReservationContext) {
    let trip_id = ctx.harness.trip_id;
    ctx.reservation_service
        .commit_at(reservation_request(trip_id, &[10], "1712345678"), booking_time())
        .await
        .unwrap();

    let mut request = reservation_request(trip_id, &[11], "1712345678");
    request.passenger.first_name = "Mariana".into();
    request.passenger.email = "mariana@example.com".into();
    request.passenger.phone = "0987654321".into();
    ctx.reservation_service
        .commit_at(request, booking_time())
        .await
        .unwrap();

    let store = &ctx.harness.store;
    let passengers = store.passengers();
    assert_eq!(store.call_count("update_passenger_contact"), 1);
    assert_eq!(passengers[0].phone, "0987654321");
    assert_eq!(passengers[0].name, "María Andrade");
    assert_eq!(passengers[0].email, "maria.andrade@example.com");
}

#[tokio::test]
async fn test_email_failure_keeps_booking_confirmed() {
    let ctx = ReservationContext::with(MemoryStorage::default(), RecordingMailer::failing());
    let confirmation = ctx
        .reservation_service
        .commit_at(
            reservation_request(ctx.harness.trip_id, &[8], "1712345678"),
            booking_time(),
        )
        .await
        .unwrap();

    assert_eq!(confirmation.booking_status, "Confirmed");
    assert_eq!(confirmation.soft_failures, vec![CommitStep::SendEmail]);
    let reservation = ctx
        .reservation_service
        .reservation_by_code(&confirmation.confirmation_code)
        .await
        .unwrap();
    assert_eq!(reservation.payment_status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_storage_failure_falls_back_to_data_uri() {
    let ctx = ReservationContext::with(MemoryStorage::failing(), RecordingMailer::default());
    let confirmation = ctx
        .reservation_service
        .commit_at(
            reservation_request(ctx.harness.trip_id, &[8], "1712345678"),
            booking_time(),
        )
        .await
        .unwrap();

    assert!(confirmation
        .invoice_url
        .starts_with("data:application/pdf;base64,"));
    assert_eq!(confirmation.soft_failures, vec![CommitStep::UploadInvoice]);
    assert_eq!(ctx.harness.store.payments()[0].receipt_url, None);
    assert_eq!(ctx.harness.mailer.sent()[0].invoice_url, confirmation.invoice_url);
}

#[tokio::test]
async fn test_payment_and_counter_failures_are_soft() {
    let ctx = ReservationContext::with(MemoryStorage::default(), RecordingMailer::default());
    ctx.harness.store.fail_on("insert_payment");
    ctx.harness.store.fail_on("sync_available_seats");

    let confirmation = ctx
        .reservation_service
        .commit_at(
            reservation_request(ctx.harness.trip_id, &[3], "1712345678"),
            booking_time(),
        )
        .await
        .unwrap();

    assert_eq!(confirmation.payment_id, None);
    assert_eq!(
        confirmation.soft_failures,
        vec![CommitStep::SyncCounter, CommitStep::CreatePayment]
    );
    assert_eq!(ctx.harness.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_reservation_insert_failure_is_fatal() {
    let ctx = ReservationContext::with(MemoryStorage::default(), RecordingMailer::default());
    ctx.harness.store.fail_on("insert_reservation");

    let result = ctx
        .reservation_service
        .commit_at(
            reservation_request(ctx.harness.trip_id, &[3], "1712345678"),
            booking_time(),
        )
        .await;

    assert!(matches!(result, Err(AppError::DatabaseError(_))));
    assert_eq!(ctx.harness.store.call_count("claim_seat"), 0);
    assert!(ctx.harness.mailer.sent().is_empty());
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_concurrent_bookings_of_one_seat(ctx: &mut ReservationContext) {
    let trip_id = ctx.harness.trip_id;
    let now = booking_time();
    let (first, second) = tokio::join!(
        ctx.reservation_service
            .commit_at(reservation_request(trip_id, &[12], "1712345678"), now),
        ctx.reservation_service
            .commit_at(reservation_request(trip_id, &[12, 13], "0923456781"), now),
    );

    let winners: Vec<_> = [&first, &second].into_iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!([&first, &second]
        .into_iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));

    let store = &ctx.harness.store;
    let holder = store.seat(trip_id, 12).unwrap().reservation_id;
    let confirmed: Vec<_> = store
        .reservations()
        .into_iter()
        .filter(|r| r.payment_status == PaymentStatus::Completed)
        .collect();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(holder, Some(confirmed[0].id));

    // The loser released whatever it had claimed
    let occupied = store.occupied_seats(trip_id).await.unwrap();
    assert_eq!(store.trip_counter(trip_id), Some(40 - occupied.len() as i32));
}

#[test_context(ReservationContext)]
#[tokio::test]
async fn test_unknown_confirmation_code(ctx: &mut ReservationContext) {
    let missing = ctx.reservation_service.reservation_by_code("ZZZZ9999").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let malformed = ctx.reservation_service.reservation_by_code("abc").await;
    assert!(matches!(malformed, Err(AppError::BadRequest(_))));
}
