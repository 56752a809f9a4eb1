use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::pricing::{refresh_fare, FareQuote};
use crate::error::AppError;
use crate::models::driver::{DriverRegistration, LocationAck, LocationReport, NewRegistration};
use crate::models::event::DispatchEventKind;
use crate::models::order::{NewOrder, Order, OrderStatus};
use crate::models::vehicle::VehicleType;
use crate::services::parser::{draft_from_text, OrderParser, ParsedOrderDraft};
use crate::state::AppState;

fn observe(state: &AppState, operation: &str, start: Instant) {
    state
        .metrics
        .dispatch_latency_seconds
        .with_label_values(&[operation])
        .observe(start.elapsed().as_secs_f64());
}

fn record_transition(state: &AppState, order: &Order) {
    state
        .metrics
        .order_transitions_total
        .with_label_values(&[order.status.as_str()])
        .inc();
}

/// Creates a PENDING order. No driver is bound here.
pub fn submit_order(state: &AppState, mut new_order: NewOrder) -> Result<Order, AppError> {
    let start = Instant::now();

    if new_order.fee.is_none() {
        new_order.fee = Some(state.fee_policy.fee_for(new_order.price));
    }

    let result = state.orders.create(new_order);
    observe(state, "submit", start);
    let order = result?;

    state.metrics.orders_created_total.inc();
    state.metrics.pending_orders.inc();
    info!(
        order_id = %order.id,
        vehicle = %order.vehicle_type,
        price = order.price,
        fee = order.fee,
        "order submitted"
    );
    state.publish(DispatchEventKind::OrderCreated(order.clone()));

    Ok(order)
}

/// Submits parser output forwarded by a customer-facing caller.
pub fn submit_draft(
    state: &AppState,
    customer_name: String,
    draft: ParsedOrderDraft,
) -> Result<Order, AppError> {
    submit_order(state, draft.into_new_order(customer_name))
}

/// Lets the parser fill in `form` from free text, then submits. A parser
/// failure submits the form unchanged.
pub async fn submit_with_parser(
    state: &AppState,
    parser: &dyn OrderParser,
    text: &str,
    form: NewOrder,
) -> Result<Order, AppError> {
    let new_order = match draft_from_text(parser, text).await {
        Some(draft) => draft.apply_to(form),
        None => form,
    };

    submit_order(state, new_order)
}

/// Binds `driver_id` to a PENDING order. At most one concurrent caller wins.
pub fn accept_order(state: &AppState, order_id: Uuid, driver_id: &str) -> Result<Order, AppError> {
    let start = Instant::now();
    let result = ensure_eligible(state, driver_id)
        .and_then(|_| state.orders.transition(order_id, OrderStatus::Accepted, driver_id));
    observe(state, "accept", start);

    match &result {
        Ok(order) => {
            state
                .metrics
                .acceptances_total
                .with_label_values(&["success"])
                .inc();
            state.metrics.pending_orders.dec();
            record_transition(state, order);
            info!(order_id = %order_id, driver_id, "order accepted");
            state.publish(DispatchEventKind::OrderAccepted(order.clone()));
        }
        Err(err) => {
            state
                .metrics
                .acceptances_total
                .with_label_values(&[outcome_label(err)])
                .inc();
            warn!(order_id = %order_id, driver_id, error = %err, "order acceptance refused");
        }
    }

    result
}

fn ensure_eligible(state: &AppState, driver_id: &str) -> Result<DriverRegistration, AppError> {
    match state.drivers.get(driver_id) {
        Ok(driver) if driver.is_approved() => Ok(driver),
        Ok(_) | Err(AppError::NotFound(_)) => {
            Err(AppError::DriverNotEligible(driver_id.to_string()))
        }
        Err(err) => Err(err),
    }
}

fn outcome_label(err: &AppError) -> &'static str {
    match err {
        AppError::AlreadyAssigned { .. } => "already_assigned",
        AppError::DriverNotEligible(_) => "not_eligible",
        AppError::InvalidTransition { .. } => "invalid_transition",
        AppError::NotFound(_) => "not_found",
        _ => "error",
    }
}

/// ACCEPTED → PICKUP by the driver holding the order.
pub fn confirm_pickup(state: &AppState, order_id: Uuid, driver_id: &str) -> Result<Order, AppError> {
    let start = Instant::now();
    let result = state.orders.transition(order_id, OrderStatus::Pickup, driver_id);
    observe(state, "pickup", start);
    let order = result?;

    record_transition(state, &order);
    info!(order_id = %order_id, driver_id, "cargo picked up");
    state.publish(DispatchEventKind::OrderPickedUp(order.clone()));

    Ok(order)
}

/// Finishes the delivery; the order becomes COMPLETED with its payout READY
/// in a single step.
pub fn complete_order(
    state: &AppState,
    order_id: Uuid,
    driver_id: &str,
) -> Result<Order, AppError> {
    let start = Instant::now();
    let result = state.orders.transition(order_id, OrderStatus::Completed, driver_id);
    observe(state, "complete", start);
    let order = result?;

    record_transition(state, &order);
    info!(
        order_id = %order_id,
        driver_id,
        payout = order.driver_payout(),
        "order completed"
    );
    state.publish(DispatchEventKind::OrderCompleted(order.clone()));

    Ok(order)
}

/// Operator marks a READY payout as paid out.
pub fn settle_payout(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    let order = state.orders.complete_payout(order_id)?;

    info!(order_id = %order_id, amount = order.driver_payout(), "payout completed");
    state.publish(DispatchEventKind::PayoutCompleted(order.clone()));

    Ok(order)
}

pub async fn quote_fare(
    state: &AppState,
    origin: &str,
    destination: &str,
    vehicle: VehicleType,
    previous: Option<u64>,
) -> FareQuote {
    let previous = previous
        .or_else(|| vehicle.base_fare())
        .unwrap_or_default();

    refresh_fare(
        state.fare_estimator.as_ref(),
        origin,
        destination,
        vehicle,
        previous,
    )
    .await
}

pub fn register_driver(
    state: &AppState,
    application: NewRegistration,
) -> Result<DriverRegistration, AppError> {
    let registration = state.drivers.register(application)?;

    info!(
        driver_id = %registration.id,
        vehicle = %registration.vehicle_type,
        "driver application received"
    );
    state.publish(DispatchEventKind::DriverRegistered(registration.clone()));

    Ok(registration)
}

pub fn approve_driver(state: &AppState, driver_id: &str) -> Result<DriverRegistration, AppError> {
    let registration = state.drivers.approve(driver_id)?;
    info!(driver_id, "driver approved");
    state.publish(DispatchEventKind::DriverReviewed(registration.clone()));
    Ok(registration)
}

pub fn reject_driver(state: &AppState, driver_id: &str) -> Result<DriverRegistration, AppError> {
    let registration = state.drivers.reject(driver_id)?;
    info!(driver_id, "driver rejected");
    state.publish(DispatchEventKind::DriverReviewed(registration.clone()));
    Ok(registration)
}

/// Accepts a pushed position report. Tracking does not require approval and
/// does not affect orders the driver already holds.
pub fn report_location(
    state: &AppState,
    driver_id: &str,
    report: LocationReport,
) -> Result<LocationAck, AppError> {
    let ack = state.drivers.update_location(driver_id, report)?;

    if ack.applied {
        let tracking = state.drivers.count_tracking();
        state
            .metrics
            .tracking_drivers
            .set(i64::try_from(tracking).unwrap_or(i64::MAX));
        state.publish(DispatchEventKind::DriverMoved(ack.driver.clone()));
    } else {
        state.metrics.stale_location_reports_total.inc();
        warn!(driver_id, "ignored location report older than the stored one");
    }

    Ok(ack)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use async_trait::async_trait;

    use super::*;
    use crate::engine::pricing::FeePolicy;
    use crate::models::order::PayoutStatus;
    use crate::services::ServiceError;

    fn state() -> AppState {
        AppState::new(64).unwrap()
    }

    fn order_request(price: i64) -> NewOrder {
        NewOrder {
            customer_name: "Kim".to_string(),
            origin: "A".to_string(),
            destination: "B".to_string(),
            recipient_phone: None,
            vehicle_type: VehicleType::Motorcycle,
            vehicle_options: Vec::new(),
            price,
            fee: None,
            description: None,
            cargo_details: None,
            is_insured: false,
        }
    }

    fn approved_driver(state: &AppState, id: &str) {
        pending_driver(state, id);
        approve_driver(state, id).unwrap();
    }

    fn pending_driver(state: &AppState, id: &str) {
        register_driver(
            state,
            NewRegistration {
                id: id.to_string(),
                driver_name: format!("Driver {id}"),
                car_number: "Gyeonggi 88Na 9999".to_string(),
                vehicle_type: VehicleType::Motorcycle,
                phone_number: "010-1111-2222".to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn accept_and_complete_scenario() {
        let state = state();
        approved_driver(&state, "X");
        approved_driver(&state, "Y");

        let order = submit_order(&state, order_request(8000)).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.driver_id.is_none());

        let accepted = accept_order(&state, order.id, "X").unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);
        assert_eq!(accepted.driver_id.as_deref(), Some("X"));

        assert!(matches!(
            accept_order(&state, order.id, "Y"),
            Err(AppError::AlreadyAssigned { .. })
        ));

        let completed = complete_order(&state, order.id, "X").unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(completed.payout_status, PayoutStatus::Ready);
        assert_eq!(state.metrics.pending_orders.get(), 0);
    }

    #[test]
    fn unapproved_driver_cannot_accept() {
        let state = state();
        pending_driver(&state, "Z");
        let order = submit_order(&state, order_request(8000)).unwrap();

        assert_eq!(
            accept_order(&state, order.id, "Z").unwrap_err(),
            AppError::DriverNotEligible("Z".to_string())
        );
        assert_eq!(
            accept_order(&state, order.id, "stranger").unwrap_err(),
            AppError::DriverNotEligible("stranger".to_string())
        );

        let stored = state.orders.get(order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.driver_id.is_none());
    }

    #[test]
    fn only_the_holder_can_progress_an_order() {
        let state = state();
        approved_driver(&state, "X");
        approved_driver(&state, "Y");
        let order = submit_order(&state, order_request(8000)).unwrap();
        accept_order(&state, order.id, "X").unwrap();

        assert!(matches!(
            confirm_pickup(&state, order.id, "Y"),
            Err(AppError::AlreadyAssigned { .. })
        ));
        assert!(matches!(
            complete_order(&state, order.id, "Y"),
            Err(AppError::AlreadyAssigned { .. })
        ));

        confirm_pickup(&state, order.id, "X").unwrap();
        let done = complete_order(&state, order.id, "X").unwrap();
        assert!(done.picked_up_at.is_some());
    }

    #[test]
    fn blank_driver_id_cannot_progress_a_held_order() {
        let state = state();
        approved_driver(&state, "X");
        let order = submit_order(&state, order_request(8000)).unwrap();
        accept_order(&state, order.id, "X").unwrap();

        assert!(matches!(
            confirm_pickup(&state, order.id, ""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            complete_order(&state, order.id, " "),
            Err(AppError::Validation(_))
        ));

        let stored = state.orders.get(order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Accepted);
        assert_eq!(stored.payout_status, PayoutStatus::Pending);
        assert_eq!(stored.driver_id.as_deref(), Some("X"));
    }

    #[test]
    fn complete_requires_an_accepted_order() {
        let state = state();
        approved_driver(&state, "X");
        let order = submit_order(&state, order_request(8000)).unwrap();

        assert!(matches!(
            complete_order(&state, order.id, "X"),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn fee_policy_fills_missing_fee() {
        let state = state().with_fee_policy(FeePolicy::percent(10));

        let order = submit_order(&state, order_request(50_000)).unwrap();
        assert_eq!(order.fee, 5_000);
        assert_eq!(order.driver_payout(), 45_000);

        let mut explicit = order_request(50_000);
        explicit.fee = Some(0);
        assert_eq!(submit_order(&state, explicit).unwrap().fee, 0);
    }

    #[test]
    fn invalid_order_is_not_published() {
        let state = state();
        let mut events = state.events_tx.subscribe();

        assert!(matches!(
            submit_order(&state, order_request(-1)),
            Err(AppError::Validation(_))
        ));
        assert!(events.try_recv().is_err());
        assert_eq!(state.metrics.orders_created_total.get(), 0);
    }

    #[test]
    fn acceptance_is_published() {
        let state = state();
        approved_driver(&state, "X");
        let order = submit_order(&state, order_request(8000)).unwrap();
        let mut events = state.events_tx.subscribe();

        accept_order(&state, order.id, "X").unwrap();

        let event = events.try_recv().unwrap();
        match event.kind {
            DispatchEventKind::OrderAccepted(accepted) => {
                assert_eq!(accepted.id, order.id);
                assert_eq!(accepted.driver_id.as_deref(), Some("X"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn completion_is_never_observed_without_ready_payout() {
        let state = Arc::new(state());
        approved_driver(&state, "X");
        let orders: Vec<_> = (0..50)
            .map(|_| {
                let order = submit_order(&state, order_request(8000)).unwrap();
                accept_order(&state, order.id, "X").unwrap();
                order.id
            })
            .collect();

        let barrier = Arc::new(Barrier::new(2));
        let writer = {
            let state = Arc::clone(&state);
            let barrier = Arc::clone(&barrier);
            let orders = orders.clone();
            thread::spawn(move || {
                barrier.wait();
                for id in orders {
                    complete_order(&state, id, "X").unwrap();
                }
            })
        };

        barrier.wait();
        for _ in 0..200 {
            for id in &orders {
                let order = state.orders.get(*id).unwrap();
                if order.status == OrderStatus::Completed {
                    assert_eq!(order.payout_status, PayoutStatus::Ready);
                }
            }
        }
        writer.join().unwrap();
    }

    #[test]
    fn racing_drivers_through_the_engine() {
        const DRIVERS: usize = 8;

        let state = Arc::new(state());
        for n in 0..DRIVERS {
            approved_driver(&state, &format!("d{n}"));
        }
        let order = submit_order(&state, order_request(8000)).unwrap();
        let barrier = Arc::new(Barrier::new(DRIVERS));

        let handles: Vec<_> = (0..DRIVERS)
            .map(|n| {
                let state = Arc::clone(&state);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    accept_order(&state, order.id, &format!("d{n}")).is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(
            state
                .metrics
                .acceptances_total
                .with_label_values(&["already_assigned"])
                .get(),
            (DRIVERS - 1) as u64
        );
    }

    #[test]
    fn stale_reports_are_counted_not_applied() {
        let state = state();
        pending_driver(&state, "X");
        let now = chrono::Utc::now();

        let fresh = LocationReport {
            lat: 37.5,
            lng: 127.0,
            tracking: true,
            reported_at: Some(now),
        };
        let stale = LocationReport {
            reported_at: Some(now - chrono::Duration::seconds(30)),
            ..fresh
        };

        assert!(report_location(&state, "X", fresh).unwrap().applied);
        assert_eq!(state.metrics.tracking_drivers.get(), 1);
        assert!(!report_location(&state, "X", stale).unwrap().applied);
        assert_eq!(state.metrics.stale_location_reports_total.get(), 1);
    }

    struct Failing;

    #[async_trait]
    impl OrderParser for Failing {
        async fn parse(&self, _text: &str) -> Result<ParsedOrderDraft, ServiceError> {
            Err(ServiceError::Unavailable("parser offline".to_string()))
        }
    }

    #[tokio::test]
    async fn parser_outage_submits_form_unchanged() {
        let state = state();
        let order = submit_with_parser(&state, &Failing, "boxes to Pangyo", order_request(9000))
            .await
            .unwrap();

        assert_eq!(order.origin, "A");
        assert_eq!(order.price, 9000);
    }

    #[tokio::test]
    async fn quote_falls_back_to_previous_price() {
        let state = state();

        let quote = quote_fare(&state, "A", "B", VehicleType::Truck25Ton, Some(90_000)).await;
        assert_eq!(quote.price, 90_000);
        assert!(!quote.estimated);

        let quote = quote_fare(&state, "A", "B", VehicleType::Truck1Ton, Some(90_000)).await;
        assert_eq!(quote.price, 50_000);
        assert!(quote.estimated);
    }
}
