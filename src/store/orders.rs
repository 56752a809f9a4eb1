use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{NewOrder, Order, OrderFilter, OrderStatus, PayoutStatus};

struct StoredOrder {
    seq: u64,
    order: Order,
}

/// Canonical set of orders.
///
/// Every mutation happens while holding the map's write guard for that one
/// order id, so a check-and-set on an order can never interleave with
/// another writer or expose a half-applied record to readers.
pub struct OrderStore {
    orders: DashMap<Uuid, StoredOrder>,
    next_seq: AtomicU64,
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn create(&self, new_order: NewOrder) -> Result<Order, AppError> {
        let (price, fee) = validate_new_order(&new_order)?;

        let order = Order {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            customer_name: new_order.customer_name.trim().to_string(),
            origin: new_order.origin.trim().to_string(),
            destination: new_order.destination.trim().to_string(),
            recipient_phone: new_order.recipient_phone.filter(|p| !p.trim().is_empty()),
            vehicle_type: new_order.vehicle_type,
            vehicle_options: new_order.vehicle_options,
            price,
            fee,
            status: OrderStatus::Pending,
            driver_id: None,
            description: new_order.description.filter(|d| !d.trim().is_empty()),
            cargo_details: new_order.cargo_details,
            is_insured: new_order.is_insured,
            payout_status: PayoutStatus::Pending,
            accepted_at: None,
            picked_up_at: None,
            completed_at: None,
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.orders.insert(
            order.id,
            StoredOrder {
                seq,
                order: order.clone(),
            },
        );

        Ok(order)
    }

    /// Applies one lifecycle edge atomically on behalf of `acting_driver`.
    ///
    /// Entering ACCEPTED binds the driver; entering COMPLETED marks the
    /// payout READY in the same critical section. An order held by someone
    /// else fails with `AlreadyAssigned` before edge legality is considered.
    pub fn transition(
        &self,
        order_id: Uuid,
        next: OrderStatus,
        acting_driver: &str,
    ) -> Result<Order, AppError> {
        let acting_driver = acting_driver.trim();
        if acting_driver.is_empty() {
            return Err(AppError::Validation(format!(
                "moving an order to {next} requires a driver id"
            )));
        }

        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
        let order = &mut entry.order;

        if let Some(holder) = order.driver_id.as_deref() {
            if holder != acting_driver {
                return Err(AppError::AlreadyAssigned {
                    order_id,
                    driver_id: holder.to_string(),
                });
            }
        }

        if !order.status.can_transition_to(next) {
            return Err(AppError::order_transition(order.status, next));
        }

        let now = Utc::now();
        match next {
            OrderStatus::Accepted => {
                order.driver_id = Some(acting_driver.to_string());
                order.accepted_at = Some(now);
            }
            OrderStatus::Pickup => order.picked_up_at = Some(now),
            OrderStatus::Completed => {
                order.completed_at = Some(now);
                order.payout_status = PayoutStatus::Ready;
            }
            OrderStatus::Pending => {}
        }
        order.status = next;

        Ok(order.clone())
    }

    /// Marks a READY payout as paid out.
    pub fn complete_payout(&self, order_id: Uuid) -> Result<Order, AppError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
        let order = &mut entry.order;

        if order.status != OrderStatus::Completed {
            return Err(AppError::InvalidTransition {
                from: order.status.to_string(),
                to: "PAYOUT_COMPLETED".to_string(),
            });
        }
        if order.payout_status != PayoutStatus::Ready {
            return Err(AppError::InvalidTransition {
                from: format!("PAYOUT_{}", order.payout_status.as_str()),
                to: "PAYOUT_COMPLETED".to_string(),
            });
        }

        order.payout_status = PayoutStatus::Completed;
        Ok(order.clone())
    }

    pub fn get(&self, order_id: Uuid) -> Result<Order, AppError> {
        self.orders
            .get(&order_id)
            .map(|entry| entry.order.clone())
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))
    }

    /// Matching orders, most recently created first.
    pub fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut matching: Vec<(u64, Order)> = self
            .orders
            .iter()
            .filter(|entry| filter.matches(&entry.order))
            .map(|entry| (entry.seq, entry.order.clone()))
            .collect();

        matching.sort_by(|a, b| b.0.cmp(&a.0));
        matching.into_iter().map(|(_, order)| order).collect()
    }

    pub fn count_by_status(&self, status: OrderStatus) -> usize {
        self.orders
            .iter()
            .filter(|entry| entry.order.status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

fn validate_new_order(new_order: &NewOrder) -> Result<(u64, u64), AppError> {
    if new_order.customer_name.trim().is_empty() {
        return Err(AppError::Validation(
            "customer name cannot be empty".to_string(),
        ));
    }
    if new_order.origin.trim().is_empty() {
        return Err(AppError::Validation("origin cannot be empty".to_string()));
    }
    if new_order.destination.trim().is_empty() {
        return Err(AppError::Validation(
            "destination cannot be empty".to_string(),
        ));
    }

    let price = u64::try_from(new_order.price)
        .map_err(|_| AppError::Validation("price must be >= 0".to_string()))?;
    let fee = u64::try_from(new_order.fee.unwrap_or(0))
        .map_err(|_| AppError::Validation("fee must be >= 0".to_string()))?;
    if fee > price {
        return Err(AppError::Validation(
            "fee cannot exceed price".to_string(),
        ));
    }

    Ok((price, fee))
}
