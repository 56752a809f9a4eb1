use serde::Serialize;

use crate::error::AppError;
use crate::models::driver::ApprovalStatus;
use crate::models::order::{OrderFilter, OrderStatus, PayoutStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub accepted: usize,
    pub pickup: usize,
    pub completed: usize,
}

/// Operator control-centre snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FleetOverview {
    pub total_orders: usize,
    pub by_status: StatusCounts,
    /// Sum of every order's price regardless of status.
    pub booked_value: u64,
    pub completed_revenue: u64,
    pub platform_fees: u64,
    pub approved_drivers: usize,
    pub tracking_drivers: usize,
    pub pending_applications: usize,
    /// Completed orders over all orders; 0 when there are none.
    pub efficiency_rate: f64,
}

pub fn fleet_overview(state: &AppState) -> FleetOverview {
    let orders = state.orders.list(&OrderFilter::default());

    let mut by_status = StatusCounts::default();
    let mut booked_value = 0u64;
    let mut completed_revenue = 0u64;
    let mut platform_fees = 0u64;
    for order in &orders {
        booked_value = booked_value.saturating_add(order.price);
        match order.status {
            OrderStatus::Pending => by_status.pending += 1,
            OrderStatus::Accepted => by_status.accepted += 1,
            OrderStatus::Pickup => by_status.pickup += 1,
            OrderStatus::Completed => {
                by_status.completed += 1;
                completed_revenue = completed_revenue.saturating_add(order.price);
                platform_fees = platform_fees.saturating_add(order.fee);
            }
        }
    }

    let drivers = state.drivers.list(None);
    let approved_drivers = drivers.iter().filter(|d| d.is_approved()).count();
    let tracking_drivers = drivers.iter().filter(|d| d.position().is_some()).count();
    let pending_applications = drivers
        .iter()
        .filter(|d| d.status == ApprovalStatus::Pending)
        .count();

    let efficiency_rate = if orders.is_empty() {
        0.0
    } else {
        by_status.completed as f64 / orders.len() as f64
    };

    FleetOverview {
        total_orders: orders.len(),
        by_status,
        booked_value,
        completed_revenue,
        platform_fees,
        approved_drivers,
        tracking_drivers,
        pending_applications,
        efficiency_rate,
    }
}

/// What a driver has earned from completed orders.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriverSettlement {
    pub driver_id: String,
    pub completed_orders: usize,
    pub gross: u64,
    pub fees: u64,
    pub net: u64,
    pub ready_for_payout: u64,
    pub paid_out: u64,
}

pub fn driver_settlement(state: &AppState, driver_id: &str) -> Result<DriverSettlement, AppError> {
    state.drivers.get(driver_id)?;

    let mut settlement = DriverSettlement {
        driver_id: driver_id.to_string(),
        ..DriverSettlement::default()
    };

    let completed = state
        .orders
        .list(&OrderFilter {
            status: Some(OrderStatus::Completed),
            driver_id: Some(driver_id.to_string()),
        });
    for order in &completed {
        let payout = order.driver_payout();
        settlement.gross = settlement.gross.saturating_add(order.price);
        settlement.fees = settlement.fees.saturating_add(order.fee);
        settlement.net = settlement.net.saturating_add(payout);
        match order.payout_status {
            PayoutStatus::Ready => {
                settlement.ready_for_payout = settlement.ready_for_payout.saturating_add(payout)
            }
            PayoutStatus::Completed => {
                settlement.paid_out = settlement.paid_out.saturating_add(payout)
            }
            PayoutStatus::Pending => {}
        }
    }
    settlement.completed_orders = completed.len();

    Ok(settlement)
}
