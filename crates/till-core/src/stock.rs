//! # Stock Movement Planning
//!
//! Turns a requested stock change into the exact row the inventory ledger
//! writes. Pure: the repository reads the current quantity, asks for a
//! plan, then writes the plan's `new_quantity` and movement row together.
//!
//! ## Change Kinds
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────────┬────────────┐
//! │ StockChange  │ movement     │ new quantity             │ floor at 0 │
//! ├──────────────┼──────────────┼──────────────────────────┼────────────┤
//! │ StockIn(n)   │ IN           │ current + n              │ -          │
//! │ StockOut(n)  │ OUT          │ max(0, current − n)      │ yes        │
//! │ SaleOut(n)   │ OUT          │ current − n              │ no         │
//! │ SetTo(t)     │ ADJUSTMENT   │ t                        │ -          │
//! └──────────────┴──────────────┴──────────────────────────┴────────────┘
//! ```
//!
//! `SaleOut` is what checkout posts. It may drive stock negative so that
//! an oversold product shows up on the inventory screen; a manual stock-out
//! never goes below zero.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::types::MovementType;
use crate::validation::{validate_stock_target, validate_stock_units};

/// A requested change to one product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "units", rename_all = "snake_case")]
pub enum StockChange {
    /// Goods received.
    StockIn(i64),
    /// Manual removal (damage, expiry). Floors at zero.
    StockOut(i64),
    /// Removal by a committed sale. No floor.
    SaleOut(i64),
    /// Stock count: set the absolute quantity.
    SetTo(i64),
}

impl StockChange {
    /// Validates the argument before any storage read.
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            StockChange::StockIn(n) | StockChange::StockOut(n) | StockChange::SaleOut(n) => {
                validate_stock_units(n)?
            }
            StockChange::SetTo(target) => validate_stock_target(target)?,
        }
        Ok(())
    }

    /// Movement type recorded for this change.
    pub fn movement_type(&self) -> MovementType {
        match self {
            StockChange::StockIn(_) => MovementType::In,
            StockChange::StockOut(_) | StockChange::SaleOut(_) => MovementType::Out,
            StockChange::SetTo(_) => MovementType::Adjustment,
        }
    }

    /// Plans the movement against the current stock level.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{MovementType, StockChange};
    ///
    /// let plan = StockChange::SetTo(12).plan(15).unwrap();
    /// assert_eq!(plan.movement_type, MovementType::Adjustment);
    /// assert_eq!(plan.quantity_change, -3);
    /// assert_eq!(plan.new_quantity, 12);
    /// ```
    pub fn plan(&self, current: i64) -> CoreResult<MovementPlan> {
        self.validate()?;

        let new_quantity = match *self {
            StockChange::StockIn(n) => current + n,
            StockChange::StockOut(n) => (current - n).max(0),
            StockChange::SaleOut(n) => current - n,
            StockChange::SetTo(target) => target,
        };

        Ok(MovementPlan {
            movement_type: self.movement_type(),
            quantity_change: new_quantity - current,
            old_quantity: current,
            new_quantity,
        })
    }
}

/// The stock row values a movement will write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPlan {
    pub movement_type: MovementType,
    /// Signed; negative for OUT.
    pub quantity_change: i64,
    pub old_quantity: i64,
    pub new_quantity: i64,
}

impl MovementPlan {
    /// Checks if the movement leaves the product oversold.
    #[inline]
    pub fn goes_negative(&self) -> bool {
        self.new_quantity < 0
    }
}
