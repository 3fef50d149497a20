//! Capability registries: spending conditions and output guard handlers.
//!
//! Both maps are write-once per key. They are filled while the exit game is
//! being wired up (`&mut self`) and then shared immutably behind an `Arc`,
//! so nothing can be swapped out from under a running game.

use std::collections::HashMap;
use std::sync::Arc;

use plasma_types::{OutputType, PlasmaError, Result, TxType};

use crate::conditions::SpendingCondition;
use crate::guard_handler::OutputGuardHandler;

/// Spending conditions keyed by (consumed output type, spending tx type),
/// guard handlers keyed by output type.
#[derive(Default)]
pub struct CapabilityRegistries {
    spending_conditions: HashMap<(OutputType, TxType), Arc<dyn SpendingCondition>>,
    guard_handlers: HashMap<OutputType, Arc<dyn OutputGuardHandler>>,
}

impl CapabilityRegistries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rule for `tx_type` transactions consuming `output_type`
    /// outputs.
    ///
    /// # Errors
    /// [`PlasmaError::DuplicateRegistration`] if the key is taken; the
    /// existing entry is left untouched.
    pub fn register_spending_condition(
        &mut self,
        output_type: OutputType,
        tx_type: TxType,
        condition: Arc<dyn SpendingCondition>,
    ) -> Result<()> {
        let key = (output_type, tx_type);
        if self.spending_conditions.contains_key(&key) {
            return Err(PlasmaError::DuplicateRegistration {
                key: PlasmaError::spending_condition_key(output_type, tx_type),
            });
        }
        self.spending_conditions.insert(key, condition);
        tracing::info!(%output_type, %tx_type, "Spending condition registered");
        Ok(())
    }

    /// # Errors
    /// [`PlasmaError::DuplicateRegistration`] if `output_type` already has a
    /// handler.
    pub fn register_output_guard_handler(
        &mut self,
        output_type: OutputType,
        handler: Arc<dyn OutputGuardHandler>,
    ) -> Result<()> {
        if self.guard_handlers.contains_key(&output_type) {
            return Err(PlasmaError::DuplicateRegistration {
                key: PlasmaError::guard_handler_key(output_type),
            });
        }
        self.guard_handlers.insert(output_type, handler);
        tracing::info!(%output_type, "Output guard handler registered");
        Ok(())
    }

    /// # Errors
    /// [`PlasmaError::UnregisteredCapability`] when nothing is registered.
    pub fn resolve_spending_condition(
        &self,
        output_type: OutputType,
        tx_type: TxType,
    ) -> Result<Arc<dyn SpendingCondition>> {
        self.spending_conditions
            .get(&(output_type, tx_type))
            .cloned()
            .ok_or_else(|| PlasmaError::UnregisteredCapability {
                key: PlasmaError::spending_condition_key(output_type, tx_type),
            })
    }

    /// # Errors
    /// [`PlasmaError::UnregisteredCapability`] when nothing is registered.
    pub fn resolve_output_guard_handler(
        &self,
        output_type: OutputType,
    ) -> Result<Arc<dyn OutputGuardHandler>> {
        self.guard_handlers
            .get(&output_type)
            .cloned()
            .ok_or_else(|| PlasmaError::UnregisteredCapability {
                key: PlasmaError::guard_handler_key(output_type),
            })
    }

    #[must_use]
    pub fn has_spending_condition(&self, output_type: OutputType, tx_type: TxType) -> bool {
        self.spending_conditions
            .contains_key(&(output_type, tx_type))
    }
}

impl std::fmt::Debug for CapabilityRegistries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut conditions: Vec<_> = self.spending_conditions.keys().collect();
        conditions.sort();
        let mut handlers: Vec<_> = self.guard_handlers.keys().collect();
        handlers.sort();
        f.debug_struct("CapabilityRegistries")
            .field("spending_conditions", &conditions)
            .field("guard_handlers", &handlers)
            .finish()
    }
}
