// crates/partition-hub-dispatch/src/dispatcher.rs
// ============================================================================
// Module: Ambiguous Tool Dispatcher
// Description: Resolves tagged and untagged requests to one partition operation.
// Purpose: Run the selected operation and wrap the outcome in the envelope.
// Dependencies: partition-hub-core, crate::{arguments, service, table}
// ============================================================================

//! ## Overview
//! Tagged requests name their operation directly; a name the service does not
//! declare is rejected. Untagged requests resolve through the service's
//! decision table, first match wins. Either way the selected operation's
//! declared parameters are validated before it runs, and keys it does not
//! declare are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use partition_hub_core::PartitionResponse;
use partition_hub_core::ToolFailure;
use partition_hub_core::ToolRequest;
use serde_json::Value;

use crate::arguments::Arguments;
use crate::errors::DispatchError;
use crate::service::OperationSpec;
use crate::service::PartitionService;

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Dispatcher over one partition service.
#[derive(Clone)]
pub struct AmbiguousDispatcher {
    /// Partition service.
    service: Arc<dyn PartitionService>,
}

impl AmbiguousDispatcher {
    /// Creates a dispatcher for `service`.
    #[must_use]
    pub fn new(service: Arc<dyn PartitionService>) -> Self {
        Self {
            service,
        }
    }

    /// Returns the wrapped service.
    #[must_use]
    pub fn service(&self) -> &dyn PartitionService {
        self.service.as_ref()
    }

    /// Selects the operation a request resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoMatchingOperation`] when the named operation
    /// is not declared or no rule matches.
    pub fn resolve(&self, request: &ToolRequest) -> Result<&'static OperationSpec, DispatchError> {
        match &request.operation {
            Some(name) => self.service.operation(name.as_str()).ok_or_else(|| {
                DispatchError::NoMatchingOperation {
                    operation: Some(name.to_string()),
                }
            }),
            None => {
                let arguments = Arguments::new(&request.arguments);
                self.service
                    .decision_table()
                    .select(&arguments)
                    .and_then(|rule| self.service.operation(rule.operation))
                    .ok_or(DispatchError::NoMatchingOperation {
                        operation: None,
                    })
            }
        }
    }

    /// Resolves, validates, and runs a request.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for unresolvable requests or invalid arguments.
    pub fn dispatch(&self, request: &ToolRequest) -> Result<Value, DispatchError> {
        let spec = self.resolve(request)?;
        let arguments = Arguments::new(&request.arguments);
        arguments.validate(spec.params)?;
        self.service.execute(spec.name, &arguments)
    }

    /// Runs a request and wraps the outcome in a partition envelope.
    #[must_use]
    pub fn handle(&self, request: &ToolRequest) -> PartitionResponse {
        match self.dispatch(request) {
            Ok(payload) => PartitionResponse::ok(payload),
            Err(err) => PartitionResponse::err(ToolFailure::from(&err)),
        }
    }
}
