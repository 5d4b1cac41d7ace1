//! Request handler for ordered collections
//!
//! Translates transport payloads into `OrderedCollectionApi` calls and
//! domain errors into status codes.
//!
//! ## Boundaries
//!
//! - Target ranks arrive signed; anything below 1 is an invalid rank
//! - Errors never reveal whether an item exists for another owner (404)
//! - Every response echoes the request's correlation ID

use crate::application::service::ReorderCoordinator;
use crate::adapters::InMemoryOrderedItemStore;
use crate::domain::entities::ListQuery;
use crate::domain::errors::CollectionError;
use crate::domain::value_objects::{CollectionKind, OwnerId, Rank};
use crate::ipc::payloads::{
    CollectionResponse, CreateItemRequest, DeleteItemRequest, GetItemRequest, ListItemsRequest,
    ReorderItemRequest, UpdateItemRequest,
};
use crate::ports::inbound::OrderedCollectionApi;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;
const STATUS_NO_CONTENT: u16 = 204;

/// Transport-facing handler for one collection kind.
pub struct CollectionRequestHandler {
    service: Arc<dyn OrderedCollectionApi>,
}

impl CollectionRequestHandler {
    pub fn new(service: Arc<dyn OrderedCollectionApi>) -> Self {
        Self { service }
    }

    /// Handler over a fresh in-memory coordinator.
    pub fn in_memory(kind: CollectionKind) -> Self {
        Self::new(Arc::new(ReorderCoordinator::in_memory(
            kind,
            InMemoryOrderedItemStore::new(),
        )))
    }

    pub async fn handle_create(&self, request: CreateItemRequest) -> CollectionResponse {
        let result = self.service.create(request.owner_id, request.item).await;
        respond(request.correlation_id, "create", STATUS_CREATED, result)
    }

    pub async fn handle_delete(&self, request: DeleteItemRequest) -> CollectionResponse {
        let result = self
            .service
            .delete(request.owner_id, request.item_id)
            .await;

        match result {
            Ok(()) => CollectionResponse::ok(request.correlation_id, STATUS_NO_CONTENT, None),
            Err(e) => failure(request.correlation_id, "delete", e),
        }
    }

    /// Handle a `ReorderItemRequest`.
    ///
    /// Ranks that do not fit a rank value are rejected before reaching the
    /// coordinator; the error still reports the owner's current bound.
    pub async fn handle_reorder(&self, request: ReorderItemRequest) -> CollectionResponse {
        let start_time = Instant::now();

        let new_rank = match Rank::try_from(request.new_rank) {
            Ok(rank) => rank,
            Err(_) => {
                let error = match self.current_max(request.owner_id).await {
                    Ok(max) => CollectionError::InvalidRank {
                        requested: request.new_rank,
                        max,
                    },
                    Err(e) => e,
                };
                return failure(request.correlation_id, "reorder", error);
            }
        };

        let result = self
            .service
            .move_item(request.owner_id, request.item_id, new_rank)
            .await;

        if result.is_ok() {
            info!(
                "[pf-01] Reorder {} handled in {}ms",
                request.correlation_id,
                start_time.elapsed().as_millis()
            );
        }
        respond(request.correlation_id, "reorder", STATUS_OK, result)
    }

    pub async fn handle_update(&self, request: UpdateItemRequest) -> CollectionResponse {
        let result = self
            .service
            .update(request.owner_id, request.item_id, request.patch)
            .await;
        respond(request.correlation_id, "update", STATUS_OK, result)
    }

    pub async fn handle_get(&self, request: GetItemRequest) -> CollectionResponse {
        let result = self
            .service
            .get_item(request.owner_id, request.item_id)
            .await;
        respond(request.correlation_id, "get", STATUS_OK, result)
    }

    pub async fn handle_list(&self, request: ListItemsRequest) -> CollectionResponse {
        let query = ListQuery {
            page: request.page,
            limit: request.limit,
            sort: request.sort,
        };
        let result = self.service.list(request.owner_id, query).await;
        respond(request.correlation_id, "list", STATUS_OK, result)
    }

    async fn current_max(&self, owner_id: OwnerId) -> Result<Rank, CollectionError> {
        let page = self
            .service
            .list(owner_id, ListQuery::page(1, 1))
            .await?;
        Ok(page.total)
    }
}

fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &str,
    status: u16,
    result: Result<T, CollectionError>,
) -> CollectionResponse {
    match result {
        Ok(value) => match serde_json::to_value(&value) {
            Ok(body) => CollectionResponse::ok(correlation_id, status, Some(body)),
            Err(e) => {
                error!("[pf-01] Failed to encode {} response: {}", operation, e);
                CollectionResponse::failed(correlation_id, 500, e.to_string())
            }
        },
        Err(e) => failure(correlation_id, operation, e),
    }
}

fn failure(correlation_id: Uuid, operation: &str, error: CollectionError) -> CollectionResponse {
    let status = error.status_code();
    if status >= 500 {
        error!("[pf-01] {} {} failed: {}", operation, correlation_id, error);
    } else {
        warn!("[pf-01] {} {} rejected: {}", operation, correlation_id, error);
    }
    CollectionResponse::failed(correlation_id, status, error.public_message())
}
