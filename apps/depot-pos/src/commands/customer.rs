//! # Customer Commands
//!
//! The walk-in customer ("Mostrador") is listed first and cannot be
//! edited or deleted.

use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::Customer;
use depot_db::CustomerInput;

pub async fn list_customers(state: &AppState, query: Option<String>) -> Result<Vec<Customer>, ApiError> {
    let query = query.unwrap_or_default();
    Ok(state.db.customers().list(query.trim()).await?)
}

pub async fn get_customer(state: &AppState, id: &str) -> Result<Customer, ApiError> {
    state
        .db
        .customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

pub async fn create_customer(state: &AppState, input: &CustomerInput) -> Result<Customer, ApiError> {
    let customer = state.db.customers().create(input).await?;
    info!(id = %customer.id, "create_customer command");
    Ok(customer)
}

pub async fn update_customer(
    state: &AppState,
    id: &str,
    input: &CustomerInput,
) -> Result<Customer, ApiError> {
    Ok(state.db.customers().update(id, input).await?)
}

/// Refused for the walk-in customer and for customers with invoices.
pub async fn delete_customer(state: &AppState, id: &str) -> Result<(), ApiError> {
    state.db.customers().delete(id).await?;
    info!(id = %id, "delete_customer command");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_state;
    use depot_core::WALK_IN_CUSTOMER_ID;

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let state = test_state().await;
        let created = create_customer(
            &state,
            &CustomerInput {
                name: "Tienda La Esquina".into(),
                phone: Some("5555-1234".into()),
                ..CustomerInput::default()
            },
        )
        .await
        .unwrap();

        let all = list_customers(&state, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].is_walk_in());

        let updated = update_customer(
            &state,
            &created.id,
            &CustomerInput {
                name: "Tienda La Esquina".into(),
                address: Some("Zona 1".into()),
                ..CustomerInput::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.address.as_deref(), Some("Zona 1"));

        delete_customer(&state, &created.id).await.unwrap();
        let err = get_customer(&state, &created.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_walk_in_is_protected() {
        let state = test_state().await;
        let err = delete_customer(&state, WALK_IN_CUSTOMER_ID).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
