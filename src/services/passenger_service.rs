use crate::models::passenger::PassengerForm;
use crate::store::ReservationStore;
use crate::utils::error::AppResult;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct PassengerService {
    store: Arc<dyn ReservationStore>,
}

impl PassengerService {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        PassengerService { store }
    }

    /// Finds the passenger by identification, creating the record if absent.
    /// For a returning passenger only phone and address are refreshed, and
    /// only when they changed. Name and email keep their first values.
    pub async fn upsert_passenger(&self, form: &PassengerForm) -> AppResult<i32> {
        if let Some(existing) = self.store.find_passenger(&form.identification).await? {
            if existing.phone != form.phone || existing.address != form.address {
                self.store
                    .update_passenger_contact(existing.id, &form.phone, &form.address)
                    .await?;
                info!(passenger_id = existing.id, "Passenger contact updated");
            }
            return Ok(existing.id);
        }

        let passenger_id = self.store.insert_passenger(&form.to_new_passenger()).await?;
        info!(passenger_id, "Passenger registered");
        Ok(passenger_id)
    }
}
