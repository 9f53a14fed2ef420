use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::model::{Vehicle, VehicleInput};
use crate::vin::Vin;

mod memory;
mod postgres;

pub use memory::InMemoryVehicleRepository;
pub use postgres::PgVehicleRepository;

/// Persistence of vehicle records keyed by normalized VIN.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Every stored vehicle, ordered by id.
    async fn list_all(&self) -> Result<Vec<Vehicle>, RepositoryError>;

    async fn find_by_vin(&self, vin: &Vin) -> Result<Vehicle, RepositoryError>;

    /// Cheap existence probe. Not a substitute for the uniqueness guarantee of `create`.
    async fn exists(&self, vin: &Vin) -> Result<bool, RepositoryError>;

    /// Fails with `DuplicateVin` when a record with the same VIN is already stored,
    /// including when another writer inserted it concurrently.
    async fn create(&self, input: VehicleInput) -> Result<Vehicle, RepositoryError>;

    /// Replaces all mutable fields of the record stored under `vin`.
    async fn update(&self, vin: &Vin, input: VehicleInput) -> Result<Vehicle, RepositoryError>;

    async fn delete(&self, vin: &Vin) -> Result<(), RepositoryError>;
}
