use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::VehicleRepository;
use crate::error::RepositoryError;
use crate::model::{Vehicle, VehicleInput};
use crate::vin::Vin;

#[derive(Default)]
struct Store {
    by_id: BTreeMap<i64, Vehicle>,
    id_by_vin: HashMap<String, i64>,
    last_id: i64,
}

/// Process-local store used by tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryVehicleRepository {
    store: RwLock<Store>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn list_all(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        Ok(self.store.read().by_id.values().cloned().collect())
    }

    async fn find_by_vin(&self, vin: &Vin) -> Result<Vehicle, RepositoryError> {
        let store = self.store.read();
        store
            .id_by_vin
            .get(vin.as_str())
            .and_then(|id| store.by_id.get(id))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(vin.to_string()))
    }

    async fn exists(&self, vin: &Vin) -> Result<bool, RepositoryError> {
        Ok(self.store.read().id_by_vin.contains_key(vin.as_str()))
    }

    async fn create(&self, input: VehicleInput) -> Result<Vehicle, RepositoryError> {
        // check and insert under the same write guard
        let mut store = self.store.write();
        if store.id_by_vin.contains_key(input.vin.as_str()) {
            return Err(RepositoryError::DuplicateVin);
        }

        store.last_id += 1;
        let vehicle = Vehicle::from_input(store.last_id, input);
        store.id_by_vin.insert(vehicle.vin.clone(), vehicle.id);
        store.by_id.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn update(&self, vin: &Vin, input: VehicleInput) -> Result<Vehicle, RepositoryError> {
        let mut store = self.store.write();
        let id = *store
            .id_by_vin
            .get(vin.as_str())
            .ok_or_else(|| RepositoryError::NotFound(vin.to_string()))?;
        let vehicle = store
            .by_id
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(vin.to_string()))?;
        vehicle.apply(input);
        Ok(vehicle.clone())
    }

    async fn delete(&self, vin: &Vin) -> Result<(), RepositoryError> {
        let mut store = self.store.write();
        let id = store
            .id_by_vin
            .remove(vin.as_str())
            .ok_or_else(|| RepositoryError::NotFound(vin.to_string()))?;
        store.by_id.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(vin: &str) -> VehicleInput {
        VehicleInput {
            vin: Vin::parse(vin).unwrap(),
            manufacturer_name: "Toyota".to_string(),
            description: None,
            horse_power: 150,
            model_name: "Corolla".to_string(),
            model_year: 2020,
            purchase_price: 20000.0,
            fuel_type: "Gasoline".to_string(),
        }
    }

    #[actix_web::test]
    async fn empty_store_lists_nothing() {
        let repo = InMemoryVehicleRepository::new();
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn duplicate_vin_leaves_first_record_alone() {
        let repo = InMemoryVehicleRepository::new();
        let first = repo.create(input("1HGCM82633A004352")).await.unwrap();

        let mut second = input(" 1hgcm82633a004352 ");
        second.manufacturer_name = "Honda".to_string();
        let err = repo.create(second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateVin));

        let stored = repo.find_by_vin(&Vin::parse(&first.vin).unwrap()).await.unwrap();
        assert_eq!(stored, first);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryVehicleRepository::new();
        let first = repo.create(input("1HGCM82633A004352")).await.unwrap();
        repo.delete(&Vin::parse("1HGCM82633A004352").unwrap()).await.unwrap();
        let second = repo.create(input("1HGCM82633A004352")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[actix_web::test]
    async fn update_and_delete_report_missing_records() {
        let repo = InMemoryVehicleRepository::new();
        let vin = Vin::parse("1HGCM82633A004353").unwrap();
        assert!(matches!(
            repo.update(&vin, input("1HGCM82633A004353")).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(repo.delete(&vin).await, Err(RepositoryError::NotFound(_))));
        assert!(!repo.exists(&vin).await.unwrap());
    }

    #[actix_web::test]
    async fn update_replaces_fields_but_not_vin() {
        let repo = InMemoryVehicleRepository::new();
        let created = repo.create(input("1HGCM82633A004354")).await.unwrap();
        let vin = Vin::parse("1HGCM82633A004354").unwrap();

        let mut replacement = input("1HGCM82633A004354");
        replacement.fuel_type = "Hybrid".to_string();
        replacement.description = Some("Updated".to_string());
        let updated = repo.update(&vin, replacement).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.vin, created.vin);
        assert_eq!(updated.fuel_type, "Hybrid");
        assert_eq!(repo.find_by_vin(&vin).await.unwrap(), updated);
    }

    #[actix_web::test]
    async fn list_is_ordered_by_id() {
        let repo = InMemoryVehicleRepository::new();
        repo.create(input("1HGCM82633A004359")).await.unwrap();
        repo.create(input("1HGCM82633A004351")).await.unwrap();
        let ids: Vec<i64> = repo.list_all().await.unwrap().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
